//! Client-side gameplay core for a multiplayer first-person arena shooter
//!
//! The crate advances player motion against static geometry, runs weapon
//! firing and reload as a timed state machine, resolves projectile hits by
//! ray casting, and keeps combat state synchronized across a shared room
//! through a client-relayed protocol. Rendering, HUD widgets, and audio
//! live outside the core; they consume the typed [`game::GameEvent`]s and
//! roster snapshots this crate emits and feed back nothing but input.

pub mod config;
pub mod game;
pub mod net;
pub mod util;
