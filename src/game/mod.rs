//! Game simulation modules

pub mod combat;
pub mod input;
pub mod movement;
pub mod player;
pub mod projectile;
pub mod sched;
pub mod session;
pub mod weapon;
pub mod world;

pub use session::{GameEvent, GameSession, SessionHandle};
