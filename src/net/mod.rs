//! Networking - wire protocol, peer synchronization, in-process relay

pub mod protocol;
pub mod relay;
pub mod sync;
