//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified events per second
pub fn create_limiter(events_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(events_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Outbound position-update pacing (per session)
pub const UPDATE_RATE_LIMIT: u32 = crate::util::time::UPDATE_SEND_TPS;

/// Inbound frame limit per peer at the relay
pub const RELAY_FRAME_LIMIT: u32 = 120;

/// Paces outbound position/orientation updates so a fast render loop
/// does not flood the wire
#[derive(Clone)]
pub struct UpdatePacer {
    limiter: Arc<Limiter>,
}

impl UpdatePacer {
    pub fn new() -> Self {
        Self {
            limiter: create_limiter(UPDATE_RATE_LIMIT),
        }
    }

    /// Check whether an update may be sent now (returns true if allowed)
    pub fn ready(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for UpdatePacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-peer rate limiter applied to inbound relay frames
#[derive(Clone)]
pub struct PeerRateLimiter {
    frame_limiter: Arc<Limiter>,
}

impl PeerRateLimiter {
    pub fn new() -> Self {
        Self {
            frame_limiter: create_limiter(RELAY_FRAME_LIMIT),
        }
    }

    /// Check if an inbound frame is allowed (returns true if allowed)
    pub fn check_frame(&self) -> bool {
        self.frame_limiter.check().is_ok()
    }
}

impl Default for PeerRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
