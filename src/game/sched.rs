//! Deferred gameplay effects with deterministic cancellation
//!
//! Replaces bare timer callbacks: each entry captures the epoch current at
//! scheduling time, and a session reset bumps the epoch, so a deferred
//! effect can never land on state that has since been torn down.

/// Effects that fire after a wall-clock delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Automatic reload kicked off shortly after the magazine empties
    BeginReload,
    /// Local player respawn after death
    Respawn,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    fire_at_ms: u64,
    epoch: u64,
    effect: Deferred,
}

/// Pending deferred effects, polled once per simulation step
#[derive(Debug, Default)]
pub struct Scheduler {
    epoch: u64,
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at_ms: u64, effect: Deferred) {
        self.entries.push(Entry {
            fire_at_ms,
            epoch: self.epoch,
            effect,
        });
    }

    /// True when an effect of this kind is already pending
    pub fn has_pending(&self, effect: Deferred) -> bool {
        self.entries
            .iter()
            .any(|e| e.epoch == self.epoch && e.effect == effect)
    }

    /// Remove and return every effect due at `now_ms`; entries from a
    /// superseded epoch are silently discarded
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<Deferred> {
        let epoch = self.epoch;
        let mut due = Vec::new();
        self.entries.retain(|entry| {
            if entry.epoch != epoch {
                return false;
            }
            if entry.fire_at_ms <= now_ms {
                due.push(entry.effect);
                return false;
            }
            true
        });
        due
    }

    /// Invalidate everything in flight (match restart, teardown)
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_when_due() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1_500, Deferred::Respawn);

        assert!(scheduler.drain_due(1_499).is_empty());
        assert_eq!(scheduler.drain_due(1_500), vec![Deferred::Respawn]);
        assert!(scheduler.drain_due(10_000).is_empty());
    }

    #[test]
    fn invalidate_cancels_pending_effects() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1_000, Deferred::BeginReload);
        scheduler.schedule(2_000, Deferred::Respawn);

        scheduler.invalidate();

        assert!(scheduler.drain_due(5_000).is_empty());
        assert!(!scheduler.has_pending(Deferred::Respawn));
    }

    #[test]
    fn has_pending_reflects_queue() {
        let mut scheduler = Scheduler::new();
        assert!(!scheduler.has_pending(Deferred::Respawn));

        scheduler.schedule(1_000, Deferred::Respawn);
        assert!(scheduler.has_pending(Deferred::Respawn));
        assert!(!scheduler.has_pending(Deferred::BeginReload));
    }
}
