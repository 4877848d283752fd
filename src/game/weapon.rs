//! Weapon state machine - fire cadence, ammunition pool, reload timer
//!
//! All gates are wall-clock-timestamp based rather than tick-counted, so
//! fire rate stays stable under variable frame timing. Callers pass the
//! current time in milliseconds into every operation.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::projectile::{Projectile, ProjectileOwner};

/// Delay between the magazine emptying and the automatic reload
pub const AUTO_RELOAD_DELAY_MS: u64 = 100;

/// Weapon tuning values
#[derive(Debug, Clone, Copy)]
pub struct WeaponSpec {
    /// Damage per hit
    pub damage: u32,
    /// Rounds per minute
    pub fire_rate_rpm: u32,
    /// Maximum projectile travel distance
    pub max_range: f32,
    /// Magazine capacity
    pub magazine_size: u32,
    /// Starting reserve ammunition
    pub reserve_ammo: u32,
    /// Reload duration in milliseconds
    pub reload_ms: u64,
    /// Recoil added per shot
    pub recoil_kick: f32,
    /// Multiplicative recoil decay applied each step
    pub recoil_decay: f32,
}

impl WeaponSpec {
    /// The standard rifle
    pub fn rifle() -> Self {
        Self {
            damage: 25,
            fire_rate_rpm: 600,
            max_range: 100.0,
            magazine_size: 30,
            reserve_ammo: 90,
            reload_ms: 2_000,
            recoil_kick: 0.02,
            recoil_decay: 0.95,
        }
    }

    /// Minimum time between shots in milliseconds
    pub fn fire_interval_ms(&self) -> u64 {
        60_000 / u64::from(self.fire_rate_rpm.max(1))
    }
}

impl Default for WeaponSpec {
    fn default() -> Self {
        Self::rifle()
    }
}

/// Live weapon state owned 1:1 by a player
#[derive(Debug)]
pub struct Weapon {
    spec: WeaponSpec,
    magazine: u32,
    reserve: u32,
    last_shot_ms: u64,
    reloading: bool,
    reload_started_ms: u64,
    recoil: f32,
    rng: ChaCha8Rng,
}

impl Weapon {
    pub fn new(spec: WeaponSpec, seed: u64) -> Self {
        Self {
            spec,
            magazine: spec.magazine_size,
            reserve: spec.reserve_ammo,
            last_shot_ms: 0,
            reloading: false,
            reload_started_ms: 0,
            recoil: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn spec(&self) -> &WeaponSpec {
        &self.spec
    }

    pub fn magazine(&self) -> u32 {
        self.magazine
    }

    pub fn reserve(&self) -> u32 {
        self.reserve
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn recoil(&self) -> f32 {
        self.recoil
    }

    /// True iff a shot may be fired right now
    pub fn can_fire(&self, now_ms: u64) -> bool {
        !self.reloading
            && self.magazine > 0
            && now_ms.saturating_sub(self.last_shot_ms) >= self.spec.fire_interval_ms()
    }

    /// Attempt to fire. Returns the spawned projectile, or `None` when the
    /// cadence gate, magazine, or reload state forbids firing.
    pub fn fire(&mut self, now_ms: u64, origin: Vec3, direction: Vec3) -> Option<Projectile> {
        if !self.can_fire(now_ms) {
            return None;
        }

        self.magazine -= 1;
        self.last_shot_ms = now_ms;
        self.recoil += self.spec.recoil_kick;

        // Recoil widens the spread; vertical at full scale, horizontal at half
        let mut spread = direction;
        spread.y += self.recoil * (self.rng.gen::<f32>() - 0.5);
        spread.x += self.recoil * (self.rng.gen::<f32>() - 0.5) * 0.5;
        let spread = spread.normalize();

        Some(Projectile::new(
            ProjectileOwner::Local,
            origin,
            spread,
            self.spec.damage,
            self.spec.max_range,
            now_ms,
        ))
    }

    /// True when the magazine just ran dry but reserve remains; the owner
    /// schedules the automatic reload after [`AUTO_RELOAD_DELAY_MS`]
    pub fn wants_auto_reload(&self) -> bool {
        !self.reloading && self.magazine == 0 && self.reserve > 0
    }

    /// Start a reload. No-op while already reloading, with a full
    /// magazine, or with an empty reserve.
    pub fn begin_reload(&mut self, now_ms: u64) -> bool {
        if self.reloading || self.magazine == self.spec.magazine_size || self.reserve == 0 {
            return false;
        }
        self.reloading = true;
        self.reload_started_ms = now_ms;
        true
    }

    /// Per-step update: recoil decay and reload completion.
    /// Returns true when a reload finished this step.
    pub fn update(&mut self, now_ms: u64) -> bool {
        self.recoil *= self.spec.recoil_decay;

        if self.reloading
            && now_ms.saturating_sub(self.reload_started_ms) >= self.spec.reload_ms
        {
            self.finish_reload();
            return true;
        }
        false
    }

    /// Move rounds from reserve into the magazine, conserving the total
    fn finish_reload(&mut self) {
        let deficit = self.spec.magazine_size - self.magazine;
        let moved = deficit.min(self.reserve);
        self.magazine += moved;
        self.reserve -= moved;
        self.reloading = false;
    }

    /// Restore starting ammunition and clear reload/recoil state
    pub fn reset(&mut self) {
        self.magazine = self.spec.magazine_size;
        self.reserve = self.spec.reserve_ammo;
        self.reloading = false;
        self.reload_started_ms = 0;
        self.recoil = 0.0;
        self.last_shot_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rifle() -> Weapon {
        Weapon::new(WeaponSpec::rifle(), 42)
    }

    const ORIGIN: Vec3 = Vec3::new(0.0, 1.8, 0.0);
    const FORWARD: Vec3 = Vec3::new(0.0, 0.0, -1.0);

    #[test]
    fn fire_interval_derives_from_rate() {
        assert_eq!(WeaponSpec::rifle().fire_interval_ms(), 100);
    }

    #[test]
    fn cooldown_gates_second_shot() {
        let mut weapon = rifle();
        assert!(weapon.fire(1_000, ORIGIN, FORWARD).is_some());
        assert!(!weapon.can_fire(1_050));
        assert!(weapon.fire(1_050, ORIGIN, FORWARD).is_none());
        assert!(weapon.can_fire(1_100));
        assert!(weapon.fire(1_100, ORIGIN, FORWARD).is_some());
        assert_eq!(weapon.magazine(), 28);
    }

    #[test]
    fn fired_direction_is_normalized() {
        let mut weapon = rifle();
        // Build up recoil so the spread perturbation is non-trivial
        let mut now = 1_000;
        for _ in 0..5 {
            let projectile = weapon.fire(now, ORIGIN, FORWARD).expect("shot gated");
            assert!((projectile.direction.length() - 1.0).abs() < 1e-5);
            now += 100;
        }
        assert!(weapon.recoil() > 0.0);
    }

    #[test]
    fn reload_is_idempotent_while_reloading() {
        let mut weapon = rifle();
        let _ = weapon.fire(1_000, ORIGIN, FORWARD);
        assert!(weapon.begin_reload(1_200));
        assert!(!weapon.begin_reload(1_300));

        // Completing once credits exactly the deficit
        weapon.update(1_200 + weapon.spec().reload_ms);
        assert_eq!(weapon.magazine(), 30);
        assert_eq!(weapon.reserve(), 89);
        assert!(!weapon.is_reloading());
    }

    #[test]
    fn reload_conserves_total_rounds() {
        let mut weapon = rifle();
        let mut now = 1_000;
        for _ in 0..12 {
            assert!(weapon.fire(now, ORIGIN, FORWARD).is_some());
            now += 100;
        }
        let total_before = weapon.magazine() + weapon.reserve();

        weapon.begin_reload(now);
        weapon.update(now + weapon.spec().reload_ms);

        assert_eq!(weapon.magazine() + weapon.reserve(), total_before);
        assert_eq!(weapon.magazine(), 30);
    }

    #[test]
    fn reload_noop_when_full_or_reserve_empty() {
        let mut weapon = rifle();
        assert!(!weapon.begin_reload(1_000));

        let mut dry = Weapon::new(
            WeaponSpec {
                reserve_ammo: 0,
                ..WeaponSpec::rifle()
            },
            1,
        );
        let _ = dry.fire(1_000, ORIGIN, FORWARD);
        assert!(!dry.begin_reload(1_200));
    }

    #[test]
    fn magazine_drain_then_auto_reload_to_thirty_sixty() {
        let mut weapon = rifle();
        let mut now = 1_000;
        for _ in 0..30 {
            assert!(weapon.fire(now, ORIGIN, FORWARD).is_some());
            now += 100;
        }
        assert_eq!(weapon.magazine(), 0);
        assert!(weapon.wants_auto_reload());
        assert!(weapon.fire(now, ORIGIN, FORWARD).is_none());

        // The owner schedules begin_reload after the auto-reload delay
        weapon.begin_reload(now + AUTO_RELOAD_DELAY_MS);
        weapon.update(now + AUTO_RELOAD_DELAY_MS + weapon.spec().reload_ms);

        assert_eq!(weapon.magazine(), 30);
        assert_eq!(weapon.reserve(), 60);
    }

    #[test]
    fn magazine_unchanged_until_reload_completes() {
        let mut weapon = rifle();
        let _ = weapon.fire(1_000, ORIGIN, FORWARD);
        weapon.begin_reload(1_200);

        weapon.update(1_300);
        assert_eq!(weapon.magazine(), 29);
        assert!(weapon.is_reloading());
    }

    #[test]
    fn recoil_decays_toward_zero() {
        let mut weapon = rifle();
        let _ = weapon.fire(1_000, ORIGIN, FORWARD);
        let after_shot = weapon.recoil();
        weapon.update(1_010);
        assert!(weapon.recoil() < after_shot);
    }

    #[test]
    fn reset_restores_starting_ammo() {
        let mut weapon = rifle();
        let mut now = 1_000;
        for _ in 0..8 {
            let _ = weapon.fire(now, ORIGIN, FORWARD);
            now += 100;
        }
        weapon.begin_reload(now);
        weapon.reset();

        assert_eq!(weapon.magazine(), 30);
        assert_eq!(weapon.reserve(), 90);
        assert!(!weapon.is_reloading());
        assert_eq!(weapon.recoil(), 0.0);
        assert!(weapon.can_fire(now));
    }
}
