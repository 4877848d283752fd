//! Projectile simulation - flight integration, ray-cast hit detection,
//! range/lifetime expiry

use glam::Vec3;
use uuid::Uuid;

use super::world::{ray_intersect_aabb, ArenaWorld, GROUND_Y};

/// Projectile muzzle speed in units per second
pub const PROJECTILE_SPEED: f32 = 100.0;
/// Lifetime cap independent of the range cap
pub const PROJECTILE_TTL_MS: u64 = 5_000;
/// Hit envelope of a player proxy (horizontal radius, half height)
pub const PROXY_HALF_EXTENTS: Vec3 = Vec3::new(0.5, 1.0, 0.5);

/// Who fired a projectile. Remote shots are cosmetic tracers replayed from
/// peer events; they never produce hit reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileOwner {
    Local,
    Remote(Uuid),
}

/// Hit envelope for a remote-controlled player proxy
#[derive(Debug, Clone, Copy)]
pub struct PlayerProxy {
    pub id: Uuid,
    pub position: Vec3,
}

impl PlayerProxy {
    fn min(&self) -> Vec3 {
        self.position - PROXY_HALF_EXTENTS
    }

    fn max(&self) -> Vec3 {
        self.position + PROXY_HALF_EXTENTS
    }
}

/// Outcome of advancing a projectile one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    InFlight,
    /// Range or lifetime exceeded; no impact
    Expired,
    /// Struck the ground or an obstacle
    HitWorld { point: Vec3 },
    /// Struck a player proxy
    HitPlayer { target_id: Uuid, point: Vec3 },
}

/// One in-flight shot
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: Uuid,
    pub owner: ProjectileOwner,
    pub position: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: u32,
    pub max_range: f32,
    pub traveled: f32,
    pub spawned_at_ms: u64,
    pub terminal: bool,
}

impl Projectile {
    pub fn new(
        owner: ProjectileOwner,
        origin: Vec3,
        direction: Vec3,
        damage: u32,
        max_range: f32,
        now_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            position: origin,
            direction,
            speed: PROJECTILE_SPEED,
            damage,
            max_range,
            traveled: 0.0,
            spawned_at_ms: now_ms,
            terminal: false,
        }
    }

    /// Advance one step. Hit priority: ground plane first, then the
    /// globally nearest surface intersection within this step's
    /// displacement across obstacles and proxies. A terminal projectile
    /// stays terminal; the owning collection sweeps it out after all
    /// updates for the step.
    pub fn advance(
        &mut self,
        dt: f32,
        now_ms: u64,
        world: &ArenaWorld,
        proxies: &[PlayerProxy],
    ) -> StepOutcome {
        if self.terminal {
            return StepOutcome::InFlight;
        }

        let displacement = self.direction * self.speed * dt;
        let step_len = displacement.length();
        let tentative = self.position + displacement;

        if tentative.y <= GROUND_Y {
            self.terminal = true;
            return StepOutcome::HitWorld {
                point: Vec3::new(tentative.x, GROUND_Y, tentative.z),
            };
        }

        let mut nearest: Option<(f32, Option<Uuid>)> = None;

        for obstacle in world.obstacles() {
            if let Some(dist) = obstacle.ray_intersect(self.position, self.direction) {
                if dist <= step_len && nearest.map_or(true, |(best, _)| dist < best) {
                    nearest = Some((dist, None));
                }
            }
        }

        for proxy in proxies {
            if let Some(dist) =
                ray_intersect_aabb(self.position, self.direction, proxy.min(), proxy.max())
            {
                if dist <= step_len && nearest.map_or(true, |(best, _)| dist < best) {
                    nearest = Some((dist, Some(proxy.id)));
                }
            }
        }

        if let Some((dist, target)) = nearest {
            let point = self.position + self.direction * dist;
            self.terminal = true;
            return match target {
                Some(target_id) => StepOutcome::HitPlayer { target_id, point },
                None => StepOutcome::HitWorld { point },
            };
        }

        self.position = tentative;
        self.traveled += step_len;

        if self.traveled >= self.max_range
            || now_ms.saturating_sub(self.spawned_at_ms) >= PROJECTILE_TTL_MS
        {
            self.terminal = true;
            return StepOutcome::Expired;
        }

        StepOutcome::InFlight
    }
}
