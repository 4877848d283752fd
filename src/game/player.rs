//! Local player state and view control

use glam::Vec3;
use uuid::Uuid;

use super::weapon::Weapon;

/// Starting and maximum health
pub const MAX_HEALTH: u32 = 100;
/// Where the local player (re)spawns
pub const SPAWN_POSITION: Vec3 = Vec3::new(0.0, 2.0, 0.0);
/// Eye height above the player center, where shots originate
pub const EYE_HEIGHT: f32 = 0.8;
/// Base look rate multiplied by the sensitivity setting
pub const BASE_LOOK_RATE: f32 = 0.002;

/// Yaw/pitch view state driven by pointer deltas
#[derive(Debug, Clone)]
pub struct LookController {
    pub yaw: f32,
    pub pitch: f32,
    sensitivity: f32,
}

impl LookController {
    pub fn new(sensitivity_setting: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            sensitivity: sensitivity_setting * BASE_LOOK_RATE,
        }
    }

    /// Apply a pointer delta; pitch is clamped to straight up/down
    pub fn apply_pointer_delta(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity)
            .clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
    }

    pub fn set_sensitivity(&mut self, setting: f32) {
        let setting = setting.clamp(crate::config::MIN_SENSITIVITY, crate::config::MAX_SENSITIVITY);
        self.sensitivity = setting * BASE_LOOK_RATE;
    }

    /// Unit view direction for the current yaw/pitch
    pub fn aim_direction(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    pub fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }
}

/// Authoritative-local state of the player this client controls
#[derive(Debug)]
pub struct PlayerState {
    pub id: Uuid,
    pub name: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub health: u32,
    pub alive: bool,
    pub grounded: bool,
    pub look: LookController,
    pub weapon: Weapon,
}

impl PlayerState {
    pub fn new(id: Uuid, name: String, sensitivity: f32, weapon: Weapon) -> Self {
        Self {
            id,
            name,
            position: SPAWN_POSITION,
            velocity: Vec3::ZERO,
            health: MAX_HEALTH,
            alive: true,
            grounded: false,
            look: LookController::new(sensitivity),
            weapon,
        }
    }

    /// Restore spawn state: health, position, view, and weapon
    pub fn reset(&mut self) {
        self.health = MAX_HEALTH;
        self.alive = true;
        self.position = SPAWN_POSITION;
        self.velocity = Vec3::ZERO;
        self.grounded = false;
        self.look.reset();
        self.weapon.reset();
    }

    /// Point shots originate from
    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::new(0.0, EYE_HEIGHT, 0.0)
    }
}
