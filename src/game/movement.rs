//! Player movement and collision resolution

use glam::Vec3;

use super::world::{ArenaWorld, Obstacle, GROUND_Y};

/// Horizontal movement speed in units per second
pub const MOVE_SPEED: f32 = 10.0;
/// Vertical velocity applied on jump
pub const JUMP_SPEED: f32 = 8.0;
/// Downward acceleration while airborne
pub const GRAVITY: f32 = -20.0;
/// Horizontal collision radius of the player capsule
pub const PLAYER_RADIUS: f32 = 0.5;
/// The player center rests this far above a supporting surface
pub const PLAYER_GROUND_OFFSET: f32 = 1.0;
/// Vertical allowance above an obstacle when testing overlap, so a player
/// standing on top still registers against the box
pub const OBSTACLE_HEADROOM: f32 = 1.0;
/// Tolerance for treating an obstacle top as a walkable surface
pub const TOP_SURFACE_TOLERANCE: f32 = 0.1;

/// Directional movement intents active for one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// Result of one resolved movement step
#[derive(Debug, Clone, Copy)]
pub struct StepResult {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
}

/// Rotate a vector around the Y axis so movement is camera-relative
fn rotate_yaw(v: Vec3, yaw: f32) -> Vec3 {
    let (sin, cos) = yaw.sin_cos();
    Vec3::new(v.x * cos + v.z * sin, v.y, -v.x * sin + v.z * cos)
}

/// Movement system: integrates intent over a step and resolves collisions
pub struct MovementSystem;

impl MovementSystem {
    /// Advance one step. Never fails; the returned position is always
    /// clamped to the ground plane and pushed out of obstacles.
    pub fn step(
        position: Vec3,
        velocity: Vec3,
        grounded: bool,
        intent: &MoveIntent,
        yaw: f32,
        dt: f32,
        world: &ArenaWorld,
    ) -> StepResult {
        let mut velocity = velocity;

        // Compose the horizontal intent vector in view space
        let mut dir = Vec3::ZERO;
        if intent.forward {
            dir.z -= 1.0;
        }
        if intent.backward {
            dir.z += 1.0;
        }
        if intent.left {
            dir.x -= 1.0;
        }
        if intent.right {
            dir.x += 1.0;
        }

        if dir.length_squared() > 0.0 {
            dir = rotate_yaw(dir.normalize(), yaw);
        }

        velocity.x = dir.x * MOVE_SPEED;
        velocity.z = dir.z * MOVE_SPEED;

        let mut grounded = grounded;
        if intent.jump && grounded {
            velocity.y = JUMP_SPEED;
            grounded = false;
        }

        if !grounded {
            velocity.y += GRAVITY * dt;
        }

        let mut position = position + velocity * dt;

        // Support is re-detected from scratch each step
        grounded = false;

        if position.y <= GROUND_Y + PLAYER_GROUND_OFFSET {
            position.y = GROUND_Y + PLAYER_GROUND_OFFSET;
            grounded = true;
        }

        // Single pass in obstacle order; overlaps are resolved
        // independently, not as a global minimal-translation solve
        for obstacle in world.obstacles() {
            resolve_obstacle(&mut position, &mut grounded, velocity.y, obstacle);
        }

        if grounded && velocity.y <= 0.0 {
            velocity.y = 0.0;
        }

        StepResult {
            position,
            velocity,
            grounded,
        }
    }
}

/// Test the player envelope against one obstacle and push out on overlap
fn resolve_obstacle(position: &mut Vec3, grounded: &mut bool, vel_y: f32, obstacle: &Obstacle) {
    let min = obstacle.min();
    let max = obstacle.max();

    let min_x = min.x - PLAYER_RADIUS;
    let max_x = max.x + PLAYER_RADIUS;
    let min_z = min.z - PLAYER_RADIUS;
    let max_z = max.z + PLAYER_RADIUS;

    let overlapping = position.x >= min_x
        && position.x <= max_x
        && position.z >= min_z
        && position.z <= max_z
        && position.y >= min.y
        && position.y <= max.y + OBSTACLE_HEADROOM;

    if !overlapping {
        return;
    }

    // At or just above the top while falling: walkable surface, no push-out
    if position.y >= max.y && position.y <= max.y + TOP_SURFACE_TOLERANCE && vel_y <= 0.0 {
        position.y = max.y;
        *grounded = true;
        return;
    }

    // Push out along the horizontal axis nearer to a face
    let delta_x = position.x - obstacle.center.x;
    let delta_z = position.z - obstacle.center.z;

    if delta_x.abs() > delta_z.abs() {
        position.x = if delta_x > 0.0 { max_x } else { min_x };
    } else {
        position.z = if delta_z > 0.0 { max_z } else { min_z };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_world() -> ArenaWorld {
        ArenaWorld::default()
    }

    #[test]
    fn falls_to_ground_clamp_after_one_second() {
        let result = MovementSystem::step(
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::ZERO,
            false,
            &MoveIntent::default(),
            0.0,
            1.0,
            &empty_world(),
        );
        assert_eq!(result.position.y, GROUND_Y + PLAYER_GROUND_OFFSET);
        assert!(result.grounded);
        assert_eq!(result.velocity.y, 0.0);
    }

    #[test]
    fn never_returns_height_below_ground_clamp() {
        let world = ArenaWorld::arena();
        let mut position = Vec3::new(-20.0, 30.0, -20.0);
        let mut velocity = Vec3::new(0.0, -50.0, 0.0);
        let mut grounded = false;
        let intent = MoveIntent {
            forward: true,
            right: true,
            ..MoveIntent::default()
        };

        for step in 0..240 {
            let yaw = step as f32 * 0.05;
            let result =
                MovementSystem::step(position, velocity, grounded, &intent, yaw, 1.0 / 60.0, &world);
            assert!(result.position.y >= GROUND_Y + PLAYER_GROUND_OFFSET - 1e-6);
            position = result.position;
            velocity = result.velocity;
            grounded = result.grounded;
        }
    }

    #[test]
    fn forward_intent_is_camera_relative() {
        let intent = MoveIntent {
            forward: true,
            ..MoveIntent::default()
        };

        // Yaw zero looks down -Z
        let straight = MovementSystem::step(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::ZERO,
            true,
            &intent,
            0.0,
            0.1,
            &empty_world(),
        );
        assert!(straight.position.z < 0.0);
        assert!(straight.position.x.abs() < 1e-5);

        // Quarter turn: forward becomes -X
        let turned = MovementSystem::step(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::ZERO,
            true,
            &intent,
            std::f32::consts::FRAC_PI_2,
            0.1,
            &empty_world(),
        );
        assert!(turned.position.x < -0.9);
        assert!(turned.position.z.abs() < 1e-5);
    }

    #[test]
    fn jump_requires_ground_support() {
        let intent = MoveIntent {
            jump: true,
            ..MoveIntent::default()
        };

        let airborne = MovementSystem::step(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::ZERO,
            false,
            &intent,
            0.0,
            0.01,
            &empty_world(),
        );
        assert!(airborne.velocity.y < 0.0);

        let launched = MovementSystem::step(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::ZERO,
            true,
            &intent,
            0.0,
            0.01,
            &empty_world(),
        );
        assert!(launched.velocity.y > 0.0);
        assert!(!launched.grounded);
    }

    #[test]
    fn overlap_pushes_out_to_nearest_face() {
        let world = ArenaWorld::new(vec![Obstacle::new(
            Vec3::new(10.0, 2.0, 10.0),
            Vec3::new(2.0, 4.0, 2.0),
        )]);

        // Strafing +X into the -X face, just inside the inflated envelope
        let result = MovementSystem::step(
            Vec3::new(8.6, 1.0, 10.0),
            Vec3::ZERO,
            true,
            &MoveIntent {
                right: true,
                ..MoveIntent::default()
            },
            0.0,
            1.0 / 60.0,
            &world,
        );
        assert!((result.position.x - (9.0 - PLAYER_RADIUS)).abs() < 1e-4);
        assert_eq!(result.position.y, PLAYER_GROUND_OFFSET);
    }

    #[test]
    fn obstacle_top_is_walkable() {
        let obstacle = Obstacle::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(4.0, 4.0, 4.0));
        let world = ArenaWorld::new(vec![obstacle]);

        // Falling onto the top face
        let result = MovementSystem::step(
            Vec3::new(0.0, 4.13, 0.0),
            Vec3::new(0.0, -2.0, 0.0),
            false,
            &MoveIntent::default(),
            0.0,
            1.0 / 60.0,
            &world,
        );
        assert_eq!(result.position.y, obstacle.top());
        assert!(result.grounded);
    }
}
