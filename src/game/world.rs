//! Static world geometry - the ground plane and axis-aligned obstacles

use glam::Vec3;

/// Height of the ground plane
pub const GROUND_Y: f32 = 0.0;

/// Nearest distance along `dir` from `origin` to the box `[min, max]`,
/// via the slab method. Only entry faces count: a ray starting inside the
/// box has its entry face behind it and misses, matching a surface-only
/// hit test against front faces.
pub fn ray_intersect_aabb(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = dir.recip();
    let t1 = (min - origin) * inv;
    let t2 = (max - origin) * inv;
    let t_near = t1.min(t2).max_element();
    let t_far = t1.max(t2).min_element();

    if t_near > t_far || t_far < 0.0 || t_near < 0.0 {
        return None;
    }
    Some(t_near)
}

/// Axis-aligned box obstacle, immutable for the session
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Obstacle {
    /// Build from a center point and full side lengths
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self {
            center,
            half_extents: size * 0.5,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    /// Height of the top face
    pub fn top(&self) -> f32 {
        self.center.y + self.half_extents.y
    }

    /// Nearest ray intersection distance with this obstacle's surface
    pub fn ray_intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        ray_intersect_aabb(origin, dir, self.min(), self.max())
    }
}

/// Immutable obstacle set supplied at session start
#[derive(Debug, Clone, Default)]
pub struct ArenaWorld {
    obstacles: Vec<Obstacle>,
}

impl ArenaWorld {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Standard arena layout: four corner pillars and four perimeter walls
    pub fn arena() -> Self {
        let boxes = [
            ((10.0, 2.0, 10.0), (2.0, 4.0, 2.0)),
            ((-10.0, 2.0, 10.0), (2.0, 4.0, 2.0)),
            ((10.0, 2.0, -10.0), (2.0, 4.0, 2.0)),
            ((-10.0, 2.0, -10.0), (2.0, 4.0, 2.0)),
            ((0.0, 1.0, 15.0), (8.0, 2.0, 2.0)),
            ((0.0, 1.0, -15.0), (8.0, 2.0, 2.0)),
            ((15.0, 1.0, 0.0), (2.0, 2.0, 8.0)),
            ((-15.0, 1.0, 0.0), (2.0, 2.0, 8.0)),
        ];

        Self::new(
            boxes
                .iter()
                .map(|&((cx, cy, cz), (sx, sy, sz))| {
                    Obstacle::new(Vec3::new(cx, cy, cz), Vec3::new(sx, sy, sz))
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_box_face() {
        let obstacle = Obstacle::new(Vec3::new(0.0, 0.0, -10.0), Vec3::new(2.0, 2.0, 2.0));
        let dist = obstacle
            .ray_intersect(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0))
            .expect("ray should hit the box");
        assert!((dist - 9.0).abs() < 1e-5);
    }

    #[test]
    fn ray_misses_box_behind_origin() {
        let obstacle = Obstacle::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(2.0, 2.0, 2.0));
        assert!(obstacle
            .ray_intersect(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0))
            .is_none());
    }

    #[test]
    fn ray_from_inside_misses() {
        let obstacle = Obstacle::new(Vec3::ZERO, Vec3::new(4.0, 4.0, 4.0));
        assert!(obstacle
            .ray_intersect(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0))
            .is_none());
    }

    #[test]
    fn arena_layout_has_eight_obstacles() {
        assert_eq!(ArenaWorld::arena().obstacles().len(), 8);
    }
}
