//! Craft-versus-world contact tests.
//!
//! The craft never collides with its visual mesh. It collides with a small
//! placeholder box (the proxy), shrunk below the visual size so grazing
//! passes do not end a run. Obstacles are boxes too; the test between them
//! is an oriented-box separating-axis test. Rings are not solid: a ring is
//! picked up when its center comes within a fixed radius of the proxy center.
//!
//! Both tests run over every live entity every frame. Obstacle hits do not
//! short-circuit; the caller folds any number of hits into a single terminal
//! transition.

use glam::{Mat3, Quat, Vec3};

use crate::config::CollisionConfig;
use crate::pool::{Obstacle, Ring};

const PARALLEL_EPS: f32 = 1e-6;

/// Oriented bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub rotation: Quat,
}

impl Obb {
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
            rotation: Quat::IDENTITY,
        }
    }

    fn axes(&self) -> [Vec3; 3] {
        let m = Mat3::from_quat(self.rotation);
        [m.x_axis, m.y_axis, m.z_axis]
    }

    fn projected_radius(&self, axes: &[Vec3; 3], axis: Vec3) -> f32 {
        self.half_extents.x * axes[0].dot(axis).abs()
            + self.half_extents.y * axes[1].dot(axis).abs()
            + self.half_extents.z * axes[2].dot(axis).abs()
    }

    /// Separating-axis test over the 3 + 3 face normals and 9 edge cross
    /// products. Touching boxes count as intersecting.
    pub fn intersects(&self, other: &Obb) -> bool {
        let a = self.axes();
        let b = other.axes();
        let offset = other.center - self.center;

        let mut candidates = [Vec3::ZERO; 15];
        candidates[..3].copy_from_slice(&a);
        candidates[3..6].copy_from_slice(&b);
        let mut n = 6;
        for ea in &a {
            for eb in &b {
                candidates[n] = ea.cross(*eb);
                n += 1;
            }
        }

        for axis in candidates {
            // Cross products of (near) parallel edges carry no information.
            if axis.length_squared() < PARALLEL_EPS {
                continue;
            }
            let distance = offset.dot(axis).abs();
            let reach = self.projected_radius(&a, axis) + other.projected_radius(&b, axis);
            if distance > reach {
                return false;
            }
        }
        true
    }
}

/// The craft's collision volume, parented to the craft transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionProxy {
    pub half_extents: Vec3,
    /// Offset from the craft origin in craft-local space.
    pub local_offset: Vec3,
}

impl CollisionProxy {
    pub fn from_config(config: &CollisionConfig) -> Self {
        Self {
            half_extents: config.proxy_half_extents(),
            local_offset: Vec3::ZERO,
        }
    }

    pub fn world_box(&self, position: Vec3, rotation: Quat) -> Obb {
        Obb {
            center: self.world_center(position, rotation),
            half_extents: self.half_extents,
            rotation,
        }
    }

    pub fn world_center(&self, position: Vec3, rotation: Quat) -> Vec3 {
        position + rotation * self.local_offset
    }
}

pub fn obstacle_box(obstacle: &Obstacle) -> Obb {
    Obb {
        center: obstacle.transform.translation,
        half_extents: obstacle.half_extents,
        rotation: obstacle.transform.rotation,
    }
}

/// Indices of every obstacle the craft volume overlaps. Does not stop at the
/// first hit.
pub fn obstacle_hits(craft: &Obb, obstacles: &[Obstacle]) -> Vec<usize> {
    obstacles
        .iter()
        .enumerate()
        .filter(|(_, obstacle)| craft.intersects(&obstacle_box(obstacle)))
        .map(|(index, _)| index)
        .collect()
}

pub fn within_pickup(ring: &Ring, proxy_center: Vec3, pickup_radius: f32) -> bool {
    ring.transform.translation.distance_squared(proxy_center) < pickup_radius * pickup_radius
}
