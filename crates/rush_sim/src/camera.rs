use glam::{Mat3, Mat4, Quat, Vec3};

use crate::config::CameraConfig;
use crate::pool::Anchor;
use crate::pose::Axes;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Chase camera trailing the craft. Reads the craft transform, writes only
/// its own pose.
#[derive(Debug, Clone)]
pub struct ChaseCamera {
    pub position: Vec3,
    pub target: Vec3,
    config: CameraConfig,
}

impl ChaseCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            position: Vec3::from_array(config.start_position),
            target: Vec3::from_array(config.start_target),
            config,
        }
    }

    pub fn reset(&mut self) {
        self.position = Vec3::from_array(self.config.start_position);
        self.target = Vec3::from_array(self.config.start_target);
    }

    /// Where the camera wants to sit for a craft at `position` with `axes`.
    pub fn desired_position(&self, position: Vec3, axes: &Axes) -> Vec3 {
        position - axes.forward * self.config.follow_distance + axes.up * self.config.follow_height
    }

    /// Close a fixed fraction of the gap to the desired pose and re-aim ahead
    /// of the craft. The blend is per frame, not per second.
    pub fn follow(&mut self, position: Vec3, axes: &Axes) {
        let desired = self.desired_position(position, axes);
        self.position = self.position.lerp(desired, self.config.blend);
        self.target = position + axes.forward * self.config.look_ahead;
    }

    /// Camera orientation with world-up as the roll reference, falling back
    /// to `fallback_up` when looking straight up or down.
    pub fn rotation(&self, fallback_up: Vec3) -> Quat {
        let forward = (self.target - self.position).normalize_or_zero();
        if forward == Vec3::ZERO {
            return Quat::IDENTITY;
        }
        let mut right = Vec3::Y.cross(forward);
        if right.length_squared() < 1e-8 {
            right = fallback_up.cross(forward);
        }
        let right = right.normalize_or(Vec3::X);
        let up = forward.cross(right);
        Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize()
    }

    pub fn anchor(&self, fallback_up: Vec3) -> Anchor {
        Anchor::new(self.position, self.rotation(fallback_up))
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(
            self.config.fov_y,
            self.config.aspect,
            self.config.near,
            self.config.far,
        );
        CameraUniform {
            view_proj: (proj * view).to_cols_array_2d(),
        }
    }
}
