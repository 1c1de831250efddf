// src/camera.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::config::RoomSpec;

/// Perspective camera looking at a target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,

    pub fovy: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3, fovy_radians: f32, aspect: f32, znear: f32, zfar: f32) -> Self {
        Self {
            position,
            target,
            fovy: fovy_radians,
            aspect,
            znear,
            zfar,
        }
    }

    /// Right-handed, Y up.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn proj_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn view_proj_matrix(&self) -> Mat4 {
        self.proj_matrix() * self.view_matrix()
    }

    /// Update aspect ratio (call on resize). Degenerate sizes are ignored.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Vec3::new(3.5, 2.5, 3.5),
            Vec3::ZERO,
            55f32.to_radians(),
            16.0 / 9.0,
            0.01,
            500.0,
        )
    }
}

/// GPU camera uniform (matches shader layout).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    /// Column-major 4x4 matrix
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_proj_matrix().to_cols_array_2d(),
        }
    }
}

/// Slow showroom orbit around the room center.
///
/// The radius follows the smaller room dimension so the camera stays over the
/// floor. Room size comes from the scene snapshot, not from the input form.
#[derive(Debug, Clone, Copy)]
pub struct OrbitController {
    pub angle: f32,
    /// Radians per frame.
    pub speed: f32,
    pub height: f32,
    /// Fraction of the smaller room dimension.
    pub radius_factor: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            angle: 0.0,
            speed: 0.003,
            height: 2.4,
            radius_factor: 0.48,
        }
    }
}

impl OrbitController {
    pub fn radius(&self, room: &RoomSpec) -> f32 {
        self.radius_factor * room.length_m.min(room.width_m) as f32
    }

    /// Advances one frame and moves `camera` onto the orbit.
    pub fn update_camera(&mut self, camera: &mut Camera, room: &RoomSpec) {
        self.angle = (self.angle + self.speed) % std::f32::consts::TAU;
        let r = self.radius(room);
        camera.position = Vec3::new(self.angle.sin() * r, self.height, self.angle.cos() * r);
        camera.target = Vec3::ZERO;
    }
}
