/// Camera trait and a first-person implementation.
///
/// The renderer never moves a camera; the caller updates it (input,
/// window resize) and the frame loop reads the matrices once per frame.

use glam::{Mat4, Vec3};

/// Source of the view and projection matrices
pub trait Camera {
    /// World-to-view transform
    fn view(&self) -> Mat4;

    /// View-to-clip transform (depth range 0..1)
    fn projection(&self) -> Mat4;
}

/// First-person camera: rotate about the camera position, then translate
///
/// Rotation is in degrees around X, then Y, then Z.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstPersonCamera {
    position: Vec3,
    rotation: Vec3,
    fov_degrees: f32,
    aspect: f32,
    near_plane: f32,
    far_plane: f32,
}

impl FirstPersonCamera {
    pub fn new(position: Vec3, rotation: Vec3, fov_degrees: f32, aspect: f32, near_plane: f32, far_plane: f32) -> Self {
        Self { position, rotation, fov_degrees, aspect, near_plane, far_plane }
    }

    /// Camera used by the demo scene, looking down the +X axis
    pub fn with_viewport(width: u32, height: u32, near_plane: f32, far_plane: f32) -> Self {
        Self::new(
            Vec3::new(1.0, 0.75, 0.0),
            Vec3::new(0.0, 90.0, 0.0),
            60.0,
            aspect_ratio(width, height),
            near_plane,
            far_plane,
        )
    }

    // ===== GETTERS =====

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near_plane(&self) -> f32 {
        self.near_plane
    }

    pub fn far_plane(&self) -> f32 {
        self.far_plane
    }

    // ===== SETTERS =====

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    /// Move by `delta` in world space
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Add `delta` degrees to the rotation
    pub fn rotate(&mut self, delta: Vec3) {
        self.rotation += delta;
    }

    /// Update the aspect ratio after a window resize
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }
}

impl Camera for FirstPersonCamera {
    fn view(&self) -> Mat4 {
        let rotation = Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians());
        rotation * Mat4::from_translation(self.position)
    }

    fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near_plane, self.far_plane)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
