/// Model transforms for placing mesh instances
use nalgebra::{Matrix4, Vector3};

/// Euler rotation (radians) applied about X, then Y, then Z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_euler_angles(self.x, self.y, self.z)
    }
}

/// Translation, rotation and uniform scale of one mesh instance.
///
/// The matrix scales first, then rotates, then translates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub translation: Vector3<f32>,
    pub rotation: RotationState,
    pub scale: f32,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: RotationState::default(),
            scale: 1.0,
        }
    }
}

impl ModelTransform {
    pub fn at(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.translation)
            * self.rotation.matrix()
            * Matrix4::new_scaling(self.scale)
    }
}

/// Create a model-view-projection matrix
pub fn mvp_matrix(
    model: &Matrix4<f32>,
    view: &Matrix4<f32>,
    projection: &Matrix4<f32>,
) -> Matrix4<f32> {
    projection * view * model
}
