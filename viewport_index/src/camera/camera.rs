/// Camera: view and projection matrices of the active viewer camera.
///
/// Camera controllers (orbit, trackball, walk...) live in the host
/// application and write their result here. The index only reads the
/// combined view-projection matrix and the frustum derived from it.

use glam::{Mat4, Vec3};
use super::frustum::Frustum;

/// Viewer camera. A passive data container.
///
/// Projection matrices are expected in the glam `*_rh` convention
/// (right-handed, depth range [0, 1]).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl Camera {
    /// Create a camera from explicit matrices.
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
        }
    }

    /// Perspective camera at `eye` looking at `target`.
    ///
    /// # Arguments
    ///
    /// * `fov_y` - Vertical field of view in radians
    /// * `aspect` - Viewport width / height
    pub fn look_at_perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            view_matrix: Mat4::look_at_rh(eye, target, up),
            projection_matrix: Mat4::perspective_rh(fov_y, aspect, near, far),
        }
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Frustum planes extracted from the view-projection matrix.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }

    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        self.view_matrix.inverse().col(3).truncate()
    }

    /// True when both matrices hold only finite values.
    pub fn is_finite(&self) -> bool {
        self.view_matrix.is_finite() && self.projection_matrix.is_finite()
    }

    // ===== SETTERS =====

    /// Set the view matrix.
    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    /// Set the projection matrix.
    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
