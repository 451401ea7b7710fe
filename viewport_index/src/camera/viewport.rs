/// Viewport: pixel size of the drawing surface plus its active camera.
///
/// `IndexingPipeline::index_view()` takes a snapshot of this at call start,
/// so later resizes or camera moves never leak into a running rebuild.

use super::camera::Camera;

/// Drawing surface snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    camera: Camera,
}

impl Viewport {
    pub fn new(width: u32, height: u32, camera: Camera) -> Self {
        Self { width, height, camera }
    }

    // ===== GETTERS =====

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width / height. 0.0 for a zero-height viewport.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// True when the viewport has a non-zero size and a finite camera.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.camera.is_finite()
    }

    // ===== SETTERS =====

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn test_viewport_aspect_and_resize() {
        let mut viewport = Viewport::new(800, 600, Camera::new(Mat4::IDENTITY, Mat4::IDENTITY));
        assert!((viewport.aspect() - 4.0 / 3.0).abs() < 1e-6);
        assert!(viewport.is_valid());

        viewport.resize(0, 600);
        assert!(!viewport.is_valid());
        viewport.resize(640, 0);
        assert_eq!(viewport.aspect(), 0.0);
    }

    #[test]
    fn test_viewport_camera_access() {
        let mut viewport = Viewport::new(100, 100, Camera::new(Mat4::IDENTITY, Mat4::IDENTITY));
        viewport.camera_mut().set_view(Mat4::from_scale(glam::Vec3::splat(2.0)));
        assert_eq!(viewport.camera().view_matrix().x_axis.x, 2.0);

        viewport.set_camera(Camera::new(Mat4::IDENTITY, Mat4::from_cols_array(&[f32::NAN; 16])));
        assert!(!viewport.is_valid());
    }
}
