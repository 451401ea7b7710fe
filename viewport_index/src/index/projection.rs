/// Projection stage: world space to viewport pixels.
///
/// Pure and deterministic: the same point, matrix and viewport size always
/// give the same pixel. Points behind the camera or outside the near/far
/// range are rejected instead of being mirrored onto the screen. Volumes are
/// clipped against the near plane only, so a box crossing the camera or
/// reaching past the far plane still covers the pixels it spans.

use glam::{Mat4, Vec3, Vec4};
use crate::bounds::AABB;
use crate::camera::Viewport;
use super::sample::ScreenRect;

/// Clip-space w at or below this is treated as behind the camera.
pub const BEHIND_CAMERA_EPSILON: f32 = 1e-6;

/// A projected pixel position, origin top-left, y down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

/// Project one world position into pixel coordinates.
///
/// Returns `None` when the point is behind the camera (`clip.w <= epsilon`)
/// or its depth falls outside `[0, 1]`.
pub fn project(
    world_position: Vec3,
    view_projection: &Mat4,
    width: u32,
    height: u32,
) -> Option<ScreenPoint> {
    let clip = *view_projection * world_position.extend(1.0);
    if clip.w <= BEHIND_CAMERA_EPSILON || !(0.0..=clip.w).contains(&clip.z) {
        return None;
    }

    clip_to_pixels(clip, width, height)
}

/// Perspective divide and viewport mapping of a clip-space position.
fn clip_to_pixels(clip: Vec4, width: u32, height: u32) -> Option<ScreenPoint> {
    if clip.w <= BEHIND_CAMERA_EPSILON {
        return None;
    }

    let ndc = clip.truncate() / clip.w;
    if !ndc.x.is_finite() || !ndc.y.is_finite() {
        return None;
    }

    Some(ScreenPoint {
        x: ((ndc.x + 1.0) * width as f32 * 0.5).round(),
        y: ((1.0 - ndc.y) * height as f32 * 0.5).round(),
    })
}

/// Viewport-bound projector, built once per `index_view` invocation.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    view_projection: Mat4,
    width: u32,
    height: u32,
}

impl Projector {
    pub fn new(view_projection: Mat4, width: u32, height: u32) -> Self {
        Self { view_projection, width, height }
    }

    /// Projector for the viewport's active camera.
    pub fn from_viewport(viewport: &Viewport) -> Self {
        Self::new(
            viewport.camera().view_projection_matrix(),
            viewport.width(),
            viewport.height(),
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn project(&self, world_position: Vec3) -> Option<ScreenPoint> {
        project(world_position, &self.view_projection, self.width, self.height)
    }

    /// Pixel bounds of the part of the AABB in front of the near plane.
    ///
    /// Corners in front of the near plane project as-is; every box edge
    /// crossing the near plane contributes its intersection point. There is
    /// no far-plane test, that is left to frustum culling. `None` when the
    /// whole box is behind the near plane. The result is not clamped.
    pub fn project_aabb(&self, aabb: &AABB) -> Option<ScreenRect> {
        let clip = aabb.corners().map(|corner| self.view_projection * corner.extend(1.0));
        let mut points: Vec<ScreenPoint> = Vec::with_capacity(20);

        for (i, &from) in clip.iter().enumerate() {
            if from.z >= 0.0 {
                points.extend(clip_to_pixels(from, self.width, self.height));
            }

            // Edges along +X, +Y, +Z (corner index bits 0, 1, 2)
            for bit in [1, 2, 4] {
                if i & bit != 0 {
                    continue;
                }
                let to = clip[i | bit];
                if (from.z >= 0.0) != (to.z >= 0.0) {
                    let on_near = from.lerp(to, from.z / (from.z - to.z));
                    points.extend(clip_to_pixels(on_near, self.width, self.height));
                }
            }
        }

        let mut bounds: Option<(f32, f32, f32, f32)> = None;
        for p in points {
            bounds = Some(match bounds {
                None => (p.x, p.y, p.x, p.y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
                }
            });
        }

        bounds.map(|(min_x, min_y, max_x, max_y)| ScreenRect::from_corners(min_x, min_y, max_x, max_y))
    }

    /// Clamp projected bounds to the viewport.
    ///
    /// The min corner is clamped to the viewport origin and the true max is
    /// kept. `None` when the max lies at negative coordinates, i.e. the
    /// bounds are entirely above or left of the viewport.
    pub fn to_screen_rect(bounds: &ScreenRect) -> Option<ScreenRect> {
        if bounds.right() < 0.0 || bounds.bottom() < 0.0 {
            return None;
        }
        let min_x = bounds.x.max(0.0);
        let min_y = bounds.y.max(0.0);
        Some(ScreenRect::from_corners(min_x, min_y, bounds.right(), bounds.bottom()))
    }
}
