//! Camera module: camera, frustum, and viewport collaborators.
//!
//! Passive data containers describing what the viewer currently sees.
//! The index never drives a camera; it reads matrices and pixel sizes
//! from snapshots handed to it by the host.

mod camera;
mod frustum;
mod viewport;

pub use camera::Camera;
pub use frustum::{Frustum, FrustumTest};
pub use viewport::Viewport;
