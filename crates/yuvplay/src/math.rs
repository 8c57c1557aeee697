//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Frustum`] holds the perspective parameters the
//! camera is built from, and the `QUAD_*` tables describe the unit quad every
//! frame is drawn onto.

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// Corner positions of the unit quad, in triangle-strip order.
///
/// ```text
///  2 ──── 3
///  │  ╲   │
///  │   ╲  │
///  0 ──── 1
/// ```
pub const QUAD_POSITIONS: [f32; 12] = [
    -1.0, -1.0, 0.0, // left,  bottom
    1.0, -1.0, 0.0, // right, bottom
    -1.0, 1.0, 0.0, // left,  top
    1.0, 1.0, 0.0, // right, top
];

/// Texture coordinates matching [`QUAD_POSITIONS`] corner for corner.
pub const QUAD_UVS: [f32; 8] = [
    0.0, 0.0, //
    1.0, 0.0, //
    0.0, 1.0, //
    1.0, 1.0, //
];

/// Number of vertices in the quad strip.
pub const QUAD_VERTEX_COUNT: u32 = 4;

/// Perspective frustum parameters.
///
/// The projection is right-handed with a 0..1 depth range, which is what the
/// wgpu backend's depth buffer expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Frustum {
    /// Default near plane distance.
    pub const NEAR: f32 = 0.1;
    /// Default far plane distance.
    pub const FAR: f32 = 100.0;

    /// A frustum with the default near/far planes.
    pub fn new(fov_y: f32, aspect: f32) -> Self {
        Self {
            fov_y,
            aspect,
            near: Self::NEAR,
            far: Self::FAR,
        }
    }

    /// Override the clip planes.
    pub fn with_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Compute the projection matrix.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}
