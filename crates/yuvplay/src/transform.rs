//! # Transform Stack — Model, View, and Projection Matrices
//!
//! ```text
//! model space ─{model}─► world space ─{view}─► view space ─{projection}─► clip space
//! ```
//!
//! Three [`MatrixState`]s drive the vertex shader's uniforms:
//!
//! - **Projection** comes from the camera's [`Frustum`] and is fixed once the
//!   camera is built. A different field of view means a new camera.
//! - **View** is the inverse of the camera's translation, set by
//!   [`PerspectiveCamera::set_position`].
//! - **Model** is owned by the [`ViewController`]: translate, scale, or rotate
//!   the frame quad.
//!
//! ## Deferred Uploads
//!
//! Mutators only mark a matrix dirty. The renderer calls `update` on the camera
//! and the view controller once per frame, right before the draw, and only
//! dirty matrices are written. Calling `update` twice in a row writes nothing
//! the second time.
//!
//! ## Latest Operation Wins
//!
//! Every model operation is applied to a fixed base matrix (the aspect-ratio
//! pre-scale), not to the previous model matrix. `translate` followed by
//! `scale` leaves only the scale in effect. To combine operations, build the
//! matrix yourself and use [`ViewController::set_matrix`].

use crate::math::{Frustum, Mat4, Vec3};

/// Uniform name of the model matrix.
pub const MODEL_MATRIX: &str = "modelMatrix";
/// Uniform name of the view matrix.
pub const VIEW_MATRIX: &str = "viewMatrix";
/// Uniform name of the projection matrix.
pub const PROJECTION_MATRIX: &str = "projectionMatrix";

/// Default camera field of view, in degrees.
pub const DEFAULT_FOV_DEGREES: f32 = 75.0;

/// Something that accepts named 4x4 matrix uniforms.
pub trait UniformTarget {
    fn set_uniform_matrix(&mut self, name: &str, matrix: &Mat4);
}

/// A 4x4 matrix bound to a uniform name, with a dirty flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixState {
    name: &'static str,
    matrix: Mat4,
    dirty: bool,
}

impl MatrixState {
    /// New state. Starts dirty so the first `flush` uploads it.
    pub fn new(name: &'static str, matrix: Mat4) -> Self {
        Self {
            name,
            matrix,
            dirty: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the matrix and mark it dirty.
    pub fn set(&mut self, matrix: Mat4) {
        self.matrix = matrix;
        self.dirty = true;
    }

    /// Push the matrix if dirty, then clear the flag. Returns whether a write
    /// happened.
    pub fn flush(&mut self, target: &mut impl UniformTarget) -> bool {
        if !self.dirty {
            return false;
        }
        target.set_uniform_matrix(self.name, &self.matrix);
        self.dirty = false;
        true
    }
}

// ── Camera ──────────────────────────────────────────────────────────────

/// Perspective camera: owns the view and projection matrices.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    frustum: Frustum,
    position: Vec3,
    view: MatrixState,
    projection: MatrixState,
}

impl PerspectiveCamera {
    /// Build a camera at the origin.
    pub fn new(frustum: Frustum) -> Self {
        Self {
            frustum,
            position: Vec3::ZERO,
            view: MatrixState::new(VIEW_MATRIX, Mat4::IDENTITY),
            projection: MatrixState::new(PROJECTION_MATRIX, frustum.projection()),
        }
    }

    /// Camera with the default field of view for the given aspect ratio.
    pub fn with_aspect(aspect: f32) -> Self {
        Self::new(Frustum::new(DEFAULT_FOV_DEGREES.to_radians(), aspect))
    }

    /// Move the camera. The view matrix becomes the inverse translation.
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
        self.view.set(Mat4::from_translation(self.position).inverse());
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn frustum(&self) -> Frustum {
        self.frustum
    }

    pub fn view(&self) -> &MatrixState {
        &self.view
    }

    pub fn projection(&self) -> &MatrixState {
        &self.projection
    }

    /// Push dirty matrices, view first. Returns the number of writes.
    pub fn update(&mut self, target: &mut impl UniformTarget) -> usize {
        usize::from(self.view.flush(target)) + usize::from(self.projection.flush(target))
    }
}

// ── View controller ─────────────────────────────────────────────────────

/// Owns the model matrix of the frame quad.
#[derive(Debug, Clone)]
pub struct ViewController {
    base: Mat4,
    model: MatrixState,
}

impl ViewController {
    /// Build a controller whose base matrix squashes the unit quad to
    /// `aspect` (width over height), then apply an identity scale.
    pub fn new(aspect: f32) -> Self {
        let mut controller = Self {
            base: Mat4::from_scale(Vec3::new(1.0, 1.0 / aspect, 1.0)),
            model: MatrixState::new(MODEL_MATRIX, Mat4::IDENTITY),
        };
        controller.scale(1.0, 1.0, 1.0);
        controller
    }

    /// The fixed base matrix every operation starts from.
    pub fn base(&self) -> Mat4 {
        self.base
    }

    pub fn model(&self) -> &MatrixState {
        &self.model
    }

    /// Model = base · translation.
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.model
            .set(self.base * Mat4::from_translation(Vec3::new(x, y, z)));
    }

    /// Model = base · scale.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.model.set(self.base * Mat4::from_scale(Vec3::new(x, y, z)));
    }

    /// Model = base · rotation of `radians` around `axis`. A zero-length axis
    /// leaves the model matrix untouched.
    pub fn rotate_on_axis(&mut self, radians: f32, axis: Vec3) {
        let Some(axis) = axis.try_normalize() else {
            log::warn!("rotate_on_axis: ignoring zero-length axis");
            return;
        };
        self.model
            .set(self.base * Mat4::from_axis_angle(axis, radians));
    }

    /// Rotate around the Z axis (in the plane of the frame).
    pub fn rotate(&mut self, radians: f32) {
        self.rotate_on_axis(radians, Vec3::Z);
    }

    /// Replace the model matrix outright, bypassing the base matrix.
    pub fn set_matrix(&mut self, matrix: Mat4) {
        self.model.set(matrix);
    }

    /// Push the model matrix if dirty.
    pub fn update(&mut self, target: &mut impl UniformTarget) -> bool {
        self.model.flush(target)
    }
}
