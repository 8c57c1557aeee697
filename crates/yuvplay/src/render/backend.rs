//! # Backend — The GPU Object Model the Renderer Drives
//!
//! [`GraphicsBackend`] is the seam between the frame renderer and a concrete
//! GPU API. It exposes a small GL-shaped object model:
//!
//! ```text
//! create_shader ×2 ──► link_program ──► use_program
//!                           │
//!          ┌────────────────┼─────────────────────┐
//!          ▼                ▼                     ▼
//!   create_vertex_buffer  create_texture(unit)  set_uniform_matrix(name)
//!   (position, uv)        set_sampler_unit      (model/view/projection)
//!                         upload_plane
//!
//! per frame: begin_frame(viewport, clear) → upload → uniforms → draw → end_frame
//! ```
//!
//! Compilation and linking report status through `shader_log` /
//! `program_log` rather than a `Result`, so the caller owns the decision to
//! release a failed object. The program manager in [`shader`](super::shader)
//! relies on that to delete failed objects before returning an error.
//!
//! The wgpu implementation lives in [`gpu`](super::gpu).

use std::fmt;

use crate::error::Result;
use crate::math::Mat4;
use crate::pixel_format::PlaneFormat;

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Handle to a shader object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub usize);

/// Handle to a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub usize);

/// Handle to a static vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub usize);

/// Handle to a sampled texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub usize);

/// Texture minification/magnification filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    Linear,
    Nearest,
}

/// One vertex attribute slot, bound to a name before linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    /// Shader `@location`.
    pub location: u32,
    /// Number of `f32` components per vertex.
    pub components: u32,
}

/// Everything a backend must know about a program before it can link it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramLayout {
    /// Vertex attributes, one vertex buffer each.
    pub attributes: &'static [VertexAttribute],
    /// Names of the `mat4x4` uniforms, in declaration order.
    pub matrices: &'static [&'static str],
}

/// Row-unpacking state applied to every subsequent plane upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelStore {
    /// Row alignment of source data.
    pub align: u32,
    /// Reverse row order while uploading.
    pub flip_y: bool,
}

impl Default for PixelStore {
    fn default() -> Self {
        Self {
            align: 1,
            flip_y: false,
        }
    }
}

/// A plane of texels ready for upload.
#[derive(Debug, Clone, Copy)]
pub struct PlaneImage<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PlaneFormat,
    /// Source row stride in bytes.
    pub bytes_per_row: usize,
    pub data: &'a [u8],
}

/// Viewport rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// A viewport covering a whole surface.
    pub fn full(size: (u32, u32)) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.0,
            height: size.1,
        }
    }
}

/// Values the colour and depth buffers are cleared to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearState {
    pub color: [f64; 4],
    pub depth: f32,
}

impl Default for ClearState {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            depth: 1.0,
        }
    }
}

/// A GPU context bound to one presentation surface.
///
/// All calls happen on the thread that owns the context. One backend serves
/// exactly one renderer.
pub trait GraphicsBackend {
    /// Current surface size in pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Resize the presentation surface.
    fn resize_surface(&mut self, width: u32, height: u32);

    /// Set row alignment and vertical flip for later uploads.
    fn set_pixel_store(&mut self, store: PixelStore);

    // ── Shaders & programs ──────────────────────────────────────────────

    /// Create and compile a shader object.
    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> ShaderHandle;

    /// Compile diagnostics, or `None` if the shader compiled.
    fn shader_log(&self, shader: ShaderHandle) -> Option<String>;

    fn delete_shader(&mut self, shader: ShaderHandle);

    /// Link two compiled shaders into a program.
    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
        layout: &ProgramLayout,
    ) -> ProgramHandle;

    /// Link diagnostics, or `None` if the program linked.
    fn program_log(&self, program: ProgramHandle) -> Option<String>;

    fn delete_program(&mut self, program: ProgramHandle);

    /// Make `program` current for subsequent draws and uniform writes.
    fn use_program(&mut self, program: ProgramHandle);

    // ── Resources ───────────────────────────────────────────────────────

    /// Create a static vertex buffer feeding the named attribute.
    fn create_vertex_buffer(
        &mut self,
        program: ProgramHandle,
        attribute: &str,
        data: &[f32],
    ) -> BufferHandle;

    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Create a clamp-to-edge texture bound to texture unit `unit`.
    fn create_texture(&mut self, unit: u32, filter: FilterMode) -> TextureHandle;

    /// Point the named sampler uniform at texture unit `unit`.
    fn set_sampler_unit(&mut self, program: ProgramHandle, uniform: &str, unit: u32);

    /// Upload a whole plane into a texture, replacing its contents.
    fn upload_plane(&mut self, texture: TextureHandle, plane: &PlaneImage<'_>);

    fn delete_texture(&mut self, texture: TextureHandle);

    /// Write a `mat4x4` uniform by name.
    fn set_uniform_matrix(&mut self, program: ProgramHandle, uniform: &str, matrix: &Mat4);

    // ── Frame ───────────────────────────────────────────────────────────

    /// Start a frame: set the viewport and clear colour + depth.
    fn begin_frame(&mut self, viewport: Viewport, clear: ClearState);

    /// Draw `count` vertices as a triangle strip with the current program.
    fn draw_triangle_strip(&mut self, first: u32, count: u32);

    /// Finish the frame and present it.
    fn end_frame(&mut self) -> Result<()>;
}

impl<B: GraphicsBackend + ?Sized> GraphicsBackend for &mut B {
    fn surface_size(&self) -> (u32, u32) {
        (**self).surface_size()
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        (**self).resize_surface(width, height)
    }

    fn set_pixel_store(&mut self, store: PixelStore) {
        (**self).set_pixel_store(store)
    }

    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> ShaderHandle {
        (**self).create_shader(stage, source)
    }

    fn shader_log(&self, shader: ShaderHandle) -> Option<String> {
        (**self).shader_log(shader)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        (**self).delete_shader(shader)
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
        layout: &ProgramLayout,
    ) -> ProgramHandle {
        (**self).link_program(vertex, fragment, layout)
    }

    fn program_log(&self, program: ProgramHandle) -> Option<String> {
        (**self).program_log(program)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        (**self).delete_program(program)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        (**self).use_program(program)
    }

    fn create_vertex_buffer(
        &mut self,
        program: ProgramHandle,
        attribute: &str,
        data: &[f32],
    ) -> BufferHandle {
        (**self).create_vertex_buffer(program, attribute, data)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        (**self).delete_buffer(buffer)
    }

    fn create_texture(&mut self, unit: u32, filter: FilterMode) -> TextureHandle {
        (**self).create_texture(unit, filter)
    }

    fn set_sampler_unit(&mut self, program: ProgramHandle, uniform: &str, unit: u32) {
        (**self).set_sampler_unit(program, uniform, unit)
    }

    fn upload_plane(&mut self, texture: TextureHandle, plane: &PlaneImage<'_>) {
        (**self).upload_plane(texture, plane)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        (**self).delete_texture(texture)
    }

    fn set_uniform_matrix(&mut self, program: ProgramHandle, uniform: &str, matrix: &Mat4) {
        (**self).set_uniform_matrix(program, uniform, matrix)
    }

    fn begin_frame(&mut self, viewport: Viewport, clear: ClearState) {
        (**self).begin_frame(viewport, clear)
    }

    fn draw_triangle_strip(&mut self, first: u32, count: u32) {
        (**self).draw_triangle_strip(first, count)
    }

    fn end_frame(&mut self) -> Result<()> {
        (**self).end_frame()
    }
}
