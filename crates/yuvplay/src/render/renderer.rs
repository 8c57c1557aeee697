//! # Frame Renderer — Draws Decoded 4:2:0 Frames
//!
//! [`FrameRenderer`] owns every GPU object needed to put one frame on screen:
//! the program, two static vertex buffers for the unit quad, one texture per
//! sample of the pixel format, and the transform stack.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──new()──► Initialized ──render()──► Rendering ◄─┐
//!                               │                        │  └─────┘ render()
//!                               └──────── destroy() ─────┴──► Destroyed
//! ```
//!
//! Construction either completes or fails as a whole; there is no partially
//! built renderer. After [`destroy`](FrameRenderer::destroy) every `render`
//! fails with [`Error::Disposed`].
//!
//! ## Per-frame sequence
//!
//! 1. Check the buffer covers every plane (else [`Error::FrameSize`], nothing
//!    is touched)
//! 2. Viewport = surface size, clear colour and depth
//! 3. Upload each plane into its texture
//! 4. Push dirty matrices (view, projection, model)
//! 5. Draw a 4-vertex triangle strip and present
//!
//! ```no_run
//! # fn demo(backend: impl yuvplay::render::GraphicsBackend, frame: &[u8]) -> yuvplay::Result<()> {
//! use yuvplay::config::RendererOptions;
//! use yuvplay::render::FrameRenderer;
//!
//! let opts = RendererOptions::default().with_format("nv12");
//! let mut renderer = FrameRenderer::new(backend, opts)?;
//! renderer.view_controller_mut().scale(0.5, 0.5, 1.0);
//! renderer.render(1920, 1080, frame)?;
//! # Ok(())
//! # }
//! ```

use super::backend::{
    BufferHandle, ClearState, FilterMode, GraphicsBackend, PixelStore, ProgramHandle, Viewport,
};
use super::shader::{
    self, FRAGMENT_SOURCE, FRAME_PROGRAM_LAYOUT, POSITION_ATTRIBUTE, Program, UV_ATTRIBUTE,
    VERTEX_SOURCE,
};
use super::texture::TextureSet;
use crate::config::RendererOptions;
use crate::error::{Error, Result};
use crate::math::{Mat4, QUAD_POSITIONS, QUAD_UVS, QUAD_VERTEX_COUNT};
use crate::pixel_format::PixelFormat;
use crate::transform::{PerspectiveCamera, UniformTarget, ViewController};

/// Where a renderer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererState {
    /// Resources are still being allocated. `new` moves out of this state
    /// before returning the renderer.
    #[default]
    Uninitialized,
    /// Built, nothing drawn yet.
    Initialized,
    /// At least one frame drawn.
    Rendering,
    /// Resources released.
    Destroyed,
}

/// Forwards matrix writes to one program's uniforms.
struct ProgramUniforms<'a, B: GraphicsBackend> {
    backend: &'a mut B,
    program: ProgramHandle,
}

impl<B: GraphicsBackend> UniformTarget for ProgramUniforms<'_, B> {
    fn set_uniform_matrix(&mut self, name: &str, matrix: &Mat4) {
        self.backend.set_uniform_matrix(self.program, name, matrix);
    }
}

/// Renders frames of one pixel format onto one surface.
pub struct FrameRenderer<B: GraphicsBackend> {
    backend: B,
    state: RendererState,
    format: PixelFormat,
    options: RendererOptions,
    program: Option<Program>,
    buffers: Vec<BufferHandle>,
    textures: TextureSet,
    camera: PerspectiveCamera,
    view: ViewController,
    clear: ClearState,
}

impl<B: GraphicsBackend> FrameRenderer<B> {
    /// Build a renderer on `backend`.
    ///
    /// Options and the pixel format are validated before the backend is
    /// touched, so an unknown format allocates nothing.
    pub fn new(mut backend: B, options: RendererOptions) -> Result<Self> {
        options.validate()?;
        let format = options.pixfmt.resolve()?;

        let (width, height) = backend.surface_size();
        if width == 0 || height == 0 {
            return Err(Error::UnsupportedContext(format!(
                "surface has no area ({width}x{height})"
            )));
        }

        backend.set_pixel_store(PixelStore {
            align: options.align,
            flip_y: options.flip_y,
        });

        let program = shader::compile_and_link(
            &mut backend,
            VERTEX_SOURCE,
            FRAGMENT_SOURCE,
            &FRAME_PROGRAM_LAYOUT,
            format,
            options.mode,
        )?;

        let buffers = vec![
            backend.create_vertex_buffer(program.handle, POSITION_ATTRIBUTE, &QUAD_POSITIONS),
            backend.create_vertex_buffer(program.handle, UV_ATTRIBUTE, &QUAD_UVS),
        ];

        let mut textures = TextureSet::new();
        for &sample in format.samples() {
            textures.create(&mut backend, program.handle, sample, FilterMode::Linear);
        }

        let mut camera = PerspectiveCamera::with_aspect(width as f32 / height as f32);
        camera.set_position(0.0, 0.0, 1.0);
        let view = ViewController::new(options.aspect);

        let mut renderer = Self {
            backend,
            state: RendererState::default(),
            format,
            options,
            program: Some(program),
            buffers,
            textures,
            camera,
            view,
            clear: ClearState::default(),
        };
        renderer.update_transforms();
        renderer.state = RendererState::Initialized;

        log::info!(
            "frame renderer ready: {format}, {} texture(s), surface {width}x{height}",
            renderer.textures.len()
        );
        Ok(renderer)
    }

    /// Resize the presentation surface. The viewport follows on the next
    /// frame; the camera's aspect ratio does not change.
    pub fn set_size(&mut self, width: u32, height: u32) {
        log::debug!("surface resized to {width}x{height}");
        self.backend.resize_surface(width, height);
    }

    /// Upload and draw one frame.
    ///
    /// `frame` must hold at least the bytes the layout for `width`x`height`
    /// requires; extra trailing bytes are ignored. A [`Error::FrameSize`] or
    /// [`Error::Surface`] failure leaves the renderer ready for the next frame.
    pub fn render(&mut self, width: u32, height: u32, frame: &[u8]) -> Result<()> {
        if self.state == RendererState::Destroyed {
            return Err(Error::Disposed);
        }

        let layout = self.format.frame_layout(width, height, self.options.align);
        layout.check(frame.len())?;

        let viewport = Viewport::full(self.backend.surface_size());
        self.backend.begin_frame(viewport, self.clear);
        self.textures.upload_frame(&mut self.backend, &layout, frame);
        self.update_transforms();
        self.backend.draw_triangle_strip(0, QUAD_VERTEX_COUNT);

        self.state = RendererState::Rendering;
        self.backend.end_frame()
    }

    /// Clear the surface and present without drawing the quad.
    pub fn clear_screen(&mut self) -> Result<()> {
        if self.state == RendererState::Destroyed {
            return Err(Error::Disposed);
        }
        let viewport = Viewport::full(self.backend.surface_size());
        self.backend.begin_frame(viewport, self.clear);
        self.backend.end_frame()
    }

    /// Push every dirty matrix: view, projection, then model. Returns the
    /// number of uniform writes.
    pub fn update_transforms(&mut self) -> usize {
        let Some(program) = self.program else {
            return 0;
        };
        let mut target = ProgramUniforms {
            backend: &mut self.backend,
            program: program.handle,
        };
        self.camera.update(&mut target) + usize::from(self.view.update(&mut target))
    }

    /// Release the program, shaders, buffers, and textures. Calling it again
    /// does nothing.
    pub fn destroy(&mut self) {
        if self.state == RendererState::Destroyed {
            return;
        }

        self.textures.release(&mut self.backend);
        for buffer in self.buffers.drain(..) {
            self.backend.delete_buffer(buffer);
        }
        if let Some(program) = self.program.take() {
            program.release(&mut self.backend);
        }

        self.state = RendererState::Destroyed;
        log::info!("frame renderer destroyed");
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    pub fn textures(&self) -> &TextureSet {
        &self.textures
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// Camera mutations are pushed before the next draw.
    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    pub fn view_controller(&self) -> &ViewController {
        &self.view
    }

    /// Model mutations are pushed before the next draw.
    pub fn view_controller_mut(&mut self) -> &mut ViewController {
        &mut self.view
    }

    /// Colour and depth the next frames are cleared to.
    pub fn set_clear_state(&mut self, clear: ClearState) {
        self.clear = clear;
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: GraphicsBackend> Drop for FrameRenderer<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}
