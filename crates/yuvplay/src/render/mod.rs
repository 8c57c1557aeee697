//! Rendering subsystem: the backend seam, shader programs, plane textures,
//! and the frame renderer that ties them together.

pub mod backend;
pub mod directive;
pub mod renderer;
pub mod shader;
pub mod texture;

#[cfg(feature = "gpu")]
pub mod gpu;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{ClearState, FilterMode, GraphicsBackend, PixelStore, ShaderStage, Viewport};
pub use renderer::{FrameRenderer, RendererState};

#[cfg(feature = "gpu")]
pub use gpu::WgpuBackend;
