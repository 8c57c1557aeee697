//! Convenience re-exports: `use yuvplay::prelude::*` for the common items.

pub use crate::config::{DisplayMode, FormatId, PlayerConfig, RendererOptions, Resolution};
pub use crate::error::{Error, Result};
pub use crate::math::{Frustum, Mat4, Quat, Vec2, Vec3, Vec4};
pub use crate::pixel_format::{FrameLayout, PixelFormat, PlaneFormat};
pub use crate::render::{ClearState, FilterMode, FrameRenderer, GraphicsBackend, RendererState};
pub use crate::source::{FinishStats, SourceConfig, SourceEvent, SourceHandle, spawn_source};
pub use crate::time::Clock;
pub use crate::transform::{PerspectiveCamera, ViewController};

#[cfg(feature = "gpu")]
pub use crate::player::play;
#[cfg(feature = "gpu")]
pub use crate::render::WgpuBackend;
