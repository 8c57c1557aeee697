//! # yuvplay — GPU Playback of Raw 4:2:0 Video
//!
//! Draws YUV420P, NV12, and NV21 frames as RGB on a textured quad, with a
//! small model/view/projection transform stack for positioning the picture.
//!
//! ```text
//! source thread ──frames──► FrameRenderer ──► GraphicsBackend (wgpu)
//!  (paced reads)              │  ├─ shader program (per pixel format)
//!                             │  ├─ one texture per plane
//!                             │  └─ camera + view controller
//! ```
//!
//! Start with `use yuvplay::prelude::*`. The `gpu` feature (on by default)
//! adds the wgpu backend and a windowed player; without it the renderer runs
//! against any [`GraphicsBackend`](render::GraphicsBackend).

pub mod config;
pub mod error;
pub mod math;
pub mod pixel_format;
pub mod prelude;
pub mod render;
pub mod source;
pub mod time;
pub mod transform;

#[cfg(feature = "gpu")]
pub mod player;

pub use error::{Error, Result};
