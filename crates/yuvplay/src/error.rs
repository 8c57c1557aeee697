//! Errors surfaced by the renderer, the shader manager, and the frame source.
//!
//! Construction-time failures (`UnsupportedContext`, `UnsupportedFormat`,
//! `ShaderCompile`, `ProgramLink`) are fatal for the renderer instance being
//! built. Per-frame failures (`FrameSize`, `Surface`) leave the renderer usable
//! for the next frame; the caller decides whether to retry.

use std::fmt;

use crate::render::backend::ShaderStage;

/// Errors produced by this crate.
#[derive(Debug)]
pub enum Error {
    /// No usable GPU context could be obtained for the target surface.
    UnsupportedContext(String),
    /// The requested pixel format is not one of the supported formats.
    UnsupportedFormat(String),
    /// A shader stage failed to compile. Carries the compiler log and the
    /// preprocessed source that was handed to the compiler.
    ShaderCompile {
        stage: ShaderStage,
        log: String,
        source: String,
    },
    /// The program failed to link.
    ProgramLink { log: String },
    /// The frame buffer is too short for the declared dimensions.
    FrameSize {
        width: u32,
        height: u32,
        format: &'static str,
        required: usize,
        actual: usize,
    },
    /// `render` was called after `destroy`.
    Disposed,
    /// The presentation surface could not provide a frame.
    Surface(String),
    /// A configuration value is out of range or malformed.
    InvalidOption(String),
    /// Reading from the frame source failed.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedContext(e) => write!(f, "no usable GPU context: {e}"),
            Error::UnsupportedFormat(name) => write!(f, "unsupported pixel format \"{name}\""),
            Error::ShaderCompile { stage, log, source } => {
                write!(f, "errors while compiling {stage} shader: {log}\n{source}")
            }
            Error::ProgramLink { log } => write!(f, "errors while linking: {log}"),
            Error::FrameSize {
                width,
                height,
                format,
                required,
                actual,
            } => write!(
                f,
                "{format} frame {width}x{height} needs {required} bytes, got {actual}"
            ),
            Error::Disposed => write!(f, "renderer has been destroyed"),
            Error::Surface(e) => write!(f, "surface error: {e}"),
            Error::InvalidOption(e) => write!(f, "invalid option: {e}"),
            Error::Io(e) => write!(f, "frame source read failed: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Shorthand used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_message_names_both_lengths() {
        let err = Error::FrameSize {
            width: 4,
            height: 4,
            format: "nv12",
            required: 24,
            actual: 23,
        };
        let msg = err.to_string();
        assert!(msg.contains("24"));
        assert!(msg.contains("23"));
        assert!(msg.contains("nv12"));
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err: Error = std::io::Error::other("disk gone").into();
        assert!(std::error::Error::source(&err).is_some());
    }
}
