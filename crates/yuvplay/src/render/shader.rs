//! # Shader Program Manager
//!
//! Turns the two WGSL sources into a linked, current program:
//!
//! ```text
//! source ─► preprocess (PIX_FMT, GRAY_MODE) ─► directive::expand ─► create_shader
//!                                                                      │
//!                         use_program ◄── link_program ◄───────────────┘
//! ```
//!
//! Only the fragment stage is preprocessed. Any failed shader or program
//! object is deleted before the error is returned, so a failed construction
//! never leaves GPU objects behind.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use super::backend::{
    GraphicsBackend, ProgramHandle, ProgramLayout, ShaderHandle, ShaderStage, VertexAttribute,
};
use super::directive;
use crate::config::DisplayMode;
use crate::error::{Error, Result};
use crate::pixel_format::PixelFormat;
use crate::transform::{MODEL_MATRIX, PROJECTION_MATRIX, VIEW_MATRIX};

/// Built-in vertex shader.
pub const VERTEX_SOURCE: &str = include_str!("shaders/yuv.vert.wgsl");
/// Built-in fragment shader. Declares `#define PIX_FMT 0` for preprocessing.
pub const FRAGMENT_SOURCE: &str = include_str!("shaders/yuv.frag.wgsl");

/// Line prepended to the fragment source in gray mode.
pub const GRAY_MODE_DEFINE: &str = "#define GRAY_MODE";

/// Attribute name of the quad corner positions.
pub const POSITION_ATTRIBUTE: &str = "position";
/// Attribute name of the texture coordinates.
pub const UV_ATTRIBUTE: &str = "uv";

/// Vertex inputs and uniforms of the built-in program.
pub const FRAME_PROGRAM_LAYOUT: ProgramLayout = ProgramLayout {
    attributes: &[
        VertexAttribute {
            name: POSITION_ATTRIBUTE,
            location: 0,
            components: 3,
        },
        VertexAttribute {
            name: UV_ATTRIBUTE,
            location: 1,
            components: 2,
        },
    ],
    matrices: &[MODEL_MATRIX, VIEW_MATRIX, PROJECTION_MATRIX],
};

static PIX_FMT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^([ \t]*)#define[ \t]+PIX_FMT[ \t]+\d+")
        .expect("PIX_FMT pattern is valid")
});

/// Rewrite a shader source for a pixel format and display mode.
///
/// For the fragment stage every `#define PIX_FMT <n>` line (any case) gets
/// the format's tag, and gray mode prepends [`GRAY_MODE_DEFINE`]. Running it
/// again with the same arguments returns the same text. Vertex sources pass
/// through unchanged.
pub fn preprocess(source: &str, stage: ShaderStage, format: PixelFormat, mode: DisplayMode) -> String {
    if stage != ShaderStage::Fragment {
        return source.to_owned();
    }

    let replacement = format!("${{1}}#define PIX_FMT {}", format.tag());
    let body = PIX_FMT_RE.replace_all(source, replacement.as_str());

    match mode {
        DisplayMode::Gray if !body.starts_with(GRAY_MODE_DEFINE) => {
            format!("{GRAY_MODE_DEFINE}\n{body}")
        }
        _ => Cow::into_owned(body),
    }
}

/// A linked program and the two shaders it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Program {
    pub handle: ProgramHandle,
    pub vertex: ShaderHandle,
    pub fragment: ShaderHandle,
}

impl Program {
    /// Delete the program and both shaders.
    pub fn release(self, backend: &mut impl GraphicsBackend) {
        backend.delete_program(self.handle);
        backend.delete_shader(self.vertex);
        backend.delete_shader(self.fragment);
    }
}

/// Compile both stages, link them with `layout`, and make the program current.
pub fn compile_and_link<B: GraphicsBackend>(
    backend: &mut B,
    vertex_source: &str,
    fragment_source: &str,
    layout: &ProgramLayout,
    format: PixelFormat,
    mode: DisplayMode,
) -> Result<Program> {
    let vertex = compile(backend, ShaderStage::Vertex, vertex_source, format, mode)?;
    let fragment = match compile(backend, ShaderStage::Fragment, fragment_source, format, mode) {
        Ok(fragment) => fragment,
        Err(e) => {
            backend.delete_shader(vertex);
            return Err(e);
        }
    };

    let handle = backend.link_program(vertex, fragment, layout);
    if let Some(log) = backend.program_log(handle) {
        backend.delete_program(handle);
        backend.delete_shader(vertex);
        backend.delete_shader(fragment);
        return Err(Error::ProgramLink { log });
    }

    backend.use_program(handle);
    log::debug!("linked {format} program ({mode:?})");

    Ok(Program {
        handle,
        vertex,
        fragment,
    })
}

/// Compile one stage. A failed shader is deleted before returning.
pub fn compile<B: GraphicsBackend>(
    backend: &mut B,
    stage: ShaderStage,
    source: &str,
    format: PixelFormat,
    mode: DisplayMode,
) -> Result<ShaderHandle> {
    let source = preprocess(source, stage, format, mode);
    let expanded = directive::expand(&source).map_err(|e| Error::ShaderCompile {
        stage,
        log: e.to_string(),
        source: source.clone(),
    })?;

    let shader = backend.create_shader(stage, &expanded);
    if let Some(log) = backend.shader_log(shader) {
        backend.delete_shader(shader);
        return Err(Error::ShaderCompile { stage, log, source });
    }
    Ok(shader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{Call, RecordingBackend};

    fn build(backend: &mut RecordingBackend, format: PixelFormat, mode: DisplayMode) -> Result<Program> {
        compile_and_link(
            backend,
            VERTEX_SOURCE,
            FRAGMENT_SOURCE,
            &FRAME_PROGRAM_LAYOUT,
            format,
            mode,
        )
    }

    #[test]
    fn substitutes_format_tag() {
        let out = preprocess(FRAGMENT_SOURCE, ShaderStage::Fragment, PixelFormat::Nv21, DisplayMode::Rgba);
        assert!(out.contains("#define PIX_FMT 2"));
        assert!(!out.contains("#define PIX_FMT 0"));
    }

    #[test]
    fn substitution_is_case_insensitive_and_keeps_indent() {
        let src = "  #DEFINE pix_fmt 7\nfn f() {}\n";
        let out = preprocess(src, ShaderStage::Fragment, PixelFormat::Nv12, DisplayMode::Rgba);
        assert_eq!(out, "  #define PIX_FMT 1\nfn f() {}\n");
    }

    #[test]
    fn preprocessing_is_idempotent() {
        for mode in [DisplayMode::Rgba, DisplayMode::Gray] {
            let once = preprocess(FRAGMENT_SOURCE, ShaderStage::Fragment, PixelFormat::Nv12, mode);
            let twice = preprocess(&once, ShaderStage::Fragment, PixelFormat::Nv12, mode);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn gray_mode_prepends_define() {
        let out = preprocess(FRAGMENT_SOURCE, ShaderStage::Fragment, PixelFormat::Yuv420p, DisplayMode::Gray);
        assert!(out.starts_with("#define GRAY_MODE\n"));
    }

    #[test]
    fn vertex_stage_is_untouched() {
        let out = preprocess(VERTEX_SOURCE, ShaderStage::Vertex, PixelFormat::Nv21, DisplayMode::Gray);
        assert_eq!(out, VERTEX_SOURCE);
    }

    #[test]
    fn expanded_sources_select_format_branch() {
        for (format, present, absent) in [
            (PixelFormat::Yuv420p, "samplerV", "samplerUV"),
            (PixelFormat::Nv12, "samplerUV", "samplerV:"),
        ] {
            let mut backend = RecordingBackend::new(4, 4);
            build(&mut backend, format, DisplayMode::Rgba).unwrap();
            let (_, fragment) = &backend.sources[1];
            assert!(fragment.contains(present), "{format}: missing {present}");
            assert!(!fragment.contains(absent), "{format}: unexpected {absent}");
            assert!(!fragment.contains('#'), "{format}: directive left behind");
        }
    }

    #[test]
    fn success_uses_program() {
        let mut backend = RecordingBackend::new(4, 4);
        let program = build(&mut backend, PixelFormat::Yuv420p, DisplayMode::Rgba).unwrap();
        assert_eq!(backend.calls.last(), Some(&Call::UseProgram(program.handle)));
        assert_eq!(backend.count(|c| matches!(c, Call::DeleteShader(_))), 0);
    }

    #[test]
    fn compile_failure_deletes_shader_first() {
        let mut backend = RecordingBackend::new(4, 4);
        backend.fail_stage = Some(ShaderStage::Fragment);

        let err = build(&mut backend, PixelFormat::Nv12, DisplayMode::Rgba).unwrap_err();
        match err {
            Error::ShaderCompile { stage, log, source } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("rejected"));
                assert!(source.contains("#define PIX_FMT 1"));
            }
            other => panic!("expected ShaderCompile, got {other:?}"),
        }

        // Both the failed fragment shader and the good vertex shader are gone.
        assert_eq!(backend.count(|c| matches!(c, Call::DeleteShader(_))), 2);
        assert_eq!(backend.count(|c| matches!(c, Call::LinkProgram(_))), 0);
    }

    #[test]
    fn link_failure_deletes_program() {
        let mut backend = RecordingBackend::new(4, 4);
        backend.fail_link = true;

        let err = build(&mut backend, PixelFormat::Yuv420p, DisplayMode::Rgba).unwrap_err();
        assert!(matches!(err, Error::ProgramLink { .. }));
        assert_eq!(backend.count(|c| matches!(c, Call::DeleteProgram(_))), 1);
        assert_eq!(backend.count(|c| matches!(c, Call::UseProgram(_))), 0);
    }

    #[test]
    fn bad_directive_is_a_compile_error() {
        let mut backend = RecordingBackend::new(4, 4);
        let err = compile(
            &mut backend,
            ShaderStage::Vertex,
            "#if 1\nfn f() {}\n",
            PixelFormat::Yuv420p,
            DisplayMode::Rgba,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ShaderCompile { stage: ShaderStage::Vertex, .. }));
        assert!(backend.calls.is_empty());
    }
}
