//! A backend that records every call instead of talking to a GPU.

use std::collections::HashMap;

use super::backend::{
    BufferHandle, ClearState, FilterMode, GraphicsBackend, PixelStore, PlaneImage, ProgramHandle,
    ProgramLayout, ShaderHandle, ShaderStage, TextureHandle, Viewport,
};
use crate::error::{Error, Result};
use crate::math::Mat4;
use crate::pixel_format::PlaneFormat;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    ResizeSurface(u32, u32),
    SetPixelStore(PixelStore),
    CreateShader(ShaderStage, ShaderHandle),
    DeleteShader(ShaderHandle),
    LinkProgram(ProgramHandle),
    DeleteProgram(ProgramHandle),
    UseProgram(ProgramHandle),
    CreateVertexBuffer {
        attribute: String,
        floats: usize,
        handle: BufferHandle,
    },
    DeleteBuffer(BufferHandle),
    CreateTexture {
        unit: u32,
        filter: FilterMode,
        handle: TextureHandle,
    },
    SetSamplerUnit {
        uniform: String,
        unit: u32,
    },
    UploadPlane {
        texture: TextureHandle,
        width: u32,
        height: u32,
        format: PlaneFormat,
        bytes: usize,
    },
    DeleteTexture(TextureHandle),
    SetUniformMatrix {
        uniform: String,
        matrix: Mat4,
    },
    BeginFrame(Viewport, ClearState),
    Draw {
        first: u32,
        count: u32,
    },
    EndFrame,
}

#[derive(Default)]
pub(crate) struct RecordingBackend {
    pub calls: Vec<Call>,
    pub size: (u32, u32),
    /// Sources handed to `create_shader`, in order.
    pub sources: Vec<(ShaderStage, String)>,
    /// Make `create_shader` fail for this stage.
    pub fail_stage: Option<ShaderStage>,
    pub fail_link: bool,
    /// Make the next `end_frame` fail.
    pub fail_present: bool,
    next_id: usize,
    shader_logs: HashMap<ShaderHandle, String>,
    program_logs: HashMap<ProgramHandle, String>,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Default::default()
        }
    }

    fn next(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    /// Uniform names written, in order.
    pub fn uniform_writes(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::SetUniformMatrix { uniform, .. } => Some(uniform.as_str()),
                _ => None,
            })
            .collect()
    }

    /// `(texture, width, height, format, bytes)` of every upload, in order.
    pub fn uploads(&self) -> Vec<(TextureHandle, u32, u32, PlaneFormat, usize)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                Call::UploadPlane {
                    texture,
                    width,
                    height,
                    format,
                    bytes,
                } => Some((texture, width, height, format, bytes)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|&c| pred(c)).count()
    }
}

impl GraphicsBackend for RecordingBackend {
    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.calls.push(Call::ResizeSurface(width, height));
    }

    fn set_pixel_store(&mut self, store: PixelStore) {
        self.calls.push(Call::SetPixelStore(store));
    }

    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> ShaderHandle {
        let handle = ShaderHandle(self.next());
        if self.fail_stage == Some(stage) {
            self.shader_logs
                .insert(handle, format!("ERROR: 0:1: {stage} rejected"));
        }
        self.sources.push((stage, source.to_owned()));
        self.calls.push(Call::CreateShader(stage, handle));
        handle
    }

    fn shader_log(&self, shader: ShaderHandle) -> Option<String> {
        self.shader_logs.get(&shader).cloned()
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.calls.push(Call::DeleteShader(shader));
    }

    fn link_program(
        &mut self,
        _vertex: ShaderHandle,
        _fragment: ShaderHandle,
        _layout: &ProgramLayout,
    ) -> ProgramHandle {
        let handle = ProgramHandle(self.next());
        if self.fail_link {
            self.program_logs
                .insert(handle, "varying uv not written".to_owned());
        }
        self.calls.push(Call::LinkProgram(handle));
        handle
    }

    fn program_log(&self, program: ProgramHandle) -> Option<String> {
        self.program_logs.get(&program).cloned()
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.calls.push(Call::DeleteProgram(program));
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.calls.push(Call::UseProgram(program));
    }

    fn create_vertex_buffer(
        &mut self,
        _program: ProgramHandle,
        attribute: &str,
        data: &[f32],
    ) -> BufferHandle {
        let handle = BufferHandle(self.next());
        self.calls.push(Call::CreateVertexBuffer {
            attribute: attribute.to_owned(),
            floats: data.len(),
            handle,
        });
        handle
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn create_texture(&mut self, unit: u32, filter: FilterMode) -> TextureHandle {
        let handle = TextureHandle(self.next());
        self.calls.push(Call::CreateTexture {
            unit,
            filter,
            handle,
        });
        handle
    }

    fn set_sampler_unit(&mut self, _program: ProgramHandle, uniform: &str, unit: u32) {
        self.calls.push(Call::SetSamplerUnit {
            uniform: uniform.to_owned(),
            unit,
        });
    }

    fn upload_plane(&mut self, texture: TextureHandle, plane: &PlaneImage<'_>) {
        self.calls.push(Call::UploadPlane {
            texture,
            width: plane.width,
            height: plane.height,
            format: plane.format,
            bytes: plane.data.len(),
        });
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.calls.push(Call::DeleteTexture(texture));
    }

    fn set_uniform_matrix(&mut self, _program: ProgramHandle, uniform: &str, matrix: &Mat4) {
        self.calls.push(Call::SetUniformMatrix {
            uniform: uniform.to_owned(),
            matrix: *matrix,
        });
    }

    fn begin_frame(&mut self, viewport: Viewport, clear: ClearState) {
        self.calls.push(Call::BeginFrame(viewport, clear));
    }

    fn draw_triangle_strip(&mut self, first: u32, count: u32) {
        self.calls.push(Call::Draw { first, count });
    }

    fn end_frame(&mut self) -> Result<()> {
        self.calls.push(Call::EndFrame);
        if std::mem::take(&mut self.fail_present) {
            return Err(Error::Surface("outdated".into()));
        }
        Ok(())
    }
}
