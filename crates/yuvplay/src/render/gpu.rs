//! # wgpu Backend — The GL Object Model on wgpu
//!
//! [`WgpuBackend`] implements [`GraphicsBackend`] on a wgpu device, queue,
//! and window surface. The GL-shaped calls map onto wgpu like this:
//!
//! | Call                   | wgpu                                                   |
//! |------------------------|--------------------------------------------------------|
//! | `create_shader`        | `create_shader_module` inside a validation error scope |
//! | `link_program`         | `create_render_pipeline` (auto layout) in an error scope |
//! | matrix uniform by name | 64-byte slot in one uniform buffer, `@group(0) @binding(0)` |
//! | texture unit *n*       | `@group(1) @binding(2n)` texture, `@binding(2n + 1)` sampler |
//! | `upload_plane`         | `queue.write_texture`, recreating the texture on resize |
//! | `begin/draw/end_frame` | one render pass, submitted and presented in `end_frame` |
//!
//! Luma planes are `R8Unorm` and interleaved chroma planes `Rg8Unorm`, so the
//! shader reads `.r` or `.rg`. The depth buffer is `Depth32Float`, cleared
//! every frame and recreated when the surface size changes.

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use super::backend::{
    BufferHandle, ClearState, FilterMode, GraphicsBackend, PixelStore, PlaneImage, ProgramHandle,
    ProgramLayout, ShaderHandle, ShaderStage, TextureHandle, VertexAttribute, Viewport,
};
use crate::error::{Error, Result};
use crate::math::Mat4;
use crate::pixel_format::PlaneFormat;

/// Depth texture format.
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Bytes per `mat4x4<f32>` uniform slot.
const MATRIX_SIZE: u64 = 64;

struct ShaderEntry {
    stage: ShaderStage,
    module: wgpu::ShaderModule,
    log: Option<String>,
}

struct ProgramEntry {
    pipeline: Option<wgpu::RenderPipeline>,
    log: Option<String>,
    layout: ProgramLayout,
    /// Matrix uniforms, one slot per name in `layout.matrices`.
    uniforms: Option<(wgpu::Buffer, wgpu::BindGroup)>,
    /// Sampler uniform name → texture unit.
    samplers: HashMap<String, u32>,
}

struct BufferEntry {
    program: ProgramHandle,
    slot: u32,
    buffer: wgpu::Buffer,
}

struct TextureEntry {
    unit: u32,
    sampler: wgpu::Sampler,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
    format: PlaneFormat,
}

/// A frame between `begin_frame` and `end_frame`.
struct PendingFrame {
    viewport: Viewport,
    clear: ClearState,
    draws: Vec<(ProgramHandle, u32, u32)>,
}

/// wgpu device, queue, and surface for one window.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    depth: wgpu::TextureView,
    depth_size: (u32, u32),
    store: PixelStore,
    next_id: usize,
    shaders: HashMap<ShaderHandle, ShaderEntry>,
    programs: HashMap<ProgramHandle, ProgramEntry>,
    buffers: HashMap<BufferHandle, BufferEntry>,
    textures: HashMap<TextureHandle, TextureEntry>,
    current: Option<ProgramHandle>,
    frame: Option<PendingFrame>,
}

impl WgpuBackend {
    /// Create the instance, adapter, device, and queue, and configure the
    /// window's surface. Fails with [`Error::UnsupportedContext`] when no
    /// adapter or device is available.
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|e| Error::UnsupportedContext(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| Error::UnsupportedContext(e.to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("yuvplay device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .map_err(|e| Error::UnsupportedContext(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        // The shader emits display-encoded RGB, so prefer a linear format.
        let Some(format) = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or(caps.formats.first())
            .copied()
        else {
            return Err(Error::UnsupportedContext(
                "surface supports no formats on this adapter".into(),
            ));
        };

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_size = (surface_config.width, surface_config.height);
        let depth = create_depth_texture(&device, depth_size.0, depth_size.1);

        log::info!(
            "wgpu backend on {} ({:?}), surface {:?} {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            format,
            depth_size.0,
            depth_size.1
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            depth,
            depth_size,
            store: PixelStore::default(),
            next_id: 0,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            current: None,
            frame: None,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    /// Run `f` inside a validation error scope and return its result plus the
    /// captured error message, if any.
    fn validated<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> (T, Option<String>) {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        let error = pollster::block_on(self.device.pop_error_scope());
        (value, error.map(|e| e.to_string()))
    }

    fn build_pipeline(
        &self,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        layout: &ProgramLayout,
    ) -> std::result::Result<wgpu::RenderPipeline, String> {
        let attributes = layout
            .attributes
            .iter()
            .map(|a| Ok([vertex_attribute(a)?]))
            .collect::<std::result::Result<Vec<_>, String>>()?;
        let buffers: Vec<_> = layout
            .attributes
            .iter()
            .zip(&attributes)
            .map(|(a, attrs)| wgpu::VertexBufferLayout {
                array_stride: u64::from(a.components) * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let (pipeline, error) = self.validated(|device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("frame pipeline"),
                layout: None,
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some("vs_main"),
                    buffers: &buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_config.format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        });

        match error {
            Some(log) => Err(log),
            None => Ok(pipeline),
        }
    }

    fn create_uniforms(
        &self,
        pipeline: &wgpu::RenderPipeline,
        layout: &ProgramLayout,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let size = (MATRIX_SIZE * layout.matrices.len() as u64).max(MATRIX_SIZE);
        let identity = vec![Mat4::IDENTITY.to_cols_array(); layout.matrices.len().max(1)];
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("matrix uniforms"),
                contents: bytemuck::cast_slice(&identity),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        debug_assert_eq!(buffer.size(), size);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("matrix uniforms bind group"),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        (buffer, bind_group)
    }

    /// Bind group for group 1: every sampler uniform the program declared,
    /// pointing at the texture on its unit.
    fn texture_bind_group(&self, program: &ProgramEntry) -> Option<wgpu::BindGroup> {
        let pipeline = program.pipeline.as_ref()?;
        let mut entries = Vec::with_capacity(program.samplers.len() * 2);
        for (name, &unit) in &program.samplers {
            let Some(texture) = self.textures.values().find(|t| t.unit == unit) else {
                log::warn!("{name}: no texture on unit {unit}");
                return None;
            };
            entries.push(wgpu::BindGroupEntry {
                binding: 2 * unit,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2 * unit + 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }

        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("plane textures bind group"),
            layout: &pipeline.get_bind_group_layout(1),
            entries: &entries,
        }))
    }

    fn resize_depth_if_needed(&mut self) {
        let size = (self.surface_config.width, self.surface_config.height);
        if size != self.depth_size {
            self.depth = create_depth_texture(&self.device, size.0, size.1);
            self.depth_size = size;
        }
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(output) => Ok(output),
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.surface.configure(&self.device, &self.surface_config);
                Err(Error::Surface(e.to_string()))
            }
            Err(e @ wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory");
                Err(Error::Surface(e.to_string()))
            }
            Err(e) => Err(Error::Surface(e.to_string())),
        }
    }
}

impl GraphicsBackend for WgpuBackend {
    fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.device, &self.surface_config);
        }
    }

    fn set_pixel_store(&mut self, store: PixelStore) {
        self.store = store;
    }

    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> ShaderHandle {
        let label = match stage {
            ShaderStage::Vertex => "frame vertex shader",
            ShaderStage::Fragment => "frame fragment shader",
        };
        let (module, log) = self.validated(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        });

        let handle = ShaderHandle(self.next_id());
        self.shaders.insert(handle, ShaderEntry { stage, module, log });
        handle
    }

    fn shader_log(&self, shader: ShaderHandle) -> Option<String> {
        match self.shaders.get(&shader) {
            Some(entry) => entry.log.clone(),
            None => Some(format!("unknown shader {shader:?}")),
        }
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader);
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
        layout: &ProgramLayout,
    ) -> ProgramHandle {
        let linked = match (self.shaders.get(&vertex), self.shaders.get(&fragment)) {
            (Some(vs), Some(fs))
                if vs.stage == ShaderStage::Vertex && fs.stage == ShaderStage::Fragment =>
            {
                self.build_pipeline(&vs.module, &fs.module, layout)
            }
            _ => Err("program needs one vertex and one fragment shader".to_owned()),
        };

        let (pipeline, log, uniforms) = match linked {
            Ok(pipeline) => {
                let uniforms = self.create_uniforms(&pipeline, layout);
                (Some(pipeline), None, Some(uniforms))
            }
            Err(log) => (None, Some(log), None),
        };

        let handle = ProgramHandle(self.next_id());
        self.programs.insert(
            handle,
            ProgramEntry {
                pipeline,
                log,
                layout: *layout,
                uniforms,
                samplers: HashMap::new(),
            },
        );
        handle
    }

    fn program_log(&self, program: ProgramHandle) -> Option<String> {
        match self.programs.get(&program) {
            Some(entry) => entry.log.clone(),
            None => Some(format!("unknown program {program:?}")),
        }
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        if self.current == Some(program) {
            self.current = None;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current = Some(program);
    }

    fn create_vertex_buffer(
        &mut self,
        program: ProgramHandle,
        attribute: &str,
        data: &[f32],
    ) -> BufferHandle {
        let slot = self
            .programs
            .get(&program)
            .and_then(|p| p.layout.attributes.iter().position(|a| a.name == attribute))
            .map(|slot| slot as u32);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(attribute),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let handle = BufferHandle(self.next_id());
        match slot {
            Some(slot) => {
                self.buffers.insert(
                    handle,
                    BufferEntry {
                        program,
                        slot,
                        buffer,
                    },
                );
            }
            None => log::warn!("attribute {attribute} is not part of the program layout"),
        }
        handle
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
    }

    fn create_texture(&mut self, unit: u32, filter: FilterMode) -> TextureHandle {
        let filter = match filter {
            FilterMode::Linear => wgpu::FilterMode::Linear,
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
        };
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("plane sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        });

        // 1x1 placeholder until the first upload gives the real size.
        let format = PlaneFormat::Luminance;
        let texture = create_plane_texture(&self.device, 1, 1, format);
        self.queue.write_texture(
            texture.as_image_copy(),
            &[0],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(1),
                rows_per_image: Some(1),
            },
            extent(1, 1),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let handle = TextureHandle(self.next_id());
        self.textures.insert(
            handle,
            TextureEntry {
                unit,
                sampler,
                texture,
                view,
                size: (1, 1),
                format,
            },
        );
        log::debug!("texture {handle:?} on unit {unit}");
        handle
    }

    fn set_sampler_unit(&mut self, program: ProgramHandle, uniform: &str, unit: u32) {
        if let Some(entry) = self.programs.get_mut(&program) {
            entry.samplers.insert(uniform.to_owned(), unit);
        }
    }

    fn upload_plane(&mut self, texture: TextureHandle, plane: &PlaneImage<'_>) {
        let Some(entry) = self.textures.get_mut(&texture) else {
            log::warn!("upload to unknown texture {texture:?}");
            return;
        };
        if plane.width == 0 || plane.height == 0 {
            return;
        }

        let size = (plane.width, plane.height);
        if entry.size != size || entry.format != plane.format {
            entry.texture = create_plane_texture(&self.device, size.0, size.1, plane.format);
            entry.view = entry
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            entry.size = size;
            entry.format = plane.format;
            log::debug!("texture {texture:?} resized to {}x{}", size.0, size.1);
        }

        let row_len = plane.width as usize * plane.format.channels();
        let flipped;
        let (data, bytes_per_row) = if self.store.flip_y {
            flipped = flip_rows(plane.data, plane.bytes_per_row, row_len, plane.height as usize);
            (flipped.as_slice(), row_len)
        } else {
            (plane.data, plane.bytes_per_row)
        };

        self.queue.write_texture(
            entry.texture.as_image_copy(),
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row as u32),
                rows_per_image: Some(plane.height),
            },
            extent(plane.width, plane.height),
        );
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if let Some(entry) = self.textures.remove(&texture) {
            entry.texture.destroy();
        }
    }

    fn set_uniform_matrix(&mut self, program: ProgramHandle, uniform: &str, matrix: &Mat4) {
        let Some(entry) = self.programs.get(&program) else {
            return;
        };
        let Some(slot) = entry.layout.matrices.iter().position(|&m| m == uniform) else {
            log::warn!("no matrix uniform named {uniform}");
            return;
        };
        if let Some((buffer, _)) = &entry.uniforms {
            self.queue.write_buffer(
                buffer,
                slot as u64 * MATRIX_SIZE,
                bytemuck::cast_slice(&matrix.to_cols_array()),
            );
        }
    }

    fn begin_frame(&mut self, viewport: Viewport, clear: ClearState) {
        if self.frame.is_some() {
            log::warn!("begin_frame called twice; dropping the unfinished frame");
        }
        self.frame = Some(PendingFrame {
            viewport,
            clear,
            draws: Vec::new(),
        });
    }

    fn draw_triangle_strip(&mut self, first: u32, count: u32) {
        match (self.current, self.frame.as_mut()) {
            (Some(program), Some(frame)) => frame.draws.push((program, first, count)),
            (None, _) => log::warn!("draw without a current program"),
            (_, None) => log::warn!("draw outside begin_frame/end_frame"),
        }
    }

    fn end_frame(&mut self) -> Result<()> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };

        self.resize_depth_if_needed();
        let output = self.acquire()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Bind groups must outlive the render pass that borrows them.
        let texture_groups: Vec<_> = frame
            .draws
            .iter()
            .map(|(program, ..)| {
                self.programs
                    .get(program)
                    .and_then(|p| self.texture_bind_group(p))
            })
            .collect();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let [r, g, b, a] = frame.clear.color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear.depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let (sw, sh) = self.surface_size();
            let vp = frame.viewport;
            let x = vp.x.min(sw);
            let y = vp.y.min(sh);
            let w = vp.width.min(sw - x);
            let h = vp.height.min(sh - y);
            if w > 0 && h > 0 {
                pass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);

                for (&(handle, first, count), textures) in frame.draws.iter().zip(&texture_groups) {
                    let Some(program) = self.programs.get(&handle) else {
                        continue;
                    };
                    let (Some(pipeline), Some((_, uniforms)), Some(textures)) =
                        (&program.pipeline, &program.uniforms, textures)
                    else {
                        continue;
                    };
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(0, uniforms, &[]);
                    pass.set_bind_group(1, textures, &[]);
                    for entry in self.buffers.values().filter(|b| b.program == handle) {
                        pass.set_vertex_buffer(entry.slot, entry.buffer.slice(..));
                    }
                    pass.draw(first..first + count, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn vertex_attribute(attribute: &VertexAttribute) -> std::result::Result<wgpu::VertexAttribute, String> {
    let format = match attribute.components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        4 => wgpu::VertexFormat::Float32x4,
        n => return Err(format!("attribute {} has {n} components", attribute.name)),
    };
    Ok(wgpu::VertexAttribute {
        format,
        offset: 0,
        shader_location: attribute.location,
    })
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

fn create_plane_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: PlaneFormat,
) -> wgpu::Texture {
    let format = match format {
        PlaneFormat::Luminance => wgpu::TextureFormat::R8Unorm,
        PlaneFormat::LuminanceAlpha => wgpu::TextureFormat::Rg8Unorm,
    };
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("plane texture"),
        size: extent(width, height),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: extent(width.max(1), height.max(1)),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Copy `height` rows of `row_len` bytes in reverse order, dropping stride
/// padding.
fn flip_rows(data: &[u8], stride: usize, row_len: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(row_len * height);
    for row in (0..height).rev() {
        let start = row * stride;
        out.extend_from_slice(&data[start..start + row_len]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_rows_reverses_and_strips_padding() {
        // 2 rows of 3 bytes, stride 4.
        let data = [1, 2, 3, 0, 4, 5, 6, 0];
        assert_eq!(flip_rows(&data, 4, 3, 2), [4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn vertex_formats_follow_component_count() {
        let attr = VertexAttribute {
            name: "uv",
            location: 1,
            components: 2,
        };
        let mapped = vertex_attribute(&attr).unwrap();
        assert_eq!(mapped.format, wgpu::VertexFormat::Float32x2);
        assert_eq!(mapped.shader_location, 1);

        let bad = VertexAttribute {
            components: 5,
            ..attr
        };
        assert!(vertex_attribute(&bad).is_err());
    }
}
