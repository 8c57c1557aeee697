//! Per-plane textures and their texture units.

use super::backend::{FilterMode, GraphicsBackend, PlaneImage, ProgramHandle, TextureHandle};
use crate::pixel_format::FrameLayout;

/// Sampler uniform name for a sample, e.g. `"samplerUV"`.
pub fn sampler_uniform(sample: &str) -> String {
    format!("sampler{sample}")
}

/// A texture bound to a unit and a sample name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneTexture {
    pub sample: &'static str,
    pub unit: u32,
    pub handle: TextureHandle,
}

/// Textures owned by one renderer.
///
/// Units are handed out from a counter that only grows: unit 0 goes to the
/// first texture, unit 1 to the next, and so on. Units are never reused, even
/// after [`release`](TextureSet::release).
#[derive(Debug, Default)]
pub struct TextureSet {
    textures: Vec<PlaneTexture>,
    next_unit: u32,
}

impl TextureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a texture for `sample`, bind it to the next free unit, and
    /// point the program's `sampler<sample>` uniform at that unit.
    pub fn create<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        program: ProgramHandle,
        sample: &'static str,
        filter: FilterMode,
    ) -> PlaneTexture {
        let unit = self.next_unit;
        self.next_unit += 1;

        let handle = backend.create_texture(unit, filter);
        backend.set_sampler_unit(program, &sampler_uniform(sample), unit);

        let texture = PlaneTexture {
            sample,
            unit,
            handle,
        };
        self.textures.push(texture);
        texture
    }

    pub fn get(&self, sample: &str) -> Option<&PlaneTexture> {
        self.textures.iter().find(|t| t.sample == sample)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaneTexture> {
        self.textures.iter()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Unit the next texture will get.
    pub fn next_unit(&self) -> u32 {
        self.next_unit
    }

    /// Upload every plane of `buffer` into its sample's texture.
    ///
    /// `buffer` must already have passed [`FrameLayout::check`]. Planes with
    /// no texels are skipped. Returns the number of planes uploaded.
    pub fn upload_frame<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        layout: &FrameLayout,
        buffer: &[u8],
    ) -> usize {
        let mut uploaded = 0;
        for plane in &layout.planes {
            let Some(texture) = self.get(plane.sample) else {
                log::warn!("no texture for sample {}", plane.sample);
                continue;
            };
            if plane.is_empty() {
                continue;
            }
            backend.upload_plane(
                texture.handle,
                &PlaneImage {
                    width: plane.width,
                    height: plane.height,
                    format: plane.format,
                    bytes_per_row: plane.bytes_per_row,
                    data: plane.slice(buffer),
                },
            );
            uploaded += 1;
        }
        uploaded
    }

    /// Delete every texture. The unit counter keeps its value.
    pub fn release<B: GraphicsBackend>(&mut self, backend: &mut B) {
        for texture in self.textures.drain(..) {
            backend.delete_texture(texture.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_format::{PixelFormat, PlaneFormat};
    use crate::render::testing::{Call, RecordingBackend};

    const PROGRAM: ProgramHandle = ProgramHandle(99);

    fn textures_for(backend: &mut RecordingBackend, format: PixelFormat) -> TextureSet {
        let mut set = TextureSet::new();
        for &sample in format.samples() {
            set.create(backend, PROGRAM, sample, FilterMode::Linear);
        }
        set
    }

    #[test]
    fn units_increase_from_zero() {
        let mut backend = RecordingBackend::new(4, 4);
        let set = textures_for(&mut backend, PixelFormat::Yuv420p);
        let units: Vec<_> = set.iter().map(|t| t.unit).collect();
        assert_eq!(units, [0, 1, 2]);
        assert!(backend.calls.contains(&Call::SetSamplerUnit {
            uniform: "samplerV".into(),
            unit: 2
        }));
    }

    #[test]
    fn semi_planar_gets_two_textures() {
        let mut backend = RecordingBackend::new(4, 4);
        let set = textures_for(&mut backend, PixelFormat::Nv21);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("UV").map(|t| t.unit), Some(1));
        assert_eq!(set.next_unit(), 2);
    }

    #[test]
    fn upload_slices_each_plane() {
        let mut backend = RecordingBackend::new(4, 4);
        let set = textures_for(&mut backend, PixelFormat::Nv12);
        let layout = PixelFormat::Nv12.frame_layout(4, 4, 1);
        let frame = vec![0u8; 24];

        assert_eq!(set.upload_frame(&mut backend, &layout, &frame), 2);
        let uploads = backend.uploads();
        assert_eq!((uploads[0].1, uploads[0].2), (4, 4));
        assert_eq!(uploads[0].3, PlaneFormat::Luminance);
        assert_eq!(uploads[0].4, 16);
        assert_eq!((uploads[1].1, uploads[1].2), (2, 2));
        assert_eq!(uploads[1].3, PlaneFormat::LuminanceAlpha);
        assert_eq!(uploads[1].4, 8);
    }

    #[test]
    fn empty_chroma_planes_are_skipped() {
        let mut backend = RecordingBackend::new(4, 4);
        let set = textures_for(&mut backend, PixelFormat::Yuv420p);
        let layout = PixelFormat::Yuv420p.frame_layout(1, 1, 1);
        assert_eq!(set.upload_frame(&mut backend, &layout, &[128]), 1);
    }

    #[test]
    fn units_are_not_reused_after_release() {
        let mut backend = RecordingBackend::new(4, 4);
        let mut set = textures_for(&mut backend, PixelFormat::Nv12);
        set.release(&mut backend);
        assert!(set.is_empty());
        assert_eq!(backend.count(|c| matches!(c, Call::DeleteTexture(_))), 2);

        let texture = set.create(&mut backend, PROGRAM, "Y", FilterMode::Nearest);
        assert_eq!(texture.unit, 2);
    }
}
