//! # Pixel Formats — Plane Layout for 4:2:0 Frames
//!
//! Every supported format stores a full-resolution luma plane followed by
//! chroma sampled at half resolution on both axes:
//!
//! ```text
//! YUV420P (planar)            NV12 / NV21 (semi-planar)
//! ┌──────────────────┐        ┌──────────────────┐
//! │ Y   w × h        │        │ Y   w × h        │
//! ├─────────┬────────┘        ├──────────────────┤
//! │ U w/2×h/2│                │ UV (w/2 × h/2)×2 │  interleaved pairs
//! ├─────────┤                 └──────────────────┘
//! │ V w/2×h/2│
//! └─────────┘
//! ```
//!
//! Odd dimensions are floor-divided for the chroma planes, so a 961x541 frame
//! has 480x270 chroma planes. NV12 stores U first in each pair, NV21 stores V
//! first; the layout is identical and the shader picks the channel order.
//!
//! Each format has an integer tag (substituted into the fragment shader's
//! `PIX_FMT` define), a title used for lookup, and an ordered list of sample
//! names. One texture is created per sample name, in that order.
//!
//! With an unpack alignment above 1, every row of every plane is padded to the
//! alignment, the last row included. See [`PixelFormat::frame_layout`].

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The chroma-subsampled layouts the renderer can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Three planes: Y, U, V.
    Yuv420p,
    /// Y plane plus one interleaved UV plane (U first).
    Nv12,
    /// Y plane plus one interleaved VU plane (V first).
    Nv21,
}

impl PixelFormat {
    /// All supported formats, ordered by tag.
    pub const ALL: [PixelFormat; 3] = [PixelFormat::Yuv420p, PixelFormat::Nv12, PixelFormat::Nv21];

    /// Integer tag used for shader macro substitution.
    pub fn tag(self) -> u32 {
        match self {
            PixelFormat::Yuv420p => 0,
            PixelFormat::Nv12 => 1,
            PixelFormat::Nv21 => 2,
        }
    }

    /// Lowercase title used for lookup.
    pub fn title(self) -> &'static str {
        match self {
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Nv12 => "nv12",
            PixelFormat::Nv21 => "nv21",
        }
    }

    /// Sample names in texture-creation order.
    pub fn samples(self) -> &'static [&'static str] {
        match self {
            PixelFormat::Yuv420p => &["Y", "U", "V"],
            PixelFormat::Nv12 | PixelFormat::Nv21 => &["Y", "UV"],
        }
    }

    /// Whether each chroma component has its own plane.
    pub fn is_planar(self) -> bool {
        matches!(self, PixelFormat::Yuv420p)
    }

    /// Find a format by its integer tag.
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.tag() == tag)
    }

    /// Find a format by title (case-insensitive) or by its tag written as a
    /// decimal number.
    pub fn lookup(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        let by_title = Self::ALL
            .into_iter()
            .find(|f| f.title().eq_ignore_ascii_case(trimmed));
        by_title
            .or_else(|| trimmed.parse::<u32>().ok().and_then(Self::from_tag))
            .ok_or_else(|| Error::UnsupportedFormat(name.to_owned()))
    }

    /// Dimensions of one chroma plane (floor division, never rounded up).
    pub fn chroma_size(self, width: u32, height: u32) -> (u32, u32) {
        (width / 2, height / 2)
    }

    /// Total chroma bytes for a tightly packed frame.
    pub fn chroma_bytes(self, width: u32, height: u32) -> usize {
        let (cw, ch) = self.chroma_size(width, height);
        2 * cw as usize * ch as usize
    }

    /// Total bytes of a tightly packed frame (`align = 1`).
    pub fn frame_len(self, width: u32, height: u32) -> usize {
        width as usize * height as usize + self.chroma_bytes(width, height)
    }

    /// Compute where each plane lives inside a frame buffer.
    ///
    /// `align` pads every row to a multiple of that many bytes, including the
    /// last row of each plane, and each plane starts where the previous one's
    /// padded rows end. This is stricter than GL's `UNPACK_ALIGNMENT`, which
    /// lets the final row stop at its packed width: a buffer sized by GL's rule
    /// is one partial row short here. With `align = 1` rows are tightly packed
    /// and both rules agree.
    pub fn frame_layout(self, width: u32, height: u32, align: u32) -> FrameLayout {
        let (cw, ch) = self.chroma_size(width, height);
        let mut planes = Vec::with_capacity(self.samples().len());
        let mut offset = 0;

        let mut push = |sample: &'static str, w: u32, h: u32, format: PlaneFormat| {
            let plane = PlaneLayout::new(sample, offset, w, h, format, align);
            offset = plane.end();
            planes.push(plane);
        };

        push("Y", width, height, PlaneFormat::Luminance);
        if self.is_planar() {
            push("U", cw, ch, PlaneFormat::Luminance);
            push("V", cw, ch, PlaneFormat::Luminance);
        } else {
            push("UV", cw, ch, PlaneFormat::LuminanceAlpha);
        }

        FrameLayout {
            format: self,
            width,
            height,
            planes,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::lookup(s)
    }
}

/// Texel layout of one uploaded plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneFormat {
    /// One byte per texel.
    Luminance,
    /// Two interleaved bytes per texel.
    LuminanceAlpha,
}

impl PlaneFormat {
    /// Bytes per texel.
    pub fn channels(self) -> usize {
        match self {
            PlaneFormat::Luminance => 1,
            PlaneFormat::LuminanceAlpha => 2,
        }
    }
}

/// Position and shape of a single plane inside a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Sample name this plane feeds.
    pub sample: &'static str,
    /// Byte offset of the first row.
    pub offset: usize,
    pub width: u32,
    pub height: u32,
    pub format: PlaneFormat,
    /// Row stride, including alignment padding.
    pub bytes_per_row: usize,
}

impl PlaneLayout {
    fn new(
        sample: &'static str,
        offset: usize,
        width: u32,
        height: u32,
        format: PlaneFormat,
        align: u32,
    ) -> Self {
        let packed = width as usize * format.channels();
        Self {
            sample,
            offset,
            width,
            height,
            format,
            bytes_per_row: align_up(packed, align.max(1) as usize),
        }
    }

    /// Bytes the plane occupies.
    pub fn len(&self) -> usize {
        self.bytes_per_row * self.height as usize
    }

    /// Whether the plane has no texels (zero width or height).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// One past the last byte of the plane.
    pub fn end(&self) -> usize {
        self.offset + self.len()
    }

    /// Slice this plane out of a frame buffer. The caller must have checked
    /// the buffer against [`FrameLayout::check`].
    pub fn slice<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        &buffer[self.offset..self.end()]
    }
}

/// The full plane map for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub planes: Vec<PlaneLayout>,
}

impl FrameLayout {
    /// Minimum buffer length that covers every plane.
    pub fn required_len(&self) -> usize {
        self.planes.last().map(PlaneLayout::end).unwrap_or(0)
    }

    /// Fail with [`Error::FrameSize`] if `actual` bytes can't cover the frame.
    pub fn check(&self, actual: usize) -> Result<()> {
        let required = self.required_len();
        if actual < required {
            return Err(Error::FrameSize {
                width: self.width,
                height: self.height,
                format: self.format.title(),
                required,
                actual,
            });
        }
        Ok(())
    }

    /// The plane feeding a given sample name.
    pub fn plane(&self, sample: &str) -> Option<&PlaneLayout> {
        self.planes.iter().find(|p| p.sample == sample)
    }
}

/// Round `value` up to the next multiple of `align`.
fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_lists_follow_format() {
        assert_eq!(PixelFormat::Yuv420p.samples(), &["Y", "U", "V"]);
        assert_eq!(PixelFormat::Nv12.samples(), &["Y", "UV"]);
        assert_eq!(PixelFormat::Nv21.samples(), &["Y", "UV"]);
    }

    #[test]
    fn layout_has_one_plane_per_sample() {
        for format in PixelFormat::ALL {
            let layout = format.frame_layout(64, 32, 1);
            let names: Vec<_> = layout.planes.iter().map(|p| p.sample).collect();
            assert_eq!(names, format.samples());
        }
    }

    #[test]
    fn lookup_accepts_titles_and_tags() {
        assert_eq!(PixelFormat::lookup("yuv420p").unwrap(), PixelFormat::Yuv420p);
        assert_eq!(PixelFormat::lookup("NV12").unwrap(), PixelFormat::Nv12);
        assert_eq!(PixelFormat::lookup("2").unwrap(), PixelFormat::Nv21);
        assert_eq!("nv21".parse::<PixelFormat>().unwrap(), PixelFormat::Nv21);
    }

    #[test]
    fn lookup_rejects_unknown_names() {
        match PixelFormat::lookup("rgb24") {
            Err(Error::UnsupportedFormat(name)) => assert_eq!(name, "rgb24"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
        assert!(PixelFormat::lookup("7").is_err());
    }

    #[test]
    fn odd_dimensions_floor_chroma() {
        assert_eq!(PixelFormat::Yuv420p.chroma_size(961, 541), (480, 270));
        let layout = PixelFormat::Yuv420p.frame_layout(961, 541, 1);
        let u = layout.plane("U").unwrap();
        assert_eq!((u.width, u.height), (480, 270));
    }

    #[test]
    fn planar_offsets() {
        let layout = PixelFormat::Yuv420p.frame_layout(8, 4, 1);
        let y = layout.plane("Y").unwrap();
        let u = layout.plane("U").unwrap();
        let v = layout.plane("V").unwrap();
        assert_eq!((y.offset, y.len()), (0, 32));
        assert_eq!((u.offset, u.len()), (32, 8));
        assert_eq!((v.offset, v.len()), (40, 8));
        assert_eq!(layout.required_len(), 48);
    }

    #[test]
    fn nv12_four_by_four_needs_24_bytes() {
        let layout = PixelFormat::Nv12.frame_layout(4, 4, 1);
        assert_eq!(layout.required_len(), 24);
        assert!(layout.check(24).is_ok());
        assert!(matches!(
            layout.check(23),
            Err(Error::FrameSize {
                required: 24,
                actual: 23,
                ..
            })
        ));

        let uv = layout.plane("UV").unwrap();
        assert_eq!((uv.width, uv.height), (2, 2));
        assert_eq!(uv.format, PlaneFormat::LuminanceAlpha);
        assert_eq!(uv.len(), 8);
    }

    #[test]
    fn required_len_matches_packed_formula() {
        for format in PixelFormat::ALL {
            for (w, h) in [(4, 4), (961, 541), (1920, 1080), (3, 1)] {
                let layout = format.frame_layout(w, h, 1);
                assert_eq!(layout.required_len(), format.frame_len(w, h));
                assert!(layout.check(format.frame_len(w, h)).is_ok());
                if format.frame_len(w, h) > 0 {
                    assert!(layout.check(format.frame_len(w, h) - 1).is_err());
                }
            }
        }
    }

    #[test]
    fn alignment_pads_rows() {
        let layout = PixelFormat::Yuv420p.frame_layout(6, 2, 4);
        let y = layout.plane("Y").unwrap();
        let u = layout.plane("U").unwrap();
        assert_eq!(y.bytes_per_row, 8);
        assert_eq!(u.bytes_per_row, 4);
        assert_eq!(u.offset, 16);
        assert_eq!(layout.required_len(), 16 + 4 + 4);
    }

    #[test]
    fn alignment_pads_last_row_too() {
        // 6x2 luma at align 4: GL would accept 8 + 6 bytes for Y alone.
        let layout = PixelFormat::Yuv420p.frame_layout(6, 2, 4);
        let y = layout.plane("Y").unwrap();
        assert_eq!(y.len(), 16);
        assert_eq!(layout.plane("V").unwrap().offset, 20);

        // Y padded except its last row, then packed U and V.
        let gl_sized = 8 + 6 + 3 + 3;
        assert!(matches!(
            layout.check(gl_sized),
            Err(Error::FrameSize { required: 24, .. })
        ));
        assert!(layout.check(24).is_ok());
    }
}
