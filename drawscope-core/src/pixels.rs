//! Pixel formats and raw images carried by pixel uploads.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout of an upload payload.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba = 0,
    /// 4 bytes per pixel: Blue, Green, Red, Alpha.
    Bgra = 1,
    /// 1 byte per pixel: coverage only.
    Alpha = 2,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
            PixelFormat::Alpha => 1,
        }
    }

    /// Returns `(r, g, b, a)` of the pixel starting at `px`.
    ///
    /// Alpha-only pixels are reported as white with their coverage as alpha.
    #[inline]
    pub fn rgba(self, px: &[u8]) -> (u8, u8, u8, u8) {
        match self {
            PixelFormat::Rgba => (px[0], px[1], px[2], px[3]),
            PixelFormat::Bgra => (px[2], px[1], px[0], px[3]),
            PixelFormat::Alpha => (255, 255, 255, px[0]),
        }
    }
}

impl TryFrom<u8> for PixelFormat {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PixelFormat::Rgba),
            1 => Ok(PixelFormat::Bgra),
            2 => Ok(PixelFormat::Alpha),
            _ => Err(DecodeError::UnknownVariant {
                type_name: "PixelFormat",
                value: value as u64,
            }),
        }
    }
}

// ── Grayscale ────────────────────────────────────────────────────

/// Luma of an 8-bit color, weighted `(11r + 16g + 5b) / 32`.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 11 + g as u32 * 16 + b as u32 * 5) / 32) as u8
}

/// Converts tightly packed pixels into one gray byte per pixel.
///
/// Color pixels are composited over black, so a fully transparent pixel
/// is background regardless of its color channels.
pub fn to_grayscale(pixels: &[u8], format: PixelFormat) -> Vec<u8> {
    match format {
        PixelFormat::Alpha => pixels.to_vec(),
        PixelFormat::Rgba | PixelFormat::Bgra => pixels
            .chunks_exact(4)
            .map(|px| {
                let (r, g, b, a) = format.rgba(px);
                (luma(r, g, b) as u32 * a as u32 / 255) as u8
            })
            .collect(),
    }
}

/// Converts tightly packed pixels to RGBA order.
pub fn to_rgba(pixels: &[u8], format: PixelFormat) -> Vec<u8> {
    match format {
        PixelFormat::Rgba => pixels.to_vec(),
        PixelFormat::Bgra => pixels
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect(),
        PixelFormat::Alpha => pixels.iter().flat_map(|&a| [255, 255, 255, a]).collect(),
    }
}

// ── RawImage ─────────────────────────────────────────────────────

/// An uploaded pixel rectangle kept verbatim (screen snapshots, minimap).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImage {
    pub format: PixelFormat,
    pub width: u16,
    pub height: u16,
    /// Tightly packed rows, `width * height * bpp` bytes.
    #[serde(skip)]
    pub pixels: Vec<u8>,
}

impl RawImage {
    pub fn new(format: PixelFormat, width: u16, height: u16, pixels: &[u8]) -> Self {
        Self {
            format,
            width,
            height,
            pixels: pixels.to_vec(),
        }
    }

    /// Total byte size the bitmap occupies.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}
