//! Discretized pixel-run signatures used as sequence tree keys.
//!
//! Both signatures scan the region row-major. The color signature skips
//! transparent pixels entirely, so it survives a sprite being drawn over a
//! different background; the transparency signature keeps only the shape.

use crate::pixels::PixelFormat;

/// Bits of a color token holding the bucket; the run length sits above.
pub const BUCKET_BITS: u32 = 12;

/// 4 bits per channel packed as `rrrrggggbbbb`.
#[inline]
fn bucket(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32 >> 4) << 8) | ((g as u32 >> 4) << 4) | (b as u32 >> 4)
}

/// Run-length encoded color buckets of every opaque pixel.
///
/// Returns an empty signature for a region without opaque pixels.
pub fn color_signature(pixels: &[u8], format: PixelFormat) -> Vec<u32> {
    let bpp = format.bytes_per_pixel();
    let mut tokens = Vec::new();
    let mut current: Option<(u32, u32)> = None;

    for px in pixels.chunks_exact(bpp) {
        let (r, g, b, a) = format.rgba(px);
        if a == 0 {
            continue;
        }
        let bucket = bucket(r, g, b);
        current = match current {
            Some((prev, run)) if prev == bucket => Some((prev, run + 1)),
            Some((prev, run)) => {
                tokens.push((run << BUCKET_BITS) | prev);
                Some((bucket, 1))
            }
            None => Some((bucket, 1)),
        };
    }
    if let Some((prev, run)) = current {
        tokens.push((run << BUCKET_BITS) | prev);
    }
    tokens
}

/// Alternating transparent and opaque run lengths.
///
/// The first run is always transparent and may be zero.
pub fn transparency_signature(pixels: &[u8], format: PixelFormat) -> Vec<u32> {
    let bpp = format.bytes_per_pixel();
    let mut runs = Vec::new();
    let mut opaque = false;
    let mut run = 0u32;

    for px in pixels.chunks_exact(bpp) {
        let (_, _, _, a) = format.rgba(px);
        if (a > 0) != opaque {
            runs.push(run);
            opaque = !opaque;
            run = 0;
        }
        run += 1;
    }
    runs.push(run);
    runs
}

pub fn is_blank(pixels: &[u8], format: PixelFormat) -> bool {
    let bpp = format.bytes_per_pixel();
    pixels
        .chunks_exact(bpp)
        .all(|px| format.rgba(px).3 == 0)
}
