//! Content-addressed recognition of uploaded pixels.
//!
//! - [`sprite`]: sequence-tree lookup of tile-surface uploads
//! - [`number`]: floating damage/heal/experience numbers
//! - [`glyph`]: template matching against the glyph bank
//! - [`database`]: the shared, read-only [`RecognitionDb`]

pub mod database;
pub mod glyph;
pub mod number;
pub mod sequence;
pub mod signature;
pub mod sprite;

use image::{GrayImage, imageops};

pub use database::{IdCategory, IdRanges, ObjectInfo, ObjectKind, RecognitionDb};
pub use glyph::{GlyphBank, GlyphMatch, GlyphSample, MatchResult, match_glyph};
pub use number::recognize_number;
pub use sequence::SequenceTree;
pub use sprite::{SpriteRecognition, recognize_sprite};

use crate::pixels::{PixelFormat, to_grayscale};
use crate::render::LARGE_GLYPH_SURFACE_HEIGHT;

/// Width large glyph uploads are scaled to before matching.
pub const LARGE_GLYPH_SCALED_WIDTH: u32 = 16;

/// OCR of a single character uploaded to a glyph surface.
///
/// Uploads to the large glyph surface are scaled to a fixed width first,
/// keeping their aspect ratio.
pub fn recognize_glyph_upload(
    bank: &GlyphBank,
    pixels: &[u8],
    width: u16,
    height: u16,
    format: PixelFormat,
    surface_height: u16,
) -> Option<char> {
    let gray = to_grayscale(pixels, format);
    if surface_height != LARGE_GLYPH_SURFACE_HEIGHT || width == 0 {
        return match_glyph(&gray, width, height, bank.glyphs()).map(|m| m.best.character);
    }

    let image = GrayImage::from_raw(width as u32, height as u32, gray)?;
    let scaled_height = ((height as u32 * LARGE_GLYPH_SCALED_WIDTH + width as u32 / 2)
        / width as u32)
        .max(1);
    let scaled = imageops::resize(
        &image,
        LARGE_GLYPH_SCALED_WIDTH,
        scaled_height,
        imageops::FilterType::Nearest,
    );
    let (w, h) = scaled.dimensions();
    match_glyph(scaled.as_raw(), w as u16, h as u16, bank.glyphs()).map(|m| m.best.character)
}
