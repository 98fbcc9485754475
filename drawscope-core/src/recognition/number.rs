//! Floating number recognition (damage, healing and experience indicators).

use crate::cache::{NumberKind, TileNumber};
use crate::pixels::{PixelFormat, to_grayscale};
use crate::recognition::glyph::{GlyphSample, match_glyph};

pub const MIN_DIGIT_WIDTH: u16 = 8;
pub const MAX_DIGIT_WIDTH: u16 = 9;
pub const MIN_DIGIT_HEIGHT: u16 = 10;
pub const MAX_DIGIT_HEIGHT: u16 = 11;

/// Channel sum below which an opaque pixel counts as dark outline.
const DARK_THRESHOLD: u32 = 10;
/// Gray level separating digit strokes from background.
const GRAY_THRESHOLD: u8 = 10;
const TARGET_BRIGHTNESS: f32 = 175.0;

fn within(v: f32, lo: f32, hi: f32) -> bool {
    (lo..=hi).contains(&v)
}

/// Classify the number kind from the red/green/blue share of lit pixels.
pub fn classify_color(pixels: &[u8], format: PixelFormat) -> Option<NumberKind> {
    if format == PixelFormat::Alpha {
        return None;
    }
    let (mut r_sum, mut g_sum, mut b_sum) = (0u64, 0u64, 0u64);
    for px in pixels.chunks_exact(4) {
        let (r, g, b, a) = format.rgba(px);
        if a == 255 && r as u32 + g as u32 + b as u32 >= DARK_THRESHOLD {
            r_sum += r as u64;
            g_sum += g as u64;
            b_sum += b as u64;
        }
    }
    let total = (r_sum + g_sum + b_sum) as f32;
    if total == 0.0 {
        return None;
    }
    let (r, g, b) = (r_sum as f32 / total, g_sum as f32 / total, b_sum as f32 / total);

    let kind = if g >= 0.95 {
        NumberKind::PoisonDamage
    } else if r >= 0.95 {
        NumberKind::PhysicalDamage
    } else if within(g, 0.38, 0.40) && within(b, 0.38, 0.40) {
        NumberKind::IceDamage
    } else if within(r, 0.30, 0.35) && within(g, 0.30, 0.35) && within(b, 0.30, 0.35) {
        NumberKind::XpGain
    } else if within(r, 0.50, 0.60) && within(g, 0.20, 0.30) && within(b, 0.20, 0.30) {
        NumberKind::HpGain
    } else if within(r, 0.15, 0.25) && within(g, 0.25, 0.35) && within(b, 0.45, 0.55) {
        NumberKind::ManaGain
    } else if within(r, 0.58, 0.65) && within(g, 0.35, 0.42) && b <= 0.05 {
        NumberKind::FireDamage
    } else if within(r, 0.37, 0.43) && within(g, 0.07, 0.13) && within(b, 0.47, 0.53) {
        NumberKind::EnergyDamage
    } else {
        return None;
    };
    Some(kind)
}

/// Rescale lit pixels so their mean is the target brightness.
///
/// Returns `false` when nothing is lit.
pub fn normalize_brightness(gray: &mut [u8]) -> bool {
    let (sum, count) = gray
        .iter()
        .filter(|&&p| p > GRAY_THRESHOLD)
        .fold((0u64, 0u64), |(s, n), &p| (s + p as u64, n + 1));
    if count == 0 {
        return false;
    }
    let modifier = TARGET_BRIGHTNESS / (sum as f32 / count as f32);
    if !modifier.is_finite() {
        return false;
    }
    for p in gray.iter_mut().filter(|p| **p > GRAY_THRESHOLD) {
        *p = (*p as f32 * modifier).round().min(255.0) as u8;
    }
    true
}

fn read_digit<'a>(
    window: &[u8],
    width: u16,
    height: u16,
    glyphs: impl IntoIterator<Item = &'a GlyphSample>,
) -> Option<u32> {
    match_glyph(window, width, height, glyphs)?
        .best_where(|c| c.is_ascii_digit())
        .and_then(|c| c.to_digit(10))
}

/// Read a floating number from a tile-surface upload.
///
/// Digits are read right to left in windows of 9 columns, or exactly 8 for
/// the last one; neighbouring windows share a column.
pub fn recognize_number<'a, I>(
    pixels: &[u8],
    width: u16,
    height: u16,
    format: PixelFormat,
    glyphs: I,
) -> Option<TileNumber>
where
    I: IntoIterator<Item = &'a GlyphSample> + Clone,
{
    if width < MIN_DIGIT_WIDTH || !(MIN_DIGIT_HEIGHT..=MAX_DIGIT_HEIGHT).contains(&height) {
        return None;
    }
    let kind = classify_color(pixels, format)?;

    let mut gray = to_grayscale(pixels, format);
    if !normalize_brightness(&mut gray) {
        return None;
    }

    if width <= MAX_DIGIT_WIDTH {
        let value = read_digit(&gray, width, height, glyphs)?;
        return Some(TileNumber { value, kind });
    }

    let (w, h) = (width as usize, height as usize);
    let mut value = 0u32;
    let mut magnitude = 1u32;
    let mut x = w - 1;
    while x > 0 {
        let remaining = x + 1;
        let cell = if remaining >= MAX_DIGIT_WIDTH as usize {
            MAX_DIGIT_WIDTH as usize
        } else if remaining == MIN_DIGIT_WIDTH as usize {
            MIN_DIGIT_WIDTH as usize
        } else {
            return None;
        };
        x -= cell - 1;

        let window: Vec<u8> = (0..h)
            .flat_map(|row| gray[row * w + x..row * w + x + cell].iter().copied())
            .collect();
        let digit = read_digit(&window, cell as u16, height, glyphs.clone())?;
        value = value.checked_add(magnitude.checked_mul(digit)?)?;
        magnitude = magnitude.checked_mul(10)?;
    }
    Some(TileNumber { value, kind })
}
