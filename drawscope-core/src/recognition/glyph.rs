//! Template matching of grayscale bitmaps against reference glyphs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Candidates kept as fallbacks besides the winner.
pub const TOP_CANDIDATES: usize = 10;

/// Glyph sums may differ by at most this factor to be compared at all.
const SUM_TOLERANCE: u64 = 2;

/// A reference bitmap, one gray byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphSample {
    pub character: char,
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
    pub sum: u64,
}

impl GlyphSample {
    pub fn new(character: char, width: u16, height: u16, pixels: Vec<u8>) -> Self {
        let sum = intensity(&pixels);
        Self {
            character,
            width,
            height,
            pixels,
            sum,
        }
    }
}

/// Reference glyphs grouped by font size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlyphBank {
    sets: BTreeMap<u16, Vec<GlyphSample>>,
}

impl GlyphBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, font_size: u16, sample: GlyphSample) {
        self.sets.entry(font_size).or_default().push(sample);
    }

    pub fn set(&self, font_size: u16) -> &[GlyphSample] {
        self.sets.get(&font_size).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every sample, smallest font size first.
    pub fn glyphs(&self) -> impl Iterator<Item = &GlyphSample> + Clone {
        self.sets.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.sets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphMatch {
    pub character: char,
    pub distance: u64,
}

/// The winning glyph and the closest candidates in ascending distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub best: GlyphMatch,
    pub candidates: Vec<GlyphMatch>,
}

impl MatchResult {
    /// The winner if it satisfies `accept`, else the closest candidate that does.
    pub fn best_where(&self, accept: impl Fn(char) -> bool) -> Option<char> {
        if accept(self.best.character) {
            return Some(self.best.character);
        }
        self.candidates
            .iter()
            .map(|c| c.character)
            .find(|&c| accept(c))
    }
}

fn intensity(pixels: &[u8]) -> u64 {
    pixels.iter().map(|&p| p as u64).sum()
}

/// Minimum distance of `small` slid over every position inside `large`.
///
/// At each alignment the distance is the absolute difference inside the
/// overlap plus all intensity of `large` outside of it.
fn sliding_distance(
    small: &[u8],
    (sw, sh): (usize, usize),
    large: &[u8],
    (lw, lh): (usize, usize),
    large_sum: u64,
) -> u64 {
    let mut best = u64::MAX;
    for dy in 0..=(lh - sh) {
        for dx in 0..=(lw - sw) {
            let mut diff = 0u64;
            let mut covered = 0u64;
            for y in 0..sh {
                let s_row = &small[y * sw..(y + 1) * sw];
                let l_start = (y + dy) * lw + dx;
                let l_row = &large[l_start..l_start + sw];
                for (&s, &l) in s_row.iter().zip(l_row) {
                    diff += s.abs_diff(l) as u64;
                    covered += l as u64;
                }
            }
            let distance = diff + (large_sum - covered);
            if distance < best {
                best = distance;
                if best == 0 {
                    return 0;
                }
            }
        }
    }
    best
}

/// Distance between a query and one sample, when they are comparable.
///
/// Samples outside the sum tolerance, or whose bitmap is neither contained
/// in nor contains the query in both axes, are not candidates.
fn distance(query: &[u8], width: usize, height: usize, sum: u64, sample: &GlyphSample) -> Option<u64> {
    if sum > sample.sum * SUM_TOLERANCE || sample.sum > sum * SUM_TOLERANCE {
        return None;
    }
    let (gw, gh) = (sample.width as usize, sample.height as usize);
    if sample.pixels.len() != gw * gh {
        return None;
    }
    if gw <= width && gh <= height {
        Some(sliding_distance(&sample.pixels, (gw, gh), query, (width, height), sum))
    } else if width <= gw && height <= gh {
        Some(sliding_distance(query, (width, height), &sample.pixels, (gw, gh), sample.sum))
    } else {
        None
    }
}

/// Match a grayscale bitmap against `samples`.
///
/// The strictly closest sample wins, so ties go to the earliest one. A zero
/// distance ends the search. Returns `None` when no sample is comparable.
pub fn match_glyph<'a>(
    query: &[u8],
    width: u16,
    height: u16,
    samples: impl IntoIterator<Item = &'a GlyphSample>,
) -> Option<MatchResult> {
    let (width, height) = (width as usize, height as usize);
    if query.len() != width * height {
        return None;
    }
    let sum = intensity(query);

    let mut scored: Vec<GlyphMatch> = Vec::new();
    for sample in samples {
        let Some(distance) = distance(query, width, height, sum, sample) else {
            continue;
        };
        scored.push(GlyphMatch {
            character: sample.character,
            distance,
        });
        if distance == 0 {
            break;
        }
    }

    // Stable, so equal distances keep sample order.
    scored.sort_by_key(|m| m.distance);
    scored.truncate(TOP_CANDIDATES);
    let best = *scored.first()?;
    Some(MatchResult {
        best,
        candidates: scored,
    })
}
