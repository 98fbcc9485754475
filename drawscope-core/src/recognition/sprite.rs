//! Sprite recognition of tile-surface uploads.

use tracing::debug;

use crate::cache::{CombatSquareKind, SpriteObjectPairing, TileContent};
use crate::error::DecodeError;
use crate::pixels::PixelFormat;
use crate::recognition::database::{IdCategory, RecognitionDb};
use crate::recognition::number::recognize_number;
use crate::recognition::signature::{color_signature, is_blank, transparency_signature};

/// Outcome of recognizing one uploaded region.
#[derive(Debug, Clone, PartialEq)]
pub enum SpriteRecognition {
    Blank,
    Recognized(TileContent),
    /// Nothing in the database explains the pixels.
    Failed,
}

/// Keep ids present in both sorted lists.
fn intersect(color: &[u32], transparency: &[u32]) -> Vec<u32> {
    color
        .iter()
        .copied()
        .filter(|id| transparency.binary_search(id).is_ok())
        .collect()
}

/// Sort matched ids into exactly one kind of tile content.
fn bucket(db: &RecognitionDb, ids: &[u32]) -> Result<Option<TileContent>, DecodeError> {
    let mut pairings: Vec<SpriteObjectPairing> = Vec::new();
    let mut names: Vec<&str> = Vec::new();
    let mut squares: Vec<CombatSquareKind> = Vec::new();

    for &id in ids {
        match db.ranges.categorize(id) {
            Some(IdCategory::Sprite) => pairings.extend(db.pairing(id)),
            Some(IdCategory::GraphicsResource) => names.extend(db.graphics_resource(id)),
            Some(IdCategory::CombatSquare) => squares.extend(db.combat_square(id)),
            None => debug!(id, "matched id outside every id range"),
        }
    }

    let categories = [!pairings.is_empty(), !names.is_empty(), !squares.is_empty()]
        .into_iter()
        .filter(|&c| c)
        .count();
    if categories > 1 {
        return Err(DecodeError::Consistency(format!(
            "ids {ids:?} resolve to {categories} kinds of content"
        )));
    }
    if names.len() > 1 {
        return Err(DecodeError::Consistency(format!(
            "ids {ids:?} resolve to several graphics resources: {names:?}"
        )));
    }
    if squares.len() > 1 {
        return Err(DecodeError::Consistency(format!(
            "ids {ids:?} resolve to several combat squares: {squares:?}"
        )));
    }

    let content = if let Some(name) = names.first() {
        TileContent::GraphicsResourceName(name.to_string())
    } else if let Some(&kind) = squares.first() {
        TileContent::CombatSquare(kind)
    } else if !pairings.is_empty() {
        TileContent::SpriteObjectPairings(pairings)
    } else {
        return Ok(None);
    };
    Ok(Some(content))
}

/// Identify an uploaded region of the tile surface.
///
/// A color-tree hit must be confirmed by the transparency tree. On a color
/// miss the region may still be a floating number, or a blend-animated
/// sprite whose colors never match a stored rendering exactly.
pub fn recognize_sprite(
    db: &RecognitionDb,
    pixels: &[u8],
    width: u16,
    height: u16,
    format: PixelFormat,
) -> Result<SpriteRecognition, DecodeError> {
    if is_blank(pixels, format) {
        return Ok(SpriteRecognition::Blank);
    }

    let transparency = transparency_signature(pixels, format);
    let color_hits = db.color_tree.find(&color_signature(pixels, format));
    if !color_hits.is_empty() {
        let ids = intersect(&color_hits, &db.transparency_tree.find(&transparency));
        if ids.is_empty() {
            return Ok(SpriteRecognition::Failed);
        }
        return Ok(match bucket(db, &ids)? {
            Some(content) => SpriteRecognition::Recognized(content),
            None => SpriteRecognition::Failed,
        });
    }

    if let Some(number) = recognize_number(pixels, width, height, format, db.glyphs.glyphs()) {
        return Ok(SpriteRecognition::Recognized(TileContent::Number(number)));
    }

    let pairings: Vec<SpriteObjectPairing> = db
        .transparency_tree
        .find(&transparency)
        .into_iter()
        .filter(|&id| db.ranges.categorize(id) == Some(IdCategory::Sprite))
        .filter_map(|id| db.pairing_where(id, |info| info.is_blend_animated()))
        .collect();
    if !pairings.is_empty() {
        return Ok(SpriteRecognition::Recognized(
            TileContent::SpriteObjectPairings(pairings),
        ));
    }

    Ok(SpriteRecognition::Failed)
}
