//! The read-only recognition database.
//!
//! Built once by an offline asset pipeline (or by tests), then shared with
//! every decoder through an `Arc`. Snapshots are plain bincode of the serde
//! representation.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::cache::{CombatSquareKind, SpriteObjectPairing};
use crate::error::DecodeError;
use crate::pixels::PixelFormat;
use crate::recognition::glyph::GlyphBank;
use crate::recognition::sequence::SequenceTree;
use crate::recognition::signature::{color_signature, transparency_signature};

// ── Id ranges ────────────────────────────────────────────────────

/// What a recognized id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdCategory {
    Sprite,
    GraphicsResource,
    CombatSquare,
}

/// Disjoint inclusive id ranges shared by both sequence trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRanges {
    pub sprites: RangeInclusive<u32>,
    pub graphics_resources: RangeInclusive<u32>,
    pub combat_squares: RangeInclusive<u32>,
}

impl Default for IdRanges {
    fn default() -> Self {
        Self {
            sprites: 1..=999_999,
            graphics_resources: 1_000_000..=1_099_999,
            combat_squares: 1_100_000..=1_100_999,
        }
    }
}

impl IdRanges {
    pub fn categorize(&self, id: u32) -> Option<IdCategory> {
        if self.sprites.contains(&id) {
            Some(IdCategory::Sprite)
        } else if self.graphics_resources.contains(&id) {
            Some(IdCategory::GraphicsResource)
        } else if self.combat_squares.contains(&id) {
            Some(IdCategory::CombatSquare)
        } else {
            None
        }
    }
}

// ── Objects ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Item,
    Outfit,
    Effect,
    Projectile,
}

/// Metadata of a game object that sprites can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub kind: ObjectKind,
    pub blend_frames: u8,
    pub addons: u8,
    pub mounts: u8,
}

impl ObjectInfo {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            blend_frames: 1,
            addons: 1,
            mounts: 1,
        }
    }

    /// Outfits with addons, mounts or blend frames are only ever drawn as
    /// merged sprites, never as their raw parts.
    pub fn is_merge_only(&self) -> bool {
        self.kind == ObjectKind::Outfit
            && (self.addons > 1 || self.mounts > 1 || self.blend_frames > 1)
    }

    pub fn is_blend_animated(&self) -> bool {
        self.blend_frames > 1
    }
}

// ── RecognitionDb ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionDb {
    pub color_tree: SequenceTree,
    pub transparency_tree: SequenceTree,
    /// Sprite id → ids of the objects drawn with it.
    pub bindings: HashMap<u32, Vec<u32>>,
    pub objects: HashMap<u32, ObjectInfo>,
    /// Sprite ids produced by merging outfit parts.
    pub merged_sprites: HashSet<u32>,
    /// Indexed by `id - graphics_resources.start()`.
    pub graphics_resources: Vec<String>,
    /// Indexed by `id - combat_squares.start()`.
    pub combat_squares: Vec<CombatSquareKind>,
    pub glyphs: GlyphBank,
    pub ranges: IdRanges,
}

impl RecognitionDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        Ok(bincode::serialize(self)?)
    }

    // ── Building ─────────────────────────────────────────────────

    /// Index both signatures of an image under `id`.
    pub fn insert_image(&mut self, id: u32, pixels: &[u8], format: PixelFormat) {
        self.color_tree.insert(&color_signature(pixels, format), id);
        self.transparency_tree
            .insert(&transparency_signature(pixels, format), id);
    }

    pub fn bind(&mut self, sprite_id: u32, object_id: u32, info: ObjectInfo) {
        self.objects.insert(object_id, info);
        let objects = self.bindings.entry(sprite_id).or_default();
        if !objects.contains(&object_id) {
            objects.push(object_id);
        }
    }

    /// Register a graphics resource name and return its id.
    pub fn add_graphics_resource(&mut self, name: impl Into<String>) -> u32 {
        let id = self.ranges.graphics_resources.start() + self.graphics_resources.len() as u32;
        self.graphics_resources.push(name.into());
        id
    }

    /// Register a combat square kind and return its id.
    pub fn add_combat_square(&mut self, kind: CombatSquareKind) -> u32 {
        let id = self.ranges.combat_squares.start() + self.combat_squares.len() as u32;
        self.combat_squares.push(kind);
        id
    }

    // ── Lookups ──────────────────────────────────────────────────

    pub fn graphics_resource(&self, id: u32) -> Option<&str> {
        let index = id.checked_sub(*self.ranges.graphics_resources.start())?;
        self.graphics_resources.get(index as usize).map(String::as_str)
    }

    pub fn combat_square(&self, id: u32) -> Option<CombatSquareKind> {
        let index = id.checked_sub(*self.ranges.combat_squares.start())?;
        self.combat_squares.get(index as usize).copied()
    }

    /// Objects bound to `sprite_id` that pass `keep`, or `None` if none do.
    pub fn pairing_where(
        &self,
        sprite_id: u32,
        keep: impl Fn(&ObjectInfo) -> bool,
    ) -> Option<SpriteObjectPairing> {
        let objects: Vec<u32> = self
            .bindings
            .get(&sprite_id)?
            .iter()
            .copied()
            .filter(|id| self.objects.get(id).is_some_and(&keep))
            .collect();
        (!objects.is_empty()).then_some(SpriteObjectPairing { sprite_id, objects })
    }

    /// Pairing of a color-tree hit; merge-only objects need a merged sprite.
    pub fn pairing(&self, sprite_id: u32) -> Option<SpriteObjectPairing> {
        let merged = self.merged_sprites.contains(&sprite_id);
        self.pairing_where(sprite_id, |info| merged || !info.is_merge_only())
    }
}
