//! Memoized recognition results.

use serde::{Deserialize, Serialize};

/// Color class of a floating number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberKind {
    PoisonDamage,
    PhysicalDamage,
    IceDamage,
    XpGain,
    HpGain,
    ManaGain,
    FireDamage,
    EnergyDamage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileNumber {
    pub value: u32,
    pub kind: NumberKind,
}

/// Highlight drawn around a creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatSquareKind {
    /// Attack target.
    Red,
    /// Follow target.
    Green,
    /// Mouse hover.
    White,
    Black,
    Yellow,
}

/// A sprite id with the objects it may belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteObjectPairing {
    pub sprite_id: u32,
    pub objects: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TileContent {
    Blank,
    Glyph(char),
    SpriteObjectPairings(Vec<SpriteObjectPairing>),
    GraphicsResourceName(String),
    CombatSquare(CombatSquareKind),
    Number(TileNumber),
    /// Recognition was attempted and failed.
    Invalid,
}

impl TileContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TileContent::Blank => "blank",
            TileContent::Glyph(_) => "glyph",
            TileContent::SpriteObjectPairings(_) => "sprite",
            TileContent::GraphicsResourceName(_) => "graphics resource",
            TileContent::CombatSquare(_) => "combat square",
            TileContent::Number(_) => "number",
            TileContent::Invalid => "invalid",
        }
    }
}

/// A recognized rectangle of a surface, keyed by its origin in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub width: u16,
    pub height: u16,
    pub content: TileContent,
}

impl Tile {
    pub fn new(width: u16, height: u16, content: TileContent) -> Self {
        Self {
            width,
            height,
            content,
        }
    }

    pub fn invalid() -> Self {
        Self::new(0, 0, TileContent::Invalid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.content, TileContent::Invalid)
    }
}
