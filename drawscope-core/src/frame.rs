//! The per-cycle output aggregate and its draw records.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CombatSquareKind, SpriteObjectPairing, TileNumber};
use crate::flags::DepthFlags;
use crate::message::FileIoKind;
use crate::pixels::RawImage;
use crate::render::Transform;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned rectangle given by two opposite corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub top_left: Point,
    pub bottom_right: Point,
}

impl Rect {
    pub fn new(top_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    pub fn width(&self) -> f32 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> f32 {
        self.bottom_right.y - self.top_left.y
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Scale a `[0, 1]` float color to bytes.
    pub fn from_unit(values: [f32; 4]) -> Self {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u8;
        Self::new(c(values[0]), c(values[1]), c(values[2]), c(values[3]))
    }
}

impl From<[u8; 4]> for Color {
    fn from(v: [u8; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// State every classified draw carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawInfo {
    /// Position of the originating draw call within its frame.
    pub draw_call_id: u32,
    pub depth: DepthFlags,
    pub order: Option<f32>,
    #[serde(skip)]
    pub transform: Arc<Transform>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextDraw {
    #[serde(flatten)]
    pub info: DrawInfo,
    pub rect: Rect,
    pub character: char,
    pub color: Color,
    pub is_outlined: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RectDraw {
    #[serde(flatten)]
    pub info: DrawInfo,
    pub rect: Rect,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteDraw {
    #[serde(flatten)]
    pub info: DrawInfo,
    pub rect: Rect,
    pub pairings: Vec<SpriteObjectPairing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuiDraw {
    #[serde(flatten)]
    pub info: DrawInfo,
    pub rect: Rect,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberDraw {
    #[serde(flatten)]
    pub info: DrawInfo,
    pub rect: Rect,
    pub number: TileNumber,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatSquareDraw {
    #[serde(flatten)]
    pub info: DrawInfo,
    pub rect: Rect,
    pub kind: CombatSquareKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiniMapDraw {
    #[serde(flatten)]
    pub info: DrawInfo,
    pub rect: Rect,
    /// The latest upload of the source surface, shared between draws.
    pub pixels: Option<Arc<RawImage>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIoEvent {
    pub kind: FileIoKind,
    pub path: String,
}

/// A tile-surface region that could not be recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognitionFailure {
    pub surface: u32,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub dump: Option<PathBuf>,
}

/// Everything reconstructed from one capture cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    /// Screen rectangle of the world view.
    pub view: Option<Rect>,
    /// Untransformed position of the minimap quad.
    pub minimap_position: Option<Point>,
    pub minimap_screen: Option<Rect>,
    pub has_minimap_moved: bool,
    pub screen_pixels: Option<Arc<RawImage>>,

    pub text_draws: Vec<TextDraw>,
    pub rect_draws: Vec<RectDraw>,
    pub sprite_draws: Vec<SpriteDraw>,
    pub gui_sprite_draws: Vec<SpriteDraw>,
    pub gui_draws: Vec<GuiDraw>,
    pub number_draws: Vec<NumberDraw>,
    pub combat_square_draws: Vec<CombatSquareDraw>,
    pub minimap_draws: Vec<MiniMapDraw>,
    pub file_io: Vec<FileIoEvent>,
    pub recognition_failures: Vec<RecognitionFailure>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Total classified draws of every kind.
    pub fn draw_count(&self) -> usize {
        self.text_draws.len()
            + self.rect_draws.len()
            + self.sprite_draws.len()
            + self.gui_sprite_draws.len()
            + self.gui_draws.len()
            + self.number_draws.len()
            + self.combat_square_draws.len()
            + self.minimap_draws.len()
    }

    pub fn text(&self) -> String {
        self.text_draws.iter().map(|t| t.character).collect()
    }
}
