//! Spatial tile cache.
//!
//! Recognition results are memoized per surface and rectangle. Tiles of one
//! surface never overlap: inserting a tile evicts every tile it intersects.
//! Tiles are ordered by origin, and the largest extent ever stored on a
//! surface bounds how far left of a query a candidate origin can lie.

pub mod tile;

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

pub use tile::{
    CombatSquareKind, NumberKind, SpriteObjectPairing, Tile, TileContent, TileNumber,
};

#[inline]
fn intersects(a: (u32, u32, u32, u32), b: (u32, u32, u32, u32)) -> bool {
    let (ax, ay, aw, ah) = a;
    let (bx, by, bw, bh) = b;
    ax < bx.saturating_add(bw)
        && bx < ax.saturating_add(aw)
        && ay < by.saturating_add(bh)
        && by < ay.saturating_add(ah)
}

#[derive(Debug, Default)]
struct SurfaceTiles {
    tiles: BTreeMap<(u32, u32), Tile>,
    max_width: u32,
    max_height: u32,
}

impl SurfaceTiles {
    /// Origins of all tiles intersecting the rectangle.
    fn keys_in(&self, x: u32, y: u32, width: u32, height: u32) -> Vec<(u32, u32)> {
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let lo = x.saturating_sub(self.max_width.saturating_sub(1));
        let hi = x.saturating_add(width - 1);
        self.tiles
            .range((lo, 0)..=(hi, u32::MAX))
            .filter(|((tx, ty), t)| {
                intersects(
                    (*tx, *ty, t.width as u32, t.height as u32),
                    (x, y, width, height),
                )
            })
            .map(|(k, _)| *k)
            .collect()
    }

    /// Origin of the tile whose rectangle contains the point.
    fn containing(&self, x: u32, y: u32) -> Option<(u32, u32)> {
        let lo = x.saturating_sub(self.max_width.saturating_sub(1));
        let top = y.saturating_sub(self.max_height.saturating_sub(1));
        self.tiles
            .range((lo, top)..=(x, u32::MAX))
            .find(|((tx, ty), t)| {
                x < tx.saturating_add(t.width as u32)
                    && *ty <= y
                    && y < ty.saturating_add(t.height as u32)
            })
            .map(|(k, _)| *k)
    }

    fn remove_area(&mut self, x: u32, y: u32, width: u32, height: u32) -> usize {
        let keys = self.keys_in(x, y, width, height);
        for key in &keys {
            self.tiles.remove(key);
        }
        keys.len()
    }

    fn insert(&mut self, x: u32, y: u32, tile: Tile) {
        self.remove_area(x, y, tile.width as u32, tile.height as u32);
        self.max_width = self.max_width.max(tile.width as u32);
        self.max_height = self.max_height.max(tile.height as u32);
        self.tiles.insert((x, y), tile);
    }
}

/// Per-surface spatial index of [`Tile`]s.
#[derive(Debug, Default)]
pub struct TileCache {
    surfaces: HashMap<u32, SurfaceTiles>,
}

impl TileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `tile` at `(x, y)`, evicting every tile it intersects.
    pub fn set(&mut self, surface: u32, x: u32, y: u32, tile: Tile) {
        self.surfaces.entry(surface).or_default().insert(x, y, tile);
    }

    /// Tile stored with its origin exactly at `(x, y)`.
    pub fn get(&self, surface: u32, x: u32, y: u32) -> Option<&Tile> {
        self.surfaces.get(&surface)?.tiles.get(&(x, y))
    }

    /// All tiles intersecting the rectangle, ordered by origin.
    pub fn get_by_area(
        &self,
        surface: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Vec<(u32, u32, &Tile)> {
        let Some(tiles) = self.surfaces.get(&surface) else {
            return Vec::new();
        };
        tiles
            .keys_in(x, y, width, height)
            .into_iter()
            .filter_map(|(tx, ty)| tiles.tiles.get(&(tx, ty)).map(|t| (tx, ty, t)))
            .collect()
    }

    /// Evict every tile intersecting the rectangle; returns how many were removed.
    pub fn remove_by_area(&mut self, surface: u32, x: u32, y: u32, width: u32, height: u32) -> usize {
        match self.surfaces.get_mut(&surface) {
            Some(tiles) => tiles.remove_area(x, y, width, height),
            None => 0,
        }
    }

    /// Tile covering `(x, y)`.
    ///
    /// A tile that merely contains the point is re-cached at the point,
    /// shrunk to the part right of and below it, which replaces the original.
    pub fn find_containing(&mut self, surface: u32, x: u32, y: u32) -> Option<Tile> {
        let tiles = self.surfaces.get_mut(&surface)?;
        if let Some(tile) = tiles.tiles.get(&(x, y)) {
            return Some(tile.clone());
        }

        let (fx, fy) = tiles.containing(x, y)?;
        let found = tiles.tiles.get(&(fx, fy))?.clone();
        let shrunk = Tile::new(
            found.width - (x - fx) as u16,
            found.height - (y - fy) as u16,
            found.content.clone(),
        );
        tiles.insert(x, y, shrunk);
        Some(found)
    }

    /// Fuzzy lookup of the glyph drawn from `(x, y)`.
    ///
    /// Tries the exact origin, then a containing tile, then the tile with
    /// the nearest x origin inside a `width`×`height` area centered on the
    /// point. A tile found by the last step is re-keyed at the point.
    pub fn find_glyph(
        &mut self,
        surface: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Option<Tile> {
        if let Some(tile) = self.find_containing(surface, x, y) {
            return Some(tile);
        }

        let area_x = x.saturating_sub(width / 2);
        let area_y = y.saturating_sub(height / 2);
        let mut closest: Option<(u32, &Tile)> = None;
        for (tx, _, tile) in self.get_by_area(surface, area_x, area_y, width, height) {
            let dx = tx.abs_diff(x);
            if closest.is_none_or(|(best, _)| dx < best) {
                closest = Some((dx, tile));
            }
        }

        let tile = closest?.1.clone();
        self.set(surface, x, y, tile.clone());
        Some(tile)
    }

    /// Drop every tile of a surface.
    pub fn clear(&mut self, surface: u32) {
        self.surfaces.remove(&surface);
    }

    /// Number of tiles across all surfaces.
    pub fn len(&self) -> usize {
        self.surfaces.values().map(|s| s.tiles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn surface_len(&self, surface: u32) -> usize {
        self.surfaces.get(&surface).map_or(0, |s| s.tiles.len())
    }

    /// One line per tile intersecting the area, for error reports.
    pub fn describe_area(&self, surface: u32, x: u32, y: u32, width: u32, height: u32) -> String {
        let mut out = String::new();
        for (tx, ty, tile) in self.get_by_area(surface, x, y, width, height) {
            let _ = writeln!(
                out,
                "\t{tx}x{ty} {}x{} ({})",
                tile.width,
                tile.height,
                tile.content.kind_name()
            );
        }
        out
    }
}
