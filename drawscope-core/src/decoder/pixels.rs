//! Pixel uploads, surface copies and surface allocation.

use std::sync::Arc;

use tracing::{debug, warn};

use super::FrameDecoder;
use crate::cache::{Tile, TileContent};
use crate::error::DecodeError;
use crate::frame::RecognitionFailure;
use crate::message::{CopyTexture, PixelData, TextureData};
use crate::pixels::{PixelFormat, RawImage};
use crate::recognition::{SpriteRecognition, recognize_glyph_upload, recognize_sprite};

impl FrameDecoder {
    pub(super) fn on_screen_pixels(&mut self, header: &PixelData, pixels: &[u8]) {
        self.frame.screen_pixels = Some(Arc::new(RawImage::new(
            header.format,
            header.width,
            header.height,
            pixels,
        )));
    }

    pub(super) fn on_pixel_data(&mut self, header: &PixelData, pixels: &[u8]) -> Result<(), DecodeError> {
        let target = header.target;
        if self.state.is_tile_surface(target) {
            return self.update_tile_surface(header, pixels);
        }
        if self.state.is_minimap_surface(target) {
            let image = RawImage::new(header.format, header.width, header.height, pixels);
            self.state.store_minimap(target, image);
            return Ok(());
        }
        if self.state.is_glyph_surface(target) {
            self.update_glyph_surface(header, pixels);
            return Ok(());
        }
        debug!(surface = target, "pixel upload to an untracked surface");
        Ok(())
    }

    fn update_tile_surface(&mut self, header: &PixelData, pixels: &[u8]) -> Result<(), DecodeError> {
        if header.format == PixelFormat::Alpha {
            return Ok(());
        }
        let PixelData {
            target,
            x,
            y,
            width,
            height,
            format,
        } = *header;

        let content = match recognize_sprite(&self.db, pixels, width, height, format)? {
            SpriteRecognition::Blank => TileContent::Blank,
            SpriteRecognition::Recognized(content) => content,
            SpriteRecognition::Failed => {
                self.cache
                    .remove_by_area(target, x as u32, y as u32, width as u32, height as u32);
                if width != 1 && height != 1 {
                    self.record_failure(header, pixels);
                }
                return Ok(());
            }
        };
        self.cache
            .set(target, x as u32, y as u32, Tile::new(width, height, content));
        Ok(())
    }

    fn record_failure(&mut self, header: &PixelData, pixels: &[u8]) {
        let dump = self.dumper.dump(
            header.x,
            header.y,
            header.width,
            header.height,
            pixels,
            header.format,
        );
        match &dump {
            Some(path) => warn!(
                "failed to recognize {}x{} region at {}x{}; dumped to {}",
                header.width,
                header.height,
                header.x,
                header.y,
                path.display()
            ),
            None => warn!(
                "failed to recognize {}x{} region at {}x{}",
                header.width, header.height, header.x, header.y
            ),
        }
        self.frame.recognition_failures.push(RecognitionFailure {
            surface: header.target,
            x: header.x,
            y: header.y,
            width: header.width,
            height: header.height,
            dump,
        });
    }

    fn update_glyph_surface(&mut self, header: &PixelData, pixels: &[u8]) {
        let (x, y) = (header.x as u32, header.y as u32);
        self.cache
            .remove_by_area(header.target, x, y, header.width as u32, header.height as u32);

        let Some(surface_height) = self.state.texture(header.target).map(|t| t.height) else {
            return;
        };
        if header.width > surface_height {
            return;
        }
        match recognize_glyph_upload(
            &self.db.glyphs,
            pixels,
            header.width,
            header.height,
            header.format,
            surface_height,
        ) {
            Some(c) => self.cache.set(
                header.target,
                x,
                y,
                Tile::new(header.width, header.height, TileContent::Glyph(c)),
            ),
            None => debug!(
                surface = header.target,
                x, y, "no glyph matches the upload"
            ),
        }
    }

    pub(super) fn on_copy_texture(&mut self, copy: &CopyTexture) -> Result<(), DecodeError> {
        if !self.state.is_glyph_surface(copy.source) {
            return Ok(());
        }
        if !self.state.is_glyph_surface(copy.target) {
            return Err(DecodeError::ProtocolViolation(
                "glyph surface copied into a non-glyph surface",
            ));
        }
        self.copy_glyphs(
            copy.source,
            (copy.src_x as u32, copy.src_y as u32),
            copy.target,
            (copy.dst_x as u32, copy.dst_y as u32),
            (copy.width as u32, copy.height as u32),
        )
    }

    /// Move cached glyphs of a source rectangle to a target position.
    pub(super) fn copy_glyphs(
        &mut self,
        source: u32,
        (src_x, src_y): (u32, u32),
        target: u32,
        (dst_x, dst_y): (u32, u32),
        (width, height): (u32, u32),
    ) -> Result<(), DecodeError> {
        let glyphs: Vec<(u32, u32, Tile)> = self
            .cache
            .get_by_area(source, src_x, src_y, width, height)
            .into_iter()
            .map(|(x, y, tile)| (x, y, tile.clone()))
            .collect();

        self.cache.remove_by_area(target, dst_x, dst_y, width, height);
        for (x, y, tile) in glyphs {
            if !matches!(tile.content, TileContent::Glyph(_)) {
                return Err(DecodeError::UnexpectedTile {
                    expected: "glyph",
                    found: tile.content.kind_name(),
                });
            }
            let (Some(tx), Some(ty)) = (
                dst_x.saturating_add(x).checked_sub(src_x),
                dst_y.saturating_add(y).checked_sub(src_y),
            )
            else {
                continue;
            };
            self.cache.set(target, tx, ty, tile);
        }
        Ok(())
    }

    pub(super) fn on_texture_data(&mut self, data: &TextureData) {
        self.cache.clear(data.surface);
        let role = self.state.allocate(data);
        debug!(
            surface = data.surface,
            width = data.width,
            height = data.height,
            ?role,
            "surface allocated"
        );
    }
}
