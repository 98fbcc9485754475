//! Classification of draw calls into frame draws.

use std::sync::Arc;

use tracing::debug;

use super::FrameDecoder;
use crate::cache::TileContent;
use crate::error::DecodeError;
use crate::flags::{AttribFlags, DepthFlags};
use crate::frame::{
    Color, CombatSquareDraw, DrawInfo, GuiDraw, MiniMapDraw, NumberDraw, Point, Rect, RectDraw,
    SpriteDraw, TextDraw,
};
use crate::message::{DrawCall, Primitive};
use crate::render::{RenderState, TexturedVertex, Transform, VertexLayout, VertexView};

/// Uniform slots whose presence marks outlined text.
const OUTLINE_COLOR_SLOT: u32 = 1;
const OUTLINE_WIDTH_SLOT: u32 = 3;

/// Per-call fields shared by every draw it emits.
struct Stamp {
    draw_call_id: u32,
    depth: DepthFlags,
    transform: Arc<Transform>,
}

impl Stamp {
    fn info(&self, order: Option<f32>) -> DrawInfo {
        DrawInfo {
            draw_call_id: self.draw_call_id,
            depth: self.depth,
            order,
            transform: Arc::clone(&self.transform),
        }
    }
}

/// Two opposite corners of a textured quad.
struct Quad {
    top_left: TexturedVertex,
    bottom_right: TexturedVertex,
    order: Option<f32>,
}

impl Quad {
    fn rect(&self) -> Rect {
        Rect::new(position(&self.top_left), position(&self.bottom_right))
    }
}

fn position(v: &TexturedVertex) -> Point {
    Point { x: v.x, y: v.y }
}

/// Index distance from a quad's first to its opposite corner.
fn corner_offset(primitive: Primitive) -> Option<usize> {
    match primitive {
        Primitive::Triangles => Some(2),
        Primitive::TriangleStrip => Some(3),
        Primitive::TriangleFan => None,
    }
}

fn vertices<'a>(state: &'a RenderState, call: &DrawCall) -> Result<VertexView<'a>, DecodeError> {
    state
        .vertices(call.buffer)
        .ok_or(DecodeError::ProtocolViolation("draw from an unwritten vertex buffer"))
}

fn order_of(view: &VertexView<'_>, call: &DrawCall, vertex: u16) -> Result<Option<f32>, DecodeError> {
    if call.attribs.contains(AttribFlags::ORDER) {
        view.order(vertex)
    } else {
        Ok(None)
    }
}

/// One quad per 6 indices.
fn read_quads(view: &VertexView<'_>, call: &DrawCall, offset: usize) -> Result<Vec<Quad>, DecodeError> {
    let count = call.index_count as usize;
    let mut quads = Vec::new();
    for i in (0..count).step_by(6) {
        if i + offset >= count {
            break;
        }
        let first = view.index(call.index_offset, i)?;
        let opposite = view.index(call.index_offset, i + offset)?;
        quads.push(Quad {
            top_left: view.textured(first)?,
            bottom_right: view.textured(opposite)?,
            order: order_of(view, call, first)?,
        });
    }
    Ok(quads)
}

impl FrameDecoder {
    fn stamp(&self, call: &DrawCall) -> Stamp {
        Stamp {
            draw_call_id: self.draw_call_id,
            depth: call.depth,
            transform: self.state.program(call.program).transform,
        }
    }

    fn half_frame(&self) -> (f32, f32) {
        (self.frame.width as f32 / 2.0, self.frame.height as f32 / 2.0)
    }

    pub(super) fn on_draw_call(&mut self, call: &DrawCall) -> Result<(), DecodeError> {
        let layout = self.state.buffer(call.buffer).and_then(|b| b.layout());
        match layout {
            Some(VertexLayout::Colored) => return self.draw_rects(call),
            Some(VertexLayout::Textured | VertexLayout::TexturedUnordered) => {}
            Some(VertexLayout::Text) | None => {
                debug!(buffer = call.buffer, ?layout, "draw call ignored");
                return Ok(());
            }
        }

        if self.state.is_glyph_surface(call.source) {
            if call.target != 0 {
                return self.copy_glyph_quad(call);
            }
            return self.draw_text(call);
        }
        if self.state.is_tile_surface(call.source) {
            if call.target != 0 {
                return self.draw_sprites(call);
            }
            return self.draw_gui(call);
        }
        if self.state.unshaded_view() == Some(call.source) {
            return self.draw_unshaded_view(call);
        }
        if self.state.is_minimap_surface(call.source) {
            return self.draw_minimap(call);
        }
        Ok(())
    }

    /// Runs of equally colored strip vertices become one rectangle each.
    ///
    /// Runs end at a degenerate join (a repeated index, skipped together
    /// with the index after it) or where the vertex color changes.
    fn draw_rects(&mut self, call: &DrawCall) -> Result<(), DecodeError> {
        if call.target != 0 || call.primitive != Primitive::TriangleStrip {
            debug!(
                surface = call.target,
                primitive = ?call.primitive,
                "colored draw ignored"
            );
            return Ok(());
        }
        let stamp = self.stamp(call);
        let view = vertices(&self.state, call)?;
        let count = call.index_count as usize;

        let mut i = 0;
        let mut prev: Option<u16> = None;
        while i < count {
            let first = view.index(call.index_offset, i)?;
            let color = view.colored(first)?.color;
            let order = order_of(&view, call, first)?;

            let mut min = Point { x: f32::MAX, y: f32::MAX };
            let mut max = Point { x: f32::MIN, y: f32::MIN };
            let mut run = 0;
            let mut color_changed = false;
            while i < count {
                let index = view.index(call.index_offset, i)?;
                if prev == Some(index) {
                    break;
                }
                let v = view.colored(index)?;
                if v.color != color {
                    color_changed = true;
                    break;
                }
                min.x = min.x.min(v.x);
                min.y = min.y.min(v.y);
                max.x = max.x.max(v.x);
                max.y = max.y.max(v.y);
                prev = Some(index);
                run += 1;
                i += 1;
            }

            if run > 0 {
                self.frame.rect_draws.push(RectDraw {
                    info: stamp.info(order),
                    rect: Rect::new(min, max),
                    color,
                });
            }
            if !color_changed {
                i += 2;
            }
        }
        self.draw_call_id += 1;
        Ok(())
    }

    /// Triangle-fan copy of glyphs between two glyph surfaces.
    fn copy_glyph_quad(&mut self, call: &DrawCall) -> Result<(), DecodeError> {
        if !self.state.is_glyph_surface(call.target) {
            return Err(DecodeError::ProtocolViolation(
                "glyph surface drawn into a non-glyph surface",
            ));
        }
        if call.primitive != Primitive::TriangleFan {
            debug!(primitive = ?call.primitive, "glyph copy is not a triangle fan");
            return Ok(());
        }
        let (Some(source), Some(target)) = (
            self.state.texture(call.source).copied(),
            self.state.texture(call.target).copied(),
        ) else {
            return Ok(());
        };

        let view = vertices(&self.state, call)?;
        let a = view.textured(0)?;
        let b = view.textured(2)?;

        let (sw, sh) = (source.width as f32, source.height as f32);
        let src = (
            (a.tex_x.min(b.tex_x) * sw) as u32,
            (a.tex_y.min(b.tex_y) * sh) as u32,
        );
        let size = (
            ((a.tex_x - b.tex_x).abs() * sw) as u32,
            ((a.tex_y - b.tex_y).abs() * sh) as u32,
        );
        let (half_w, half_h) = (target.width as f32 / 2.0, target.height as f32 / 2.0);
        let dst = (
            (half_w * (a.x.min(b.x) + 1.0)) as u32,
            (half_h * (a.y.min(b.y) + 1.0)) as u32,
        );
        self.copy_glyphs(call.source, src, call.target, dst, size)
    }

    fn draw_text(&mut self, call: &DrawCall) -> Result<(), DecodeError> {
        let Some(offset) = corner_offset(call.primitive) else {
            debug!("text drawn as a triangle fan");
            return Ok(());
        };
        let stamp = self.stamp(call);
        let program = self.state.program(call.program);
        let (color, is_outlined) = match (
            program.uniforms.get(&OUTLINE_COLOR_SLOT),
            program.uniforms.get(&OUTLINE_WIDTH_SLOT),
        ) {
            (Some(outline), Some(_)) => (Color::from_unit(*outline), true),
            _ => (Color::from(call.blend_color), false),
        };

        let view = vertices(&self.state, call)?;
        let quads = read_quads(&view, call, offset)?;
        for quad in quads {
            let (tl, br) = (&quad.top_left, &quad.bottom_right);
            let x = tl.tex_x.min(br.tex_x) as u32;
            let y = tl.tex_y.min(br.tex_y) as u32;
            let width = (br.tex_x - tl.tex_x).abs() as u32;
            let height = (br.tex_y - tl.tex_y).abs() as u32;

            let character = match self.cache.find_glyph(call.source, x, y, width, height) {
                Some(tile) => match tile.content {
                    TileContent::Glyph(c) => c,
                    other => {
                        debug!(found = other.kind_name(), x, y, "non-glyph tile on glyph surface");
                        continue;
                    }
                },
                None => {
                    debug!(surface = call.source, x, y, "no cached glyph for text quad");
                    continue;
                }
            };
            self.frame.text_draws.push(TextDraw {
                info: stamp.info(quad.order),
                rect: quad.rect(),
                character,
                color,
                is_outlined,
            });
        }
        self.draw_call_id += 1;
        Ok(())
    }

    /// World sprites drawn into the unshaded view.
    fn draw_sprites(&mut self, call: &DrawCall) -> Result<(), DecodeError> {
        self.state.set_unshaded_view(call.target);
        let Some(offset) = corner_offset(call.primitive) else {
            debug!("sprites drawn as a triangle fan");
            return Ok(());
        };
        let Some(texture) = self.state.texture(call.source).copied() else {
            return Ok(());
        };
        let stamp = self.stamp(call);
        let view = vertices(&self.state, call)?;
        let quads = read_quads(&view, call, offset)?;

        for quad in quads {
            let x = (quad.top_left.tex_x * texture.width as f32) as u32;
            let y = (quad.top_left.tex_y * texture.height as f32) as u32;
            let Some(tile) = self.cache.find_containing(call.source, x, y) else {
                continue;
            };
            match tile.content {
                TileContent::SpriteObjectPairings(pairings) => {
                    self.frame.sprite_draws.push(SpriteDraw {
                        info: stamp.info(quad.order),
                        rect: quad.rect(),
                        pairings,
                    });
                }
                TileContent::CombatSquare(kind) => {
                    self.frame.combat_square_draws.push(CombatSquareDraw {
                        info: stamp.info(quad.order),
                        rect: quad.rect(),
                        kind,
                    });
                }
                _ => {}
            }
        }
        self.draw_call_id += 1;
        Ok(())
    }

    /// Interface elements drawn straight to the screen.
    fn draw_gui(&mut self, call: &DrawCall) -> Result<(), DecodeError> {
        let Some(offset) = corner_offset(call.primitive) else {
            debug!("GUI drawn as a triangle fan");
            return Ok(());
        };
        let Some(texture) = self.state.texture(call.source).copied() else {
            return Ok(());
        };
        let (tw, th) = (texture.width as f32, texture.height as f32);
        let stamp = self.stamp(call);
        let view = vertices(&self.state, call)?;
        let quads = read_quads(&view, call, offset)?;

        for mut quad in quads {
            if quad.bottom_right.x < quad.top_left.x {
                std::mem::swap(&mut quad.top_left, &mut quad.bottom_right);
            }
            let (tl, br) = (&quad.top_left, &quad.bottom_right);
            let x = (tl.tex_x * tw).min(br.tex_x * tw) as u32;
            let y = (tl.tex_y * th).min(br.tex_y * th) as u32;

            let content = match self.cache.find_containing(call.source, x, y) {
                Some(tile) if !tile.is_invalid() => tile.content,
                _ => {
                    let width = (((tl.tex_x - br.tex_x).abs() * tw) as u32).saturating_mul(2);
                    let height = (((tl.tex_y - br.tex_y).abs() * th) as u32).saturating_mul(2);
                    let nearby = self.cache.describe_area(
                        call.source,
                        x.saturating_sub(width / 2),
                        y.saturating_sub(height / 2),
                        width,
                        height,
                    );
                    return Err(DecodeError::UnresolvedGuiTile {
                        surface: call.source,
                        x,
                        y,
                        nearby,
                    });
                }
            };

            let rect = quad.rect();
            match content {
                TileContent::SpriteObjectPairings(pairings) => {
                    self.frame.gui_sprite_draws.push(SpriteDraw {
                        info: stamp.info(quad.order),
                        rect,
                        pairings,
                    });
                }
                TileContent::GraphicsResourceName(name) => {
                    self.frame.gui_draws.push(GuiDraw {
                        info: stamp.info(quad.order),
                        rect,
                        name,
                    });
                }
                TileContent::Number(number) => {
                    self.frame.number_draws.push(NumberDraw {
                        info: stamp.info(quad.order),
                        rect,
                        number,
                    });
                }
                TileContent::Blank => {}
                other => {
                    return Err(DecodeError::UnexpectedTile {
                        expected: "GUI element",
                        found: other.kind_name(),
                    });
                }
            }
        }
        self.draw_call_id += 1;
        Ok(())
    }

    /// The world view composited onto the screen.
    fn draw_unshaded_view(&mut self, call: &DrawCall) -> Result<(), DecodeError> {
        if call.target != 0 {
            debug!(surface = call.target, "unshaded view drawn off-screen");
            return Ok(());
        }
        let transform = self.state.program(call.program).transform;
        let (half_w, half_h) = self.half_frame();
        let view = vertices(&self.state, call)?;
        let tl = view.textured(view.index(call.index_offset, 0)?)?;
        let br = view.textured(view.index(call.index_offset, 4)?)?;

        self.frame.view = Some(Rect::new(
            transform.to_screen(tl.x, tl.y, half_w, half_h),
            transform.to_screen(br.x, br.y, half_w, half_h),
        ));
        Ok(())
    }

    fn draw_minimap(&mut self, call: &DrawCall) -> Result<(), DecodeError> {
        if call.target != 0 {
            debug!(surface = call.target, "minimap drawn off-screen");
            return Ok(());
        }
        let stamp = self.stamp(call);
        let (half_w, half_h) = self.half_frame();
        let view = vertices(&self.state, call)?;
        let first = view.index(call.index_offset, 0)?;
        let tl = view.textured(first)?;
        let br = view.textured(view.index(call.index_offset, 3)?)?;
        let order = order_of(&view, call, first)?;

        let transform = &stamp.transform;
        self.frame.minimap_position = Some(position(&tl));
        self.frame.minimap_screen = Some(Rect::new(
            transform.to_screen(tl.x, tl.y, half_w, half_h),
            transform.to_screen(br.x, br.y, half_w, half_h),
        ));
        self.frame.has_minimap_moved = true;
        self.frame.minimap_draws.push(MiniMapDraw {
            info: stamp.info(order),
            rect: Rect::new(position(&tl), position(&br)),
            pixels: self.state.minimap_pixels(call.source),
        });
        self.draw_call_id += 1;
        Ok(())
    }
}
