//! Bounds-checked reads of vertex records, indices and z-orders.

use crate::error::DecodeError;
use crate::frame::Color;
use crate::render::state::{VertexBuffer, VertexLayout};

/// Position and texture coordinate of a textured vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedVertex {
    pub x: f32,
    pub y: f32,
    pub tex_x: f32,
    pub tex_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredVertex {
    pub x: f32,
    pub y: f32,
    pub color: Color,
}

/// Read-only view over one vertex buffer.
pub struct VertexView<'a> {
    id: u32,
    buffer: &'a VertexBuffer,
}

impl<'a> VertexView<'a> {
    pub fn new(id: u32, buffer: &'a VertexBuffer) -> Self {
        Self { id, buffer }
    }

    pub fn layout(&self) -> Option<VertexLayout> {
        self.buffer.layout
    }

    fn bytes(&self, offset: usize, len: usize, what: &'static str) -> Result<&'a [u8], DecodeError> {
        let data = &self.buffer.data;
        offset
            .checked_add(len)
            .and_then(|end| data.get(offset..end))
            .ok_or(DecodeError::OutOfBounds {
                buffer: self.id,
                what,
                offset,
                len: data.len(),
            })
    }

    fn f32_at(&self, offset: usize, what: &'static str) -> Result<f32, DecodeError> {
        let b = self.bytes(offset, 4, what)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn attrib_offset(&self, index: u8) -> Result<usize, DecodeError> {
        self.buffer
            .attrib(index)
            .map(|a| a.offset as usize)
            .ok_or(DecodeError::MissingAttribute {
                buffer: self.id,
                index,
            })
    }

    /// The `i`-th u16 index of a draw starting at byte `index_offset`.
    pub fn index(&self, index_offset: u32, i: usize) -> Result<u16, DecodeError> {
        let b = self.bytes(index_offset as usize + i * 2, 2, "index")?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn textured(&self, vertex: u16) -> Result<TexturedVertex, DecodeError> {
        let v = vertex as usize;
        match self.buffer.layout {
            Some(VertexLayout::Textured) => {
                let base = self.attrib_offset(0)? + v * VertexLayout::Textured.stride();
                Ok(TexturedVertex {
                    x: self.f32_at(base, "textured vertex")?,
                    y: self.f32_at(base + 4, "textured vertex")?,
                    tex_x: self.f32_at(base + 8, "textured vertex")?,
                    tex_y: self.f32_at(base + 12, "textured vertex")?,
                })
            }
            Some(VertexLayout::TexturedUnordered) => {
                let pos = v * VertexLayout::TexturedUnordered.stride();
                let tex = self.attrib_offset(1)? + pos;
                Ok(TexturedVertex {
                    x: self.f32_at(pos, "vertex position")?,
                    y: self.f32_at(pos + 4, "vertex position")?,
                    tex_x: self.f32_at(tex, "texture coordinate")?,
                    tex_y: self.f32_at(tex + 4, "texture coordinate")?,
                })
            }
            _ => Err(DecodeError::ProtocolViolation(
                "textured draw from a buffer without a textured layout",
            )),
        }
    }

    pub fn colored(&self, vertex: u16) -> Result<ColoredVertex, DecodeError> {
        let base = self.attrib_offset(0)? + vertex as usize * VertexLayout::Colored.stride();
        let rgba = self.bytes(base + 8, 4, "colored vertex")?;
        Ok(ColoredVertex {
            x: self.f32_at(base, "colored vertex")?,
            y: self.f32_at(base + 4, "colored vertex")?,
            color: Color::new(rgba[0], rgba[1], rgba[2], rgba[3]),
        })
    }

    /// Z-order of `vertex`, or `None` when attribute 2 is not bound.
    pub fn order(&self, vertex: u16) -> Result<Option<f32>, DecodeError> {
        match self.buffer.attrib(2) {
            Some(binding) => {
                let offset = binding.offset as usize + vertex as usize * 4;
                self.f32_at(offset, "order").map(Some)
            }
            None => Ok(None),
        }
    }
}
