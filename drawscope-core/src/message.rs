//! Message records of a capture cycle.
//!
//! Every message starts with a one-byte [`MessageKind`] tag followed by a
//! fixed-size little-endian record. Pixel uploads, vertex buffer writes and
//! file-io events carry a trailing payload whose length follows from the
//! record. Uses `TryFrom` for all discriminants; no panics on unknown values.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::error::DecodeError;
use crate::flags::{AttribFlags, DepthFlags};
use crate::pixels::PixelFormat;

// ── MessageKind ──────────────────────────────────────────────────

/// The closed set of message tags understood by this protocol version.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    PixelData = 0x01,
    ScreenPixels = 0x02,
    CopyTexture = 0x03,
    TextureData = 0x04,
    VertexBufferWrite = 0x05,
    VertexAttribPointer = 0x06,
    DrawCall = 0x07,
    TransformMatrix = 0x08,
    Uniform4f = 0x09,
    FileIo = 0x0A,
}

impl TryFrom<u8> for MessageKind {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(MessageKind::PixelData),
            0x02 => Ok(MessageKind::ScreenPixels),
            0x03 => Ok(MessageKind::CopyTexture),
            0x04 => Ok(MessageKind::TextureData),
            0x05 => Ok(MessageKind::VertexBufferWrite),
            0x06 => Ok(MessageKind::VertexAttribPointer),
            0x07 => Ok(MessageKind::DrawCall),
            0x08 => Ok(MessageKind::TransformMatrix),
            0x09 => Ok(MessageKind::Uniform4f),
            0x0A => Ok(MessageKind::FileIo),
            _ => Err(DecodeError::UnknownVariant {
                type_name: "MessageKind",
                value: value as u64,
            }),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ── Primitive / FileIoKind ───────────────────────────────────────

/// Primitive topology of a draw call.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Triangles = 0,
    TriangleStrip = 1,
    TriangleFan = 2,
}

impl TryFrom<u8> for Primitive {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Primitive::Triangles),
            1 => Ok(Primitive::TriangleStrip),
            2 => Ok(Primitive::TriangleFan),
            _ => Err(DecodeError::UnknownVariant {
                type_name: "Primitive",
                value: value as u64,
            }),
        }
    }
}

/// Direction of a hooked file access.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FileIoKind {
    Read = 0,
    Write = 1,
}

impl TryFrom<u8> for FileIoKind {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FileIoKind::Read),
            1 => Ok(FileIoKind::Write),
            _ => Err(DecodeError::UnknownVariant {
                type_name: "FileIoKind",
                value: value as u64,
            }),
        }
    }
}

// ── Records ──────────────────────────────────────────────────────

/// Pixel upload into a surface at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelData {
    pub target: u32,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub format: PixelFormat,
}

impl PixelData {
    pub const SIZE: usize = 13;

    /// Bytes of pixel payload following the record.
    pub fn payload_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Rectangle copy between two surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyTexture {
    pub source: u32,
    pub target: u32,
    pub src_x: u16,
    pub src_y: u16,
    pub dst_x: u16,
    pub dst_y: u16,
    pub width: u16,
    pub height: u16,
}

impl CopyTexture {
    pub const SIZE: usize = 20;
}

/// Surface (re)allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureData {
    pub surface: u32,
    pub width: u16,
    pub height: u16,
}

impl TextureData {
    pub const SIZE: usize = 8;
}

/// Vertex buffer upload; `len` payload bytes follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferWrite {
    pub buffer: u32,
    pub len: u32,
}

impl VertexBufferWrite {
    pub const SIZE: usize = 8;
}

/// Binding of one vertex attribute inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribPointer {
    pub buffer: u32,
    pub index: u8,
    pub stride: u16,
    pub offset: u32,
}

impl VertexAttribPointer {
    pub const SIZE: usize = 11;
}

/// One primitive-drawing instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub buffer: u32,
    pub source: u32,
    pub target: u32,
    pub program: u32,
    pub primitive: Primitive,
    pub index_count: u32,
    pub index_offset: u32,
    pub attribs: AttribFlags,
    pub depth: DepthFlags,
    pub blend_color: [u8; 4],
}

impl DrawCall {
    pub const SIZE: usize = 31;
}

/// Column-major 4×4 transform of a program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMatrix {
    pub program: u32,
    pub matrix: [f32; 16],
}

impl TransformMatrix {
    pub const SIZE: usize = 68;
}

/// A four-float uniform written to a program slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform4f {
    pub program: u32,
    pub slot: u32,
    pub values: [f32; 4],
}

impl Uniform4f {
    pub const SIZE: usize = 24;
}

/// Hooked file access; `path_len` UTF-8 bytes follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIo {
    pub kind: FileIoKind,
    pub path_len: u32,
}

impl FileIo {
    pub const SIZE: usize = 5;
}

// ── Message ──────────────────────────────────────────────────────

/// A decoded message borrowing its payload from the capture buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Message<'a> {
    PixelData { header: PixelData, pixels: &'a [u8] },
    ScreenPixels { header: PixelData, pixels: &'a [u8] },
    CopyTexture(CopyTexture),
    TextureData(TextureData),
    VertexBufferWrite { buffer: u32, data: &'a [u8] },
    VertexAttribPointer(VertexAttribPointer),
    DrawCall(DrawCall),
    TransformMatrix(TransformMatrix),
    Uniform4f(Uniform4f),
    FileIo { kind: FileIoKind, path: &'a [u8] },
}

fn ensure(src: &[u8], needed: usize, context: &'static str) -> Result<(), DecodeError> {
    if src.len() < needed {
        return Err(DecodeError::Truncated {
            context,
            needed,
            available: src.len(),
        });
    }
    Ok(())
}

fn take<'a>(
    src: &mut &'a [u8],
    len: usize,
    context: &'static str,
) -> Result<&'a [u8], DecodeError> {
    ensure(src, len, context)?;
    let (head, rest) = src.split_at(len);
    *src = rest;
    Ok(head)
}

fn get_f32s<const N: usize>(src: &mut &[u8]) -> [f32; N] {
    let mut out = [0f32; N];
    for v in out.iter_mut() {
        *v = src.get_f32_le();
    }
    out
}

fn decode_pixel_data(src: &mut &[u8]) -> Result<PixelData, DecodeError> {
    ensure(src, PixelData::SIZE, "pixel data")?;
    Ok(PixelData {
        target: src.get_u32_le(),
        x: src.get_u16_le(),
        y: src.get_u16_le(),
        width: src.get_u16_le(),
        height: src.get_u16_le(),
        format: PixelFormat::try_from(src.get_u8())?,
    })
}

impl<'a> Message<'a> {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::PixelData { .. } => MessageKind::PixelData,
            Message::ScreenPixels { .. } => MessageKind::ScreenPixels,
            Message::CopyTexture(_) => MessageKind::CopyTexture,
            Message::TextureData(_) => MessageKind::TextureData,
            Message::VertexBufferWrite { .. } => MessageKind::VertexBufferWrite,
            Message::VertexAttribPointer(_) => MessageKind::VertexAttribPointer,
            Message::DrawCall(_) => MessageKind::DrawCall,
            Message::TransformMatrix(_) => MessageKind::TransformMatrix,
            Message::Uniform4f(_) => MessageKind::Uniform4f,
            Message::FileIo { .. } => MessageKind::FileIo,
        }
    }

    /// Decodes the next message and advances `src` past it.
    ///
    /// A record or payload that would extend beyond `src` is reported as
    /// [`DecodeError::Truncated`]; `src` is left unspecified on error.
    pub fn decode(src: &mut &'a [u8]) -> Result<Self, DecodeError> {
        ensure(src, 1, "message tag")?;
        let kind = MessageKind::try_from(src.get_u8())?;

        let message = match kind {
            MessageKind::PixelData | MessageKind::ScreenPixels => {
                let header = decode_pixel_data(src)?;
                let pixels = take(src, header.payload_len(), "pixel payload")?;
                if kind == MessageKind::PixelData {
                    Message::PixelData { header, pixels }
                } else {
                    Message::ScreenPixels { header, pixels }
                }
            }
            MessageKind::CopyTexture => {
                ensure(src, CopyTexture::SIZE, "copy texture")?;
                Message::CopyTexture(CopyTexture {
                    source: src.get_u32_le(),
                    target: src.get_u32_le(),
                    src_x: src.get_u16_le(),
                    src_y: src.get_u16_le(),
                    dst_x: src.get_u16_le(),
                    dst_y: src.get_u16_le(),
                    width: src.get_u16_le(),
                    height: src.get_u16_le(),
                })
            }
            MessageKind::TextureData => {
                ensure(src, TextureData::SIZE, "texture data")?;
                Message::TextureData(TextureData {
                    surface: src.get_u32_le(),
                    width: src.get_u16_le(),
                    height: src.get_u16_le(),
                })
            }
            MessageKind::VertexBufferWrite => {
                ensure(src, VertexBufferWrite::SIZE, "vertex buffer write")?;
                let buffer = src.get_u32_le();
                let len = src.get_u32_le() as usize;
                let data = take(src, len, "vertex buffer payload")?;
                Message::VertexBufferWrite { buffer, data }
            }
            MessageKind::VertexAttribPointer => {
                ensure(src, VertexAttribPointer::SIZE, "vertex attrib pointer")?;
                Message::VertexAttribPointer(VertexAttribPointer {
                    buffer: src.get_u32_le(),
                    index: src.get_u8(),
                    stride: src.get_u16_le(),
                    offset: src.get_u32_le(),
                })
            }
            MessageKind::DrawCall => {
                ensure(src, DrawCall::SIZE, "draw call")?;
                let buffer = src.get_u32_le();
                let source = src.get_u32_le();
                let target = src.get_u32_le();
                let program = src.get_u32_le();
                let primitive = Primitive::try_from(src.get_u8())?;
                let index_count = src.get_u32_le();
                let index_offset = src.get_u32_le();
                let attribs = AttribFlags::from_bits_retain(src.get_u8());
                let depth = DepthFlags::from_bits_retain(src.get_u8());
                let mut blend_color = [0u8; 4];
                src.copy_to_slice(&mut blend_color);
                Message::DrawCall(DrawCall {
                    buffer,
                    source,
                    target,
                    program,
                    primitive,
                    index_count,
                    index_offset,
                    attribs,
                    depth,
                    blend_color,
                })
            }
            MessageKind::TransformMatrix => {
                ensure(src, TransformMatrix::SIZE, "transform matrix")?;
                let program = src.get_u32_le();
                Message::TransformMatrix(TransformMatrix {
                    program,
                    matrix: get_f32s::<16>(src),
                })
            }
            MessageKind::Uniform4f => {
                ensure(src, Uniform4f::SIZE, "uniform")?;
                let program = src.get_u32_le();
                let slot = src.get_u32_le();
                Message::Uniform4f(Uniform4f {
                    program,
                    slot,
                    values: get_f32s::<4>(src),
                })
            }
            MessageKind::FileIo => {
                ensure(src, FileIo::SIZE, "file io")?;
                let kind = FileIoKind::try_from(src.get_u8())?;
                let len = src.get_u32_le() as usize;
                let path = take(src, len, "file io path")?;
                Message::FileIo { kind, path }
            }
        };
        Ok(message)
    }

    /// Serialize the message (tag, record and payload).
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8(self.kind() as u8);
        match self {
            Message::PixelData { header, pixels } | Message::ScreenPixels { header, pixels } => {
                dst.put_u32_le(header.target);
                dst.put_u16_le(header.x);
                dst.put_u16_le(header.y);
                dst.put_u16_le(header.width);
                dst.put_u16_le(header.height);
                dst.put_u8(header.format as u8);
                dst.put_slice(pixels);
            }
            Message::CopyTexture(c) => {
                dst.put_u32_le(c.source);
                dst.put_u32_le(c.target);
                dst.put_u16_le(c.src_x);
                dst.put_u16_le(c.src_y);
                dst.put_u16_le(c.dst_x);
                dst.put_u16_le(c.dst_y);
                dst.put_u16_le(c.width);
                dst.put_u16_le(c.height);
            }
            Message::TextureData(t) => {
                dst.put_u32_le(t.surface);
                dst.put_u16_le(t.width);
                dst.put_u16_le(t.height);
            }
            Message::VertexBufferWrite { buffer, data } => {
                dst.put_u32_le(*buffer);
                dst.put_u32_le(data.len() as u32);
                dst.put_slice(data);
            }
            Message::VertexAttribPointer(a) => {
                dst.put_u32_le(a.buffer);
                dst.put_u8(a.index);
                dst.put_u16_le(a.stride);
                dst.put_u32_le(a.offset);
            }
            Message::DrawCall(d) => {
                dst.put_u32_le(d.buffer);
                dst.put_u32_le(d.source);
                dst.put_u32_le(d.target);
                dst.put_u32_le(d.program);
                dst.put_u8(d.primitive as u8);
                dst.put_u32_le(d.index_count);
                dst.put_u32_le(d.index_offset);
                dst.put_u8(d.attribs.bits());
                dst.put_u8(d.depth.bits());
                dst.put_slice(&d.blend_color);
            }
            Message::TransformMatrix(t) => {
                dst.put_u32_le(t.program);
                for v in t.matrix {
                    dst.put_f32_le(v);
                }
            }
            Message::Uniform4f(u) => {
                dst.put_u32_le(u.program);
                dst.put_u32_le(u.slot);
                for v in u.values {
                    dst.put_f32_le(v);
                }
            }
            Message::FileIo { kind, path } => {
                dst.put_u8(*kind as u8);
                dst.put_u32_le(path.len() as u32);
                dst.put_slice(path);
            }
        }
    }
}
