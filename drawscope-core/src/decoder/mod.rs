//! Draw-command decoder.
//!
//! A [`FrameDecoder`] owns the mirrored render state and the tile cache and
//! turns each capture cycle into one [`Frame`]. The recognition database is
//! shared read-only, so several decoders may use the same one.

mod draw;
mod pixels;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::cache::TileCache;
use crate::diagnostics::FailureDumper;
use crate::error::DecodeError;
use crate::frame::{FileIoEvent, Frame};
use crate::header::{
    CycleHeader, DRAW_CALL_CAPACITY, HEADER_LENGTH, PIXEL_DATA_CAPACITY, check_capacity,
};
use crate::message::Message;
use crate::recognition::RecognitionDb;
use crate::render::RenderState;

/// Knobs of a [`FrameDecoder`].
#[derive(Debug, Clone, Default)]
pub struct DecoderConfig {
    /// Where unrecognized regions are written as PNG, if anywhere.
    pub failure_dump_dir: Option<PathBuf>,
}

pub struct FrameDecoder {
    db: Arc<RecognitionDb>,
    state: RenderState,
    cache: TileCache,
    dumper: FailureDumper,
    frame: Frame,
    draw_call_id: u32,
}

impl FrameDecoder {
    pub fn new(db: Arc<RecognitionDb>, config: DecoderConfig) -> Self {
        Self {
            db,
            state: RenderState::new(),
            cache: TileCache::new(),
            dumper: FailureDumper::new(config.failure_dump_dir),
            frame: Frame::default(),
            draw_call_id: 0,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Decode consecutive cycles covering `bytes` exactly.
    pub fn decode_segment(&mut self, bytes: &[u8]) -> Result<Vec<Frame>, DecodeError> {
        let mut frames = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let rest = &bytes[offset..];
            if rest.len() < HEADER_LENGTH {
                return Err(DecodeError::Framing {
                    context: "segment",
                    declared: offset + HEADER_LENGTH,
                    consumed: bytes.len(),
                });
            }
            let total = CycleHeader::decode(rest)?.total_len as usize;
            if total > rest.len() {
                return Err(DecodeError::Framing {
                    context: "segment",
                    declared: offset + total,
                    consumed: bytes.len(),
                });
            }
            frames.push(self.decode_cycle(&rest[..total])?);
            offset += total;
        }
        Ok(frames)
    }

    /// Decode one cycle; `bytes` must be exactly its declared length.
    ///
    /// Capacity counters are validated from the header before any message
    /// is applied. Render state and cache changes made before an error are
    /// kept.
    pub fn decode_cycle(&mut self, bytes: &[u8]) -> Result<Frame, DecodeError> {
        let header = CycleHeader::decode(bytes)?;
        let declared = header.total_len as usize;
        if declared != bytes.len() {
            return Err(DecodeError::Framing {
                context: "cycle",
                declared,
                consumed: bytes.len(),
            });
        }
        header.check_capacity()?;

        self.frame = Frame::new(header.width, header.height);
        self.draw_call_id = 0;

        let mut src = &bytes[HEADER_LENGTH..];
        let mut pixel_uploads = 0;
        let mut draw_calls = 0;
        while !src.is_empty() {
            // A message running past the cycle end is a framing error.
            let message = Message::decode(&mut src).map_err(|e| match e {
                DecodeError::Truncated {
                    needed, available, ..
                } => DecodeError::Framing {
                    context: "cycle",
                    declared,
                    consumed: declared + needed.saturating_sub(available),
                },
                other => other,
            })?;

            match &message {
                Message::PixelData { .. } | Message::ScreenPixels { .. } => {
                    pixel_uploads += 1;
                    check_capacity("pixel data", pixel_uploads, PIXEL_DATA_CAPACITY)?;
                }
                Message::DrawCall(_) => {
                    draw_calls += 1;
                    check_capacity("draw call", draw_calls, DRAW_CALL_CAPACITY)?;
                }
                _ => {}
            }
            self.apply(message)?;
        }

        Ok(std::mem::take(&mut self.frame))
    }

    fn apply(&mut self, message: Message<'_>) -> Result<(), DecodeError> {
        match message {
            Message::ScreenPixels { header, pixels } => self.on_screen_pixels(&header, pixels),
            Message::PixelData { header, pixels } => self.on_pixel_data(&header, pixels)?,
            Message::CopyTexture(copy) => self.on_copy_texture(&copy)?,
            Message::TextureData(data) => self.on_texture_data(&data),
            Message::VertexBufferWrite { buffer, data } => self.state.write_buffer(buffer, data),
            Message::VertexAttribPointer(attrib) => self.state.bind_attrib(&attrib)?,
            Message::DrawCall(call) => self.on_draw_call(&call)?,
            Message::TransformMatrix(t) => self.state.set_transform(t.program, t.matrix),
            Message::Uniform4f(u) => self.state.set_uniform(u.program, u.slot, u.values),
            Message::FileIo { kind, path } => {
                let path = std::str::from_utf8(path)
                    .map_err(|e| DecodeError::Encoding(format!("file i/o path: {e}")))?
                    .to_owned();
                debug!(?kind, %path, "file io");
                self.frame.file_io.push(FileIoEvent { kind, path });
            }
        }
        Ok(())
    }
}
