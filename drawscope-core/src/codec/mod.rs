//! Cycle framing for capture streams.
//!
//! [`CycleCodec`] splits a growing byte stream (a recorded capture file, a
//! copy of the shared buffer) into whole capture cycles using the
//! `total_len` field of each [`CycleHeader`]. [`CycleBuilder`] is the
//! producer side: it appends messages and patches the header counters.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::DecodeError;
use crate::header::{CycleHeader, HEADER_LENGTH};
use crate::message::Message;

/// Largest cycle the codec accepts before giving up on the stream.
pub const MAX_CYCLE_SIZE: usize = 256 * 1024 * 1024;

#[derive(Debug, Default)]
pub struct CycleCodec {}

impl tokio_util::codec::Decoder for CycleCodec {
    type Item = Bytes;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LENGTH {
            return Ok(None);
        }

        let header = CycleHeader::decode(&src[..HEADER_LENGTH])?;
        let total = header.total_len as usize;
        if total > MAX_CYCLE_SIZE {
            return Err(DecodeError::CapacityExceeded {
                what: "cycle byte",
                count: total,
                capacity: MAX_CYCLE_SIZE,
            });
        }
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        Ok(Some(src.split_to(total).freeze()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(cycle) => Ok(Some(cycle)),
            None if src.is_empty() => Ok(None),
            None => {
                let declared = if src.len() >= HEADER_LENGTH {
                    CycleHeader::decode(&src[..HEADER_LENGTH])?.total_len as usize
                } else {
                    HEADER_LENGTH
                };
                Err(DecodeError::Framing {
                    context: "stream tail",
                    declared,
                    consumed: src.len(),
                })
            }
        }
    }
}

impl tokio_util::codec::Encoder<Bytes> for CycleCodec {
    type Error = DecodeError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        CycleHeader::decode(&item)?;
        dst.extend_from_slice(&item);
        Ok(())
    }
}

// ── CycleBuilder ─────────────────────────────────────────────────

/// Assembles one capture cycle from messages.
pub struct CycleBuilder {
    header: CycleHeader,
    body: BytesMut,
}

impl CycleBuilder {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            header: CycleHeader::new(width, height),
            body: BytesMut::new(),
        }
    }

    /// Append a message, counting pixel uploads and draw calls.
    pub fn push(&mut self, message: &Message<'_>) -> &mut Self {
        match message {
            Message::PixelData { .. } | Message::ScreenPixels { .. } => {
                self.header.pixel_data_count += 1
            }
            Message::DrawCall(_) => self.header.draw_call_count += 1,
            _ => {}
        }
        message.encode(&mut self.body);
        self
    }

    /// Override the producer counters (to simulate a misbehaving hook).
    pub fn with_counters(&mut self, pixel_data_count: u32, draw_call_count: u32) -> &mut Self {
        self.header.pixel_data_count = pixel_data_count;
        self.header.draw_call_count = draw_call_count;
        self
    }

    /// Header followed by the body, with `total_len` filled in.
    pub fn finish(&self) -> Bytes {
        let mut header = self.header;
        header.total_len = (HEADER_LENGTH + self.body.len()) as u32;
        let mut out = BytesMut::with_capacity(header.total_len as usize);
        out.put_slice(&header.encode());
        out.put_slice(&self.body);
        out.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::TextureData;
    use tokio_util::codec::Decoder;

    fn cycle() -> Bytes {
        let mut builder = CycleBuilder::new(800, 600);
        builder.push(&Message::TextureData(TextureData {
            surface: 1,
            width: 4096,
            height: 4096,
        }));
        builder.finish()
    }

    #[test]
    fn splits_concatenated_cycles() {
        let one = cycle();
        let mut stream = BytesMut::new();
        stream.extend_from_slice(&one);
        stream.extend_from_slice(&one);
        stream.extend_from_slice(&one[..5]);

        let mut codec = CycleCodec::default();
        assert_eq!(codec.decode(&mut stream).unwrap().unwrap(), one);
        assert_eq!(codec.decode(&mut stream).unwrap().unwrap(), one);
        assert!(codec.decode(&mut stream).unwrap().is_none());
        assert!(codec.decode_eof(&mut stream).is_err());
    }

    #[test]
    fn builder_counts_messages() {
        let bytes = cycle();
        let header = CycleHeader::decode(&bytes).unwrap();
        assert_eq!(header.total_len as usize, bytes.len());
        assert_eq!(header.pixel_data_count, 0);
        assert_eq!(header.draw_call_count, 0);
    }
}
