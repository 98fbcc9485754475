//! Capture cycle header.
//!
//! ## Wire format (16 bytes, little-endian)
//!
//! ```text
//! total_len:        u32   cycle bytes including this header
//! width:            u16   screen width in pixels
//! height:           u16   screen height in pixels
//! pixel_data_count: u32   pixel uploads written by the producer
//! draw_call_count:  u32   draw calls written by the producer
//! ```

use bytes::{Buf, BufMut};

use crate::error::DecodeError;

pub const HEADER_LENGTH: usize = CycleHeader::SIZE;

/// Pixel uploads the shared transport can hold per cycle.
pub const PIXEL_DATA_CAPACITY: usize = 4096;

/// Draw calls the shared transport can hold per cycle.
pub const DRAW_CALL_CAPACITY: usize = 16384;

/// Per-cycle metadata preceding the message sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleHeader {
    pub total_len: u32,
    pub width: u16,
    pub height: u16,
    pub pixel_data_count: u32,
    pub draw_call_count: u32,
}

impl CycleHeader {
    /// Encoded size on the wire.
    pub const SIZE: usize = 16;

    pub fn new(width: u16, height: u16) -> Self {
        Self {
            total_len: Self::SIZE as u32,
            width,
            height,
            pixel_data_count: 0,
            draw_call_count: 0,
        }
    }

    /// Serialize to bytes (little-endian).
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        let mut dst = &mut buf[..];
        dst.put_u32_le(self.total_len);
        dst.put_u16_le(self.width);
        dst.put_u16_le(self.height);
        dst.put_u32_le(self.pixel_data_count);
        dst.put_u32_le(self.draw_call_count);
        buf
    }

    /// Deserialize from the start of `data`.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < Self::SIZE {
            return Err(DecodeError::Truncated {
                context: "cycle header",
                needed: Self::SIZE,
                available: data.len(),
            });
        }
        let mut src = &data[..Self::SIZE];
        let header = Self {
            total_len: src.get_u32_le(),
            width: src.get_u16_le(),
            height: src.get_u16_le(),
            pixel_data_count: src.get_u32_le(),
            draw_call_count: src.get_u32_le(),
        };
        if (header.total_len as usize) < Self::SIZE {
            return Err(DecodeError::Framing {
                context: "cycle header",
                declared: header.total_len as usize,
                consumed: Self::SIZE,
            });
        }
        Ok(header)
    }

    /// Fails when either producer counter exceeds the transport capacity.
    pub fn check_capacity(&self) -> Result<(), DecodeError> {
        check_capacity("pixel data", self.pixel_data_count as usize, PIXEL_DATA_CAPACITY)?;
        check_capacity("draw call", self.draw_call_count as usize, DRAW_CALL_CAPACITY)
    }
}

pub(crate) fn check_capacity(
    what: &'static str,
    count: usize,
    capacity: usize,
) -> Result<(), DecodeError> {
    if count > capacity {
        return Err(DecodeError::CapacityExceeded {
            what,
            count,
            capacity,
        });
    }
    Ok(())
}
