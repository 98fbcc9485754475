//! Bit sets carried by draw-call records.
//!
//! [`AttribFlags`] marks the enabled vertex attribute arrays and
//! [`DepthFlags`] the depth test/write state. Both are one byte on the wire.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Vertex attribute arrays enabled for a draw call (bit n = attribute n).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AttribFlags: u8 {
        /// Attribute 0: vertex position
        const POSITION = 1 << 0;
        const TEX_COORD = 1 << 1;
        /// Attribute 2: per-vertex z-order
        const ORDER = 1 << 2;
    }
}

bitflags! {
    /// Depth state captured with a draw call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DepthFlags: u8 {
        const TEST = 1 << 0;
        const WRITE = 1 << 1;
    }
}

impl DepthFlags {
    pub fn is_test_enabled(self) -> bool {
        self.contains(DepthFlags::TEST)
    }

    pub fn is_write_enabled(self) -> bool {
        self.contains(DepthFlags::WRITE)
    }
}
