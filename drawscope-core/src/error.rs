//! Fatal error types for the draw-command decoder.
//!
//! Every fallible decode step returns `Result<T, DecodeError>`. A
//! `DecodeError` aborts the current capture cycle. Recoverable outcomes
//! (an unrecognized sprite region, a glyph missing from the cache) are
//! ordinary values and never show up here.

use thiserror::Error;

/// The canonical fatal error of a decode call.
#[derive(Debug, Error)]
pub enum DecodeError {
    // ── Framing Errors ───────────────────────────────────────────
    /// Consumed bytes do not match the declared length of a cycle or segment.
    #[error("framing error in {context}: declared {declared} bytes, consumed {consumed}")]
    Framing {
        context: &'static str,
        declared: usize,
        consumed: usize,
    },

    /// A record needs more bytes than remain in its enclosing range.
    #[error("truncated {context}: need {needed} bytes, {available} available")]
    Truncated {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u64 },

    // ── Transport Limits ─────────────────────────────────────────
    /// The shared transport reported more entries than it can hold.
    #[error("{what} count {count} exceeds transport capacity {capacity}")]
    CapacityExceeded {
        what: &'static str,
        count: usize,
        capacity: usize,
    },

    // ── Render State Errors ──────────────────────────────────────
    /// Attribute 0 was bound with a stride that maps to no vertex layout.
    #[error("vertex buffer {buffer}: unknown attribute stride {stride}")]
    UnknownStride { buffer: u32, stride: u16 },

    /// A vertex, index or order record lies outside its buffer.
    #[error("vertex buffer {buffer}: {what} at byte {offset} exceeds length {len}")]
    OutOfBounds {
        buffer: u32,
        what: &'static str,
        offset: usize,
        len: usize,
    },

    /// A draw needed a vertex attribute binding that was never set.
    #[error("vertex buffer {buffer}: attribute {index} is not bound")]
    MissingAttribute { buffer: u32, index: u8 },

    // ── Recognition Errors ───────────────────────────────────────
    /// A GUI draw referenced a tile-surface region that was never recognized.
    #[error("unresolved GUI tile on surface {surface} at {x}x{y}\n{nearby}")]
    UnresolvedGuiTile {
        surface: u32,
        x: u32,
        y: u32,
        nearby: String,
    },

    /// A cached tile had a different kind than the draw structurally requires.
    #[error("unexpected {found} tile where {expected} was required")]
    UnexpectedTile {
        expected: &'static str,
        found: &'static str,
    },

    /// The recognition database produced contradictory results for a region.
    #[error("recognition database inconsistency: {0}")]
    Consistency(String),

    /// The stream broke an assumption about how the renderer behaves.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    // ── I/O and Serialization Errors ─────────────────────────────
    /// Reading a capture stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A database snapshot failed to (de)serialize, or a file path was not UTF-8.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<Box<bincode::ErrorKind>> for DecodeError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        DecodeError::Encoding(e.to_string())
    }
}
