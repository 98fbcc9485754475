//! # drawscope-core
//!
//! Decoder for the draw-command stream of a hooked game renderer.
//!
//! This crate contains:
//! - **Wire protocol**: `CycleHeader`, `Message` records and the `CycleCodec`
//!   that splits a byte stream into capture cycles via `tokio_util`
//! - **Render state**: surfaces, vertex buffers and programs mirrored from the stream
//! - **Tile cache**: per-surface spatial index of recognition results
//! - **Recognition**: sequence trees, glyph matching and floating numbers
//! - **Decoder**: `FrameDecoder`, turning each cycle into a classified `Frame`
//! - **Error**: `DecodeError`, a typed `thiserror`-based error hierarchy

pub mod cache;
pub mod codec;
pub mod decoder;
pub mod diagnostics;
pub mod error;
pub mod flags;
pub mod frame;
pub mod header;
pub mod message;
pub mod pixels;
pub mod recognition;
pub mod render;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use cache::{Tile, TileCache, TileContent};
pub use codec::{CycleBuilder, CycleCodec};
pub use decoder::{DecoderConfig, FrameDecoder};
pub use diagnostics::FailureDumper;
pub use error::DecodeError;
pub use flags::{AttribFlags, DepthFlags};
pub use frame::Frame;
pub use header::{CycleHeader, DRAW_CALL_CAPACITY, HEADER_LENGTH, PIXEL_DATA_CAPACITY};
pub use message::{Message, MessageKind};
pub use pixels::{PixelFormat, RawImage};
pub use recognition::RecognitionDb;
pub use render::RenderState;
