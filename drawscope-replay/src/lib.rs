//! # drawscope-replay — offline capture decoder
//!
//! Reads a recorded capture (optionally zstd-compressed), splits it into
//! cycles, decodes every cycle against a recognition database snapshot
//! and prints the resulting frames as JSON lines.

pub mod config;
pub mod error;
pub mod replay;

pub use config::ReplayConfig;
pub use error::ReplayError;
pub use replay::{Replay, ReplaySummary};
