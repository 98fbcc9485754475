//! Offline decoding of a recorded capture into JSON lines.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use bytes::BytesMut;
use drawscope_core::{CycleCodec, DecoderConfig, Frame, FrameDecoder, RecognitionDb};
use tokio_util::codec::Decoder;
use tracing::{debug, info};

use crate::config::ReplayConfig;
use crate::error::ReplayError;

/// Totals of one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub cycles: usize,
    pub frames_written: usize,
    pub draws: usize,
    pub recognition_failures: usize,
}

/// Read the whole capture, decompressing it when needed.
pub fn read_capture(path: &Path, compressed: bool) -> Result<Vec<u8>, ReplayError> {
    let file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    if compressed {
        zstd::stream::read::Decoder::new(file)?.read_to_end(&mut bytes)?;
    } else {
        std::io::BufReader::new(file).read_to_end(&mut bytes)?;
    }
    Ok(bytes)
}

/// The configured database snapshot, or an empty database.
pub fn load_database(path: Option<&Path>) -> Result<RecognitionDb, ReplayError> {
    match path {
        Some(path) => {
            let db = RecognitionDb::from_bytes(&std::fs::read(path)?)?;
            info!(
                "loaded database {}: {} glyphs, {} resources",
                path.display(),
                db.glyphs.len(),
                db.graphics_resources.len()
            );
            Ok(db)
        }
        None => Ok(RecognitionDb::new()),
    }
}

/// Decodes a capture stream cycle by cycle.
pub struct Replay {
    decoder: FrameDecoder,
    include_empty: bool,
    summary: ReplaySummary,
}

impl Replay {
    pub fn new(db: RecognitionDb, config: &ReplayConfig) -> Self {
        let decoder = FrameDecoder::new(
            Arc::new(db),
            DecoderConfig {
                failure_dump_dir: config.dump_dir(),
            },
        );
        Self {
            decoder,
            include_empty: config.output.include_empty,
            summary: ReplaySummary::default(),
        }
    }

    pub fn summary(&self) -> ReplaySummary {
        self.summary
    }

    /// Split `capture` into cycles and write one JSON line per frame.
    pub fn run(&mut self, capture: &[u8], out: &mut impl Write) -> Result<ReplaySummary, ReplayError> {
        let mut codec = CycleCodec::default();
        let mut buf = BytesMut::from(capture);
        while let Some(cycle) = codec.decode_eof(&mut buf)? {
            let index = self.summary.cycles;
            let frame = self
                .decoder
                .decode_cycle(&cycle)
                .map_err(|source| ReplayError::Cycle { index, source })?;
            self.summary.cycles += 1;
            self.emit(&frame, out)?;
        }
        out.flush()?;
        Ok(self.summary)
    }

    fn emit(&mut self, frame: &Frame, out: &mut impl Write) -> Result<(), ReplayError> {
        let draws = frame.draw_count();
        self.summary.draws += draws;
        self.summary.recognition_failures += frame.recognition_failures.len();
        if draws == 0 && !self.include_empty {
            debug!(cycle = self.summary.cycles, "frame without draws skipped");
            return Ok(());
        }
        serde_json::to_writer(&mut *out, frame)?;
        out.write_all(b"\n")?;
        self.summary.frames_written += 1;
        Ok(())
    }
}
