//! PNG dumps of regions that failed recognition.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::warn;

use crate::pixels::{PixelFormat, to_rgba};

/// Writes `<dir>/<counter>_<x>x<y>_<w>x<h>.png` for every failed region.
#[derive(Debug, Default)]
pub struct FailureDumper {
    dir: Option<PathBuf>,
    counter: u64,
}

impl FailureDumper {
    /// A dumper that writes into `dir`, or does nothing when `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir, counter: 0 }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Dump a region; returns the written path.
    ///
    /// Write errors are logged and otherwise ignored.
    pub fn dump(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        pixels: &[u8],
        format: PixelFormat,
    ) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let path = dir.join(format!("{}_{x}x{y}_{width}x{height}.png", self.counter));
        self.counter += 1;

        let Some(image) = RgbaImage::from_raw(width as u32, height as u32, to_rgba(pixels, format))
        else {
            warn!("failure dump {} has a short pixel buffer", path.display());
            return None;
        };
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("cannot create dump directory {}: {e}", dir.display());
            return None;
        }
        match image.save(&path) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("cannot write failure dump {}: {e}", path.display());
                None
            }
        }
    }
}
