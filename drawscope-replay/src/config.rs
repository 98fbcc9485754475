//! Replay tool configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ReplayError;

/// Top-level configuration for the replay tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Recorded capture to decode.
    pub input: InputConfig,
    /// Recognition database snapshot.
    pub database: DatabaseConfig,
    /// Recognition failure dumps.
    pub diagnostics: DiagnosticsConfig,
    /// Where decoded frames go.
    pub output: OutputConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// How the capture file is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// zstd when the file name ends in `.zst`, raw otherwise.
    #[default]
    Auto,
    None,
    Zstd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Capture file: concatenated cycles.
    pub path: PathBuf,
    pub compression: Compression,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Bincode snapshot of a recognition database; empty means no database.
    pub snapshot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Write unrecognized regions as PNG.
    pub dump_failures: bool,
    pub dump_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON lines destination; empty means stdout.
    pub path: String,
    /// Also print frames without any classified draw.
    pub include_empty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("capture.bin"),
            compression: Compression::Auto,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            dump_failures: false,
            dump_dir: PathBuf::from("failures"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ReplayConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config at {}; using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> Result<(), ReplayError> {
        let text = toml::to_string_pretty(&Self::default())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Database snapshot path, if one is configured.
    pub fn snapshot(&self) -> Option<&Path> {
        (!self.database.snapshot.is_empty()).then(|| Path::new(&self.database.snapshot))
    }

    pub fn dump_dir(&self) -> Option<PathBuf> {
        self.diagnostics
            .dump_failures
            .then(|| self.diagnostics.dump_dir.clone())
    }

    /// Whether the input is zstd-compressed.
    pub fn is_compressed(&self) -> bool {
        match self.input.compression {
            Compression::Zstd => true,
            Compression::None => false,
            Compression::Auto => self
                .input
                .path
                .extension()
                .is_some_and(|ext| ext == "zst"),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
