//! drawscope-replay — entry point.
//!
//! ```text
//! drawscope-replay capture.bin             Decode with defaults
//! drawscope-replay --config <path>         Use custom config TOML
//! drawscope-replay --gen-config            Dump default config and exit
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drawscope_replay::replay::{load_database, read_capture};
use drawscope_replay::{Replay, ReplayConfig};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "drawscope-replay", about = "Decode recorded draw-command captures")]
struct Cli {
    /// Capture file (overrides config).
    input: Option<PathBuf>,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "drawscope-replay.toml")]
    config: PathBuf,

    /// Recognition database snapshot (overrides config).
    #[arg(short, long)]
    database: Option<String>,

    /// Dump unrecognized regions into this directory (overrides config).
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Write JSON lines here instead of stdout (overrides config).
    #[arg(short, long)]
    output: Option<String>,

    /// Also print frames without draws.
    #[arg(long)]
    include_empty: bool,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ReplayConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = ReplayConfig::load(&cli.config)?;
    if let Some(input) = cli.input {
        config.input.path = input;
    }
    if let Some(database) = cli.database {
        config.database.snapshot = database;
    }
    if let Some(dir) = cli.dump_dir {
        config.diagnostics.dump_failures = true;
        config.diagnostics.dump_dir = dir;
    }
    if let Some(output) = cli.output {
        config.output.path = output;
    }
    config.output.include_empty |= cli.include_empty;

    // Frames go to stdout; logs go to stderr.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("drawscope-replay v{}", env!("CARGO_PKG_VERSION"));

    let db = load_database(config.snapshot())?;
    let capture = read_capture(&config.input.path, config.is_compressed())?;
    info!(
        "read {} bytes from {}",
        capture.len(),
        config.input.path.display()
    );

    let mut out: Box<dyn Write> = if config.output.path.is_empty() {
        Box::new(BufWriter::new(std::io::stdout().lock()))
    } else {
        Box::new(BufWriter::new(File::create(&config.output.path)?))
    };

    let mut replay = Replay::new(db, &config);
    let summary = replay.run(&capture, &mut out)?;
    info!(
        "decoded {} cycles: {} frames written, {} draws, {} recognition failures",
        summary.cycles, summary.frames_written, summary.draws, summary.recognition_failures
    );
    Ok(())
}
