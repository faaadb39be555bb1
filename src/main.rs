// src/main.rs - G-code smoothing filter
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use krusty_smoother::config::{self, Config};
use krusty_smoother::gcode::{GCodeProcessor, MoveAdjuster};

/// Rewrites the straight moves of a G-code file into jerk-limited,
/// dynamics-corrected segments.
#[derive(Parser, Debug)]
#[command(name = "krusty-smoother", version, about)]
struct Cli {
    /// Input G-code file (stdin if omitted)
    input: Option<PathBuf>,

    /// Path to a TOML config file (built-in defaults if omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log per-move details
    #[arg(short, long)]
    verbose: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    default_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout may carry the G-code.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(io::stderr)
        .init();

    if cli.default_config {
        print!("{}", toml::to_string(&Config::default())?);
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            config::load_config(path).map_err(|e| {
                tracing::error!("Failed to load config from '{}': {}", path, e);
                e
            })?
        }
        None => {
            tracing::info!("No configuration given, using defaults");
            Config::default()
        }
    };
    tracing::info!(
        "Max speed {} mm/s, accel {} mm/s², jerk {} mm/s³",
        config.motion.max_speed,
        config.motion.accel,
        config.motion.jerk
    );

    let input: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin().lock())),
    };
    let output: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut processor = GCodeProcessor::new(MoveAdjuster::new(config), output);
    if let Err(e) = processor.process(input) {
        tracing::error!("Aborting: {}", e);
        return Err(e.into());
    }
    processor.finish()?;
    tracing::info!("Done.");
    Ok(())
}
