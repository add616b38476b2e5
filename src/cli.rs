//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::Format;

/// Earthquake map viewer: replay interaction scripts against a catalog.
#[derive(Parser, Debug)]
#[command(name = "quakeview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive a view session from an NDJSON input script and print each output
    Replay(ReplayArgs),

    /// List the events a filter setting would show
    Inspect(InspectArgs),
}

/// Arguments for the `replay` command.
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Event catalog (JSON array, NDJSON, or USGS GeoJSON)
    #[arg(long, short = 'd')]
    pub data: PathBuf,

    /// Input script, one JSON input per line ("-" reads stdin)
    #[arg(long, short = 's', default_value = "-")]
    pub script: String,

    /// Canvas width in pixels
    #[arg(long, default_value = "1280", value_parser = parse_canvas_extent)]
    pub width: f64,

    /// Canvas height in pixels
    #[arg(long, default_value = "720", value_parser = parse_canvas_extent)]
    pub height: f64,

    /// Start with the slow fade effect enabled
    #[arg(long)]
    pub fade: bool,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `inspect` command.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Event catalog (JSON array, NDJSON, or USGS GeoJSON)
    #[arg(long, short = 'd')]
    pub data: PathBuf,

    /// Minimum magnitude (enables the magnitude filter)
    #[arg(long)]
    pub min_magnitude: Option<f64>,

    /// Maximum magnitude (enables the magnitude filter)
    #[arg(long)]
    pub max_magnitude: Option<f64>,

    /// Target date (YYYY-MM-DD or ISO8601, enables the date filter)
    #[arg(long, conflicts_with = "day")]
    pub date: Option<String>,

    /// Target as a slider position in days after the epoch (enables the date filter)
    #[arg(long)]
    pub day: Option<f64>,

    /// Days either side of the target date
    #[arg(long, default_value = "14")]
    pub window_days: String,

    /// Maximum number of events to show
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a canvas dimension: a finite, positive number of pixels.
fn parse_canvas_extent(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid canvas size: {s}"))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("canvas size must be a positive number of pixels, got {s}"));
    }
    Ok(value)
}
