//! QuakeView - interactive earthquake map view engine.
//!
//! Owns the state behind a regional earthquake map: magnitude and date
//! filters with fading markers, pan/zoom, click selection, and a timeline
//! that sweeps the date filter across the catalog. The CLI drives a session
//! from a scripted input stream and prints the resulting display lists.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};

mod cli;
mod errors;
mod filters;
mod models;
mod output;
mod projection;
mod render;
mod selection;
mod session;
mod store;
mod timeline;
mod viewport;

use cli::{Cli, Command};
use errors::QuakeViewError;
use filters::{FilterState, apply_filters};
use session::{Session, SessionConfig, SessionInput};
use store::EventStore;
use timeline::Timeline;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Replay(args) => cmd_replay(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the `replay` command - drive a session from an input script.
fn cmd_replay(args: cli::ReplayArgs) -> Result<()> {
    let config = SessionConfig {
        canvas_width: args.width,
        canvas_height: args.height,
        fade_enabled: args.fade,
        ..SessionConfig::default()
    };

    let store = EventStore::load(&args.data, &config.projection())
        .with_context(|| format!("failed to load events from {}", args.data.display()))?;
    if store.is_empty() {
        warn!("no events in {}", args.data.display());
    }
    if let Some((first, last)) = store.date_bounds() {
        info!(
            "catalog spans {} to {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        );
    }

    let reader: Box<dyn BufRead> = if args.script == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&args.script)
            .with_context(|| format!("failed to open script {}", args.script))?;
        Box::new(BufReader::new(file))
    };

    let mut session = Session::new(store, &config);
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let mut collected = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line.context("failed to read script")?;
        let Some(input) = SessionInput::parse_line(&line, i + 1)? else {
            continue;
        };

        let outputs = match session.handle(input) {
            Ok(outputs) => {
                log_selection(&session, &outputs);
                outputs
            }
            // Rejected control values leave the session unchanged
            Err(e @ QuakeViewError::DateWindow(_)) => {
                warn!("line {}: {e}", i + 1);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        // JSON output is a single array, so hold everything until the end
        if args.format == output::Format::Json {
            collected.extend(outputs);
        } else {
            output::write_outputs(&mut handle, &outputs, args.format)?;
            let _ = handle.flush();
        }
    }

    if args.format == output::Format::Json {
        output::write_outputs(&mut handle, &collected, args.format)?;
    }

    let visible = session.events().iter().filter(|(_, e)| e.is_visible()).count();
    info!(
        "replay finished after {} frames at day {}: {visible} visible, ±{} days, {}x zoom (selected: {:?})",
        session.frames_rendered(),
        session.timeline().position(),
        session.filter().date_window_days(),
        session.viewport().scale(),
        session.selection().active()
    );
    Ok(())
}

/// Log where a newly selected event sits on screen.
fn log_selection(session: &Session, outputs: &[session::SessionOutput]) {
    for output in outputs {
        if let session::SessionOutput::Selection {
            change: selection::SelectionChange::Selected(id),
        } = output
        {
            if let Some(event) = session.events().get(*id) {
                let p = session.viewport().content_to_screen(event.position);
                debug!("selected event {} at screen ({:.0}, {:.0})", id.0, p.x, p.y);
            }
        }
    }
}

/// Execute the `inspect` command - one filter pass over the catalog.
fn cmd_inspect(args: cli::InspectArgs) -> Result<()> {
    let config = SessionConfig::default();
    let mut store = EventStore::load(&args.data, &config.projection())
        .with_context(|| format!("failed to load events from {}", args.data.display()))?;

    let mut timeline = Timeline::new(
        config.epoch,
        config.slider_max_days,
        config.animation_step_days,
    );
    if let Some(day) = args.day {
        timeline.set_position(day);
    }

    let mut filter = FilterState::new(timeline.target_date());
    if let Some(date) = &args.date {
        filter.target_date = models::parse_timestamp(date)
            .with_context(|| format!("invalid target date: {date}"))?;
    }
    filter.date_filter_enabled = args.date.is_some() || args.day.is_some();
    filter
        .set_date_window(&args.window_days)
        .context("invalid --window-days")?;

    if let Some(min) = args.min_magnitude {
        filter.set_min_mag(min);
    }
    if let Some(max) = args.max_magnitude {
        filter.set_max_mag(max);
    }
    filter.mag_filter_enabled = args.min_magnitude.is_some() || args.max_magnitude.is_some();

    let report = apply_filters(store.records_mut(), &filter);
    info!(
        "{} of {} events pass the filters",
        report.faded_in,
        store.len()
    );

    let mut events: Vec<_> = store.iter().filter(|(_, e)| e.is_visible()).collect();
    if let Some(limit) = args.limit {
        events.truncate(limit);
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_events(&mut handle, &events, args.format)?;

    Ok(())
}
