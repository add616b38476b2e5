//! Output formatters for events and session output.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use serde::Serialize;

use crate::models::{EventId, EventRecord, OutputEvent};
use crate::render::{DrawCommand, Frame};
use crate::selection::SelectionChange;
use crate::session::{Readout, SessionOutput};
use crate::timeline::PlayState;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Magnitude-based colors
const RED: &str = "\x1b[91m";      // Critical: mag >= 7.0
const YELLOW: &str = "\x1b[93m";   // Warning: mag >= 6.0
const CYAN: &str = "\x1b[96m";     // Significant: mag >= 4.5
const GREEN: &str = "\x1b[92m";    // Moderate: mag >= 3.0
const WHITE: &str = "\x1b[97m";    // Minor: mag < 3.0

const ICON_QUAKE: &str = "🌍";
const ICON_FRAME: &str = "▣";
const ICON_PLAY: &str = "▶";
const ICON_PAUSE: &str = "⏸";
const ICON_PIN: &str = "📍";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// Get the color code for a magnitude value.
fn magnitude_color(mag: f64) -> &'static str {
    match mag {
        m if m >= 7.0 => RED,
        m if m >= 6.0 => YELLOW,
        m if m >= 4.5 => CYAN,
        m if m >= 3.0 => GREEN,
        _ => WHITE,
    }
}

/// Get severity label for magnitude.
fn magnitude_label(mag: f64) -> &'static str {
    match mag {
        m if m >= 7.0 => "MAJOR",
        m if m >= 6.0 => "STRONG",
        m if m >= 4.5 => "MODERATE",
        m if m >= 3.0 => "LIGHT",
        m if m >= 2.0 => "MINOR",
        _ => "MICRO",
    }
}

/// Write items as a pretty JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write, T: Serialize>(writer: &mut W, items: &[T]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(items)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write items as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write, T: Serialize>(writer: &mut W, items: &[T]) -> io::Result<()> {
    for item in items {
        let json = serde_json::to_string(item)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write events in human-readable format with rich colors.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human_events<W: Write>(
    writer: &mut W,
    events: &[(EventId, &EventRecord)],
) -> io::Result<()> {
    for (id, event) in events {
        let time = event.time.format("%Y-%m-%d %H:%M:%S");
        let mag = event.magnitude;
        let color = magnitude_color(mag);
        let label = magnitude_label(mag);
        let place = if event.place.is_empty() {
            "Unknown location"
        } else {
            &event.place
        };

        writeln!(
            writer,
            "{ICON_QUAKE} {DIM}#{:<4}{RESET} {color}{BOLD}M{mag:.1}{RESET} │ \
             {color}{label:8}{RESET} │ \
             {DIM}{:>5.0}km{RESET} │ \
             {time} UTC │ \
             {place}",
            id.0, event.depth_km
        )?;
    }
    Ok(())
}

/// Write events in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_events<W: Write>(
    writer: &mut W,
    events: &[(EventId, &EventRecord)],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human_events(writer, events),
        Format::Json | Format::Ndjson => {
            let output: Vec<OutputEvent> = events.iter().map(|&e| OutputEvent::from(e)).collect();
            if format == Format::Json {
                write_json(writer, &output)
            } else {
                write_ndjson(writer, &output)
            }
        }
    }
}

fn write_human_frame<W: Write>(writer: &mut W, frame: &Frame) -> io::Result<()> {
    let mut scale = 1.0;
    let mut offset = (0.0, 0.0);
    let mut detail = None;

    for command in &frame.commands {
        match command {
            DrawCommand::Transform {
                translate_x,
                translate_y,
                scale: s,
            } => {
                scale = *s;
                offset = (*translate_x, *translate_y);
            }
            DrawCommand::DetailPanel { id, lines, .. } => detail = Some((*id, lines)),
            DrawCommand::MapImage { .. } | DrawCommand::Marker { .. } => {}
        }
    }

    let markers = frame.markers().count();
    let fading = frame
        .markers()
        .filter(|c| matches!(c, DrawCommand::Marker { color, .. } if color.a < 100))
        .count();

    write!(
        writer,
        "{DIM}{ICON_FRAME} frame {:>5}{RESET} │ {scale}x │ origin ({:.0}, {:.0}) │ \
         {BOLD}{markers}{RESET} markers",
        frame.index, offset.0, offset.1
    )?;
    if fading > 0 {
        write!(writer, " {DIM}({fading} fading){RESET}")?;
    }
    if let Some((id, lines)) = detail {
        let summary = lines.join(" · ");
        write!(writer, " │ {ICON_PIN} #{} {summary}", id.0)?;
    }
    writeln!(writer)
}

fn write_human_readout<W: Write>(writer: &mut W, readout: &Readout) -> io::Result<()> {
    let icon = match readout.animation {
        PlayState::Playing => ICON_PLAY,
        PlayState::Idle => ICON_PAUSE,
    };
    let on_off = |enabled: bool| if enabled { "on" } else { "off" };
    writeln!(
        writer,
        "{icon} {BOLD}{}{RESET} │ magnitude {:.1}–{:.1} ({}) │ ±{} days ({}) │ fade {:?}",
        readout.target_date,
        readout.min_mag,
        readout.max_mag,
        on_off(readout.mag_filter),
        readout.date_window_days,
        on_off(readout.date_filter),
        readout.fade,
    )
}

fn write_human_selection<W: Write>(writer: &mut W, change: SelectionChange) -> io::Result<()> {
    match change {
        SelectionChange::Selected(id) => writeln!(writer, "{ICON_PIN} selected #{}", id.0),
        SelectionChange::Cleared => writeln!(writer, "{DIM}{ICON_PIN} selection cleared{RESET}"),
        SelectionChange::Unchanged => Ok(()),
    }
}

/// Write session output in human-readable form.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human_outputs<W: Write>(writer: &mut W, outputs: &[SessionOutput]) -> io::Result<()> {
    for output in outputs {
        match output {
            SessionOutput::Frame(frame) => write_human_frame(writer, frame)?,
            SessionOutput::Readout(readout) => write_human_readout(writer, readout)?,
            SessionOutput::Selection { change } => write_human_selection(writer, *change)?,
        }
    }
    Ok(())
}

/// Write session output in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_outputs<W: Write>(
    writer: &mut W,
    outputs: &[SessionOutput],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human_outputs(writer, outputs),
        Format::Json => write_json(writer, outputs),
        Format::Ndjson => write_ndjson(writer, outputs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::MapProjection;
    use crate::session::{Session, SessionConfig};
    use crate::store::EventStore;

    fn session() -> Session {
        let json = include_str!("../tools/sample_events.json");
        let store = EventStore::parse(json, &MapProjection::default()).unwrap();
        Session::new(store, &SessionConfig::default())
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("human".parse::<Format>().unwrap(), Format::Human);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("NDJSON".parse::<Format>().unwrap(), Format::Ndjson);
        assert!("invalid".parse::<Format>().is_err());
    }

    #[test]
    fn test_ndjson_frame_shape() {
        let mut session = session();
        let outputs = vec![SessionOutput::Frame(session.frame())];
        let mut buf = Vec::new();
        write_outputs(&mut buf, &outputs, Format::Ndjson).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["type"], "frame");
        assert_eq!(value["index"], 0);
        assert_eq!(value["commands"][0]["op"], "transform");
        assert_eq!(value["commands"][1]["op"], "map_image");
        assert_eq!(value["commands"][2]["op"], "marker");
        assert_eq!(value["commands"][2]["color"]["a"], 100);
    }

    #[test]
    fn test_json_selection_and_readout() {
        let session = session();
        let outputs = vec![
            SessionOutput::Selection {
                change: SelectionChange::Selected(EventId(3)),
            },
            SessionOutput::Readout(session.readout()),
        ];
        let mut buf = Vec::new();
        write_outputs(&mut buf, &outputs, Format::Json).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["type"], "selection");
        assert_eq!(value[0]["change"]["change"], "selected");
        assert_eq!(value[0]["change"]["id"], 3);
        assert_eq!(value[1]["type"], "readout");
        assert_eq!(value[1]["target_date"], "January 2, 2017");
        assert_eq!(value[1]["animation"], "idle");
    }

    #[test]
    fn test_human_output() {
        let mut session = session();
        let outputs = vec![
            SessionOutput::Frame(session.frame()),
            SessionOutput::Readout(session.readout()),
        ];
        let mut buf = Vec::new();
        write_outputs(&mut buf, &outputs, Format::Human).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("5"));
        assert!(lines[0].contains("markers"));
        assert!(lines[1].contains("January 2, 2017"));
        assert!(lines[1].contains("0.0–10.0"));
    }

    #[test]
    fn test_event_listing() {
        let session = session();
        let events: Vec<_> = session.events().iter().collect();

        let mut buf = Vec::new();
        write_events(&mut buf, &events, Format::Human).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("Unknown location"));
        assert!(text.contains("MODERATE"));

        let mut buf = Vec::new();
        write_events(&mut buf, &events, Format::Ndjson).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["id"], 0);
        assert_eq!(first["visibility"], "fading_in");
        assert!(first["place"].is_string());
    }
}
