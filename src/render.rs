//! Per-frame display list.
//!
//! A frame is a flat list of draw commands in paint order. Commands after the
//! [`DrawCommand::Transform`] are in content space; a canvas backend applies
//! the translate then the scale and paints the rest as given.

use serde::Serialize;

use crate::filters::{FadeSpeed, advance_fade};
use crate::models::{EventId, EventRecord};
use crate::projection::Point;
use crate::selection::Selection;
use crate::store::EventStore;
use crate::viewport::Viewport;

/// Marker diameter per unit of magnitude, in screen pixels.
pub const MARKER_SIZE_FACTOR: f64 = 10.0;

/// Depth at which markers reach full red.
pub const DEPTH_COLOR_RANGE_KM: f64 = 15.0;

/// Detail panel size in screen pixels.
pub const DETAIL_WIDTH: f64 = 300.0;
pub const DETAIL_HEIGHT: f64 = 140.0;
pub const DETAIL_TEXT_SIZE: f64 = 14.0;
pub const DETAIL_PADDING: f64 = 4.0;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// One paint operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    /// Translate to the canvas center plus pan offset, then scale
    Transform {
        translate_x: f64,
        translate_y: f64,
        scale: f64,
    },
    /// Base map image centered on the content origin
    MapImage { width: f64, height: f64 },
    /// Filled circle for one event
    Marker {
        id: EventId,
        x: f64,
        y: f64,
        diameter: f64,
        color: Rgba,
    },
    /// Opaque detail panel for the selected event, painted last
    DetailPanel {
        id: EventId,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        padding: f64,
        text_size: f64,
        lines: Vec<String>,
    },
}

/// Display list for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub index: u64,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    /// Markers drawn this frame, in paint order.
    pub fn markers(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Marker { .. }))
    }
}

/// Marker fill: yellow-orange for shallow events, red at depth.
///
/// Opacity maps straight onto the alpha channel.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn marker_color(depth_km: f64, opacity: f64) -> Rgba {
    let green = 200.0 - depth_km / DEPTH_COLOR_RANGE_KM * 200.0;
    Rgba {
        r: 255,
        g: green.clamp(0.0, 255.0).round() as u8,
        b: 0,
        a: opacity.clamp(0.0, 255.0).round() as u8,
    }
}

/// Text lines shown in an event's detail panel.
#[must_use]
pub fn detail_lines(event: &EventRecord) -> Vec<String> {
    let mut lines = vec![
        event.time.format("%B %-d, %Y, %-I:%M:%S %p").to_string(),
        format!("Latitude: {}", event.latitude),
        format!("Longitude: {}", event.longitude),
        format!("Magnitude: {}", event.magnitude),
        format!("Depth: {}", event.depth_km),
    ];
    if !event.place.is_empty() {
        lines.push(format!("Place: {}", event.place));
    }
    lines
}

/// Viewport transform stage.
#[must_use]
pub fn transform_command(viewport: &Viewport) -> DrawCommand {
    let center = viewport.canvas_center();
    let offset = viewport.offset();
    DrawCommand::Transform {
        translate_x: center.x + offset.x,
        translate_y: center.y + offset.y,
        scale: viewport.scale(),
    }
}

/// Marker for an event, or `None` when it is fully filtered out.
#[must_use]
pub fn marker_command(id: EventId, event: &EventRecord, viewport: &Viewport) -> Option<DrawCommand> {
    let view = event.view();
    if !view.visibility.is_drawn() {
        return None;
    }
    Some(DrawCommand::Marker {
        id,
        x: event.position.x,
        y: event.position.y,
        diameter: event.magnitude * MARKER_SIZE_FACTOR / viewport.scale(),
        color: marker_color(event.depth_km, view.opacity),
    })
}

/// Detail panel anchored at an event. Sizes are divided by the scale so the
/// panel keeps its screen size at every zoom level.
#[must_use]
pub fn detail_command(id: EventId, event: &EventRecord, viewport: &Viewport) -> DrawCommand {
    let scale = viewport.scale();
    let Point { x, y } = event.position;
    DrawCommand::DetailPanel {
        id,
        x,
        y,
        width: DETAIL_WIDTH / scale,
        height: DETAIL_HEIGHT / scale,
        padding: DETAIL_PADDING / scale,
        text_size: DETAIL_TEXT_SIZE / scale,
        lines: detail_lines(event),
    }
}

/// Paint one frame: transform, map, every event in load order (advancing its
/// fade first), then the selected event's detail panel on top.
pub fn render_frame(
    index: u64,
    events: &mut EventStore,
    viewport: &Viewport,
    selection: &Selection,
    speed: FadeSpeed,
) -> Frame {
    let mut commands = Vec::with_capacity(events.len() + 3);
    commands.push(transform_command(viewport));
    commands.push(DrawCommand::MapImage {
        width: viewport.width(),
        height: viewport.height(),
    });

    for event in events.records_mut() {
        advance_fade(&mut event.view, speed);
    }
    commands.extend(
        events
            .iter()
            .filter_map(|(id, event)| marker_command(id, event, viewport)),
    );

    if let Some(id) = selection.open_detail(events) {
        if let Some(event) = events.get(id) {
            commands.push(detail_command(id, event, viewport));
        }
    }

    Frame { index, commands }
}
