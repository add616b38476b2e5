//! View session: the single owner of all interactive state.
//!
//! The UI shell feeds pointer events, control changes and frame ticks into a
//! [`Session`] one at a time. Each input is applied completely, including any
//! filter pass it triggers, before the next one is looked at, so the fade
//! state drawn by a frame always matches the filter state that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::QuakeViewError;
use crate::filters::{FadeSpeed, FilterReport, FilterState, apply_filters};
use crate::projection::{CENTER_LAT, CENTER_LON, MapProjection};
use crate::render::{Frame, render_frame};
use crate::selection::{Selection, SelectionChange};
use crate::store::EventStore;
use crate::timeline::{ANIMATION_STEP_DAYS, PlayState, SLIDER_MAX_DAYS, Timeline, default_epoch};
use crate::viewport::{CANVAS_HEIGHT, CANVAS_WIDTH, Viewport};

/// Fixed session parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub center_lat: f64,
    pub center_lon: f64,
    /// Day zero of the date slider
    pub epoch: DateTime<Utc>,
    pub slider_max_days: f64,
    pub animation_step_days: f64,
    /// Start with the slow fade effect enabled
    pub fade_enabled: bool,
}

impl SessionConfig {
    /// Projection matching the configured map center.
    #[must_use]
    pub fn projection(&self) -> MapProjection {
        MapProjection::centered_on(self.center_lat, self.center_lon)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            center_lat: CENTER_LAT,
            center_lon: CENTER_LON,
            epoch: default_epoch(),
            slider_max_days: SLIDER_MAX_DAYS,
            animation_step_days: ANIMATION_STEP_DAYS,
            fade_enabled: false,
        }
    }
}

/// A control widget change from the UI shell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "control", content = "value", rename_all = "snake_case")]
pub enum Control {
    MagFilter(bool),
    DateFilter(bool),
    MinMag(f64),
    MaxMag(f64),
    /// Raw text from the date window box
    DateWindow(String),
    /// Slider position in days after the epoch
    DateSlider(f64),
    Fade(bool),
    /// Play/stop button
    Animate,
}

/// One scripted input, decoded from a line of NDJSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionInput {
    Press { x: f64, y: f64 },
    Drag { x: f64, y: f64 },
    Release { x: f64, y: f64 },
    Wheel { x: f64, y: f64, delta: f64 },
    Key { key: char },
    Control(Control),
    Frames { count: u64 },
}

impl SessionInput {
    /// Decode a script line. Blank lines and `#` comments yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`QuakeViewError::Script`] if the line is not a valid input.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Self>, QuakeViewError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        serde_json::from_str(line)
            .map(Some)
            .map_err(|source| QuakeViewError::Script { line: line_no, source })
    }
}

/// Values the UI shell redisplays after a control change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readout {
    pub target_date: String,
    pub min_mag: f64,
    pub max_mag: f64,
    pub date_window_days: f64,
    pub mag_filter: bool,
    pub date_filter: bool,
    pub animation: PlayState,
    pub fade: FadeSpeed,
}

/// Something the session reports back to the shell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionOutput {
    Frame(Frame),
    Readout(Readout),
    Selection { change: SelectionChange },
}

/// Pointer gesture tracking for clean-click detection.
#[derive(Debug, Clone, Copy, Default)]
struct Gesture {
    pressed_inside: bool,
    dragged: bool,
}

/// Interactive view session over a loaded event store.
#[derive(Debug, Clone)]
pub struct Session {
    events: EventStore,
    filter: FilterState,
    viewport: Viewport,
    selection: Selection,
    timeline: Timeline,
    fade: FadeSpeed,
    gesture: Gesture,
    frame_index: u64,
}

impl Session {
    /// Start a session with default view state and run the first filter pass.
    #[must_use]
    pub fn new(events: EventStore, config: &SessionConfig) -> Self {
        let timeline = Timeline::new(
            config.epoch,
            config.slider_max_days,
            config.animation_step_days,
        );
        let mut session = Self {
            events,
            filter: FilterState::new(timeline.target_date()),
            viewport: Viewport::new(config.canvas_width, config.canvas_height),
            selection: Selection::new(),
            timeline,
            fade: FadeSpeed::from_fade_enabled(config.fade_enabled),
            gesture: Gesture::default(),
            frame_index: 0,
        };
        let report = session.refilter();
        info!(
            "session started with {} events ({} visible)",
            session.events.len(),
            report.faded_in
        );
        session
    }

    #[must_use]
    pub fn events(&self) -> &EventStore {
        &self.events
    }

    #[must_use]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Number of frames rendered so far.
    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frame_index
    }

    /// Current values for the control panel.
    #[must_use]
    pub fn readout(&self) -> Readout {
        Readout {
            target_date: self.filter.target_date.format("%B %-d, %Y").to_string(),
            min_mag: self.filter.min_mag(),
            max_mag: self.filter.max_mag(),
            date_window_days: self.filter.date_window_days(),
            mag_filter: self.filter.mag_filter_enabled,
            date_filter: self.filter.date_filter_enabled,
            animation: self.timeline.state(),
            fade: self.fade,
        }
    }

    /// Re-run the filter pass against the current parameters.
    pub fn refilter(&mut self) -> FilterReport {
        let report = apply_filters(self.events.records_mut(), &self.filter);
        if !report.is_empty() {
            debug!(
                "filter pass: {} fading in, {} fading out",
                report.faded_in, report.faded_out
            );
        }
        report
    }

    /// Apply a control change and re-filter.
    ///
    /// # Errors
    ///
    /// Returns [`QuakeViewError::DateWindow`] for a malformed date window;
    /// the previous window stays in effect.
    pub fn control(&mut self, control: Control) -> Result<Readout, QuakeViewError> {
        match control {
            Control::MagFilter(enabled) => self.filter.mag_filter_enabled = enabled,
            Control::DateFilter(enabled) => self.filter.date_filter_enabled = enabled,
            Control::MinMag(value) => self.filter.set_min_mag(value),
            Control::MaxMag(value) => self.filter.set_max_mag(value),
            Control::DateWindow(text) => {
                if let Err(e) = self.filter.set_date_window(&text) {
                    warn!("ignoring date window: {e}");
                    return Err(e);
                }
            }
            Control::DateSlider(days) => {
                self.timeline.set_position(days);
                self.filter.target_date = self.timeline.target_date();
            }
            Control::Fade(enabled) => self.fade = FadeSpeed::from_fade_enabled(enabled),
            Control::Animate => {
                self.timeline.toggle(&mut self.filter);
            }
        }
        self.refilter();
        Ok(self.readout())
    }

    /// Pointer pressed.
    pub fn press(&mut self, x: f64, y: f64) {
        self.gesture = Gesture {
            pressed_inside: self.viewport.begin_drag(x, y),
            dragged: false,
        };
    }

    /// Pointer moved while pressed. Any motion rules out a click.
    pub fn drag(&mut self, x: f64, y: f64) {
        self.gesture.dragged = true;
        self.viewport.drag(x, y);
    }

    /// Pointer released. A press and release on the canvas with no drag in
    /// between is a clean click and goes to hit-testing.
    pub fn release(&mut self, x: f64, y: f64) -> Option<SelectionChange> {
        let gesture = std::mem::take(&mut self.gesture);
        self.viewport.end_drag();
        if !gesture.pressed_inside || gesture.dragged {
            return None;
        }
        Some(
            self.selection
                .handle_click(x, y, &mut self.events, &self.viewport),
        )
    }

    /// Mouse wheel.
    pub fn wheel(&mut self, x: f64, y: f64, delta: f64) {
        self.viewport.wheel(x, y, delta);
    }

    /// Key press.
    pub fn key(&mut self, key: char) {
        self.viewport.key(key);
    }

    /// Render one frame.
    ///
    /// A playing timeline advances first and re-filters, then the display
    /// list is built with each event's fade advanced just before it is drawn.
    pub fn frame(&mut self) -> Frame {
        if self.timeline.advance() {
            self.filter.target_date = self.timeline.target_date();
            self.refilter();
        }
        let frame = render_frame(
            self.frame_index,
            &mut self.events,
            &self.viewport,
            &self.selection,
            self.fade,
        );
        self.frame_index += 1;
        frame
    }

    /// Apply one scripted input.
    ///
    /// # Errors
    ///
    /// Returns an error if a control value is rejected.
    pub fn handle(&mut self, input: SessionInput) -> Result<Vec<SessionOutput>, QuakeViewError> {
        let outputs = match input {
            SessionInput::Press { x, y } => {
                self.press(x, y);
                Vec::new()
            }
            SessionInput::Drag { x, y } => {
                self.drag(x, y);
                Vec::new()
            }
            SessionInput::Release { x, y } => self
                .release(x, y)
                .map(|change| SessionOutput::Selection { change })
                .into_iter()
                .collect(),
            SessionInput::Wheel { x, y, delta } => {
                self.wheel(x, y, delta);
                Vec::new()
            }
            SessionInput::Key { key } => {
                self.key(key);
                Vec::new()
            }
            SessionInput::Control(control) => vec![SessionOutput::Readout(self.control(control)?)],
            SessionInput::Frames { count } => {
                (0..count).map(|_| SessionOutput::Frame(self.frame())).collect()
            }
        };
        Ok(outputs)
    }
}
