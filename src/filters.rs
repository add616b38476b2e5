//! Event filtering and fade animation.
//!
//! A filter pass compares each event against the current [`FilterState`] and
//! starts a fade-in or fade-out when its visibility flips. Opacity itself only
//! moves once per rendered frame, in [`advance_fade`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::QuakeViewError;
use crate::models::{EventRecord, ViewState, Visibility};

/// Lowest selectable magnitude.
pub const MIN_MAGNITUDE: f64 = 0.0;

/// Highest selectable magnitude.
pub const MAX_MAGNITUDE: f64 = 10.0;

/// Date window used until the user enters another one.
pub const DEFAULT_DATE_WINDOW_DAYS: f64 = 14.0;

/// Fully opaque.
pub const OPACITY_MAX: f64 = 100.0;

/// Fully transparent.
pub const OPACITY_MIN: f64 = 0.0;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Opacity change per frame while fading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeSpeed {
    /// Overshoots the full range in one frame
    #[default]
    Fast,
    /// Animated fade, 2 units per frame
    Slow,
}

impl FadeSpeed {
    /// Speed for the "fade effect" toggle.
    #[must_use]
    pub const fn from_fade_enabled(enabled: bool) -> Self {
        if enabled { Self::Slow } else { Self::Fast }
    }

    /// Opacity units per frame.
    #[must_use]
    pub const fn step(self) -> f64 {
        match self {
            Self::Fast => 100.0,
            Self::Slow => 2.0,
        }
    }
}

/// Absolute difference between two instants in fractional days.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    ((b - a).num_milliseconds() as f64 / MS_PER_DAY).abs()
}

/// Current filter parameters, as set by the controls.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub mag_filter_enabled: bool,
    pub date_filter_enabled: bool,
    min_mag: f64,
    max_mag: f64,
    pub target_date: DateTime<Utc>,
    date_window_days: f64,
}

impl FilterState {
    /// Both filters off, full magnitude range, default date window.
    #[must_use]
    pub fn new(target_date: DateTime<Utc>) -> Self {
        Self {
            mag_filter_enabled: false,
            date_filter_enabled: false,
            min_mag: MIN_MAGNITUDE,
            max_mag: MAX_MAGNITUDE,
            target_date,
            date_window_days: DEFAULT_DATE_WINDOW_DAYS,
        }
    }

    #[must_use]
    pub fn min_mag(&self) -> f64 {
        self.min_mag
    }

    #[must_use]
    pub fn max_mag(&self) -> f64 {
        self.max_mag
    }

    #[must_use]
    pub fn date_window_days(&self) -> f64 {
        self.date_window_days
    }

    /// Set the lower magnitude bound, raising the upper bound if needed.
    pub fn set_min_mag(&mut self, value: f64) {
        self.min_mag = value.clamp(MIN_MAGNITUDE, MAX_MAGNITUDE);
        if self.max_mag < self.min_mag {
            self.max_mag = self.min_mag;
        }
    }

    /// Set the upper magnitude bound, lowering the lower bound if needed.
    pub fn set_max_mag(&mut self, value: f64) {
        self.max_mag = value.clamp(MIN_MAGNITUDE, MAX_MAGNITUDE);
        if self.min_mag > self.max_mag {
            self.min_mag = self.max_mag;
        }
    }

    /// Set the date window from user text.
    ///
    /// # Errors
    ///
    /// Returns [`QuakeViewError::DateWindow`] if the text is not a positive,
    /// finite number. The previous window stays in effect.
    pub fn set_date_window(&mut self, input: &str) -> Result<f64, QuakeViewError> {
        let days = input
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| QuakeViewError::DateWindow(input.to_string()))?;
        self.date_window_days = days;
        Ok(days)
    }

    /// Check if an event passes every enabled filter.
    #[must_use]
    pub fn matches(&self, event: &EventRecord) -> bool {
        self.check_magnitude(event) && self.check_date(event)
    }

    fn check_magnitude(&self, event: &EventRecord) -> bool {
        !self.mag_filter_enabled
            || (event.magnitude >= self.min_mag && event.magnitude <= self.max_mag)
    }

    fn check_date(&self, event: &EventRecord) -> bool {
        !self.date_filter_enabled
            || days_between(event.time, self.target_date) <= self.date_window_days
    }
}

/// Visibility changes started by one filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterReport {
    pub faded_in: usize,
    pub faded_out: usize,
}

impl FilterReport {
    /// Whether the pass changed nothing.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.faded_in == 0 && self.faded_out == 0
    }
}

/// Run a filter pass over every event.
///
/// Only events whose visibility flips are touched, so repeating a pass with
/// the same parameters is a no-op.
pub fn apply_filters(events: &mut [EventRecord], filter: &FilterState) -> FilterReport {
    let mut report = FilterReport::default();

    for event in events.iter_mut() {
        let matches = filter.matches(event);
        let view = &mut event.view;

        match (view.visibility.is_visible(), matches) {
            (true, false) => {
                view.visibility = if view.opacity <= OPACITY_MIN {
                    Visibility::Hidden
                } else {
                    Visibility::FadingOut
                };
                report.faded_out += 1;
            }
            (false, true) => {
                view.visibility = if view.opacity >= OPACITY_MAX {
                    Visibility::Shown
                } else {
                    Visibility::FadingIn
                };
                report.faded_in += 1;
            }
            _ => {}
        }
    }

    report
}

/// Advance one event's fade by a frame.
///
/// A fade settles into its steady phase as soon as opacity reaches its bound.
pub fn advance_fade(view: &mut ViewState, speed: FadeSpeed) {
    match view.visibility {
        Visibility::FadingIn => {
            view.opacity += speed.step();
            if view.opacity >= OPACITY_MAX {
                view.opacity = OPACITY_MAX;
                view.visibility = Visibility::Shown;
            }
        }
        Visibility::FadingOut => {
            view.opacity -= speed.step();
            if view.opacity <= OPACITY_MIN {
                view.opacity = OPACITY_MIN;
                view.visibility = Visibility::Hidden;
            }
        }
        Visibility::Hidden | Visibility::Shown => {}
    }
}
