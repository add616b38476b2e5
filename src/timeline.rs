//! Date slider and timeline animation.
//!
//! The slider position counts days from a fixed epoch. While the animation
//! plays, the position moves forward half a day per frame; the fractional part
//! accumulates but the target date only moves in whole days.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::filters::FilterState;

/// Last slider position, in days after the epoch.
pub const SLIDER_MAX_DAYS: f64 = 729.0;

/// Slider movement per animated frame, in days.
pub const ANIMATION_STEP_DAYS: f64 = 0.5;

/// Day zero of the slider: 2017-01-02, the start of the dataset.
#[must_use]
pub fn default_epoch() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2017, 1, 2)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .unwrap_or_default()
}

/// Animation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    #[default]
    Idle,
    Playing,
}

/// Date slider with optional animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    epoch: DateTime<Utc>,
    position: f64,
    span_days: f64,
    step_days: f64,
    state: PlayState,
}

impl Timeline {
    #[must_use]
    pub fn new(epoch: DateTime<Utc>, span_days: f64, step_days: f64) -> Self {
        Self {
            epoch,
            position: 0.0,
            span_days,
            step_days,
            state: PlayState::Idle,
        }
    }

    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[must_use]
    pub fn state(&self) -> PlayState {
        self.state
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Move the slider, clamped to its range.
    pub fn set_position(&mut self, days: f64) {
        self.position = days.clamp(0.0, self.span_days);
    }

    /// Date currently targeted by the slider.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn target_date(&self) -> DateTime<Utc> {
        self.epoch + TimeDelta::days(self.position.trunc() as i64)
    }

    /// Start playing. The animation needs the date filter, so it is forced on.
    pub fn start(&mut self, filter: &mut FilterState) {
        filter.date_filter_enabled = true;
        self.state = PlayState::Playing;
        info!("timeline animation started at day {}", self.position);
    }

    pub fn stop(&mut self) {
        self.state = PlayState::Idle;
        debug!("timeline animation stopped at day {}", self.position);
    }

    /// Single play/stop control: starts when idle, stops when playing.
    pub fn toggle(&mut self, filter: &mut FilterState) -> PlayState {
        match self.state {
            PlayState::Idle => self.start(filter),
            PlayState::Playing => self.stop(),
        }
        self.state
    }

    /// Advance one frame. Returns whether the slider moved.
    ///
    /// Reaching the end of the slider stops the animation.
    pub fn advance(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.position = (self.position + self.step_days).min(self.span_days);
        if self.position >= self.span_days {
            info!("timeline animation reached the end");
            self.state = PlayState::Idle;
        }
        true
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(default_epoch(), SLIDER_MAX_DAYS, ANIMATION_STEP_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plays_to_end_then_stops() {
        let mut timeline = Timeline::default();
        let mut filter = FilterState::new(timeline.target_date());
        timeline.start(&mut filter);
        assert!(filter.date_filter_enabled);

        let mut frames = 0;
        while timeline.is_playing() {
            assert!(timeline.advance());
            frames += 1;
        }
        assert_eq!(frames, 1458);
        assert_eq!(timeline.state(), PlayState::Idle);
        assert!((timeline.position() - SLIDER_MAX_DAYS).abs() < f64::EPSILON);
        assert!(!timeline.advance());
        assert_eq!(
            timeline.target_date().format("%Y-%m-%d").to_string(),
            "2019-01-01"
        );
    }

    #[test]
    fn test_toggle_starts_and_stops() {
        let mut timeline = Timeline::default();
        let mut filter = FilterState::new(timeline.target_date());

        assert_eq!(timeline.toggle(&mut filter), PlayState::Playing);
        assert!(filter.date_filter_enabled);
        timeline.advance();

        filter.date_filter_enabled = false;
        assert_eq!(timeline.toggle(&mut filter), PlayState::Idle);
        assert!(!filter.date_filter_enabled);
        assert!((timeline.position() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fractional_steps_move_whole_days() {
        let mut timeline = Timeline::default();
        let mut filter = FilterState::new(timeline.target_date());
        timeline.start(&mut filter);

        timeline.advance();
        assert_eq!(timeline.target_date(), default_epoch());
        timeline.advance();
        assert_eq!(timeline.target_date(), default_epoch() + TimeDelta::days(1));
        timeline.advance();
        assert_eq!(timeline.target_date(), default_epoch() + TimeDelta::days(1));
    }

    #[test]
    fn test_set_position_clamps() {
        let mut timeline = Timeline::default();
        timeline.set_position(-4.0);
        assert!(timeline.position().abs() < f64::EPSILON);
        timeline.set_position(10_000.0);
        assert!((timeline.position() - SLIDER_MAX_DAYS).abs() < f64::EPSILON);
        timeline.set_position(3.0);
        assert_eq!(
            timeline.target_date().format("%Y-%m-%d").to_string(),
            "2017-01-05"
        );
    }

    #[test]
    fn test_starting_at_end_stops_on_next_frame() {
        let mut timeline = Timeline::default();
        let mut filter = FilterState::new(timeline.target_date());
        timeline.set_position(SLIDER_MAX_DAYS);
        timeline.start(&mut filter);
        assert!(timeline.advance());
        assert_eq!(timeline.state(), PlayState::Idle);
    }
}
