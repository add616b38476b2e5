//! Pan/zoom viewport over the base map.
//!
//! The map image is drawn centered on the canvas, translated by the pan
//! offset and then scaled. Scale only moves in doublings between 1 and 8, and
//! the offset is clamped so the scaled image always covers the whole canvas.
//! Out-of-range requests are silently ignored or clamped; nothing here fails.

use tracing::{debug, warn};

use crate::projection::Point;

/// Default canvas width in pixels.
pub const CANVAS_WIDTH: f64 = 1280.0;

/// Default canvas height in pixels.
pub const CANVAS_HEIGHT: f64 = 720.0;

/// Fully zoomed out: the map image exactly fits the canvas.
pub const MIN_SCALE: f64 = 1.0;

/// Fully zoomed in.
pub const MAX_SCALE: f64 = 8.0;

/// Largest offset magnitude along one axis that keeps the image covering
/// the canvas.
#[must_use]
pub fn offset_bound(half_extent: f64, scale: f64) -> f64 {
    half_extent * (scale - 1.0)
}

/// Clamp a candidate offset along one axis to
/// `[half - scale * half, scale * half - half]`.
#[must_use]
pub fn clamp_offset(candidate: f64, half_extent: f64, scale: f64) -> f64 {
    let bound = offset_bound(half_extent, scale);
    candidate.clamp(-bound, bound)
}

fn canvas_extent(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        warn!("invalid canvas extent {value}, using {fallback}");
        fallback
    }
}

/// Viewport state: zoom scale, pan offset and canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    width: f64,
    height: f64,
    /// Pointer minus offset at drag start
    grab: Option<Point>,
}

impl Viewport {
    /// Fully zoomed out, centered viewport over a canvas.
    ///
    /// A non-finite or non-positive dimension falls back to the default
    /// canvas size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            scale: MIN_SCALE,
            offset_x: 0.0,
            offset_y: 0.0,
            width: canvas_extent(width, CANVAS_WIDTH),
            height: canvas_extent(height, CANVAS_HEIGHT),
            grab: None,
        }
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Pan offset of the map center from the canvas center.
    #[must_use]
    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }

    #[must_use]
    pub fn canvas_center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Check if a screen point lies on the canvas (edges included).
    #[must_use]
    pub fn contains(&self, sx: f64, sy: f64) -> bool {
        (0.0..=self.width).contains(&sx) && (0.0..=self.height).contains(&sy)
    }

    /// Double the scale unless that would pass the maximum.
    pub fn zoom_in(&mut self) -> bool {
        if self.scale * 2.0 > MAX_SCALE {
            return false;
        }
        self.scale *= 2.0;
        debug!("zoomed in to {}x", self.scale);
        true
    }

    /// Halve the scale unless that would pass the minimum, then pull the
    /// offset back inside the smaller bounds.
    pub fn zoom_out(&mut self) -> bool {
        if self.scale * 0.5 < MIN_SCALE {
            return false;
        }
        self.scale *= 0.5;
        self.clamp_offsets();
        debug!("zoomed out to {}x", self.scale);
        true
    }

    /// Wheel zoom: negative delta zooms in, positive zooms out.
    ///
    /// Ignored when the pointer is off the canvas.
    pub fn wheel(&mut self, sx: f64, sy: f64, delta: f64) -> bool {
        if !self.contains(sx, sy) {
            return false;
        }
        if delta < 0.0 {
            self.zoom_in()
        } else if delta > 0.0 {
            self.zoom_out()
        } else {
            false
        }
    }

    /// Keyboard zoom: `w` in, `s` out, case-insensitive.
    pub fn key(&mut self, key: char) -> bool {
        match key.to_ascii_lowercase() {
            'w' => self.zoom_in(),
            's' => self.zoom_out(),
            _ => false,
        }
    }

    /// Start a drag if the pointer is on the canvas.
    pub fn begin_drag(&mut self, sx: f64, sy: f64) -> bool {
        if !self.contains(sx, sy) {
            self.grab = None;
            return false;
        }
        self.grab = Some(Point::new(sx - self.offset_x, sy - self.offset_y));
        true
    }

    /// Continue a drag. Returns whether the offset changed.
    pub fn drag(&mut self, sx: f64, sy: f64) -> bool {
        let Some(grab) = self.grab else {
            return false;
        };
        if self.scale <= MIN_SCALE {
            return false;
        }

        let before = self.offset();
        self.offset_x = clamp_offset(sx - grab.x, self.width / 2.0, self.scale);
        self.offset_y = clamp_offset(sy - grab.y, self.height / 2.0, self.scale);
        before != self.offset()
    }

    /// Release the drag grab.
    pub fn end_drag(&mut self) {
        self.grab = None;
    }

    /// Convert a screen point into content space.
    #[must_use]
    pub fn screen_to_content(&self, sx: f64, sy: f64) -> Point {
        let center = self.canvas_center();
        Point::new(
            (sx - center.x - self.offset_x) / self.scale,
            (sy - center.y - self.offset_y) / self.scale,
        )
    }

    /// Convert a content-space point onto the screen.
    #[must_use]
    pub fn content_to_screen(&self, p: Point) -> Point {
        let center = self.canvas_center();
        Point::new(
            p.x * self.scale + center.x + self.offset_x,
            p.y * self.scale + center.y + self.offset_y,
        )
    }

    fn clamp_offsets(&mut self) {
        self.offset_x = clamp_offset(self.offset_x, self.width / 2.0, self.scale);
        self.offset_y = clamp_offset(self.offset_y, self.height / 2.0, self.scale);
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}
