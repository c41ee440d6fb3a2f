//! Canvas sizing and resize coalescing.
//!
//! The capture canvas and the render canvas share one square-constrained,
//! horizontally centred rectangle. Window resize and orientation events come
//! in bursts, so they are coalesced by a trailing-edge [`Debouncer`] and the
//! rectangle is recomputed once per quiet period.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Quiet period after the last resize/orientation event before sizing is recomputed.
pub const RESIZE_QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Inner window dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Placement of the capture/render canvas, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportGeometry {
    pub width: f32,
    pub height: f32,
    pub top: f32,
    pub left: f32,
}

impl ViewportGeometry {
    #[inline]
    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// `width = min(w, h)`, `height = h`, `top = 0`, `left = (w - width) / 2`.
pub fn compute_sizing(window: WindowSize) -> ViewportGeometry {
    let height = window.height as f32;
    let window_width = window.width as f32;
    let width = window_width.min(height);
    ViewportGeometry {
        width,
        height,
        top: 0.0,
        left: (window_width - width) / 2.0,
    }
}

/// Trailing-edge debounce timer driven by caller-supplied timestamps.
#[derive(Clone, Debug)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the timer so it fires `quiet` after `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once per armed period, at the first poll at or
    /// past the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Owns the current canvas geometry and the resize debounce timer.
#[derive(Clone, Debug)]
pub struct ViewportManager {
    geometry: ViewportGeometry,
    latest_window: WindowSize,
    debouncer: Debouncer,
}

impl ViewportManager {
    pub fn new(window: WindowSize) -> Self {
        Self::with_quiet_period(window, RESIZE_QUIET_PERIOD)
    }

    pub fn with_quiet_period(window: WindowSize, quiet: Duration) -> Self {
        Self {
            geometry: compute_sizing(window),
            latest_window: window,
            debouncer: Debouncer::new(quiet),
        }
    }

    #[inline]
    pub fn geometry(&self) -> ViewportGeometry {
        self.geometry
    }

    /// A resize or orientation change was observed.
    pub fn notify(&mut self, now: Instant, window: WindowSize) {
        self.latest_window = window;
        self.debouncer.schedule(now);
    }

    /// Recompute sizing if the quiet period has elapsed.
    ///
    /// Returns the new geometry only when it differs from the current one.
    pub fn poll(&mut self, now: Instant) -> Option<ViewportGeometry> {
        if !self.debouncer.poll(now) {
            return None;
        }
        let geometry = compute_sizing(self.latest_window);
        if geometry == self.geometry {
            return None;
        }
        self.geometry = geometry;
        Some(geometry)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Drop any pending recompute.
    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }
}
