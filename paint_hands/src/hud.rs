//! On-screen tool indicator.
//!
//! Shows the most recent [`HudEvent`] for a few seconds, then hides.  The
//! orchestrator already drops repeats, so every ping restarts the timer.

use paint_gesture::{HudEvent, HudSink};
use tracing::debug;

pub const DEFAULT_SHOW_SECONDS: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct HudOverlay {
    current: Option<HudEvent>,
    remaining: f32,
    show_seconds: f32,
    pings: usize,
}

impl Default for HudOverlay {
    fn default() -> Self {
        HudOverlay::new(DEFAULT_SHOW_SECONDS)
    }
}

impl HudOverlay {
    pub fn new(show_seconds: f32) -> Self {
        HudOverlay {
            current: None,
            remaining: 0.0,
            show_seconds: show_seconds.max(0.0),
            pings: 0,
        }
    }

    /// Count down the display timer.
    pub fn tick(&mut self, dt: f32) {
        if self.remaining > 0.0 {
            self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        }
    }

    /// The event on screen, if the timer hasn't run out.
    pub fn visible(&self) -> Option<&HudEvent> {
        if self.remaining > 0.0 {
            self.current.as_ref()
        } else {
            None
        }
    }

    /// Fraction of the display time left, 1.0 just after a ping.
    pub fn fade(&self) -> f32 {
        if self.show_seconds > 0.0 {
            (self.remaining / self.show_seconds).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Total events received.
    pub fn pings(&self) -> usize {
        self.pings
    }
}

impl HudSink for HudOverlay {
    fn ping(&mut self, event: &HudEvent) {
        debug!(tool = %event.tool, swatch = event.color.is_some(), "hud");
        self.current = Some(event.clone());
        self.remaining = self.show_seconds;
        self.pings += 1;
    }
}
