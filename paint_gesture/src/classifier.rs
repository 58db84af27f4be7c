//! Per-frame tool classification.
//!
//! Pinch strengths are noisy and continuous; this module turns them into one
//! discrete [`GestureState`] per frame.  Drawing uses a hysteresis band so a
//! pinch hovering near one cutoff does not flicker, and the open-palm eraser
//! must be held for a debounce interval before it engages.
//!
//! Priority, highest first: erase, surface paint (only when its ray hits),
//! draw, idle.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::config::PaintConfig;
use crate::fingertip::FingertipBinding;
use crate::pose::{Confidence, Finger, HandPoseSample};
use crate::surface::{LayerMask, Ray, SceneQuery};

// ════════════════════════════════════════════════════════════════════════════
// GestureState / EraserPolicy
// ════════════════════════════════════════════════════════════════════════════

/// Tool mode for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Drawing,
    Erasing,
    PaintingSurface,
}

impl GestureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureState::Idle => "idle",
            GestureState::Drawing => "drawing",
            GestureState::Erasing => "erasing",
            GestureState::PaintingSurface => "painting-surface",
        }
    }
}

/// How the eraser is engaged.  The two heuristics are alternatives, not
/// complements; pick one per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EraserPolicy {
    /// Right hand open (low mean pinch) with high confidence, held for
    /// `hold_duration` seconds.
    #[default]
    OpennessHold,
    /// Left thumb and pinky pinched together; engages immediately.
    DualPinch,
}

impl EraserPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EraserPolicy::OpennessHold => "openness-hold",
            EraserPolicy::DualPinch => "dual-pinch",
        }
    }
}

impl fmt::Display for EraserPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EraserPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openness-hold" | "openness" | "open-palm" => Ok(EraserPolicy::OpennessHold),
            "dual-pinch" | "pinch" => Ok(EraserPolicy::DualPinch),
            other => Err(format!("unknown eraser policy `{}` (openness-hold, dual-pinch)", other)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureClassifier
// ════════════════════════════════════════════════════════════════════════════

/// Thresholds the classifier reads every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub policy: EraserPolicy,
    pub pinch_start: f32,
    pub pinch_end: f32,
    pub paint_threshold: f32,
    pub open_threshold: f32,
    pub erase_threshold: f32,
    pub hold_duration: f32,
    pub ray_length: f32,
    pub paintable_mask: LayerMask,
}

impl From<&PaintConfig> for ClassifierSettings {
    fn from(cfg: &PaintConfig) -> Self {
        ClassifierSettings {
            policy: cfg.erase.policy,
            pinch_start: cfg.pinch.start,
            pinch_end: cfg.pinch.end,
            paint_threshold: cfg.pinch.paint,
            open_threshold: cfg.pinch.open,
            erase_threshold: cfg.pinch.erase,
            hold_duration: cfg.erase.hold_duration,
            ray_length: cfg.surface.ray_length,
            paintable_mask: cfg.surface.paintable_mask,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GestureClassifier {
    settings: ClassifierSettings,
    /// Seconds the open-palm condition has held without a break.
    open_hold: f32,
    /// Hysteresis latch: true while a stroke is in progress.
    drawing: bool,
    last: GestureState,
}

impl GestureClassifier {
    pub fn new(settings: ClassifierSettings) -> Self {
        GestureClassifier {
            settings,
            open_hold: 0.0,
            drawing: false,
            last: GestureState::Idle,
        }
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    pub fn policy(&self) -> EraserPolicy {
        self.settings.policy
    }

    /// Last classified state.
    pub fn state(&self) -> GestureState {
        self.last
    }

    /// Accumulated open-palm hold time (seconds).
    pub fn open_hold(&self) -> f32 {
        self.open_hold
    }

    /// Forget timers and latches (new session).
    pub fn reset(&mut self) {
        self.open_hold = 0.0;
        self.drawing = false;
        self.last = GestureState::Idle;
    }

    /// Classify one frame.  `dt` is the elapsed time since the previous
    /// frame in seconds.
    pub fn classify<Q: SceneQuery + ?Sized>(
        &mut self,
        left: Option<&HandPoseSample>,
        right: Option<&HandPoseSample>,
        tips: Option<FingertipBinding>,
        scene: &Q,
        dt: f32,
    ) -> GestureState {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let erasing = self.erase_condition(left, right, dt);

        let state = if erasing {
            GestureState::Erasing
        } else if self.surface_condition(right, tips, scene) {
            GestureState::PaintingSurface
        } else if self.draw_condition(right, tips) {
            GestureState::Drawing
        } else {
            GestureState::Idle
        };

        self.drawing = state == GestureState::Drawing;
        if state != self.last {
            debug!(from = self.last.as_str(), to = state.as_str(), "gesture transition");
        }
        self.last = state;
        state
    }

    /// The surface-paint ray from the bound middle fingertip, if any.
    pub fn paint_ray(&self, right: Option<&HandPoseSample>, tips: Option<FingertipBinding>) -> Option<Ray> {
        let joint = right?.joint(tips?.middle?)?;
        Ray::new(joint.position, joint.forward, self.settings.ray_length)
    }

    // ── conditions ───────────────────────────────────────────────────────

    fn erase_condition(
        &mut self,
        left: Option<&HandPoseSample>,
        right: Option<&HandPoseSample>,
        dt: f32,
    ) -> bool {
        match self.settings.policy {
            EraserPolicy::OpennessHold => {
                let open = right.is_some_and(|r| {
                    r.openness() > self.settings.open_threshold && r.confidence == Confidence::High
                });
                if open {
                    self.open_hold += dt;
                    self.open_hold > self.settings.hold_duration
                } else {
                    self.open_hold = 0.0;
                    false
                }
            }
            EraserPolicy::DualPinch => left.is_some_and(|l| {
                l.pinch(Finger::Thumb) > self.settings.erase_threshold
                    && l.pinch(Finger::Pinky) > self.settings.erase_threshold
            }),
        }
    }

    fn surface_condition<Q: SceneQuery + ?Sized>(
        &self,
        right: Option<&HandPoseSample>,
        tips: Option<FingertipBinding>,
        scene: &Q,
    ) -> bool {
        let Some(hand) = right else { return false };
        let gesture = hand.pinch(Finger::Thumb) > self.settings.paint_threshold
            && hand.pinch(Finger::Middle) > self.settings.paint_threshold;
        if !gesture {
            return false;
        }
        match self.paint_ray(right, tips) {
            Some(ray) => scene.raycast(&ray, self.settings.paintable_mask).is_some(),
            None => false,
        }
    }

    fn draw_condition(&self, right: Option<&HandPoseSample>, tips: Option<FingertipBinding>) -> bool {
        let (Some(hand), Some(_)) = (right, tips) else { return false };
        let pinch = hand.pinch(Finger::Index);
        if self.drawing {
            pinch > self.settings.pinch_end
        } else {
            pinch >= self.settings.pinch_start
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
