//! Tunable parameters.
//!
//! Every section has defaults, so an empty TOML file (or none at all) gives
//! the stock behaviour.  Example:
//!
//! ```toml
//! [pinch]
//! start = 0.65
//! end   = 0.35
//!
//! [erase]
//! policy = "dual-pinch"
//! radius = 0.12
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::classifier::EraserPolicy;
use crate::error::ConfigError;
use crate::palette::Color;
use crate::surface::LayerMask;
use crate::voice::VoicePhrases;

// ════════════════════════════════════════════════════════════════════════════
// Sections
// ════════════════════════════════════════════════════════════════════════════

/// Pinch-strength thresholds, all in [0, 1].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PinchThresholds {
    /// Right index pinch that starts a stroke.
    pub start: f32,
    /// Right index pinch at or below which a stroke ends.  Must be < `start`.
    pub end: f32,
    /// Left thumb/index/middle gate for palette selection.
    pub palette: f32,
    /// Right thumb + middle pinch for surface painting.
    pub paint: f32,
    /// Right-hand openness above which the open-palm eraser arms.
    pub open: f32,
    /// Left thumb + pinky pinch for the dual-pinch eraser.
    pub erase: f32,
}

impl Default for PinchThresholds {
    fn default() -> Self {
        PinchThresholds {
            start: 0.6,
            end: 0.4,
            palette: 0.6,
            paint: 0.6,
            open: 0.6,
            erase: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EraseConfig {
    pub policy: EraserPolicy,
    /// Erase sphere radius around the right palm center (meters).
    pub radius: f32,
    /// Seconds the open palm must be held before erasing (openness-hold only).
    pub hold_duration: f32,
}

impl Default for EraseConfig {
    fn default() -> Self {
        EraseConfig {
            policy: EraserPolicy::OpennessHold,
            radius: 0.10,
            hold_duration: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StrokeConfig {
    /// Upper bound on appended points per second (floored at 30 Hz).
    pub max_point_hz: f32,
    /// Consecutive stored points are at least this far apart (meters).
    pub min_point_spacing: f32,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        StrokeConfig {
            max_point_hz: 90.0,
            min_point_spacing: 0.005,
        }
    }
}

impl StrokeConfig {
    /// Seconds between appended points.
    pub fn point_interval(&self) -> f32 {
        1.0 / self.max_point_hz.max(30.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Consecutive qualifying frames before the fingertip binding locks.
    pub settle_frames: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig { settle_frames: 12 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub thumb: Color,
    pub index: Color,
    pub middle: Color,
    /// Used for strokes and surface paint when no palette gate is active.
    pub fallback: Color,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        PaletteConfig {
            thumb: Color::RED,
            index: Color::GREEN,
            middle: Color::BLUE,
            fallback: Color::WHITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Length of the middle-fingertip paint ray (meters).
    pub ray_length: f32,
    pub paintable_mask: LayerMask,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        SurfaceConfig {
            ray_length: 3.0,
            paintable_mask: LayerMask::ALL,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PaintConfig
// ════════════════════════════════════════════════════════════════════════════

/// Complete configuration surface for the engine.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PaintConfig {
    pub pinch: PinchThresholds,
    pub erase: EraseConfig,
    pub stroke: StrokeConfig,
    pub calibration: CalibrationConfig,
    pub palette: PaletteConfig,
    pub surface: SurfaceConfig,
    pub voice: VoicePhrases,
}

impl PaintConfig {
    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: PaintConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pinch;
        for (name, v) in [
            ("pinch.start", p.start),
            ("pinch.end", p.end),
            ("pinch.palette", p.palette),
            ("pinch.paint", p.paint),
            ("pinch.open", p.open),
            ("pinch.erase", p.erase),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::Invalid(format!("{} must be within [0, 1], got {}", name, v)));
            }
        }
        if p.end >= p.start {
            return Err(ConfigError::Invalid(format!(
                "pinch.end ({}) must be below pinch.start ({})",
                p.end, p.start
            )));
        }
        if !(self.erase.radius > 0.0 && self.erase.radius.is_finite()) {
            return Err(ConfigError::Invalid(format!("erase.radius must be positive, got {}", self.erase.radius)));
        }
        if !(self.erase.hold_duration >= 0.0 && self.erase.hold_duration.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "erase.hold_duration must be non-negative, got {}",
                self.erase.hold_duration
            )));
        }
        if !(self.stroke.max_point_hz > 0.0 && self.stroke.max_point_hz.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "stroke.max_point_hz must be positive, got {}",
                self.stroke.max_point_hz
            )));
        }
        if !(self.stroke.min_point_spacing >= 0.0 && self.stroke.min_point_spacing.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "stroke.min_point_spacing must be non-negative, got {}",
                self.stroke.min_point_spacing
            )));
        }
        if !(self.surface.ray_length > 0.0 && self.surface.ray_length.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "surface.ray_length must be positive, got {}",
                self.surface.ray_length
            )));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
