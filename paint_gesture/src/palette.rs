//! Palette selection from the left hand.
//!
//! Thumb, index and middle pinches are three independent gates, each mapped
//! to one primary.  Active primaries are averaged channel by channel: a
//! plain additive blend, not perceptual mixing.

use serde::Deserialize;

use crate::pose::{Finger, HandPoseSample};

// ════════════════════════════════════════════════════════════════════════════
// Color
// ════════════════════════════════════════════════════════════════════════════

/// Linear RGBA, each channel in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    /// Euclidean distance over RGB (alpha ignored).
    pub fn distance(&self, other: &Color) -> f32 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Packed 0xAARRGGBB with alpha forced opaque, for framebuffer use.
    pub fn to_argb(&self) -> u32 {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        0xFF000000 | (c(self.r) << 16) | (c(self.g) << 8) | c(self.b)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PaletteState - the three gates
// ════════════════════════════════════════════════════════════════════════════

/// Which of the thumb / index / middle gates are active this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaletteState {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
}

impl PaletteState {
    pub fn active_count(&self) -> usize {
        [self.thumb, self.index, self.middle].iter().filter(|g| **g).count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PaletteMixer
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct PaletteMixer {
    threshold: f32,
    /// Thumb, index, middle.
    primaries: [Color; 3],
}

impl PaletteMixer {
    pub fn new(threshold: f32, thumb: Color, index: Color, middle: Color) -> Self {
        PaletteMixer {
            threshold,
            primaries: [thumb, index, middle],
        }
    }

    pub fn gates(&self, left: Option<&HandPoseSample>) -> PaletteState {
        let Some(hand) = left else {
            return PaletteState::default();
        };
        PaletteState {
            thumb: hand.pinch(Finger::Thumb) > self.threshold,
            index: hand.pinch(Finger::Index) > self.threshold,
            middle: hand.pinch(Finger::Middle) > self.threshold,
        }
    }

    /// The selected color, or `None` when no gate is active.
    pub fn current_color(&self, left: Option<&HandPoseSample>) -> Option<Color> {
        self.mix(self.gates(left))
    }

    pub fn mix(&self, gates: PaletteState) -> Option<Color> {
        let active: Vec<Color> = [gates.thumb, gates.index, gates.middle]
            .iter()
            .zip(self.primaries.iter())
            .filter(|(on, _)| **on)
            .map(|(_, c)| *c)
            .collect();

        match active.len() {
            0 => None,
            1 => Some(active[0]),
            n => {
                let n = n as f32;
                let (r, g, b) = active
                    .iter()
                    .fold((0.0, 0.0, 0.0), |(r, g, b), c| (r + c.r, g + c.g, b + c.b));
                Some(Color::rgba(r / n, g / n, b / n, 1.0))
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Confidence;

    fn mixer() -> PaletteMixer {
        PaletteMixer::new(0.6, Color::RED, Color::GREEN, Color::BLUE)
    }

    fn left(thumb: f32, index: f32, middle: f32) -> HandPoseSample {
        HandPoseSample::pinches_only([thumb, index, middle, 0.0, 0.0], Confidence::High)
    }

    #[test]
    fn no_gates_is_no_selection() {
        assert_eq!(mixer().current_color(Some(&left(0.1, 0.2, 0.3))), None);
    }

    #[test]
    fn untracked_hand_is_no_selection() {
        assert_eq!(mixer().current_color(None), None);
    }

    #[test]
    fn single_gate_is_exact_primary() {
        let m = PaletteMixer::new(0.6, Color::rgba(0.9, 0.1, 0.2, 0.5), Color::GREEN, Color::BLUE);
        assert_eq!(m.current_color(Some(&left(0.9, 0.0, 0.0))), Some(Color::rgba(0.9, 0.1, 0.2, 0.5)));
        assert_eq!(mixer().current_color(Some(&left(0.0, 0.0, 0.8))), Some(Color::BLUE));
    }

    #[test]
    fn two_gates_average_with_opaque_alpha() {
        let m = PaletteMixer::new(
            0.6,
            Color::rgba(1.0, 0.0, 0.0, 0.2),
            Color::rgba(0.0, 1.0, 0.0, 0.2),
            Color::BLUE,
        );
        let c = m.current_color(Some(&left(0.9, 0.9, 0.0))).unwrap();
        assert_eq!(c, Color::rgba(0.5, 0.5, 0.0, 1.0));
    }

    #[test]
    fn three_gates_average() {
        let c = mixer().current_color(Some(&left(1.0, 1.0, 1.0))).unwrap();
        let third = 1.0 / 3.0;
        assert!((c.r - third).abs() < 1e-6);
        assert!((c.g - third).abs() < 1e-6);
        assert!((c.b - third).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn gate_is_strictly_above_threshold() {
        let g = mixer().gates(Some(&left(0.6, 0.61, 0.0)));
        assert!(!g.thumb);
        assert!(g.index);
        assert_eq!(g.active_count(), 1);
    }

    #[test]
    fn argb_packing() {
        assert_eq!(Color::RED.to_argb(), 0xFFFF0000);
        assert_eq!(Color::rgb(0.0, 0.5, 1.0).to_argb(), 0xFF0080FF);
    }
}
