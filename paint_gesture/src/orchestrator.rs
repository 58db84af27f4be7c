//! Per-frame driver.
//!
//! [`Orchestrator::tick`] is the only entry point the host calls each frame.
//! It owns every engine component and applies the classified tool to the
//! stroke store or the scene, then reports what happened for rendering.

use tracing::{debug, info, warn};

use crate::classifier::{ClassifierSettings, GestureClassifier, GestureState};
use crate::config::PaintConfig;
use crate::fingertip::{FingertipBinding, FingertipResolver};
use crate::palette::{Color, PaletteMixer};
use crate::pose::{midpoint, HandFrame, HandPoseSample, PalmJoints, Point3};
use crate::stroke::{StrokeId, StrokeStore};
use crate::surface::{PaintableScene, Ray, SurfacePainter};

/// HUD events with colors closer than this to the last one shown are dropped.
const HUD_COLOR_EPSILON: f32 = 0.01;
/// The idle palette preview is announced only when it moves this far.
const PREVIEW_COLOR_EPSILON: f32 = 0.02;

// ════════════════════════════════════════════════════════════════════════════
// HUD seam
// ════════════════════════════════════════════════════════════════════════════

/// A tool label with an optional swatch color.  `None` hides the swatch.
#[derive(Debug, Clone, PartialEq)]
pub struct HudEvent {
    pub tool: String,
    pub color: Option<Color>,
}

impl HudEvent {
    pub fn new(tool: impl Into<String>, color: Option<Color>) -> Self {
        HudEvent {
            tool: tool.into(),
            color,
        }
    }
}

/// Receives tool/color notifications.  Purely observational.
pub trait HudSink {
    fn ping(&mut self, event: &HudEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHud;

impl HudSink for NullHud {
    fn ping(&mut self, _event: &HudEvent) {}
}

impl HudSink for Vec<HudEvent> {
    fn ping(&mut self, event: &HudEvent) {
        self.push(event.clone());
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TickReport
// ════════════════════════════════════════════════════════════════════════════

/// What one tick did, for the visualizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub state: GestureState,
    /// Palette selection this frame.
    pub preview: Option<Color>,
    /// Midpoint of the locked thumb and index tips.
    pub pinch_point: Option<Point3>,
    /// Palm center, set while erasing.
    pub erase_center: Option<Point3>,
    /// Middle-tip paint ray, whenever one can be formed.
    pub paint_ray: Option<Ray>,
    /// True when a surface was recolored this tick.
    pub painted: bool,
    pub points_erased: usize,
}

// ════════════════════════════════════════════════════════════════════════════
// Orchestrator
// ════════════════════════════════════════════════════════════════════════════

pub struct Orchestrator {
    config: PaintConfig,
    resolver: FingertipResolver,
    classifier: GestureClassifier,
    palette: PaletteMixer,
    strokes: StrokeStore,
    painter: SurfacePainter,

    palm: Option<PalmJoints>,
    clock: f32,
    next_point_time: f32,
    active: Option<StrokeId>,
    last_hud: Option<HudEvent>,
}

impl Orchestrator {
    pub fn new(config: PaintConfig) -> Self {
        let resolver = FingertipResolver::new(config.calibration.settle_frames, config.pinch.start);
        let classifier = GestureClassifier::new(ClassifierSettings::from(&config));
        let palette = PaletteMixer::new(
            config.pinch.palette,
            config.palette.thumb,
            config.palette.index,
            config.palette.middle,
        );
        let strokes = StrokeStore::new(config.stroke.min_point_spacing);
        info!(
            eraser = %config.erase.policy,
            settle_frames = config.calibration.settle_frames,
            "orchestrator ready"
        );
        Orchestrator {
            config,
            resolver,
            classifier,
            palette,
            strokes,
            painter: SurfacePainter::new(),
            palm: None,
            clock: 0.0,
            next_point_time: 0.0,
            active: None,
            last_hud: None,
        }
    }

    pub fn config(&self) -> &PaintConfig {
        &self.config
    }

    pub fn strokes(&self) -> &StrokeStore {
        &self.strokes
    }

    pub fn resolver(&self) -> &FingertipResolver {
        &self.resolver
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    pub fn palette(&self) -> &PaletteMixer {
        &self.palette
    }

    /// Session time in seconds (sum of sanitized `dt`).
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Advance one frame.
    pub fn tick(
        &mut self,
        frame: &HandFrame,
        dt: f32,
        scene: &mut dyn PaintableScene,
        hud: &mut dyn HudSink,
    ) -> TickReport {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.clock += dt;

        if self.last_hud.is_none() {
            self.announce("Ready", None, hud);
        }

        let left = frame.left.as_ref();
        let right = frame.right.as_ref();

        if self.palm.is_none() {
            if let Some(hand) = right.filter(|h| h.has_skeleton()) {
                self.palm = PalmJoints::resolve(hand);
                if let Some(palm) = &self.palm {
                    debug!(knuckles = palm.knuckles.len(), wrist = palm.wrist.is_some(), "palm joints resolved");
                }
            }
        }

        let tips = self.resolver.update(right);
        let state = self.classifier.classify(left, right, tips, &*scene, dt);

        let preview = self.palette.current_color(left);
        let color = preview.unwrap_or(self.config.palette.fallback);

        let mut report = TickReport {
            state,
            preview,
            pinch_point: pinch_point(right, tips),
            paint_ray: self.classifier.paint_ray(right, tips),
            ..TickReport::default()
        };

        if state != GestureState::Drawing {
            self.finish_stroke();
        }

        match state {
            GestureState::Erasing => {
                self.announce("Erase", None, hud);
                let center = match (right, &self.palm) {
                    (Some(hand), Some(palm)) => palm.center(hand),
                    _ => None,
                };
                if let Some(center) = center {
                    let erased = self.strokes.erase_at(center, self.config.erase.radius);
                    report.points_erased = erased.points_removed;
                }
                report.erase_center = center;
            }
            GestureState::PaintingSurface => {
                if let Some(ray) = report.paint_ray {
                    let mask = self.config.surface.paintable_mask;
                    report.painted = self.painter.try_paint(scene, &ray, mask, color);
                }
                self.announce("Paint", Some(color), hud);
            }
            GestureState::Drawing => self.draw(report.pinch_point, color, hud),
            GestureState::Idle => {}
        }

        if let Some(c) = preview {
            let last = self.last_hud.as_ref().and_then(|e| e.color);
            let moved = last.map_or(true, |l| c.distance(&l) > PREVIEW_COLOR_EPSILON);
            if moved && self.active.is_none() && state != GestureState::Erasing {
                self.announce("Color", Some(c), hud);
            }
        }

        report
    }

    /// Clear all strokes and start calibration over.
    pub fn reset_session(&mut self) {
        self.strokes.clear();
        self.active = None;
        self.resolver = FingertipResolver::new(self.config.calibration.settle_frames, self.config.pinch.start);
        self.classifier.reset();
        self.palm = None;
        self.next_point_time = self.clock;
        self.last_hud = None;
        info!("session reset");
    }

    // ── drawing ──────────────────────────────────────────────────────────

    fn draw(&mut self, point: Option<Point3>, color: Color, hud: &mut dyn HudSink) {
        let id = match self.active {
            Some(id) => {
                self.strokes.recolor_active(color);
                id
            }
            None => {
                let id = self.strokes.begin_stroke(color);
                self.active = Some(id);
                self.announce("Draw", Some(color), hud);
                id
            }
        };

        let Some(point) = point else { return };
        if self.clock < self.next_point_time {
            return;
        }
        self.next_point_time = self.clock + self.config.stroke.point_interval();
        if let Err(e) = self.strokes.append_point(id, point, self.clock) {
            warn!(error = %e, "dropping stale stroke");
            self.active = None;
        }
    }

    fn finish_stroke(&mut self) {
        if let Some(id) = self.active.take() {
            if let Err(e) = self.strokes.end_stroke(id) {
                warn!(error = %e, "ending stroke");
            }
        }
    }

    // ── HUD ──────────────────────────────────────────────────────────────

    fn announce(&mut self, tool: &str, color: Option<Color>, hud: &mut dyn HudSink) {
        let changed = match &self.last_hud {
            None => true,
            Some(last) if last.tool != tool => true,
            Some(last) => match (last.color, color) {
                (Some(a), Some(b)) => a.distance(&b) > HUD_COLOR_EPSILON,
                (None, None) => false,
                _ => true,
            },
        };
        if changed {
            let event = HudEvent::new(tool, color);
            hud.ping(&event);
            self.last_hud = Some(event);
        }
    }
}

fn pinch_point(right: Option<&HandPoseSample>, tips: Option<FingertipBinding>) -> Option<Point3> {
    let hand = right?;
    let tips = tips?;
    let thumb = hand.joint(tips.thumb)?;
    let index = hand.joint(tips.index)?;
    Some(midpoint(thumb.position, index.position))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::EraserPolicy;
    use crate::pose::{test_skeleton, Confidence, JointSample};
    use crate::surface::tests::AxisScene;
    use crate::surface::{EmptyScene, ObjectHandle};

    const DT: f32 = 1.0 / 90.0;

    fn config() -> PaintConfig {
        let mut cfg = PaintConfig::default();
        cfg.calibration.settle_frames = 1;
        cfg.stroke.min_point_spacing = 0.0;
        cfg
    }

    /// Right hand with the test skeleton shifted by `offset`.
    fn right(pinch: [f32; 5], confidence: Confidence, offset: Point3) -> HandPoseSample {
        let joints = test_skeleton()
            .into_iter()
            .map(|j| {
                let p = j.position;
                JointSample::new(j.name, [p[0] + offset[0], p[1] + offset[1], p[2] + offset[2]], j.forward)
            })
            .collect();
        HandPoseSample::new(pinch, joints, confidence)
    }

    fn index(v: f32, offset: Point3) -> HandFrame {
        HandFrame::new(None, Some(right([0.0, v, 0.0, 0.0, 0.0], Confidence::Low, offset)))
    }

    fn tick(orch: &mut Orchestrator, frame: &HandFrame, hud: &mut Vec<HudEvent>) -> TickReport {
        orch.tick(frame, DT, &mut EmptyScene, hud)
    }

    #[test]
    fn pinch_ramp_draws_one_stroke() {
        let mut orch = Orchestrator::new(config());
        let mut hud = Vec::new();
        let ramp = [0.0, 0.2, 0.4, 0.59, 0.6, 0.7, 0.5, 0.45];
        for (i, v) in ramp.iter().enumerate() {
            let r = tick(&mut orch, &index(*v, [i as f32 * 0.1, 0.0, 0.0]), &mut hud);
            let expect = if i >= 4 { GestureState::Drawing } else { GestureState::Idle };
            assert_eq!(r.state, expect, "frame {}", i);
        }
        assert!(orch.strokes().active().is_some());

        let r = tick(&mut orch, &index(0.3, [1.0, 0.0, 0.0]), &mut hud);
        assert_eq!(r.state, GestureState::Idle);
        assert!(orch.strokes().active().is_none());

        let strokes: Vec<_> = orch.strokes().query().collect();
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].len(), 4);
        assert_eq!(strokes[0].color, Color::WHITE);
    }

    #[test]
    fn calibration_gates_drawing() {
        let mut cfg = config();
        cfg.calibration.settle_frames = 3;
        let mut orch = Orchestrator::new(cfg);
        let mut hud = Vec::new();
        let f = index(0.9, [0.0; 3]);
        assert_eq!(tick(&mut orch, &f, &mut hud).state, GestureState::Idle);
        assert_eq!(tick(&mut orch, &f, &mut hud).state, GestureState::Idle);
        assert_eq!(tick(&mut orch, &f, &mut hud).state, GestureState::Drawing);
        assert!(orch.resolver().is_locked());
    }

    #[test]
    fn point_rate_is_limited_and_floored() {
        let mut cfg = config();
        cfg.stroke.max_point_hz = 10.0;
        let mut orch = Orchestrator::new(cfg);
        let mut hud = Vec::new();
        // 100 frames at 100 Hz, moving every frame; 30 Hz floor keeps every fourth.
        for i in 0..100 {
            let f = index(0.9, [i as f32 * 0.01, 0.0, 0.0]);
            orch.tick(&f, 0.01, &mut EmptyScene, &mut hud);
        }
        orch.tick(&index(0.0, [0.0; 3]), 0.01, &mut EmptyScene, &mut hud);
        let s = orch.strokes().query().next().unwrap();
        assert_eq!(s.len(), 25);
    }

    #[test]
    fn stroke_follows_palette_and_hud_dedupes() {
        let mut orch = Orchestrator::new(config());
        let mut hud = Vec::new();
        let left = HandPoseSample::pinches_only([0.9, 0.0, 0.0, 0.0, 0.0], Confidence::High);

        for i in 0..5 {
            let r = right([0.0, 0.9, 0.0, 0.0, 0.0], Confidence::Low, [i as f32 * 0.1, 0.0, 0.0]);
            orch.tick(&HandFrame::new(Some(left.clone()), Some(r)), DT, &mut EmptyScene, &mut hud);
        }
        let labels: Vec<&str> = hud.iter().map(|e| e.tool.as_str()).collect();
        assert_eq!(labels, vec!["Ready", "Draw"]);
        assert_eq!(hud[1].color, Some(Color::RED));

        // Switch palette mid-stroke: stroke recolors, no extra HUD event while drawing.
        let left = HandPoseSample::pinches_only([0.0, 0.0, 0.9, 0.0, 0.0], Confidence::High);
        let r = right([0.0, 0.9, 0.0, 0.0, 0.0], Confidence::Low, [1.0, 0.0, 0.0]);
        orch.tick(&HandFrame::new(Some(left), Some(r)), DT, &mut EmptyScene, &mut hud);
        assert_eq!(hud.len(), 2);
        let id = orch.strokes().active().unwrap();
        assert_eq!(orch.strokes().get(id).unwrap().color, Color::BLUE);
    }

    #[test]
    fn idle_palette_change_announces_color() {
        let mut orch = Orchestrator::new(config());
        let mut hud = Vec::new();
        let green = HandPoseSample::pinches_only([0.0, 0.9, 0.0, 0.0, 0.0], Confidence::High);
        for _ in 0..3 {
            orch.tick(&HandFrame::new(Some(green.clone()), None), DT, &mut EmptyScene, &mut hud);
        }
        assert_eq!(hud.len(), 2);
        assert_eq!(hud[1], HudEvent::new("Color", Some(Color::GREEN)));

        let mix = HandPoseSample::pinches_only([0.9, 0.9, 0.0, 0.0, 0.0], Confidence::High);
        let r = orch.tick(&HandFrame::new(Some(mix), None), DT, &mut EmptyScene, &mut hud);
        assert_eq!(r.preview, Some(Color::rgba(0.5, 0.5, 0.0, 1.0)));
        assert_eq!(hud.len(), 3);
    }

    #[test]
    fn open_palm_erases_around_palm() {
        let mut orch = Orchestrator::new(config());
        let mut hud = Vec::new();
        // A stroke along x through the palm center of an unshifted hand
        // (pinch point lands at y = 0, z = 0.064).
        for i in 0..6 {
            let x = -0.3 + i as f32 * 0.1;
            tick(&mut orch, &index(0.9, [x, -0.05, -0.021]), &mut hud);
        }
        tick(&mut orch, &index(0.0, [0.0; 3]), &mut hud);
        let before = orch.strokes().total_points();
        assert_eq!(before, 6);

        let open = HandFrame::new(None, Some(right([0.0; 5], Confidence::High, [0.0; 3])));
        let mut erased = 0;
        let mut last = TickReport::default();
        for _ in 0..60 {
            last = tick(&mut orch, &open, &mut hud);
            erased += last.points_erased;
        }
        assert_eq!(last.state, GestureState::Erasing);
        assert!(last.erase_center.is_some());
        assert_eq!(erased, 2);
        assert_eq!(orch.strokes().total_points(), before - erased);
        assert!(hud.iter().any(|e| e.tool == "Erase" && e.color.is_none()));
        for s in orch.strokes().query() {
            assert!(s.len() >= 2);
        }
    }

    #[test]
    fn surface_paint_uses_fallback_color() {
        let mut orch = Orchestrator::new(config());
        let mut hud = Vec::new();
        let mut scene = AxisScene::default();
        scene.objects.push((ObjectHandle(4), 1.0, 0));
        scene.children.insert(ObjectHandle(4), vec![ObjectHandle(5)]);

        // Lock the fingertips first.
        orch.tick(&index(0.9, [0.0; 3]), DT, &mut scene, &mut hud);
        let paint = HandFrame::new(None, Some(right([0.9, 0.0, 0.9, 0.0, 0.0], Confidence::Low, [0.0; 3])));
        let r = orch.tick(&paint, DT, &mut scene, &mut hud);
        assert_eq!(r.state, GestureState::PaintingSurface);
        assert!(r.painted);
        assert_eq!(scene.colors.get(&ObjectHandle(4)), Some(&Color::WHITE));
        assert_eq!(scene.colors.get(&ObjectHandle(5)), Some(&Color::WHITE));
        assert!(orch.strokes().is_empty(), "single-point stroke discarded");
        assert_eq!(hud.last().unwrap().tool, "Paint");
    }

    #[test]
    fn dual_pinch_erases_without_hold() {
        let mut cfg = config();
        cfg.erase.policy = EraserPolicy::DualPinch;
        let mut orch = Orchestrator::new(cfg);
        let mut hud = Vec::new();
        tick(&mut orch, &index(0.0, [0.0; 3]), &mut hud);
        let left = HandPoseSample::pinches_only([0.9, 0.0, 0.0, 0.0, 0.9], Confidence::Low);
        let r = right([0.0; 5], Confidence::Low, [0.0; 3]);
        let rep = orch.tick(&HandFrame::new(Some(left), Some(r)), DT, &mut EmptyScene, &mut hud);
        assert_eq!(rep.state, GestureState::Erasing);
    }

    #[test]
    fn untracked_frames_are_idle() {
        let mut orch = Orchestrator::new(config());
        let mut hud = Vec::new();
        for _ in 0..10 {
            let r = tick(&mut orch, &HandFrame::untracked(), &mut hud);
            assert_eq!(r.state, GestureState::Idle);
            assert_eq!(r.pinch_point, None);
        }
        assert_eq!(hud, vec![HudEvent::new("Ready", None)]);
    }

    #[test]
    fn bad_dt_does_not_move_clock() {
        let mut orch = Orchestrator::new(config());
        orch.tick(&HandFrame::untracked(), f32::NAN, &mut EmptyScene, &mut NullHud);
        orch.tick(&HandFrame::untracked(), -1.0, &mut EmptyScene, &mut NullHud);
        assert_eq!(orch.clock(), 0.0);
    }

    #[test]
    fn reset_clears_strokes_and_binding() {
        let mut orch = Orchestrator::new(config());
        let mut hud = Vec::new();
        for i in 0..4 {
            tick(&mut orch, &index(0.9, [i as f32 * 0.1, 0.0, 0.0]), &mut hud);
        }
        assert!(!orch.strokes().is_empty());
        orch.reset_session();
        assert!(orch.strokes().is_empty());
        assert!(!orch.resolver().is_locked());

        hud.clear();
        tick(&mut orch, &HandFrame::untracked(), &mut hud);
        assert_eq!(hud, vec![HudEvent::new("Ready", None)]);
    }
}
