//! Top-level application state.
//!
//! `AppState` owns the `Orchestrator`, the `SphereScene`, the HUD overlay and
//! the view mode.  It processes `SourceEvent`s, voice transcripts and
//! commands, and feeds the visualizer each frame.

use std::sync::mpsc::{self, Receiver, TryRecvError};

use anyhow::Context;
use paint_gesture::{GestureState, HandFrame, Orchestrator, PaintConfig, TickReport, VoiceCommand};
use tracing::{debug, info};

use crate::hud::{HudOverlay, DEFAULT_SHOW_SECONDS};
use crate::passthrough::{Passthrough, ViewMode};
use crate::scene::SphereScene;
use crate::source::{spawn_pose_source, SimHandSource, SimHands, SimInput, SourceEvent, HAND_DEPTH};
use crate::visualizer::{FrameView, Visualizer};
use crate::voice::spawn_stdin_transcripts;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paint: PaintConfig,
    pub start_mode: ViewMode,
    /// Seconds a HUD ping stays on screen.
    pub hud_seconds: f32,
    /// Read voice transcripts, one per line, from stdin.
    pub stdin_voice: bool,
    /// Use the Leap Motion controller instead of the keyboard simulation.
    pub hardware: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            paint: PaintConfig::default(),
            start_mode: ViewMode::Scene,
            hud_seconds: DEFAULT_SHOW_SECONDS,
            stdin_voice: true,
            hardware: false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    orchestrator: Orchestrator,
    scene: SphereScene,
    hud: HudOverlay,
    view: Passthrough,
    last_frame: HandFrame,
    last_report: TickReport,
    pub status: String,
}

impl AppState {
    pub fn new(cfg: AppConfig) -> Self {
        let mut scene = SphereScene::demo();
        let view = Passthrough::new(cfg.start_mode, &mut scene);
        AppState {
            orchestrator: Orchestrator::new(cfg.paint),
            scene,
            hud: HudOverlay::new(cfg.hud_seconds),
            view,
            last_frame: HandFrame::untracked(),
            last_report: TickReport::default(),
            status: "pinch thumb + index to calibrate".into(),
        }
    }

    /// Returns false when the application should quit.
    pub fn handle_event(&mut self, event: SourceEvent) -> bool {
        match event {
            SourceEvent::Frame { frame, dt } => self.handle_frame(frame, dt),
            SourceEvent::Command(cmd) => self.handle_command(cmd),
            SourceEvent::Quit => return false,
        }
        true
    }

    fn handle_frame(&mut self, frame: HandFrame, dt: f32) {
        self.hud.tick(dt);
        let before = self.last_report.state;
        let report = self.orchestrator.tick(&frame, dt, &mut self.scene, &mut self.hud);

        if report.points_erased > 0 {
            self.status = format!("erased {} points", report.points_erased);
        } else if report.painted && before != GestureState::PaintingSurface {
            self.status = "painted surface".into();
        } else if report.state != before {
            self.status = match report.state {
                GestureState::Drawing => match self.orchestrator.strokes().active() {
                    Some(id) => format!("drawing stroke {}", id),
                    None => "drawing".into(),
                },
                GestureState::Erasing => "erasing".into(),
                GestureState::PaintingSurface => "painting".into(),
                GestureState::Idle => format!("{} strokes", self.orchestrator.strokes().query().count()),
            };
        }

        self.last_frame = frame;
        self.last_report = report;
    }

    pub fn handle_command(&mut self, cmd: VoiceCommand) {
        match cmd {
            VoiceCommand::ResetScene => {
                self.orchestrator.reset_session();
                self.last_report = TickReport::default();
                self.status = "scene reset".into();
                info!("scene reset");
            }
            VoiceCommand::TogglePassthrough => {
                let mode = self.view.toggle(&mut self.scene);
                self.status = format!("view: {}", mode);
            }
        }
    }

    /// Match a spoken transcript against the configured phrases.
    pub fn handle_transcript(&mut self, text: &str) -> Option<VoiceCommand> {
        let cmd = self.orchestrator.config().voice.match_transcript(text);
        debug!(text, command = ?cmd, "transcript");
        if let Some(cmd) = cmd {
            self.handle_command(cmd);
        }
        cmd
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn orchestrator(&self) -> &Orchestrator { &self.orchestrator }
    pub fn scene(&self)        -> &SphereScene  { &self.scene }
    pub fn hud(&self)          -> &HudOverlay   { &self.hud }
    pub fn mode(&self)         -> ViewMode      { self.view.mode() }
    pub fn last_frame(&self)   -> &HandFrame    { &self.last_frame }
    pub fn last_report(&self)  -> &TickReport   { &self.last_report }

    /// `(progress, settle_frames)` while the fingertips are not locked.
    pub fn calibration(&self) -> Option<(u32, u32)> {
        let resolver = self.orchestrator.resolver();
        if resolver.is_locked() {
            None
        } else {
            Some((resolver.progress(), self.orchestrator.config().calibration.settle_frames))
        }
    }

    pub fn frame_view(&self) -> FrameView<'_> {
        FrameView {
            strokes: self.orchestrator.strokes(),
            scene: &self.scene,
            hands: Some(&self.last_frame),
            report: &self.last_report,
            hud: self.hud.visible(),
            hud_fade: self.hud.fade(),
            mode: self.view.mode(),
            erase_radius: self.orchestrator.config().erase.radius,
            calibration: self.calibration(),
            status: &self.status,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() - the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Pose frames, plus the raw window input when the pose source isn't the
/// simulator (so command keys still work with hardware).
fn open_source(hardware: bool, sim_rx: Receiver<SimInput>) -> (Receiver<SourceEvent>, Option<Receiver<SimInput>>) {
    #[cfg(feature = "leap")]
    if hardware {
        info!("pose source: LeapMotion");
        return (spawn_pose_source(crate::source::LeapHandSource), Some(sim_rx));
    }
    #[cfg(not(feature = "leap"))]
    if hardware {
        tracing::warn!("built without the `leap` feature; using simulated hands");
    }
    info!("pose source: keyboard/mouse simulation");
    (spawn_pose_source(SimHandSource::new(sim_rx)), None)
}

/// Opens the visualizer window, starts the pose source and the voice reader,
/// and drives the event/render loop at ~60 fps.
pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    // ── Sim input channel ─────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let (pose_rx, key_rx) = open_source(cfg.hardware, sim_rx);
    let transcripts = cfg.stdin_voice.then(spawn_stdin_transcripts);

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx, HAND_DEPTH).context("opening visualizer window")?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(cfg);
    let mut keys = SimHands::new();

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        // 1. Poll window input → translate to SimInput
        if !vis.poll_input() { break; }

        // 2. Command keys when hardware supplies the hands
        if let Some(rx) = &key_rx {
            while let Ok(input) = rx.try_recv() {
                match keys.apply(input) {
                    Some(SourceEvent::Quit) => return Ok(()),
                    Some(event) => { app.handle_event(event); }
                    None => {}
                }
            }
        }

        // 3. Drain pose events
        loop {
            match pose_rx.try_recv() {
                Ok(event) => {
                    if !app.handle_event(event) { return Ok(()); }
                }
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        // 4. Voice transcripts
        if let Some(rx) = &transcripts {
            while let Ok(text) = rx.try_recv() {
                app.handle_transcript(&text);
            }
        }

        // 5. Render
        vis.render(&app.frame_view());
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SimKey;

    fn app() -> AppState {
        AppState::new(AppConfig::default())
    }

    /// Feed `seconds` of simulated frames at 90 Hz.
    fn run_sim(app: &mut AppState, hands: &mut SimHands, seconds: f32) {
        let dt = 1.0 / 90.0;
        let n = (seconds / dt).round() as usize;
        for _ in 0..n {
            let frame = hands.step(dt);
            assert!(app.handle_event(SourceEvent::Frame { frame, dt }));
        }
    }

    fn press(hands: &mut SimHands, key: SimKey) {
        hands.apply(SimInput::KeyDown(key));
    }

    fn release(hands: &mut SimHands, key: SimKey) {
        hands.apply(SimInput::KeyUp(key));
    }

    #[test]
    fn starts_uncalibrated_in_scene_mode() {
        let a = app();
        assert_eq!(a.mode(), ViewMode::Scene);
        assert!(a.scene().is_visible());
        assert!(a.calibration().is_some());
        assert!(a.orchestrator().strokes().is_empty());
    }

    #[test]
    fn quit_event_stops_the_loop() {
        let mut a = app();
        assert!(!a.handle_event(SourceEvent::Quit));
    }

    #[test]
    fn first_frame_announces_ready() {
        let mut a = app();
        let mut hands = SimHands::new();
        run_sim(&mut a, &mut hands, 0.05);
        assert_eq!(a.hud().visible().map(|e| e.tool.as_str()), Some("Ready"));
    }

    #[test]
    fn simulated_pinch_draws_a_stroke() {
        let mut a = app();
        let mut hands = SimHands::new();

        // Calibrate, then draw while moving the pointer
        press(&mut hands, SimKey::Draw);
        run_sim(&mut a, &mut hands, 0.5);
        assert!(a.calibration().is_none());
        assert_eq!(a.last_report().state, GestureState::Drawing);

        for i in 0..20 {
            hands.apply(SimInput::Pointer { x: 0.3 + i as f32 * 0.01, y: 0.0 });
            run_sim(&mut a, &mut hands, 0.05);
        }
        release(&mut hands, SimKey::Draw);
        run_sim(&mut a, &mut hands, 0.5);

        assert_eq!(a.last_report().state, GestureState::Idle);
        assert_eq!(a.orchestrator().strokes().query().count(), 1);
        assert!(a.orchestrator().strokes().active().is_none());
    }

    #[test]
    fn open_palm_erases_after_hold() {
        let mut a = app();
        let mut hands = SimHands::new();
        press(&mut hands, SimKey::OpenPalm);
        run_sim(&mut a, &mut hands, 0.2);
        assert_ne!(a.last_report().state, GestureState::Erasing);
        run_sim(&mut a, &mut hands, 0.6);
        assert_eq!(a.last_report().state, GestureState::Erasing);
        assert!(a.last_report().erase_center.is_some());
    }

    #[test]
    fn reset_clears_strokes_and_calibration() {
        let mut a = app();
        let mut hands = SimHands::new();
        press(&mut hands, SimKey::Draw);
        run_sim(&mut a, &mut hands, 0.5);
        for i in 0..10 {
            hands.apply(SimInput::Pointer { x: 0.3, y: i as f32 * 0.01 });
            run_sim(&mut a, &mut hands, 0.05);
        }
        assert!(!a.orchestrator().strokes().is_empty());

        a.handle_command(VoiceCommand::ResetScene);
        assert!(a.orchestrator().strokes().is_empty());
        assert!(a.calibration().is_some());
        assert_eq!(a.status, "scene reset");
    }

    #[test]
    fn transcript_toggles_passthrough() {
        let mut a = app();
        assert_eq!(a.handle_transcript("show me the real world"), Some(VoiceCommand::TogglePassthrough));
        assert_eq!(a.mode(), ViewMode::Passthrough);
        assert!(!a.scene().is_visible());
        assert_eq!(a.handle_transcript("what a nice day"), None);
        assert_eq!(a.mode(), ViewMode::Passthrough);
        a.handle_event(SourceEvent::Command(VoiceCommand::TogglePassthrough));
        assert_eq!(a.mode(), ViewMode::Scene);
    }

    #[test]
    fn frame_view_reflects_state() {
        let mut a = app();
        a.handle_command(VoiceCommand::TogglePassthrough);
        let view = a.frame_view();
        assert_eq!(view.mode, ViewMode::Passthrough);
        assert_eq!(view.erase_radius, a.orchestrator().config().erase.radius);
        assert!(view.calibration.is_some());
    }
}
