//! Hand pose sources, from LeapMotion hardware or keyboard/mouse simulation.
//!
//! The public interface is [`SourceEvent`] delivered over a `mpsc` channel.
//! Consumers don't need to know whether frames came from real hardware or the
//! simulator.

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use paint_gesture::pose::{midpoint, Point3};
use paint_gesture::{Confidence, Finger, HandFrame, HandPoseSample, JointSample, VoiceCommand};
use tracing::{debug, info};

// ════════════════════════════════════════════════════════════════════════════
// SourceEvent
// ════════════════════════════════════════════════════════════════════════════

/// What a pose source delivers to the main loop.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    /// One tracking frame and the seconds since the previous one.
    Frame { frame: HandFrame, dt: f32 },

    /// A command shortcut (simulation keys stand in for speech).
    Command(VoiceCommand),

    /// Quit the application.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// HandPoseSource trait - unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SourceEvent`]s over a channel.
pub trait HandPoseSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>);
}

/// Spawn a pose source on its own thread and return the receiving end.
pub fn spawn_pose_source<S: HandPoseSource>(source: S) -> Receiver<SourceEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// Synthetic OVR-style skeleton
// ════════════════════════════════════════════════════════════════════════════

/// Open-hand layout relative to the middle knuckle, right hand, meters.
/// Fingers point up (+Y); the hand faces into the scene (+Z).
const KNUCKLES: [(Finger, [f32; 3]); 5] = [
    (Finger::Thumb, [-0.030, -0.050, 0.000]),
    (Finger::Index, [-0.020, 0.000, 0.000]),
    (Finger::Middle, [0.000, 0.000, 0.000]),
    (Finger::Ring, [0.020, 0.000, 0.000]),
    (Finger::Pinky, [0.040, -0.005, 0.000]),
];
const OPEN_TIPS: [[f32; 3]; 5] = [
    [-0.070, -0.010, 0.010],
    [-0.025, 0.080, 0.020],
    [0.000, 0.090, 0.020],
    [0.022, 0.080, 0.020],
    [0.045, 0.065, 0.020],
];
const WRIST: [f32; 3] = [0.0, -0.090, 0.0];
const FORWARD: Point3 = [0.0, 0.0, 1.0];

fn ovr_name(finger: Finger) -> &'static str {
    match finger {
        Finger::Thumb => "Thumb",
        Finger::Index => "Index",
        Finger::Middle => "Middle",
        Finger::Ring => "Ring",
        Finger::Pinky => "Pinky",
    }
}

fn lerp3(a: Point3, b: Point3, t: f32) -> Point3 {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t, a[2] + (b[2] - a[2]) * t]
}

/// Build a hand sample with OVR joint names (`Hand_WristRoot`,
/// `Hand_Index1`, `Hand_IndexTip`, ...).  Each pinching fingertip is pulled
/// toward the thumb, and the thumb toward the strongest pinch.
pub fn synth_hand(origin: Point3, pinch: [f32; 5], mirror: bool) -> HandPoseSample {
    let side = if mirror { -1.0 } else { 1.0 };
    let place = |o: [f32; 3]| [origin[0] + o[0] * side, origin[1] + o[1], origin[2] + o[2]];

    let thumb_open = OPEN_TIPS[0];
    let mut tips = OPEN_TIPS;
    let mut strongest: Option<(f32, Point3)> = None;
    for f in 1..5 {
        let meet = midpoint(thumb_open, OPEN_TIPS[f]);
        tips[f] = lerp3(OPEN_TIPS[f], meet, pinch[f]);
        if strongest.map_or(true, |(p, _)| pinch[f] > p) {
            strongest = Some((pinch[f], meet));
        }
    }
    if let Some((p, meet)) = strongest {
        tips[0] = lerp3(thumb_open, meet, p);
    }

    let mut joints = vec![JointSample::new("Hand_WristRoot", place(WRIST), FORWARD)];
    for (i, (finger, knuckle)) in KNUCKLES.iter().enumerate() {
        let name = ovr_name(*finger);
        joints.push(JointSample::new(format!("Hand_{}1", name), place(*knuckle), FORWARD));
        joints.push(JointSample::new(format!("Hand_{}Tip", name), place(tips[i]), FORWARD));
    }
    HandPoseSample::new(pinch, joints, Confidence::High)
}

// ════════════════════════════════════════════════════════════════════════════
// SimHands - keyboard/mouse state → hand frames
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    KeyDown(SimKey),
    KeyUp(SimKey),
    /// Right-hand position in world coordinates (meters).
    Pointer { x: f32, y: f32 },
}

/// Simulated key codes (mapped from minifb Key).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimKey {
    Draw,          // Space - right thumb + index pinch
    OpenPalm,      // E     - right hand fully open
    SurfacePaint,  // P     - right thumb + middle pinch
    PaletteThumb,  // 1     - left thumb
    PaletteIndex,  // 2     - left index
    PaletteMiddle, // 3     - left middle
    DualPinch,     // X     - left thumb + pinky
    HideLeft,      // L     - left hand leaves tracking
    Reset,         // N     - "reset scene"
    ToggleMode,    // M     - "toggle mode"
    Quit,          // Q
}

/// Pinch strength change per second while ramping toward a target.
pub const RAMP_PER_SEC: f32 = 3.0;

/// Resting pinches; openness 0.5 on the right keeps the open-palm eraser off.
const RIGHT_RELAXED: [f32; 5] = [0.5, 0.3, 0.5, 0.6, 0.6];
const LEFT_RELAXED: [f32; 5] = [0.2, 0.2, 0.2, 0.3, 0.3];
const LEFT_ORIGIN: Point3 = [-0.55, -0.25, 0.3];
/// Depth (z, meters) of the simulated right hand.
pub const HAND_DEPTH: f32 = 0.3;

/// Simulated two-hand state.  Pinch strengths ramp toward their targets so
/// the classifier sees continuous signals, not steps.
#[derive(Debug, Clone)]
pub struct SimHands {
    held: HashSet<SimKey>,
    pointer: [f32; 2],
    right: [f32; 5],
    left: [f32; 5],
}

impl Default for SimHands {
    fn default() -> Self {
        SimHands {
            held: HashSet::new(),
            pointer: [0.3, 0.0],
            right: RIGHT_RELAXED,
            left: LEFT_RELAXED,
        }
    }
}

impl SimHands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one input.  One-shot keys come back as events for the main loop.
    pub fn apply(&mut self, input: SimInput) -> Option<SourceEvent> {
        match input {
            SimInput::KeyDown(SimKey::Quit) => Some(SourceEvent::Quit),
            SimInput::KeyDown(SimKey::Reset) => Some(SourceEvent::Command(VoiceCommand::ResetScene)),
            SimInput::KeyDown(SimKey::ToggleMode) => Some(SourceEvent::Command(VoiceCommand::TogglePassthrough)),
            SimInput::KeyDown(key) => {
                self.held.insert(key);
                None
            }
            SimInput::KeyUp(key) => {
                self.held.remove(&key);
                None
            }
            SimInput::Pointer { x, y } => {
                if x.is_finite() && y.is_finite() {
                    self.pointer = [x, y];
                }
                None
            }
        }
    }

    pub fn is_held(&self, key: SimKey) -> bool {
        self.held.contains(&key)
    }

    fn right_target(&self) -> [f32; 5] {
        if self.is_held(SimKey::OpenPalm) {
            return [0.0; 5];
        }
        let mut t = RIGHT_RELAXED;
        if self.is_held(SimKey::Draw) {
            t[Finger::Thumb.index()] = 1.0;
            t[Finger::Index.index()] = 1.0;
        }
        if self.is_held(SimKey::SurfacePaint) {
            t[Finger::Thumb.index()] = 1.0;
            t[Finger::Middle.index()] = 1.0;
        }
        t
    }

    fn left_target(&self) -> [f32; 5] {
        let mut t = LEFT_RELAXED;
        let mut set = |f: Finger| t[f.index()] = 1.0;
        if self.is_held(SimKey::PaletteThumb) {
            set(Finger::Thumb);
        }
        if self.is_held(SimKey::PaletteIndex) {
            set(Finger::Index);
        }
        if self.is_held(SimKey::PaletteMiddle) {
            set(Finger::Middle);
        }
        if self.is_held(SimKey::DualPinch) {
            set(Finger::Thumb);
            set(Finger::Pinky);
        }
        t
    }

    /// Advance the ramps by `dt` seconds and synthesize a frame.
    pub fn step(&mut self, dt: f32) -> HandFrame {
        let max_step = RAMP_PER_SEC * dt.max(0.0);
        let ramp = |cur: &mut [f32; 5], target: [f32; 5]| {
            for (c, t) in cur.iter_mut().zip(target) {
                *c += (t - *c).clamp(-max_step, max_step);
            }
        };
        let (rt, lt) = (self.right_target(), self.left_target());
        ramp(&mut self.right, rt);
        ramp(&mut self.left, lt);

        let right = synth_hand([self.pointer[0], self.pointer[1], HAND_DEPTH], self.right, false);
        let left = if self.is_held(SimKey::HideLeft) {
            None
        } else {
            Some(synth_hand(LEFT_ORIGIN, self.left, true))
        };
        HandFrame::new(left, Some(right))
    }

    pub fn right_pinch(&self) -> [f32; 5] {
        self.right
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource - keyboard/mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Pose source driven by [`SimInput`] events from the visualizer's window.
pub struct SimHandSource {
    pub rx: Receiver<SimInput>,
    pub rate_hz: f32,
}

impl SimHandSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimHandSource { rx, rate_hz: 90.0 }
    }
}

impl HandPoseSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        let period = Duration::from_secs_f32(1.0 / self.rate_hz.max(1.0));
        let mut hands = SimHands::new();
        let mut last = Instant::now();
        info!(rate_hz = self.rate_hz, "simulated hands running");

        loop {
            loop {
                match self.rx.try_recv() {
                    Ok(input) => match hands.apply(input) {
                        Some(SourceEvent::Quit) => {
                            let _ = tx.send(SourceEvent::Quit);
                            return;
                        }
                        Some(event) => {
                            if tx.send(event).is_err() {
                                return;
                            }
                        }
                        None => {}
                    },
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        debug!("sim input closed");
                        return;
                    }
                }
            }

            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f32();
            last = now;

            let frame = hands.step(dt);
            if tx.send(SourceEvent::Frame { frame, dt }).is_err() {
                return;
            }
            thread::sleep(period);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapHandSource - real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Pose source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// Each digit contributes a knuckle joint (`{Finger}1`, metacarpal end) and
/// a tip joint (`{Finger}Tip`, distal end, forward along the distal bone).
/// Per-finger pinch comes from thumb-tip distance: 1.0 at `PINCH_NEAR_MM`,
/// 0.0 at `PINCH_FAR_MM` and beyond.  The thumb reports its strongest pinch.
#[cfg(feature = "leap")]
pub struct LeapHandSource;

#[cfg(feature = "leap")]
impl HandPoseSource for LeapHandSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        use leaprs::*;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = ?e, "failed to create LeapC connection");
                let _ = tx.send(SourceEvent::Quit);
                return;
            }
        };
        if let Err(e) = connection.open() {
            tracing::error!(error = ?e, "failed to open LeapMotion device");
            let _ = tx.send(SourceEvent::Quit);
            return;
        }
        info!("LeapMotion connected");

        let mut last = Instant::now();
        loop {
            let msg = match connection.poll(100) {
                Ok(m) => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<_> = frame.hands().collect();
                let left = hands.iter().find(|h| h.hand_type() == HandType::Left).and_then(|h| leap_sample(h));
                let right = hands.iter().find(|h| h.hand_type() == HandType::Right).and_then(|h| leap_sample(h));

                let now = Instant::now();
                let dt = now.duration_since(last).as_secs_f32();
                last = now;
                let event = SourceEvent::Frame {
                    frame: HandFrame::new(left, right),
                    dt,
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(feature = "leap")]
const PINCH_NEAR_MM: f32 = 15.0;
#[cfg(feature = "leap")]
const PINCH_FAR_MM: f32 = 75.0;

/// Leap millimetres (y up, z toward the user) → engine meters (z into scene).
#[cfg(feature = "leap")]
fn leap_point(x: f32, y: f32, z: f32) -> Point3 {
    [x * 0.001, (y - 200.0) * 0.001, -z * 0.001]
}

#[cfg(feature = "leap")]
fn leap_sample(hand: &leaprs::Hand) -> Option<HandPoseSample> {
    use paint_gesture::pose::{distance, normalize};

    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 {
        return None;
    }

    let palm = hand.palm().position();
    let mut joints = vec![JointSample::new("Palm_Wrist", leap_point(palm.x, palm.y, palm.z), FORWARD)];
    let mut tip_pos = [[0.0f32; 3]; 5];

    for (i, finger) in Finger::ALL.iter().enumerate() {
        let knuckle = digits[i].metacarpal().next_joint();
        let prev = digits[i].distal().prev_joint();
        let tip = digits[i].distal().next_joint();
        let tp = leap_point(tip.x, tip.y, tip.z);
        let pp = leap_point(prev.x, prev.y, prev.z);
        let fwd = normalize([tp[0] - pp[0], tp[1] - pp[1], tp[2] - pp[2]]).unwrap_or(FORWARD);
        tip_pos[i] = tp;

        let name = ovr_name(*finger);
        joints.push(JointSample::new(
            format!("{}1", name),
            leap_point(knuckle.x, knuckle.y, knuckle.z),
            fwd,
        ));
        joints.push(JointSample::new(format!("{}Tip", name), tp, fwd));
    }

    let mut pinch = [0.0f32; 5];
    for f in 1..5 {
        let mm = distance(tip_pos[0], tip_pos[f]) * 1000.0;
        pinch[f] = (1.0 - (mm - PINCH_NEAR_MM) / (PINCH_FAR_MM - PINCH_NEAR_MM)).clamp(0.0, 1.0);
    }
    pinch[0] = pinch[1..].iter().copied().fold(0.0, f32::max);

    Some(HandPoseSample::new(pinch, joints, Confidence::High))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
