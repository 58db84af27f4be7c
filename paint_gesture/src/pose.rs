//! Per-frame hand pose samples.
//!
//! A [`HandPoseSample`] is a snapshot of one hand for one frame: five pinch
//! strengths, the skeleton's named joints, and a confidence grade.  Samples
//! are produced fresh every frame and never retained.  An untracked hand is
//! `None` in [`HandFrame`], never a zeroed sample.

// ════════════════════════════════════════════════════════════════════════════
// Geometry helpers
// ════════════════════════════════════════════════════════════════════════════

/// A position or direction in meters, world space.
pub type Point3 = [f32; 3];

pub fn distance(a: Point3, b: Point3) -> f32 {
    distance_sq(a, b).sqrt()
}

pub fn distance_sq(a: Point3, b: Point3) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

pub fn midpoint(a: Point3, b: Point3) -> Point3 {
    [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5, (a[2] + b[2]) * 0.5]
}

/// Normalise `v`; `None` for a zero-length or non-finite vector.
pub fn normalize(v: Point3) -> Option<Point3> {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if !len.is_finite() || len < 1e-6 {
        return None;
    }
    Some([v[0] / len, v[1] / len, v[2] / len])
}

pub fn is_finite_point(p: Point3) -> bool {
    p.iter().all(|c| c.is_finite())
}

// ════════════════════════════════════════════════════════════════════════════
// Finger / Confidence
// ════════════════════════════════════════════════════════════════════════════

/// Finger identity used to index pinch strengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Lower-case token used when matching joint names.
    pub fn token(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }
}

/// Sensor-reported reliability grade for a pose estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confidence {
    #[default]
    Low,
    High,
}

// ════════════════════════════════════════════════════════════════════════════
// Joints
// ════════════════════════════════════════════════════════════════════════════

/// Index of a joint inside a sample's joint list.
///
/// Providers keep the joint layout stable for a session, so a `JointId`
/// resolved once stays valid for every later frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointId(pub usize);

/// One named skeletal joint.
#[derive(Debug, Clone, PartialEq)]
pub struct JointSample {
    pub name: String,
    pub position: Point3,
    /// Unit direction the joint points along (bone forward axis).
    pub forward: Point3,
}

impl JointSample {
    pub fn new(name: impl Into<String>, position: Point3, forward: Point3) -> Self {
        JointSample {
            name: name.into(),
            position,
            forward,
        }
    }

    /// Case-insensitive substring test on the joint name.
    pub fn looks_like(&self, token: &str) -> bool {
        self.name.to_lowercase().contains(&token.to_lowercase())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandPoseSample
// ════════════════════════════════════════════════════════════════════════════

/// One hand, one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandPoseSample {
    pinch: [f32; 5],
    pub joints: Vec<JointSample>,
    pub confidence: Confidence,
}

impl HandPoseSample {
    /// Build a sample; pinch strengths are clamped to [0, 1] and non-finite
    /// values read as 0.
    pub fn new(pinch: [f32; 5], joints: Vec<JointSample>, confidence: Confidence) -> Self {
        HandPoseSample {
            pinch: pinch.map(clamp_unit),
            joints,
            confidence,
        }
    }

    /// A sample with no skeleton, only pinch signals.
    pub fn pinches_only(pinch: [f32; 5], confidence: Confidence) -> Self {
        Self::new(pinch, Vec::new(), confidence)
    }

    pub fn with_pinch(mut self, finger: Finger, strength: f32) -> Self {
        self.pinch[finger.index()] = clamp_unit(strength);
        self
    }

    pub fn pinch(&self, finger: Finger) -> f32 {
        self.pinch[finger.index()]
    }

    pub fn pinch_strengths(&self) -> [f32; 5] {
        self.pinch
    }

    /// 1 − mean pinch strength over all five fingers.
    pub fn openness(&self) -> f32 {
        1.0 - self.pinch.iter().sum::<f32>() / 5.0
    }

    pub fn has_skeleton(&self) -> bool {
        !self.joints.is_empty()
    }

    pub fn joint(&self, id: JointId) -> Option<&JointSample> {
        self.joints.get(id.0)
    }

    /// Ids of every joint whose name contains all of `tokens`.
    pub fn joints_tagged(&self, tokens: &[&str]) -> Vec<JointId> {
        self.joints
            .iter()
            .enumerate()
            .filter(|(_, j)| tokens.iter().all(|t| j.looks_like(t)))
            .map(|(i, _)| JointId(i))
            .collect()
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

// ════════════════════════════════════════════════════════════════════════════
// HandFrame
// ════════════════════════════════════════════════════════════════════════════

/// Both hands for one frame.  `None` means the hand is not tracked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandFrame {
    pub left: Option<HandPoseSample>,
    pub right: Option<HandPoseSample>,
}

impl HandFrame {
    pub fn new(left: Option<HandPoseSample>, right: Option<HandPoseSample>) -> Self {
        HandFrame { left, right }
    }

    pub fn untracked() -> Self {
        HandFrame::default()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PalmJoints - wrist + knuckles, resolved once
// ════════════════════════════════════════════════════════════════════════════

/// Joints whose mean approximates the palm center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalmJoints {
    pub wrist: Option<JointId>,
    pub knuckles: Vec<JointId>,
}

impl PalmJoints {
    /// Resolve the wrist and the first knuckle joint of each non-thumb finger.
    /// Knuckles are joints tagged with the finger and `"1"` (OVR style) or
    /// `"proximal"`.  `None` when the skeleton offers neither.
    pub fn resolve(sample: &HandPoseSample) -> Option<PalmJoints> {
        let wrist = sample.joints_tagged(&["wrist"]).first().copied();
        let mut knuckles = Vec::new();
        for finger in [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky] {
            let tok = finger.token();
            let found = sample
                .joints_tagged(&[tok, "1"])
                .first()
                .copied()
                .or_else(|| sample.joints_tagged(&[tok, "proximal"]).first().copied());
            if let Some(id) = found {
                knuckles.push(id);
            }
        }
        if wrist.is_none() && knuckles.is_empty() {
            return None;
        }
        Some(PalmJoints { wrist, knuckles })
    }

    /// Mean of every resolved joint present in `sample`.
    pub fn center(&self, sample: &HandPoseSample) -> Option<Point3> {
        let mut sum = [0.0f32; 3];
        let mut count = 0;
        for id in self.wrist.iter().chain(self.knuckles.iter()) {
            if let Some(j) = sample.joint(*id) {
                sum[0] += j.position[0];
                sum[1] += j.position[1];
                sum[2] += j.position[2];
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }
        let n = count as f32;
        Some([sum[0] / n, sum[1] / n, sum[2] / n])
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Test fixtures
// ════════════════════════════════════════════════════════════════════════════

/// OVR-style skeleton used across the crate's tests.
#[cfg(test)]
pub(crate) fn test_skeleton() -> Vec<JointSample> {
    let fwd = [0.0, 0.0, 1.0];
    vec![
        JointSample::new("Hand_WristRoot", [0.0, 0.0, 0.0], fwd),
        JointSample::new("Hand_Thumb1", [-0.03, 0.02, 0.02], fwd),
        JointSample::new("Hand_ThumbTip", [-0.01, 0.05, 0.08], fwd),
        JointSample::new("Hand_Index1", [-0.02, 0.0, 0.08], fwd),
        JointSample::new("Hand_IndexTip", [-0.01, 0.05, 0.09], fwd),
        JointSample::new("Hand_Middle1", [0.0, 0.0, 0.08], fwd),
        JointSample::new("Hand_MiddleTip", [0.0, 0.0, 0.16], fwd),
        JointSample::new("Hand_Ring1", [0.02, 0.0, 0.08], fwd),
        JointSample::new("Hand_Pinky1", [0.04, 0.0, 0.08], fwd),
    ]
}
