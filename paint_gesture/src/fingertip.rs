//! Fingertip calibration.
//!
//! Tracking providers do not agree on joint naming, and some expose several
//! plausible "tip" joints per finger.  While the user holds an index pinch we
//! pick, every frame, the thumb/index joint pair that is closest together;
//! once the same window has held for `settle_frames` consecutive frames the
//! choice is locked for the rest of the session.

use tracing::{info, trace};

use crate::pose::{distance_sq, Finger, HandPoseSample, JointId};

/// The joints that act as pinch fingertips for one hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingertipBinding {
    pub thumb: JointId,
    pub index: JointId,
    /// Origin of the surface-paint ray; absent if the skeleton has no
    /// middle-finger joint.
    pub middle: Option<JointId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ResolverPhase {
    Unresolved { progress: u32 },
    Locked(FingertipBinding),
}

/// Calibrates the pinch fingertips of one hand.
#[derive(Debug, Clone)]
pub struct FingertipResolver {
    phase: ResolverPhase,
    settle_frames: u32,
    start_threshold: f32,
}

impl FingertipResolver {
    pub fn new(settle_frames: u32, start_threshold: f32) -> Self {
        FingertipResolver {
            phase: ResolverPhase::Unresolved { progress: 0 },
            settle_frames: settle_frames.max(1),
            start_threshold,
        }
    }

    /// Feed one frame.  Returns the binding once locked; after that the
    /// sample is ignored.
    pub fn update(&mut self, sample: Option<&HandPoseSample>) -> Option<FingertipBinding> {
        let progress = match self.phase {
            ResolverPhase::Locked(binding) => return Some(binding),
            ResolverPhase::Unresolved { progress } => progress,
        };

        let Some(hand) = sample else {
            self.phase = ResolverPhase::Unresolved { progress: 0 };
            return None;
        };

        if hand.pinch(Finger::Index) < self.start_threshold {
            self.phase = ResolverPhase::Unresolved { progress: 0 };
            return None;
        }

        let Some((thumb, index)) = closest_pinch_pair(hand) else {
            self.phase = ResolverPhase::Unresolved { progress: 0 };
            return None;
        };

        let progress = progress + 1;
        trace!(progress, settle = self.settle_frames, "fingertip calibration");

        if progress < self.settle_frames {
            self.phase = ResolverPhase::Unresolved { progress };
            return None;
        }

        let binding = FingertipBinding {
            thumb,
            index,
            middle: middle_tip(hand),
        };
        info!(
            thumb = joint_name(hand, thumb),
            index = joint_name(hand, index),
            middle = binding.middle.map(|m| joint_name(hand, m)).unwrap_or("none"),
            "fingertips locked"
        );
        self.phase = ResolverPhase::Locked(binding);
        Some(binding)
    }

    pub fn binding(&self) -> Option<FingertipBinding> {
        match self.phase {
            ResolverPhase::Locked(b) => Some(b),
            ResolverPhase::Unresolved { .. } => None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.binding().is_some()
    }

    /// Consecutive qualifying frames so far (equals `settle_frames` once locked).
    pub fn progress(&self) -> u32 {
        match self.phase {
            ResolverPhase::Locked(_) => self.settle_frames,
            ResolverPhase::Unresolved { progress } => progress,
        }
    }
}

fn joint_name(hand: &HandPoseSample, id: JointId) -> &str {
    hand.joint(id).map(|j| j.name.as_str()).unwrap_or("?")
}

/// Tip-or-distal joints for `finger`, falling back to any joint of that finger.
fn candidates(hand: &HandPoseSample, finger: Finger) -> Vec<JointId> {
    let tok = finger.token();
    let mut c = hand.joints_tagged(&[tok, "tip"]);
    for d in hand.joints_tagged(&[tok, "distal"]) {
        if !c.contains(&d) {
            c.push(d);
        }
    }
    if c.is_empty() {
        c = hand.joints_tagged(&[tok]);
    }
    c
}

fn closest_pinch_pair(hand: &HandPoseSample) -> Option<(JointId, JointId)> {
    let thumbs = candidates(hand, Finger::Thumb);
    let indexes = candidates(hand, Finger::Index);

    let mut best: Option<(f32, JointId, JointId)> = None;
    for &t in &thumbs {
        for &i in &indexes {
            let (Some(tj), Some(ij)) = (hand.joint(t), hand.joint(i)) else { continue };
            let d = distance_sq(tj.position, ij.position);
            if best.map_or(true, |(bd, _, _)| d < bd) {
                best = Some((d, t, i));
            }
        }
    }
    best.map(|(_, t, i)| (t, i))
}

fn middle_tip(hand: &HandPoseSample) -> Option<JointId> {
    hand.joints_tagged(&["middle", "tip"])
        .first()
        .copied()
        .or_else(|| hand.joints_tagged(&["middle", "distal"]).first().copied())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{test_skeleton, Confidence, JointSample};

    fn pinching(index: f32, joints: Vec<JointSample>) -> HandPoseSample {
        HandPoseSample::new([0.0, index, 0.0, 0.0, 0.0], joints, Confidence::High)
    }

    #[test]
    fn locks_after_settle_frames() {
        let mut r = FingertipResolver::new(12, 0.6);
        let s = pinching(0.8, test_skeleton());
        for _ in 0..11 {
            assert!(r.update(Some(&s)).is_none());
        }
        let b = r.update(Some(&s)).expect("locks on 12th frame");
        assert_eq!(b.thumb, JointId(2));
        assert_eq!(b.index, JointId(4));
        assert_eq!(b.middle, Some(JointId(6)));
        assert!(r.is_locked());
    }

    #[test]
    fn dropout_resets_progress() {
        let mut r = FingertipResolver::new(5, 0.6);
        let on = pinching(0.8, test_skeleton());
        let off = pinching(0.3, test_skeleton());
        for _ in 0..4 {
            r.update(Some(&on));
        }
        assert_eq!(r.progress(), 4);
        r.update(Some(&off));
        assert_eq!(r.progress(), 0);
        for _ in 0..4 {
            assert!(r.update(Some(&on)).is_none());
        }
        assert!(r.update(Some(&on)).is_some());
    }

    #[test]
    fn untracked_frame_resets_progress() {
        let mut r = FingertipResolver::new(3, 0.6);
        let on = pinching(0.8, test_skeleton());
        r.update(Some(&on));
        r.update(Some(&on));
        r.update(None);
        assert_eq!(r.progress(), 0);
    }

    #[test]
    fn never_locks_without_skeleton() {
        let mut r = FingertipResolver::new(2, 0.6);
        let s = pinching(1.0, Vec::new());
        for _ in 0..100 {
            assert!(r.update(Some(&s)).is_none());
        }
        assert!(!r.is_locked());
    }

    #[test]
    fn locked_binding_is_not_reevaluated() {
        let mut r = FingertipResolver::new(1, 0.6);
        let first = r.update(Some(&pinching(0.9, test_skeleton()))).unwrap();

        // A different layout later must not move the lock.
        let fwd = [0.0, 0.0, 1.0];
        let other = vec![
            JointSample::new("index_tip", [0.0, 0.0, 0.0], fwd),
            JointSample::new("thumb_tip", [0.0, 0.0, 0.0], fwd),
        ];
        assert_eq!(r.update(Some(&pinching(0.9, other))), Some(first));
        assert_eq!(r.update(None), Some(first));
    }

    #[test]
    fn picks_closest_of_ambiguous_candidates() {
        let fwd = [0.0, 0.0, 1.0];
        let joints = vec![
            JointSample::new("ThumbTip", [0.0, 0.0, 0.0], fwd),
            JointSample::new("ThumbDistal", [0.10, 0.0, 0.0], fwd),
            JointSample::new("IndexTip", [0.30, 0.0, 0.0], fwd),
            JointSample::new("IndexDistal", [0.11, 0.0, 0.0], fwd),
        ];
        let mut r = FingertipResolver::new(1, 0.6);
        let b = r.update(Some(&pinching(0.9, joints))).unwrap();
        assert_eq!(b.thumb, JointId(1));
        assert_eq!(b.index, JointId(3));
        assert_eq!(b.middle, None);
    }

    #[test]
    fn falls_back_to_any_finger_joint() {
        let fwd = [0.0, 0.0, 1.0];
        let joints = vec![
            JointSample::new("thumb3", [0.0, 0.0, 0.0], fwd),
            JointSample::new("index3", [0.01, 0.0, 0.0], fwd),
            JointSample::new("middle_distal", [0.02, 0.0, 0.0], fwd),
        ];
        let mut r = FingertipResolver::new(1, 0.6);
        let b = r.update(Some(&pinching(0.9, joints))).unwrap();
        assert_eq!(b.thumb, JointId(0));
        assert_eq!(b.index, JointId(1));
        assert_eq!(b.middle, Some(JointId(2)));
    }

    #[test]
    fn zero_settle_frames_behaves_as_one() {
        let mut r = FingertipResolver::new(0, 0.6);
        assert!(r.update(Some(&pinching(0.7, test_skeleton()))).is_some());
    }
}
