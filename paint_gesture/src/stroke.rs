//! Stroke polylines.
//!
//! The store owns every stroke.  At most one stroke is active (being drawn)
//! at a time; every other stroke is live and holds at least two points.
//! Spatial erase removes individual points, never splits a stroke, so the
//! survivors of a stroke cut through the middle still render as one line.

use std::fmt;

use tracing::debug;

use crate::error::StrokeError;
use crate::palette::Color;
use crate::pose::{distance, is_finite_point, Point3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrokeId(pub u64);

impl fmt::Display for StrokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePoint {
    pub position: Point3,
    /// Session clock at append time (seconds).
    pub timestamp: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub id: StrokeId,
    pub color: Color,
    points: Vec<StrokePoint>,
}

impl Stroke {
    fn new(id: StrokeId, color: Color) -> Self {
        Stroke {
            id,
            color,
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    pub fn positions(&self) -> impl Iterator<Item = Point3> + '_ {
        self.points.iter().map(|p| p.position)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_position(&self) -> Option<Point3> {
        self.points.last().map(|p| p.position)
    }
}

/// What a single [`StrokeStore::erase_at`] call removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EraseReport {
    pub points_removed: usize,
    pub strokes_deleted: Vec<StrokeId>,
}

impl EraseReport {
    pub fn is_empty(&self) -> bool {
        self.points_removed == 0
    }
}

// ════════════════════════════════════════════════════════════════════════════
// StrokeStore
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct StrokeStore {
    strokes: Vec<Stroke>,
    active: Option<StrokeId>,
    next_id: u64,
    min_spacing: f32,
}

impl StrokeStore {
    pub fn new(min_spacing: f32) -> Self {
        StrokeStore {
            strokes: Vec::new(),
            active: None,
            next_id: 1,
            min_spacing: if min_spacing.is_finite() { min_spacing.max(0.0) } else { 0.0 },
        }
    }

    pub fn min_spacing(&self) -> f32 {
        self.min_spacing
    }

    /// Start a new stroke and make it the active one.  A stroke still active
    /// is ended first.
    pub fn begin_stroke(&mut self, color: Color) -> StrokeId {
        if let Some(prev) = self.active {
            // The active id always refers to a stored stroke.
            let _ = self.end_stroke(prev);
        }
        let id = StrokeId(self.next_id);
        self.next_id += 1;
        self.strokes.push(Stroke::new(id, color));
        self.active = Some(id);
        debug!(stroke = %id, "stroke begun");
        id
    }

    /// Append `position` to the active stroke when it is at least the
    /// minimum spacing away from the last stored point.  Returns whether the
    /// point was stored.
    pub fn append_point(&mut self, id: StrokeId, position: Point3, timestamp: f32) -> Result<bool, StrokeError> {
        self.check_active(id)?;
        if !is_finite_point(position) {
            return Ok(false);
        }
        let min_spacing = self.min_spacing;
        let stroke = self.stroke_mut(id).ok_or(StrokeError::UnknownStroke(id))?;
        if let Some(last) = stroke.last_position() {
            if distance(last, position) < min_spacing {
                return Ok(false);
            }
        }
        stroke.points.push(StrokePoint { position, timestamp });
        Ok(true)
    }

    /// Detach the active stroke.  A stroke with fewer than two points is
    /// discarded and `false` returned.
    pub fn end_stroke(&mut self, id: StrokeId) -> Result<bool, StrokeError> {
        self.check_active(id)?;
        self.active = None;
        let len = self.get(id).map(Stroke::len).unwrap_or(0);
        if len < 2 {
            self.strokes.retain(|s| s.id != id);
            debug!(stroke = %id, points = len, "stroke discarded");
            return Ok(false);
        }
        debug!(stroke = %id, points = len, "stroke ended");
        Ok(true)
    }

    /// Recolor the active stroke, if any.
    pub fn recolor_active(&mut self, color: Color) {
        if let Some(id) = self.active {
            if let Some(stroke) = self.stroke_mut(id) {
                stroke.color = color;
            }
        }
    }

    /// Remove every point within `radius` of `center` (inclusive).  A stroke
    /// that loses points and is left with fewer than two is deleted.
    pub fn erase_at(&mut self, center: Point3, radius: f32) -> EraseReport {
        let mut report = EraseReport::default();
        if !is_finite_point(center) || !radius.is_finite() || radius < 0.0 {
            return report;
        }

        for stroke in &mut self.strokes {
            let before = stroke.points.len();
            stroke.points.retain(|p| distance(p.position, center) > radius);
            let removed = before - stroke.points.len();
            if removed > 0 {
                report.points_removed += removed;
                if stroke.points.len() < 2 {
                    report.strokes_deleted.push(stroke.id);
                }
            }
        }

        if !report.strokes_deleted.is_empty() {
            let deleted = &report.strokes_deleted;
            self.strokes.retain(|s| !deleted.contains(&s.id));
            if self.active.is_some_and(|a| deleted.contains(&a)) {
                self.active = None;
            }
            debug!(deleted = deleted.len(), points = report.points_removed, "strokes erased");
        }
        report
    }

    /// Live strokes (two or more points) in creation order.
    pub fn query(&self) -> impl Iterator<Item = &Stroke> + '_ {
        self.strokes.iter().filter(|s| s.len() >= 2)
    }

    pub fn get(&self, id: StrokeId) -> Option<&Stroke> {
        self.strokes.iter().find(|s| s.id == id)
    }

    /// Number of stored strokes, including an active one still short of two
    /// points.
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn active(&self) -> Option<StrokeId> {
        self.active
    }

    pub fn total_points(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.active = None;
    }

    fn check_active(&self, id: StrokeId) -> Result<(), StrokeError> {
        if self.get(id).is_none() {
            return Err(StrokeError::UnknownStroke(id));
        }
        if self.active != Some(id) {
            return Err(StrokeError::NotActive(id));
        }
        Ok(())
    }

    fn stroke_mut(&mut self, id: StrokeId) -> Option<&mut Stroke> {
        self.strokes.iter_mut().find(|s| s.id == id)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
