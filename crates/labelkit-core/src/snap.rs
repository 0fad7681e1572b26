//! Smart alignment while dragging.
//!
//! Candidates are the canvas midlines plus the left/center/right and
//! top/center/bottom lines of every other object. Each axis snaps
//! independently to its single closest match within tolerance.

use crate::objects::Geometry;
use kurbo::Vec2;

/// Default snap distance in dots.
pub const SNAP_TOLERANCE: f64 = 4.0;

/// A transient alignment line drawn while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Guide {
    /// Vertical line at this x.
    Vertical(f64),
    /// Horizontal line at this y.
    Horizontal(f64),
}

/// Alignment lines a moving object may snap to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapCandidates {
    /// x positions of vertical lines.
    pub vertical: Vec<f64>,
    /// y positions of horizontal lines.
    pub horizontal: Vec<f64>,
}

impl SnapCandidates {
    /// Collect candidates from the canvas size and the objects that are not moving.
    pub fn collect<'a>(
        canvas_width: f64,
        canvas_height: f64,
        others: impl IntoIterator<Item = &'a Geometry>,
    ) -> Self {
        let mut candidates = Self {
            vertical: vec![canvas_width / 2.0],
            horizontal: vec![canvas_height / 2.0],
        };
        for g in others {
            let [l, c, r] = vertical_lines(g);
            candidates.vertical.extend([l, c, r]);
            let [t, m, b] = horizontal_lines(g);
            candidates.horizontal.extend([t, m, b]);
        }
        candidates
    }
}

/// Result of a snap computation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapResult {
    /// Displacement to add to the object's position.
    pub offset: Vec2,
    /// x of the vertical guide, when the x axis snapped.
    pub vertical: Option<f64>,
    /// y of the horizontal guide, when the y axis snapped.
    pub horizontal: Option<f64>,
}

impl SnapResult {
    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.vertical.is_some() || self.horizontal.is_some()
    }

    /// Guides to show for this result (at most one per axis).
    pub fn guides(&self) -> Vec<Guide> {
        self.vertical
            .map(Guide::Vertical)
            .into_iter()
            .chain(self.horizontal.map(Guide::Horizontal))
            .collect()
    }
}

fn vertical_lines(g: &Geometry) -> [f64; 3] {
    [g.x, g.x + g.w / 2.0, g.right()]
}

fn horizontal_lines(g: &Geometry) -> [f64; 3] {
    [g.y, g.y + g.h / 2.0, g.bottom()]
}

/// Closest `(delta, line)` pair on one axis, if within tolerance.
///
/// Ties keep the first match found, scanning candidates in order.
fn best_match(edges: [f64; 3], candidates: &[f64], tolerance: f64) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64, f64)> = None;
    for &line in candidates {
        for edge in edges {
            let distance = (edge - line).abs();
            if distance > tolerance {
                continue;
            }
            if best.is_none_or(|(d, _, _)| distance < d) {
                best = Some((distance, line - edge, line));
            }
        }
    }
    best.map(|(_, delta, line)| (delta, line))
}

/// Compute the snap for an object at `moving`.
pub fn snap_geometry(moving: &Geometry, candidates: &SnapCandidates, tolerance: f64) -> SnapResult {
    let mut result = SnapResult::default();
    if let Some((dx, line)) = best_match(vertical_lines(moving), &candidates.vertical, tolerance) {
        result.offset.x = dx;
        result.vertical = Some(line);
    }
    if let Some((dy, line)) = best_match(horizontal_lines(moving), &candidates.horizontal, tolerance) {
        result.offset.y = dy;
        result.horizontal = Some(line);
    }
    log::trace!("snap {:?} -> {:?}", moving.bounds(), result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates_for(others: &[Geometry]) -> SnapCandidates {
        SnapCandidates::collect(440.0, 240.0, others)
    }

    #[test]
    fn test_snaps_to_canvas_center() {
        let moving = Geometry::new(118.0, 10.0, 200.0, 40.0);
        let result = snap_geometry(&moving, &candidates_for(&[]), SNAP_TOLERANCE);
        assert_eq!(result.offset, Vec2::new(2.0, 0.0));
        assert_eq!(result.vertical, Some(220.0));
        assert_eq!(result.horizontal, None);
        assert_eq!(result.guides(), vec![Guide::Vertical(220.0)]);
    }

    #[test]
    fn test_snaps_to_sibling_edges() {
        let other = Geometry::new(20.0, 80.0, 200.0, 100.0);
        let moving = Geometry::new(23.0, 177.0, 50.0, 20.0);
        let result = snap_geometry(&moving, &candidates_for(&[other]), SNAP_TOLERANCE);
        assert_eq!(result.offset, Vec2::new(-3.0, 3.0));
        assert_eq!(result.guides(), vec![Guide::Vertical(20.0), Guide::Horizontal(180.0)]);
    }

    #[test]
    fn test_closest_match_wins() {
        let a = Geometry::new(100.0, 0.0, 10.0, 10.0);
        let b = Geometry::new(103.0, 0.0, 10.0, 10.0);
        let moving = Geometry::new(102.0, 300.0, 10.0, 10.0);
        let result = snap_geometry(&moving, &candidates_for(&[a, b]), SNAP_TOLERANCE);
        assert_eq!(result.vertical, Some(103.0));
        assert_eq!(result.offset.x, 1.0);
    }

    #[test]
    fn test_outside_tolerance_does_not_snap() {
        let other = Geometry::new(0.0, 0.0, 10.0, 10.0);
        let moving = Geometry::new(300.0, 300.0, 7.0, 7.0);
        let result = snap_geometry(&moving, &candidates_for(&[other]), SNAP_TOLERANCE);
        assert!(!result.is_snapped());
        assert_eq!(result.offset, Vec2::ZERO);
    }

    #[test]
    fn test_snap_is_idempotent() {
        let other = Geometry::new(37.0, 61.0, 81.0, 45.0);
        let candidates = candidates_for(&[other]);
        for (x, y) in [(35.0, 59.0), (40.0, 64.5), (116.0, 104.0), (217.5, 118.0)] {
            let mut moving = Geometry::new(x, y, 30.0, 20.0);
            let first = snap_geometry(&moving, &candidates, SNAP_TOLERANCE);
            moving.x += first.offset.x;
            moving.y += first.offset.y;
            let second = snap_geometry(&moving, &candidates, SNAP_TOLERANCE);
            assert_eq!(second.offset, Vec2::ZERO, "start ({x}, {y})");
        }
    }
}
