//! Hit-testing, selection handles, resize and rotation math.
//!
//! Point-in-object tests use the unrotated box: an object rotated on screen
//! is still picked by its axis-aligned `[x, x+w] × [y, y+h]` rectangle.

use crate::objects::{Geometry, MIN_DIMENSION, ObjectId, PlacedObject};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Half-extent of a corner handle's hit square, in screen pixels.
pub const HANDLE_HIT_RADIUS: f64 = 8.0;
/// Distance of the rotate handle above the top edge, in dots.
pub const ROTATE_HANDLE_OFFSET: f64 = 18.0;
/// Radius of the rotate handle's hit circle, in screen pixels.
pub const ROTATE_HIT_RADIUS: f64 = 10.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::Nw, Corner::Ne, Corner::Sw, Corner::Se];

    /// Position of this corner on an unrotated box.
    pub fn position(self, geometry: &Geometry) -> Point {
        match self {
            Corner::Nw => Point::new(geometry.x, geometry.y),
            Corner::Ne => Point::new(geometry.right(), geometry.y),
            Corner::Sw => Point::new(geometry.x, geometry.bottom()),
            Corner::Se => Point::new(geometry.right(), geometry.bottom()),
        }
    }

    fn moves_left_edge(self) -> bool {
        matches!(self, Corner::Nw | Corner::Sw)
    }

    fn moves_top_edge(self) -> bool {
        matches!(self, Corner::Nw | Corner::Ne)
    }
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner handle: resizes while anchoring the opposite corner.
    Resize(Corner),
    /// Rotation handle above the top-center.
    Rotate,
}

/// Hit radii for handles, already converted to document dots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleTolerance {
    pub corner: f64,
    pub rotate: f64,
    pub rotate_offset: f64,
}

impl Default for HandleTolerance {
    fn default() -> Self {
        Self::for_scale(1.0)
    }
}

impl HandleTolerance {
    /// Tolerances for a view drawn at `view_scale` screen pixels per dot.
    pub fn for_scale(view_scale: f64) -> Self {
        Self::with_radii(view_scale, HANDLE_HIT_RADIUS, ROTATE_HIT_RADIUS, ROTATE_HANDLE_OFFSET)
    }

    /// Screen-pixel radii converted to dots; the rotate offset stays in dots.
    pub fn with_radii(view_scale: f64, corner_px: f64, rotate_px: f64, rotate_offset: f64) -> Self {
        let scale = if view_scale.is_finite() && view_scale > 0.0 {
            view_scale
        } else {
            1.0
        };
        Self {
            corner: corner_px / scale,
            rotate: rotate_px / scale,
            rotate_offset,
        }
    }
}

/// Whether `point` lies inside the object's unrotated box, edges included.
pub fn point_in_object(point: Point, object: &PlacedObject) -> bool {
    let g = &object.geometry;
    point.x >= g.x && point.y >= g.y && point.x <= g.right() && point.y <= g.bottom()
}

/// The topmost object containing `point`, scanning from the end of the paint order.
pub fn topmost_hit(point: Point, objects: &[PlacedObject]) -> Option<ObjectId> {
    objects
        .iter()
        .rev()
        .find(|o| point_in_object(point, o))
        .map(PlacedObject::id)
}

/// Center of the rotate handle.
pub fn rotate_handle_position(geometry: &Geometry, offset: f64) -> Point {
    Point::new(geometry.x + geometry.w / 2.0, geometry.y - offset)
}

/// Find which handle of `object` (if any) is under `point`.
///
/// Corners are checked first, in `nw, ne, sw, se` order.
pub fn handle_at(object: &PlacedObject, point: Point, tolerance: HandleTolerance) -> Option<HandleKind> {
    let g = &object.geometry;
    for corner in Corner::ALL {
        let c = corner.position(g);
        if (point.x - c.x).abs() <= tolerance.corner && (point.y - c.y).abs() <= tolerance.corner {
            return Some(HandleKind::Resize(corner));
        }
    }
    let r = rotate_handle_position(g, tolerance.rotate_offset);
    if (point - r).hypot() <= tolerance.rotate {
        return Some(HandleKind::Rotate);
    }
    None
}

/// Angle in whole degrees from `center` toward `pointer`.
pub fn rotation_toward(center: Point, pointer: Point) -> f64 {
    let angle = (pointer.y - center.y).atan2(pointer.x - center.x);
    angle.to_degrees().round()
}

/// Resize `original` by dragging `corner` by `delta`.
///
/// The opposite corner stays fixed. Edges land on whole dots and width and
/// height never drop below [`MIN_DIMENSION`], however far the drag goes.
pub fn resize_from_corner(original: &Geometry, corner: Corner, delta: Vec2) -> Geometry {
    let mut g = *original;

    if corner.moves_left_edge() {
        let right = original.right();
        let left = (original.x + delta.x).round().min(right - MIN_DIMENSION);
        g.x = left;
        g.w = right - left;
    } else {
        g.w = (original.w + delta.x).round().max(MIN_DIMENSION);
    }

    if corner.moves_top_edge() {
        let bottom = original.bottom();
        let top = (original.y + delta.y).round().min(bottom - MIN_DIMENSION);
        g.y = top;
        g.h = bottom - top;
    } else {
        g.h = (original.h + delta.y).round().max(MIN_DIMENSION);
    }

    g.clamp_size();
    g
}
