//! Pointer-driven selection, move, resize and rotate.
//!
//! A gesture starts on pointer-down, is updated by pointer-move and ends on
//! pointer-up or cancel. Exactly one history checkpoint is recorded when a
//! drag starts; intermediate moves mutate the document directly.

use crate::document::LabelDocument;
use crate::geometry::{
    Corner, HandleKind, HandleTolerance, handle_at, resize_from_corner, rotation_toward, topmost_hit,
};
use crate::history::History;
use crate::objects::{Geometry, ObjectId};
use crate::snap::{Guide, SnapCandidates, snap_geometry};
use kurbo::{Point, Vec2};
use std::time::{Duration, Instant};

/// Pointer input, with positions in document dots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { position: Point, time: Instant },
    Move { position: Point },
    Up { position: Point, time: Instant },
    Cancel,
}

/// What a drag is doing to its object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragMode {
    /// Follow the pointer, keeping the pointer-to-origin offset.
    Move { offset: Vec2 },
    /// Resize from a corner relative to the box at drag start.
    Resize {
        corner: Corner,
        original: Geometry,
        start: Point,
    },
    /// Point the object's rotation at the pointer.
    Rotate { center: Point },
}

/// An active drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub object_id: ObjectId,
    pub mode: DragMode,
}

/// Gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(Drag),
}

/// Settings that shape a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSettings {
    pub snap_enabled: bool,
    pub snap_tolerance: f64,
    pub handles: HandleTolerance,
    pub double_tap: Duration,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            snap_enabled: true,
            snap_tolerance: crate::snap::SNAP_TOLERANCE,
            handles: HandleTolerance::default(),
            double_tap: Duration::from_millis(300),
        }
    }
}

/// The parts of an editing session a gesture touches.
pub struct GestureTarget<'a> {
    pub document: &'a mut LabelDocument,
    pub selection: &'a mut Option<ObjectId>,
    pub history: &'a mut History,
    pub guides: &'a mut Vec<Guide>,
}

/// What changed as a result of a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureOutcome {
    /// The canvas needs to be redrawn.
    pub redraw: bool,
    /// The selection changed; the property panel should resync.
    pub selection_changed: bool,
    /// The selected object's fields changed; the property panel should resync.
    pub object_changed: bool,
    /// A double tap asked to edit this text object.
    pub edit_text: Option<ObjectId>,
}

impl GestureOutcome {
    fn redraw() -> Self {
        Self {
            redraw: true,
            ..Default::default()
        }
    }
}

fn drag_for_handle(handle: HandleKind, geometry: &Geometry, pointer: Point) -> DragMode {
    match handle {
        HandleKind::Resize(corner) => DragMode::Resize {
            corner,
            original: *geometry,
            start: pointer,
        },
        HandleKind::Rotate => DragMode::Rotate {
            center: geometry.center(),
        },
    }
}

/// Interprets pointer sequences as select/move/resize/rotate gestures.
#[derive(Debug, Clone, Default)]
pub struct Manipulator {
    state: GestureState,
    /// Position of the last pointer-down, while pressed.
    press: Option<Point>,
    /// Whether the pointer moved since the last pointer-down.
    moved: bool,
    /// Last tap on a text object, for double-tap detection.
    last_tap: Option<(ObjectId, Instant)>,
}

impl Manipulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging(_))
    }

    /// Forget any drag and tap history, e.g. after the document was replaced.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one pointer event.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        target: GestureTarget<'_>,
        settings: &GestureSettings,
    ) -> GestureOutcome {
        match event {
            PointerEvent::Down { position, .. } => self.pointer_down(position, target, settings),
            PointerEvent::Move { position } => self.pointer_move(position, target, settings),
            PointerEvent::Up { time, .. } => self.pointer_up(time, target, settings),
            PointerEvent::Cancel => self.pointer_cancel(target),
        }
    }

    fn pointer_down(
        &mut self,
        position: Point,
        target: GestureTarget<'_>,
        settings: &GestureSettings,
    ) -> GestureOutcome {
        self.press = Some(position);
        self.moved = false;

        // Handles of the current selection win, even outside its box.
        if let Some(selected) = *target.selection {
            if let Some(object) = target.document.get(selected) {
                if let Some(handle) = handle_at(object, position, settings.handles) {
                    let mode = drag_for_handle(handle, &object.geometry, position);
                    target.history.record_checkpoint(target.document);
                    log::debug!("Start {mode:?} on {selected}");
                    self.state = GestureState::Dragging(Drag {
                        object_id: selected,
                        mode,
                    });
                    return GestureOutcome::redraw();
                }
            }
        }

        let Some(hit) = topmost_hit(position, &target.document.objects) else {
            self.state = GestureState::Idle;
            let selection_changed = target.selection.take().is_some();
            return GestureOutcome {
                redraw: true,
                selection_changed,
                ..Default::default()
            };
        };

        let selection_changed = *target.selection != Some(hit);
        *target.selection = Some(hit);

        let Some(object) = target.document.get(hit) else {
            return GestureOutcome::redraw();
        };
        let geometry = object.geometry;
        let mode = match handle_at(object, position, settings.handles) {
            Some(handle) => drag_for_handle(handle, &geometry, position),
            None => DragMode::Move {
                offset: position - Point::new(geometry.x, geometry.y),
            },
        };
        target.history.record_checkpoint(target.document);
        log::debug!("Start {mode:?} on {hit}");
        self.state = GestureState::Dragging(Drag {
            object_id: hit,
            mode,
        });

        GestureOutcome {
            redraw: true,
            selection_changed,
            ..Default::default()
        }
    }

    fn pointer_move(
        &mut self,
        position: Point,
        target: GestureTarget<'_>,
        settings: &GestureSettings,
    ) -> GestureOutcome {
        let GestureState::Dragging(drag) = self.state else {
            return GestureOutcome::default();
        };
        if self.press.is_some_and(|p| p != position) {
            self.moved = true;
        }

        let Some(current) = target.document.get(drag.object_id).map(|o| o.geometry) else {
            // The object went away underneath the drag.
            self.state = GestureState::Idle;
            target.guides.clear();
            return GestureOutcome::redraw();
        };

        target.guides.clear();
        let updated = match drag.mode {
            DragMode::Move { offset } => {
                let mut g = current;
                g.x = (position.x - offset.x).round();
                g.y = (position.y - offset.y).round();
                if settings.snap_enabled {
                    let doc = &*target.document;
                    let candidates = SnapCandidates::collect(
                        f64::from(doc.width_dots),
                        f64::from(doc.height_dots),
                        doc.objects
                            .iter()
                            .filter(|o| o.id() != drag.object_id)
                            .map(|o| &o.geometry),
                    );
                    let snap = snap_geometry(&g, &candidates, settings.snap_tolerance);
                    g.x += snap.offset.x;
                    g.y += snap.offset.y;
                    target.guides.extend(snap.guides());
                }
                g
            }
            DragMode::Resize {
                corner,
                original,
                start,
            } => resize_from_corner(&original, corner, position - start),
            DragMode::Rotate { center } => Geometry {
                rotation: rotation_toward(center, position),
                ..current
            },
        };

        if let Some(object) = target.document.get_mut(drag.object_id) {
            object.geometry = updated;
        }
        GestureOutcome {
            redraw: true,
            object_changed: updated != current,
            ..Default::default()
        }
    }

    fn pointer_up(
        &mut self,
        time: Instant,
        target: GestureTarget<'_>,
        settings: &GestureSettings,
    ) -> GestureOutcome {
        target.guides.clear();
        self.state = GestureState::Idle;
        let was_pressed = self.press.take().is_some();
        let mut outcome = GestureOutcome::redraw();

        if !was_pressed || self.moved {
            return outcome;
        }

        let Some(selected) = *target.selection else {
            return outcome;
        };
        if !target.document.get(selected).is_some_and(|o| o.is_text()) {
            return outcome;
        }

        match self.last_tap {
            Some((id, at)) if id == selected && time.saturating_duration_since(at) < settings.double_tap => {
                self.last_tap = None;
                outcome.edit_text = Some(selected);
            }
            _ => self.last_tap = Some((selected, time)),
        }
        outcome
    }

    fn pointer_cancel(&mut self, target: GestureTarget<'_>) -> GestureOutcome {
        target.guides.clear();
        self.state = GestureState::Idle;
        self.press = None;
        GestureOutcome::redraw()
    }
}
