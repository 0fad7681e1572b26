//! Inline editing of a text object.
//!
//! While open, an editable field is overlaid on the object's on-screen box.
//! The field keeps its own buffer; the object only changes on commit.

use crate::objects::{ObjectId, PlacedObject};
use crate::view::ViewTransform;
use kurbo::Point;

/// Smallest font size used for the overlay field, in screen pixels.
pub const MIN_OVERLAY_FONT_PX: f64 = 16.0;
/// Gap kept between the overlay and the viewport edges, in screen pixels.
pub const VIEWPORT_MARGIN_PX: f64 = 8.0;
/// Overlay line height as a multiple of the font size.
pub const OVERLAY_LINE_FACTOR: f64 = 1.4;

/// Keyboard key for text editing.
#[derive(Debug, Clone, PartialEq)]
pub enum TextKey {
    Character(String),
    Backspace,
    Delete,
    Enter,
    Left,
    Right,
    Home,
    End,
    Escape,
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl TextModifiers {
    /// Either Ctrl or Cmd held.
    pub fn action_mod(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Result of handling a text editing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEditResult {
    /// Event was handled, text may have changed.
    Handled,
    /// The user finished editing; commit and close.
    ExitEdit,
    /// Event was not handled (pass to other handlers).
    NotHandled,
}

/// Placement of the overlay field, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub line_height: f64,
    pub bold: bool,
}

/// State of an open inline editor.
#[derive(Debug, Clone)]
pub struct TextEditState {
    object_id: ObjectId,
    anchor: Point,
    buffer: String,
    /// Byte offset of the caret; always on a char boundary.
    caret: usize,
    overlay: OverlayRect,
}

impl TextEditState {
    /// Open an editor over `object`. Returns `None` for non-text objects.
    pub fn open(object: &PlacedObject, view: &ViewTransform) -> Option<Self> {
        let text = object.as_text()?;
        let g = &object.geometry;
        let scale = view.scale;
        let line_h = text.size() * OVERLAY_LINE_FACTOR;
        let box_h = g.h.max(line_h * 2.0);
        let anchor = Point::new(g.x, g.y);
        let screen = view.doc_to_screen(anchor);

        let overlay = OverlayRect {
            left: screen.x.round(),
            top: screen.y.round(),
            width: (g.w * scale).round(),
            height: (box_h * scale).round(),
            font_size: (text.size() * scale).round().max(MIN_OVERLAY_FONT_PX),
            line_height: (line_h * scale).round(),
            bold: text.bold,
        };

        let buffer = text.text.clone();
        let caret = buffer.len();
        log::debug!("Editing text {} at {:?}", object.id(), overlay);
        Some(Self {
            object_id: object.id(),
            anchor,
            buffer,
            caret,
            overlay,
        })
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Current field content.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Caret position as a byte offset into [`Self::text`].
    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn overlay(&self) -> &OverlayRect {
        &self.overlay
    }

    /// Reposition after the viewport changed (scroll, resize, on-screen keyboard).
    ///
    /// The field is pulled up so its bottom stays `VIEWPORT_MARGIN_PX` above
    /// the viewport bottom, but never above `VIEWPORT_MARGIN_PX` from the top.
    pub fn relayout(&mut self, view: &ViewTransform, viewport_height: f64) {
        let screen = view.doc_to_screen(self.anchor);
        let mut top = screen.y;
        let max_top = viewport_height - VIEWPORT_MARGIN_PX - self.overlay.height;
        if top > max_top {
            top = max_top.max(VIEWPORT_MARGIN_PX);
        }
        self.overlay.left = screen.x.round();
        self.overlay.top = top.round();
    }

    /// Insert text at the caret.
    pub fn insert_str(&mut self, text: &str) {
        self.buffer.insert_str(self.caret, text);
        self.caret += text.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.buffer[..self.caret].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.buffer[self.caret..]
            .chars()
            .next()
            .map(|c| self.caret + c.len_utf8())
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: &TextKey, modifiers: TextModifiers) -> TextEditResult {
        match key {
            TextKey::Enter if modifiers.action_mod() => TextEditResult::ExitEdit,
            TextKey::Escape => TextEditResult::ExitEdit,
            TextKey::Enter => {
                self.insert_str("\n");
                TextEditResult::Handled
            }
            TextKey::Character(_) if modifiers.action_mod() && !modifiers.alt => {
                TextEditResult::NotHandled
            }
            TextKey::Character(text) => {
                self.insert_str(text);
                TextEditResult::Handled
            }
            TextKey::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.buffer.replace_range(prev..self.caret, "");
                    self.caret = prev;
                }
                TextEditResult::Handled
            }
            TextKey::Delete => {
                if let Some(next) = self.next_boundary() {
                    self.buffer.replace_range(self.caret..next, "");
                }
                TextEditResult::Handled
            }
            TextKey::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.caret = prev;
                }
                TextEditResult::Handled
            }
            TextKey::Right => {
                if let Some(next) = self.next_boundary() {
                    self.caret = next;
                }
                TextEditResult::Handled
            }
            TextKey::Home => {
                self.caret = self.buffer[..self.caret].rfind('\n').map_or(0, |i| i + 1);
                TextEditResult::Handled
            }
            TextKey::End => {
                self.caret = self.buffer[self.caret..]
                    .find('\n')
                    .map_or(self.buffer.len(), |i| self.caret + i);
                TextEditResult::Handled
            }
        }
    }

    /// Close the editor, yielding the object it edited and the final text.
    pub fn finish(self) -> (ObjectId, String) {
        (self.object_id, self.buffer)
    }
}
