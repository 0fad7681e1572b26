//! Property panel boundary: a read-only view of the selection and the
//! edits the panel can commit back.

use crate::objects::{ObjectKind, PlacedObject, TextAlign};
use serde::{Deserialize, Serialize};

/// Snapshot of the selected object's editable fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyView {
    #[serde(rename = "type")]
    pub type_name: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub rotation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
}

impl PropertyView {
    pub fn of(object: &PlacedObject) -> Self {
        let g = &object.geometry;
        let mut view = Self {
            type_name: object.type_name().to_string(),
            x: g.x,
            y: g.y,
            w: g.w,
            h: g.h,
            rotation: g.rotation,
            text: None,
            size: None,
            bold: None,
            align: None,
            fill: None,
        };
        match &object.kind {
            ObjectKind::Text(text) => {
                view.text = Some(text.text.clone());
                view.size = Some(text.size());
                view.bold = Some(text.bold);
                view.align = Some(text.align);
            }
            ObjectKind::Rect(rect) => view.fill = Some(rect.fill),
            ObjectKind::Image(_) | ObjectKind::Unknown(_) => {}
        }
        view
    }
}

/// Fields committed by the property panel. Unset fields are left alone;
/// fields that don't apply to the object's type are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PropertyEdit {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub w: Option<f64>,
    pub h: Option<f64>,
    pub rotation: Option<f64>,
    pub text: Option<String>,
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub align: Option<TextAlign>,
    pub fill: Option<bool>,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl PropertyEdit {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write the edit into `object`. Returns whether anything changed.
    ///
    /// Non-finite numbers are dropped, `w`/`h` floor at 1 and `size` is
    /// clamped to the font range.
    pub fn apply(&self, object: &mut PlacedObject) -> bool {
        let before = object.clone();
        let g = &mut object.geometry;
        if let Some(x) = finite(self.x) {
            g.x = x;
        }
        if let Some(y) = finite(self.y) {
            g.y = y;
        }
        if let Some(w) = finite(self.w) {
            g.w = w;
        }
        if let Some(h) = finite(self.h) {
            g.h = h;
        }
        if let Some(rotation) = finite(self.rotation) {
            g.rotation = rotation;
        }
        g.clamp_size();

        match &mut object.kind {
            ObjectKind::Text(text) => {
                if let Some(content) = &self.text {
                    text.text.clone_from(content);
                }
                if let Some(size) = finite(self.size) {
                    text.set_size(size);
                }
                if let Some(bold) = self.bold {
                    text.bold = bold;
                }
                if let Some(align) = self.align {
                    text.align = align;
                }
            }
            ObjectKind::Rect(rect) => {
                if let Some(fill) = self.fill {
                    rect.fill = fill;
                }
            }
            ObjectKind::Image(_) | ObjectKind::Unknown(_) => {}
        }

        *object != before
    }
}
