//! Rectangles.

use serde::{Deserialize, Serialize};

/// Fields specific to a rectangle object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RectObject {
    /// Filled when true, outlined otherwise.
    #[serde(default)]
    pub fill: bool,
}

impl RectObject {
    pub fn filled() -> Self {
        Self { fill: true }
    }

    pub fn outlined() -> Self {
        Self { fill: false }
    }
}
