//! Built-in starting layouts.

use crate::media::Media;
use crate::objects::{Geometry, PlacedObject, RectObject, TextAlign, TextObject};

/// A starting layout that replaces the document's media and objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTemplate {
    /// Title and subtitle on 50x30 mm.
    Basic50x30,
    /// Centered title over a rule on 100x150 mm.
    Basic100x150,
}

impl BuiltinTemplate {
    pub fn all() -> [BuiltinTemplate; 2] {
        [BuiltinTemplate::Basic50x30, BuiltinTemplate::Basic100x150]
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|t| t.id() == id)
    }

    pub fn id(self) -> &'static str {
        match self {
            BuiltinTemplate::Basic50x30 => "t_50x30_basic",
            BuiltinTemplate::Basic100x150 => "t_100x150_basic",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinTemplate::Basic50x30 => "50x30 basic",
            BuiltinTemplate::Basic100x150 => "100x150 basic",
        }
    }

    pub fn media(self) -> Media {
        match self {
            BuiltinTemplate::Basic50x30 => Media::Label50x30,
            BuiltinTemplate::Basic100x150 => Media::Label100x150,
        }
    }

    /// Fresh objects for this template, laid out for its media width.
    pub fn objects(self) -> Vec<PlacedObject> {
        let width = self
            .media()
            .dimensions()
            .map_or(0.0, |(w, _)| f64::from(w));
        match self {
            BuiltinTemplate::Basic50x30 => vec![
                PlacedObject::text(
                    Geometry::new(10.0, 10.0, width - 20.0, 40.0),
                    TextObject::new("Title").with_size(34.0).with_bold(true),
                ),
                PlacedObject::text(
                    Geometry::new(10.0, 60.0, width - 20.0, 30.0),
                    TextObject::new("Subtitle").with_size(22.0),
                ),
            ],
            BuiltinTemplate::Basic100x150 => vec![
                PlacedObject::text(
                    Geometry::new(40.0, 40.0, width - 80.0, 60.0),
                    TextObject::new("Large Title")
                        .with_size(48.0)
                        .with_bold(true)
                        .with_align(TextAlign::Center),
                ),
                PlacedObject::rect(
                    Geometry::new(60.0, 120.0, width - 120.0, 4.0),
                    RectObject::filled(),
                ),
            ],
        }
    }
}
