//! labelkit Core Library
//!
//! Platform-agnostic data model and editing logic for the label designer:
//! documents and placed objects, undo history, hit-testing, snapping,
//! pointer gestures, inline text editing, and the design library.

pub mod canvas;
pub mod config;
pub mod decode;
pub mod document;
pub mod error;
pub mod geometry;
pub mod history;
pub mod manipulation;
pub mod media;
pub mod objects;
pub mod print;
pub mod props;
pub mod snap;
pub mod storage;
pub mod templates;
pub mod text_edit;
pub mod view;

pub use canvas::Canvas;
pub use config::EditorConfig;
pub use decode::{DecodeError, DecodeQueue};
pub use document::{FORMAT_VERSION, LabelDocument, MAX_CANVAS_DOTS};
pub use error::{DesignError, DesignResult};
pub use geometry::{Corner, HandleKind, HandleTolerance};
pub use history::History;
pub use manipulation::{GestureOutcome, Manipulator, PointerEvent};
pub use media::Media;
pub use objects::{
    Geometry, ImageObject, ObjectId, ObjectKind, PlacedObject, RectObject, TextAlign, TextObject,
};
pub use print::{BatchItem, DirectorySink, ExportedLabel, LabelSink, SinkError, SubmissionGuard, plan_batch};
pub use props::{PropertyEdit, PropertyView};
pub use snap::{Guide, SnapResult};
pub use storage::{DesignSummary, FileStorage, Library, MemoryStorage, Storage, StorageError, StoredDesign};
pub use templates::BuiltinTemplate;
pub use text_edit::{TextEditResult, TextEditState, TextKey, TextModifiers};
pub use view::ViewTransform;
