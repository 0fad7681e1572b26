//! labelkit Render Library
//!
//! CPU renderers for label designs. [`InteractiveRenderer`] draws the
//! editing canvas with selection chrome and guides; [`ExportRenderer`]
//! produces the print raster. Both share the same object drawing code.

mod draw;
mod error;
mod export;
mod interactive;
mod raster;
mod renderer;
mod text;
mod wrap;

pub use draw::{INK, draw_object};
pub use error::{RenderError, RenderResult};
pub use export::{DEFAULT_EXPORT_MARGIN, DEFAULT_MAX_EXPORT_HEIGHT, ExportRenderer};
pub use interactive::InteractiveRenderer;
pub use raster::{Surface, to_transform};
pub use renderer::{RenderContext, Renderer};
pub use text::{FallbackMeasurer, FontSet, TextMeasure};
pub use wrap::wrap_text;
