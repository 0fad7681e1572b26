//! The editing session: one open document plus everything that acts on it.

use crate::config::EditorConfig;
use crate::decode::{DecodeError, DecodeQueue, decode_bytes};
use crate::document::LabelDocument;
use crate::error::{DesignError, DesignResult};
use crate::history::History;
use crate::manipulation::{GestureOutcome, GestureSettings, GestureTarget, Manipulator, PointerEvent};
use crate::media::Media;
use crate::objects::{Geometry, ImageFormat, ImageObject, ObjectId, PlacedObject, data_url};
use crate::props::{PropertyEdit, PropertyView};
use crate::snap::Guide;
use crate::templates::BuiltinTemplate;
use crate::text_edit::{TextEditResult, TextEditState, TextKey, TextModifiers};
use crate::view::ViewTransform;

/// Where newly added images are placed.
const IMAGE_ORIGIN: (f64, f64) = (40.0, 40.0);

/// A design session.
///
/// Owns the document, the single selection, the undo history, the active
/// gesture and the inline text editor. Pointer positions passed in are in
/// screen pixels and are mapped through [`Canvas::view`].
pub struct Canvas {
    document: LabelDocument,
    selection: Option<ObjectId>,
    history: History,
    manipulator: Manipulator,
    guides: Vec<Guide>,
    view: ViewTransform,
    viewport_height: f64,
    text_edit: Option<TextEditState>,
    decoder: DecodeQueue,
    config: EditorConfig,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Canvas {
    /// Create a session with an empty document on the configured default media.
    pub fn new(config: EditorConfig) -> Self {
        let document = LabelDocument::new(config.default_media.clone());
        Self::with_document(document, config)
    }

    /// Create a session around an existing document.
    pub fn with_document(document: LabelDocument, config: EditorConfig) -> Self {
        let history = History::new(config.undo_capacity);
        Self {
            document,
            selection: None,
            history,
            manipulator: Manipulator::new(),
            guides: Vec::new(),
            view: ViewTransform::default(),
            viewport_height: f64::INFINITY,
            text_edit: None,
            decoder: DecodeQueue::new(),
            config,
        }
    }

    pub fn document(&self) -> &LabelDocument {
        &self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    pub fn selected_object(&self) -> Option<&PlacedObject> {
        self.selection.and_then(|id| self.document.get(id))
    }

    /// Select an object, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<ObjectId>) {
        self.selection = id.filter(|id| self.document.contains(*id));
    }

    /// Guides to draw for the current frame.
    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = view;
        self.relayout_editor();
    }

    /// Fit the canvas width into a container `container_width` pixels wide.
    pub fn fit_to_container(&mut self, container_width: f64) {
        self.set_view(ViewTransform::fit_width(container_width, self.document.width_dots));
    }

    /// The open inline editor, if any.
    pub fn text_edit(&self) -> Option<&TextEditState> {
        self.text_edit.as_ref()
    }

    /// Object currently hidden behind the inline editor.
    pub fn editing_object(&self) -> Option<ObjectId> {
        self.text_edit.as_ref().map(TextEditState::object_id)
    }

    fn gesture_settings(&self) -> GestureSettings {
        GestureSettings {
            snap_enabled: self.config.snap_enabled,
            snap_tolerance: self.config.snap_tolerance,
            handles: self.config.handle_tolerance(self.view.scale),
            double_tap: self.config.double_tap_window(),
        }
    }

    // --- Object operations ---

    fn add_object(&mut self, object: PlacedObject) -> ObjectId {
        self.history.record_checkpoint(&self.document);
        let id = self.document.add(object);
        self.selection = Some(id);
        log::debug!("Added {id}");
        id
    }

    /// Add placeholder text and select it.
    pub fn add_text(&mut self) -> ObjectId {
        self.add_object(PlacedObject::default_text())
    }

    /// Add a filled rectangle and select it.
    pub fn add_rect(&mut self) -> ObjectId {
        self.add_object(PlacedObject::default_rect())
    }

    /// Add an image sized from its pixel dimensions and start decoding it.
    ///
    /// The image is at most half the canvas wide and keeps its aspect ratio.
    pub fn add_image(&mut self, src: impl Into<String>, pixel_width: u32, pixel_height: u32) -> ObjectId {
        let src = src.into();
        let id = self.place_image(src.clone(), pixel_width, pixel_height);
        self.decoder.request(id, &src);
        id
    }

    /// Add an image from encoded PNG, JPEG or WebP bytes.
    ///
    /// The bytes are embedded as a `data:` URL and the pixels decoded here
    /// are kept, so no background decode is needed.
    pub fn add_image_bytes(&mut self, bytes: &[u8]) -> Result<ObjectId, DecodeError> {
        let format = ImageFormat::from_magic_bytes(bytes).ok_or(DecodeError::UnknownFormat)?;
        let handle = decode_bytes(bytes)?;
        let id = self.place_image(data_url(bytes, format), handle.width(), handle.height());
        if let Some(image) = self.document.get_mut(id).and_then(PlacedObject::as_image_mut) {
            image.handle = Some(handle);
        }
        Ok(id)
    }

    fn place_image(&mut self, src: String, pixel_width: u32, pixel_height: u32) -> ObjectId {
        let max_width = f64::from(self.document.width_dots) / 2.0;
        let w = f64::from(pixel_width.max(1)).min(max_width);
        let h = (f64::from(pixel_height) / f64::from(pixel_width.max(1)) * w).round();
        let mut geometry = Geometry::new(IMAGE_ORIGIN.0, IMAGE_ORIGIN.1, w, h);
        geometry.clamp_size();
        self.add_object(PlacedObject::image(geometry, ImageObject::new(src)))
    }

    /// Remove the selected object. Returns false when nothing is selected.
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.selection else {
            return false;
        };
        if !self.document.contains(id) {
            self.selection = None;
            return false;
        }
        self.close_editor_for(id);
        self.history.record_checkpoint(&self.document);
        self.document.remove(id);
        self.decoder.cancel(id);
        self.selection = None;
        log::debug!("Deleted {id}");
        true
    }

    /// Remove every object.
    pub fn clear(&mut self) {
        self.text_edit = None;
        self.history.record_checkpoint(&self.document);
        self.document.objects.clear();
        self.decoder.cancel_all();
        self.selection = None;
        self.guides.clear();
    }

    /// Switch media. Objects keep their positions.
    pub fn set_media(&mut self, media: Media) {
        if self.document.media == media {
            return;
        }
        self.history.record_checkpoint(&self.document);
        log::info!("Media changed to {media}");
        self.document.set_media(media);
    }

    /// Replace media and objects with a built-in layout.
    ///
    /// The canvas switches to the template's own media and the objects are
    /// laid out for that width, whatever media was active before.
    pub fn apply_template(&mut self, template: BuiltinTemplate) {
        self.text_edit = None;
        self.history.record_checkpoint(&self.document);
        self.document.set_media(template.media());
        self.document.objects = template.objects();
        self.decoder.cancel_all();
        self.selection = None;
        log::info!("Applied template {}", template.id());
    }

    /// Commit a property panel edit to the selection.
    ///
    /// Records one checkpoint, and only when something actually changes.
    pub fn apply_properties(&mut self, edit: &PropertyEdit) -> bool {
        let Some(id) = self.selection else {
            return false;
        };
        let Some(current) = self.document.get(id) else {
            return false;
        };
        let mut updated = current.clone();
        if !edit.apply(&mut updated) {
            return false;
        }
        self.history.record_checkpoint(&self.document);
        if let Some(object) = self.document.get_mut(id) {
            *object = updated;
        }
        true
    }

    /// Read-only view of the selection for the property panel.
    pub fn properties(&self) -> Option<PropertyView> {
        self.selected_object().map(PropertyView::of)
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        let done = self.history.undo(&mut self.document);
        if done {
            self.after_replace();
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.history.redo(&mut self.document);
        if done {
            self.after_replace();
        }
        done
    }

    /// Cleanup once the whole document was swapped out.
    ///
    /// The selection survives only if its object still exists.
    fn after_replace(&mut self) {
        self.text_edit = None;
        self.decoder.cancel_all();
        self.manipulator.reset();
        self.guides.clear();
        if self.selection.is_some_and(|id| !self.document.contains(id)) {
            self.selection = None;
        }
    }

    /// Replace the open document with `document`. Undoable.
    pub fn load_document(&mut self, mut document: LabelDocument) {
        self.history.record_checkpoint(&self.document);
        document.release_handles();
        self.document = document;
        self.selection = None;
        self.after_replace();
        log::info!(
            "Loaded design: {} objects on {}",
            self.document.len(),
            self.document.media
        );
    }

    /// Parse `json` and open it. On failure the session is left untouched.
    pub fn load_json(&mut self, json: &str) -> DesignResult<()> {
        let document =
            LabelDocument::from_json(json).map_err(|e| DesignError::ImportFailed(e.to_string()))?;
        self.load_document(document);
        Ok(())
    }

    /// Serialize the open document.
    pub fn to_json(&self) -> DesignResult<String> {
        Ok(self.document.to_json()?)
    }

    // --- Pointer input ---

    /// Feed a pointer event in screen coordinates.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> GestureOutcome {
        let event = match event {
            PointerEvent::Down { position, time } => {
                // A press anywhere on the canvas blurs the editor.
                self.commit_text_edit();
                PointerEvent::Down {
                    position: self.view.screen_to_doc(position),
                    time,
                }
            }
            PointerEvent::Move { position } => PointerEvent::Move {
                position: self.view.screen_to_doc(position),
            },
            PointerEvent::Up { position, time } => PointerEvent::Up {
                position: self.view.screen_to_doc(position),
                time,
            },
            PointerEvent::Cancel => PointerEvent::Cancel,
        };

        let settings = self.gesture_settings();
        let target = GestureTarget {
            document: &mut self.document,
            selection: &mut self.selection,
            history: &mut self.history,
            guides: &mut self.guides,
        };
        let outcome = self.manipulator.handle(event, target, &settings);
        if let Some(id) = outcome.edit_text {
            self.begin_text_edit(id);
        }
        outcome
    }

    // --- Inline text editing ---

    /// Open the inline editor over a text object. Returns false for other objects.
    pub fn begin_text_edit(&mut self, id: ObjectId) -> bool {
        self.commit_text_edit();
        let Some(object) = self.document.get(id) else {
            return false;
        };
        let Some(mut editor) = TextEditState::open(object, &self.view) else {
            return false;
        };
        editor.relayout(&self.view, self.viewport_height);
        self.selection = Some(id);
        self.text_edit = Some(editor);
        true
    }

    /// Route a key to the open editor. Escape and modifier+Enter commit and close it.
    pub fn handle_text_key(&mut self, key: &TextKey, modifiers: TextModifiers) -> TextEditResult {
        let Some(editor) = self.text_edit.as_mut() else {
            return TextEditResult::NotHandled;
        };
        let result = editor.handle_key(key, modifiers);
        if result == TextEditResult::ExitEdit {
            self.commit_text_edit();
        }
        result
    }

    /// Close the editor, writing its content back to the object.
    ///
    /// Returns true when the object's text changed.
    pub fn commit_text_edit(&mut self) -> bool {
        let Some(editor) = self.text_edit.take() else {
            return false;
        };
        let (id, text) = editor.finish();
        let unchanged = match self.document.get(id).and_then(PlacedObject::as_text) {
            Some(current) => current.text == text,
            None => return false,
        };
        if unchanged {
            return false;
        }
        self.history.record_checkpoint(&self.document);
        if let Some(current) = self.document.get_mut(id).and_then(PlacedObject::as_text_mut) {
            current.text = text;
        }
        log::debug!("Committed text for {id}");
        true
    }

    /// Viewport height changed (window resize, on-screen keyboard).
    pub fn viewport_resized(&mut self, viewport_height: f64) {
        self.viewport_height = viewport_height;
        self.relayout_editor();
    }

    fn relayout_editor(&mut self) {
        if let Some(editor) = self.text_edit.as_mut() {
            editor.relayout(&self.view, self.viewport_height);
        }
    }

    fn close_editor_for(&mut self, id: ObjectId) {
        if self.editing_object() == Some(id) {
            self.text_edit = None;
        }
    }

    // --- Images ---

    /// Start decodes for images that have no pixels yet.
    pub fn request_images(&mut self) -> usize {
        self.decoder.request_missing(&self.document)
    }

    /// Apply finished decodes. Returns how many objects need a redraw.
    pub fn poll_images(&mut self) -> usize {
        self.decoder.poll(&mut self.document)
    }

    /// Decode every missing image and block until done.
    pub fn load_images(&mut self) -> usize {
        self.request_images();
        self.decoder.wait(&mut self.document)
    }

    pub fn pending_images(&self) -> usize {
        self.decoder.pending_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::TextAlign;
    use kurbo::{Point, Vec2};
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn canvas() -> Canvas {
        let config = EditorConfig {
            default_media: Media::Label55x30,
            ..Default::default()
        };
        Canvas::new(config)
    }

    fn tap(canvas: &mut Canvas, x: f64, y: f64, time: Instant) -> GestureOutcome {
        let position = Point::new(x, y);
        canvas.handle_pointer(PointerEvent::Down { position, time });
        canvas.handle_pointer(PointerEvent::Up { position, time })
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ::image::RgbaImage::from_pixel(width, height, ::image::Rgba([0, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ::image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_add_text_selects_it() {
        let mut canvas = canvas();
        let id = canvas.add_text();
        assert_eq!(canvas.document().len(), 1);
        assert_eq!(canvas.selection(), Some(id));
        let text = canvas.selected_object().unwrap().as_text().unwrap();
        assert_eq!(text.text, "Text");
        assert_eq!(text.size(), 28.0);
        assert_eq!(text.align, TextAlign::Left);
        assert_eq!(canvas.history().undo_len(), 1);
    }

    #[test]
    fn test_overlapping_tap_selects_later_object() {
        let mut canvas = canvas();
        canvas.add_rect();
        canvas.apply_properties(&PropertyEdit {
            x: Some(0.0),
            y: Some(0.0),
            w: Some(100.0),
            h: Some(100.0),
            ..Default::default()
        });
        let b = canvas.add_rect();
        canvas.select(None);
        tap(&mut canvas, 60.0, 90.0, Instant::now());
        assert_eq!(canvas.selection(), Some(b));
    }

    #[test]
    fn test_delete_and_clear() {
        let mut canvas = canvas();
        canvas.add_text();
        canvas.add_rect();
        assert!(canvas.delete_selected());
        assert_eq!(canvas.document().len(), 1);
        assert_eq!(canvas.selection(), None);
        assert!(!canvas.delete_selected());

        canvas.clear();
        assert!(canvas.document().is_empty());
        assert_eq!(canvas.history().undo_len(), 4);
        assert!(canvas.undo());
        assert_eq!(canvas.document().len(), 1);
    }

    #[test]
    fn test_undo_keeps_surviving_selection() {
        let mut canvas = canvas();
        let a = canvas.add_text();
        canvas.apply_properties(&PropertyEdit {
            bold: Some(true),
            ..Default::default()
        });
        assert!(canvas.undo());
        assert_eq!(canvas.selection(), Some(a));
        assert!(!canvas.selected_object().unwrap().as_text().unwrap().bold);

        assert!(canvas.undo());
        assert_eq!(canvas.selection(), None);
        assert!(canvas.document().is_empty());

        assert!(canvas.redo());
        assert!(canvas.redo());
        assert!(canvas.document().get(a).unwrap().as_text().unwrap().bold);
        assert!(!canvas.redo());
    }

    #[test]
    fn test_apply_properties_without_change_records_nothing() {
        let mut canvas = canvas();
        canvas.add_rect();
        let before = canvas.history().undo_len();
        assert!(!canvas.apply_properties(&PropertyEdit {
            fill: Some(true),
            ..Default::default()
        }));
        assert_eq!(canvas.history().undo_len(), before);
        assert_eq!(canvas.properties().unwrap().fill, Some(true));
    }

    #[test]
    fn test_load_json_failure_leaves_session_untouched() {
        let mut canvas = canvas();
        canvas.add_text();
        let before = canvas.document().clone();
        let err = canvas.load_json("{not json").unwrap_err();
        assert!(matches!(err, DesignError::ImportFailed(_)));
        assert_eq!(canvas.document(), &before);
        assert_eq!(canvas.history().undo_len(), 1);
        assert!(canvas.selection().is_some());
    }

    #[test]
    fn test_load_json_replaces_document() {
        let mut canvas = canvas();
        canvas.add_text();
        let json = r#"{"version":1,"media":"label50x30","widthDots":400,"heightDots":240,
            "objects":[{"type":"rect","x":1,"y":2,"w":3,"h":4,"fill":false}]}"#;
        canvas.load_json(json).unwrap();
        assert_eq!(canvas.document().media, Media::Label50x30);
        assert_eq!(canvas.document().len(), 1);
        assert_eq!(canvas.selection(), None);
        assert!(canvas.undo());
        assert_eq!(canvas.document().media, Media::Label55x30);
    }

    #[test]
    fn test_template_replaces_objects() {
        let mut canvas = canvas();
        canvas.add_rect();
        canvas.apply_template(BuiltinTemplate::Basic50x30);
        assert_eq!(canvas.document().media, Media::Label50x30);
        assert_eq!(canvas.document().width_dots, 400);
        assert_eq!(canvas.document().len(), 2);
        assert_eq!(canvas.selection(), None);
    }

    #[test]
    fn test_pointer_positions_go_through_view() {
        let mut canvas = canvas();
        canvas.set_view(ViewTransform::new(Vec2::new(10.0, 10.0), 2.0));
        let id = canvas.add_rect();
        canvas.select(None);
        // Doc (30, 90) is screen (70, 190).
        tap(&mut canvas, 70.0, 190.0, Instant::now());
        assert_eq!(canvas.selection(), Some(id));
        tap(&mut canvas, 5.0, 5.0, Instant::now());
        assert_eq!(canvas.selection(), None);
    }

    #[test]
    fn test_double_tap_edit_commit() {
        let mut canvas = canvas();
        let id = canvas.add_text();
        let t0 = Instant::now();
        tap(&mut canvas, 30.0, 40.0, t0);
        assert!(canvas.text_edit().is_none());
        let outcome = tap(&mut canvas, 30.0, 40.0, t0 + Duration::from_millis(100));
        assert_eq!(outcome.edit_text, Some(id));
        assert_eq!(canvas.editing_object(), Some(id));

        let checkpoints = canvas.history().undo_len();
        canvas.handle_text_key(&TextKey::Backspace, TextModifiers::default());
        canvas.handle_text_key(&TextKey::Character("!".into()), TextModifiers::default());
        let result = canvas.handle_text_key(&TextKey::Escape, TextModifiers::default());
        assert_eq!(result, TextEditResult::ExitEdit);
        assert!(canvas.text_edit().is_none());
        assert_eq!(canvas.selected_object().unwrap().as_text().unwrap().text, "Tex!");
        assert_eq!(canvas.history().undo_len(), checkpoints + 1);
    }

    #[test]
    fn test_blur_without_change_records_nothing() {
        let mut canvas = canvas();
        let id = canvas.add_text();
        assert!(canvas.begin_text_edit(id));
        let checkpoints = canvas.history().undo_len();
        tap(&mut canvas, 400.0, 200.0, Instant::now());
        assert!(canvas.text_edit().is_none());
        assert_eq!(canvas.history().undo_len(), checkpoints);
    }

    #[test]
    fn test_editor_not_opened_for_rect() {
        let mut canvas = canvas();
        let id = canvas.add_rect();
        assert!(!canvas.begin_text_edit(id));
        assert_eq!(
            canvas.handle_text_key(&TextKey::Enter, TextModifiers::default()),
            TextEditResult::NotHandled
        );
    }

    #[test]
    fn test_editor_follows_viewport() {
        let mut canvas = canvas();
        let id = canvas.add_text();
        canvas.begin_text_edit(id);
        canvas.viewport_resized(60.0);
        let overlay = canvas.text_edit().unwrap().overlay();
        assert_eq!(overlay.top, 8.0);
    }

    #[test]
    fn test_add_image_sizes_and_decodes() {
        let mut canvas = canvas();
        let src = data_url(&png_bytes(400, 100), ImageFormat::Png);
        let id = canvas.add_image(src, 400, 100);
        let g = canvas.document().get(id).unwrap().geometry;
        assert_eq!(g, Geometry::new(40.0, 40.0, 220.0, 55.0));

        canvas.load_images();
        let image = canvas.document().get(id).unwrap().as_image().unwrap();
        assert_eq!(image.handle().map(|h| h.width()), Some(400));

        // Snapshots never hold pixels; undo/redo drops them until re-decoded.
        canvas.add_rect();
        canvas.undo();
        assert!(canvas.document().get(id).unwrap().as_image().unwrap().handle().is_none());
        canvas.load_images();
        assert!(canvas.document().get(id).unwrap().as_image().unwrap().handle().is_some());
    }

    #[test]
    fn test_add_image_bytes_embeds_and_keeps_pixels() {
        let mut canvas = canvas();
        let bytes = png_bytes(100, 50);
        let id = canvas.add_image_bytes(&bytes).unwrap();
        assert_eq!(canvas.pending_images(), 0);

        let object = canvas.document().get(id).unwrap();
        assert_eq!(object.geometry, Geometry::new(40.0, 40.0, 100.0, 50.0));
        let image = object.as_image().unwrap();
        assert_eq!(image.src, data_url(&bytes, ImageFormat::Png));
        assert_eq!(image.handle().map(|h| (h.width(), h.height())), Some((100, 50)));
        assert_eq!(canvas.history().undo_len(), 1);
    }

    #[test]
    fn test_add_image_bytes_rejects_unknown_data() {
        let mut canvas = canvas();
        assert!(matches!(
            canvas.add_image_bytes(b"not an image"),
            Err(DecodeError::UnknownFormat)
        ));
        assert!(canvas.document().is_empty());
        assert_eq!(canvas.history().undo_len(), 0);
    }
}
