//! Editor controller tying the canvas adapter to history, selection,
//! clipboard and document I/O.

use crate::adapter::{ActiveObject, CanvasAdapter, RasterFormat, RasterOptions};
use crate::clipboard::Clipboard;
use crate::config::EditorConfig;
use crate::document::{self, DocumentIoError, DocumentIoResult, DocumentMeta, DownloadSink, LoadedFile};
use crate::drawable::{Drawable, DrawableId, PropertyUpdate};
use crate::events::{CanvasEvent, EditorEvent, EventBus};
use crate::factory::ShapePreset;
use crate::history::{HistoryManager, HistoryResult};
use crate::naming::{unique_name, NameMode};
use crate::selection::{selection_origin, CommonProperties, SelectionKind, SelectionTracker};
use kurbo::{Point, Vec2};
use serde_json::Value;
use std::sync::mpsc::Receiver;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// State and operations of one editing session over a canvas adapter.
///
/// Every operation is a no-op while no adapter is attached.
pub struct Editor<A: CanvasAdapter> {
    canvas: Option<A>,
    config: EditorConfig,
    meta: DocumentMeta,
    /// Title and background of a fresh document.
    defaults: DocumentMeta,
    history: HistoryManager,
    selection: SelectionTracker,
    clipboard: Clipboard,
    /// Paste target, updated on every pointer-down.
    last_pointer: Point,
    object_ids: Vec<DrawableId>,
    events: EventBus,
}

impl<A: CanvasAdapter> Editor<A> {
    pub fn new(config: EditorConfig) -> Self {
        let defaults = DocumentMeta::new(config.default_title.clone(), config.default_background.clone());
        Self {
            canvas: None,
            meta: defaults.clone(),
            history: HistoryManager::new(config.max_undo_steps, defaults.clone()),
            selection: SelectionTracker::new(config.reconcile_interval()),
            clipboard: Clipboard::new(),
            last_pointer: config.paste_origin,
            object_ids: Vec::new(),
            events: EventBus::new(),
            defaults,
            config,
        }
    }

    /// Take ownership of an adapter and start a session on it.
    ///
    /// The adapter's current content becomes the pristine baseline.
    pub fn attach(&mut self, mut canvas: A) {
        self.reset_session();
        self.meta = self.defaults.clone();
        if canvas.background_color().is_empty() {
            canvas.set_background_color(&self.meta.background_color);
        } else {
            self.meta.background_color = canvas.background_color().to_string();
        }

        self.history.save_state(&canvas, &self.meta);
        self.selection.sync(&canvas);
        self.selection.start(Instant::now());
        self.canvas = Some(canvas);
        self.refresh_objects();
        log::info!("Canvas attached ({} objects)", self.object_ids.len());

        self.notify_document();
    }

    /// End the session and hand the adapter back.
    pub fn detach(&mut self) -> Option<A> {
        let canvas = self.canvas.take();
        self.reset_session();
        self.object_ids.clear();
        canvas
    }

    pub fn is_attached(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn canvas(&self) -> Option<&A> {
        self.canvas.as_ref()
    }

    /// Direct adapter access for hosts applying library-side changes.
    pub fn canvas_mut(&mut self) -> Option<&mut A> {
        self.canvas.as_mut()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    pub fn title(&self) -> &str {
        &self.meta.title
    }

    pub fn background_color(&self) -> &str {
        &self.meta.background_color
    }

    /// Receive [`EditorEvent`]s from now on.
    pub fn subscribe(&mut self) -> Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// IDs of every drawable, back to front.
    pub fn object_ids(&self) -> &[DrawableId] {
        &self.object_ids
    }

    pub fn selected(&self) -> &[DrawableId] {
        self.selection.current()
    }

    pub fn selection_kind(&self) -> SelectionKind {
        self.selection.kind()
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn is_multi_selection(&self) -> bool {
        self.selection.kind() == SelectionKind::Multi
    }

    pub fn selected_drawables(&self) -> Vec<&Drawable> {
        match &self.canvas {
            Some(canvas) => self.selection.current().iter().filter_map(|id| canvas.get(*id)).collect(),
            None => Vec::new(),
        }
    }

    /// Inspector values for the current selection.
    pub fn common_properties(&self) -> Option<CommonProperties> {
        CommonProperties::of(&self.selected_drawables())
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn last_pointer(&self) -> Point {
        self.last_pointer
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Current zoom as a rounded percentage.
    pub fn current_zoom(&self) -> u32 {
        self.canvas
            .as_ref()
            .map_or(100, |canvas| (canvas.zoom() * 100.0).round() as u32)
    }

    /// Run due selection re-checks. Returns whether the selection changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(canvas) = &self.canvas else {
            return false;
        };
        let changed = self.selection.poll(canvas, now);
        if changed {
            self.notify_selection();
        }
        changed
    }

    /// Earliest instant at which [`Self::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.selection.next_deadline()
    }

    /// React to a canvas library notification.
    pub fn handle_event(&mut self, event: CanvasEvent) {
        self.handle_event_at(event, Instant::now());
    }

    /// React to a canvas library notification observed at `now`.
    pub fn handle_event_at(&mut self, event: CanvasEvent, now: Instant) {
        let Some(canvas) = &self.canvas else {
            return;
        };

        match event {
            CanvasEvent::SelectionCreated { target, selected } | CanvasEvent::SelectionUpdated { target, selected } => {
                self.selection.apply_event(canvas, target.as_ref(), &selected);
                self.selection.schedule_check(now, self.config.selection_recheck());
                self.notify_selection();
            }
            CanvasEvent::SelectionCleared => {
                if self.selection.clear() {
                    self.notify_selection();
                }
            }
            CanvasEvent::BeforeSelectionCleared => {
                self.selection.schedule_check(now, self.config.before_clear_recheck());
            }
            CanvasEvent::ObjectModified { .. } => {
                self.notify_selection();
            }
            CanvasEvent::ObjectAdded { .. } | CanvasEvent::ObjectRemoved { .. } => {
                self.selection.retain_existing(canvas);
                if let Some(canvas) = self.canvas.as_mut() {
                    canvas.render_all();
                }
                self.refresh_objects();
                self.notify_objects();
                self.notify_selection();
            }
            CanvasEvent::PointerDown { pointer, target } => {
                if let Some(pointer) = pointer {
                    self.last_pointer = canvas.screen_to_world(pointer);
                }
                if target.is_some() && self.history.begin_interaction(canvas, &self.meta) {
                    self.notify_history();
                }
            }
            CanvasEvent::PointerUp => {
                self.history.end_interaction();
                self.selection.schedule_check(now, self.config.pointer_up_recheck());
            }
        }
    }

    /// Name for a drawable of `type_tag` derived from `base_name`.
    pub fn generate_unique_name(&self, base_name: &str, type_tag: &str, mode: NameMode) -> String {
        match &self.canvas {
            Some(canvas) => unique_name(&canvas.objects(), base_name, type_tag, mode),
            None => base_name.to_string(),
        }
    }

    /// Add a preset shape, name it and make it the active selection.
    pub fn add_shape(&mut self, preset: ShapePreset) -> Option<DrawableId> {
        if !self.mutation_allowed("add shape") {
            return None;
        }
        let canvas = self.canvas.as_mut()?;
        self.history.save_state(canvas, &self.meta);

        let mut drawable = preset.build();
        drawable.name = Some(unique_name(&canvas.objects(), preset.base_name(), drawable.type_tag(), NameMode::Fresh));
        let id = drawable.id();
        canvas.add(drawable);
        canvas.set_active_object(ActiveObject::Drawable(id));
        canvas.render_all();
        self.selection.sync(canvas);

        self.refresh_objects();
        self.notify_document();
        Some(id)
    }

    /// Apply a property edit to every selected drawable.
    ///
    /// Moving a multi-selection shifts the whole group so its origin lands on
    /// the new coordinate.
    pub fn update_property(&mut self, update: PropertyUpdate) -> bool {
        if self.selection.is_empty() || !self.mutation_allowed("update property") {
            return false;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        self.history.save_state(canvas, &self.meta);

        let ids = self.selection.current().to_vec();
        if update.is_position() && ids.len() > 1 {
            let Some(origin) = selection_origin(ids.iter().filter_map(|id| canvas.get(*id))) else {
                return false;
            };
            let delta = match update {
                PropertyUpdate::Left(left) => Vec2::new(left - origin.x, 0.0),
                PropertyUpdate::Top(top) => Vec2::new(0.0, top - origin.y),
                _ => Vec2::ZERO,
            };
            for id in &ids {
                if let Some(drawable) = canvas.get_mut(*id) {
                    drawable.translate(delta);
                }
            }
        } else {
            for id in &ids {
                match canvas.get_mut(*id) {
                    Some(drawable) => drawable.apply(&update),
                    None => log::warn!("Selected drawable {} no longer exists", id),
                }
            }
        }
        canvas.render_all();

        self.notify_history();
        self.notify_selection();
        true
    }

    /// Remove the selected drawables as one undoable step.
    pub fn delete_selected(&mut self) -> usize {
        if self.selection.is_empty() || !self.mutation_allowed("delete") {
            return 0;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return 0;
        };
        self.history.save_state(canvas, &self.meta);

        let removed = self
            .selection
            .current()
            .iter()
            .filter(|id| canvas.remove(**id).is_some())
            .count();
        canvas.discard_active_object();
        canvas.render_all();
        self.selection.clear();

        self.refresh_objects();
        self.notify_document();
        removed
    }

    /// Select every drawable.
    pub fn select_all(&mut self) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let ids: Vec<DrawableId> = canvas.objects().iter().map(|d| d.id()).collect();
        match ids.len() {
            0 => return,
            1 => canvas.set_active_object(ActiveObject::Drawable(ids[0])),
            _ => canvas.set_active_object(ActiveObject::Selection(ids)),
        }
        canvas.render_all();
        self.selection.sync(canvas);
        self.notify_selection();
    }

    /// Copy the selection to the clipboard. Returns the number of entries.
    pub async fn copy_selected(&mut self) -> usize {
        let Some(canvas) = &self.canvas else {
            return 0;
        };
        if self.selection.is_empty() {
            return 0;
        }

        let sources: Vec<&Drawable> = self.selection.current().iter().filter_map(|id| canvas.get(*id)).collect();
        let copied = self.clipboard.copy(canvas, &sources).await;
        log::info!("Copied {} of {} objects", copied, sources.len());

        self.events.publish(EditorEvent::ClipboardChanged { entries: copied });
        copied
    }

    /// Copy, then delete the selection if anything was copied.
    pub async fn cut_selected(&mut self) -> usize {
        if !self.mutation_allowed("cut") {
            return 0;
        }
        let copied = self.copy_selected().await;
        if copied > 0 {
            self.delete_selected();
        }
        copied
    }

    /// Paste at the last pointer-down position.
    pub async fn paste(&mut self) -> Vec<DrawableId> {
        let target = self.last_pointer;
        self.paste_at(target).await
    }

    /// Paste the clipboard with its top-left at `target` as one undoable step.
    pub async fn paste_at(&mut self, target: Point) -> Vec<DrawableId> {
        if self.clipboard.is_empty() || !self.mutation_allowed("paste") {
            return Vec::new();
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return Vec::new();
        };
        self.history.save_state(canvas, &self.meta);

        let pasted = self.clipboard.materialize(canvas, target).await;
        let mut ids = Vec::with_capacity(pasted.len());
        for item in pasted {
            let mut drawable = item.drawable;
            drawable.name = Some(unique_name(
                &canvas.objects(),
                &item.original_name,
                drawable.type_tag(),
                NameMode::Copy,
            ));
            ids.push(drawable.id());
            canvas.add(drawable);
        }

        match ids.as_slice() {
            [] => {}
            [only] => canvas.set_active_object(ActiveObject::Drawable(*only)),
            _ => canvas.set_active_object(ActiveObject::Selection(ids.clone())),
        }
        if !ids.is_empty() {
            canvas.render_all();
        }
        self.selection.sync(canvas);

        self.refresh_objects();
        self.notify_document();
        ids
    }

    pub async fn undo(&mut self) -> HistoryResult<bool> {
        let Some(canvas) = self.canvas.as_mut() else {
            return Ok(false);
        };
        let result = self.history.undo(canvas, &mut self.meta).await;
        self.after_restore();
        result
    }

    pub async fn redo(&mut self) -> HistoryResult<bool> {
        let Some(canvas) = self.canvas.as_mut() else {
            return Ok(false);
        };
        let result = self.history.redo(canvas, &mut self.meta).await;
        self.after_restore();
        result
    }

    pub fn zoom_in(&mut self) {
        let (step, max) = (self.config.zoom_step, self.config.max_zoom);
        self.apply_zoom(|zoom| (zoom * step).min(max));
    }

    pub fn zoom_out(&mut self) {
        let (step, min) = (self.config.zoom_step, self.config.min_zoom);
        self.apply_zoom(|zoom| (zoom / step).max(min));
    }

    pub fn reset_zoom(&mut self) {
        self.apply_zoom(|_| 1.0);
    }

    /// Change the document background as one undoable step.
    pub fn set_background_color(&mut self, color: &str) {
        if !self.mutation_allowed("set background") {
            return;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        self.history.save_state(canvas, &self.meta);
        canvas.set_background_color(color);
        canvas.render_all();
        self.meta.background_color = color.to_string();

        self.notify_history();
        self.events
            .publish(EditorEvent::BackgroundChanged { color: self.meta.background_color.clone() });
    }

    /// Rename the document. An empty title restores the default.
    pub fn set_title(&mut self, title: &str) {
        self.meta.title = if title.is_empty() {
            self.defaults.title.clone()
        } else {
            title.to_string()
        };
        self.events.publish(EditorEvent::TitleChanged { title: self.meta.title.clone() });
    }

    /// Empty the document as one undoable step.
    ///
    /// Drawables, title, background, selection, clipboard and view are reset;
    /// history is kept.
    pub fn clear_canvas(&mut self) {
        if !self.mutation_allowed("clear") {
            return;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        self.history.save_state(canvas, &self.meta);
        Self::reset_document(canvas, &mut self.meta, &self.defaults);
        self.selection.clear();
        self.clipboard.clear();

        self.refresh_objects();
        self.notify_document();
        self.notify_view();
    }

    /// Start over with an empty document and a fresh history.
    pub fn new_document(&mut self) {
        if !self.mutation_allowed("new document") {
            return;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        Self::reset_document(canvas, &mut self.meta, &self.defaults);
        self.selection.clear();
        self.clipboard.clear();
        self.history.reset();
        self.history.save_state(canvas, &self.meta);
        log::info!("New document");

        self.refresh_objects();
        self.notify_document();
        self.notify_view();
    }

    /// Serialize the document with names, title and background.
    pub fn export_document(&self) -> Option<Value> {
        document::export_document(self.canvas.as_ref()?, &self.meta)
    }

    /// Replace the document with an exported payload.
    pub async fn import_document(&mut self, data: &Value) -> bool {
        if !self.mutation_allowed("import") {
            return false;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        let imported = document::import_document(canvas, &mut self.meta, data, &self.defaults).await;
        self.after_restore();
        imported
    }

    /// Download the document as pretty JSON, named after the title by default.
    pub fn save_to_file(&self, sink: &mut dyn DownloadSink, filename: Option<&str>) -> DocumentIoResult<String> {
        let Some(canvas) = &self.canvas else {
            return Err(DocumentIoError::Serialization("no canvas attached".to_string()));
        };
        document::save_to_file(canvas, &self.meta, sink, filename)
    }

    /// Import a user-picked JSON file.
    pub async fn load_from_file(&mut self, file: &LoadedFile) -> DocumentIoResult<()> {
        if !self.mutation_allowed("load") {
            return Err(DocumentIoError::ImportFailed);
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return Err(DocumentIoError::ImportFailed);
        };
        let result = document::load_from_file(canvas, &mut self.meta, file, &self.defaults).await;
        self.after_restore();
        result
    }

    /// Download a PNG at the canvas resolution.
    pub fn export_png(&self, sink: &mut dyn DownloadSink, filename: Option<&str>) -> Option<String> {
        let filename = self.raster_filename(filename, ".png");
        self.export_raster(sink, &filename, RasterOptions::default())
    }

    /// Download a JPEG, at the configured quality unless overridden.
    pub fn export_jpeg(&self, sink: &mut dyn DownloadSink, filename: Option<&str>, quality: Option<f32>) -> Option<String> {
        let filename = self.raster_filename(filename, ".jpg");
        let options = RasterOptions {
            format: RasterFormat::Jpeg,
            quality: quality.unwrap_or(self.config.jpeg_quality),
            multiplier: 1.0,
        };
        self.export_raster(sink, &filename, options)
    }

    /// Download a PNG at the configured high-resolution multiplier.
    pub fn export_high_res_png(&self, sink: &mut dyn DownloadSink, filename: Option<&str>) -> Option<String> {
        let filename = self.raster_filename(filename, "-hires.png");
        let options = RasterOptions {
            multiplier: self.config.high_res_multiplier,
            ..RasterOptions::default()
        };
        self.export_raster(sink, &filename, options)
    }

    fn export_raster(&self, sink: &mut dyn DownloadSink, filename: &str, options: RasterOptions) -> Option<String> {
        document::export_raster(self.canvas.as_ref()?, sink, filename, &options)
    }

    fn raster_filename(&self, filename: Option<&str>, suffix: &str) -> String {
        filename.map_or_else(|| format!("{}{}", self.meta.slug(), suffix), str::to_string)
    }

    fn mutation_allowed(&self, operation: &str) -> bool {
        if self.history.is_replaying() {
            log::warn!("Rejected {} while a snapshot is being restored", operation);
            return false;
        }
        true
    }

    fn apply_zoom(&mut self, next: impl FnOnce(f64) -> f64) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let zoom = next(canvas.zoom());
        canvas.set_zoom(zoom);
        canvas.render_all();
        self.notify_view();
    }

    fn reset_document(canvas: &mut A, meta: &mut DocumentMeta, defaults: &DocumentMeta) {
        canvas.clear();
        *meta = defaults.clone();
        canvas.set_background_color(&meta.background_color);
        canvas.discard_active_object();
        canvas.set_zoom(1.0);
        canvas.reset_viewport();
        canvas.render_all();
    }

    /// Re-derive mirrored state after the document was replaced wholesale.
    fn after_restore(&mut self) {
        if let Some(canvas) = &self.canvas {
            self.selection.sync(canvas);
        }
        self.refresh_objects();
        self.notify_document();
    }

    fn reset_session(&mut self) {
        self.history.reset();
        self.selection.reset();
        self.clipboard.clear();
        self.last_pointer = self.config.paste_origin;
    }

    fn refresh_objects(&mut self) {
        self.object_ids = match &self.canvas {
            Some(canvas) => canvas.objects().iter().map(|d| d.id()).collect(),
            None => Vec::new(),
        };
    }

    fn notify_selection(&mut self) {
        let selected = self.selection.current().to_vec();
        self.events.publish(EditorEvent::SelectionChanged { selected });
    }

    fn notify_history(&mut self) {
        self.events.publish(EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    fn notify_objects(&mut self) {
        self.events.publish(EditorEvent::ObjectsChanged { count: self.object_ids.len() });
    }

    fn notify_view(&mut self) {
        let percent = self.current_zoom();
        self.events.publish(EditorEvent::ZoomChanged { percent });
    }

    /// Everything a wholesale document change may have touched.
    fn notify_document(&mut self) {
        self.notify_objects();
        self.notify_selection();
        self.notify_history();
        self.events.publish(EditorEvent::TitleChanged { title: self.meta.title.clone() });
        self.events
            .publish(EditorEvent::BackgroundChanged { color: self.meta.background_color.clone() });
        self.events.publish(EditorEvent::ClipboardChanged { entries: self.clipboard.len() });
    }
}

impl<A: CanvasAdapter> Default for Editor<A> {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
