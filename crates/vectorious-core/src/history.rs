//! Undo/redo over whole-document snapshots.

use crate::adapter::CanvasAdapter;
use crate::document::DocumentMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use thiserror::Error;

/// History errors.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to capture snapshot: {0}")]
    Capture(String),
    #[error("Failed to restore snapshot: {0}")]
    Restore(String),
}

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Everything needed to rebuild a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// The adapter's serialization of every drawable, names included.
    pub canvas: Value,
    pub title: String,
    pub background_color: String,
}

impl Snapshot {
    /// Capture the current document.
    pub fn capture<A: CanvasAdapter>(canvas: &A, meta: &DocumentMeta) -> HistoryResult<Self> {
        let canvas = canvas.to_json(&["name"]).map_err(|e| HistoryError::Capture(e.to_string()))?;
        Ok(Self {
            canvas,
            title: meta.title.clone(),
            background_color: meta.background_color.clone(),
        })
    }
}

/// Sets the replaying flag for its lifetime. Dropping an unfinished restore
/// future drops the guard too, so the flag cannot stay set.
struct ReplayGuard<'a>(&'a mut bool);

impl<'a> ReplayGuard<'a> {
    fn engage(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for ReplayGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

/// Bounded undo/redo stacks plus the flags of an editing session.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_steps: usize,
    /// Title and background used when a snapshot carries empty values.
    fallback: DocumentMeta,
    /// Set while a snapshot is being restored.
    replaying: bool,
    /// Whether anything beyond the pristine baseline has been recorded.
    user_changed: bool,
    /// Whether the current press-drag-release cycle already saved.
    interaction_saved: bool,
}

impl HistoryManager {
    pub fn new(max_steps: usize, fallback: DocumentMeta) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_steps + 1),
            redo_stack: Vec::new(),
            max_steps,
            fallback,
            replaying: false,
            user_changed: false,
            interaction_saved: false,
        }
    }

    /// Record the current document before a mutation.
    ///
    /// Returns `false` without touching the stacks while replaying or when the
    /// document cannot be serialized.
    pub fn save_state<A: CanvasAdapter>(&mut self, canvas: &A, meta: &DocumentMeta) -> bool {
        if self.replaying {
            return false;
        }

        let snapshot = match Snapshot::capture(canvas, meta) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("{}", e);
                return false;
            }
        };

        self.push_undo(snapshot);
        if self.undo_stack.len() > 1 {
            self.user_changed = true;
        }
        self.redo_stack.clear();
        true
    }

    /// Step back one snapshot.
    ///
    /// `Ok(false)` when there is nothing to undo. On a restore failure the
    /// popped snapshot is discarded.
    pub async fn undo<A: CanvasAdapter>(&mut self, canvas: &mut A, meta: &mut DocumentMeta) -> HistoryResult<bool> {
        if !self.can_undo() || self.replaying {
            return Ok(false);
        }

        let current = Snapshot::capture(canvas, meta)?;
        let Some(snapshot) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        self.redo_stack.push(current);

        if self.undo_stack.len() <= 1 {
            self.user_changed = false;
        }

        self.restore_state(canvas, meta, &snapshot).await?;
        log::info!("Undo ({} undo, {} redo)", self.undo_stack.len(), self.redo_stack.len());
        Ok(true)
    }

    /// Re-apply the most recently undone snapshot.
    pub async fn redo<A: CanvasAdapter>(&mut self, canvas: &mut A, meta: &mut DocumentMeta) -> HistoryResult<bool> {
        if !self.can_redo() || self.replaying {
            return Ok(false);
        }

        let current = Snapshot::capture(canvas, meta)?;
        let Some(snapshot) = self.redo_stack.pop() else {
            return Ok(false);
        };
        self.push_undo(current);
        self.user_changed = true;

        self.restore_state(canvas, meta, &snapshot).await?;
        log::info!("Redo ({} undo, {} redo)", self.undo_stack.len(), self.redo_stack.len());
        Ok(true)
    }

    /// Replace the live document with a snapshot.
    pub async fn restore_state<A: CanvasAdapter>(
        &mut self,
        canvas: &mut A,
        meta: &mut DocumentMeta,
        snapshot: &Snapshot,
    ) -> HistoryResult<()> {
        let result = {
            let _replay = ReplayGuard::engage(&mut self.replaying);
            canvas.clear();
            canvas.load_from_json(&snapshot.canvas).await
        };

        if let Err(e) = result {
            log::error!("Failed to restore snapshot: {}", e);
            canvas.set_background_color(&meta.background_color);
            return Err(HistoryError::Restore(e.to_string()));
        }

        meta.restore(
            Some(snapshot.title.as_str()),
            Some(snapshot.background_color.as_str()),
            &self.fallback,
        );
        canvas.set_background_color(&meta.background_color);
        canvas.render_all();
        Ok(())
    }

    /// Save once at the start of a pointer interaction on a drawable.
    pub fn begin_interaction<A: CanvasAdapter>(&mut self, canvas: &A, meta: &DocumentMeta) -> bool {
        if self.interaction_saved || self.replaying {
            return false;
        }
        let saved = self.save_state(canvas, meta);
        self.interaction_saved = saved;
        saved
    }

    /// Close the press-drag-release cycle.
    pub fn end_interaction(&mut self) {
        self.interaction_saved = false;
    }

    /// Forget every snapshot and flag.
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.replaying = false;
        self.user_changed = false;
        self.interaction_saved = false;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() && self.user_changed
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn has_user_changes(&self) -> bool {
        self.user_changed
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryCanvas;
    use crate::drawable::{Drawable, DrawableKind};
    use futures::executor::block_on;
    use proptest::prelude::*;
    use serde_json::json;

    fn setup() -> (MemoryCanvas, DocumentMeta, HistoryManager) {
        let meta = DocumentMeta::new("Vectorious Design", "#525252");
        let history = HistoryManager::new(50, meta.clone());
        (MemoryCanvas::new(), meta, history)
    }

    fn add_rect(canvas: &mut MemoryCanvas, name: &str) {
        canvas.add(Drawable::new(DrawableKind::Rect { width: 10.0, height: 10.0 }).with_name(name));
    }

    fn names(canvas: &MemoryCanvas) -> Vec<String> {
        canvas.objects().iter().filter_map(|d| d.name.clone()).collect()
    }

    #[test]
    fn test_baseline_does_not_enable_undo() {
        let (canvas, meta, mut history) = setup();
        assert!(history.save_state(&canvas, &meta));
        assert_eq!(history.undo_len(), 1);
        assert!(!history.can_undo());

        assert!(history.save_state(&canvas, &meta));
        assert!(history.can_undo());
    }

    #[test]
    fn test_undo_then_redo_restores_document() {
        let (mut canvas, mut meta, mut history) = setup();
        history.save_state(&canvas, &meta);

        history.save_state(&canvas, &meta);
        add_rect(&mut canvas, "Rectangle");
        history.save_state(&canvas, &meta);
        add_rect(&mut canvas, "Rectangle (2)");
        meta.title = "Poster".to_string();

        assert!(block_on(history.undo(&mut canvas, &mut meta)).unwrap());
        assert_eq!(names(&canvas), vec!["Rectangle"]);
        assert_eq!(meta.title, "Vectorious Design");
        assert!(history.can_redo());

        assert!(block_on(history.redo(&mut canvas, &mut meta)).unwrap());
        assert_eq!(names(&canvas), vec!["Rectangle", "Rectangle (2)"]);
        assert_eq!(meta.title, "Poster");
        assert_eq!(canvas.background_color(), "#525252");
        assert!(!history.can_redo());
        assert!(!history.is_replaying());
    }

    #[test]
    fn test_undo_to_baseline_clears_change_flag() {
        let (mut canvas, mut meta, mut history) = setup();
        history.save_state(&canvas, &meta);
        history.save_state(&canvas, &meta);
        add_rect(&mut canvas, "Rectangle");

        assert!(block_on(history.undo(&mut canvas, &mut meta)).unwrap());
        assert!(canvas.is_empty());
        assert!(!history.can_undo());
        assert!(!block_on(history.undo(&mut canvas, &mut meta)).unwrap());
    }

    #[test]
    fn test_redo_always_counts_as_change() {
        let (mut canvas, mut meta, mut history) = setup();
        history.save_state(&canvas, &meta);
        history.save_state(&canvas, &meta);
        add_rect(&mut canvas, "Rectangle");
        block_on(history.undo(&mut canvas, &mut meta)).unwrap();

        block_on(history.redo(&mut canvas, &mut meta)).unwrap();
        assert!(history.has_user_changes());
        assert!(history.can_undo());
    }

    #[test]
    fn test_save_clears_redo() {
        let (mut canvas, mut meta, mut history) = setup();
        history.save_state(&canvas, &meta);
        history.save_state(&canvas, &meta);
        add_rect(&mut canvas, "Rectangle");
        block_on(history.undo(&mut canvas, &mut meta)).unwrap();
        assert_eq!(history.redo_len(), 1);

        history.save_state(&canvas, &meta);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let (mut canvas, meta, mut history) = setup();
        for i in 0..51 {
            history.save_state(&canvas, &meta);
            add_rect(&mut canvas, &format!("R{}", i));
        }
        assert_eq!(history.undo_len(), 50);

        // The oldest surviving snapshot already holds the first drawable.
        let oldest = history.undo_stack.front().unwrap();
        assert_eq!(oldest.canvas["objects"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_restore_resets_replaying() {
        let (mut canvas, mut meta, mut history) = setup();
        let corrupt = Snapshot {
            canvas: json!({ "objects": [{ "type": "sprocket" }] }),
            title: String::new(),
            background_color: String::new(),
        };

        canvas.set_background_color("#123456");
        meta.background_color = "#123456".to_string();

        let result = block_on(history.restore_state(&mut canvas, &mut meta, &corrupt));
        assert!(matches!(result, Err(HistoryError::Restore(_))));
        assert!(!history.is_replaying());
        assert_eq!(canvas.background_color(), "#123456");
    }

    #[test]
    fn test_restore_falls_back_to_defaults() {
        let (mut canvas, mut meta, mut history) = setup();
        meta.title = "Old".to_string();
        let snapshot = Snapshot {
            canvas: json!({ "objects": [] }),
            title: String::new(),
            background_color: String::new(),
        };

        block_on(history.restore_state(&mut canvas, &mut meta, &snapshot)).unwrap();
        assert_eq!(meta.title, "Vectorious Design");
        assert_eq!(canvas.background_color(), "#525252");
    }

    #[test]
    fn test_interaction_saves_once_per_press() {
        let (canvas, meta, mut history) = setup();
        assert!(history.begin_interaction(&canvas, &meta));
        assert!(!history.begin_interaction(&canvas, &meta));
        assert_eq!(history.undo_len(), 1);

        history.end_interaction();
        assert!(history.begin_interaction(&canvas, &meta));
        assert_eq!(history.undo_len(), 2);
    }

    proptest! {
        #[test]
        fn prop_undo_depth_is_bounded(mutations in 0usize..120) {
            let (mut canvas, meta, mut history) = setup();
            history.save_state(&canvas, &meta);
            for i in 0..mutations {
                history.save_state(&canvas, &meta);
                add_rect(&mut canvas, &format!("R{}", i));
            }

            prop_assert_eq!(history.undo_len(), (mutations + 1).min(50));
            prop_assert_eq!(history.can_undo(), history.undo_len() >= 2);
            prop_assert_eq!(history.redo_len(), 0);
        }
    }
}
