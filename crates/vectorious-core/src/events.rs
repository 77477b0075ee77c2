//! Events flowing into and out of the editor.

use crate::adapter::ActiveObject;
use crate::drawable::DrawableId;
use kurbo::Point;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Notifications raised by the canvas library, forwarded by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// A selection was created.
    SelectionCreated { target: Option<ActiveObject>, selected: Vec<DrawableId> },
    /// The existing selection changed.
    SelectionUpdated { target: Option<ActiveObject>, selected: Vec<DrawableId> },
    /// The selection was cleared.
    SelectionCleared,
    /// The selection is about to be cleared.
    BeforeSelectionCleared,
    /// A drawable was transformed or restyled by direct manipulation.
    ObjectModified { target: DrawableId },
    ObjectAdded { target: DrawableId },
    ObjectRemoved { target: DrawableId },
    /// Pointer pressed. `pointer` is in canvas-element (screen) coordinates;
    /// `target` is the drawable under the pointer, if any.
    PointerDown { pointer: Option<Point>, target: Option<DrawableId> },
    /// Pointer released.
    PointerUp,
}

/// Notifications published by the editor to its UI collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The normalized selection changed.
    SelectionChanged { selected: Vec<DrawableId> },
    /// The set of drawables in the document changed.
    ObjectsChanged { count: usize },
    /// Undo or redo availability may have changed.
    HistoryChanged { can_undo: bool, can_redo: bool },
    /// Zoom changed; value is the rounded percentage.
    ZoomChanged { percent: u32 },
    TitleChanged { title: String },
    BackgroundChanged { color: String },
    /// The clipboard contents changed.
    ClipboardChanged { entries: usize },
}

/// Fan-out of [`EditorEvent`]s to any number of subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<EditorEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<EditorEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver an event to every live subscriber, dropping disconnected ones.
    pub fn publish(&mut self, event: EditorEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
