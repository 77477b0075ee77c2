//! Vectorious Core Library
//!
//! Editor state for the Vectorious vector design tool: selection, undo/redo,
//! clipboard, naming and document I/O over a pluggable canvas adapter.

pub mod adapter;
pub mod clipboard;
pub mod config;
pub mod document;
pub mod drawable;
pub mod editor;
pub mod events;
pub mod factory;
pub mod history;
pub mod naming;
pub mod selection;

pub use adapter::{ActiveObject, AdapterError, CanvasAdapter, MemoryCanvas, RasterFormat, RasterOptions};
pub use clipboard::{Clipboard, ClipboardEntry};
pub use config::{ConfigError, EditorConfig};
pub use document::{DocumentIoError, DocumentMeta, DownloadSink, LoadedFile, MemorySink};
pub use drawable::{Drawable, DrawableId, DrawableKind, PropertyUpdate};
pub use editor::Editor;
pub use events::{CanvasEvent, EditorEvent};
pub use factory::ShapePreset;
pub use history::{HistoryError, HistoryManager, Snapshot};
pub use naming::{unique_name, NameMode};
pub use selection::{CommonProperties, PropertyState, SelectionKind, SelectionTracker};
