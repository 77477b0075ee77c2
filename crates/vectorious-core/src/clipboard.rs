//! Copy/paste buffer preserving the relative layout of copied drawables.

use crate::adapter::CanvasAdapter;
use crate::drawable::Drawable;
use crate::naming::default_name;
use crate::selection::selection_origin;
use futures::future::join_all;
use kurbo::{Point, Vec2};

/// A cloned drawable waiting to be pasted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    pub drawable: Drawable,
    /// Position relative to the top-left of the copied group.
    pub relative_offset: Vec2,
    /// Name the pasted copy is derived from.
    pub original_name: String,
}

/// Pasted drawable together with the name its copy-name is derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct PastedDrawable {
    pub drawable: Drawable,
    pub original_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    entries: Vec<ClipboardEntry>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace the contents with clones of `sources`. Returns the entry count.
    pub async fn copy<A: CanvasAdapter>(&mut self, canvas: &A, sources: &[&Drawable]) -> usize {
        self.entries = Self::capture(canvas, sources).await;
        self.entries.len()
    }

    /// Clone every source concurrently, keeping input order.
    ///
    /// Sources that fail to clone are logged and left out.
    pub async fn capture<A: CanvasAdapter>(canvas: &A, sources: &[&Drawable]) -> Vec<ClipboardEntry> {
        let Some(origin) = selection_origin(sources.iter().copied()) else {
            return Vec::new();
        };

        let clones = join_all(sources.iter().map(|source| canvas.clone_drawable(source))).await;

        sources
            .iter()
            .zip(clones)
            .filter_map(|(source, result)| match result {
                Ok(drawable) => Some(ClipboardEntry {
                    drawable,
                    relative_offset: source.position() - origin,
                    original_name: source
                        .name
                        .clone()
                        .filter(|name| !name.is_empty())
                        .unwrap_or_else(|| default_name(source.type_tag(), 0)),
                }),
                Err(e) => {
                    log::warn!("Failed to clone {} for copy: {}", source.type_tag(), e);
                    None
                }
            })
            .collect()
    }

    /// Clone every entry again and place it at `target + relative_offset`.
    ///
    /// The clones are not added to the canvas and keep their source names.
    pub async fn materialize<A: CanvasAdapter>(&self, canvas: &A, target: Point) -> Vec<PastedDrawable> {
        let clones = join_all(self.entries.iter().map(|entry| canvas.clone_drawable(&entry.drawable))).await;

        self.entries
            .iter()
            .zip(clones)
            .filter_map(|(entry, result)| match result {
                Ok(mut drawable) => {
                    drawable.set_position(target + entry.relative_offset);
                    Some(PastedDrawable { drawable, original_name: entry.original_name.clone() })
                }
                Err(e) => {
                    log::warn!("Failed to clone {} for paste: {}", entry.original_name, e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryCanvas;
    use crate::drawable::DrawableKind;
    use futures::executor::block_on;

    fn rect(name: &str, left: f64, top: f64) -> Drawable {
        Drawable::new(DrawableKind::Rect { width: 10.0, height: 10.0 })
            .with_position(left, top)
            .with_name(name)
    }

    #[test]
    fn test_capture_records_offsets_in_order() {
        let canvas = MemoryCanvas::new();
        let a = rect("A", 50.0, 80.0);
        let b = rect("B", 20.0, 100.0);

        let entries = block_on(Clipboard::capture(&canvas, &[&a, &b]));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].original_name, "A");
        assert_eq!(entries[0].relative_offset, Vec2::new(30.0, 0.0));
        assert_eq!(entries[1].relative_offset, Vec2::new(0.0, 20.0));
        assert_ne!(entries[0].drawable.id(), a.id());
    }

    #[test]
    fn test_unnamed_source_gets_default_name() {
        let canvas = MemoryCanvas::new();
        let circle = Drawable::new(DrawableKind::Circle { radius: 3.0 });

        let entries = block_on(Clipboard::capture(&canvas, &[&circle]));
        assert_eq!(entries[0].original_name, "Circle 1");
    }

    #[test]
    fn test_copy_replaces_contents() {
        let canvas = MemoryCanvas::new();
        let mut clipboard = Clipboard::new();
        let a = rect("A", 0.0, 0.0);
        let b = rect("B", 0.0, 0.0);

        assert_eq!(block_on(clipboard.copy(&canvas, &[&a, &b])), 2);
        assert_eq!(block_on(clipboard.copy(&canvas, &[&a])), 1);
        assert_eq!(block_on(clipboard.copy(&canvas, &[])), 0);
        assert!(clipboard.is_empty());
    }

    #[test]
    fn test_materialize_repositions_copies() {
        let canvas = MemoryCanvas::new();
        let mut clipboard = Clipboard::new();
        let a = rect("A", 50.0, 80.0);
        let b = rect("B", 20.0, 100.0);
        block_on(clipboard.copy(&canvas, &[&a, &b]));

        let pasted = block_on(clipboard.materialize(&canvas, Point::new(200.0, 300.0)));

        assert_eq!(pasted[0].drawable.position(), Point::new(230.0, 300.0));
        assert_eq!(pasted[1].drawable.position(), Point::new(200.0, 320.0));
        assert_eq!(pasted[1].original_name, "B");
        assert_ne!(pasted[0].drawable.id(), clipboard.entries()[0].drawable.id());
    }
}
