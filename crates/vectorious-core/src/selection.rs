//! Normalized selection tracking and property inspection.
//!
//! The canvas library's selection events can race with programmatic changes
//! (group dissolution, deletion), so besides reacting to events the tracker
//! re-derives the selection from the adapter on a periodic deadline and on
//! short one-shot re-checks. The host drives both by calling `poll` with the
//! current time.

use crate::adapter::{ActiveObject, CanvasAdapter};
use crate::drawable::{Drawable, DrawableId};
use kurbo::Point;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};
#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Numeric tolerance under which two values count as equal.
const MIXED_TOLERANCE: f64 = 0.01;

/// How many drawables are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Empty,
    Single,
    Multi,
}

/// Mirrors the adapter's active selection as an ordered list of drawable IDs.
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    selected: Vec<DrawableId>,
    reconcile_interval: Duration,
    next_reconcile: Option<Instant>,
    /// Earliest queued one-shot re-check.
    pending_check: Option<Instant>,
}

impl SelectionTracker {
    pub fn new(reconcile_interval: Duration) -> Self {
        Self {
            selected: Vec::new(),
            reconcile_interval,
            next_reconcile: None,
            pending_check: None,
        }
    }

    pub fn current(&self) -> &[DrawableId] {
        &self.selected
    }

    pub fn kind(&self) -> SelectionKind {
        match self.selected.len() {
            0 => SelectionKind::Empty,
            1 => SelectionKind::Single,
            _ => SelectionKind::Multi,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Adopt the selection carried by a selection-created/updated event.
    ///
    /// A grouping target expands to its members; without a target the event's
    /// `selected` list is used. Returns whether the selection changed.
    pub fn apply_event<A: CanvasAdapter>(
        &mut self,
        canvas: &A,
        target: Option<&ActiveObject>,
        selected: &[DrawableId],
    ) -> bool {
        let ids = match target {
            Some(active) => active.members(),
            None => selected.to_vec(),
        };
        self.replace(existing(canvas, ids))
    }

    /// Empty the selection. Returns whether it changed.
    pub fn clear(&mut self) -> bool {
        self.replace(Vec::new())
    }

    /// Re-derive the selection from the adapter's authoritative active object.
    /// Returns whether the cached selection drifted.
    pub fn sync<A: CanvasAdapter>(&mut self, canvas: &A) -> bool {
        let ids = canvas.active_object().map(|active| active.members()).unwrap_or_default();
        let changed = self.replace(existing(canvas, ids));
        if changed {
            log::debug!("Selection resynced: {} selected", self.selected.len());
        }
        changed
    }

    /// Drop selected drawables that no longer exist.
    pub fn retain_existing<A: CanvasAdapter>(&mut self, canvas: &A) -> bool {
        let ids = existing(canvas, self.selected.clone());
        self.replace(ids)
    }

    /// Start the periodic reconciliation clock.
    pub fn start(&mut self, now: Instant) {
        self.next_reconcile = Some(now + self.reconcile_interval);
    }

    /// Queue a one-shot re-check `delay` from `now`. Only the earliest
    /// queued re-check is kept.
    pub fn schedule_check(&mut self, now: Instant, delay: Duration) {
        let deadline = now + delay;
        self.pending_check = Some(self.pending_check.map_or(deadline, |queued| queued.min(deadline)));
    }

    /// Earliest pending deadline, for hosts that sleep between ticks.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_check.into_iter().chain(self.next_reconcile).min()
    }

    /// Run every check that is due at `now`. Returns whether the selection changed.
    pub fn poll<A: CanvasAdapter>(&mut self, canvas: &A, now: Instant) -> bool {
        let mut due = false;
        if self.pending_check.is_some_and(|deadline| deadline <= now) {
            self.pending_check = None;
            due = true;
        }

        if self.next_reconcile.is_some_and(|deadline| deadline <= now) {
            self.next_reconcile = Some(now + self.reconcile_interval);
            due = true;
        }

        due && self.sync(canvas)
    }

    /// Drop the selection and every timer.
    pub fn reset(&mut self) {
        self.selected.clear();
        self.next_reconcile = None;
        self.pending_check = None;
    }

    fn replace(&mut self, ids: Vec<DrawableId>) -> bool {
        if self.selected == ids {
            return false;
        }
        self.selected = ids;
        true
    }
}

fn existing<A: CanvasAdapter>(canvas: &A, ids: Vec<DrawableId>) -> Vec<DrawableId> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if canvas.get(id).is_some() && !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

/// Top-left origin of a group of drawables (minimum `left`, minimum `top`).
pub fn selection_origin<'a>(drawables: impl IntoIterator<Item = &'a Drawable>) -> Option<Point> {
    drawables.into_iter().fold(None, |acc, d| {
        let p = d.position();
        Some(match acc {
            None => p,
            Some(min) => Point::new(min.x.min(p.x), min.y.min(p.y)),
        })
    })
}

/// Round to two decimals for display.
pub fn round_to_two(value: f64) -> f64 {
    ((value + f64::EPSILON) * 100.0).round() / 100.0
}

/// A property value shared by every selected drawable, or `Mixed`.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyState<T> {
    Uniform(T),
    Mixed,
}

impl<T> PropertyState<T> {
    pub fn uniform(&self) -> Option<&T> {
        match self {
            PropertyState::Uniform(value) => Some(value),
            PropertyState::Mixed => None,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, PropertyState::Mixed)
    }
}

/// Inspector values for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonProperties {
    /// Left of the drawable, or of the group origin for several.
    pub left: f64,
    pub top: f64,
    pub scale_x: PropertyState<f64>,
    pub scale_y: PropertyState<f64>,
    pub angle: PropertyState<f64>,
    pub fill: PropertyState<Option<String>>,
    pub stroke: PropertyState<Option<String>>,
    pub stroke_width: PropertyState<f64>,
    pub opacity: PropertyState<f64>,
}

impl CommonProperties {
    /// Inspect the given drawables. `None` when the slice is empty.
    pub fn of(drawables: &[&Drawable]) -> Option<Self> {
        let first = *drawables.first()?;
        let origin = selection_origin(drawables.iter().copied())?;

        let numeric = |value: fn(&Drawable) -> f64| {
            let reference = round_to_two(value(first));
            if drawables
                .iter()
                .all(|d| (reference - round_to_two(value(d))).abs() <= MIXED_TOLERANCE)
            {
                PropertyState::Uniform(reference)
            } else {
                PropertyState::Mixed
            }
        };
        let text = |value: fn(&Drawable) -> &Option<String>| {
            let reference = value(first);
            if drawables.iter().all(|d| value(d) == reference) {
                PropertyState::Uniform(reference.clone())
            } else {
                PropertyState::Mixed
            }
        };

        Some(Self {
            left: round_to_two(origin.x),
            top: round_to_two(origin.y),
            scale_x: numeric(|d| d.scale_x),
            scale_y: numeric(|d| d.scale_y),
            angle: numeric(|d| d.angle),
            fill: text(|d| &d.fill),
            stroke: text(|d| &d.stroke),
            stroke_width: numeric(|d| d.stroke_width),
            opacity: numeric(|d| d.opacity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryCanvas;
    use crate::drawable::DrawableKind;

    fn rect_at(left: f64, top: f64) -> Drawable {
        Drawable::new(DrawableKind::Rect { width: 10.0, height: 10.0 }).with_position(left, top)
    }

    fn canvas_with(n: usize) -> (MemoryCanvas, Vec<DrawableId>) {
        let mut canvas = MemoryCanvas::new();
        let ids = (0..n)
            .map(|i| {
                let d = rect_at(i as f64 * 20.0, 0.0);
                let id = d.id();
                canvas.add(d);
                id
            })
            .collect();
        (canvas, ids)
    }

    #[test]
    fn test_event_expands_grouping() {
        let (canvas, ids) = canvas_with(3);
        let mut tracker = SelectionTracker::new(Duration::from_secs(2));

        let target = ActiveObject::Selection(vec![ids[0], ids[2]]);
        assert!(tracker.apply_event(&canvas, Some(&target), &[]));
        assert_eq!(tracker.current(), &[ids[0], ids[2]]);
        assert_eq!(tracker.kind(), SelectionKind::Multi);

        assert!(tracker.apply_event(&canvas, None, &[ids[1]]));
        assert_eq!(tracker.kind(), SelectionKind::Single);

        assert!(tracker.apply_event(&canvas, None, &[]));
        assert_eq!(tracker.kind(), SelectionKind::Empty);
    }

    #[test]
    fn test_selection_filters_missing_drawables() {
        let (mut canvas, ids) = canvas_with(2);
        let mut tracker = SelectionTracker::new(Duration::from_secs(2));
        canvas.remove(ids[1]);

        tracker.apply_event(&canvas, None, &[ids[0], ids[1], ids[0]]);
        assert_eq!(tracker.current(), &[ids[0]]);
    }

    #[test]
    fn test_sync_follows_adapter() {
        let (mut canvas, ids) = canvas_with(2);
        let mut tracker = SelectionTracker::new(Duration::from_secs(2));

        canvas.set_active_object(ActiveObject::Selection(ids.clone()));
        assert!(tracker.sync(&canvas));
        assert_eq!(tracker.current(), ids.as_slice());
        assert!(!tracker.sync(&canvas));

        canvas.discard_active_object();
        assert!(tracker.sync(&canvas));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_poll_runs_due_checks_only() {
        let (mut canvas, ids) = canvas_with(1);
        let mut tracker = SelectionTracker::new(Duration::from_secs(2));
        let start = Instant::now();
        tracker.start(start);
        tracker.schedule_check(start, Duration::from_millis(100));
        canvas.set_active_object(ActiveObject::Drawable(ids[0]));

        assert!(!tracker.poll(&canvas, start + Duration::from_millis(50)));
        assert!(tracker.is_empty());

        assert!(tracker.poll(&canvas, start + Duration::from_millis(100)));
        assert_eq!(tracker.current(), &[ids[0]]);
        assert_eq!(tracker.next_deadline(), Some(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_periodic_reconcile_rearms() {
        let (mut canvas, ids) = canvas_with(1);
        let mut tracker = SelectionTracker::new(Duration::from_secs(2));
        let start = Instant::now();
        tracker.start(start);

        canvas.set_active_object(ActiveObject::Drawable(ids[0]));
        let first = start + Duration::from_secs(2);
        assert!(tracker.poll(&canvas, first));
        assert_eq!(tracker.next_deadline(), Some(first + Duration::from_secs(2)));

        canvas.discard_active_object();
        assert!(!tracker.poll(&canvas, first + Duration::from_secs(1)));
        assert!(tracker.poll(&canvas, first + Duration::from_secs(2)));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_repeated_checks_collapse_to_earliest() {
        let (mut canvas, ids) = canvas_with(1);
        let mut tracker = SelectionTracker::new(Duration::from_secs(2));
        let start = Instant::now();
        tracker.start(start);
        for i in 0..100 {
            tracker.schedule_check(start + Duration::from_millis(10 * i), Duration::from_millis(100));
        }
        assert_eq!(tracker.next_deadline(), Some(start + Duration::from_millis(100)));

        canvas.set_active_object(ActiveObject::Drawable(ids[0]));
        assert!(tracker.poll(&canvas, start + Duration::from_millis(100)));
        assert_eq!(tracker.next_deadline(), Some(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_reset_drops_timers() {
        let mut tracker = SelectionTracker::new(Duration::from_secs(2));
        let now = Instant::now();
        tracker.start(now);
        tracker.schedule_check(now, Duration::from_millis(50));

        tracker.reset();
        assert_eq!(tracker.next_deadline(), None);
    }

    #[test]
    fn test_round_to_two() {
        assert_eq!(round_to_two(1.005), 1.01);
        assert_eq!(round_to_two(2.344), 2.34);
        assert_eq!(round_to_two(-0.5), -0.5);
    }

    #[test]
    fn test_common_properties_single() {
        let rect = rect_at(10.123, 4.0).with_fill("#fff");
        let props = CommonProperties::of(&[&rect]).unwrap();

        assert_eq!(props.left, 10.12);
        assert_eq!(props.fill, PropertyState::Uniform(Some("#fff".to_string())));
        assert_eq!(props.opacity, PropertyState::Uniform(1.0));
        assert!(CommonProperties::of(&[]).is_none());
    }

    #[test]
    fn test_common_properties_mixed() {
        let a = rect_at(30.0, 5.0).with_fill("#fff");
        let mut b = rect_at(10.0, 15.0).with_fill("#000");
        b.opacity = 1.004;
        b.angle = 45.0;

        let props = CommonProperties::of(&[&a, &b]).unwrap();
        assert_eq!((props.left, props.top), (10.0, 5.0));
        assert!(props.fill.is_mixed());
        assert!(props.angle.is_mixed());
        assert_eq!(props.opacity.uniform(), Some(&1.0));
        assert_eq!(props.stroke, PropertyState::Uniform(None));
    }
}
