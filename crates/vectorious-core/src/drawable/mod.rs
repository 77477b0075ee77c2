//! Drawable definitions shared by the editor and canvas adapters.
//!
//! The JSON shape of a [`Drawable`] follows the canvas library's native object
//! serialization: a `type` tag, camelCase style attributes and the geometry
//! fields of the concrete kind, all at the same level.

mod color;

pub use color::parse_color;

use kurbo::{BezPath, Point, Rect, Shape as _, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for drawables.
pub type DrawableId = Uuid;

/// Geometry of a drawable, tagged by its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DrawableKind {
    Rect { width: f64, height: f64 },
    Circle { radius: f64 },
    Triangle { width: f64, height: f64 },
    Ellipse { rx: f64, ry: f64 },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Closed polygon; points are relative to the drawable's origin.
    Polygon { points: Vec<Point> },
    /// SVG path data.
    Path { path: String },
    /// Children are positioned relative to the group's `left`/`top`.
    Group { objects: Vec<Drawable> },
}

impl DrawableKind {
    /// The type tag used for per-type name scoping and serialization.
    pub fn type_tag(&self) -> &'static str {
        match self {
            DrawableKind::Rect { .. } => "rect",
            DrawableKind::Circle { .. } => "circle",
            DrawableKind::Triangle { .. } => "triangle",
            DrawableKind::Ellipse { .. } => "ellipse",
            DrawableKind::Line { .. } => "line",
            DrawableKind::Polygon { .. } => "polygon",
            DrawableKind::Path { .. } => "path",
            DrawableKind::Group { .. } => "group",
        }
    }

    /// Unscaled size of the geometry.
    pub fn natural_size(&self) -> Size {
        match self {
            DrawableKind::Rect { width, height } | DrawableKind::Triangle { width, height } => {
                Size::new(*width, *height)
            }
            DrawableKind::Circle { radius } => Size::new(radius * 2.0, radius * 2.0),
            DrawableKind::Ellipse { rx, ry } => Size::new(rx * 2.0, ry * 2.0),
            DrawableKind::Line { x1, y1, x2, y2 } => Size::new((x2 - x1).abs(), (y2 - y1).abs()),
            DrawableKind::Polygon { points } => points_extent(points).size(),
            DrawableKind::Path { path } => match BezPath::from_svg(path) {
                Ok(bez) => bez.bounding_box().size(),
                Err(e) => {
                    log::debug!("Unparseable path data: {}", e);
                    Size::ZERO
                }
            },
            DrawableKind::Group { objects } => objects
                .iter()
                .map(Drawable::bounds)
                .reduce(|a, b| a.union(b))
                .map(|r| r.size())
                .unwrap_or(Size::ZERO),
        }
    }
}

fn points_extent(points: &[Point]) -> Rect {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p))
}

fn one() -> f64 {
    1.0
}

/// One visual primitive or group managed by a canvas adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawable {
    #[serde(default = "Uuid::new_v4")]
    pub(crate) id: DrawableId,
    /// Human-readable display name, unique per type within a document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    /// Rotation in degrees.
    #[serde(default)]
    pub angle: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default = "one")]
    pub stroke_width: f64,
    /// 0.0 = fully transparent, 1.0 = fully opaque.
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(flatten)]
    pub kind: DrawableKind,
}

impl Drawable {
    /// Create a drawable at the origin with default style.
    pub fn new(kind: DrawableKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
            kind,
        }
    }

    pub fn with_position(mut self, left: f64, top: f64) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn with_fill(mut self, fill: &str) -> Self {
        self.fill = Some(fill.to_string());
        self
    }

    pub fn with_stroke(mut self, stroke: &str, width: f64) -> Self {
        self.stroke = Some(stroke.to_string());
        self.stroke_width = width;
        self
    }

    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> DrawableId {
        self.id
    }

    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, DrawableKind::Group { .. })
    }

    /// Children of a group, empty for every other kind.
    pub fn children(&self) -> &[Drawable] {
        match &self.kind {
            DrawableKind::Group { objects } => objects,
            _ => &[],
        }
    }

    /// Top-left position in world coordinates.
    pub fn position(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn set_position(&mut self, position: Point) {
        self.left = position.x;
        self.top = position.y;
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.left += delta.x;
        self.top += delta.y;
    }

    /// Unscaled size of the geometry.
    pub fn natural_size(&self) -> Size {
        self.kind.natural_size()
    }

    /// Axis-aligned bounds including scale. Rotation is not applied.
    pub fn bounds(&self) -> Rect {
        let size = self.natural_size();
        Rect::from_origin_size(
            self.position(),
            Size::new(size.width * self.scale_x, size.height * self.scale_y),
        )
    }

    /// Regenerate this drawable's ID (and its children's) with fresh identifiers.
    /// Used when cloning so the copy never aliases the source.
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
        if let DrawableKind::Group { objects } = &mut self.kind {
            for child in objects {
                child.regenerate_id();
            }
        }
    }

    /// Apply a single property edit.
    pub fn apply(&mut self, update: &PropertyUpdate) {
        match update {
            PropertyUpdate::Left(v) => self.left = *v,
            PropertyUpdate::Top(v) => self.top = *v,
            PropertyUpdate::ScaleX(v) => self.scale_x = *v,
            PropertyUpdate::ScaleY(v) => self.scale_y = *v,
            PropertyUpdate::Angle(v) => self.angle = *v,
            PropertyUpdate::Fill(v) => self.fill = v.clone(),
            PropertyUpdate::Stroke(v) => self.stroke = v.clone(),
            PropertyUpdate::StrokeWidth(v) => self.stroke_width = *v,
            PropertyUpdate::Opacity(v) => self.opacity = v.clamp(0.0, 1.0),
        }
    }
}

/// An edit to one inspector property of the selected drawables.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyUpdate {
    Left(f64),
    Top(f64),
    ScaleX(f64),
    ScaleY(f64),
    Angle(f64),
    Fill(Option<String>),
    Stroke(Option<String>),
    StrokeWidth(f64),
    Opacity(f64),
}

impl PropertyUpdate {
    /// Whether this edit moves drawables rather than restyling them.
    pub fn is_position(&self) -> bool {
        matches!(self, PropertyUpdate::Left(_) | PropertyUpdate::Top(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_flat_with_type_tag() {
        let rect = Drawable::new(DrawableKind::Rect { width: 100.0, height: 50.0 })
            .with_position(10.0, 20.0)
            .with_fill("#3498db")
            .with_name("Rectangle");

        let value = serde_json::to_value(&rect).unwrap();
        assert_eq!(value["type"], "rect");
        assert_eq!(value["name"], "Rectangle");
        assert_eq!(value["width"], 100.0);
        assert_eq!(value["scaleX"], 1.0);
        assert_eq!(value["strokeWidth"], 1.0);
        assert!(value.get("stroke").is_none());
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let value = json!({ "type": "circle", "radius": 5.0, "left": 3.0, "extra": "ignored" });
        let circle: Drawable = serde_json::from_value(value).unwrap();

        assert_eq!(circle.type_tag(), "circle");
        assert_eq!(circle.left, 3.0);
        assert_eq!(circle.scale_x, 1.0);
        assert_eq!(circle.opacity, 1.0);
        assert!(circle.name.is_none());
        assert_eq!(circle.natural_size(), Size::new(10.0, 10.0));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let value = json!({ "type": "sprocket", "teeth": 12 });
        assert!(serde_json::from_value::<Drawable>(value).is_err());
    }

    #[test]
    fn test_bounds_include_scale() {
        let rect = Drawable::new(DrawableKind::Rect { width: 10.0, height: 20.0 })
            .with_position(5.0, 5.0)
            .with_scale(2.0, 3.0);
        assert_eq!(rect.bounds(), Rect::new(5.0, 5.0, 25.0, 65.0));
    }

    #[test]
    fn test_polygon_and_path_sizes() {
        let polygon = Drawable::new(DrawableKind::Polygon {
            points: vec![Point::new(-40.0, 0.0), Point::new(0.0, -40.0), Point::new(40.0, 40.0)],
        });
        assert_eq!(polygon.natural_size(), Size::new(80.0, 80.0));

        let path = Drawable::new(DrawableKind::Path { path: "M0,0 L10,0 L10,5 Z".to_string() });
        assert_eq!(path.natural_size(), Size::new(10.0, 5.0));

        let broken = Drawable::new(DrawableKind::Path { path: "not a path".to_string() });
        assert_eq!(broken.natural_size(), Size::ZERO);
    }

    #[test]
    fn test_group_size_spans_children() {
        let group = Drawable::new(DrawableKind::Group {
            objects: vec![
                Drawable::new(DrawableKind::Rect { width: 10.0, height: 10.0 }),
                Drawable::new(DrawableKind::Rect { width: 10.0, height: 10.0 }).with_position(20.0, 5.0),
            ],
        });
        assert_eq!(group.natural_size(), Size::new(30.0, 15.0));
    }

    #[test]
    fn test_regenerate_id_is_recursive() {
        let mut group = Drawable::new(DrawableKind::Group {
            objects: vec![Drawable::new(DrawableKind::Circle { radius: 1.0 })],
        });
        let before = group.id();
        let child_before = group.children()[0].id();

        group.regenerate_id();

        assert_ne!(group.id(), before);
        assert_ne!(group.children()[0].id(), child_before);
    }

    #[test]
    fn test_apply_updates() {
        let mut rect = Drawable::new(DrawableKind::Rect { width: 1.0, height: 1.0 });
        rect.apply(&PropertyUpdate::Fill(Some("#fff".to_string())));
        rect.apply(&PropertyUpdate::Opacity(4.0));
        rect.apply(&PropertyUpdate::Left(12.0));

        assert_eq!(rect.fill.as_deref(), Some("#fff"));
        assert_eq!(rect.opacity, 1.0);
        assert_eq!(rect.left, 12.0);
        assert!(PropertyUpdate::Top(0.0).is_position());
        assert!(!PropertyUpdate::Angle(0.0).is_position());
    }
}
