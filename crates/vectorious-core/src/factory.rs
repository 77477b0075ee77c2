//! Preset shapes offered by the toolbar.

use crate::drawable::{Drawable, DrawableKind};
use kurbo::Point;
use std::f64::consts::PI;

const HEART_PATH: &str = "M12,21.35l-1.45-1.32C5.4,15.36,2,12.28,2,8.5 C2,5.42,4.42,3,7.5,3c1.74,0,3.41,0.81,4.5,2.09C13.09,3.81,14.76,3,16.5,3 C19.58,3,22,5.42,22,8.5c0,3.78-3.4,6.86-8.55,11.54L12,21.35z";

/// A preset drawable with fixed default geometry and style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapePreset {
    Rectangle,
    Circle,
    Triangle,
    Line,
    Hexagon,
    Star,
    Arrow,
    Ellipse,
    Diamond,
    Heart,
    QuarteredCircle,
}

impl ShapePreset {
    pub const ALL: [ShapePreset; 11] = [
        ShapePreset::Rectangle,
        ShapePreset::Circle,
        ShapePreset::Triangle,
        ShapePreset::Line,
        ShapePreset::Hexagon,
        ShapePreset::Star,
        ShapePreset::Arrow,
        ShapePreset::Ellipse,
        ShapePreset::Diamond,
        ShapePreset::Heart,
        ShapePreset::QuarteredCircle,
    ];

    /// Base display name handed to the naming algorithm.
    pub fn base_name(&self) -> &'static str {
        match self {
            ShapePreset::Rectangle => "Rectangle",
            ShapePreset::Circle => "Circle",
            ShapePreset::Triangle => "Triangle",
            ShapePreset::Line => "Line",
            ShapePreset::Hexagon => "Hexagon",
            ShapePreset::Star => "Star",
            ShapePreset::Arrow => "Arrow",
            ShapePreset::Ellipse => "Ellipse",
            ShapePreset::Diamond => "Diamond",
            ShapePreset::Heart => "Heart",
            ShapePreset::QuarteredCircle => "Quartered Circle",
        }
    }

    /// Build an unnamed drawable for this preset.
    pub fn build(&self) -> Drawable {
        match self {
            ShapePreset::Rectangle => Drawable::new(DrawableKind::Rect { width: 100.0, height: 100.0 })
                .with_position(100.0, 100.0)
                .with_fill("#3498db")
                .with_stroke("#2c3e50", 2.0),
            ShapePreset::Circle => Drawable::new(DrawableKind::Circle { radius: 50.0 })
                .with_position(150.0, 150.0)
                .with_fill("#e74c3c")
                .with_stroke("#c0392b", 2.0),
            ShapePreset::Triangle => Drawable::new(DrawableKind::Triangle { width: 100.0, height: 100.0 })
                .with_position(200.0, 200.0)
                .with_fill("#f39c12")
                .with_stroke("#e67e22", 2.0),
            ShapePreset::Line => Drawable::new(DrawableKind::Line { x1: 50.0, y1: 100.0, x2: 200.0, y2: 100.0 })
                .with_position(250.0, 250.0)
                .with_stroke("#9b59b6", 5.0),
            ShapePreset::Hexagon => polygon(regular_polygon(6, 50.0))
                .with_position(300.0, 100.0)
                .with_fill("#16a085")
                .with_stroke("#0f6b5c", 2.0),
            ShapePreset::Star => polygon(star(5, 50.0, 20.0))
                .with_position(350.0, 150.0)
                .with_fill("#f1c40f")
                .with_stroke("#d4ac0d", 2.0),
            ShapePreset::Arrow => polygon(vec![
                Point::new(40.0, 0.0),
                Point::new(20.0, -15.0),
                Point::new(20.0, -8.0),
                Point::new(-40.0, -8.0),
                Point::new(-40.0, 8.0),
                Point::new(20.0, 8.0),
                Point::new(20.0, 15.0),
            ])
            .with_position(400.0, 200.0)
            .with_fill("#e67e22")
            .with_stroke("#d35400", 2.0),
            ShapePreset::Ellipse => Drawable::new(DrawableKind::Ellipse { rx: 60.0, ry: 30.0 })
                .with_position(100.0, 300.0)
                .with_fill("#8e44ad")
                .with_stroke("#6c3483", 2.0),
            ShapePreset::Diamond => polygon(vec![
                Point::new(0.0, -40.0),
                Point::new(40.0, 0.0),
                Point::new(0.0, 40.0),
                Point::new(-40.0, 0.0),
            ])
            .with_position(200.0, 300.0)
            .with_fill("#e91e63")
            .with_stroke("#ad1457", 2.0),
            ShapePreset::Heart => Drawable::new(DrawableKind::Path { path: HEART_PATH.to_string() })
                .with_position(300.0, 300.0)
                .with_fill("#e74c3c")
                .with_stroke("#c0392b", 1.0)
                .with_scale(3.0, 3.0),
            ShapePreset::QuarteredCircle => quartered_circle(50.0).with_position(400.0, 300.0),
        }
    }
}

fn polygon(points: Vec<Point>) -> Drawable {
    Drawable::new(DrawableKind::Polygon { points })
}

fn regular_polygon(sides: usize, radius: f64) -> Vec<Point> {
    (0..sides)
        .map(|i| {
            let angle = i as f64 * 2.0 * PI / sides as f64;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Alternating outer and inner vertices, first spike pointing up.
fn star(spikes: usize, outer: f64, inner: f64) -> Vec<Point> {
    (0..spikes * 2)
        .map(|i| {
            let angle = i as f64 * PI / spikes as f64 - PI / 2.0;
            let radius = if i % 2 == 0 { outer } else { inner };
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// A transparent circle split by a horizontal and a vertical diameter.
fn quartered_circle(radius: f64) -> Drawable {
    const STROKE: &str = "#2c3e50";
    let ring = Drawable::new(DrawableKind::Circle { radius })
        .with_position(-radius, -radius)
        .with_fill("transparent")
        .with_stroke(STROKE, 2.0);
    let horizontal = Drawable::new(DrawableKind::Line { x1: -radius, y1: 0.0, x2: radius, y2: 0.0 })
        .with_position(-radius, 0.0)
        .with_stroke(STROKE, 2.0);
    let vertical = Drawable::new(DrawableKind::Line { x1: 0.0, y1: -radius, x2: 0.0, y2: radius })
        .with_position(0.0, -radius)
        .with_stroke(STROKE, 2.0);

    Drawable::new(DrawableKind::Group { objects: vec![ring, horizontal, vertical] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;

    #[test]
    fn test_presets_have_expected_types() {
        let tags: Vec<_> = ShapePreset::ALL.iter().map(|p| p.build().type_tag()).collect();
        assert_eq!(
            tags,
            vec![
                "rect", "circle", "triangle", "line", "polygon", "polygon", "polygon", "ellipse", "polygon", "path",
                "group"
            ]
        );
        assert!(ShapePreset::ALL.iter().all(|p| p.build().name.is_none()));
    }

    #[test]
    fn test_rectangle_constants() {
        let rect = ShapePreset::Rectangle.build();
        assert_eq!(rect.position(), Point::new(100.0, 100.0));
        assert_eq!(rect.natural_size(), Size::new(100.0, 100.0));
        assert_eq!(rect.fill.as_deref(), Some("#3498db"));
        assert_eq!(rect.stroke.as_deref(), Some("#2c3e50"));
        assert_eq!(rect.stroke_width, 2.0);
    }

    #[test]
    fn test_line_has_no_fill() {
        let line = ShapePreset::Line.build();
        assert!(line.fill.is_none());
        assert_eq!(line.stroke_width, 5.0);
    }

    #[test]
    fn test_polygon_vertex_counts() {
        let count = |preset: ShapePreset| match preset.build().kind {
            DrawableKind::Polygon { points } => points.len(),
            _ => 0,
        };
        assert_eq!(count(ShapePreset::Hexagon), 6);
        assert_eq!(count(ShapePreset::Star), 10);
        assert_eq!(count(ShapePreset::Arrow), 7);
        assert_eq!(count(ShapePreset::Diamond), 4);
    }

    #[test]
    fn test_star_points_up() {
        let points = star(5, 50.0, 20.0);
        assert!(points[0].x.abs() < 1e-9);
        assert!((points[0].y + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_quartered_circle_spans_diameter() {
        let group = ShapePreset::QuarteredCircle.build();
        assert_eq!(group.children().len(), 3);
        assert_eq!(group.natural_size(), Size::new(100.0, 100.0));
        assert_eq!(ShapePreset::QuarteredCircle.base_name(), "Quartered Circle");
    }

    #[test]
    fn test_heart_is_scaled_path() {
        let heart = ShapePreset::Heart.build();
        assert_eq!((heart.scale_x, heart.scale_y), (3.0, 3.0));
        assert!(heart.natural_size().width > 0.0);
    }
}
