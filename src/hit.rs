//! Hit-testing against surface elements.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::{POINT_HIT_RADIUS_PX, STRATA_HIT_RADIUS_PX, TEXT_ADVANCE_RATIO};
use crate::doc::{Element, ElementKind};
use crate::geom::{Point, distance_to_polyline, distance_to_segment, point_in_polygon};

/// Index of the topmost element under `pos`, scanning from the end of the list.
#[must_use]
pub fn find_element_at(elements: &[Element], pos: Point, tolerance: f64) -> Option<usize> {
    elements.iter().rposition(|el| hits(el, pos, tolerance))
}

/// Whether `pos` falls on `element`.
///
/// Strokes use `tolerance` as their slop; point-like elements use fixed radii.
/// Text uses an approximate box from the character count and font size, with
/// `(x, y)` as the top-left corner.
#[must_use]
pub fn hits(element: &Element, pos: Point, tolerance: f64) -> bool {
    match &element.kind {
        ElementKind::Line { points, .. } | ElementKind::Surface { points, .. } => {
            distance_to_polyline(pos, points) < tolerance
        }
        ElementKind::Polygon { points, .. } | ElementKind::SystemTract { points, .. } => point_in_polygon(pos, points),
        ElementKind::Marker { x, y, size, .. } => pos.distance(Point::new(*x, *y)) <= size.max(POINT_HIT_RADIUS_PX),
        ElementKind::Termination { x, y, .. } | ElementKind::DrillingSite { x, y } => {
            pos.distance(Point::new(*x, *y)) <= POINT_HIT_RADIUS_PX
        }
        ElementKind::StrataNumber { x, y, .. } => pos.distance(Point::new(*x, *y)) <= STRATA_HIT_RADIUS_PX,
        ElementKind::Text { x, y, text, font_size, .. } => {
            #[allow(clippy::cast_precision_loss)]
            let width = text.chars().count() as f64 * font_size * TEXT_ADVANCE_RATIO;
            pos.x >= *x && pos.x <= x + width && pos.y >= *y && pos.y <= y + font_size
        }
        ElementKind::TerminationLine { x1, x2, y, .. } => {
            distance_to_segment(pos, Point::new(*x1, *y), Point::new(*x2, *y)) < tolerance
        }
        ElementKind::DrillingLine { x1, y1, x2, y2 } => {
            distance_to_segment(pos, Point::new(*x1, *y1), Point::new(*x2, *y2)) < tolerance
        }
        ElementKind::DrillingProjection { x, y1, y2 } => {
            distance_to_segment(pos, Point::new(*x, *y1), Point::new(*x, *y2)) < tolerance
        }
    }
}
