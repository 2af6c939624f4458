use super::*;
use crate::consts::HIT_TOLERANCE_PX;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn el(kind: ElementKind) -> Element {
    Element::new(0, kind)
}

fn square(color: &str) -> Element {
    el(ElementKind::Polygon {
        color: color.into(),
        points: vec![pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0), pt(0.0, 100.0)],
    })
}

// =============================================================
// Per-variant rules
// =============================================================

#[test]
fn line_hit_within_tolerance() {
    let line = el(ElementKind::Line { color: "#f00".into(), width: 3.0, points: vec![pt(0.0, 0.0), pt(100.0, 0.0)] });
    assert!(hits(&line, pt(50.0, 9.0), HIT_TOLERANCE_PX));
    assert!(!hits(&line, pt(50.0, 10.0), HIT_TOLERANCE_PX));
}

#[test]
fn polygon_hit_by_containment() {
    let poly = square("#00f");
    assert!(hits(&poly, pt(50.0, 50.0), HIT_TOLERANCE_PX));
    assert!(!hits(&poly, pt(150.0, 50.0), HIT_TOLERANCE_PX));
}

#[test]
fn marker_hit_by_radius() {
    let marker = el(ElementKind::Marker { color: "#f00".into(), x: 10.0, y: 10.0, size: 12.0 });
    assert!(hits(&marker, pt(20.0, 10.0), HIT_TOLERANCE_PX));
    assert!(!hits(&marker, pt(30.0, 10.0), HIT_TOLERANCE_PX));
}

#[test]
fn termination_hit_by_radius() {
    let term = el(ElementKind::Termination {
        color: "#f00".into(),
        x: 0.0,
        y: 0.0,
        label: "T1".into(),
        number: 1,
        is_first_point: true,
    });
    assert!(hits(&term, pt(6.0, 6.0), HIT_TOLERANCE_PX));
    assert!(!hits(&term, pt(10.0, 10.0), HIT_TOLERANCE_PX));
}

#[test]
fn text_hit_by_bounding_box() {
    let text = el(ElementKind::Text { color: "#000".into(), x: 10.0, y: 10.0, text: "abcd".into(), font_size: 10.0 });
    // Box spans x 10..34, y 10..20.
    assert!(hits(&text, pt(30.0, 15.0), HIT_TOLERANCE_PX));
    assert!(!hits(&text, pt(40.0, 15.0), HIT_TOLERANCE_PX));
    assert!(!hits(&text, pt(20.0, 25.0), HIT_TOLERANCE_PX));
}

#[test]
fn termination_line_hit_along_span() {
    let line = el(ElementKind::TerminationLine {
        color: "#000000".into(),
        x1: 100.0,
        x2: 200.0,
        y: 50.0,
        label: "T1".into(),
        number: 1,
        line_width: 2.0,
    });
    assert!(hits(&line, pt(150.0, 55.0), HIT_TOLERANCE_PX));
    assert!(!hits(&line, pt(250.0, 50.0), HIT_TOLERANCE_PX));
}

#[test]
fn drilling_projection_hit_along_vertical() {
    let proj = el(ElementKind::DrillingProjection { x: 100.0, y1: 0.0, y2: 200.0 });
    assert!(hits(&proj, pt(104.0, 120.0), HIT_TOLERANCE_PX));
    assert!(!hits(&proj, pt(120.0, 120.0), HIT_TOLERANCE_PX));
}

#[test]
fn strata_number_hit_by_radius() {
    let label = el(ElementKind::StrataNumber { number: 1, x: 0.0, y: 0.0 });
    assert!(hits(&label, pt(0.0, 11.0), HIT_TOLERANCE_PX));
    assert!(!hits(&label, pt(0.0, 13.0), HIT_TOLERANCE_PX));
}

// =============================================================
// Z-order
// =============================================================

#[test]
fn topmost_element_wins() {
    let elements = vec![square("#111"), square("#222")];
    assert_eq!(find_element_at(&elements, pt(50.0, 50.0), HIT_TOLERANCE_PX), Some(1));
}

#[test]
fn falls_through_to_lower_element() {
    let small = el(ElementKind::Marker { color: "#f00".into(), x: 500.0, y: 500.0, size: 5.0 });
    let elements = vec![square("#111"), small];
    assert_eq!(find_element_at(&elements, pt(50.0, 50.0), HIT_TOLERANCE_PX), Some(0));
}

#[test]
fn miss_returns_none() {
    let elements = vec![square("#111")];
    assert_eq!(find_element_at(&elements, pt(500.0, 500.0), HIT_TOLERANCE_PX), None);
    assert_eq!(find_element_at(&[], pt(0.0, 0.0), HIT_TOLERANCE_PX), None);
}
