#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-6;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn wheeler() -> PlotArea {
    PlotArea::new(1200.0, 600.0, Insets::WHEELER)
}

fn payload(number: u32, xa: f64, xb: f64) -> TerminationPayload {
    TerminationPayload::new(
        number,
        format!("T{number}"),
        "#ff0000".into(),
        Point::new(xa, 200.0),
        Point::new(xb, 240.0),
        (1400.0, 800.0),
    )
}

fn line_parts(el: &Element) -> (String, f64, f64, f64, u32) {
    match &el.kind {
        ElementKind::TerminationLine { color, x1, x2, y, number, .. } => (color.clone(), *x1, *x2, *y, *number),
        other => panic!("expected termination line, got {other:?}"),
    }
}

fn line_at(number: u32, x1: f64, x2: f64) -> Element {
    Element::new(
        0,
        ElementKind::TerminationLine {
            color: TERMINATION_LINE_COLOR.into(),
            x1,
            x2,
            y: termination_y(number, &wheeler(), 50),
            label: format!("T{number}"),
            number,
            line_width: 2.0,
        },
    )
}

// =============================================================
// PlotArea
// =============================================================

#[test]
fn plot_area_dimensions() {
    let area = wheeler();
    assert_eq!(area.plot_width(), 1090.0);
    assert_eq!(area.plot_height(), 520.0);
    assert_eq!(area.left(), 60.0);
    assert_eq!(area.right(), 1150.0);
    assert_eq!(area.top(), 30.0);
    assert_eq!(area.bottom(), 550.0);
}

#[test]
fn plot_area_clamps_ratios() {
    let area = wheeler();
    assert_eq!(area.x_at(-1.0), 60.0);
    assert_eq!(area.x_at(2.0), 1150.0);
    assert_eq!(area.y_at(0.5), 290.0);
}

#[test]
fn plot_area_never_negative() {
    let area = PlotArea::new(50.0, 20.0, Insets::WHEELER);
    assert_eq!(area.plot_width(), 0.0);
    assert_eq!(area.plot_height(), 0.0);
}

#[test]
fn source_ratio_guards_zero_width() {
    assert_eq!(source_ratio(10.0, 0.0), 0.0);
    assert!(approx_eq(source_ratio(350.0, 1400.0), 0.25));
}

// =============================================================
// Termination projection
// =============================================================

#[test]
fn payload_orders_endpoints() {
    let p = payload(1, 300.0, 100.0);
    assert_eq!(p.x1, 100.0);
    assert_eq!(p.x2, 300.0);
}

#[test]
fn termination_line_is_black_whatever_the_source_color() {
    let mut p = payload(1, 100.0, 300.0);
    p.color = "#00ff00".into();
    let (color, ..) = line_parts(&project_termination(&p, &wheeler(), 50, 0));
    assert_eq!(color, "#000000");
}

#[test]
fn two_terminations_scale_proportionally() {
    let area = wheeler();
    let first = project_termination(&payload(1, 100.0, 300.0), &area, 50, 0);
    let second = project_termination(&payload(2, 900.0, 500.0), &area, 50, 0);

    let (_, a1, a2, _, n1) = line_parts(&first);
    let (_, b1, b2, _, n2) = line_parts(&second);
    let ratio = |x: f64| (x - area.left()) / area.plot_width();

    assert_eq!((n1, n2), (1, 2));
    assert!((ratio(a1) - 0.071).abs() < 1e-3);
    assert!((ratio(a2) - 0.214).abs() < 1e-3);
    assert!((ratio(b1) - 0.357).abs() < 1e-3);
    assert!((ratio(b2) - 0.643).abs() < 1e-3);
}

#[test]
fn lower_numbers_sit_lower() {
    let area = wheeler();
    let y1 = termination_y(1, &area, 50);
    let y10 = termination_y(10, &area, 50);
    assert!(y1 > y10);
    assert_eq!(termination_y(50, &area, 50), area.top());
    assert_eq!(termination_y(0, &area, 50), area.bottom());
}

#[test]
fn numbers_past_max_clamp_to_top() {
    let area = wheeler();
    assert_eq!(termination_y(80, &area, 50), area.top());
}

// =============================================================
// Drilling / marker projection
// =============================================================

#[test]
fn drilling_projection_spans_plot_height() {
    let area = wheeler();
    let p = DrillingPayload { x: 700.0, y1: 100.0, y2: 400.0, canvas_width: 1400.0, canvas_height: 800.0 };
    let el = project_drilling(&p, &area, 5);
    assert_eq!(el.timestamp, 5);
    assert_eq!(el.kind, ElementKind::DrillingProjection { x: 60.0 + 545.0, y1: 30.0, y2: 550.0 });
}

#[test]
fn marker_ignored_by_default_policy() {
    let p = MarkerPayload { x: 10.0, y: 10.0, color: "#f00".into(), canvas_width: 100.0, canvas_height: 100.0 };
    assert!(project_marker(&p, &wheeler(), MarkerPolicy::default(), 0).is_none());
}

#[test]
fn marker_square_policy_projects_square() {
    let p = MarkerPayload { x: 700.0, y: 400.0, color: "#f00".into(), canvas_width: 1400.0, canvas_height: 800.0 };
    let el = project_marker(&p, &wheeler(), MarkerPolicy::Square, 0).unwrap();
    let ElementKind::Polygon { points, color } = el.kind else {
        panic!("expected polygon");
    };
    assert_eq!(color, "#f00");
    assert_eq!(points.len(), 4);
    assert_eq!(points[0], Point::new(605.0 - 4.0, 290.0 - 4.0));
    assert_eq!(points[2], Point::new(605.0 + 4.0, 290.0 + 4.0));
}

// =============================================================
// System tract generation
// =============================================================

#[test]
fn tract_includes_every_line_in_range() {
    let elements = vec![line_at(2, 100.0, 300.0), line_at(5, 120.0, 400.0), line_at(7, 150.0, 500.0)];
    let tract = build_system_tract(&elements, 2, 7, TractType::Tst, 0).unwrap();
    let ElementKind::SystemTract { points, tract_type, color } = tract.kind else {
        panic!("expected tract");
    };
    assert_eq!(tract_type, TractType::Tst);
    assert_eq!(color, TractType::Tst.color());
    assert_eq!(points.len(), 6);
    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![100.0, 120.0, 150.0, 500.0, 400.0, 300.0]);
}

#[test]
fn tract_walks_up_left_then_down_right() {
    let elements = vec![line_at(7, 150.0, 500.0), line_at(2, 100.0, 300.0)];
    let tract = build_system_tract(&elements, 1, 10, TractType::Hst, 0).unwrap();
    let ElementKind::SystemTract { points, .. } = tract.kind else {
        panic!("expected tract");
    };
    let area = wheeler();
    let y2 = termination_y(2, &area, 50);
    let y7 = termination_y(7, &area, 50);
    assert_eq!(
        points,
        vec![Point::new(100.0, y2), Point::new(150.0, y7), Point::new(500.0, y7), Point::new(300.0, y2)]
    );
}

#[test]
fn tract_with_single_match_fails() {
    let elements = vec![line_at(2, 100.0, 300.0), line_at(9, 100.0, 300.0)];
    let err = build_system_tract(&elements, 2, 7, TractType::Lst, 0).unwrap_err();
    assert_eq!(err, TractError::NotEnoughTerminations { found: 1 });
}

#[test]
fn tract_ignores_non_line_elements() {
    let term = Element::new(
        0,
        ElementKind::Termination {
            color: "#f00".into(),
            x: 1.0,
            y: 1.0,
            label: "T3".into(),
            number: 3,
            is_first_point: true,
        },
    );
    let elements = vec![term, line_at(4, 10.0, 20.0)];
    let err = build_system_tract(&elements, 1, 5, TractType::Lst, 0).unwrap_err();
    assert_eq!(err, TractError::NotEnoughTerminations { found: 1 });
}

#[test]
fn tract_rejects_bad_ranges() {
    let elements = vec![line_at(2, 100.0, 300.0), line_at(5, 100.0, 300.0)];
    for (from, to) in [(5, 2), (3, 3), (0, 5), (-1, 5)] {
        let err = build_system_tract(&elements, from, to, TractType::Lst, 0).unwrap_err();
        assert_eq!(err, TractError::InvalidRange { from, to });
    }
}
