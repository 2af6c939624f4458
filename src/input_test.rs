use super::*;
use crate::doc::ElementKind;

#[test]
fn default_tool_is_line() {
    assert_eq!(Tool::default(), Tool::Line);
}

#[test]
fn multi_click_tools() {
    assert!(Tool::Line.is_multi_click());
    assert!(Tool::Polygon.is_multi_click());
    assert!(Tool::Surface.is_multi_click());
    assert!(Tool::SystemTract.is_multi_click());
    assert!(!Tool::Marker.is_multi_click());
    assert!(!Tool::Termination.is_multi_click());
    assert!(!Tool::Eraser.is_multi_click());
}

#[test]
fn closed_shapes_need_three_points() {
    assert_eq!(Tool::Polygon.min_points(), 3);
    assert_eq!(Tool::SystemTract.min_points(), 3);
    assert_eq!(Tool::Line.min_points(), 2);
    assert_eq!(Tool::Surface.min_points(), 2);
}

#[test]
fn two_click_tools() {
    assert!(Tool::Termination.is_two_click());
    assert!(Tool::Drilling.is_two_click());
    assert!(!Tool::Text.is_two_click());
}

#[test]
fn key_names() {
    assert!(Key("Escape".into()).is_escape());
    assert!(Key("Enter".into()).is_enter());
    assert!(!Key("Delete".into()).is_escape());
}

#[test]
fn tool_state_defaults_idle() {
    assert!(ToolState::default().is_idle());
    assert!(ToolState::default().points().is_empty());
}

#[test]
fn drawing_state_exposes_points() {
    let state = ToolState::Drawing { points: vec![Point::new(1.0, 2.0)] };
    assert!(!state.is_idle());
    assert_eq!(state.points(), &[Point::new(1.0, 2.0)]);
}

#[test]
fn awaiting_states_are_not_idle() {
    let site = Element::new(0, ElementKind::DrillingSite { x: 1.0, y: 1.0 });
    let state = ToolState::AwaitingDrillingTarget { site, at: Point::new(1.0, 1.0) };
    assert!(!state.is_idle());
    assert!(state.points().is_empty());
}
