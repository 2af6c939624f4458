//! Cross-canvas projection: cross-section events become Wheeler-diagram elements.
//!
//! Every function here is pure. Source coordinates are normalised against the
//! source canvas width (`x / width`) and re-expanded into the target surface's
//! plot area, so the two canvases may have any sizes and paddings.
//!
//! Vertical placement on the Wheeler plot encodes chronology, not depth: a
//! termination's number over [`MAX_TERMINATION_COUNT`] picks its height, with
//! older (lower) numbers nearer the bottom.
//!
//! [`MAX_TERMINATION_COUNT`]: crate::consts::MAX_TERMINATION_COUNT

#[cfg(test)]
#[path = "project_test.rs"]
mod project_test;

use serde::{Deserialize, Serialize};

use crate::consts::{PROJECTED_MARKER_SIZE, TERMINATION_LINE_WIDTH};
use crate::doc::{Element, ElementKind, TERMINATION_LINE_COLOR, TractType};
use crate::error::TractError;
use crate::geom::Point;

/// Margins around a plot area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insets {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Insets {
    /// No margins: the plot area is the whole canvas.
    pub const NONE: Insets = Insets { left: 0.0, right: 0.0, top: 0.0, bottom: 0.0 };

    /// Axis margins of the Wheeler diagram canvas.
    pub const WHEELER: Insets = Insets { left: 60.0, right: 50.0, top: 30.0, bottom: 50.0 };
}

/// A canvas's pixel size together with its plot-area padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotArea {
    pub width: f64,
    pub height: f64,
    pub padding: Insets,
}

impl PlotArea {
    #[must_use]
    pub fn new(width: f64, height: f64, padding: Insets) -> Self {
        Self { width, height, padding }
    }

    /// A plot area covering the whole canvas.
    #[must_use]
    pub fn full(width: f64, height: f64) -> Self {
        Self::new(width, height, Insets::NONE)
    }

    #[must_use]
    pub fn plot_width(&self) -> f64 {
        (self.width - self.padding.left - self.padding.right).max(0.0)
    }

    #[must_use]
    pub fn plot_height(&self) -> f64 {
        (self.height - self.padding.top - self.padding.bottom).max(0.0)
    }

    #[must_use]
    pub fn left(&self) -> f64 {
        self.padding.left
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.padding.top
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.padding.top + self.plot_height()
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.padding.left + self.plot_width()
    }

    /// Pixel x for a horizontal ratio in `0..=1` (clamped).
    #[must_use]
    pub fn x_at(&self, ratio: f64) -> f64 {
        self.left() + ratio.clamp(0.0, 1.0) * self.plot_width()
    }

    /// Pixel y for a vertical ratio in `0..=1` measured from the top (clamped).
    #[must_use]
    pub fn y_at(&self, ratio: f64) -> f64 {
        self.top() + ratio.clamp(0.0, 1.0) * self.plot_height()
    }
}

/// What happens on the Wheeler surface when a rollover marker is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerPolicy {
    /// Markers stay on the cross-section.
    #[default]
    Ignore,
    /// Project a small filled square at the scaled position.
    Square,
}

/// A completed termination pair on the source surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationPayload {
    pub number: u32,
    pub label: String,
    pub color: String,
    pub first: Point,
    pub second: Point,
    /// `min(first.x, second.x)`.
    pub x1: f64,
    /// `max(first.x, second.x)`.
    pub x2: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl TerminationPayload {
    #[must_use]
    pub fn new(number: u32, label: String, color: String, first: Point, second: Point, canvas: (f64, f64)) -> Self {
        Self {
            number,
            label,
            color,
            first,
            second,
            x1: first.x.min(second.x),
            x2: first.x.max(second.x),
            canvas_width: canvas.0,
            canvas_height: canvas.1,
        }
    }
}

/// A completed drilling placement: rig x and the vertical span drilled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillingPayload {
    pub x: f64,
    pub y1: f64,
    pub y2: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

/// A placed rollover marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPayload {
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

/// Horizontal ratio of `x` across a source canvas of `width`.
#[must_use]
pub fn source_ratio(x: f64, width: f64) -> f64 {
    if width <= 0.0 { 0.0 } else { (x / width).clamp(0.0, 1.0) }
}

/// Wheeler y for termination `number`: `max_count` sits at the plot top,
/// zero at the plot bottom.
#[must_use]
pub fn termination_y(number: u32, target: &PlotArea, max_count: u32) -> f64 {
    let max = f64::from(max_count.max(1));
    let ratio = (f64::from(number) / max).min(1.0);
    target.y_at(1.0 - ratio)
}

/// Project a termination pair onto the target plot as a black horizontal line.
#[must_use]
pub fn project_termination(payload: &TerminationPayload, target: &PlotArea, max_count: u32, timestamp: i64) -> Element {
    let x1 = target.x_at(source_ratio(payload.x1, payload.canvas_width));
    let x2 = target.x_at(source_ratio(payload.x2, payload.canvas_width));
    Element::new(
        timestamp,
        ElementKind::TerminationLine {
            color: TERMINATION_LINE_COLOR.to_owned(),
            x1,
            x2,
            y: termination_y(payload.number, target, max_count),
            label: payload.label.clone(),
            number: payload.number,
            line_width: TERMINATION_LINE_WIDTH,
        },
    )
}

/// Project a drilling pick onto the target plot as a full-height vertical line.
#[must_use]
pub fn project_drilling(payload: &DrillingPayload, target: &PlotArea, timestamp: i64) -> Element {
    Element::new(
        timestamp,
        ElementKind::DrillingProjection {
            x: target.x_at(source_ratio(payload.x, payload.canvas_width)),
            y1: target.top(),
            y2: target.bottom(),
        },
    )
}

/// Project a rollover marker according to `policy`.
#[must_use]
pub fn project_marker(payload: &MarkerPayload, target: &PlotArea, policy: MarkerPolicy, timestamp: i64) -> Option<Element> {
    match policy {
        MarkerPolicy::Ignore => None,
        MarkerPolicy::Square => {
            let cx = target.x_at(source_ratio(payload.x, payload.canvas_width));
            let cy = target.y_at(source_ratio(payload.y, payload.canvas_height));
            let h = PROJECTED_MARKER_SIZE / 2.0;
            Some(Element::new(
                timestamp,
                ElementKind::Polygon {
                    color: payload.color.clone(),
                    points: vec![
                        Point::new(cx - h, cy - h),
                        Point::new(cx + h, cy - h),
                        Point::new(cx + h, cy + h),
                        Point::new(cx - h, cy + h),
                    ],
                },
            ))
        }
    }
}

/// Build a systems-tract polygon from the termination lines numbered
/// `from..=to` on a Wheeler surface.
///
/// The outline walks up the left ends (`x1`) from the oldest line to the
/// youngest, then back down the right ends (`x2`).
///
/// # Errors
///
/// [`TractError::InvalidRange`] unless `0 < from < to`;
/// [`TractError::NotEnoughTerminations`] when fewer than two lines fall in range.
pub fn build_system_tract(
    elements: &[Element],
    from: i64,
    to: i64,
    tract_type: TractType,
    timestamp: i64,
) -> Result<Element, TractError> {
    if from <= 0 || to <= 0 || from >= to {
        return Err(TractError::InvalidRange { from, to });
    }

    let mut lines: Vec<(u32, f64, f64, f64)> = elements
        .iter()
        .filter_map(|el| match el.kind {
            ElementKind::TerminationLine { number, x1, x2, y, .. } if (from..=to).contains(&i64::from(number)) => {
                Some((number, x1, x2, y))
            }
            _ => None,
        })
        .collect();

    if lines.len() < 2 {
        return Err(TractError::NotEnoughTerminations { found: lines.len() });
    }
    lines.sort_by_key(|(number, ..)| *number);

    let left_edge = lines.iter().map(|&(_, x1, _, y)| Point::new(x1, y));
    let right_edge = lines.iter().rev().map(|&(_, _, x2, y)| Point::new(x2, y));
    let points: Vec<Point> = left_edge.chain(right_edge).collect();

    tracing::info!(from, to, tract = tract_type.label(), lines = lines.len(), "system tract generated");
    Ok(Element::new(
        timestamp,
        ElementKind::SystemTract { tract_type, color: tract_type.color().to_owned(), points },
    ))
}
