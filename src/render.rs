//! Rendering: draws a surface's full scene to a 2D context.
//!
//! Drawing goes through the [`DrawContext`] trait, a subset of `Canvas2D`.
//! The browser implementation lives in [`crate::web`]; tests record calls.
//! Nothing here mutates surface state.
//!
//! Fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Surface::render`]) handles the result.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::{FRAC_PI_2, TAU};

use wasm_bindgen::JsValue;

use crate::consts::POLYGON_FILL_ALPHA;
use crate::doc::{Element, ElementKind, TERMINATION_LINE_COLOR};
use crate::engine::{SurfaceCore, SurfaceKind};
use crate::geom::{Point, centroid, with_alpha};
use crate::input::{Tool, ToolState};
use crate::project::PlotArea;

/// Drawn colour of projected drilling lines on the Wheeler plot.
pub const DRILLING_PROJECTION_COLOR: &str = "rgba(255, 0, 0, 0.4)";
const DRILLING_COLOR: &str = "#333333";
const FRAME_COLOR: &str = "#333333";
const CAPTION_FONT: &str = "14px sans-serif";
const LABEL_FONT: &str = "bold 12px sans-serif";
const TERMINATION_DOT_RADIUS: f64 = 5.0;
const STRATA_RADIUS: f64 = 12.0;
const DRILLING_SITE_SIZE: f64 = 8.0;
const PREVIEW_DASH: [f64; 2] = [5.0, 5.0];
const DRILLING_DASH: [f64; 2] = [6.0, 4.0];
const PENDING_RING_RADIUS: f64 = 9.0;

/// The `Canvas2D` operations the renderer needs.
pub trait DrawContext {
    fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64);
    fn save(&self);
    fn restore(&self);
    fn begin_path(&self);
    fn close_path(&self);
    fn move_to(&self, x: f64, y: f64);
    fn line_to(&self, x: f64, y: f64);
    /// # Errors
    ///
    /// Fails for a negative radius.
    fn arc(&self, x: f64, y: f64, radius: f64, start: f64, end: f64) -> Result<(), JsValue>;
    fn stroke(&self);
    fn fill(&self);
    fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64);
    fn set_stroke_style(&self, style: &str);
    fn set_fill_style(&self, style: &str);
    fn set_line_width(&self, width: f64);
    /// Empty `segments` restores solid lines.
    ///
    /// # Errors
    ///
    /// Propagates a rejected dash list.
    fn set_line_dash(&self, segments: &[f64]) -> Result<(), JsValue>;
    fn set_font(&self, font: &str);
    fn set_text_align(&self, align: &str);
    fn set_text_baseline(&self, baseline: &str);
    /// # Errors
    ///
    /// Propagates a failed text draw.
    fn fill_text(&self, text: &str, x: f64, y: f64) -> Result<(), JsValue>;
    /// # Errors
    ///
    /// Propagates a failed transform.
    fn translate(&self, x: f64, y: f64) -> Result<(), JsValue>;
    /// # Errors
    ///
    /// Propagates a failed transform.
    fn rotate(&self, angle: f64) -> Result<(), JsValue>;
}

/// A context that draws nothing, for surfaces driven without a canvas
/// (command-line tools, headless tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl DrawContext for Headless {
    fn clear_rect(&self, _x: f64, _y: f64, _w: f64, _h: f64) {}
    fn save(&self) {}
    fn restore(&self) {}
    fn begin_path(&self) {}
    fn close_path(&self) {}
    fn move_to(&self, _x: f64, _y: f64) {}
    fn line_to(&self, _x: f64, _y: f64) {}
    fn arc(&self, _x: f64, _y: f64, _radius: f64, _start: f64, _end: f64) -> Result<(), JsValue> {
        Ok(())
    }
    fn stroke(&self) {}
    fn fill(&self) {}
    fn stroke_rect(&self, _x: f64, _y: f64, _w: f64, _h: f64) {}
    fn set_stroke_style(&self, _style: &str) {}
    fn set_fill_style(&self, _style: &str) {}
    fn set_line_width(&self, _width: f64) {}
    fn set_line_dash(&self, _segments: &[f64]) -> Result<(), JsValue> {
        Ok(())
    }
    fn set_font(&self, _font: &str) {}
    fn set_text_align(&self, _align: &str) {}
    fn set_text_baseline(&self, _baseline: &str) {}
    fn fill_text(&self, _text: &str, _x: f64, _y: f64) -> Result<(), JsValue> {
        Ok(())
    }
    fn translate(&self, _x: f64, _y: f64) -> Result<(), JsValue> {
        Ok(())
    }
    fn rotate(&self, _angle: f64) -> Result<(), JsValue> {
        Ok(())
    }
}

/// Draw the full scene: plot frame (Wheeler only), elements bottom-first,
/// then the in-progress preview.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails.
pub fn draw<C: DrawContext + ?Sized>(ctx: &C, core: &SurfaceCore) -> Result<(), JsValue> {
    let plot = &core.plot;
    ctx.clear_rect(0.0, 0.0, plot.width, plot.height);

    if core.kind == SurfaceKind::Wheeler {
        draw_frame(ctx, plot)?;
    }

    for el in core.elements() {
        draw_element(ctx, el)?;
    }

    draw_pending(ctx, core)
}

// =============================================================
// Element dispatch
// =============================================================

/// Draw a single element.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails.
pub fn draw_element<C: DrawContext + ?Sized>(ctx: &C, el: &Element) -> Result<(), JsValue> {
    match &el.kind {
        ElementKind::Line { color, width, points } => {
            stroke_polyline(ctx, points, color, *width);
            Ok(())
        }
        ElementKind::Surface { surface_type, color, width, points } => {
            stroke_polyline(ctx, points, color, *width);
            match points.last() {
                Some(end) => draw_label(ctx, surface_type.abbreviation(), end.x + 6.0, end.y - 6.0, color, "left"),
                None => Ok(()),
            }
        }
        ElementKind::Polygon { color, points } => {
            fill_polygon(ctx, points, color);
            Ok(())
        }
        ElementKind::SystemTract { tract_type, color, points } => {
            fill_polygon(ctx, points, color);
            match centroid(points) {
                Some(c) => draw_label(ctx, tract_type.label(), c.x, c.y, "#000000", "center"),
                None => Ok(()),
            }
        }
        ElementKind::Marker { color, x, y, size } => {
            let h = size / 2.0;
            ctx.begin_path();
            ctx.move_to(*x, y - h);
            ctx.line_to(x + h, y + h);
            ctx.line_to(x - h, y + h);
            ctx.close_path();
            ctx.set_fill_style(color);
            ctx.fill();
            ctx.set_stroke_style("#000000");
            ctx.set_line_width(1.0);
            ctx.stroke();
            Ok(())
        }
        ElementKind::Text { color, x, y, text, font_size } => {
            ctx.set_font(&format!("{font_size}px sans-serif"));
            ctx.set_text_align("left");
            ctx.set_text_baseline("top");
            ctx.set_fill_style(color);
            ctx.fill_text(text, *x, *y)
        }
        ElementKind::Termination { color, x, y, label, .. } => {
            fill_circle(ctx, *x, *y, TERMINATION_DOT_RADIUS, color)?;
            draw_label(ctx, label, x + 8.0, y - 8.0, color, "left")
        }
        ElementKind::TerminationLine { x1, x2, y, label, line_width, .. } => {
            // Stored colour is ignored: projected lines are always black.
            ctx.begin_path();
            ctx.move_to(*x1, *y);
            ctx.line_to(*x2, *y);
            ctx.set_stroke_style(TERMINATION_LINE_COLOR);
            ctx.set_line_width(*line_width);
            ctx.stroke();
            draw_label(ctx, label, x2 + 6.0, *y, TERMINATION_LINE_COLOR, "left")
        }
        ElementKind::StrataNumber { number, x, y } => {
            fill_circle(ctx, *x, *y, STRATA_RADIUS, "#ffffff")?;
            ctx.set_stroke_style("#000000");
            ctx.set_line_width(1.5);
            ctx.stroke();
            draw_label(ctx, &number.to_string(), *x, *y, "#000000", "center")
        }
        ElementKind::DrillingSite { x, y } => {
            let h = DRILLING_SITE_SIZE;
            ctx.begin_path();
            ctx.move_to(x - h, y - h);
            ctx.line_to(x + h, y - h);
            ctx.line_to(*x, *y);
            ctx.close_path();
            ctx.set_fill_style(DRILLING_COLOR);
            ctx.fill();
            Ok(())
        }
        ElementKind::DrillingLine { x1, y1, x2, y2 } => {
            ctx.set_line_dash(&DRILLING_DASH)?;
            stroke_segment(ctx, Point::new(*x1, *y1), Point::new(*x2, *y2), DRILLING_COLOR, 2.0);
            ctx.set_line_dash(&[])
        }
        ElementKind::DrillingProjection { x, y1, y2 } => {
            stroke_segment(ctx, Point::new(*x, *y1), Point::new(*x, *y2), DRILLING_PROJECTION_COLOR, 2.0);
            Ok(())
        }
    }
}

// =============================================================
// Preview and frame
// =============================================================

fn draw_pending<C: DrawContext + ?Sized>(ctx: &C, core: &SurfaceCore) -> Result<(), JsValue> {
    match core.tool_state() {
        ToolState::Drawing { points } => {
            let color = preview_color(core);
            ctx.set_line_dash(&PREVIEW_DASH)?;
            stroke_polyline(ctx, points, &color, core.line_width);
            ctx.set_line_dash(&[])?;
            if core.tool.is_closed_shape() {
                if let Some(first) = points.first() {
                    fill_circle(ctx, first.x, first.y, 4.0, &color)?;
                }
            }
            Ok(())
        }
        ToolState::AwaitingTerminationEnd { at, .. } | ToolState::AwaitingDrillingTarget { at, .. } => {
            ctx.begin_path();
            ctx.arc(at.x, at.y, PENDING_RING_RADIUS, 0.0, TAU)?;
            ctx.set_stroke_style(&core.color);
            ctx.set_line_width(1.5);
            ctx.set_line_dash(&PREVIEW_DASH)?;
            ctx.stroke();
            ctx.set_line_dash(&[])
        }
        ToolState::Idle | ToolState::EditingText { .. } => Ok(()),
    }
}

fn preview_color(core: &SurfaceCore) -> String {
    match (core.tool, core.surface_type, core.tract_type) {
        (Tool::Surface, Some(s), _) => s.color().to_owned(),
        (Tool::SystemTract, _, Some(t)) => t.color().to_owned(),
        _ => core.color.clone(),
    }
}

/// Plot-area frame with "Distance" below and a rotated "Time" at the left.
fn draw_frame<C: DrawContext + ?Sized>(ctx: &C, plot: &PlotArea) -> Result<(), JsValue> {
    ctx.set_stroke_style(FRAME_COLOR);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(plot.left(), plot.top(), plot.plot_width(), plot.plot_height());

    ctx.set_font(CAPTION_FONT);
    ctx.set_fill_style(FRAME_COLOR);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.fill_text("Distance", plot.left() + plot.plot_width() / 2.0, plot.bottom() + plot.padding.bottom / 2.0)?;

    ctx.save();
    ctx.translate(plot.padding.left / 2.0, plot.top() + plot.plot_height() / 2.0)?;
    ctx.rotate(-FRAC_PI_2)?;
    ctx.fill_text("Time", 0.0, 0.0)?;
    ctx.restore();
    Ok(())
}

// =============================================================
// Primitives
// =============================================================

fn stroke_polyline<C: DrawContext + ?Sized>(ctx: &C, points: &[Point], color: &str, width: f64) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in rest {
        ctx.line_to(p.x, p.y);
    }
    ctx.set_stroke_style(color);
    ctx.set_line_width(width);
    ctx.stroke();
}

fn stroke_segment<C: DrawContext + ?Sized>(ctx: &C, a: Point, b: Point, color: &str, width: f64) {
    stroke_polyline(ctx, &[a, b], color, width);
}

fn fill_polygon<C: DrawContext + ?Sized>(ctx: &C, points: &[Point], color: &str) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in rest {
        ctx.line_to(p.x, p.y);
    }
    ctx.close_path();
    ctx.set_fill_style(&with_alpha(color, POLYGON_FILL_ALPHA));
    ctx.fill();
    ctx.set_stroke_style(color);
    ctx.set_line_width(2.0);
    ctx.stroke();
}

fn fill_circle<C: DrawContext + ?Sized>(ctx: &C, x: f64, y: f64, radius: f64, color: &str) -> Result<(), JsValue> {
    ctx.begin_path();
    ctx.arc(x, y, radius.max(0.0), 0.0, TAU)?;
    ctx.set_fill_style(color);
    ctx.fill();
    Ok(())
}

fn draw_label<C: DrawContext + ?Sized>(ctx: &C, text: &str, x: f64, y: f64, color: &str, align: &str) -> Result<(), JsValue> {
    ctx.set_font(LABEL_FONT);
    ctx.set_text_align(align);
    ctx.set_text_baseline("middle");
    ctx.set_fill_style(color);
    ctx.fill_text(text, x, y)
}
