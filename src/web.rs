//! Browser bindings.
//!
//! - [`DrawContext`] for `CanvasRenderingContext2d`
//! - canvas lookup by element id ([`canvas_slot`])
//! - [`LocalStorageStore`], the `localStorage` persistence backend
//! - [`ExamSession`], the object the host page drives
//!
//! Everything crossing into JavaScript is a JSON string: actions and timer
//! events go out serialized, tool and type names come in as their camelCase
//! names.

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::board::{Board, BoardAction, BoardSnapshot, CanvasSlot};
use crate::clock::{Clock, SystemClock};
use crate::config::ExamConfig;
use crate::doc::{SurfaceType, TractType};
use crate::engine::SurfaceKind;
use crate::error::{ErrorCode, SurfaceError};
use crate::export::ExportPayload;
use crate::geom::Point;
use crate::input::{Key, Tool};
use crate::render::DrawContext;
use crate::store::KeyValueStore;
use crate::timer::{ExamTimer, TimerEvent};

// =============================================================
// Canvas2D
// =============================================================

impl DrawContext for CanvasRenderingContext2d {
    fn clear_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::clear_rect(self, x, y, w, h);
    }
    fn save(&self) {
        CanvasRenderingContext2d::save(self);
    }
    fn restore(&self) {
        CanvasRenderingContext2d::restore(self);
    }
    fn begin_path(&self) {
        CanvasRenderingContext2d::begin_path(self);
    }
    fn close_path(&self) {
        CanvasRenderingContext2d::close_path(self);
    }
    fn move_to(&self, x: f64, y: f64) {
        CanvasRenderingContext2d::move_to(self, x, y);
    }
    fn line_to(&self, x: f64, y: f64) {
        CanvasRenderingContext2d::line_to(self, x, y);
    }
    fn arc(&self, x: f64, y: f64, radius: f64, start: f64, end: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::arc(self, x, y, radius, start, end)
    }
    fn stroke(&self) {
        CanvasRenderingContext2d::stroke(self);
    }
    fn fill(&self) {
        CanvasRenderingContext2d::fill(self);
    }
    fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::stroke_rect(self, x, y, w, h);
    }
    fn set_stroke_style(&self, style: &str) {
        self.set_stroke_style_str(style);
    }
    fn set_fill_style(&self, style: &str) {
        self.set_fill_style_str(style);
    }
    fn set_line_width(&self, width: f64) {
        CanvasRenderingContext2d::set_line_width(self, width);
    }
    fn set_line_dash(&self, segments: &[f64]) -> Result<(), JsValue> {
        let dash: js_sys::Array = segments.iter().map(|s| JsValue::from_f64(*s)).collect();
        CanvasRenderingContext2d::set_line_dash(self, &dash)
    }
    fn set_font(&self, font: &str) {
        CanvasRenderingContext2d::set_font(self, font);
    }
    fn set_text_align(&self, align: &str) {
        CanvasRenderingContext2d::set_text_align(self, align);
    }
    fn set_text_baseline(&self, baseline: &str) {
        CanvasRenderingContext2d::set_text_baseline(self, baseline);
    }
    fn fill_text(&self, text: &str, x: f64, y: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::fill_text(self, text, x, y)
    }
    fn translate(&self, x: f64, y: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::translate(self, x, y)
    }
    fn rotate(&self, angle: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::rotate(self, angle)
    }
}

/// Look up the canvas with element id `id`.
///
/// An absent element yields a slot without a context, which the surface
/// constructor reports as [`SurfaceError::MissingCanvas`].
///
/// # Errors
///
/// [`SurfaceError::MissingContext`] when the element exists but yields no 2D
/// context.
pub fn canvas_slot(id: &str) -> Result<CanvasSlot<CanvasRenderingContext2d>, SurfaceError> {
    let Some(canvas) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
    else {
        return Ok(CanvasSlot::new(id, None, 0.0, 0.0));
    };

    let ctx = match canvas.get_context("2d") {
        Ok(Some(obj)) => obj.dyn_into::<CanvasRenderingContext2d>().ok(),
        _ => None,
    };
    let Some(ctx) = ctx else {
        return Err(SurfaceError::MissingContext { id: id.to_owned() });
    };
    Ok(CanvasSlot::new(id, Some(ctx), f64::from(canvas.width()), f64::from(canvas.height())))
}

// =============================================================
// localStorage
// =============================================================

/// `window.localStorage`. Unavailable storage (private mode, quota) reads as
/// empty and fails writes.
#[derive(Debug, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> Option<web_sys::Storage> {
        match web_sys::window()?.local_storage() {
            Ok(storage) => storage,
            Err(_) => None,
        }
    }
}

impl KeyValueStore for LocalStorageStore {
    fn save(&self, key: &str, blob: &str) -> bool {
        Self::storage().is_some_and(|s| s.set_item(key, blob).is_ok())
    }

    fn load(&self, key: &str) -> Option<String> {
        match Self::storage()?.get_item(key) {
            Ok(value) => value,
            Err(_) => None,
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            if storage.remove_item(key).is_err() {
                tracing::warn!(key, "persist: localStorage remove failed");
            }
        }
    }
}

// =============================================================
// Session
// =============================================================

#[derive(Serialize)]
struct Outgoing<'a> {
    surface: SurfaceKind,
    #[serde(flatten)]
    action: &'a crate::engine::Action,
}

/// Both surfaces plus the exam timer, driven by the host page.
///
/// Surface arguments are `"crossSection"` or `"wheeler"`. Every mutating
/// method returns a JSON array of `{surface, action, data}` objects (or
/// `{event, ...}` objects for timer methods).
#[wasm_bindgen]
pub struct ExamSession {
    board: Board<CanvasRenderingContext2d>,
    timer: ExamTimer,
    clock: Rc<dyn Clock>,
}

#[wasm_bindgen]
impl ExamSession {
    /// # Errors
    ///
    /// An `E_*`-prefixed message for bad config or a missing canvas.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, cross_section_id: &str, wheeler_id: &str) -> Result<ExamSession, JsValue> {
        let config = if config_json.trim().is_empty() {
            ExamConfig::default()
        } else {
            ExamConfig::from_json(config_json).map_err(|e| js_error(&e))?
        };
        let clock: Rc<dyn Clock> = Rc::new(SystemClock);
        let cross_section = canvas_slot(cross_section_id).map_err(|e| js_error(&e))?;
        let wheeler = canvas_slot(wheeler_id).map_err(|e| js_error(&e))?;
        let board = Board::new(cross_section, wheeler, clock.clone(), &config).map_err(|e| js_error(&e))?;
        let timer = ExamTimer::new(config.timer.clone(), clock.clone(), Rc::new(LocalStorageStore));
        Ok(Self { board, timer, clock })
    }

    // --- Surfaces ---

    /// # Errors
    ///
    /// Unknown surface name.
    pub fn pointer_down(&mut self, surface: &str, x: f64, y: f64) -> Result<String, JsValue> {
        let kind = parse_name(surface)?;
        actions_json(&self.board.on_pointer_down(kind, Point::new(x, y)))
    }

    /// # Errors
    ///
    /// Unknown surface name.
    pub fn double_click(&mut self, surface: &str) -> Result<String, JsValue> {
        let kind = parse_name(surface)?;
        actions_json(&self.board.on_double_click(kind))
    }

    /// # Errors
    ///
    /// Unknown surface name.
    pub fn key_down(&mut self, surface: &str, key: &str) -> Result<String, JsValue> {
        let kind = parse_name(surface)?;
        actions_json(&self.board.on_key_down(kind, &Key(key.to_owned())))
    }

    /// # Errors
    ///
    /// Unknown surface or tool name.
    pub fn set_tool(&mut self, surface: &str, tool: &str) -> Result<String, JsValue> {
        let kind = parse_name(surface)?;
        let tool: Tool = parse_name(tool)?;
        actions_json(&self.board.set_tool(kind, tool))
    }

    /// # Errors
    ///
    /// Unknown surface name.
    pub fn set_color(&mut self, surface: &str, color: &str) -> Result<(), JsValue> {
        let kind = parse_name(surface)?;
        self.board.surface_mut(kind).core.set_color(color);
        Ok(())
    }

    /// # Errors
    ///
    /// Unknown surface name.
    pub fn set_line_width(&mut self, surface: &str, width: f64) -> Result<(), JsValue> {
        let kind = parse_name(surface)?;
        self.board.surface_mut(kind).core.set_line_width(width);
        Ok(())
    }

    /// An empty `surface_type` clears the selection.
    ///
    /// # Errors
    ///
    /// Unknown surface or surface-type name.
    pub fn set_surface_type(&mut self, surface: &str, surface_type: &str) -> Result<(), JsValue> {
        let kind = parse_name(surface)?;
        let selected: Option<SurfaceType> = parse_optional(surface_type)?;
        self.board.surface_mut(kind).core.set_surface_type(selected);
        Ok(())
    }

    /// An empty `tract_type` clears the selection.
    ///
    /// # Errors
    ///
    /// Unknown surface or tract-type name.
    pub fn set_tract_type(&mut self, surface: &str, tract_type: &str) -> Result<(), JsValue> {
        let kind = parse_name(surface)?;
        let selected: Option<TractType> = parse_optional(tract_type)?;
        self.board.surface_mut(kind).core.set_tract_type(selected);
        Ok(())
    }

    /// Confirm the text editor, or report that it lost focus.
    ///
    /// # Errors
    ///
    /// Unknown surface name.
    pub fn commit_text(&mut self, surface: &str, text: &str) -> Result<String, JsValue> {
        let kind = parse_name(surface)?;
        actions_json(&self.board.commit_text(kind, text))
    }

    /// # Errors
    ///
    /// Unknown surface name.
    pub fn cancel_text(&mut self, surface: &str) -> Result<String, JsValue> {
        let kind = parse_name(surface)?;
        actions_json(&self.board.apply(kind, crate::engine::SurfaceCore::cancel_text))
    }

    /// # Errors
    ///
    /// Unknown surface name.
    pub fn undo(&mut self, surface: &str) -> Result<String, JsValue> {
        let kind = parse_name(surface)?;
        actions_json(&self.board.undo(kind))
    }

    /// # Errors
    ///
    /// Unknown surface name.
    pub fn redo(&mut self, surface: &str) -> Result<String, JsValue> {
        let kind = parse_name(surface)?;
        actions_json(&self.board.redo(kind))
    }

    /// # Errors
    ///
    /// Unknown surface name.
    pub fn clear(&mut self, surface: &str) -> Result<String, JsValue> {
        let kind = parse_name(surface)?;
        actions_json(&self.board.apply(kind, crate::engine::SurfaceCore::clear))
    }

    /// # Errors
    ///
    /// `E_INVALID_RANGE` / `E_NOT_ENOUGH_TERMINATIONS`, or an unknown tract type.
    pub fn generate_tract(&mut self, from: i32, to: i32, tract_type: &str) -> Result<String, JsValue> {
        let tract_type: TractType = parse_name(tract_type)?;
        let actions = self
            .board
            .generate_tract(i64::from(from), i64::from(to), tract_type)
            .map_err(|e| js_error(&e))?;
        actions_json(&actions)
    }

    /// # Errors
    ///
    /// Propagates a failed `Canvas2D` call.
    pub fn render(&self) -> Result<(), JsValue> {
        self.board.render_all()
    }

    // --- State ---

    /// # Errors
    ///
    /// Serialization failure.
    pub fn snapshot(&self) -> Result<String, JsValue> {
        to_json(&self.board.snapshot())
    }

    /// # Errors
    ///
    /// Unreadable snapshot JSON.
    pub fn restore(&mut self, snapshot_json: &str) -> Result<String, JsValue> {
        let snapshot: BoardSnapshot =
            serde_json::from_str(snapshot_json).map_err(|e| JsValue::from_str(&format!("E_SNAPSHOT: {e}")))?;
        actions_json(&self.board.restore(snapshot))
    }

    /// # Errors
    ///
    /// Serialization failure.
    pub fn clear_all(&mut self) -> Result<String, JsValue> {
        actions_json(&self.board.clear_all())
    }

    /// The export document, pretty-printed.
    ///
    /// # Errors
    ///
    /// Serialization failure.
    pub fn export_json(&self) -> Result<String, JsValue> {
        let payload = ExportPayload::new(self.board.snapshot(), Some(self.timer.remaining_ms()), self.clock.now_ms());
        payload.to_json().map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // --- Timer ---

    /// # Errors
    ///
    /// Serialization failure.
    pub fn timer_start(&mut self) -> Result<String, JsValue> {
        events_json(&self.timer.start())
    }

    /// # Errors
    ///
    /// Serialization failure.
    pub fn timer_tick(&mut self) -> Result<String, JsValue> {
        events_json(&self.timer.tick())
    }

    /// # Errors
    ///
    /// Serialization failure.
    pub fn timer_visibility(&mut self, visible: bool) -> Result<String, JsValue> {
        events_json(&self.timer.on_visibility_change(visible))
    }

    /// # Errors
    ///
    /// Serialization failure.
    pub fn timer_pause(&mut self) -> Result<String, JsValue> {
        events_json(&self.timer.pause())
    }

    /// # Errors
    ///
    /// Serialization failure.
    pub fn timer_resume(&mut self) -> Result<String, JsValue> {
        events_json(&self.timer.resume())
    }

    /// # Errors
    ///
    /// Serialization failure.
    pub fn timer_stop(&mut self) -> Result<String, JsValue> {
        events_json(&self.timer.stop())
    }

    /// # Errors
    ///
    /// Serialization failure.
    #[allow(clippy::cast_possible_truncation)]
    pub fn timer_set_remaining(&mut self, ms: f64) -> Result<String, JsValue> {
        events_json(&self.timer.set_remaining(ms.round() as i64))
    }

    /// # Errors
    ///
    /// Serialization failure.
    pub fn timer_restore(&mut self) -> Result<String, JsValue> {
        events_json(&self.timer.restore())
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn timer_remaining_ms(&self) -> f64 {
        self.timer.remaining_ms() as f64
    }
}

// =============================================================
// Marshalling
// =============================================================

fn js_error<E: ErrorCode>(err: &E) -> JsValue {
    JsValue::from_str(&format!("{}: {err}", err.error_code()))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn actions_json(actions: &[BoardAction]) -> Result<String, JsValue> {
    let out: Vec<Outgoing<'_>> = actions.iter().map(|(surface, action)| Outgoing { surface: *surface, action }).collect();
    to_json(&out)
}

fn events_json(events: &[TimerEvent]) -> Result<String, JsValue> {
    to_json(events)
}

/// Parse a camelCase enum name such as `"crossSection"` or `"termination"`.
fn parse_name<T: DeserializeOwned>(raw: &str) -> Result<T, JsValue> {
    serde_json::from_value(serde_json::Value::String(raw.to_owned()))
        .map_err(|_| JsValue::from_str(&format!("E_UNKNOWN_NAME: `{raw}`")))
}

fn parse_optional<T: DeserializeOwned>(raw: &str) -> Result<Option<T>, JsValue> {
    if raw.trim().is_empty() { Ok(None) } else { parse_name(raw).map(Some) }
}
