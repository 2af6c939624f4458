//! Annotation surface: element list, undo/redo, and the tool state machine.
//!
//! [`SurfaceCore`] holds everything that does not touch a drawing context, so
//! it is fully testable natively. [`Surface`] binds a core to a
//! [`DrawContext`] and is what the host keeps per canvas.
//!
//! Every mutating call returns the [`Action`]s the host (or the [`Board`])
//! must react to, in the order they happened. A placement that needs
//! projecting onto the other canvas surfaces as a `*Placed` action in the same
//! return value as the element it produced.
//!
//! [`Board`]: crate::board::Board

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::clock::Clock;
use crate::config::SurfaceConfig;
use crate::consts::DUPLICATE_VERTEX_PX;
use crate::doc::{Element, ElementKind, ElementList, SurfaceType, TractType};
use crate::error::SurfaceError;
use crate::geom::Point;
use crate::history::{History, HistoryAction, HistoryEntry};
use crate::hit;
use crate::input::{Key, Tool, ToolState};
use crate::numbering::{SharedCounter, SharedNumbering};
use crate::project::{DrillingPayload, MarkerPayload, PlotArea, TerminationPayload};
use crate::render::{self, DrawContext};

/// Which physical canvas a surface represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceKind {
    /// The static diagram the student annotates.
    CrossSection,
    /// The derived time-versus-distance chart.
    Wheeler,
}

/// Notifications returned from surface operations for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// An element entered the list (new, redone, or restored by undo).
    ElementAdded(Element),
    /// An element left the list from `index`.
    ElementRemoved { index: usize, element: Element },
    /// The element list changed; debounce auto-save on this.
    StateChanged,
    /// A termination pair was completed.
    TerminationPlaced(TerminationPayload),
    /// A drilling site and target were completed.
    DrillingPlaced(DrillingPayload),
    /// A rollover marker was placed.
    MarkerPlaced(MarkerPayload),
    /// Guidance for the student, e.g. "click the other end".
    Hint(String),
    /// Open an inline text editor at this position.
    EditTextRequested { at: Point },
    RenderNeeded,
}

/// Per-surface state and logic, independent of any drawing context.
pub struct SurfaceCore {
    pub kind: SurfaceKind,
    /// Canvas size and plot padding.
    pub plot: PlotArea,
    pub tool: Tool,
    pub color: String,
    pub line_width: f64,
    /// Selected surface type for [`Tool::Surface`].
    pub surface_type: Option<SurfaceType>,
    /// Selected tract type for [`Tool::SystemTract`].
    pub tract_type: Option<TractType>,
    elements: ElementList,
    history: History,
    state: ToolState,
    numbering: SharedNumbering,
    strata: SharedCounter,
    clock: Rc<dyn Clock>,
    settings: SurfaceConfig,
}

impl SurfaceCore {
    /// Create a surface. `numbering` and `strata` are shared handles; pass
    /// clones of the same handles to every surface that must coordinate.
    #[must_use]
    pub fn new(
        kind: SurfaceKind,
        plot: PlotArea,
        numbering: SharedNumbering,
        strata: SharedCounter,
        clock: Rc<dyn Clock>,
        settings: SurfaceConfig,
    ) -> Self {
        Self {
            kind,
            plot,
            tool: Tool::default(),
            color: settings.default_color.clone(),
            line_width: settings.default_line_width,
            surface_type: None,
            tract_type: None,
            elements: ElementList::new(),
            history: History::new(settings.history_limit),
            state: ToolState::Idle,
            numbering,
            strata,
            clock,
            settings,
        }
    }

    // --- Tool / style ---

    /// Cancel whatever is in progress, then switch tools.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let actions = self.cancel();
        if self.tool != tool {
            tracing::debug!(surface = ?self.kind, from = ?self.tool, to = ?tool, "tool changed");
        }
        self.tool = tool;
        actions
    }

    pub fn set_color(&mut self, color: &str) {
        color.clone_into(&mut self.color);
    }

    pub fn set_line_width(&mut self, width: f64) {
        if width > 0.0 {
            self.line_width = width;
        }
    }

    pub fn set_surface_type(&mut self, surface_type: Option<SurfaceType>) {
        self.surface_type = surface_type;
    }

    pub fn set_tract_type(&mut self, tract_type: Option<TractType>) {
        self.tract_type = tract_type;
    }

    // --- Input events ---

    /// Dispatch a primary-button press to the active tool.
    pub fn on_pointer_down(&mut self, pos: Point) -> Vec<Action> {
        match self.tool {
            Tool::Line | Tool::Surface => self.add_vertex(pos, false),
            Tool::Polygon | Tool::SystemTract => self.add_vertex(pos, true),
            Tool::Marker => self.place_marker(pos),
            Tool::Termination => self.place_termination(pos),
            Tool::Drilling => self.place_drilling(pos),
            Tool::StrataNumber => self.place_strata_number(pos),
            Tool::Text => self.open_text(pos),
            Tool::Eraser => self.erase_at(pos),
        }
    }

    /// Double-click: finish the pending polyline or polygon.
    pub fn on_double_click(&mut self) -> Vec<Action> {
        self.finish()
    }

    /// `Escape` cancels the pending operation; `Enter` finishes a shape.
    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if key.is_escape() {
            self.cancel()
        } else if key.is_enter() && matches!(self.state, ToolState::Drawing { .. }) {
            self.finish()
        } else {
            Vec::new()
        }
    }

    /// Commit the pending multi-click shape. Too few vertices cancels silently.
    pub fn finish(&mut self) -> Vec<Action> {
        let ToolState::Drawing { points } = std::mem::take(&mut self.state) else {
            return Vec::new();
        };
        let points = dedupe_vertices(points);
        if points.len() < self.tool.min_points() {
            tracing::debug!(surface = ?self.kind, tool = ?self.tool, points = points.len(), "shape discarded: too few points");
            return vec![Action::RenderNeeded];
        }
        match self.shape_from(points) {
            Some(kind) => self.add_element(self.stamp(kind)),
            None => vec![Action::RenderNeeded],
        }
    }

    /// Abandon any in-progress operation, removing a provisional first-click
    /// element and returning its number to the registry.
    pub fn cancel(&mut self) -> Vec<Action> {
        match std::mem::take(&mut self.state) {
            ToolState::Idle => Vec::new(),
            ToolState::Drawing { .. } | ToolState::EditingText { .. } => {
                tracing::debug!(surface = ?self.kind, "pending operation cancelled");
                vec![Action::RenderNeeded]
            }
            ToolState::AwaitingTerminationEnd { first, number, .. } => {
                tracing::debug!(surface = ?self.kind, number, "termination cancelled");
                let mut actions = self.retract(&first);
                actions.push(Action::Hint(String::new()));
                actions
            }
            ToolState::AwaitingDrillingTarget { site, .. } => {
                tracing::debug!(surface = ?self.kind, "drilling cancelled");
                let mut actions = self.retract(&site);
                actions.push(Action::Hint(String::new()));
                actions
            }
        }
    }

    /// Commit text from the host editor (also called when it loses focus).
    /// Blank text closes the editor without adding anything.
    pub fn commit_text(&mut self, text: &str) -> Vec<Action> {
        let ToolState::EditingText { at } = self.state else {
            return Vec::new();
        };
        self.state = ToolState::Idle;
        let text = text.trim();
        if text.is_empty() {
            return vec![Action::RenderNeeded];
        }
        let kind = ElementKind::Text {
            color: self.color.clone(),
            x: at.x,
            y: at.y,
            text: text.to_owned(),
            font_size: self.settings.font_size,
        };
        self.add_element(self.stamp(kind))
    }

    /// Close the host text editor without committing.
    pub fn cancel_text(&mut self) -> Vec<Action> {
        if matches!(self.state, ToolState::EditingText { .. }) {
            self.cancel()
        } else {
            Vec::new()
        }
    }

    // --- Element list ---

    /// Append an element on top and record it for undo. This is also the
    /// entry point for elements injected by projection.
    pub fn add_element(&mut self, element: Element) -> Vec<Action> {
        if let Some(n) = element.termination_number() {
            self.numbering.claim(n);
        }
        let index = self.elements.push(element.clone());
        self.history.record(HistoryEntry::new(HistoryAction::Add, element.clone(), index));
        vec![Action::ElementAdded(element), Action::StateChanged, Action::RenderNeeded]
    }

    /// Remove the element at `index` and record it for undo.
    pub fn remove_element(&mut self, index: usize) -> Vec<Action> {
        let Some(element) = self.elements.remove(index) else {
            return Vec::new();
        };
        self.release_number(&element);
        self.history.record(HistoryEntry::new(HistoryAction::Remove, element.clone(), index));
        vec![Action::ElementRemoved { index, element }, Action::StateChanged, Action::RenderNeeded]
    }

    /// Revert the latest change. A pending operation is cancelled first and
    /// counts as the change. Empty when there was nothing to undo.
    pub fn undo(&mut self) -> Vec<Action> {
        if !self.state.is_idle() {
            return self.cancel();
        }
        let Some(entry) = self.history.pop_undo() else {
            return Vec::new();
        };
        let actions = match entry.action {
            HistoryAction::Add => self.take_out(&entry.element, entry.index),
            HistoryAction::Remove => self.put_back(entry.element.clone(), entry.index),
        };
        if actions.is_empty() {
            tracing::warn!(surface = ?self.kind, "undo entry no longer matches the element list; dropped");
            return actions;
        }
        self.history.push_redo(entry);
        actions
    }

    /// Re-apply the latest undone change. Empty when there was nothing to redo.
    pub fn redo(&mut self) -> Vec<Action> {
        if !self.state.is_idle() {
            return Vec::new();
        }
        let Some(entry) = self.history.pop_redo() else {
            return Vec::new();
        };
        let actions = match entry.action {
            HistoryAction::Add => self.put_back(entry.element.clone(), entry.index),
            HistoryAction::Remove => self.take_out(&entry.element, entry.index),
        };
        if actions.is_empty() {
            tracing::warn!(surface = ?self.kind, "redo entry no longer matches the element list; dropped");
            return actions;
        }
        self.history.push_undo(entry);
        actions
    }

    /// Empty the element list and both history stacks. Numbers held by the
    /// removed terminations go back to the registry.
    pub fn clear(&mut self) -> Vec<Action> {
        self.cancel();
        self.release_all();
        self.elements.clear();
        self.history.clear();
        tracing::info!(surface = ?self.kind, "surface cleared");
        vec![Action::StateChanged, Action::RenderNeeded]
    }

    // --- Persistence ---

    /// Independent copy of the element list, safe to persist or diff.
    #[must_use]
    pub fn get_state(&self) -> Vec<Element> {
        self.elements.as_slice().to_vec()
    }

    /// Replace the element list wholesale. Undo history is not restored.
    pub fn load_state(&mut self, elements: Vec<Element>) -> Vec<Action> {
        self.cancel();
        self.release_all();
        for el in &elements {
            match el.kind {
                ElementKind::Termination { number, .. } => self.numbering.claim(number),
                ElementKind::StrataNumber { number, .. } => self.strata.observe(number),
                _ => {}
            }
        }
        tracing::info!(surface = ?self.kind, count = elements.len(), "state loaded");
        self.elements.replace(elements);
        self.history.clear();
        vec![Action::RenderNeeded]
    }

    // --- Queries ---

    /// Index of the topmost element under `pos`.
    #[must_use]
    pub fn find_element_at(&self, pos: Point) -> Option<usize> {
        hit::find_element_at(self.elements.as_slice(), pos, self.settings.hit_tolerance_px)
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        self.elements.as_slice()
    }

    #[must_use]
    pub fn tool_state(&self) -> &ToolState {
        &self.state
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn numbering(&self) -> &SharedNumbering {
        &self.numbering
    }

    #[must_use]
    pub fn strata(&self) -> &SharedCounter {
        &self.strata
    }

    #[must_use]
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    // --- Tool handlers ---

    fn add_vertex(&mut self, pos: Point, closes: bool) -> Vec<Action> {
        if !self.has_required_type() {
            tracing::debug!(surface = ?self.kind, tool = ?self.tool, "click ignored: no type selected");
            return Vec::new();
        }
        match &mut self.state {
            ToolState::Drawing { points } => {
                let close_radius = self.settings.close_radius_px;
                if closes && points.len() >= 3 && points[0].distance(pos) <= close_radius {
                    return self.finish();
                }
                points.push(pos);
            }
            _ => self.state = ToolState::Drawing { points: vec![pos] },
        }
        vec![Action::RenderNeeded]
    }

    fn place_marker(&mut self, pos: Point) -> Vec<Action> {
        let kind = ElementKind::Marker { color: self.color.clone(), x: pos.x, y: pos.y, size: self.settings.marker_size };
        let mut actions = self.add_element(self.stamp(kind));
        actions.push(Action::MarkerPlaced(MarkerPayload {
            x: pos.x,
            y: pos.y,
            color: self.color.clone(),
            canvas_width: self.plot.width,
            canvas_height: self.plot.height,
        }));
        actions
    }

    fn place_termination(&mut self, pos: Point) -> Vec<Action> {
        match std::mem::take(&mut self.state) {
            ToolState::AwaitingTerminationEnd { at, number, .. } => {
                let label = termination_label(number);
                let second = self.stamp(ElementKind::Termination {
                    color: self.color.clone(),
                    x: pos.x,
                    y: pos.y,
                    label: label.clone(),
                    number,
                    is_first_point: false,
                });
                let mut actions = self.add_element(second);
                tracing::debug!(surface = ?self.kind, number, "termination pair placed");
                actions.push(Action::Hint(String::new()));
                actions.push(Action::TerminationPlaced(TerminationPayload::new(
                    number,
                    label,
                    self.color.clone(),
                    at,
                    pos,
                    (self.plot.width, self.plot.height),
                )));
                actions
            }
            _ => {
                let number = self.numbering.next();
                let label = termination_label(number);
                let first = self.stamp(ElementKind::Termination {
                    color: self.color.clone(),
                    x: pos.x,
                    y: pos.y,
                    label: label.clone(),
                    number,
                    is_first_point: true,
                });
                let mut actions = self.add_element(first.clone());
                self.state = ToolState::AwaitingTerminationEnd { first, at: pos, number };
                tracing::debug!(surface = ?self.kind, number, "termination started");
                actions.push(Action::Hint(format!("Click the other end of termination {label}")));
                actions
            }
        }
    }

    fn place_drilling(&mut self, pos: Point) -> Vec<Action> {
        match std::mem::take(&mut self.state) {
            ToolState::AwaitingDrillingTarget { at, .. } => {
                let line = self.stamp(ElementKind::DrillingLine { x1: at.x, y1: at.y, x2: at.x, y2: pos.y });
                let mut actions = self.add_element(line);
                actions.push(Action::Hint(String::new()));
                actions.push(Action::DrillingPlaced(DrillingPayload {
                    x: at.x,
                    y1: at.y.min(pos.y),
                    y2: at.y.max(pos.y),
                    canvas_width: self.plot.width,
                    canvas_height: self.plot.height,
                }));
                actions
            }
            _ => {
                let site = self.stamp(ElementKind::DrillingSite { x: pos.x, y: pos.y });
                let mut actions = self.add_element(site.clone());
                self.state = ToolState::AwaitingDrillingTarget { site, at: pos };
                actions.push(Action::Hint("Click the drilling target depth".to_owned()));
                actions
            }
        }
    }

    fn place_strata_number(&mut self, pos: Point) -> Vec<Action> {
        let number = self.strata.next();
        self.add_element(self.stamp(ElementKind::StrataNumber { number, x: pos.x, y: pos.y }))
    }

    fn open_text(&mut self, pos: Point) -> Vec<Action> {
        self.state = ToolState::EditingText { at: pos };
        vec![Action::EditTextRequested { at: pos }]
    }

    fn erase_at(&mut self, pos: Point) -> Vec<Action> {
        match self.find_element_at(pos) {
            Some(index) => self.remove_element(index),
            None => Vec::new(),
        }
    }

    // --- Helpers ---

    fn has_required_type(&self) -> bool {
        match self.tool {
            Tool::Surface => self.surface_type.is_some(),
            Tool::SystemTract => self.tract_type.is_some(),
            _ => true,
        }
    }

    fn shape_from(&self, points: Vec<Point>) -> Option<ElementKind> {
        match self.tool {
            Tool::Line => Some(ElementKind::Line { color: self.color.clone(), width: self.line_width, points }),
            Tool::Polygon => Some(ElementKind::Polygon { color: self.color.clone(), points }),
            Tool::Surface => self.surface_type.map(|surface_type| ElementKind::Surface {
                surface_type,
                color: surface_type.color().to_owned(),
                width: self.line_width,
                points,
            }),
            Tool::SystemTract => self.tract_type.map(|tract_type| ElementKind::SystemTract {
                tract_type,
                color: tract_type.color().to_owned(),
                points,
            }),
            _ => None,
        }
    }

    fn stamp(&self, kind: ElementKind) -> Element {
        Element::new(self.clock.now_ms(), kind)
    }

    /// Undo/redo removal side: take `element` out, preferring `index`.
    fn take_out(&mut self, element: &Element, index: usize) -> Vec<Action> {
        let Some(index) = self.elements.remove_matching(element, index) else {
            return Vec::new();
        };
        self.release_number(element);
        vec![
            Action::ElementRemoved { index, element: element.clone() },
            Action::StateChanged,
            Action::RenderNeeded,
        ]
    }

    /// Undo/redo insertion side: reinsert at its recorded index.
    fn put_back(&mut self, element: Element, index: usize) -> Vec<Action> {
        if let Some(n) = element.termination_number() {
            self.numbering.claim(n);
        }
        self.elements.insert(index, element.clone());
        vec![Action::ElementAdded(element), Action::StateChanged, Action::RenderNeeded]
    }

    /// Remove a provisional element and the undo entry that added it.
    fn retract(&mut self, element: &Element) -> Vec<Action> {
        let Some(index) = self.elements.remove_matching(element, self.elements.len().saturating_sub(1)) else {
            return Vec::new();
        };
        self.release_number(element);
        self.history.forget(element);
        vec![
            Action::ElementRemoved { index, element: element.clone() },
            Action::StateChanged,
            Action::RenderNeeded,
        ]
    }

    fn release_number(&self, element: &Element) {
        if let Some(n) = element.termination_number() {
            self.numbering.release(n);
        }
    }

    fn release_all(&self) {
        for element in self.elements.iter() {
            self.release_number(element);
        }
    }
}

fn termination_label(number: u32) -> String {
    format!("T{number}")
}

/// Drop vertices that repeat the previous one (a double-click lands twice).
fn dedupe_vertices(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_none_or(|last| last.distance(p) > DUPLICATE_VERTEX_PX) {
            out.push(p);
        }
    }
    out
}

/// An annotation surface bound to its drawing context.
pub struct Surface<C: DrawContext> {
    id: String,
    ctx: C,
    pub core: SurfaceCore,
}

impl<C: DrawContext> Surface<C> {
    /// Bind `core` to the drawing context found for surface `id`.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::MissingCanvas`] when no context was found; a surface
    /// cannot exist without its drawing target.
    pub fn new(id: &str, ctx: Option<C>, core: SurfaceCore) -> Result<Self, SurfaceError> {
        let Some(ctx) = ctx else {
            return Err(SurfaceError::MissingCanvas { id: id.to_owned() });
        };
        Ok(Self { id: id.to_owned(), ctx, core })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn context(&self) -> &C {
        &self.ctx
    }

    /// Draw the current state to the context.
    ///
    /// # Errors
    ///
    /// Propagates any failed `Canvas2D` call.
    pub fn render(&self) -> Result<(), JsValue> {
        render::draw(&self.ctx, &self.core)
    }

    // --- Delegated operations ---

    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.core.set_tool(tool)
    }

    pub fn on_pointer_down(&mut self, pos: Point) -> Vec<Action> {
        self.core.on_pointer_down(pos)
    }

    pub fn on_double_click(&mut self) -> Vec<Action> {
        self.core.on_double_click()
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        self.core.on_key_down(key)
    }

    pub fn add_element(&mut self, element: Element) -> Vec<Action> {
        self.core.add_element(element)
    }

    pub fn undo(&mut self) -> Vec<Action> {
        self.core.undo()
    }

    pub fn redo(&mut self) -> Vec<Action> {
        self.core.redo()
    }

    pub fn clear(&mut self) -> Vec<Action> {
        self.core.clear()
    }

    #[must_use]
    pub fn get_state(&self) -> Vec<Element> {
        self.core.get_state()
    }

    pub fn load_state(&mut self, elements: Vec<Element>) -> Vec<Action> {
        self.core.load_state(elements)
    }
}
