//! Paired cross-section and Wheeler surfaces.
//!
//! The board owns both surfaces plus the shared termination registry and
//! strata counter. Placements on the cross-section are projected onto the
//! Wheeler surface inside the same call that committed them, so the host
//! sees the source element and the projected one in a single batch of
//! [`BoardAction`]s.
//!
//! Projected elements are independent once injected: undoing or erasing the
//! source termination leaves its Wheeler line in place.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::clock::Clock;
use crate::config::{ExamConfig, ProjectionConfig};
use crate::doc::{Element, TractType};
use crate::engine::{Action, Surface, SurfaceCore, SurfaceKind};
use crate::error::{SurfaceError, TractError};
use crate::geom::Point;
use crate::input::{Key, Tool};
use crate::numbering::{SharedCounter, SharedNumbering};
use crate::project::{self, PlotArea};
use crate::render::DrawContext;

/// An [`Action`] tagged with the surface it happened on.
pub type BoardAction = (SurfaceKind, Action);

/// Where a surface draws: its element id, context (if found) and pixel size.
pub struct CanvasSlot<C> {
    pub id: String,
    pub ctx: Option<C>,
    pub width: f64,
    pub height: f64,
}

impl<C> CanvasSlot<C> {
    pub fn new(id: &str, ctx: Option<C>, width: f64, height: f64) -> Self {
        Self { id: id.to_owned(), ctx, width, height }
    }
}

/// Both element lists, in the persisted shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub cross_section: Vec<Element>,
    pub wheeler: Vec<Element>,
}

pub struct Board<C: DrawContext> {
    cross_section: Surface<C>,
    wheeler: Surface<C>,
    numbering: SharedNumbering,
    strata: SharedCounter,
    clock: Rc<dyn Clock>,
    projection: ProjectionConfig,
}

impl<C: DrawContext> Board<C> {
    /// Build both surfaces around one registry and strata counter.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::MissingCanvas`] naming whichever slot has no context.
    pub fn new(
        cross_section: CanvasSlot<C>,
        wheeler: CanvasSlot<C>,
        clock: Rc<dyn Clock>,
        config: &ExamConfig,
    ) -> Result<Self, SurfaceError> {
        let numbering = SharedNumbering::new();
        let strata = SharedCounter::new();

        let core = |kind, plot| {
            SurfaceCore::new(kind, plot, numbering.clone(), strata.clone(), clock.clone(), config.surface.clone())
        };
        let cross_core = core(SurfaceKind::CrossSection, PlotArea::full(cross_section.width, cross_section.height));
        let wheeler_core = core(
            SurfaceKind::Wheeler,
            PlotArea::new(wheeler.width, wheeler.height, config.projection.wheeler_padding),
        );

        let cross_section = Surface::new(&cross_section.id, cross_section.ctx, cross_core)?;
        let wheeler = Surface::new(&wheeler.id, wheeler.ctx, wheeler_core)?;
        tracing::info!(cross_section = cross_section.id(), wheeler = wheeler.id(), "board ready");

        Ok(Self { cross_section, wheeler, numbering, strata, clock, projection: config.projection.clone() })
    }

    #[must_use]
    pub fn surface(&self, kind: SurfaceKind) -> &Surface<C> {
        match kind {
            SurfaceKind::CrossSection => &self.cross_section,
            SurfaceKind::Wheeler => &self.wheeler,
        }
    }

    pub fn surface_mut(&mut self, kind: SurfaceKind) -> &mut Surface<C> {
        match kind {
            SurfaceKind::CrossSection => &mut self.cross_section,
            SurfaceKind::Wheeler => &mut self.wheeler,
        }
    }

    #[must_use]
    pub fn numbering(&self) -> &SharedNumbering {
        &self.numbering
    }

    #[must_use]
    pub fn strata(&self) -> &SharedCounter {
        &self.strata
    }

    // --- Routed operations ---

    /// Run `op` on one surface, then project whatever it placed.
    pub fn apply<F>(&mut self, kind: SurfaceKind, op: F) -> Vec<BoardAction>
    where
        F: FnOnce(&mut SurfaceCore) -> Vec<Action>,
    {
        let actions = op(&mut self.surface_mut(kind).core);
        self.route(kind, actions)
    }

    pub fn on_pointer_down(&mut self, kind: SurfaceKind, pos: Point) -> Vec<BoardAction> {
        self.apply(kind, |s| s.on_pointer_down(pos))
    }

    pub fn on_double_click(&mut self, kind: SurfaceKind) -> Vec<BoardAction> {
        self.apply(kind, SurfaceCore::on_double_click)
    }

    pub fn on_key_down(&mut self, kind: SurfaceKind, key: &Key) -> Vec<BoardAction> {
        self.apply(kind, |s| s.on_key_down(key))
    }

    pub fn set_tool(&mut self, kind: SurfaceKind, tool: Tool) -> Vec<BoardAction> {
        self.apply(kind, |s| s.set_tool(tool))
    }

    pub fn commit_text(&mut self, kind: SurfaceKind, text: &str) -> Vec<BoardAction> {
        self.apply(kind, |s| s.commit_text(text))
    }

    pub fn undo(&mut self, kind: SurfaceKind) -> Vec<BoardAction> {
        self.apply(kind, SurfaceCore::undo)
    }

    pub fn redo(&mut self, kind: SurfaceKind) -> Vec<BoardAction> {
        self.apply(kind, SurfaceCore::redo)
    }

    /// Build a systems tract from the Wheeler termination lines numbered
    /// `from..=to` and add it to the Wheeler surface.
    ///
    /// # Errors
    ///
    /// Any [`TractError`] from [`project::build_system_tract`]; nothing is
    /// added in that case.
    pub fn generate_tract(&mut self, from: i64, to: i64, tract_type: TractType) -> Result<Vec<BoardAction>, TractError> {
        let tract = project::build_system_tract(self.wheeler.core.elements(), from, to, tract_type, self.clock.now_ms())?;
        Ok(tag(SurfaceKind::Wheeler, self.wheeler.add_element(tract)))
    }

    // --- Whole-board state ---

    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot { cross_section: self.cross_section.get_state(), wheeler: self.wheeler.get_state() }
    }

    /// Replace both element lists. The registry and strata counter restart
    /// from the restored numbers.
    pub fn restore(&mut self, snapshot: BoardSnapshot) -> Vec<BoardAction> {
        self.numbering.reset();
        self.strata.reset();
        let mut out = tag(SurfaceKind::CrossSection, self.cross_section.load_state(snapshot.cross_section));
        out.extend(tag(SurfaceKind::Wheeler, self.wheeler.load_state(snapshot.wheeler)));
        out
    }

    /// Empty both surfaces and restart numbering.
    pub fn clear_all(&mut self) -> Vec<BoardAction> {
        let mut out = tag(SurfaceKind::CrossSection, self.cross_section.clear());
        out.extend(tag(SurfaceKind::Wheeler, self.wheeler.clear()));
        self.numbering.reset();
        self.strata.reset();
        out
    }

    /// Redraw both surfaces.
    ///
    /// # Errors
    ///
    /// Propagates the first failed `Canvas2D` call.
    pub fn render_all(&self) -> Result<(), JsValue> {
        self.cross_section.render()?;
        self.wheeler.render()
    }

    // --- Projection ---

    fn route(&mut self, source: SurfaceKind, actions: Vec<Action>) -> Vec<BoardAction> {
        let mut out = Vec::with_capacity(actions.len());
        for action in actions {
            let projected = if source == SurfaceKind::CrossSection { self.project(&action) } else { Vec::new() };
            out.push((source, action));
            out.extend(tag(SurfaceKind::Wheeler, projected));
        }
        out
    }

    fn project(&mut self, action: &Action) -> Vec<Action> {
        let target = self.wheeler.core.plot;
        let now = self.clock.now_ms();
        let element = match action {
            Action::TerminationPlaced(payload) => {
                Some(project::project_termination(payload, &target, self.projection.max_termination_count, now))
            }
            Action::DrillingPlaced(payload) => Some(project::project_drilling(payload, &target, now)),
            Action::MarkerPlaced(payload) => project::project_marker(payload, &target, self.projection.marker_policy, now),
            _ => None,
        };
        match element {
            Some(el) => {
                tracing::debug!(kind = el.type_name(), "projected onto wheeler");
                self.wheeler.add_element(el)
            }
            None => Vec::new(),
        }
    }
}

fn tag(kind: SurfaceKind, actions: Vec<Action>) -> Vec<BoardAction> {
    actions.into_iter().map(|a| (kind, a)).collect()
}
