//! Input model: tools, keys, and the per-tool interaction state machine.
//!
//! `Tool` is the user's selected instrument. `ToolState` is whatever the
//! active tool has accumulated between clicks: vertices of an unfinished
//! polyline, the committed first half of a two-click placement, or the anchor
//! of an open text editor. Each variant carries exactly what cancelling it
//! needs to undo, so no provisional element or number can leak.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::doc::Element;
use crate::geom::Point;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    /// Open polyline, finished explicitly.
    #[default]
    Line,
    /// Closed filled polygon.
    Polygon,
    /// Single-click rollover marker.
    Marker,
    /// Two-click stratal termination pair.
    Termination,
    /// Two-click drilling rig and target.
    Drilling,
    /// Single-click strata label.
    StrataNumber,
    /// Inline text label.
    Text,
    /// Remove the topmost element under the pointer.
    Eraser,
    /// Typed stratigraphic surface polyline.
    Surface,
    /// Typed systems-tract polygon.
    SystemTract,
}

impl Tool {
    /// Whether this tool accumulates vertices across clicks.
    #[must_use]
    pub fn is_multi_click(self) -> bool {
        matches!(self, Self::Line | Self::Polygon | Self::Surface | Self::SystemTract)
    }

    /// Whether the finished shape is closed (polygon semantics).
    #[must_use]
    pub fn is_closed_shape(self) -> bool {
        matches!(self, Self::Polygon | Self::SystemTract)
    }

    /// Whether this tool places a pair of linked elements over two clicks.
    #[must_use]
    pub fn is_two_click(self) -> bool {
        matches!(self, Self::Termination | Self::Drilling)
    }

    /// Fewest vertices a finished shape of this tool may have.
    #[must_use]
    pub fn min_points(self) -> usize {
        if self.is_closed_shape() { 3 } else { 2 }
    }
}

/// A keyboard key, holding the name the browser reports (e.g. `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }

    #[must_use]
    pub fn is_enter(&self) -> bool {
        self.0 == "Enter"
    }
}

/// In-progress interaction for the active tool.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolState {
    /// Nothing pending; the next click starts a fresh operation.
    #[default]
    Idle,
    /// Vertices of an unfinished polyline, polygon, surface or tract.
    Drawing {
        /// Uncommitted vertices in click order.
        points: Vec<Point>,
    },
    /// First termination point committed; waiting for the second click.
    AwaitingTerminationEnd {
        /// The committed first-click element, removed again on cancel.
        first: Element,
        /// Where the first click landed.
        at: Point,
        /// Registry number allocated for the pair, recycled on cancel.
        number: u32,
    },
    /// Drilling site committed; waiting for the target click.
    AwaitingDrillingTarget {
        /// The committed site element, removed again on cancel.
        site: Element,
        /// Where the rig was placed.
        at: Point,
    },
    /// Host text editor open at `at`.
    EditingText { at: Point },
}

impl ToolState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Uncommitted vertices, empty unless drawing.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        match self {
            Self::Drawing { points } => points,
            _ => &[],
        }
    }
}
