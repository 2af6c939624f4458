//! Document model: drawable elements and the ordered per-surface element list.
//!
//! An [`Element`] is a timestamp plus an [`ElementKind`], a closed tagged union
//! of every shape the exam tools can produce. The list position of an element
//! is its z-order: later elements draw on top and are hit-tested first.
//!
//! Elements serialize to plain JSON objects carrying a `type` discriminant and
//! camelCase fields, which is both the persisted shape and the export shape.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};

use crate::geom::Point;

/// Colour used for every projected termination line, whatever the source colour.
pub const TERMINATION_LINE_COLOR: &str = "#000000";

/// Stratigraphic surface categories, each with a fixed display colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceType {
    /// Sequence boundary (SB).
    SequenceBoundary,
    /// Transgressive surface (TS).
    TransgressiveSurface,
    /// Maximum flooding surface (MFS).
    MaximumFloodingSurface,
    /// Basal surface of forced regression (BSFR).
    BasalSurfaceForcedRegression,
    /// Correlative conformity (CC).
    CorrelativeConformity,
}

impl SurfaceType {
    /// Stroke colour for this surface type.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::SequenceBoundary => "#e53935",
            Self::TransgressiveSurface => "#1e88e5",
            Self::MaximumFloodingSurface => "#43a047",
            Self::BasalSurfaceForcedRegression => "#fb8c00",
            Self::CorrelativeConformity => "#8e24aa",
        }
    }

    /// Short label drawn next to the surface.
    #[must_use]
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::SequenceBoundary => "SB",
            Self::TransgressiveSurface => "TS",
            Self::MaximumFloodingSurface => "MFS",
            Self::BasalSurfaceForcedRegression => "BSFR",
            Self::CorrelativeConformity => "CC",
        }
    }
}

/// Systems tract categories, each with a fixed fill colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TractType {
    /// Lowstand systems tract.
    Lst,
    /// Transgressive systems tract.
    Tst,
    /// Highstand systems tract.
    Hst,
    /// Falling-stage systems tract.
    Fsst,
}

impl TractType {
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Lst => "#fdd835",
            Self::Tst => "#4fc3f7",
            Self::Hst => "#81c784",
            Self::Fsst => "#ff8a65",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Lst => "LST",
            Self::Tst => "TST",
            Self::Hst => "HST",
            Self::Fsst => "FSST",
        }
    }
}

/// A drawable element. `timestamp` is epoch milliseconds at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub timestamp: i64,
    #[serde(flatten)]
    pub kind: ElementKind,
}

/// Variant-specific element data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ElementKind {
    /// Open polyline, at least two points.
    Line { color: String, width: f64, points: Vec<Point> },
    /// Closed filled shape, at least three points.
    Polygon { color: String, points: Vec<Point> },
    /// Triangular glyph centred on `(x, y)`.
    Marker { color: String, x: f64, y: f64, size: f64 },
    Text { color: String, x: f64, y: f64, text: String, font_size: f64 },
    /// One end of a linked termination pair; `number` ties the pair together.
    Termination { color: String, x: f64, y: f64, label: String, number: u32, is_first_point: bool },
    /// Projected termination span on the Wheeler surface. Always drawn black.
    TerminationLine { color: String, x1: f64, x2: f64, y: f64, label: String, number: u32, line_width: f64 },
    /// Stratigraphic surface polyline; colour follows `surface_type`.
    Surface { surface_type: SurfaceType, color: String, width: f64, points: Vec<Point> },
    /// Closed systems-tract polygon; colour follows `tract_type`.
    SystemTract { tract_type: TractType, color: String, points: Vec<Point> },
    StrataNumber { number: u32, x: f64, y: f64 },
    DrillingSite { x: f64, y: f64 },
    DrillingLine { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Projected drilling position on the Wheeler surface, spanning the plot height.
    DrillingProjection { x: f64, y1: f64, y2: f64 },
}

impl Element {
    #[must_use]
    pub fn new(timestamp: i64, kind: ElementKind) -> Self {
        Self { timestamp, kind }
    }

    /// The `type` discriminant as it appears in JSON.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ElementKind::Line { .. } => "line",
            ElementKind::Polygon { .. } => "polygon",
            ElementKind::Marker { .. } => "marker",
            ElementKind::Text { .. } => "text",
            ElementKind::Termination { .. } => "termination",
            ElementKind::TerminationLine { .. } => "terminationLine",
            ElementKind::Surface { .. } => "surface",
            ElementKind::SystemTract { .. } => "systemTract",
            ElementKind::StrataNumber { .. } => "strataNumber",
            ElementKind::DrillingSite { .. } => "drillingSite",
            ElementKind::DrillingLine { .. } => "drillingLine",
            ElementKind::DrillingProjection { .. } => "drillingProjection",
        }
    }

    /// Registry number held by a termination point, if this is one.
    #[must_use]
    pub fn termination_number(&self) -> Option<u32> {
        match self.kind {
            ElementKind::Termination { number, .. } => Some(number),
            _ => None,
        }
    }
}

/// Ordered element list for one surface. Index order is z-order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementList {
    elements: Vec<Element>,
}

impl ElementList {
    #[must_use]
    pub fn new() -> Self {
        Self { elements: Vec::new() }
    }

    /// Append on top. Returns the index the element landed at.
    pub fn push(&mut self, element: Element) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    /// Insert at `index`, clamped to the current length.
    pub fn insert(&mut self, index: usize, element: Element) -> usize {
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
        index
    }

    /// Remove and return the element at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Element> {
        (index < self.elements.len()).then(|| self.elements.remove(index))
    }

    /// Remove `element`, preferring `hint` when it still holds an equal element,
    /// otherwise the topmost equal element. Returns the index it was removed from.
    pub fn remove_matching(&mut self, element: &Element, hint: usize) -> Option<usize> {
        let index = if self.elements.get(hint) == Some(element) {
            hint
        } else {
            self.elements.iter().rposition(|e| e == element)?
        };
        self.elements.remove(index);
        Some(index)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Bottom-to-top iteration (draw order).
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    /// Replace the whole list.
    pub fn replace(&mut self, elements: Vec<Element>) {
        self.elements = elements;
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
