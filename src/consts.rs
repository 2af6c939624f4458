//! Shared numeric constants for the engine.

// ── History ─────────────────────────────────────────────────────

/// Maximum number of undo entries kept per surface.
pub const HISTORY_LIMIT: usize = 50;

// ── Hit-testing ─────────────────────────────────────────────────

/// Pointer slop in pixels for thin strokes (polylines, projection lines).
pub const HIT_TOLERANCE_PX: f64 = 10.0;

/// Hit radius in pixels for termination points and drilling sites.
pub const POINT_HIT_RADIUS_PX: f64 = 10.0;

/// Hit radius in pixels for strata number labels.
pub const STRATA_HIT_RADIUS_PX: f64 = 12.0;

/// Average glyph advance as a fraction of font size, for text bounding boxes.
pub const TEXT_ADVANCE_RATIO: f64 = 0.6;

// ── Drawing tools ───────────────────────────────────────────────

/// A polygon click within this radius of the first vertex closes the shape.
pub const CLOSE_RADIUS_PX: f64 = 15.0;

/// Two consecutive vertices closer than this are treated as one click.
pub const DUPLICATE_VERTEX_PX: f64 = 0.5;

/// Fill alpha for polygons and system tracts.
pub const POLYGON_FILL_ALPHA: f64 = 0.3;

// ── Projection ──────────────────────────────────────────────────

/// Highest termination number the registry tracks. Larger numbers in loaded
/// state are kept on their elements but never advance the counter.
pub const MAX_REGISTRY_NUMBER: u32 = 1_000_000;

/// Termination number that maps to the top of the Wheeler plot.
pub const MAX_TERMINATION_COUNT: u32 = 50;

/// Stroke width of projected termination lines.
pub const TERMINATION_LINE_WIDTH: f64 = 2.0;

/// Edge length of the square marker projected under `MarkerPolicy::Square`.
pub const PROJECTED_MARKER_SIZE: f64 = 8.0;

// ── Timer ───────────────────────────────────────────────────────

/// Milliseconds in one minute.
pub const MS_PER_MINUTE: i64 = 60_000;
