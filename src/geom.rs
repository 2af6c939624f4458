//! Geometry and colour helpers shared by hit-testing, rendering and projection.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// A point in surface pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Shortest distance from `p` to the segment `a`–`b`.
///
/// Degenerate segments (`a == b`) fall back to point distance.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq < 1e-12 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * abx, a.y + t * aby))
}

/// Shortest distance from `p` to an open polyline. `f64::INFINITY` when empty.
#[must_use]
pub fn distance_to_polyline(p: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => p.distance(*only),
        _ => points
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Even-odd ray-casting containment test. Polygons with fewer than three
/// vertices contain nothing.
#[must_use]
pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > p.y) != (pj.y > p.y) && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Vertex average, used to anchor polygon labels.
#[must_use]
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

/// Parse `#RGB` or `#RRGGBB` values into RGB channels.
#[must_use]
pub fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => Some((channel(&hex[0..1].repeat(2))?, channel(&hex[1..2].repeat(2))?, channel(&hex[2..3].repeat(2))?)),
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

fn channel(hex: &str) -> Option<u8> {
    u8::from_str_radix(hex, 16).ok()
}

/// CSS `rgba(...)` string for a hex colour at the given alpha.
///
/// Unparseable colours are passed through unchanged so named CSS colours
/// still render (opaque).
#[must_use]
pub fn with_alpha(color: &str, alpha: f64) -> String {
    match parse_hex_rgb(color) {
        Some((r, g, b)) => format!("rgba({r}, {g}, {b}, {})", alpha.clamp(0.0, 1.0)),
        None => color.to_owned(),
    }
}

/// Linear blend of two hex colours; `t = 0` yields `a`, `t = 1` yields `b`.
/// Returns `a` unchanged when either side fails to parse.
#[must_use]
pub fn blend(a: &str, b: &str, t: f64) -> String {
    let (Some((ar, ag, ab)), Some((br, bg, bb))) = (parse_hex_rgb(a), parse_hex_rgb(b)) else {
        return a.to_owned();
    };
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| -> u8 {
        let v = f64::from(x) + (f64::from(y) - f64::from(x)) * t;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let out = v.round().clamp(0.0, 255.0) as u8;
        out
    };
    format!("#{:02x}{:02x}{:02x}", mix(ar, br), mix(ag, bg), mix(ab, bb))
}
