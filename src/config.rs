//! Engine configuration.
//!
//! The browser host passes a JSON object (any subset of fields; the rest take
//! the defaults below). The CLI reads overrides from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{CLOSE_RADIUS_PX, HISTORY_LIMIT, HIT_TOLERANCE_PX, MAX_TERMINATION_COUNT};
use crate::error::ConfigError;
use crate::project::{Insets, MarkerPolicy};

pub const DEFAULT_DURATION_MS: i64 = 2 * 60 * 60 * 1000;
pub const DEFAULT_WARNING_MINUTES: [i64; 3] = [30, 15, 5];
pub const DEFAULT_PERSIST_INTERVAL_MS: i64 = 10_000;
pub const DEFAULT_TIMER_STORAGE_KEY: &str = "examTimerState";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimerConfig {
    pub duration_ms: i64,
    /// Warning thresholds in minutes remaining.
    pub warning_minutes: Vec<i64>,
    /// How often a running countdown re-persists its record.
    pub persist_interval_ms: i64,
    pub storage_key: String,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            warning_minutes: DEFAULT_WARNING_MINUTES.to_vec(),
            persist_interval_ms: DEFAULT_PERSIST_INTERVAL_MS,
            storage_key: DEFAULT_TIMER_STORAGE_KEY.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurfaceConfig {
    pub history_limit: usize,
    pub hit_tolerance_px: f64,
    pub close_radius_px: f64,
    pub default_color: String,
    pub default_line_width: f64,
    pub marker_size: f64,
    pub font_size: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            history_limit: HISTORY_LIMIT,
            hit_tolerance_px: HIT_TOLERANCE_PX,
            close_radius_px: CLOSE_RADIUS_PX,
            default_color: "#ff0000".to_owned(),
            default_line_width: 3.0,
            marker_size: 12.0,
            font_size: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionConfig {
    pub max_termination_count: u32,
    pub marker_policy: MarkerPolicy,
    pub wheeler_padding: Insets,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            max_termination_count: MAX_TERMINATION_COUNT,
            marker_policy: MarkerPolicy::default(),
            wheeler_padding: Insets::WHEELER,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExamConfig {
    pub timer: TimerConfig,
    pub surface: SurfaceConfig,
    pub projection: ProjectionConfig,
}

impl ExamConfig {
    /// Parse a host-supplied JSON config. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] when the text is not a valid config object.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `WHEELER_DURATION_MS`: exam length, default 7200000
    /// - `WHEELER_WARNING_MINUTES`: comma list, default `30,15,5`
    /// - `WHEELER_HISTORY_LIMIT`: undo depth, default 50
    /// - `WHEELER_MARKER_POLICY`: `ignore` (default) or `square`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unparseable warning list
    /// or marker policy.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.timer.duration_ms = env_parse("WHEELER_DURATION_MS", DEFAULT_DURATION_MS);
        config.surface.history_limit = env_parse("WHEELER_HISTORY_LIMIT", HISTORY_LIMIT);
        if let Ok(raw) = std::env::var("WHEELER_WARNING_MINUTES") {
            config.timer.warning_minutes = parse_minutes(&raw)?;
        }
        if let Ok(raw) = std::env::var("WHEELER_MARKER_POLICY") {
            config.projection.marker_policy = parse_marker_policy(&raw)?;
        }
        Ok(config)
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_minutes(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<i64>() {
            Ok(m) if m > 0 => Ok(m),
            _ => Err(ConfigError::InvalidValue { key: "WHEELER_WARNING_MINUTES", value: raw.to_owned() }),
        })
        .collect()
}

fn parse_marker_policy(raw: &str) -> Result<MarkerPolicy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "ignore" => Ok(MarkerPolicy::Ignore),
        "square" => Ok(MarkerPolicy::Square),
        _ => Err(ConfigError::InvalidValue { key: "WHEELER_MARKER_POLICY", value: raw.to_owned() }),
    }
}
