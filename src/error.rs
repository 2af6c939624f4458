//! Error types surfaced to the host.
//!
//! Only construction-time misconfiguration and explicit validation failures
//! are errors. Interaction mishaps (a one-point line, a click with no surface
//! type selected) reset the tool quietly instead, and persistence failures are
//! logged and absorbed where they happen.

/// Stable machine-readable code for an error, for the host to map to messages.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("drawing surface `{id}` not found")]
    MissingCanvas { id: String },
    #[error("drawing surface `{id}` has no 2D context")]
    MissingContext { id: String },
}

impl ErrorCode for SurfaceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCanvas { .. } => "E_MISSING_SURFACE",
            Self::MissingContext { .. } => "E_MISSING_CONTEXT",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TractError {
    #[error("invalid range {from}..{to}: both ends must be positive integers with from < to")]
    InvalidRange { from: i64, to: i64 },
    #[error("not enough terminations in range: found {found}, need at least 2")]
    NotEnoughTerminations { found: usize },
}

impl ErrorCode for TractError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRange { .. } => "E_INVALID_RANGE",
            Self::NotEnoughTerminations { .. } => "E_NOT_ENOUGH_TERMINATIONS",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        "E_CONFIG"
    }
}
