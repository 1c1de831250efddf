// src/error.rs
//! Error handling for the planner.
//!
//! Most failures in the planner never reach this type: bad numeric input is
//! replaced by defaults and failed texture loads fall back to a generated
//! checkerboard. What is left are caller mistakes on the programmatic API
//! (unknown tile names, unknown form fields), malformed input files and loader
//! I/O.

use thiserror::Error;

/// Main error type.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PlannerError {
    /// I/O errors while reading texture files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Texture decoding failures.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Malformed JSON input record.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No design with this name in the tile catalog.
    #[error("unknown tile design: {0}")]
    UnknownTile(String),

    /// Layout pattern other than `straight` or `diagonal`.
    #[error("invalid layout pattern: {0}")]
    InvalidPattern(String),

    /// Form field name not recognised by the input surface.
    #[error("unknown input field: {0}")]
    UnknownField(String),

    /// Simple custom message.
    #[error("{0}")]
    Custom(String),
}

impl PlannerError {
    #[inline]
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Self::Custom(msg.into())
    }

    #[inline]
    pub fn is_unknown_tile(&self) -> bool {
        matches!(self, PlannerError::UnknownTile(_))
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PlannerError>;
