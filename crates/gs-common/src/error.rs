//! Error types for gift score analysis.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation suggestions for humans
//!
//! Every failure here is fatal for the batch. The analysis is a deterministic
//! one-shot computation over static data, so retrying reproduces the same
//! error and nothing is marked recoverable except I/O.
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 30,
//!   "category": "fit",
//!   "message": "empty partition: no records with total_gift in [50000, 80000)",
//!   "recoverable": false,
//!   "context": { "lo": 50000.0, "hi": 80000.0 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for gift score operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Corrupted or incomplete upstream records.
    DataIntegrity,
    /// Malformed filter conditions or slice expressions.
    Condition,
    /// Regression preconditions that do not hold (empty partition, zero variance).
    Fit,
    /// Configuration file and preset errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::DataIntegrity => write!(f, "data_integrity"),
            ErrorCategory::Condition => write!(f, "condition"),
            ErrorCategory::Fit => write!(f, "fit"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for gift score analysis.
#[derive(Error, Debug)]
pub enum Error {
    // Data integrity errors (10-19)
    #[error("data integrity failure: {0}")]
    DataIntegrity(String),

    #[error("record {record} is missing required field '{field}'")]
    MissingField { record: String, field: String },

    #[error("record {record} has rate {rate:.3} at or below the sanity floor {floor}")]
    RateBelowFloor {
        record: String,
        rate: f64,
        floor: f64,
    },

    // Condition errors (20-29)
    #[error("invalid condition '{text}': {reason}")]
    ConditionSyntax { text: String, reason: String },

    #[error("invalid slice expression '{0}'")]
    InvalidSlice(String),

    // Fit errors (30-39)
    #[error("empty partition: no records with total_gift in [{lo}, {hi})")]
    EmptyPartition { lo: f64, hi: f64 },

    #[error("zero variance in livescore over {samples} samples; R^2 is undefined")]
    ZeroVariance { samples: usize },

    #[error("segments {index} and {next} are parallel (slope {slope}); no breakpoint exists")]
    ParallelSegments {
        index: usize,
        next: usize,
        slope: f64,
    },

    #[error("design matrix is rank deficient: {0}")]
    SingularDesign(String),

    #[error("piecewise model needs at least one segment")]
    EmptyModel,

    // Configuration errors (40-49)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid range boundaries: {0}")]
    InvalidBoundaries(String),

    #[error("unknown model preset '{0}'")]
    UnknownPreset(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a data integrity failure.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::DataIntegrity(msg.into())
    }

    /// Shorthand for a condition syntax failure.
    pub fn condition(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ConditionSyntax {
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Data integrity errors
    /// - 20-29: Condition errors
    /// - 30-39: Fit errors
    /// - 40-49: Configuration errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::DataIntegrity(_) => 10,
            Error::MissingField { .. } => 11,
            Error::RateBelowFloor { .. } => 12,
            Error::ConditionSyntax { .. } => 20,
            Error::InvalidSlice(_) => 21,
            Error::EmptyPartition { .. } => 30,
            Error::ZeroVariance { .. } => 31,
            Error::ParallelSegments { .. } => 32,
            Error::SingularDesign(_) => 33,
            Error::EmptyModel => 34,
            Error::Config(_) => 40,
            Error::InvalidBoundaries(_) => 41,
            Error::UnknownPreset(_) => 42,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::DataIntegrity(_) | Error::MissingField { .. } | Error::RateBelowFloor { .. } => {
                ErrorCategory::DataIntegrity
            }

            Error::ConditionSyntax { .. } | Error::InvalidSlice(_) => ErrorCategory::Condition,

            Error::EmptyPartition { .. }
            | Error::ZeroVariance { .. }
            | Error::ParallelSegments { .. }
            | Error::SingularDesign(_)
            | Error::EmptyModel => ErrorCategory::Fit,

            Error::Config(_) | Error::InvalidBoundaries(_) | Error::UnknownPreset(_) => {
                ErrorCategory::Config
            }

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Only I/O may succeed on a second attempt; everything else is a
    /// property of the input data or the analysis setup.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::DataIntegrity(_) => {
                "Inspect the offending record; a zero total or empty gift list means the collector wrote a broken file."
            }
            Error::MissingField { .. } => {
                "Re-collect the record with the missing field, or disable strict validation."
            }
            Error::RateBelowFloor { .. } => {
                "The score/gift ratio is implausibly low; check the collector for a truncated gift list."
            }
            Error::ConditionSyntax { .. } => {
                "Use 'key<op>value' with one of <, >, =, <=, >=, =~ (for example 'rank>1000')."
            }
            Error::InvalidSlice(_) => {
                "Use a date (20250101), a score floor (100k+), a rank code, or 'date/rank'."
            }
            Error::EmptyPartition { .. } => {
                "A range boundary leaves no records in one segment; adjust --boundary values."
            }
            Error::ZeroVariance { .. } => {
                "All scores in the segment are identical; widen the range or add data."
            }
            Error::ParallelSegments { .. } => {
                "Two adjacent segments share a slope; merge them or move the boundary."
            }
            Error::SingularDesign(_) => {
                "Regressors are perfectly collinear; drop a feature or add more varied data."
            }
            Error::EmptyModel => "Provide at least one (intercept, slope) segment.",
            Error::Config(_) => {
                "Run 'giftscore check' to validate configuration, or check syntax in the config file."
            }
            Error::InvalidBoundaries(_) => {
                "Boundaries must start at 0 and be strictly ascending."
            }
            Error::UnknownPreset(_) => "Use one of the presets listed by 'giftscore model --help'.",
            Error::Io(_) => "Check that the input paths exist and are readable.",
            Error::Json(_) => {
                "Invalid JSON in an input file. Check syntax with 'jq . <file>'."
            }
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::DataIntegrity(_) => "Data Integrity Error",
            Error::MissingField { .. } => "Missing Required Field",
            Error::RateBelowFloor { .. } => "Rate Below Sanity Floor",
            Error::ConditionSyntax { .. } => "Condition Syntax Error",
            Error::InvalidSlice(_) => "Invalid Slice Expression",
            Error::EmptyPartition { .. } => "Empty Partition",
            Error::ZeroVariance { .. } => "Degenerate Fit",
            Error::ParallelSegments { .. } => "Parallel Segments",
            Error::SingularDesign(_) => "Singular Design Matrix",
            Error::EmptyModel => "Empty Model",
            Error::Config(_) => "Configuration Error",
            Error::InvalidBoundaries(_) => "Invalid Boundaries",
            Error::UnknownPreset(_) => "Unknown Preset",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Remediation hint.
    pub remediation: String,

    /// Additional structured context (e.g., record label, range bounds).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::MissingField { record, field } => {
                context.insert("record".to_string(), serde_json::json!(record));
                context.insert("field".to_string(), serde_json::json!(field));
            }
            Error::RateBelowFloor {
                record,
                rate,
                floor,
            } => {
                context.insert("record".to_string(), serde_json::json!(record));
                context.insert("rate".to_string(), serde_json::json!(rate));
                context.insert("floor".to_string(), serde_json::json!(floor));
            }
            Error::ConditionSyntax { text, .. } => {
                context.insert("condition".to_string(), serde_json::json!(text));
            }
            Error::EmptyPartition { lo, hi } => {
                context.insert("lo".to_string(), serde_json::json!(lo));
                // Infinity is not representable in JSON.
                if hi.is_finite() {
                    context.insert("hi".to_string(), serde_json::json!(hi));
                }
            }
            Error::ZeroVariance { samples } => {
                context.insert("samples".to_string(), serde_json::json!(samples));
            }
            Error::ParallelSegments { index, next, .. } => {
                context.insert("segment".to_string(), serde_json::json!(index));
                context.insert("next_segment".to_string(), serde_json::json!(next));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            remediation: err.remediation().to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}
