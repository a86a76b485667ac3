//! Configuration validation errors and semantic validation.

use crate::analysis::{AnalysisConfig, FitConfig, ValidationPolicy};
use crate::preset::Segment;
use chrono::NaiveDate;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 43,
            ValidationError::InvalidValue { .. } => 44,
            ValidationError::VersionMismatch { .. } => 45,
        }
    }
}

/// Validate the whole analysis configuration semantically.
pub fn validate_config(config: &AnalysisConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if let Some(ref segments) = config.model.segments {
        validate_segments("model.segments", segments)?;
    }
    validate_fit(&config.fit)?;
    validate_policy(&config.validation)?;
    Ok(())
}

/// Validate a segment list: non-empty and finite.
pub fn validate_segments(field: &str, segments: &[Segment]) -> ValidationResult<()> {
    if segments.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "At least one segment is required".to_string(),
        });
    }
    for (i, seg) in segments.iter().enumerate() {
        if !seg.intercept.is_finite() || !seg.slope.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: format!("{}[{}]", field, i),
                message: format!(
                    "Intercept and slope must be finite, got ({}, {})",
                    seg.intercept, seg.slope
                ),
            });
        }
    }
    Ok(())
}

/// Validate range boundaries: start at 0, finite, strictly ascending.
pub fn validate_boundaries(boundaries: &[f64]) -> ValidationResult<()> {
    let field = "fit.boundaries".to_string();
    match boundaries.first() {
        None => {
            return Err(ValidationError::InvalidValue {
                field,
                message: "At least one boundary (0) is required".to_string(),
            })
        }
        Some(&first) if first != 0.0 => {
            return Err(ValidationError::InvalidValue {
                field,
                message: format!("First boundary must be 0, got {}", first),
            })
        }
        _ => {}
    }
    if boundaries.iter().any(|b| !b.is_finite()) {
        return Err(ValidationError::InvalidValue {
            field,
            message: "Boundaries must be finite; the last range is open-ended".to_string(),
        });
    }
    if let Some(w) = boundaries.windows(2).find(|w| w[1] <= w[0]) {
        return Err(ValidationError::InvalidValue {
            field,
            message: format!(
                "Boundaries must be strictly ascending ({} is followed by {})",
                w[0], w[1]
            ),
        });
    }
    Ok(())
}

fn validate_fit(fit: &FitConfig) -> ValidationResult<()> {
    validate_boundaries(&fit.boundaries)?;
    if !fit.first_slope.is_finite() || fit.first_slope <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "fit.first_slope".to_string(),
            message: format!("Must be a positive number, got {}", fit.first_slope),
        });
    }
    if fit.override_below_samples == Some(0) {
        return Err(ValidationError::SemanticError(
            "fit.override_below_samples = 0 never applies; set override_first_slope = false instead"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_policy(policy: &ValidationPolicy) -> ValidationResult<()> {
    if !policy.min_rate.is_finite() || policy.min_rate < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "validation.min_rate".to_string(),
            message: format!("Must be a non-negative number, got {}", policy.min_rate),
        });
    }
    if let Some(ref date) = policy.followers_required_from {
        parse_record_date(date).ok_or_else(|| ValidationError::InvalidValue {
            field: "validation.followers_required_from".to_string(),
            message: format!("Expected YYYYMMDD, got {:?}", date),
        })?;
    }
    Ok(())
}

/// Parse an 8-digit `YYYYMMDD` date.
pub fn parse_record_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}
