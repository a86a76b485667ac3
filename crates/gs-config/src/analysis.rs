//! Analysis configuration: which model to use, how to fit, how strictly to validate.
//!
//! Loaded from TOML or JSON (chosen by file extension). Every section and
//! field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! schema_version = "1.0.0"
//!
//! [model]
//! preset = "ru-v2"
//!
//! [fit]
//! boundaries = [0, 50000]
//! exclude_outliers = true
//! override_first_slope = true
//! first_slope = 3.0
//!
//! [validation]
//! strict = true
//! min_rate = 1.6
//! followers_required_from = "20250401"
//! ```

use crate::preset::{PresetName, Segment};
use crate::validate::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub fit: FitConfig,

    #[serde(default)]
    pub validation: ValidationPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            schema_version: default_schema_version(),
            model: ModelConfig::default(),
            fit: FitConfig::default(),
            validation: ValidationPolicy::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration file. `.toml` files are parsed as TOML, anything else as JSON.
    pub fn load(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);
        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> ValidationResult<Self> {
        toml::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    pub fn from_json_str(content: &str) -> ValidationResult<Self> {
        serde_json::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))
    }
}

/// Which expected-score model is active.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Built-in calibration snapshot.
    #[serde(default)]
    pub preset: PresetName,

    /// Explicit segments; when present they replace the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
}

impl ModelConfig {
    /// Segments of the configured model.
    pub fn segments(&self) -> Vec<Segment> {
        match &self.segments {
            Some(custom) => custom.clone(),
            None => self.preset.segments(),
        }
    }

    /// Short description of where the segments come from.
    pub fn source_name(&self) -> String {
        match self.segments {
            Some(_) => "custom".to_string(),
            None => self.preset.to_string(),
        }
    }
}

/// Segmented regression settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitConfig {
    /// Lower edges of the total-gift ranges; the last range is open-ended.
    #[serde(default = "default_boundaries")]
    pub boundaries: Vec<f64>,

    /// Drop records under the exclusion line from every range but the first.
    #[serde(default = "default_true")]
    pub exclude_outliers: bool,

    /// Fit the lowest range without an intercept.
    #[serde(default = "default_true")]
    pub origin_first_segment: bool,

    /// Replace the first segment's fitted slope with `first_slope`.
    #[serde(default = "default_true")]
    pub override_first_slope: bool,

    #[serde(default = "default_first_slope")]
    pub first_slope: f64,

    /// Only override when the first range has fewer samples than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_below_samples: Option<usize>,

    /// Compute AIC and VIF per segment.
    #[serde(default = "default_true")]
    pub diagnostics: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            boundaries: default_boundaries(),
            exclude_outliers: true,
            origin_first_segment: true,
            override_first_slope: true,
            first_slope: default_first_slope(),
            override_below_samples: None,
            diagnostics: true,
        }
    }
}

/// Optional data-quality gate applied after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationPolicy {
    #[serde(default)]
    pub strict: bool,

    /// Rates at or below this are treated as collection bugs.
    #[serde(default = "default_min_rate")]
    pub min_rate: f64,

    /// Records dated on or after this `YYYYMMDD` date must carry `followers`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers_required_from: Option<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy {
            strict: false,
            min_rate: default_min_rate(),
            followers_required_from: None,
        }
    }
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_boundaries() -> Vec<f64> {
    vec![0.0, 50_000.0]
}

fn default_true() -> bool {
    true
}

fn default_first_slope() -> f64 {
    3.0
}

fn default_min_rate() -> f64 {
    1.6
}
