//! Gift score configuration loading and validation.
//!
//! This crate provides:
//! - Built-in expected-score model presets
//! - Typed analysis configuration (model, fit, validation policy)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots for fit reports

pub mod analysis;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use analysis::{AnalysisConfig, FitConfig, ModelConfig, ValidationPolicy};
pub use preset::{PresetError, PresetName, Segment};
pub use resolve::{load_config, resolve_config_path, ConfigSource, ResolvedConfig};
pub use snapshot::ConfigSnapshot;
pub use validate::{
    parse_record_date, validate_boundaries, validate_config, ValidationError, ValidationResult,
};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
