//! Gift score common types and errors.
//!
//! This crate provides foundational types shared across the gs-* crates:
//! - Raw collector records and normalized metric records
//! - The unified error type with stable codes
//! - Output formats

pub mod error;
pub mod output;
pub mod record;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use output::OutputFormat;
pub use record::{FieldValue, GiftStats, GiftThresholds, NormalizedRecord, RankCode, RawRecord};

/// Schema version stamped on every JSON document the CLI prints.
pub const SCHEMA_VERSION: &str = "1.0.0";
