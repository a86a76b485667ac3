//! Structured event vocabulary: stages, stable event names, and run context.

use serde::{Deserialize, Serialize};

/// Pipeline stages of a `giftscore` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading record files.
    Load,
    Normalize,
    /// Strict record checks.
    Validate,
    /// Conditions, slices, and ordering.
    Filter,
    /// Segmented regression and feature comparison.
    Fit,
    Classify,
    /// Writing the command payload.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Normalize => "normalize",
            Stage::Validate => "validate",
            Stage::Filter => "filter",
            Stage::Fit => "fit",
            Stage::Classify => "classify",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const LOAD_FINISHED: &str = "load.finished";
    pub const NORMALIZE_FINISHED: &str = "normalize.finished";
    pub const VALIDATE_FINISHED: &str = "validate.finished";
    pub const FILTER_FINISHED: &str = "filter.finished";

    // Fit stage
    pub const FIT_SEGMENT: &str = "fit.segment";
    pub const FIT_FINISHED: &str = "fit.finished";

    pub const CLASSIFY_FINISHED: &str = "classify.finished";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";

    pub const RUN_FAILED: &str = "run.failed";
}

/// Correlation context shared by every event of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }
}
