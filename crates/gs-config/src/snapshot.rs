//! Configuration snapshots for reproducible fit reports.
//!
//! A snapshot captures the effective configuration at the start of a run so
//! a fitted model can be traced back to the exact settings that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analysis::AnalysisConfig;
use crate::resolve::ResolvedConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the configuration was loaded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Source of the configuration.
    pub source: String,

    /// SHA-256 of the canonical JSON form of the effective configuration.
    pub config_hash: String,

    /// Model preset name, or "custom".
    pub model: String,

    /// Fit range boundaries.
    pub boundaries: Vec<f64>,
}

impl ConfigSnapshot {
    /// Capture a snapshot of a resolved configuration.
    pub fn capture(resolved: &ResolvedConfig) -> Self {
        let config = &resolved.config;
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            path: resolved.path.as_ref().map(|p| p.display().to_string()),
            source: resolved.source.to_string(),
            config_hash: config_hash(config),
            model: config.model.source_name(),
            boundaries: config.fit.boundaries.clone(),
        }
    }

    /// Check whether two snapshots describe the same effective configuration.
    pub fn same_config(&self, other: &ConfigSnapshot) -> bool {
        self.config_hash == other.config_hash
    }
}

/// Hex SHA-256 of the configuration's JSON serialization.
pub fn config_hash(config: &AnalysisConfig) -> String {
    let bytes = serde_json::to_vec(config).unwrap_or_default();
    hex::encode(Sha256::digest(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ConfigSource;

    fn resolved(config: AnalysisConfig) -> ResolvedConfig {
        ResolvedConfig {
            config,
            path: None,
            source: ConfigSource::BuiltinDefault,
        }
    }

    #[test]
    fn hash_is_stable_and_sensitive() {
        let a = AnalysisConfig::default();
        let mut b = AnalysisConfig::default();
        assert_eq!(config_hash(&a), config_hash(&b));
        b.fit.exclude_outliers = false;
        assert_ne!(config_hash(&a), config_hash(&b));
        assert_eq!(config_hash(&a).len(), 64);
    }

    #[test]
    fn snapshot_summarizes() {
        let snap = ConfigSnapshot::capture(&resolved(AnalysisConfig::default()));
        assert_eq!(snap.model, "ru-v2");
        assert_eq!(snap.source, "builtin default");
        assert_eq!(snap.boundaries, vec![0.0, 50_000.0]);
        assert!(snap.path.is_none());

        let again = ConfigSnapshot::capture(&resolved(AnalysisConfig::default()));
        assert!(snap.same_config(&again));
    }
}
