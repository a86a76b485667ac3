//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG path →
//! system path → built-in defaults.

use crate::analysis::AnalysisConfig;
use crate::validate::ValidationResult;
use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/giftscore/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
const ENV_CONFIG_PATH: &str = "GIFTSCORE_CONFIG";
const ENV_CONFIG_DIR: &str = "GIFTSCORE_CONFIG_DIR";

/// Standard config file name.
const CONFIG_FILENAME: &str = "giftscore.toml";

/// Application name for XDG directories.
const APP_NAME: &str = "giftscore";

/// A loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: AnalysisConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Find the configuration file using the standard resolution order.
///
/// An explicit CLI path is returned even if it does not exist, so that
/// loading it reports the missing file instead of silently using defaults.
pub fn resolve_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    // 1. CLI argument
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    // 2. Environment variable (direct path)
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 3. Environment variable (config dir)
    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 4. XDG config directory
    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    // 5. System config
    let system_path = system_config_dir().join(CONFIG_FILENAME);
    if system_path.exists() {
        return (Some(system_path), ConfigSource::SystemConfig);
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Resolve and load the configuration. Falls back to defaults when no file is found.
pub fn load_config(cli_path: Option<&Path>) -> ValidationResult<ResolvedConfig> {
    let (path, source) = resolve_config_path(cli_path);
    let config = match path {
        Some(ref p) => AnalysisConfig::load(p)?,
        None => AnalysisConfig::default(),
    };
    Ok(ResolvedConfig {
        config,
        path,
        source,
    })
}

/// Get the XDG config directory for giftscore.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn cli_path_wins_even_when_missing() {
        let (path, source) = resolve_config_path(Some(Path::new("/nonexistent/gs.toml")));
        assert_eq!(path, Some(PathBuf::from("/nonexistent/gs.toml")));
        assert_eq!(source, ConfigSource::CliArgument);
        assert!(load_config(Some(Path::new("/nonexistent/gs.toml"))).is_err());
    }

    #[test]
    fn cli_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gs.toml");
        std::fs::write(&path, "[fit]\nexclude_outliers = false\n").unwrap();
        let resolved = load_config(Some(&path)).unwrap();
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert!(!resolved.config.fit.exclude_outliers);
    }

    #[test]
    fn test_system_config_dir() {
        assert_eq!(system_config_dir(), PathBuf::from("/etc/giftscore"));
    }
}
