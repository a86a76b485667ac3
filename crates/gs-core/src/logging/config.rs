//! Logging configuration from `GS_LOG`, `GS_LOG_FORMAT`, and CLI flags.
//!
//! An explicit level (`GS_LOG`, `-v`, `-q`) replaces any `RUST_LOG`
//! directives; without one, `RUST_LOG` is handed to the env filter as is.

use clap::ValueEnum;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable console lines.
    #[default]
    #[value(alias = "console")]
    Human,
    /// One JSON object per event.
    #[value(alias = "json")]
    Jsonl,
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    #[value(alias = "warning")]
    Warn,
    Error,
    #[value(alias = "quiet")]
    Off,
}

impl LogLevel {
    /// Level after `verbose` steps of `-v` or one `-q`.
    pub fn from_flags(verbose: u8, quiet: bool) -> Option<LogLevel> {
        if quiet {
            return Some(LogLevel::Off);
        }
        match verbose {
            0 => None,
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        use tracing_subscriber::filter::LevelFilter;
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `None` defers to `RUST_LOG`, then to [`LogLevel::default`].
    pub level: Option<LogLevel>,
}

impl LogConfig {
    /// Read the process environment, then apply CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|name| std::env::var(name).ok(), cli_level, cli_format)
    }

    /// [`LogConfig::from_env`] with an explicit variable lookup.
    ///
    /// Unparseable values are ignored.
    pub fn from_lookup<F>(
        lookup: F,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_level = |v: String| LogLevel::from_str(v.trim(), true).ok();
        let parse_format = |v: String| LogFormat::from_str(v.trim(), true).ok();
        LogConfig {
            format: cli_format
                .or_else(|| lookup("GS_LOG_FORMAT").and_then(parse_format))
                .unwrap_or_default(),
            level: cli_level.or_else(|| lookup("GS_LOG").and_then(parse_level)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn aliases_parse() {
        assert_eq!(LogFormat::from_str("JSON", true), Ok(LogFormat::Jsonl));
        assert_eq!(LogLevel::from_str("warning", true), Ok(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("quiet", true), Ok(LogLevel::Off));
        assert!(LogFormat::from_str("xml", true).is_err());
    }

    #[test]
    fn gs_log_sets_level_and_rust_log_is_left_alone() {
        let vars = [("GS_LOG", "error"), ("RUST_LOG", "debug")];
        let config = LogConfig::from_lookup(env(&vars), None, None);
        assert_eq!(config.level, Some(LogLevel::Error));

        let config = LogConfig::from_lookup(env(&[("RUST_LOG", "gs_core=debug")]), None, None);
        assert_eq!(config.level, None);
    }

    #[test]
    fn cli_overrides_env() {
        let config = LogConfig::from_lookup(
            env(&[("GS_LOG", "error"), ("GS_LOG_FORMAT", "jsonl")]),
            Some(LogLevel::Trace),
            Some(LogFormat::Human),
        );
        assert_eq!(config.level, Some(LogLevel::Trace));
        assert_eq!(config.format, LogFormat::Human);

        let vars = [("GS_LOG_FORMAT", "json"), ("GS_LOG", "loud")];
        let config = LogConfig::from_lookup(env(&vars), None, None);
        assert_eq!(config.format, LogFormat::Jsonl);
        assert_eq!(config.level, None);
    }

    #[test]
    fn flags_map_to_levels() {
        assert_eq!(LogLevel::from_flags(0, false), None);
        assert_eq!(LogLevel::from_flags(2, false), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_flags(3, true), Some(LogLevel::Off));
    }
}
