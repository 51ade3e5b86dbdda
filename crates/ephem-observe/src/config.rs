use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::{LoggerFormat, LoggerLevel};

/// Logger section of the daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` expression.
    pub level: LoggerLevel,
    /// Include event targets (module paths).
    pub with_targets: bool,
    /// Colorize text output when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Replace the filter (command-line override).
    pub fn with_level(mut self, level: LoggerLevel) -> Self {
        self.level = level;
        self
    }

    /// Color only if enabled and stdout is a terminal. Evaluate at init time.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = LoggerConfig::default();
        assert_eq!(cfg.format, LoggerFormat::Text);
        assert_eq!(cfg.level.as_str(), "info");
        assert!(cfg.with_targets);
        assert!(cfg.use_color);
    }

    #[test]
    fn partial_toml_section_keeps_defaults() {
        let cfg: LoggerConfig = toml::from_str(
            r#"
            format = "json"
            level = "ephem_core=debug,info"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.format, LoggerFormat::Json);
        assert_eq!(cfg.level.as_str(), "ephem_core=debug,info");
        assert!(cfg.with_targets);
    }

    #[test]
    fn empty_section_is_default() {
        let cfg: LoggerConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, LoggerConfig::default());
    }

    #[test]
    fn invalid_level_fails_deserialization() {
        assert!(toml::from_str::<LoggerConfig>(r#"level = "core=chatty""#).is_err());
    }

    #[test]
    fn with_level_overrides() {
        let cfg = LoggerConfig::default().with_level("debug".parse().unwrap());
        assert_eq!(cfg.level.as_str(), "debug");
    }
}
