//! Daemon configuration — TOML file with environment variable overrides.
//!
//! Looks for `brewhubd.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values. This is the *daemon's* configuration; the
//! rig document (which devices exist) lives in its own file named by
//! `controller.config_path`.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Controller settings.
    pub controller: ControllerConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive for process-level tracing (`RUST_LOG` syntax).
    pub filter: String,
    /// Open the device log's debug gate at startup.
    pub debug: bool,
    /// File receiving pass/fail result records.
    pub results_file: String,
}

/// Controller configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Path to the rig document.
    pub config_path: String,
    /// Run without hardware: only the simulated device kinds are registered.
    pub dummy: bool,
}

impl Config {
    /// Load configuration from `brewhubd.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("brewhubd.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BREWHUB_CONFIG") {
            self.controller.config_path = val;
        }
        if let Ok(val) = std::env::var("BREWHUB_DUMMY") {
            self.controller.dummy = matches!(val.as_str(), "1" | "true" | "True");
        }
        if let Ok(val) = std::env::var("BREWHUB_DEBUG") {
            self.logging.debug = matches!(val.as_str(), "1" | "true" | "True");
        }
        if let Ok(val) = std::env::var("BREWHUB_RESULTS") {
            self.logging.results_file = val;
        }
        if let Ok(val) = std::env::var("BREWHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.controller.config_path.is_empty() {
            return Err(ConfigError::Validation(
                "controller.config_path must not be empty".to_string(),
            ));
        }
        if self.logging.results_file.is_empty() {
            return Err(ConfigError::Validation(
                "logging.results_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "brewhubd=info,brewhub=info".to_string(),
            debug: false,
            results_file: "results.log".to_string(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            config_path: "brewhub.toml".to_string(),
            dummy: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.controller.config_path, "brewhub.toml");
        assert!(!config.controller.dummy);
        assert!(!config.logging.debug);
        assert_eq!(config.logging.results_file, "results.log");
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.controller.config_path, "brewhub.toml");
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [logging]
            filter = 'debug'
            debug = true
            results_file = '/var/log/brew-results.log'

            [controller]
            config_path = '/etc/brewhub/rig.toml'
            dummy = true
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.filter, "debug");
        assert!(config.logging.debug);
        assert_eq!(config.logging.results_file, "/var/log/brew-results.log");
        assert_eq!(config.controller.config_path, "/etc/brewhub/rig.toml");
        assert!(config.controller.dummy);
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [controller]
            dummy = true
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.controller.dummy);
        assert_eq!(config.controller.config_path, "brewhub.toml");
        assert_eq!(config.logging.results_file, "results.log");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.controller.config_path, "brewhub.toml");
    }

    #[test]
    fn should_reject_empty_rig_path() {
        let mut config = Config::default();
        config.controller.config_path.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_results_file() {
        let mut config = Config::default();
        config.logging.results_file.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_default_configuration() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
