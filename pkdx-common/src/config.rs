//! Configuration file resolution and TOML loading
//!
//! Config file resolution follows the priority order used by every pkdx binary:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config file (`<config_dir>/pkdx/<module>.toml`), if present
//! 4. Compiled defaults (no file)

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Logging configuration shared by all binaries
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` argument
    CommandLine(PathBuf),
    /// Environment variable
    Environment(PathBuf),
    /// Per-user config directory
    UserFile(PathBuf),
    /// No file; compiled defaults only
    Defaults,
}

impl ConfigSource {
    /// Path of the file to read, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p) | ConfigSource::Environment(p) | ConfigSource::UserFile(p) => {
                Some(p)
            }
            ConfigSource::Defaults => None,
        }
    }

    /// Explicitly named files must exist; the implicit user file is optional
    fn is_explicit(&self) -> bool {
        matches!(self, ConfigSource::CommandLine(_) | ConfigSource::Environment(_))
    }
}

/// Resolves the TOML config file for one module
pub struct ConfigFileResolver {
    module_name: String,
    env_var_name: String,
}

impl ConfigFileResolver {
    /// Create resolver for `module_name`, reading overrides from `env_var_name`
    pub fn new(module_name: &str, env_var_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            env_var_name: env_var_name.to_string(),
        }
    }

    /// Resolve the config source by priority
    pub fn resolve(&self, cli_arg: Option<&Path>) -> ConfigSource {
        if let Some(path) = cli_arg {
            return ConfigSource::CommandLine(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        if let Some(path) = self.user_config_path() {
            if path.exists() {
                return ConfigSource::UserFile(path);
            }
        }

        ConfigSource::Defaults
    }

    /// `<config_dir>/pkdx/<module>.toml`
    pub fn user_config_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pkdx").join(format!("{}.toml", self.module_name)))
    }
}

/// Load a TOML config of type `T` from the resolved source
///
/// A missing implicit file falls back to `T::default()` with a warning.
/// A missing explicit file, or any parse failure, is an error.
pub fn load_toml_config<T>(source: &ConfigSource) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = source.path() else {
        debug!("No config file found, using compiled defaults");
        return Ok(T::default());
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !source.is_explicit() => {
            warn!("Config file {} disappeared, using compiled defaults", path.display());
            return Ok(T::default());
        }
        Err(e) => {
            return Err(Error::Config(format!(
                "Read config {} failed: {}",
                path.display(),
                e
            )))
        }
    };

    parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("Parse config {} failed: {}", path.display(), e)))
}

/// Parse TOML text into `T`
pub fn parse_toml_config<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        name: String,
        logging: LoggingConfig,
    }

    #[test]
    fn test_logging_defaults() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "info");
        assert!(logging.file.is_none());
    }

    #[test]
    fn test_parse_partial_config_fills_defaults() {
        let sample: Sample = parse_toml_config("name = \"x\"").unwrap();
        assert_eq!(sample.name, "x");
        assert_eq!(sample.logging, LoggingConfig::default());
    }

    #[test]
    fn test_parse_invalid_toml_is_config_error() {
        let result: Result<Sample> = parse_toml_config("name = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_defaults_source_loads_default() {
        let sample: Sample = load_toml_config(&ConfigSource::Defaults).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_cli_argument_wins() {
        let resolver = ConfigFileResolver::new("test-module", "PKDX_TEST_UNUSED_CONFIG");
        let source = resolver.resolve(Some(Path::new("/tmp/explicit.toml")));
        assert_eq!(source, ConfigSource::CommandLine(PathBuf::from("/tmp/explicit.toml")));
    }
}
