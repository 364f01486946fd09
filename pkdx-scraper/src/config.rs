//! Configuration for pkdx-scraper
//!
//! **Priority:** command line → environment → TOML file → compiled defaults.
//! The file is located by [`pkdx_common::config::ConfigFileResolver`]; the
//! command-line and environment overrides arrive through [`Overrides`].

use crate::lineage::{ExclusionSet, DEFAULT_EXCLUSIONS};
use crate::pipeline::PipelineSettings;
use crate::retry::RetryPolicy;
use crate::source::POKEAPI_BASE_URL;
use pkdx_common::config::LoggingConfig;
use pkdx_common::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Module name used for the per-user config file
pub const MODULE_NAME: &str = "pkdx-scraper";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PKDX_CONFIG";

/// Full scraper configuration as read from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Snapshot destination
    pub output_path: PathBuf,
    pub phases: PhaseConfig,
    pub source: SourceConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

/// Id ranges and pool size
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Species and type phases process ids `1..=species_count`
    pub species_count: u32,
    /// Lineage phase processes chain ids `1..=lineage_count`
    pub lineage_count: u32,
    /// Concurrent workers per phase
    pub pool_size: usize,
    /// Chain ids skipped by the lineage phase
    pub lineage_exclusions: Vec<u32>,
}

/// Remote API settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    /// Per-request timeout; a timeout counts as one failed attempt
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

/// Retry policy for remote calls
///
/// Omitting `max_attempts` retries forever.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("pokemons.json"),
            phases: PhaseConfig::default(),
            source: SourceConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            species_count: 768,
            lineage_count: 422,
            pool_size: 250,
            lineage_exclusions: DEFAULT_EXCLUSIONS.to_vec(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: POKEAPI_BASE_URL.to_string(),
            request_timeout_secs: 30,
            user_agent: format!("pkdx-scraper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 2.0,
        }
    }
}

/// Command-line / environment values that beat the TOML file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_path: Option<PathBuf>,
    pub pool_size: Option<usize>,
    pub species_count: Option<u32>,
    pub lineage_count: Option<u32>,
    pub max_attempts: Option<u32>,
    pub log_level: Option<String>,
}

impl ScraperConfig {
    /// Apply overrides on top of file values
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(path) = &overrides.output_path {
            self.output_path = path.clone();
        }
        if let Some(pool_size) = overrides.pool_size {
            self.phases.pool_size = pool_size;
        }
        if let Some(count) = overrides.species_count {
            self.phases.species_count = count;
        }
        if let Some(count) = overrides.lineage_count {
            self.phases.lineage_count = count;
        }
        if let Some(max) = overrides.max_attempts {
            self.retry.max_attempts = Some(max);
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.phases.species_count == 0 {
            return Err(Error::Config("phases.species_count must be at least 1".to_string()));
        }
        if self.phases.lineage_count == 0 {
            return Err(Error::Config("phases.lineage_count must be at least 1".to_string()));
        }
        if self.phases.pool_size == 0 {
            return Err(Error::Config("phases.pool_size must be at least 1".to_string()));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(Error::Config(
                "retry.max_attempts must be at least 1 (omit it to retry forever)".to_string(),
            ));
        }
        if self.retry.multiplier.is_nan() || self.retry.multiplier < 1.0 {
            return Err(Error::Config("retry.multiplier must be >= 1.0".to_string()));
        }
        if self.source.base_url.trim().is_empty() {
            return Err(Error::Config("source.base_url must not be empty".to_string()));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(Error::Config("output_path must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            multiplier: self.retry.multiplier,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            species_count: self.phases.species_count,
            lineage_count: self.phases.lineage_count,
            pool_size: self.phases.pool_size,
            exclusions: ExclusionSet::new(self.phases.lineage_exclusions.iter().copied()),
            retry: self.retry_policy(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkdx_common::config::parse_toml_config;

    #[test]
    fn test_defaults_match_pipeline_defaults() {
        let config = ScraperConfig::default();
        let settings = config.pipeline_settings();
        let defaults = PipelineSettings::default();

        assert_eq!(settings.species_count, defaults.species_count);
        assert_eq!(settings.lineage_count, defaults.lineage_count);
        assert_eq!(settings.pool_size, defaults.pool_size);
        assert_eq!(settings.exclusions, defaults.exclusions);
        assert_eq!(settings.retry, defaults.retry);
        assert_eq!(config.output_path, PathBuf::from("pokemons.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: ScraperConfig = parse_toml_config(
            r#"
            output_path = "data/corpus.json"

            [phases]
            pool_size = 16
            lineage_exclusions = [5]

            [retry]
            max_attempts = 4
            initial_delay_ms = 100
            max_delay_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.output_path, PathBuf::from("data/corpus.json"));
        assert_eq!(config.phases.pool_size, 16);
        assert_eq!(config.phases.species_count, 768);
        assert_eq!(config.phases.lineage_exclusions, vec![5]);
        assert_eq!(config.source.base_url, POKEAPI_BASE_URL);

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, Some(4));
        assert_eq!(policy.initial_delay, Duration::from_millis(100));
        assert_eq!(policy.max_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = ScraperConfig::default();
        config.apply_overrides(&Overrides {
            output_path: Some(PathBuf::from("/tmp/out.json")),
            pool_size: Some(8),
            species_count: Some(151),
            lineage_count: None,
            max_attempts: Some(5),
            log_level: Some("debug".to_string()),
        });

        assert_eq!(config.output_path, PathBuf::from("/tmp/out.json"));
        assert_eq!(config.phases.pool_size, 8);
        assert_eq!(config.phases.species_count, 151);
        assert_eq!(config.phases.lineage_count, 422);
        assert_eq!(config.retry.max_attempts, Some(5));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = ScraperConfig::default();
        config.phases.pool_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = ScraperConfig::default();
        config.retry.max_attempts = Some(0);
        assert!(config.validate().is_err());

        let mut config = ScraperConfig::default();
        config.retry.multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = ScraperConfig::default();
        config.phases.species_count = 0;
        assert!(config.validate().is_err());
    }
}
