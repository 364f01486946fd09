//! pkdx-scraper - species corpus builder
//!
//! Scrapes species, base forms and evolution chains from PokeAPI and writes
//! the cleaned corpus to a single JSON snapshot. Exits non-zero if the
//! configuration is invalid or the snapshot cannot be written.

use anyhow::{Context, Result};
use clap::Parser;
use pkdx_common::config::{load_toml_config, ConfigFileResolver};
use pkdx_scraper::config::{Overrides, ScraperConfig, CONFIG_ENV_VAR, MODULE_NAME};
use pkdx_scraper::snapshot::write_snapshot;
use pkdx_scraper::{Pipeline, PokeApiClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line arguments for pkdx-scraper
#[derive(Parser, Debug)]
#[command(name = "pkdx-scraper")]
#[command(about = "Build the species corpus snapshot from PokeAPI")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to the per-user config file if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Snapshot output path
    #[arg(short, long, env = "PKDX_OUTPUT")]
    output: Option<PathBuf>,

    /// Concurrent workers per phase
    #[arg(long, env = "PKDX_POOL_SIZE")]
    pool_size: Option<usize>,

    /// Species ids to scrape (1..=N)
    #[arg(long)]
    species_count: Option<u32>,

    /// Evolution chain ids to scrape (1..=N)
    #[arg(long)]
    lineage_count: Option<u32>,

    /// Give up on an id after this many failed requests (default: never)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PKDX_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            output_path: self.output.clone(),
            pool_size: self.pool_size,
            species_count: self.species_count,
            lineage_count: self.lineage_count,
            max_attempts: self.max_attempts,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_source = ConfigFileResolver::new(MODULE_NAME, CONFIG_ENV_VAR).resolve(args.config.as_deref());

    // Configured subscriber depends on the config itself; report loading on stderr
    let mut config: ScraperConfig = tracing::subscriber::with_default(
        pkdx_common::logging::bootstrap_subscriber(std::io::stderr),
        || load_toml_config(&config_source),
    )
    .context("Failed to load configuration")?;
    config.apply_overrides(&args.overrides());
    config.validate().context("Invalid configuration")?;

    pkdx_common::logging::init_logging("pkdx_scraper", &config.logging)
        .context("Failed to initialize logging")?;

    info!("Starting pkdx-scraper");
    info!(
        "Version: {} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(source = ?config_source, "Configuration loaded");
    info!(
        base_url = %config.source.base_url,
        species = config.phases.species_count,
        chains = config.phases.lineage_count,
        workers = config.phases.pool_size,
        max_attempts = ?config.retry.max_attempts,
        "Scrape parameters"
    );

    let client = PokeApiClient::new(
        &config.source.base_url,
        &config.source.user_agent,
        config.request_timeout(),
    )
    .context("Failed to create PokeAPI client")?;

    let pipeline = Pipeline::new(Arc::new(client), config.pipeline_settings());

    let summary = pipeline.run().await.context("Scrape pipeline failed")?;

    let entities = pipeline.store().snapshot().await;
    write_snapshot(&entities, &config.output_path)
        .with_context(|| format!("Failed to write snapshot to {}", config.output_path.display()))?;

    info!(
        entities = summary.entities,
        elapsed_secs = summary.elapsed.as_secs(),
        output = %config.output_path.display(),
        "Scraping finished"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: [&str; 3] = ["PKDX_OUTPUT", "PKDX_POOL_SIZE", "PKDX_LOG_LEVEL"];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_env_fallbacks_fill_overrides() {
        clear_env();
        std::env::set_var("PKDX_OUTPUT", "/tmp/pkdx-env/pokemons.json");
        std::env::set_var("PKDX_POOL_SIZE", "12");
        std::env::set_var("PKDX_LOG_LEVEL", "debug");

        let overrides = Args::try_parse_from(["pkdx-scraper"]).unwrap().overrides();
        clear_env();

        assert_eq!(overrides.output_path, Some(PathBuf::from("/tmp/pkdx-env/pokemons.json")));
        assert_eq!(overrides.pool_size, Some(12));
        assert_eq!(overrides.log_level.as_deref(), Some("debug"));
        assert_eq!(overrides.species_count, None);
    }

    #[test]
    #[serial]
    fn test_command_line_beats_env() {
        clear_env();
        std::env::set_var("PKDX_OUTPUT", "from-env.json");
        std::env::set_var("PKDX_POOL_SIZE", "12");

        let args = Args::try_parse_from([
            "pkdx-scraper",
            "--output",
            "from-cli.json",
            "--pool-size",
            "3",
            "--max-attempts",
            "7",
        ])
        .unwrap();
        clear_env();

        let overrides = args.overrides();
        assert_eq!(overrides.output_path, Some(PathBuf::from("from-cli.json")));
        assert_eq!(overrides.pool_size, Some(3));
        assert_eq!(overrides.max_attempts, Some(7));
    }

    #[test]
    #[serial]
    fn test_no_flags_no_env_leaves_file_values() {
        clear_env();

        let mut config = ScraperConfig::default();
        config.phases.pool_size = 40;
        config.apply_overrides(&Args::try_parse_from(["pkdx-scraper"]).unwrap().overrides());

        assert_eq!(config.phases.pool_size, 40);
        assert_eq!(config.output_path, PathBuf::from("pokemons.json"));
    }

    #[test]
    fn test_non_numeric_pool_size_rejected() {
        let result = Args::try_parse_from(["pkdx-scraper", "--pool-size", "many"]);
        assert!(result.is_err());
    }
}
