use std::path::PathBuf;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;

const ENV_PREFIX: &str = "PEST_MEMO_";

fn default_asset_origin() -> String {
    "http://localhost:8080/".to_string()
}

fn default_cache_name() -> String {
    crate::cache::DEFAULT_CACHE_NAME.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("memos")
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Configuration for the application
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Origin the offline assets are fetched from
    #[serde(default = "default_asset_origin")]
    pub asset_origin: String,

    /// Name of the cache the assets are stored under
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Directory exported memos are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Overrides the platform state directory for the log file
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `PEST_MEMO_*` environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize prefixed environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<Config>()
            .context("Failed to read PEST_MEMO_* configuration")?;

        Ok(config)
    }

    pub fn asset_origin(&self) -> &str {
        &self.asset_origin
    }
}

/// Initialize environment variables and load configuration. Runs before any
/// subscriber exists, so the caller logs the result once logging is up.
pub fn init() -> Result<Config> {
    Config::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let vars: Vec<(String, String)> = Vec::new();
        let config = envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Config>(vars)
            .unwrap();

        assert_eq!(config.asset_origin(), "http://localhost:8080/");
        assert_eq!(config.cache_name, "pest-control-memo-v1");
        assert_eq!(config.output_dir, PathBuf::from("memos"));
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn prefixed_values_override_defaults() {
        let vars = vec![
            ("PEST_MEMO_ASSET_ORIGIN".to_string(), "https://memo.example/app/".to_string()),
            ("PEST_MEMO_REQUEST_TIMEOUT_SECS".to_string(), "5".to_string()),
            ("PEST_MEMO_LOG_DIR".to_string(), "/tmp/memo-logs".to_string()),
        ];
        let config = envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Config>(vars)
            .unwrap();

        assert_eq!(config.asset_origin(), "https://memo.example/app/");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/memo-logs")));
    }
}
