use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::food::cache::DEFAULT_TTL;
use crate::food::http::{RetryMode, RetryPolicy};

const PREFIX: &str = "FOODSCAN";

/// Tunables for the scanner, read from `FOODSCAN_*` variables with
/// built-in defaults.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub retry: RetryPolicy,
    pub cache_ttl: Duration,
    /// When false a failing live source leaves the field empty instead of
    /// consulting the embedded tables.
    pub static_fallback: bool,
    pub spoonacular_url: Option<String>,
    pub logmeal_url: Option<String>,
    pub usda_url: Option<String>,
    pub data_dir: PathBuf,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            cache_ttl: DEFAULT_TTL,
            static_fallback: true,
            spoonacular_url: None,
            logmeal_url: None,
            usda_url: None,
            data_dir: PathBuf::from(".food-scan"),
        }
    }
}

impl ScannerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_retries = parsed("MAX_RETRIES")
            .filter(|n: &u32| *n > 0)
            .unwrap_or(defaults.retry.max_retries);

        let base_delay = parsed("RETRY_DELAY_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry.base_delay);

        let mode = if flag("RETRY_STRICT").unwrap_or(false) {
            RetryMode::Strict
        } else {
            RetryMode::AllFailures
        };

        let cache_ttl = parsed("CACHE_TTL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        let data_dir = env::var(format!("{}_DATA_DIR", PREFIX))
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        Self {
            retry: RetryPolicy {
                max_retries,
                base_delay,
                mode,
            },
            cache_ttl,
            static_fallback: flag("STATIC_FALLBACK").unwrap_or(defaults.static_fallback),
            spoonacular_url: env::var("SPOONACULAR_API_URL").ok(),
            logmeal_url: env::var("LOGMEAL_API_URL").ok(),
            usda_url: env::var("USDA_API_URL").ok(),
            data_dir,
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    pub fn calories_path(&self) -> PathBuf {
        self.data_dir.join("calories.json")
    }
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let key = format!("{}_{}", PREFIX, name);
    let raw = env::var(&key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring invalid {}={}", key, raw);
            None
        }
    }
}

fn flag(name: &str) -> Option<bool> {
    let raw: String = parsed(name)?;
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            log::warn!("Ignoring invalid {}_{}={}", PREFIX, name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ScannerConfig::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(1000));
        assert_eq!(config.retry.mode, RetryMode::AllFailures);
        assert_eq!(config.cache_ttl, Duration::from_secs(1800));
        assert!(config.static_fallback);
        assert_eq!(config.history_path(), PathBuf::from(".food-scan/history.json"));
    }

    #[test]
    fn reads_overrides_from_environment() {
        env::set_var("FOODSCAN_RETRY_STRICT", "yes");
        env::set_var("FOODSCAN_CACHE_TTL_SECS", "60");
        env::set_var("FOODSCAN_MAX_RETRIES", "zero");

        let config = ScannerConfig::from_env();
        assert_eq!(config.retry.mode, RetryMode::Strict);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.retry.max_retries, 3);

        env::remove_var("FOODSCAN_RETRY_STRICT");
        env::remove_var("FOODSCAN_CACHE_TTL_SECS");
        env::remove_var("FOODSCAN_MAX_RETRIES");
    }
}
