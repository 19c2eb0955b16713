//! Market data configuration parsing from environment variables.
//!
//! Covers the provider choice, retry policy and batch pacing.

use super::parse_var;
use crate::application::market_data::series_fetcher::DEFAULT_PRICE_FIELD;
use crate::infrastructure::yahoo::market_data::DEFAULT_CHART_URL;
use anyhow::Result;
use std::str::FromStr;
use std::time::Duration;

/// Source of daily price series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataProvider {
    Yahoo,
    Csv,
}

impl FromStr for DataProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yahoo" => Ok(DataProvider::Yahoo),
            "csv" => Ok(DataProvider::Csv),
            _ => anyhow::bail!("Invalid DATA_PROVIDER: {}. Must be 'yahoo' or 'csv'", s),
        }
    }
}

/// Fetch environment configuration
#[derive(Debug, Clone)]
pub struct FetchEnvConfig {
    pub provider: DataProvider,
    pub yahoo_base_url: String,
    pub csv_data_dir: String,
    pub price_field: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub http_timeout_secs: u64,
    pub batch_pacing_ms: u64,
}

impl Default for FetchEnvConfig {
    fn default() -> Self {
        Self {
            provider: DataProvider::Yahoo,
            yahoo_base_url: DEFAULT_CHART_URL.to_string(),
            csv_data_dir: "data".to_string(),
            price_field: DEFAULT_PRICE_FIELD.to_string(),
            max_retries: 5,
            retry_delay_ms: 5000,
            http_timeout_secs: 30,
            batch_pacing_ms: 3000,
        }
    }
}

impl FetchEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let max_retries = parse_var(lookup, "FETCH_MAX_RETRIES", defaults.max_retries)?;
        if max_retries == 0 {
            anyhow::bail!("FETCH_MAX_RETRIES must be at least 1");
        }

        Ok(Self {
            provider: parse_var(lookup, "DATA_PROVIDER", defaults.provider)?,
            yahoo_base_url: lookup("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            csv_data_dir: lookup("CSV_DATA_DIR").unwrap_or(defaults.csv_data_dir),
            price_field: lookup("PRICE_FIELD").unwrap_or(defaults.price_field),
            max_retries,
            retry_delay_ms: parse_var(lookup, "FETCH_RETRY_DELAY_MS", defaults.retry_delay_ms)?,
            http_timeout_secs: parse_var(lookup, "HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            batch_pacing_ms: parse_var(lookup, "BATCH_PACING_MS", defaults.batch_pacing_ms)?,
        })
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn batch_pacing(&self) -> Duration {
        Duration::from_millis(self.batch_pacing_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_fetch_config_defaults() {
        let config = FetchEnvConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(config.provider, DataProvider::Yahoo);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay(), Duration::from_secs(5));
        assert_eq!(config.batch_pacing(), Duration::from_secs(3));
        assert_eq!(config.price_field, "close");
    }

    #[test]
    fn test_fetch_config_overrides() {
        let config = FetchEnvConfig::from_lookup(&lookup(&[
            ("DATA_PROVIDER", "CSV"),
            ("CSV_DATA_DIR", "/tmp/prices"),
            ("FETCH_MAX_RETRIES", "3"),
            ("BATCH_PACING_MS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.provider, DataProvider::Csv);
        assert_eq!(config.csv_data_dir, "/tmp/prices");
        assert_eq!(config.max_retries, 3);
        assert!(config.batch_pacing().is_zero());
    }

    #[test]
    fn test_fetch_config_rejects_bad_values() {
        assert!(FetchEnvConfig::from_lookup(&lookup(&[("FETCH_MAX_RETRIES", "0")])).is_err());
        assert!(FetchEnvConfig::from_lookup(&lookup(&[("FETCH_MAX_RETRIES", "many")])).is_err());
        assert!(FetchEnvConfig::from_lookup(&lookup(&[("DATA_PROVIDER", "bloomberg")])).is_err());
    }
}
