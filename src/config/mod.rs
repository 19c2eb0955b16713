//! Configuration module for Pricecast.
//!
//! Structured configuration loading from environment variables, organized by concern:
//! Fetch (providers, retries, pacing), Training (models, hyperparameters) and messages.

mod fetch_config;
mod training_config;

pub use fetch_config::{DataProvider, FetchEnvConfig};
pub use training_config::TrainingEnvConfig;

use crate::infrastructure::i18n::Language;
use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub fetch: FetchEnvConfig,
    pub training: TrainingEnvConfig,
    pub language: Language,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let fetch = FetchEnvConfig::from_lookup(lookup).context("Failed to load fetch config")?;
        let training =
            TrainingEnvConfig::from_lookup(lookup).context("Failed to load training config")?;
        let language = parse_var(lookup, "LANGUAGE", Language::default())?;

        Ok(Self {
            fetch,
            training,
            language,
        })
    }
}

/// Parses `key` when set, otherwise returns `default`.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", key, e)),
        None => Ok(default),
    }
}
