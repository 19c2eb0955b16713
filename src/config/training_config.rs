//! Model training configuration parsing from environment variables.

use super::parse_var;
use crate::domain::ml::regressor::{ModelKind, TrainParams};
use anyhow::Result;

/// Training environment configuration
#[derive(Debug, Clone)]
pub struct TrainingEnvConfig {
    pub models_dir: String,
    pub model_kind: ModelKind,
    pub lookback_days: u64,
    pub window_size: usize,
    pub train_fraction: f64,
    pub params: TrainParams,
}

impl Default for TrainingEnvConfig {
    fn default() -> Self {
        Self {
            models_dir: "saved_models".to_string(),
            model_kind: ModelKind::Forest,
            lookback_days: 90,
            window_size: 40,
            train_fraction: 0.8,
            params: TrainParams::default(),
        }
    }
}

impl TrainingEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let base = &defaults.params;

        let window_size = parse_var(lookup, "WINDOW_SIZE", defaults.window_size)?;
        if window_size == 0 {
            anyhow::bail!("WINDOW_SIZE must be at least 1");
        }
        let train_fraction = parse_var(lookup, "TRAIN_FRACTION", defaults.train_fraction)?;
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            anyhow::bail!(
                "TRAIN_FRACTION must be strictly between 0 and 1, got {}",
                train_fraction
            );
        }
        let validation_split = parse_var(lookup, "VALIDATION_SPLIT", base.validation_split)?;
        if !(0.0..1.0).contains(&validation_split) {
            anyhow::bail!("VALIDATION_SPLIT must be in [0, 1), got {}", validation_split);
        }

        Ok(Self {
            models_dir: lookup("MODELS_DIR").unwrap_or(defaults.models_dir),
            model_kind: parse_var(lookup, "MODEL_KIND", defaults.model_kind)?,
            lookback_days: parse_var(lookup, "LOOKBACK_DAYS", defaults.lookback_days)?,
            window_size,
            train_fraction,
            params: TrainParams {
                epochs: parse_var(lookup, "EPOCHS", base.epochs)?,
                batch_size: parse_var(lookup, "BATCH_SIZE", base.batch_size)?,
                learning_rate: parse_var(lookup, "LEARNING_RATE", base.learning_rate)?,
                validation_split,
                n_trees: parse_var(lookup, "N_TREES", base.n_trees)?,
                max_depth: parse_var(lookup, "MAX_DEPTH", base.max_depth)?,
                min_samples_split: parse_var(lookup, "MIN_SAMPLES_SPLIT", base.min_samples_split)?,
                seed: parse_var(lookup, "MODEL_SEED", base.seed)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_training_config_defaults() {
        let config = TrainingEnvConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(config.models_dir, "saved_models");
        assert_eq!(config.model_kind, ModelKind::Forest);
        assert_eq!(config.lookback_days, 90);
        assert_eq!(config.window_size, 40);
        assert_eq!(config.params.epochs, 100);
        assert_eq!(config.params.batch_size, 32);
        assert_eq!(config.params.n_trees, 100);
    }

    #[test]
    fn test_training_config_overrides() {
        let config = TrainingEnvConfig::from_lookup(&lookup(&[
            ("MODEL_KIND", "linear"),
            ("WINDOW_SIZE", "60"),
            ("EPOCHS", "5"),
            ("MODEL_SEED", "7"),
        ]))
        .unwrap();
        assert_eq!(config.model_kind, ModelKind::Linear);
        assert_eq!(config.window_size, 60);
        assert_eq!(config.params.epochs, 5);
        assert_eq!(config.params.seed, 7);
    }

    #[test]
    fn test_training_config_validation() {
        assert!(TrainingEnvConfig::from_lookup(&lookup(&[("WINDOW_SIZE", "0")])).is_err());
        assert!(TrainingEnvConfig::from_lookup(&lookup(&[("TRAIN_FRACTION", "1.0")])).is_err());
        assert!(TrainingEnvConfig::from_lookup(&lookup(&[("VALIDATION_SPLIT", "-0.1")])).is_err());
        assert!(TrainingEnvConfig::from_lookup(&lookup(&[("MODEL_KIND", "lstm")])).is_err());
    }
}
