use crate::domain::errors::{FetchError, ForecastError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

const EMBEDDED_TRANSLATIONS: &[&str] = &[
    include_str!("../../../translations/en.json"),
    include_str!("../../../translations/pt.json"),
];

/// Languages user-facing messages can be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Portuguese,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Portuguese => "pt",
        }
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "pt" | "pt-br" | "portuguese" => Ok(Language::Portuguese),
            _ => anyhow::bail!("Invalid LANGUAGE: {}. Must be 'en' or 'pt'", s),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Language metadata loaded from JSON
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    pub native_name: String,
}

/// Translation data loaded from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationData {
    pub language: LanguageInfo,
    pub messages: HashMap<String, String>,
}

/// Message catalog for user-facing text, compiled into the binary
pub struct I18nService {
    current_language: String,
    translations: HashMap<String, TranslationData>,
    available_languages: Vec<LanguageInfo>,
}

impl I18nService {
    pub fn new(language: Language) -> Self {
        let mut translations = HashMap::new();
        let mut available_languages = Vec::new();

        for raw in EMBEDDED_TRANSLATIONS {
            match serde_json::from_str::<TranslationData>(raw) {
                Ok(data) => {
                    available_languages.push(data.language.clone());
                    translations.insert(data.language.code.clone(), data);
                }
                Err(e) => warn!("I18nService: skipping malformed translation: {}", e),
            }
        }
        available_languages.sort_by(|a, b| a.code.cmp(&b.code));

        let mut service = Self {
            current_language: Language::English.code().to_string(),
            translations,
            available_languages,
        };
        if !service.set_language(language.code()) {
            warn!(
                "I18nService: no catalog for '{}', falling back to English",
                language
            );
        }
        service
    }

    pub fn available_languages(&self) -> &[LanguageInfo] {
        &self.available_languages
    }

    /// Set current language by code
    pub fn set_language(&mut self, language_code: &str) -> bool {
        if self.translations.contains_key(language_code) {
            self.current_language = language_code.to_string();
            true
        } else {
            false
        }
    }

    pub fn current_language_code(&self) -> &str {
        &self.current_language
    }

    /// Translate a key, falling back to English and then to the key itself
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.lookup(&self.current_language, key)
            .or_else(|| self.lookup(Language::English.code(), key))
            .unwrap_or(key)
    }

    /// Translate with format parameters
    /// Usage: i18n.tf("forecast.failure", &[("symbol", "AAPL"), ("cause", "...")])
    /// Template in JSON: "Failed to process '{symbol}': {cause}"
    pub fn tf(&self, key: &str, params: &[(&str, &str)]) -> String {
        let mut result = self.t(key).to_string();

        for (placeholder, value) in params {
            let placeholder_pattern = format!("{{{}}}", placeholder);
            result = result.replace(&placeholder_pattern, value);
        }

        result
    }

    /// Localized one-line cause for a failed forecast; never includes storage locations.
    pub fn describe_error(&self, error: &ForecastError) -> String {
        match error {
            ForecastError::Fetch(fetch) => self.describe_fetch_error(fetch),
            ForecastError::InsufficientData { required, actual } => self.tf(
                "error.insufficient_data",
                &[
                    ("required", required.to_string().as_str()),
                    ("actual", actual.to_string().as_str()),
                ],
            ),
            ForecastError::ArtifactCorrupt { key, .. } => self.tf(
                "error.artifact_corrupt",
                &[("window_size", key.window_size().to_string().as_str())],
            ),
            ForecastError::Storage { reason, .. } => {
                self.tf("error.storage", &[("reason", reason.as_str())])
            }
            ForecastError::Model(e) => {
                self.tf("error.model", &[("reason", e.to_string().as_str())])
            }
            ForecastError::EvaluationInput(e) => {
                self.tf("error.evaluation_input", &[("reason", e.to_string().as_str())])
            }
            ForecastError::Training(reason) => {
                self.tf("error.training", &[("reason", reason.as_str())])
            }
        }
    }

    /// Full user-facing failure message for `symbol`
    pub fn failure_message(&self, symbol: &str, error: &ForecastError) -> String {
        self.tf(
            "forecast.failure",
            &[("symbol", symbol), ("cause", self.describe_error(error).as_str())],
        )
    }

    fn describe_fetch_error(&self, error: &FetchError) -> String {
        match error {
            FetchError::InvalidRequest { reason, .. } => {
                self.tf("error.fetch.invalid_request", &[("reason", reason.as_str())])
            }
            FetchError::EmptySeries { .. } => self.t("error.fetch.empty_series").to_string(),
            FetchError::MissingField { field, .. } => {
                self.tf("error.fetch.missing_field", &[("field", field.as_str())])
            }
            FetchError::Transport { reason, .. } => {
                self.tf("error.fetch.transport", &[("reason", reason.as_str())])
            }
        }
    }

    fn lookup<'a>(&'a self, language: &str, key: &str) -> Option<&'a str> {
        self.translations
            .get(language)
            .and_then(|data| data.messages.get(key))
            .map(|s| s.as_str())
    }
}

impl Default for I18nService {
    fn default() -> Self {
        Self::new(Language::default())
    }
}
