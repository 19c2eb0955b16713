use super::retry::{AttemptOutcome, BackoffPolicy, RetryDriver};
use crate::domain::errors::FetchError;
use crate::domain::market::series::{RawSeries, normalize_column_name};
use crate::domain::ports::{SeriesProvider, Sleeper};
use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_PRICE_FIELD: &str = "close";

/// Retrieves a clean daily price series, retrying transient provider failures.
pub struct SeriesFetcher {
    provider: Arc<dyn SeriesProvider>,
    sleeper: Arc<dyn Sleeper>,
    price_field: String,
}

impl SeriesFetcher {
    pub fn new(provider: Arc<dyn SeriesProvider>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            provider,
            sleeper,
            price_field: DEFAULT_PRICE_FIELD.to_string(),
        }
    }

    /// Overrides the provider column used as price (matched after name normalization).
    pub fn with_price_field(mut self, field: &str) -> Self {
        self.price_field = normalize_column_name(field);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Fetches `symbol` between `start_date` and `end_date`.
    ///
    /// Up to `max_retries` attempts are made; attempt `k` is followed by a pause of
    /// `base_delay * k` unless it was the last. The final error is returned as is.
    pub async fn fetch(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        max_retries: u32,
        base_delay: Duration,
    ) -> Result<RawSeries, FetchError> {
        info!(
            "SeriesFetcher: request params: {}, {}, {}, {}, {:?}",
            symbol, start_date, end_date, max_retries, base_delay
        );
        Self::validate(symbol, start_date, end_date, max_retries)?;

        let policy = BackoffPolicy::new(max_retries, base_delay);
        let driver = RetryDriver::new(policy, self.sleeper.as_ref());
        let label = format!("fetch '{}' via {}", symbol, self.provider.name());

        let series = driver
            .run(&label, |_| self.attempt(symbol, start_date, end_date))
            .await?;

        info!(
            "SeriesFetcher: {} rows for {} ({:?} .. {:?})",
            series.len(),
            symbol,
            series.first_date(),
            series.last_date()
        );
        Ok(series)
    }

    /// Probe used to check that the provider answers at all.
    pub async fn health_check(&self, probe_symbol: &str) -> bool {
        let end = Utc::now().date_naive();
        let start = end - Days::new(5);
        match self.provider.fetch_frame(probe_symbol, start, end).await {
            Ok(frame) if !frame.is_empty() => true,
            Ok(_) => {
                warn!(
                    "SeriesFetcher: provider {} returned no rows for probe {}",
                    self.provider.name(),
                    probe_symbol
                );
                false
            }
            Err(e) => {
                warn!("SeriesFetcher: provider {} probe failed: {}", self.provider.name(), e);
                false
            }
        }
    }

    async fn attempt(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AttemptOutcome<RawSeries, FetchError> {
        let outcome = self
            .provider
            .fetch_frame(symbol, start, end)
            .await
            .and_then(|frame| {
                if frame.is_empty() {
                    return Err(FetchError::EmptySeries {
                        symbol: symbol.to_string(),
                    });
                }
                let series =
                    frame
                        .to_series(&self.price_field)
                        .ok_or_else(|| FetchError::MissingField {
                            symbol: symbol.to_string(),
                            field: self.price_field.clone(),
                        })?;
                if series.is_empty() {
                    return Err(FetchError::EmptySeries {
                        symbol: symbol.to_string(),
                    });
                }
                Ok(series)
            });

        match outcome {
            Ok(series) => AttemptOutcome::Ok(series),
            Err(e) if e.is_retryable() => AttemptOutcome::Retryable(e),
            Err(e) => AttemptOutcome::Fatal(e),
        }
    }

    fn validate(
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        max_retries: u32,
    ) -> Result<(), FetchError> {
        let invalid = |reason: &str| FetchError::InvalidRequest {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        };
        if symbol.trim().is_empty() {
            return Err(invalid("symbol is empty"));
        }
        if start > end {
            return Err(invalid("start date is after end date"));
        }
        if max_retries == 0 {
            return Err(invalid("at least one attempt is required"));
        }
        Ok(())
    }
}
