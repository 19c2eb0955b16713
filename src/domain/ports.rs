use crate::domain::errors::FetchError;
use crate::domain::market::series::ProviderFrame;
use crate::domain::ml::model_key::ModelKey;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::io;
use std::time::Duration;

/// Upstream source of daily price history.
///
/// One call is one attempt; retrying is the fetcher's job.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Daily rows for `symbol` from `start` (inclusive) to `end` (exclusive).
    async fn fetch_frame(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ProviderFrame, FetchError>;

    fn name(&self) -> &str;
}

/// Persistence for model artifacts, addressed only by [`ModelKey`]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Canonical location of the artifact for `key`. Pure function of the key.
    fn location(&self, key: &ModelKey) -> String;

    async fn exists(&self, key: &ModelKey) -> io::Result<bool>;

    async fn load(&self, key: &ModelKey) -> io::Result<Vec<u8>>;

    /// Replaces the artifact for `key` without exposing a partially written file.
    async fn save(&self, key: &ModelKey, bytes: &[u8]) -> io::Result<()>;

    async fn list_keys(&self) -> io::Result<Vec<ModelKey>>;
}

/// Suspends the current task; injected so backoff and pacing can be observed in tests
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}
