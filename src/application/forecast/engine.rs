use super::stage::ForecastStage;
use crate::application::market_data::series_fetcher::SeriesFetcher;
use crate::application::ml::model_cache::ModelCache;
use crate::application::ml::window_transformer::WindowTransformer;
use crate::domain::errors::{EvaluationInputError, ForecastError};
use crate::domain::forecast::result::{
    BatchReport, ForecastResult, ForecastSeries, ModelReference,
};
use crate::domain::forecast::universe::default_universe;
use crate::domain::ml::model_key::ModelKey;
use crate::domain::ml::regressor::TrainParams;
use crate::domain::performance::metrics::ForecastMetrics;
use crate::domain::ports::Sleeper;
use crate::infrastructure::i18n::I18nService;
use chrono::NaiveDate;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Default number of fetch attempts per symbol
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 5;
/// Default base delay between fetch attempts
pub const DEFAULT_FETCH_DELAY: Duration = Duration::from_secs(5);
/// Default pause between consecutive symbols of a batch
pub const DEFAULT_BATCH_PACING: Duration = Duration::from_secs(3);
/// Default fraction of windows used for training
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

/// Runs the fetch, transform, train-or-load, predict and evaluate pipeline for symbols.
///
/// Every request yields a [`ForecastResult`]; failures never escape as errors. Batches
/// are processed one symbol at a time.
pub struct ForecastEngine {
    fetcher: SeriesFetcher,
    cache: Arc<ModelCache>,
    messages: Arc<I18nService>,
    sleeper: Arc<dyn Sleeper>,
    fetch_attempts: u32,
    fetch_delay: Duration,
    pacing: Duration,
    train_fraction: f64,
    universe: Vec<String>,
}

impl ForecastEngine {
    pub fn new(
        fetcher: SeriesFetcher,
        cache: Arc<ModelCache>,
        messages: Arc<I18nService>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            messages,
            sleeper,
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
            fetch_delay: DEFAULT_FETCH_DELAY,
            pacing: DEFAULT_BATCH_PACING,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            universe: default_universe(),
        }
    }

    pub fn with_fetch_policy(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.fetch_attempts = max_retries;
        self.fetch_delay = base_delay;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_train_fraction(mut self, train_fraction: f64) -> Self {
        self.train_fraction = train_fraction;
        self
    }

    /// Replaces the priority-ordered symbol list used by [`Self::run_universe`].
    pub fn with_universe(mut self, universe: Vec<String>) -> Self {
        self.universe = universe;
        self
    }

    pub fn universe(&self) -> &[String] {
        &self.universe
    }

    pub fn provider_name(&self) -> &str {
        self.fetcher.provider_name()
    }

    /// Forecasts one symbol over `[start_date, end_date)`.
    pub async fn run(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        window_size: usize,
        params: &TrainParams,
    ) -> ForecastResult {
        let key = ModelKey::new(symbol, window_size);
        let mut stage = ForecastStage::Fetching;

        match self
            .execute(&key, start_date, end_date, params, &mut stage)
            .await
        {
            Ok(result) => {
                Self::advance(&key, &mut stage, ForecastStage::Done);
                result
            }
            Err(e) => {
                error!("ForecastEngine: [{}] failed while {}: {}", key, stage, e);
                Self::advance(&key, &mut stage, ForecastStage::Failed);
                ForecastResult::error(key.symbol(), self.messages.failure_message(key.symbol(), &e))
            }
        }
    }

    /// Forecasts each symbol in order, pausing between consecutive symbols.
    pub async fn run_batch(
        &self,
        symbols: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
        window_size: usize,
        params: &TrainParams,
    ) -> BatchReport {
        info!("ForecastEngine: batch of {} symbols", symbols.len());
        let mut results = Vec::with_capacity(symbols.len());

        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                debug!("ForecastEngine: pacing {:?} before {}", self.pacing, symbol);
                self.sleeper.sleep(self.pacing).await;
            }
            results.push(
                self.run(symbol, start_date, end_date, window_size, params)
                    .await,
            );
        }

        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(
            "ForecastEngine: batch finished ({} ok, {} failed)",
            results.len() - failed,
            failed
        );
        BatchReport { results }
    }

    /// Batch over the first `count` symbols of the configured universe.
    pub async fn run_universe(
        &self,
        count: usize,
        start_date: NaiveDate,
        end_date: NaiveDate,
        window_size: usize,
        params: &TrainParams,
    ) -> BatchReport {
        let symbols: Vec<String> = self.universe.iter().take(count).cloned().collect();
        self.run_batch(&symbols, start_date, end_date, window_size, params)
            .await
    }

    /// Symbols with at least one persisted model, ascending.
    pub async fn available_symbols(&self) -> io::Result<Vec<String>> {
        self.cache.list_symbols().await
    }

    /// Whether the data provider answers for `probe_symbol`.
    pub async fn provider_healthy(&self, probe_symbol: &str) -> bool {
        self.fetcher.health_check(probe_symbol).await
    }

    async fn execute(
        &self,
        key: &ModelKey,
        start_date: NaiveDate,
        end_date: NaiveDate,
        params: &TrainParams,
        stage: &mut ForecastStage,
    ) -> Result<ForecastResult, ForecastError> {
        Self::advance(key, stage, ForecastStage::Fetching);
        let series = self
            .fetcher
            .fetch(
                key.symbol(),
                start_date,
                end_date,
                self.fetch_attempts,
                self.fetch_delay,
            )
            .await?;

        Self::advance(key, stage, ForecastStage::Transforming);
        let (dataset, scaler) = WindowTransformer::prepare(&series, key.window_size())?;
        let split = dataset.split(self.train_fraction);
        info!(
            "ForecastEngine: [{}] {} windows split into {} train / {} held out",
            key,
            dataset.len(),
            split.train.len(),
            split.held_out.len()
        );
        if split.train.is_empty() {
            return Err(ForecastError::Training(format!(
                "no training windows out of {}",
                dataset.len()
            )));
        }
        if split.held_out.is_empty() {
            return Err(EvaluationInputError::Empty.into());
        }

        // Train-or-load is decided under the key lock; the stage is taken from the outcome.
        Self::advance(key, stage, ForecastStage::ResolvingModel);
        let factory = self.cache.factory().clone();
        let window_size = key.window_size();
        let train_params = params.clone();
        let handle = self
            .cache
            .train_or_load(key, split.train, move |inputs, targets| {
                let mut model = factory.create(window_size);
                model.fit(inputs, targets, &train_params)?;
                Ok(model)
            })
            .await?;
        Self::advance(key, stage, ForecastStage::from(handle.origin));
        info!(
            "ForecastEngine: [{}] using {} ({:?})",
            key,
            handle.regressor.name(),
            handle.origin
        );

        Self::advance(key, stage, ForecastStage::Predicting);
        let scaled_predictions = handle.regressor.predict(&split.held_out.inputs)?;
        let predicted_values = scaler.inverse_all(&scaled_predictions);
        let real_values = scaler.inverse_all(&split.held_out.targets.to_vec());

        Self::advance(key, stage, ForecastStage::Evaluating);
        let metrics = ForecastMetrics::evaluate(&real_values, &predicted_values)?;
        info!(
            "ForecastEngine: [{}] MAE={:.4} RMSE={:.4} MAPE={:.2}% R2={:.4}",
            key, metrics.mae, metrics.rmse, metrics.mape, metrics.r2
        );

        Ok(ForecastResult::success(
            key.symbol(),
            ModelReference {
                path: handle.location,
                window_size,
                origin: handle.origin,
            },
            metrics,
            ForecastSeries {
                dates: split.held_out.target_dates,
                real_values,
                predicted_values,
            },
        ))
    }

    fn advance(key: &ModelKey, stage: &mut ForecastStage, next: ForecastStage) {
        debug!("ForecastEngine: [{}] {} -> {}", key, stage, next);
        *stage = next;
        if next.is_terminal() {
            info!("ForecastEngine: [{}] {}", key, next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::regressor_factory::DefaultRegressorFactory;
    use crate::domain::forecast::result::{ForecastStatus, ModelOrigin};
    use crate::domain::ml::regressor::ModelKind;
    use crate::infrastructure::mock::{MockSeriesProvider, RecordingSleeper, ScriptedResponse};
    use crate::infrastructure::persistence::artifact_store::FileArtifactStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn prices(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1).collect()
    }

    fn params() -> TrainParams {
        TrainParams {
            epochs: 20,
            ..TrainParams::default()
        }
    }

    struct Fixture {
        engine: ForecastEngine,
        provider: Arc<MockSeriesProvider>,
        sleeper: Arc<RecordingSleeper>,
        dir: tempfile::TempDir,
    }

    fn fixture(provider: MockSeriesProvider) -> Fixture {
        fixture_with_kind(provider, ModelKind::Linear)
    }

    fn fixture_with_kind(provider: MockSeriesProvider, kind: ModelKind) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(provider);
        let sleeper = Arc::new(RecordingSleeper::default());
        let store = Arc::new(FileArtifactStore::open(dir.path()).unwrap());
        let factory = Arc::new(DefaultRegressorFactory::new(kind));
        let engine = ForecastEngine::new(
            SeriesFetcher::new(provider.clone(), sleeper.clone()),
            Arc::new(ModelCache::new(store, factory)),
            Arc::new(I18nService::default()),
            sleeper.clone(),
        )
        .with_fetch_policy(2, Duration::from_millis(10));
        Fixture {
            engine,
            provider,
            sleeper,
            dir,
        }
    }

    #[tokio::test]
    async fn test_trains_then_reuses() {
        let f = fixture(
            MockSeriesProvider::new().always("AAPL", ScriptedResponse::closes(day(1), &prices(60))),
        );

        let first = f.engine.run("aapl", day(1), day(30), 10, &params()).await;
        let second = f.engine.run("AAPL", day(1), day(30), 10, &params()).await;

        assert_eq!(first.status, ForecastStatus::Success, "{:?}", first.message);
        assert_eq!(first.symbol, "AAPL");
        let first_model = first.model.unwrap();
        let second_model = second.model.unwrap();
        assert_eq!(first_model.origin, ModelOrigin::Trained);
        assert_eq!(second_model.origin, ModelOrigin::Reused);
        assert_eq!(first_model.path, second_model.path);
        assert!(first_model.path.ends_with("aapl_ws10.json"));
    }

    #[tokio::test]
    async fn test_forest_saved_for_wider_window_is_reported_corrupt() {
        let f = fixture_with_kind(
            MockSeriesProvider::new().always("AAPL", ScriptedResponse::closes(day(1), &prices(60))),
            ModelKind::Forest,
        );
        let forest_params = TrainParams {
            n_trees: 5,
            max_depth: 4,
            ..params()
        };
        let wide = f.engine.run("AAPL", day(1), day(30), 10, &forest_params).await;
        assert_eq!(wide.status, ForecastStatus::Success, "{:?}", wide.message);
        std::fs::copy(
            f.dir.path().join("aapl_ws10.json"),
            f.dir.path().join("aapl_ws4.json"),
        )
        .unwrap();

        let result = f.engine.run("AAPL", day(1), day(30), 4, &forest_params).await;

        assert_eq!(result.status, ForecastStatus::Error);
        let message = result.message.unwrap();
        assert!(
            message.contains("the stored model for window 4 is unreadable"),
            "{}",
            message
        );
    }

    #[tokio::test]
    async fn test_success_result_is_in_price_units() {
        let f = fixture(
            MockSeriesProvider::new().always("MSFT", ScriptedResponse::closes(day(1), &prices(60))),
        );

        let result = f.engine.run("MSFT", day(1), day(30), 10, &params()).await;
        let series = result.forecast_series.unwrap();
        let summary = result.prediction_summary.unwrap();

        // 50 windows, 40 train, 10 held out
        assert_eq!(series.dates.len(), 10);
        assert_eq!(series.real_values.len(), 10);
        assert_eq!(series.predicted_values.len(), 10);
        assert_eq!(summary.metrics.samples, 10);
        assert_eq!(summary.last_real_value, series.real_values.last().copied());
        assert!((series.real_values[9] - prices(60)[59]).abs() < 1e-6);
        assert!(series.dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_failure_becomes_localized_error_result() {
        let f = fixture(MockSeriesProvider::new());

        let result = f.engine.run("zzzz", day(1), day(30), 10, &params()).await;

        assert_eq!(result.status, ForecastStatus::Error);
        assert!(result.model.is_none());
        let message = result.message.unwrap();
        assert!(message.starts_with("Failed to process 'ZZZZ'"), "{}", message);
        assert_eq!(f.provider.attempts("ZZZZ"), 2);
    }

    #[tokio::test]
    async fn test_short_series_reports_insufficient_data() {
        let f = fixture(
            MockSeriesProvider::new().always("IBM", ScriptedResponse::closes(day(1), &prices(8))),
        );

        let result = f.engine.run("IBM", day(1), day(30), 10, &params()).await;

        assert!(!result.is_success());
        assert!(result.message.unwrap().contains("11"));
    }

    #[tokio::test]
    async fn test_empty_held_out_split_is_rejected() {
        let f = fixture(
            MockSeriesProvider::new().always("AMD", ScriptedResponse::closes(day(1), &prices(30))),
        );
        let engine = f.engine.with_train_fraction(1.0);

        let result = engine.run("AMD", day(1), day(30), 5, &params()).await;

        assert!(!result.is_success());
        assert!(engine.available_symbols().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_paces_between_symbols_only() {
        let f = fixture(
            MockSeriesProvider::new()
                .always("AAPL", ScriptedResponse::closes(day(1), &prices(40)))
                .always("MSFT", ScriptedResponse::closes(day(1), &prices(40)))
                .always("NVDA", ScriptedResponse::closes(day(1), &prices(40))),
        );
        let engine = f.engine.with_pacing(Duration::from_secs(3));
        let symbols: Vec<String> = ["AAPL", "MSFT", "NVDA"].iter().map(|s| s.to_string()).collect();

        let report = engine.run_batch(&symbols, day(1), day(30), 5, &params()).await;

        assert_eq!(report.results.len(), 3);
        assert!(report.results.iter().all(|r| r.is_success()));
        assert_eq!(f.sleeper.recorded(), vec![Duration::from_secs(3); 2]);
        assert_eq!(
            engine.available_symbols().await.unwrap(),
            vec!["AAPL", "MSFT", "NVDA"]
        );
    }

    #[tokio::test]
    async fn test_universe_takes_leading_symbols() {
        let f = fixture(
            MockSeriesProvider::new().always("TSLA", ScriptedResponse::closes(day(1), &prices(40))),
        );
        let engine = f
            .engine
            .with_pacing(Duration::ZERO)
            .with_universe(vec!["TSLA".to_string(), "META".to_string(), "AMZN".to_string()]);

        let report = engine.run_universe(2, day(1), day(30), 5, &params()).await;

        let symbols: Vec<&str> = report.results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["TSLA", "META"]);
        assert!(report.results[0].is_success());
        assert!(!report.results[1].is_success());
    }
}
