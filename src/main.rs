use anyhow::Context;
use chrono::{Days, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use pricecast::application::forecast::ForecastEngine;
use pricecast::application::market_data::SeriesFetcher;
use pricecast::application::ml::{DefaultRegressorFactory, ModelCache};
use pricecast::config::{Config, DataProvider};
use pricecast::domain::forecast::result::BatchReport;
use pricecast::domain::forecast::universe::DEFAULT_WATCHLIST;
use pricecast::domain::ml::regressor::TrainParams;
use pricecast::domain::ports::SeriesProvider;
use pricecast::infrastructure::core::http_client_factory::DEFAULT_USER_AGENT;
use pricecast::infrastructure::core::{HttpClientFactory, TokioSleeper};
use pricecast::infrastructure::i18n::I18nService;
use pricecast::infrastructure::{CsvSeriesProvider, FileArtifactStore, YahooChartProvider};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Per-symbol price forecasting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast one symbol, or the default watchlist when no symbol is given
    Forecast {
        /// Symbol to forecast (e.g. AAPL)
        #[arg(short, long)]
        symbol: Option<String>,

        #[command(flatten)]
        request: RequestArgs,
    },
    /// Forecast the first N symbols of the built-in universe
    Batch {
        /// Number of symbols to process
        #[arg(short, long, default_value = "5")]
        count: usize,

        #[command(flatten)]
        request: RequestArgs,
    },
    /// List symbols with at least one saved model
    Models,
    /// Check that the data provider responds
    Health {
        /// Symbol used for the probe
        #[arg(long, default_value = "AAPL")]
        probe: String,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// Start date (YYYY-MM-DD), defaults to LOOKBACK_DAYS before the end date
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD, exclusive), defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Window length in days
    #[arg(long)]
    window_size: Option<usize>,

    /// Training epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Mini-batch size
    #[arg(long)]
    batch_size: Option<usize>,
}

/// Resolved request parameters after applying configuration defaults
struct ResolvedRequest {
    start: NaiveDate,
    end: NaiveDate,
    window_size: usize,
    params: TrainParams,
}

impl RequestArgs {
    fn resolve(self, config: &Config) -> anyhow::Result<ResolvedRequest> {
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        let start = match self.start {
            Some(start) => start,
            None => end
                .checked_sub_days(Days::new(config.training.lookback_days))
                .context("LOOKBACK_DAYS reaches before the earliest supported date")?,
        };

        let mut params = config.training.params.clone();
        if let Some(epochs) = self.epochs {
            params.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            params.batch_size = batch_size;
        }

        Ok(ResolvedRequest {
            start,
            end,
            window_size: self.window_size.unwrap_or(config.training.window_size),
            params,
        })
    }
}

#[derive(Serialize)]
struct ModelListing {
    available_tickers: Vec<String>,
}

#[derive(Serialize)]
struct HealthReport {
    provider: String,
    working: bool,
    message: String,
}

fn build_provider(config: &Config) -> Arc<dyn SeriesProvider> {
    match config.fetch.provider {
        DataProvider::Yahoo => {
            let client =
                HttpClientFactory::create_client(config.fetch.http_timeout(), DEFAULT_USER_AGENT);
            Arc::new(YahooChartProvider::new(
                client,
                config.fetch.yahoo_base_url.clone(),
            ))
        }
        DataProvider::Csv => Arc::new(CsvSeriesProvider::new(&config.fetch.csv_data_dir)),
    }
}

fn build_engine(config: &Config, messages: Arc<I18nService>) -> anyhow::Result<ForecastEngine> {
    let store = FileArtifactStore::open(&config.training.models_dir).with_context(|| {
        format!(
            "Failed to open models directory {}",
            config.training.models_dir
        )
    })?;
    let factory = Arc::new(DefaultRegressorFactory::new(config.training.model_kind));
    let cache = Arc::new(ModelCache::new(Arc::new(store), factory));

    let sleeper = Arc::new(TokioSleeper);
    let fetcher = SeriesFetcher::new(build_provider(config), sleeper.clone())
        .with_price_field(&config.fetch.price_field);

    Ok(ForecastEngine::new(fetcher, cache, messages, sleeper)
        .with_fetch_policy(config.fetch.max_retries, config.fetch.retry_delay())
        .with_pacing(config.fetch.batch_pacing())
        .with_train_fraction(config.training.train_fraction))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the JSON output
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let messages = Arc::new(I18nService::new(config.language));
    let engine = build_engine(&config, messages.clone())?;

    info!(
        "Pricecast ready (provider: {}, model: {}, models dir: {})",
        engine.provider_name(),
        config.training.model_kind,
        config.training.models_dir
    );

    match cli.command {
        Commands::Forecast { symbol, request } => {
            let request = request.resolve(&config)?;
            match symbol {
                Some(symbol) => {
                    let result = engine
                        .run(
                            &symbol,
                            request.start,
                            request.end,
                            request.window_size,
                            &request.params,
                        )
                        .await;
                    print_json(&result)?;
                }
                None => {
                    let symbols: Vec<String> =
                        DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect();
                    let report: BatchReport = engine
                        .run_batch(
                            &symbols,
                            request.start,
                            request.end,
                            request.window_size,
                            &request.params,
                        )
                        .await;
                    print_json(&report)?;
                }
            }
        }
        Commands::Batch { count, request } => {
            let request = request.resolve(&config)?;
            let report = engine
                .run_universe(
                    count,
                    request.start,
                    request.end,
                    request.window_size,
                    &request.params,
                )
                .await;
            print_json(&report)?;
        }
        Commands::Models => {
            let available_tickers = engine
                .available_symbols()
                .await
                .context("Failed to list saved models")?;
            print_json(&ModelListing { available_tickers })?;
        }
        Commands::Health { probe } => {
            let working = engine.provider_healthy(&probe).await;
            let provider = engine.provider_name().to_string();
            let key = if working { "health.ok" } else { "health.down" };
            let message = messages.tf(key, &[("provider", provider.as_str())]);
            print_json(&HealthReport {
                provider,
                working,
                message,
            })?;
        }
    }

    Ok(())
}
