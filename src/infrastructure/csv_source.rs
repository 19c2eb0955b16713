use crate::domain::errors::FetchError;
use crate::domain::market::series::{ProviderFrame, normalize_column_name};
use crate::domain::ports::SeriesProvider;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Reads daily history from `{dir}/{SYMBOL}.csv`.
///
/// The file needs a `date` column (`YYYY-MM-DD`, longer timestamps are truncated);
/// every other column is read as numbers, with blank or unparsable cells as missing.
pub struct CsvSeriesProvider {
    dir: PathBuf,
}

impl CsvSeriesProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn parse(
        symbol: &str,
        bytes: &[u8],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ProviderFrame, FetchError> {
        let malformed = |reason: String| FetchError::Transport {
            symbol: symbol.to_string(),
            reason,
        };

        let mut reader = csv::Reader::from_reader(bytes);
        let headers = reader
            .headers()
            .map_err(|e| malformed(format!("unreadable CSV header: {}", e)))?
            .clone();

        let date_idx = headers
            .iter()
            .position(|h| normalize_column_name(h) == "date")
            .ok_or_else(|| FetchError::MissingField {
                symbol: symbol.to_string(),
                field: "date".to_string(),
            })?;

        let value_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_idx)
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let mut dates = Vec::new();
        let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); value_columns.len()];

        for record in reader.records() {
            let record = record.map_err(|e| malformed(format!("bad CSV row: {}", e)))?;
            let raw_date = record.get(date_idx).unwrap_or_default().trim();
            let day_part = raw_date.get(..10).unwrap_or(raw_date);
            let date = match NaiveDate::parse_from_str(day_part, "%Y-%m-%d") {
                Ok(date) => date,
                Err(_) => {
                    debug!("CsvSeriesProvider: skipping row with date '{}'", raw_date);
                    continue;
                }
            };
            if date < start || date >= end {
                continue;
            }

            dates.push(date);
            for (slot, (idx, _)) in values.iter_mut().zip(&value_columns) {
                slot.push(record.get(*idx).and_then(|v| v.trim().parse::<f64>().ok()));
            }
        }

        let frame = value_columns
            .into_iter()
            .zip(values)
            .fold(ProviderFrame::new(dates), |frame, ((_, name), column)| {
                frame.with_column(name, column)
            });
        Ok(frame)
    }
}

#[async_trait]
impl SeriesProvider for CsvSeriesProvider {
    async fn fetch_frame(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ProviderFrame, FetchError> {
        let path = self.dir.join(format!("{}.csv", symbol.to_uppercase()));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("CsvSeriesProvider: no history file for {}", symbol);
                return Ok(ProviderFrame::default());
            }
            Err(e) => {
                return Err(FetchError::Transport {
                    symbol: symbol.to_string(),
                    reason: format!("failed to read history file: {}", e.kind()),
                });
            }
        };

        Self::parse(symbol, &bytes, start, end)
    }

    fn name(&self) -> &str {
        "csv"
    }
}
