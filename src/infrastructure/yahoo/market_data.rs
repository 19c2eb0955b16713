use super::common::{ChartData, ChartResponse};
use crate::domain::errors::FetchError;
use crate::domain::market::series::ProviderFrame;
use crate::domain::ports::SeriesProvider;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use tracing::{debug, error};

pub const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Daily bars from the Yahoo chart endpoint
pub struct YahooChartProvider {
    client: Client,
    base_url: String,
}

impl YahooChartProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn unix_midnight(date: NaiveDate) -> i64 {
        date.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default()
    }

    /// Turns a chart body into a frame. Unknown symbols yield an empty frame.
    pub(crate) fn parse_chart(symbol: &str, body: &str) -> Result<ProviderFrame, FetchError> {
        let transport = |reason: String| FetchError::Transport {
            symbol: symbol.to_string(),
            reason,
        };

        let response: ChartResponse = serde_json::from_str(body)
            .map_err(|e| transport(format!("invalid chart payload: {}", e)))?;

        if let Some(err) = response.chart.error {
            if err.code.eq_ignore_ascii_case("Not Found") {
                return Ok(ProviderFrame::default());
            }
            return Err(transport(format!("{}: {}", err.code, err.description)));
        }

        let data = match response.chart.result.and_then(|r| r.into_iter().next()) {
            Some(data) => data,
            None => return Ok(ProviderFrame::default()),
        };

        Ok(Self::frame_from_chart(data))
    }

    fn frame_from_chart(data: ChartData) -> ProviderFrame {
        let dates: Vec<NaiveDate> = data
            .timestamp
            .iter()
            .filter_map(|ts| DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()))
            .collect();
        // A timestamp that fails to convert would misalign every column.
        if dates.len() != data.timestamp.len() {
            return ProviderFrame::default();
        }

        let mut frame = ProviderFrame::new(dates);
        if let Some(quote) = data.indicators.quote.into_iter().next() {
            let columns = [
                ("Open", quote.open),
                ("High", quote.high),
                ("Low", quote.low),
                ("Close", quote.close),
                ("Volume", quote.volume),
            ];
            for (name, values) in columns {
                if let Some(values) = values {
                    frame = frame.with_column(name, values);
                }
            }
        }
        if let Some(adj) = data.indicators.adjclose.and_then(|a| a.into_iter().next()) {
            frame = frame.with_column("Adj Close", adj.adjclose);
        }
        frame
    }
}

#[async_trait]
impl SeriesProvider for YahooChartProvider {
    async fn fetch_frame(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ProviderFrame, FetchError> {
        let transport = |reason: String| FetchError::Transport {
            symbol: symbol.to_string(),
            reason,
        };

        let url = format!("{}/{}", self.base_url, symbol.to_uppercase());
        let period1 = Self::unix_midnight(start).to_string();
        // End date is exclusive
        let period2 = Self::unix_midnight(end).to_string();

        debug!(
            "YahooChartProvider: GET {} period1={} period2={}",
            url, period1, period2
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "history"),
            ])
            .send()
            .await
            .map_err(|e| transport(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport(format!("failed to read body: {}", e.without_url())))?;

        if !status.is_success() {
            // 404 still carries a chart error body for unknown symbols
            if let Ok(frame) = Self::parse_chart(symbol, &body) {
                return Ok(frame);
            }
            error!(
                "YahooChartProvider: API error {} for {}: {}",
                status, symbol, body
            );
            return Err(transport(format!("HTTP {}", status)));
        }

        Self::parse_chart(symbol, &body)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}
