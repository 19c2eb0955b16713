use crate::domain::errors::FetchError;
use crate::domain::market::series::ProviderFrame;
use crate::domain::ports::{SeriesProvider, Sleeper};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// One scripted provider reply
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Frame(ProviderFrame),
    Fail(FetchError),
}

impl ScriptedResponse {
    /// Consecutive daily closes starting at `start`, in a single "Close" column.
    pub fn closes(start: NaiveDate, prices: &[f64]) -> Self {
        let dates = (0..prices.len())
            .map(|i| start + Days::new(i as u64))
            .collect();
        let values = prices.iter().map(|p| Some(*p)).collect();
        ScriptedResponse::Frame(ProviderFrame::new(dates).with_column("Close", values))
    }

    pub fn transport(symbol: &str, reason: &str) -> Self {
        ScriptedResponse::Fail(FetchError::Transport {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        })
    }
}

#[derive(Default)]
struct SymbolScript {
    queue: VecDeque<ScriptedResponse>,
    fallback: Option<ScriptedResponse>,
    attempts: u32,
}

/// Provider returning scripted replies per symbol.
///
/// Queued replies are consumed in order; once the queue is empty the fallback reply (if any)
/// is repeated. Symbols without a script fail with a transport error.
#[derive(Default)]
pub struct MockSeriesProvider {
    scripts: Mutex<HashMap<String, SymbolScript>>,
}

impl MockSeriesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, symbol: &str, responses: Vec<ScriptedResponse>) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts
                .entry(symbol.to_uppercase())
                .or_default()
                .queue
                .extend(responses);
        }
        self
    }

    pub fn always(self, symbol: &str, response: ScriptedResponse) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(symbol.to_uppercase()).or_default().fallback = Some(response);
        }
        self
    }

    /// Number of `fetch_frame` calls made for `symbol`
    pub fn attempts(&self, symbol: &str) -> u32 {
        self.scripts
            .lock()
            .ok()
            .and_then(|s| s.get(&symbol.to_uppercase()).map(|s| s.attempts))
            .unwrap_or(0)
    }
}

#[async_trait]
impl SeriesProvider for MockSeriesProvider {
    async fn fetch_frame(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<ProviderFrame, FetchError> {
        let response = {
            let mut scripts = self.scripts.lock().map_err(|_| FetchError::Transport {
                symbol: symbol.to_string(),
                reason: "mock provider lock poisoned".to_string(),
            })?;
            let script = scripts.entry(symbol.to_uppercase()).or_default();
            script.attempts += 1;
            debug!("MockSeriesProvider: attempt {} for {}", script.attempts, symbol);
            script.queue.pop_front().or_else(|| script.fallback.clone())
        };

        match response {
            Some(ScriptedResponse::Frame(frame)) => Ok(frame),
            Some(ScriptedResponse::Fail(e)) => Err(e),
            None => Err(FetchError::Transport {
                symbol: symbol.to_string(),
                reason: "no scripted response".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Sleeper that records requested durations and returns immediately
#[derive(Default)]
pub struct RecordingSleeper {
    recorded: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push(duration);
        }
    }
}
