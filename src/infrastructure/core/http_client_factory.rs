use reqwest::Client;
use std::time::Duration;

/// Browser-like agent; the chart endpoint rejects requests without one.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates the shared HTTP client. No retry middleware; the series fetcher retries.
    pub fn create_client(timeout: Duration, user_agent: &str) -> Client {
        Client::builder()
            .user_agent(user_agent)
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new())
    }
}
