pub mod http_client_factory;
pub mod sleeper;

pub use http_client_factory::HttpClientFactory;
pub use sleeper::TokioSleeper;
