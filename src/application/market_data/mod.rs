pub mod retry;
pub mod series_fetcher;

pub use series_fetcher::SeriesFetcher;
