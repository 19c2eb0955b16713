pub mod core;
pub mod csv_source;
pub mod i18n;
pub mod mock;
pub mod persistence;
pub mod yahoo;

pub use csv_source::CsvSeriesProvider;
pub use persistence::FileArtifactStore;
pub use yahoo::YahooChartProvider;
