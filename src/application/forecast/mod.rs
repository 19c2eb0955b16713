pub mod engine;
pub mod stage;

pub use engine::ForecastEngine;
pub use stage::ForecastStage;
