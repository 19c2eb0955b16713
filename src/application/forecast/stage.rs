use crate::domain::forecast::result::ModelOrigin;
use std::fmt;

/// Progress of a single forecast request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastStage {
    Fetching,
    Transforming,
    ResolvingModel,
    Training,
    Loading,
    Predicting,
    Evaluating,
    Done,
    Failed,
}

impl ForecastStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ForecastStage::Done | ForecastStage::Failed)
    }
}

impl From<ModelOrigin> for ForecastStage {
    fn from(origin: ModelOrigin) -> Self {
        match origin {
            ModelOrigin::Trained => ForecastStage::Training,
            ModelOrigin::Reused => ForecastStage::Loading,
        }
    }
}

impl fmt::Display for ForecastStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForecastStage::Fetching => "fetching",
            ForecastStage::Transforming => "transforming",
            ForecastStage::ResolvingModel => "resolving model",
            ForecastStage::Training => "training",
            ForecastStage::Loading => "loading",
            ForecastStage::Predicting => "predicting",
            ForecastStage::Evaluating => "evaluating",
            ForecastStage::Done => "done",
            ForecastStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_stage_follows_origin() {
        assert_eq!(ForecastStage::from(ModelOrigin::Trained), ForecastStage::Training);
        assert_eq!(ForecastStage::from(ModelOrigin::Reused), ForecastStage::Loading);
    }

    #[test]
    fn test_only_done_and_failed_are_terminal() {
        assert!(ForecastStage::Done.is_terminal());
        assert!(ForecastStage::Failed.is_terminal());
        assert!(!ForecastStage::ResolvingModel.is_terminal());
    }
}
