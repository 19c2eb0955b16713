use super::scaler::MinMaxScaler;
use chrono::NaiveDate;
use ndarray::{Array1, Array2, s};

/// Inputs and targets for a slice of windows
#[derive(Debug, Clone)]
pub struct WindowBlock {
    pub inputs: Array2<f64>,
    pub targets: Array1<f64>,
    pub target_dates: Vec<NaiveDate>,
}

impl WindowBlock {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Scaled windows over one price series.
///
/// Row `i` of `inputs` holds the `window_size` scaled prices preceding `targets[i]`.
/// The dataset owns the scaler it was built with; predictions made against it must be
/// inverted through [`WindowedDataset::scaler`].
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    window_size: usize,
    windows: WindowBlock,
    scaler: MinMaxScaler,
}

/// Chronological split: the earlier windows train, the later ones are held out.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: WindowBlock,
    pub held_out: WindowBlock,
}

impl WindowedDataset {
    pub(crate) fn new(window_size: usize, windows: WindowBlock, scaler: MinMaxScaler) -> Self {
        Self {
            window_size,
            windows,
            scaler,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn inputs(&self) -> &Array2<f64> {
        &self.windows.inputs
    }

    pub fn targets(&self) -> &Array1<f64> {
        &self.windows.targets
    }

    pub fn target_dates(&self) -> &[NaiveDate] {
        &self.windows.target_dates
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    /// Splits at `floor(len * train_fraction)` without reordering.
    pub fn split(&self, train_fraction: f64) -> DatasetSplit {
        let n = self.len();
        let cut = ((n as f64) * train_fraction.clamp(0.0, 1.0)).floor() as usize;
        let cut = cut.min(n);

        let block = |range: std::ops::Range<usize>| WindowBlock {
            inputs: self.windows.inputs.slice(s![range.clone(), ..]).to_owned(),
            targets: self.windows.targets.slice(s![range.clone()]).to_owned(),
            target_dates: self.windows.target_dates[range].to_vec(),
        };

        DatasetSplit {
            train: block(0..cut),
            held_out: block(cut..n),
        }
    }
}
