use serde::{Deserialize, Serialize};

/// Min-max scaling of a single price column to [0, 1].
///
/// A constant column gets a unit range, so every value maps to 0 and inverts back to the constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fits on every finite value of `values`. Returns `None` if there is none.
    pub fn fit(values: &[f64]) -> Option<Self> {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if min > max {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    fn range(&self) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 { 1.0 } else { range }
    }

    pub fn scale(&self, value: f64) -> f64 {
        (value - self.min) / self.range()
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.range() + self.min
    }

    pub fn scale_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.scale(*v)).collect()
    }

    pub fn inverse_all(&self, scaled: &[f64]) -> Vec<f64> {
        scaled.iter().map(|s| self.inverse(*s)).collect()
    }
}
