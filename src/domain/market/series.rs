use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One daily observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Daily prices strictly ordered by date, without duplicates or missing values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawSeries {
    points: Vec<PricePoint>,
}

impl RawSeries {
    /// Builds a series from raw provider rows.
    ///
    /// Rows without a finite price are dropped, rows are sorted by date and
    /// repeated dates collapse onto the last observation.
    pub fn from_observations<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
    {
        let mut by_date = BTreeMap::new();
        for (date, price) in rows {
            if let Some(price) = price.filter(|p| p.is_finite()) {
                by_date.insert(date, price);
            }
        }

        Self {
            points: by_date
                .into_iter()
                .map(|(date, price)| PricePoint { date, price })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

/// A provider response before normalization: a date index plus named numeric columns.
///
/// Column naming differs between providers ("Close", "close", "Close|AAPL", ...);
/// [`ProviderFrame::column`] matches on the normalized name.
#[derive(Debug, Clone, Default)]
pub struct ProviderFrame {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<(String, Vec<Option<f64>>)>,
}

impl ProviderFrame {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.columns.push((name.into(), values));
        self
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First column whose normalized name equals `field` (already lower-case).
    pub fn column(&self, field: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(name, _)| normalize_column_name(name) == field)
            .map(|(_, values)| values.as_slice())
    }

    /// Reduces the frame to `(date, price)` using `field`. `None` if the field is absent.
    pub fn to_series(&self, field: &str) -> Option<RawSeries> {
        let values = self.column(field)?;
        let rows = self
            .dates
            .iter()
            .enumerate()
            .map(|(i, date)| (*date, values.get(i).copied().flatten()));
        Some(RawSeries::from_observations(rows))
    }
}

/// Flattens multi-level names ("Close|AAPL", "Close:AAPL") to their first level,
/// lower-cased with inner whitespace removed ("Adj Close" -> "adjclose").
pub fn normalize_column_name(name: &str) -> String {
    let first_level = name.split(['|', ':', '/']).next().unwrap_or(name);
    first_level
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
