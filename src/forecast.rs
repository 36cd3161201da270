use crate::schema::{TimeSeriesPoint, Transaction};
use crate::utils::month_label;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sums amounts per calendar month, oldest month first.
///
/// Months without any transaction are absent rather than zero-filled.
pub fn aggregate_monthly(transactions: &[Transaction]) -> Vec<TimeSeriesPoint> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for txn in transactions {
        *totals.entry(month_label(txn.date)).or_insert(0.0) += txn.amount;
    }

    totals
        .into_iter()
        .map(|(period, value)| TimeSeriesPoint { period, value })
        .collect()
}

/// `value = slope * index + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn value_at(&self, index: f64) -> f64 {
        self.slope * index + self.intercept
    }
}

/// Ordinary least-squares trend over an evenly spaced series.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendForecaster;

impl TrendForecaster {
    pub fn new() -> Self {
        Self
    }

    /// Fits the series against its indices `0, 1, 2, ...`.
    ///
    /// Returns `None` for an empty series. A single point has no index
    /// variance, so it yields a flat line through that point.
    pub fn fit(&self, series: &[f64]) -> Option<LinearFit> {
        match series.len() {
            0 => None,
            1 => Some(LinearFit {
                slope: 0.0,
                intercept: series[0],
            }),
            len => {
                let n = len as f64;
                let mut sum_x = 0.0;
                let mut sum_y = 0.0;
                let mut sum_xx = 0.0;
                let mut sum_xy = 0.0;

                for (i, &y) in series.iter().enumerate() {
                    let x = i as f64;
                    sum_x += x;
                    sum_y += y;
                    sum_xx += x * x;
                    sum_xy += x * y;
                }

                // Indices are distinct for len >= 2, so the denominator is positive.
                let denominator = n * sum_xx - sum_x * sum_x;
                let slope = (n * sum_xy - sum_x * sum_y) / denominator;
                let intercept = (sum_y - slope * sum_x) / n;

                Some(LinearFit { slope, intercept })
            }
        }
    }

    /// Predicts the value at the next unseen index, `series.len()`.
    pub fn predict_next(&self, series: &[f64]) -> f64 {
        let Some(fit) = self.fit(series) else {
            return 0.0;
        };

        let prediction = fit.value_at(series.len() as f64);
        debug!(
            "Trend fit over {} points: slope={:.4} intercept={:.4} next={:.4}",
            series.len(),
            fit.slope,
            fit.intercept,
            prediction
        );
        prediction
    }
}
