use crate::config::AnomalyConfig;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation (Bessel's correction). 0.0 below two values.
pub fn sample_std_dev(data: &[f64], mean: f64) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let squared: f64 = data.iter().map(|v| (v - mean) * (v - mean)).sum();
    (squared / (data.len() - 1) as f64).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnomalyVerdict {
    pub is_anomaly: bool,

    #[schemars(
        description = "Distance from the historical mean in standard deviations. Absent when the history was too short or perfectly uniform."
    )]
    pub z_score: Option<f64>,

    pub mean: f64,
    pub std_dev: f64,
    pub sample_size: usize,
}

impl AnomalyVerdict {
    fn normal(mean: f64, std_dev: f64, sample_size: usize) -> Self {
        Self {
            is_anomaly: false,
            z_score: None,
            mean,
            std_dev,
            sample_size,
        }
    }
}

/// Z-score outlier test of one amount against the same user's history in
/// the same category.
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// `history` must not contain `candidate` itself.
    pub fn classify(&self, candidate: f64, history: &[f64]) -> AnomalyVerdict {
        let n = history.len();
        if n < self.config.min_history {
            debug!(
                "Anomaly check skipped: {} historical amounts, need {}",
                n, self.config.min_history
            );
            return AnomalyVerdict::normal(0.0, 0.0, n);
        }

        let mean = mean(history);
        let std_dev = sample_std_dev(history, mean);

        if std_dev == 0.0 {
            debug!("Anomaly check skipped: uniform history (mean {})", mean);
            return AnomalyVerdict::normal(mean, std_dev, n);
        }

        let z = (candidate - mean).abs() / std_dev;
        let is_anomaly = z > self.config.z_threshold;

        debug!(
            "Anomaly check: amount={} mean={:.4} std_dev={:.4} z={:.4} anomalous={}",
            candidate, mean, std_dev, z, is_anomaly
        );

        AnomalyVerdict {
            is_anomaly,
            z_score: Some(z),
            mean,
            std_dev,
            sample_size: n,
        }
    }

    pub fn is_anomaly(&self, candidate: f64, history: &[f64]) -> bool {
        self.classify(candidate, history).is_anomaly
    }
}
