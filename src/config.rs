use crate::error::{AnalyticsError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Policy constants for every analytics component.
///
/// Defaults reproduce the fixed design values; deployments may override any
/// of them from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub anomaly: AnomalyConfig,

    #[serde(default)]
    pub clustering: ClusteringConfig,

    #[serde(default)]
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnomalyConfig {
    #[schemars(
        description = "Minimum number of historical amounts required before any transaction can be flagged"
    )]
    pub min_history: usize,

    #[schemars(
        description = "A transaction is anomalous when its Z-score is strictly greater than this value"
    )]
    pub z_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_history: 5,
            z_threshold: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClusteringConfig {
    #[schemars(description = "Number of behavioral clusters")]
    pub k: usize,

    #[schemars(description = "Iteration budget for interactive clustering requests")]
    pub max_iterations: usize,

    #[schemars(description = "Iteration budget when clustering only to describe the centroids")]
    pub narrative_max_iterations: usize,

    #[schemars(description = "Fewer points than this yields no clustering result")]
    pub min_points: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iterations: 100,
            narrative_max_iterations: 50,
            min_points: 3,
        }
    }
}

/// Node sizing: `min(base + scale * ln(total + 1), cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeSizing {
    pub base: f64,
    pub scale: f64,
    pub cap: f64,
}

impl NodeSizing {
    pub fn size_for(&self, total_amount: f64) -> f64 {
        // ln is undefined below -1; refunds that net a node negative size as zero spend
        let size = self.base + (total_amount.max(0.0) + 1.0).ln() * self.scale;
        size.min(self.cap)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.base.is_finite() || !self.scale.is_finite() || !self.cap.is_finite() {
            return Err(AnalyticsError::InvalidConfig(format!(
                "{} sizing values must be finite",
                name
            )));
        }
        if self.cap < self.base {
            return Err(AnalyticsError::InvalidConfig(format!(
                "{} size cap {} is below its base size {}",
                name, self.cap, self.base
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GraphConfig {
    #[schemars(description = "Fixed size of the root (user) node")]
    pub root_size: f64,
    pub category: NodeSizing,
    pub merchant: NodeSizing,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            root_size: 60.0,
            category: NodeSizing {
                base: 20.0,
                scale: 5.0,
                cap: 50.0,
            },
            merchant: NodeSizing {
                base: 10.0,
                scale: 3.0,
                cap: 30.0,
            },
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.anomaly.min_history < 2 {
            return Err(AnalyticsError::InvalidConfig(format!(
                "anomaly.min_history must be at least 2 for a sample standard deviation, got {}",
                self.anomaly.min_history
            )));
        }
        if !(self.anomaly.z_threshold.is_finite() && self.anomaly.z_threshold > 0.0) {
            return Err(AnalyticsError::InvalidConfig(format!(
                "anomaly.z_threshold must be a positive number, got {}",
                self.anomaly.z_threshold
            )));
        }
        if self.clustering.k == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "clustering.k must be at least 1".to_string(),
            ));
        }
        if !self.graph.root_size.is_finite() || self.graph.root_size <= 0.0 {
            return Err(AnalyticsError::InvalidConfig(format!(
                "graph.root_size must be positive, got {}",
                self.graph.root_size
            )));
        }
        self.graph.category.validate("graph.category")?;
        self.graph.merchant.validate("graph.merchant")?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(AnalyticsConfig);
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_design_constants() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.anomaly.min_history, 5);
        assert_eq!(config.anomaly.z_threshold, 2.0);
        assert_eq!(config.clustering.k, 3);
        assert_eq!(config.clustering.max_iterations, 100);
        assert_eq!(config.clustering.narrative_max_iterations, 50);
        assert_eq!(config.graph.root_size, 60.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalyticsConfig::from_json(r#"{ "clustering": { "max_iterations": 20 } }"#)
            .unwrap();
        assert_eq!(config.clustering.max_iterations, 20);
        assert_eq!(config.clustering.k, 3);
        assert_eq!(config.anomaly, AnomalyConfig::default());
    }

    #[test]
    fn test_zero_k_rejected() {
        let result = AnalyticsConfig::from_json(r#"{ "clustering": { "k": 0 } }"#);
        assert!(matches!(result, Err(AnalyticsError::InvalidConfig(_))));
    }

    #[test]
    fn test_non_positive_threshold_rejected() {
        let mut config = AnalyticsConfig::default();
        config.anomaly.z_threshold = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let result = AnalyticsConfig::from_json("{ not json");
        assert!(matches!(result, Err(AnalyticsError::SerializationError(_))));
    }

    #[test]
    fn test_node_sizing_caps_and_floors() {
        let sizing = GraphConfig::default().category;
        assert_eq!(sizing.size_for(0.0), 20.0);
        assert_eq!(sizing.size_for(1.0e12), 50.0);
        assert_eq!(sizing.size_for(-250.0), 20.0);

        let expected = 20.0 + (100.0_f64 + 1.0).ln() * 5.0;
        assert!((sizing.size_for(100.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_schema_mentions_sections() {
        let schema = AnalyticsConfig::schema_as_json().unwrap();
        assert!(schema.contains("anomaly"));
        assert!(schema.contains("clustering"));
        assert!(schema.contains("graph"));
    }
}
