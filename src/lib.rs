//! # Spending Analytics
//!
//! Numeric analytics over a user's accumulated spending history, built from
//! transactions extracted from scanned receipts and invoices.
//!
//! ## Components
//!
//! - **AnomalyDetector**: Z-score test of a new amount against the user's
//!   history in the same category
//! - **TrendForecaster**: least-squares line through monthly totals, predicting
//!   the next month
//! - **ClusterEngine**: K-Means over (day of month, amount) points
//! - **GraphAggregator**: user -> category -> merchant graph sized by spend
//!
//! Each component is stateless and pure. [`SpendingAnalyzer`] wires them to a
//! [`TransactionStore`] for callers that want the composed operations.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spending_analytics::*;
//! use chrono::NaiveDate;
//!
//! let user = UserContext::new(1, "Alice");
//! let mut analyzer = SpendingAnalyzer::new(InMemoryStore::new());
//!
//! let stored = analyzer.record_transaction(
//!     &user,
//!     Transaction::new(
//!         user.user_id,
//!         NaiveDate::from_ymd_opt(2025, 12, 9).unwrap(),
//!         "Dining",
//!         "Starbucks",
//!         38.0,
//!     ),
//! )?;
//!
//! let trend = analyzer.trend_report(&user);
//! let graph = analyzer.knowledge_graph(&user);
//! let clusters = analyzer.cluster_spending(&user)?;
//! ```

pub mod analyzer;
pub mod anomaly;
pub mod cluster;
pub mod config;
pub mod error;
pub mod forecast;
pub mod graph;
pub mod ingestion;
pub mod schema;
pub mod store;
pub mod utils;

pub use analyzer::{ClusterReport, SpendingAnalyzer, TrendReport};
pub use anomaly::{mean, sample_std_dev, AnomalyDetector, AnomalyVerdict};
pub use cluster::{cluster_points, ClusterEngine, ClusterResult, ClusterSummary};
pub use config::{AnalyticsConfig, AnomalyConfig, ClusteringConfig, GraphConfig, NodeSizing};
pub use error::{AnalyticsError, Result};
pub use forecast::{aggregate_monthly, LinearFit, TrendForecaster};
pub use graph::GraphAggregator;
pub use ingestion::{infer_category, ExtractedDocument};
pub use schema::*;
pub use store::{InMemoryStore, StoredTransaction, TransactionStore};
pub use utils::*;

/// Z-score check with the default policy (at least 5 samples, |z| > 2).
pub fn detect_anomaly(candidate: f64, history: &[f64]) -> bool {
    AnomalyDetector::new().is_anomaly(candidate, history)
}

pub fn predict_next(series: &[f64]) -> f64 {
    TrendForecaster::new().predict_next(series)
}

pub fn fit_clusters(
    points: &[ClusterPoint],
    k: usize,
    max_iterations: usize,
) -> Result<ClusterResult> {
    ClusterEngine::new().fit(points, k, max_iterations)
}

pub fn build_graph(transactions: &[Transaction], root_label: &str) -> KnowledgeGraph {
    GraphAggregator::new().build(transactions, root_label)
}
