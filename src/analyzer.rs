use crate::anomaly::{AnomalyDetector, AnomalyVerdict};
use crate::cluster::{cluster_points, ClusterEngine, ClusterResult, ClusterSummary};
use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::forecast::TrendForecaster;
use crate::graph::GraphAggregator;
use crate::schema::{CentroidProfile, KnowledgeGraph, Transaction, UserContext};
use crate::store::{StoredTransaction, TransactionStore};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendReport {
    #[schemars(description = "Month labels (YYYY-MM), oldest first")]
    pub months: Vec<String>,
    pub amounts: Vec<f64>,
    #[schemars(description = "Forecast spend for the month after the last one listed")]
    pub prediction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterReport {
    pub k: usize,
    pub total_points: usize,
    pub clusters: Vec<ClusterSummary>,
    pub result: ClusterResult,
}

/// Runs the analytics components over one user's stored history.
///
/// Holds no per-user state: every call reloads what it needs from the store.
pub struct SpendingAnalyzer<S: TransactionStore> {
    store: S,
    config: AnalyticsConfig,
    detector: AnomalyDetector,
    forecaster: TrendForecaster,
    engine: ClusterEngine,
    aggregator: GraphAggregator,
}

impl<S: TransactionStore> SpendingAnalyzer<S> {
    pub fn new(store: S) -> Self {
        Self::build(store, AnalyticsConfig::default())
    }

    pub fn with_config(store: S, config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(store, config))
    }

    fn build(store: S, config: AnalyticsConfig) -> Self {
        Self {
            store,
            detector: AnomalyDetector::with_config(config.anomaly.clone()),
            forecaster: TrendForecaster::new(),
            engine: ClusterEngine::new(),
            aggregator: GraphAggregator::with_config(config.graph.clone()),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Classifies a transaction that has not been saved yet against the
    /// user's saved history in the same category.
    pub fn flag_new_transaction(&self, user: &UserContext, txn: &Transaction) -> AnomalyVerdict {
        let history = self.store.category_history(user.user_id, &txn.category);
        let verdict = self.detector.classify(txn.amount, &history);

        if verdict.is_anomaly {
            warn!(
                "Unusual {} spend for user {}: {} at '{}' (category mean {:.2}, z={:.2})",
                txn.category,
                user.user_id,
                txn.amount,
                txn.merchant,
                verdict.mean,
                verdict.z_score.unwrap_or_default()
            );
        }

        verdict
    }

    /// Flags and saves a transaction on behalf of `user`.
    ///
    /// The record's owner is always the context user, whatever `user_id` it
    /// arrived with.
    pub fn record_transaction(
        &mut self,
        user: &UserContext,
        mut txn: Transaction,
    ) -> Result<StoredTransaction> {
        txn.user_id = user.user_id;
        let verdict = self.flag_new_transaction(user, &txn);
        let stored = self.store.save(txn, verdict.is_anomaly)?;
        info!(
            "Saved transaction {} for user {} (anomaly: {})",
            stored.id, user.user_id, stored.is_anomaly
        );
        Ok(stored)
    }

    pub fn trend_report(&self, user: &UserContext) -> TrendReport {
        let series = self.store.monthly_totals(user.user_id);
        let amounts: Vec<f64> = series.iter().map(|p| p.value).collect();
        let prediction = self.forecaster.predict_next(&amounts);

        info!(
            "Trend report for user {}: {} months, next month forecast {:.2}",
            user.user_id,
            amounts.len(),
            prediction
        );

        TrendReport {
            months: series.into_iter().map(|p| p.period).collect(),
            amounts,
            prediction,
        }
    }

    pub fn knowledge_graph(&self, user: &UserContext) -> KnowledgeGraph {
        let transactions = self.store.transactions_for(user.user_id);
        self.aggregator.build(&transactions, &user.display_name)
    }

    /// Clusters the user's spending with the interactive iteration budget.
    ///
    /// `Ok(None)` when there are too few transactions to cluster.
    pub fn cluster_spending(&self, user: &UserContext) -> Result<Option<ClusterReport>> {
        let max_iterations = self.config.clustering.max_iterations;
        let Some(result) = self.fit_user_clusters(user, max_iterations)? else {
            return Ok(None);
        };

        Ok(Some(ClusterReport {
            k: result.centroids.len(),
            total_points: result.assignments.len(),
            clusters: result.summaries(),
            result,
        }))
    }

    /// Centroids as `(day, amount)` pairs for the narrative service, using
    /// the narrative iteration budget.
    pub fn cluster_profiles(&self, user: &UserContext) -> Result<Option<Vec<CentroidProfile>>> {
        let max_iterations = self.config.clustering.narrative_max_iterations;
        Ok(self
            .fit_user_clusters(user, max_iterations)?
            .map(|result| result.profiles()))
    }

    fn fit_user_clusters(
        &self,
        user: &UserContext,
        max_iterations: usize,
    ) -> Result<Option<ClusterResult>> {
        let transactions = self.store.transactions_for(user.user_id);
        let points = cluster_points(&transactions);

        if points.len() < self.config.clustering.min_points {
            info!(
                "Not enough transactions to cluster for user {}: {} of {}",
                user.user_id,
                points.len(),
                self.config.clustering.min_points
            );
            return Ok(None);
        }

        debug!(
            "Clustering {} points for user {} (k={}, max_iterations={})",
            points.len(),
            user.user_id,
            self.config.clustering.k,
            max_iterations
        );

        self.engine
            .fit(&points, self.config.clustering.k, max_iterations)
            .map(Some)
    }
}
