//! User -> category -> merchant relationship graph.
//!
//! Node sizes grow with the logarithm of total spend so a single large
//! category does not swamp the rendering. Each merchant hangs under the
//! category of the first transaction that mentions it; later transactions
//! at the same merchant under other categories add to its size but never
//! add a second parent.

use crate::config::GraphConfig;
use crate::schema::{GraphEdge, GraphNode, KnowledgeGraph, NodeTier, Transaction};
use log::debug;
use std::collections::{HashMap, HashSet};

pub const ROOT_ID: &str = "ROOT";

pub fn category_node_id(category: &str) -> String {
    format!("CAT_{}", category)
}

pub fn merchant_node_id(merchant: &str) -> String {
    format!("MER_{}", merchant)
}

#[derive(Debug, Clone, Default)]
pub struct GraphAggregator {
    config: GraphConfig,
}

impl GraphAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, transactions: &[Transaction], root_label: &str) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::default();
        graph.nodes.push(GraphNode {
            id: ROOT_ID.to_string(),
            label: root_label.to_string(),
            size_metric: self.config.root_size,
            tier: NodeTier::Root,
        });

        let mut category_totals: HashMap<&str, f64> = HashMap::new();
        let mut merchant_totals: HashMap<&str, f64> = HashMap::new();
        for txn in transactions {
            *category_totals.entry(txn.category.as_str()).or_insert(0.0) += txn.amount;
            *merchant_totals.entry(txn.merchant.as_str()).or_insert(0.0) += txn.amount;
        }

        let mut seen_categories: HashSet<&str> = HashSet::new();
        let mut seen_merchants: HashSet<&str> = HashSet::new();

        for txn in transactions {
            let category = txn.category.as_str();
            let merchant = txn.merchant.as_str();

            if seen_categories.insert(category) {
                let total = category_totals.get(category).copied().unwrap_or(0.0);
                let id = category_node_id(category);
                graph.nodes.push(GraphNode {
                    id: id.clone(),
                    label: category.to_string(),
                    size_metric: self.config.category.size_for(total),
                    tier: NodeTier::Category,
                });
                graph.edges.push(GraphEdge {
                    source_id: ROOT_ID.to_string(),
                    target_id: id,
                });
            }

            if seen_merchants.insert(merchant) {
                let total = merchant_totals.get(merchant).copied().unwrap_or(0.0);
                let id = merchant_node_id(merchant);
                graph.nodes.push(GraphNode {
                    id: id.clone(),
                    label: merchant.to_string(),
                    size_metric: self.config.merchant.size_for(total),
                    tier: NodeTier::Merchant,
                });
                graph.edges.push(GraphEdge {
                    source_id: category_node_id(category),
                    target_id: id,
                });
            }
        }

        debug!(
            "Built graph for '{}': {} categories, {} merchants from {} transactions",
            root_label,
            seen_categories.len(),
            seen_merchants.len(),
            transactions.len()
        );

        graph
    }
}
