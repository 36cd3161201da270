use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub type UserId = i64;

/// The already-resolved user an analysis runs on behalf of.
///
/// Session and token lookup happen before the engine is reached; every
/// composed operation receives this context explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserContext {
    #[schemars(description = "Identifier of the owner of the transactions being analysed")]
    pub user_id: UserId,

    #[schemars(description = "Display name used as the root label of the relationship graph")]
    pub display_name: String,
}

impl UserContext {
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transaction {
    #[schemars(description = "Amount spent, in the document's currency")]
    pub amount: f64,

    #[schemars(description = "Spending category, e.g. 'Dining' or 'Transport'")]
    pub category: String,

    #[schemars(description = "Merchant or seller name as printed on the document")]
    pub merchant: String,

    #[schemars(description = "Transaction date in YYYY-MM-DD format")]
    pub date: NaiveDate,

    #[schemars(description = "Owner of the transaction")]
    pub user_id: UserId,
}

impl Transaction {
    pub fn new(
        user_id: UserId,
        date: NaiveDate,
        category: impl Into<String>,
        merchant: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            amount,
            category: category.into(),
            merchant: merchant.into(),
            date,
            user_id,
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Transaction)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// One calendar month of aggregated spending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeSeriesPoint {
    #[schemars(description = "Month label in YYYY-MM format")]
    pub period: String,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(period: impl Into<String>, value: f64) -> Self {
        Self {
            period: period.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterPoint {
    #[schemars(description = "Day of month the spending happened on (1-31)")]
    pub x: f64,

    #[schemars(description = "Amount spent")]
    pub y: f64,

    #[schemars(description = "Index of the assigned centroid, absent until the point is assigned")]
    pub cluster_id: Option<usize>,
}

impl ClusterPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            cluster_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

impl Centroid {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, point: &ClusterPoint) -> f64 {
        let dx = point.x - self.x;
        let dy = point.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<&ClusterPoint> for Centroid {
    fn from(point: &ClusterPoint) -> Self {
        Self::new(point.x, point.y)
    }
}

/// Centroid in the shape handed to the narrative collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CentroidProfile {
    #[schemars(description = "Typical day of month for the cluster, truncated to a whole day")]
    pub day: u32,

    #[schemars(description = "Typical amount for the cluster")]
    pub amount: f64,
}

impl From<&Centroid> for CentroidProfile {
    fn from(centroid: &Centroid) -> Self {
        Self {
            day: centroid.x.max(0.0) as u32,
            amount: centroid.y,
        }
    }
}

/// Graph level of a node, serialized as its depth (0 root, 1 category, 2 merchant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum NodeTier {
    Root,
    Category,
    Merchant,
}

impl NodeTier {
    pub fn depth(self) -> u8 {
        match self {
            NodeTier::Root => 0,
            NodeTier::Category => 1,
            NodeTier::Merchant => 2,
        }
    }
}

impl From<NodeTier> for u8 {
    fn from(tier: NodeTier) -> Self {
        tier.depth()
    }
}

impl TryFrom<u8> for NodeTier {
    type Error = String;

    fn try_from(depth: u8) -> std::result::Result<Self, Self::Error> {
        match depth {
            0 => Ok(NodeTier::Root),
            1 => Ok(NodeTier::Category),
            2 => Ok(NodeTier::Merchant),
            other => Err(format!("invalid node tier {}, expected 0, 1 or 2", other)),
        }
    }
}

impl JsonSchema for NodeTier {
    fn schema_name() -> String {
        "NodeTier".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        let mut schema = u8::json_schema(gen).into_object();
        schema.enum_values = Some(vec![0u8.into(), 1u8.into(), 2u8.into()]);
        schema.metadata().description =
            Some("0 = user root, 1 = spending category, 2 = merchant".to_string());
        schema.into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[schemars(description = "Rendered node size, grows logarithmically with total spend")]
    pub size_metric: f64,
    pub tier: NodeTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GraphEdge {
    pub source_id: String,
    pub target_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct KnowledgeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Ids of every node with an edge pointing at `target_id`.
    pub fn parents_of(&self, target_id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.target_id == target_id)
            .map(|e| e.source_id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = Transaction::schema_as_json().unwrap();
        assert!(schema_json.contains("amount"));
        assert!(schema_json.contains("merchant"));
        assert!(schema_json.contains("user_id"));
    }

    #[test]
    fn test_transaction_serialization() {
        let txn = Transaction::new(
            7,
            NaiveDate::from_ymd_opt(2025, 12, 9).unwrap(),
            "Dining",
            "Starbucks",
            38.5,
        );

        let json = serde_json::to_string(&txn).unwrap();
        assert!(json.contains("\"2025-12-09\""));

        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, txn);
    }

    #[test]
    fn test_centroid_distance_is_euclidean() {
        let centroid = Centroid::new(0.0, 0.0);
        let point = ClusterPoint::new(3.0, 4.0);
        assert!((centroid.distance_to(&point) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_profile_truncates_day() {
        let profile = CentroidProfile::from(&Centroid::new(14.8, 230.25));
        assert_eq!(profile.day, 14);
        assert_eq!(profile.amount, 230.25);
    }

    #[test]
    fn test_node_tier_depth() {
        assert_eq!(NodeTier::Root.depth(), 0);
        assert_eq!(NodeTier::Category.depth(), 1);
        assert_eq!(NodeTier::Merchant.depth(), 2);
    }

    #[test]
    fn test_graph_node_tier_serializes_as_depth() {
        let node = GraphNode {
            id: "MER_Cafe".to_string(),
            label: "Cafe".to_string(),
            size_metric: 12.0,
            tier: NodeTier::Merchant,
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["tier"], 2);

        let back: GraphNode = serde_json::from_value(json).unwrap();
        assert_eq!(back.tier, NodeTier::Merchant);
        assert!(serde_json::from_str::<NodeTier>("3").is_err());
    }
}
