use crate::error::Result;
use crate::forecast::aggregate_monthly;
use crate::schema::{TimeSeriesPoint, Transaction, UserId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A transaction as persisted, with its anomaly flag attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoredTransaction {
    pub id: u64,

    #[serde(flatten)]
    pub transaction: Transaction,

    #[schemars(description = "Set once when the transaction is saved, never recomputed")]
    pub is_anomaly: bool,
}

/// The persistence collaborator the analytics operate over.
///
/// Implementations only ever return data belonging to the requested user.
pub trait TransactionStore {
    /// All of a user's transactions, newest first.
    fn transactions_for(&self, user_id: UserId) -> Vec<Transaction>;

    /// Amounts previously saved by `user_id` in `category`.
    fn category_history(&self, user_id: UserId, category: &str) -> Vec<f64>;

    /// Monthly spend totals, oldest month first.
    fn monthly_totals(&self, user_id: UserId) -> Vec<TimeSeriesPoint>;

    fn save(&mut self, transaction: Transaction, is_anomaly: bool) -> Result<StoredTransaction>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Vec<StoredTransaction>,
    next_id: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[StoredTransaction] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn owned_by(
        &self,
        user_id: UserId,
    ) -> impl DoubleEndedIterator<Item = &StoredTransaction> + '_ {
        self.records
            .iter()
            .filter(move |r| r.transaction.user_id == user_id)
    }
}

impl TransactionStore for InMemoryStore {
    fn transactions_for(&self, user_id: UserId) -> Vec<Transaction> {
        self.owned_by(user_id)
            .rev()
            .map(|r| r.transaction.clone())
            .collect()
    }

    fn category_history(&self, user_id: UserId, category: &str) -> Vec<f64> {
        self.owned_by(user_id)
            .filter(|r| r.transaction.category == category)
            .map(|r| r.transaction.amount)
            .collect()
    }

    fn monthly_totals(&self, user_id: UserId) -> Vec<TimeSeriesPoint> {
        let transactions: Vec<Transaction> = self
            .owned_by(user_id)
            .map(|r| r.transaction.clone())
            .collect();
        aggregate_monthly(&transactions)
    }

    fn save(&mut self, transaction: Transaction, is_anomaly: bool) -> Result<StoredTransaction> {
        self.next_id += 1;
        let stored = StoredTransaction {
            id: self.next_id,
            transaction,
            is_anomaly,
        };
        self.records.push(stored.clone());
        Ok(stored)
    }
}
