use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::transaction::Transaction;
use crate::sources::traits::TransactionSource;

/// Transaction source backed by a plain in-memory list.
///
/// Hosts that load their log from elsewhere (or tests building
/// fixtures) push records in and hand the source to the engine.
/// Insertion order is preserved, which makes it the tie-break order
/// for same-timestamp transactions.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransactionSource {
    transactions: Vec<Transaction>,
}

impl MemoryTransactionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// Append one record.
    pub fn push(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[async_trait]
impl TransactionSource for MemoryTransactionSource {
    async fn account_transactions(&self, account_id: &str) -> Result<Vec<Transaction>, CoreError> {
        Ok(self
            .transactions
            .iter()
            .filter(|tx| tx.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn all_transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        Ok(self.transactions.clone())
    }
}
