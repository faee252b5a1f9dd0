use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::transaction::Transaction;

/// Read-side view of the normalized transaction log.
///
/// Whatever persists transactions (a database, an import pipeline, a
/// fixture) exposes them through this trait. Records are expected to
/// arrive already normalized, typed and deduplicated; the engine checks
/// structure but never deduplicates. Ordering does not matter; streams
/// are stable-sorted by timestamp before replay, so implementations can
/// return records in whatever order is cheap.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Every transaction recorded for one account. An unknown account
    /// simply has no transactions.
    async fn account_transactions(&self, account_id: &str) -> Result<Vec<Transaction>, CoreError>;

    /// Every transaction across all accounts.
    async fn all_transactions(&self) -> Result<Vec<Transaction>, CoreError>;
}
