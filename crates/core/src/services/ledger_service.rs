use log::debug;

use crate::errors::CoreError;
use crate::models::ledger::LedgerState;
use crate::models::transaction::Transaction;

/// Replays transaction streams into holdings and cash totals.
///
/// Pure business logic: no I/O, no price lookups. Easy to test.
pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        Self
    }

    /// Stable chronological sort, keeping the original record order as
    /// the tie-break for equal timestamps. Replaying a stream sorted
    /// this way is deterministic across calls.
    pub fn sort_chronologically(&self, transactions: &mut [Transaction]) {
        transactions.sort_by_key(|tx| tx.timestamp);
    }

    /// Replay an already-sorted stream from scratch.
    ///
    /// Over-sells are clamped and counted, never rejected; the only way
    /// a replay fails is a structurally invalid record.
    pub fn replay(&self, transactions: &[Transaction]) -> Result<LedgerState, CoreError> {
        let mut state = LedgerState::new();
        for tx in transactions {
            state.apply(tx)?;
        }
        debug!(
            "Replayed {} transactions into {} open positions ({} over-sells clamped)",
            state.transactions_applied,
            state.holdings.len(),
            state.oversell_clamps
        );
        Ok(state)
    }

    /// Replay only the transactions at or before `cutoff`, for
    /// point-in-time holdings. The stream must be sorted.
    pub fn replay_until(
        &self,
        transactions: &[Transaction],
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<LedgerState, CoreError> {
        let mut state = LedgerState::new();
        for tx in transactions {
            if tx.timestamp > cutoff {
                break;
            }
            state.apply(tx)?;
        }
        Ok(state)
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}
