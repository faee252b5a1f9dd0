use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::holding::Holding;
use crate::models::transaction::{Transaction, TransactionKind};

/// Cumulative cash movements observed while replaying a stream.
///
/// Every flow is recorded pre-fee and `fees` aggregates the fee portion
/// once, so `balance()` reproduces the net cash effect of the stream
/// exactly. `purchase_cost` is the running "ever invested" total; unlike
/// an open cost basis it is never reduced by sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashSummary {
    /// Cash paid in
    pub deposited: f64,
    /// Cash taken out (pre-fee magnitude)
    pub withdrawn: f64,
    /// Dividend income (pre-fee)
    pub dividends: f64,
    /// Interest income (pre-fee)
    pub interest: f64,
    /// Net-of-nothing sale value (proceeds plus the fee the broker kept)
    pub sale_proceeds: f64,
    /// Cash that went into buying assets, fees excluded
    pub purchase_cost: f64,
    /// Every fee seen: per-event `fee_amount` plus standalone charges
    pub fees: f64,
}

impl CashSummary {
    /// Net cash position implied by the recorded flows.
    #[must_use]
    pub fn balance(&self) -> f64 {
        self.deposited - self.withdrawn + self.dividends + self.interest + self.sale_proceeds
            - self.purchase_cost
            - self.fees
    }
}

/// Holdings and running totals built up by replaying a transaction
/// stream. Request-scoped: created fresh per calculation, advanced one
/// transaction at a time, never shared across calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Open positions keyed by asset id. A position that drops to zero
    /// units is removed; a later buy reopens it from scratch.
    pub holdings: HashMap<String, Holding>,

    /// Cumulative cash flows
    pub cash: CashSummary,

    /// Gains locked in by sells, dividends and interest, net of fees
    pub realized_gains: f64,

    /// How many sells exceeded the recorded holding and were clamped
    pub oversell_clamps: u32,

    /// Transactions applied so far
    pub transactions_applied: usize,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one transaction, advancing holdings and totals.
    ///
    /// Transactions must arrive in chronological order; callers sort the
    /// stream before replaying it. Structural violations abort the
    /// replay, everything else (over-sells included) is absorbed.
    pub fn apply(&mut self, tx: &Transaction) -> Result<(), CoreError> {
        tx.validate()?;

        match tx.kind {
            TransactionKind::Buy => {
                // The fee travels inside gross_amount; only the asset
                // side of the cash outflow becomes cost basis.
                let cost = tx.gross_amount.abs() - tx.fee_amount;
                if let Some(asset_id) = &tx.asset_id {
                    let holding = self
                        .holdings
                        .entry(asset_id.clone())
                        .or_insert_with(|| Holding::new(asset_id.clone()));
                    holding.apply_buy(tx.quantity, cost);
                }
                self.cash.purchase_cost += cost;
                self.cash.fees += tx.fee_amount;
            }
            TransactionKind::Sell => {
                if let Some(asset_id) = &tx.asset_id {
                    let holding = self
                        .holdings
                        .entry(asset_id.clone())
                        .or_insert_with(|| Holding::new(asset_id.clone()));
                    let (realized, clamped) = holding.apply_sell(tx.quantity, tx.gross_amount);
                    self.realized_gains += realized;
                    if clamped {
                        self.oversell_clamps += 1;
                        warn!(
                            "Sell of {} units of {} exceeds recorded holding; clamping position to zero",
                            tx.quantity, asset_id
                        );
                    }
                    if holding.is_flat() {
                        self.holdings.remove(asset_id);
                    }
                }
                self.cash.sale_proceeds += tx.gross_amount + tx.fee_amount;
                self.cash.fees += tx.fee_amount;
            }
            TransactionKind::Deposit => {
                self.cash.deposited += tx.gross_amount + tx.fee_amount;
                self.cash.fees += tx.fee_amount;
            }
            TransactionKind::Withdrawal => {
                self.cash.withdrawn += tx.gross_amount.abs() - tx.fee_amount;
                self.cash.fees += tx.fee_amount;
            }
            TransactionKind::Dividend => {
                self.realized_gains += tx.gross_amount;
                self.cash.dividends += tx.gross_amount + tx.fee_amount;
                self.cash.fees += tx.fee_amount;
            }
            TransactionKind::Interest => {
                self.realized_gains += tx.gross_amount;
                self.cash.interest += tx.gross_amount + tx.fee_amount;
                self.cash.fees += tx.fee_amount;
            }
            TransactionKind::Fee => {
                let charge = tx.fee_charge();
                self.realized_gains -= charge;
                self.cash.fees += charge;
            }
        }

        self.transactions_applied += 1;
        Ok(())
    }

    /// The open position in one asset, if any.
    #[must_use]
    pub fn holding(&self, asset_id: &str) -> Option<&Holding> {
        self.holdings.get(asset_id)
    }

    /// Units currently held of one asset (0 for closed positions).
    #[must_use]
    pub fn quantity_held(&self, asset_id: &str) -> f64 {
        self.holdings.get(asset_id).map_or(0.0, |h| h.quantity)
    }

    /// Sum of cost basis across all open positions.
    #[must_use]
    pub fn open_cost_basis(&self) -> f64 {
        self.holdings.values().map(|h| h.cost_basis).sum()
    }
}
