use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use crate::errors::CoreError;
use crate::models::ledger::LedgerState;
use crate::models::performance::PerformancePoint;
use crate::models::period::CheckpointPolicy;
use crate::models::transaction::Transaction;
use crate::oracle::traits::PriceOracle;
use crate::services::ledger_service::LedgerService;

/// Totals snapshot taken just before a window opens. Subtracting it
/// from the final state turns whole-history accumulators into
/// window-scoped deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowBaseline {
    pub realized_gains: f64,
    pub fees: f64,
    pub oversell_clamps: u32,
}

/// Everything one valuation pass over a window produces.
#[derive(Debug, Default)]
pub struct ValuationOutcome {
    /// Value/invested pairs, one per checkpoint
    pub time_series: Vec<PerformancePoint>,

    /// Ledger state after replaying everything up to the window end
    pub final_state: LedgerState,

    /// Totals as they stood just before the window opened
    pub baseline: WindowBaseline,

    /// The price each still-open asset was valued at on the final
    /// checkpoint
    pub closing_prices: HashMap<String, f64>,

    /// Whether any checkpoint valued an asset with a substitute price
    pub used_stale_prices: bool,

    /// The window actually walked, after clipping (None when there was
    /// nothing to value)
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

/// Builds portfolio value time series across a window of checkpoints.
///
/// For each checkpoint in the window:
/// 1. Advance the ledger replay up to the checkpoint's timestamp
/// 2. Price every open position via the oracle's fallback chain
/// 3. Emit a value/invested pair
///
/// The stream is consumed once, in order, reusing the running ledger
/// state across checkpoints: O(checkpoints + transactions), not
/// O(checkpoints × transactions).
pub struct ValuationService {
    ledger: LedgerService,
}

impl ValuationService {
    pub fn new() -> Self {
        Self {
            ledger: LedgerService::new(),
        }
    }

    /// Walk `[window_start, window_end]` and value the portfolio at each
    /// checkpoint.
    ///
    /// The stream is stable-sorted here, so callers can hand over
    /// records in arrival order. A window start before the first
    /// transaction is clipped forward to it; an all-zero portfolio
    /// before inception is not worth plotting.
    pub async fn build(
        &self,
        mut transactions: Vec<Transaction>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        policy: CheckpointPolicy,
        oracle: &dyn PriceOracle,
    ) -> Result<ValuationOutcome, CoreError> {
        if transactions.is_empty() {
            return Ok(ValuationOutcome::default());
        }

        self.ledger.sort_chronologically(&mut transactions);

        let first_activity = transactions[0].timestamp;
        let start = window_start.max(first_activity);
        if start > window_end {
            // Every transaction is after the requested window; there is
            // nothing to value inside it.
            return Ok(ValuationOutcome::default());
        }

        let mut state = LedgerState::new();
        let mut idx = 0;

        // Replay history from inception up to (strictly before) the
        // window start, then snapshot the running totals. Window-scoped
        // figures are deltas against this baseline.
        while idx < transactions.len() && transactions[idx].timestamp < start {
            state.apply(&transactions[idx])?;
            idx += 1;
        }
        let baseline = WindowBaseline {
            realized_gains: state.realized_gains,
            fees: state.cash.fees,
            oversell_clamps: state.oversell_clamps,
        };

        // Checkpoint grid: regular spacing from the (clipped) start,
        // with the window end always included even off-grid.
        let window_days = (window_end - start).num_days();
        let spacing = Duration::days(policy.spacing_days(window_days));
        let mut checkpoints = Vec::new();
        let mut t = start;
        while t < window_end {
            checkpoints.push(t);
            t += spacing;
        }
        checkpoints.push(window_end);

        debug!(
            "Valuing {} checkpoints over {} days ({} transactions in scope)",
            checkpoints.len(),
            window_days,
            transactions.len()
        );

        let mut time_series = Vec::with_capacity(checkpoints.len());
        let mut closing_prices = HashMap::new();
        let mut used_stale_prices = false;

        for checkpoint in checkpoints {
            // Advance the replay up to this checkpoint (inclusive)
            while idx < transactions.len() && transactions[idx].timestamp <= checkpoint {
                state.apply(&transactions[idx])?;
                idx += 1;
            }

            // Snapshot the open positions, sorted by asset id so that
            // f64 summation order (and thus the output) is deterministic
            let mut open: Vec<(String, f64, f64)> = state
                .holdings
                .iter()
                .map(|(id, h)| (id.clone(), h.quantity, h.average_cost()))
                .collect();
            open.sort_by(|a, b| a.0.cmp(&b.0));

            let mut value = 0.0;
            let mut checkpoint_prices = HashMap::with_capacity(open.len());
            for (asset_id, quantity, avg_cost) in open {
                let (price, substitute) = self
                    .lookup_price(oracle, &asset_id, checkpoint, avg_cost)
                    .await;
                value += quantity * price;
                used_stale_prices |= substitute;
                checkpoint_prices.insert(asset_id, price);
            }
            closing_prices = checkpoint_prices;

            time_series.push(PerformancePoint {
                timestamp: checkpoint,
                value,
                invested: state.open_cost_basis(),
            });
        }

        Ok(ValuationOutcome {
            time_series,
            final_state: state,
            baseline,
            closing_prices,
            used_stale_prices,
            window: Some((start, window_end)),
        })
    }

    /// Price one asset at one checkpoint, degrading in three steps:
    /// historical at-or-before, then the current quote, then the
    /// position's own cost per unit (assume no change). The last two
    /// count as substitutes. An asset is never dropped from the sum
    /// over a missing price; that would render as a value cliff.
    async fn lookup_price(
        &self,
        oracle: &dyn PriceOracle,
        asset_id: &str,
        at: DateTime<Utc>,
        cost_per_unit: f64,
    ) -> (f64, bool) {
        match oracle.price_at_or_before(asset_id, at).await {
            Ok(price) if price.is_finite() && price > 0.0 => return (price, false),
            _ => {}
        }

        match oracle.current_price(asset_id).await {
            Ok(price) if price.is_finite() && price > 0.0 => {
                debug!(
                    "No historical price for {} at {}; using current quote",
                    asset_id, at
                );
                return (price, true);
            }
            _ => {}
        }

        warn!(
            "No price at all for {} at {}; valuing at cost per unit",
            asset_id, at
        );
        (cost_per_unit, true)
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
