use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::CoreError;
use crate::models::holding::DUST_TOLERANCE;
use crate::models::performance::{AssetPerformanceSummary, HoldingBreakdown, PerformanceSummary};
use crate::models::period::Period;
use crate::models::settings::Settings;
use crate::models::transaction::Transaction;
use crate::oracle::traits::PriceOracle;
use crate::services::valuation_service::ValuationService;
use crate::sources::traits::TransactionSource;

/// Turns transaction streams into the summaries the presentation layer
/// serves: per account, global across accounts, and per asset.
///
/// Global views merge every account's stream into one sequence before a
/// single replay; cross-account positions in the same asset must be
/// netted together for realized-gain accounting to come out right, so
/// summing independently computed per-account figures would be wrong.
pub struct PerformanceService {
    source: Arc<dyn TransactionSource>,
    oracle: Arc<dyn PriceOracle>,
    valuation: ValuationService,
    settings: Settings,
}

impl PerformanceService {
    pub fn new(source: Arc<dyn TransactionSource>, oracle: Arc<dyn PriceOracle>) -> Self {
        Self::with_settings(source, oracle, Settings::default())
    }

    pub fn with_settings(
        source: Arc<dyn TransactionSource>,
        oracle: Arc<dyn PriceOracle>,
        settings: Settings,
    ) -> Self {
        Self {
            source,
            oracle,
            valuation: ValuationService::new(),
            settings,
        }
    }

    // ── Entry points ────────────────────────────────────────────────

    /// Performance of one account over a period, ending now.
    pub async fn account(
        &self,
        account_id: &str,
        period: Period,
    ) -> Result<PerformanceSummary, CoreError> {
        self.account_as_of(account_id, period, Utc::now()).await
    }

    /// Like [`account`](Self::account) but with an explicit window end,
    /// for reproducible output.
    pub async fn account_as_of(
        &self,
        account_id: &str,
        period: Period,
        as_of: DateTime<Utc>,
    ) -> Result<PerformanceSummary, CoreError> {
        let transactions = self.source.account_transactions(account_id).await?;
        self.summarize(transactions, period, as_of).await
    }

    /// Performance of every account merged, over a period ending now.
    pub async fn global(&self, period: Period) -> Result<PerformanceSummary, CoreError> {
        self.global_as_of(period, Utc::now()).await
    }

    /// Like [`global`](Self::global) but with an explicit window end.
    pub async fn global_as_of(
        &self,
        period: Period,
        as_of: DateTime<Utc>,
    ) -> Result<PerformanceSummary, CoreError> {
        let transactions = self.source.all_transactions().await?;
        self.summarize(transactions, period, as_of).await
    }

    /// Performance of a single asset across all accounts, over a period
    /// ending now.
    pub async fn asset(
        &self,
        asset_id: &str,
        period: Period,
    ) -> Result<AssetPerformanceSummary, CoreError> {
        self.asset_as_of(asset_id, period, Utc::now()).await
    }

    /// Like [`asset`](Self::asset) but with an explicit window end.
    ///
    /// The merged stream is filtered to transactions tagged with the
    /// asset before replay; account-level cash movements (deposits,
    /// withdrawals, interest, untagged dividends, standalone fees) drop
    /// out, asset-tagged dividends stay.
    pub async fn asset_as_of(
        &self,
        asset_id: &str,
        period: Period,
        as_of: DateTime<Utc>,
    ) -> Result<AssetPerformanceSummary, CoreError> {
        let merged = self.source.all_transactions().await?;
        let filtered: Vec<_> = merged
            .into_iter()
            .filter(|tx| tx.affects_asset(asset_id))
            .collect();

        let (window_start, window_end) = period.window(as_of);
        let outcome = self
            .valuation
            .build(
                filtered,
                window_start,
                window_end,
                self.settings.checkpoint_policy,
                self.oracle.as_ref(),
            )
            .await?;
        let state = &outcome.final_state;

        let (quantity_held, cost_basis, average_cost) = state
            .holding(asset_id)
            .map_or((0.0, 0.0, 0.0), |h| (h.quantity, h.cost_basis, h.average_cost()));
        let total_value = outcome.time_series.last().map_or(0.0, |p| p.value);
        let realized_gains = state.realized_gains - outcome.baseline.realized_gains;
        let total_fees = state.cash.fees - outcome.baseline.fees;

        Ok(AssetPerformanceSummary {
            asset_id: asset_id.to_string(),
            currency: self.settings.reporting_currency.clone(),
            period,
            quantity_held,
            cost_basis,
            average_cost,
            total_value,
            total_fees,
            realized_gains,
            unrealized_gains: total_value - cost_basis,
            performance_pct: percentage(total_value + realized_gains - cost_basis, cost_basis),
            used_stale_prices: outcome.used_stale_prices,
            oversell_clamps: state.oversell_clamps - outcome.baseline.oversell_clamps,
            time_series: outcome.time_series,
        })
    }

    // ── Assembly ────────────────────────────────────────────────────

    /// Value a stream over the period's window and assemble a summary.
    ///
    /// Profit/loss figures (realized gains, fees, clamps) are deltas
    /// scoped to the window; holdings and cash describe the state at the
    /// window end with the whole history replayed. The cash balance in
    /// particular is a running total that ignores the requested period.
    async fn summarize(
        &self,
        transactions: Vec<Transaction>,
        period: Period,
        as_of: DateTime<Utc>,
    ) -> Result<PerformanceSummary, CoreError> {
        let (window_start, window_end) = period.window(as_of);
        let outcome = self
            .valuation
            .build(
                transactions,
                window_start,
                window_end,
                self.settings.checkpoint_policy,
                self.oracle.as_ref(),
            )
            .await?;
        let state = &outcome.final_state;

        let total_value = outcome.time_series.last().map_or(0.0, |p| p.value);
        let total_invested = state.open_cost_basis();
        let realized_gains = state.realized_gains - outcome.baseline.realized_gains;
        let total_fees = state.cash.fees - outcome.baseline.fees;

        // Per-asset breakdown at the window end, priced with the same
        // quotes the final checkpoint used
        let mut holdings: Vec<HoldingBreakdown> = state
            .holdings
            .values()
            .map(|h| {
                let current_value = outcome
                    .closing_prices
                    .get(&h.asset_id)
                    .map_or(h.cost_basis, |price| h.quantity * price);
                HoldingBreakdown {
                    asset_id: h.asset_id.clone(),
                    quantity: h.quantity,
                    cost_basis: h.cost_basis,
                    average_cost: h.average_cost(),
                    current_value,
                    unrealized_gain: current_value - h.cost_basis,
                    return_pct: percentage(current_value - h.cost_basis, h.cost_basis),
                    allocation_pct: 0.0,
                }
            })
            .collect();
        if total_value > DUST_TOLERANCE {
            for breakdown in &mut holdings {
                breakdown.allocation_pct = breakdown.current_value / total_value * 100.0;
            }
        }
        holdings.sort_by(|a, b| {
            b.current_value
                .partial_cmp(&a.current_value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.asset_id.cmp(&b.asset_id))
        });

        Ok(PerformanceSummary {
            currency: self.settings.reporting_currency.clone(),
            period,
            window_start: outcome.window.map(|(start, _)| start),
            window_end,
            total_value,
            total_invested,
            total_fees,
            realized_gains,
            unrealized_gains: total_value - total_invested,
            performance_pct: percentage(total_value + realized_gains - total_invested, total_invested),
            cash_balance: state.cash.balance(),
            used_stale_prices: outcome.used_stale_prices,
            oversell_clamps: state.oversell_clamps - outcome.baseline.oversell_clamps,
            transaction_count: state.transactions_applied,
            holdings,
            time_series: outcome.time_series,
        })
    }
}

/// `gain / base × 100`, or 0 when there is no base to compare against.
fn percentage(gain: f64, base: f64) -> f64 {
    if base.abs() > DUST_TOLERANCE {
        gain / base * 100.0
    } else {
        0.0
    }
}
