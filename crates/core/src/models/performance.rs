use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::period::Period;

/// A single checkpoint in a portfolio value time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    /// The checkpoint this point was valued at
    pub timestamp: DateTime<Utc>,

    /// Market value of all open positions (quantity × price per asset)
    pub value: f64,

    /// Cost basis still open across those positions
    pub invested: f64,
}

/// Per-asset slice of a performance summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingBreakdown {
    /// The asset
    pub asset_id: String,

    /// Units held
    pub quantity: f64,

    /// Cost basis of the open position
    pub cost_basis: f64,

    /// Average cost per unit (cost_basis / quantity)
    pub average_cost: f64,

    /// Market value at the window end
    pub current_value: f64,

    /// current_value - cost_basis
    pub unrealized_gain: f64,

    /// Percentage return on the open position
    pub return_pct: f64,

    /// Share of total portfolio value (this asset's value / total × 100)
    pub allocation_pct: f64,
}

/// Performance of a whole scope (one account or all accounts merged)
/// over a requested window. Plain data, safe to serialize and hand to
/// any presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Reporting currency for all monetary values
    pub currency: String,

    /// The window this summary covers
    pub period: Period,

    /// Start of the valued window (after clipping to first activity)
    pub window_start: Option<DateTime<Utc>>,

    /// End of the valued window
    pub window_end: DateTime<Utc>,

    /// Market value of all open positions at the window end
    pub total_value: f64,

    /// Cost basis still open at the window end
    pub total_invested: f64,

    /// Fees accumulated within the window
    pub total_fees: f64,

    /// Gains locked in within the window by sells, dividends and
    /// interest, net of fees
    pub realized_gains: f64,

    /// total_value - total_invested
    pub unrealized_gains: f64,

    /// Percentage return: (total_value + realized_gains - total_invested)
    /// / total_invested × 100
    pub performance_pct: f64,

    /// Net cash position over the *entire* history. A running total, not
    /// a window delta; it deliberately ignores the requested period.
    pub cash_balance: f64,

    /// Whether any checkpoint had to value an asset with a substitute
    /// (current or cost-derived) price instead of a historical one
    pub used_stale_prices: bool,

    /// How many sells exceeded recorded holdings within the window
    pub oversell_clamps: u32,

    /// Transactions replayed to produce this summary (whole history)
    pub transaction_count: usize,

    /// Per-asset breakdown at the window end, largest value first
    pub holdings: Vec<HoldingBreakdown>,

    /// Value/invested pairs across the window's checkpoints
    pub time_series: Vec<PerformancePoint>,
}

impl PerformanceSummary {
    /// Serialize to pretty JSON for export or API responses.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Performance of a single asset across all accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPerformanceSummary {
    /// The asset
    pub asset_id: String,

    /// Reporting currency for all monetary values
    pub currency: String,

    /// The window this summary covers
    pub period: Period,

    /// Units held at the window end, netted across accounts
    pub quantity_held: f64,

    /// Cost basis of the open position
    pub cost_basis: f64,

    /// Average cost per unit
    pub average_cost: f64,

    /// Market value at the window end
    pub total_value: f64,

    /// Fees accumulated within the window on this asset's transactions
    pub total_fees: f64,

    /// Gains locked in within the window, net of fees
    pub realized_gains: f64,

    /// total_value - cost_basis
    pub unrealized_gains: f64,

    /// Percentage return including realized gains
    pub performance_pct: f64,

    /// Whether any checkpoint used a substitute price
    pub used_stale_prices: bool,

    /// How many sells exceeded recorded holdings within the window
    pub oversell_clamps: u32,

    /// Value/invested pairs across the window's checkpoints
    pub time_series: Vec<PerformancePoint>,
}

impl AssetPerformanceSummary {
    /// Serialize to pretty JSON for export or API responses.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
