pub mod errors;
pub mod models;
pub mod oracle;
pub mod services;
pub mod sources;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use errors::CoreError;
use models::{
    holding::Holding,
    ledger::{CashSummary, LedgerState},
    performance::{AssetPerformanceSummary, PerformanceSummary},
    period::{CheckpointPolicy, Period},
    settings::Settings,
};
use oracle::traits::PriceOracle;
use services::{ledger_service::LedgerService, performance_service::PerformanceService};
use sources::traits::TransactionSource;

/// Main entry point for the Portfolio Pulse core library.
/// Wires a transaction source and a price oracle into the services that
/// compute holdings, valuations and performance summaries.
#[must_use]
pub struct PortfolioPulse {
    source: Arc<dyn TransactionSource>,
    oracle: Arc<dyn PriceOracle>,
    performance_service: PerformanceService,
    ledger_service: LedgerService,
    settings: Settings,
}

impl std::fmt::Debug for PortfolioPulse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioPulse")
            .field("oracle", &self.oracle.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl PortfolioPulse {
    /// Wire up the engine with default settings.
    pub fn new(source: Arc<dyn TransactionSource>, oracle: Arc<dyn PriceOracle>) -> Self {
        Self::with_settings(source, oracle, Settings::default())
    }

    /// Wire up the engine with explicit settings.
    pub fn with_settings(
        source: Arc<dyn TransactionSource>,
        oracle: Arc<dyn PriceOracle>,
        settings: Settings,
    ) -> Self {
        let performance_service = PerformanceService::with_settings(
            Arc::clone(&source),
            Arc::clone(&oracle),
            settings.clone(),
        );
        Self {
            source,
            oracle,
            performance_service,
            ledger_service: LedgerService::new(),
            settings,
        }
    }

    // ── Performance ─────────────────────────────────────────────────

    /// Performance summary for one account over a period ending now.
    pub async fn get_account_performance(
        &self,
        account_id: &str,
        period: Period,
    ) -> Result<PerformanceSummary, CoreError> {
        self.performance_service.account(account_id, period).await
    }

    /// Performance summary for one account with an explicit window end
    /// (reproducible output for exports and tests).
    pub async fn get_account_performance_as_of(
        &self,
        account_id: &str,
        period: Period,
        as_of: DateTime<Utc>,
    ) -> Result<PerformanceSummary, CoreError> {
        self.performance_service
            .account_as_of(account_id, period, as_of)
            .await
    }

    /// Performance summary across all accounts over a period ending now.
    pub async fn get_global_performance(
        &self,
        period: Period,
    ) -> Result<PerformanceSummary, CoreError> {
        self.performance_service.global(period).await
    }

    /// Global performance summary with an explicit window end.
    pub async fn get_global_performance_as_of(
        &self,
        period: Period,
        as_of: DateTime<Utc>,
    ) -> Result<PerformanceSummary, CoreError> {
        self.performance_service.global_as_of(period, as_of).await
    }

    /// Performance of one asset across all accounts over a period
    /// ending now.
    pub async fn get_asset_performance(
        &self,
        asset_id: &str,
        period: Period,
    ) -> Result<AssetPerformanceSummary, CoreError> {
        self.performance_service.asset(asset_id, period).await
    }

    /// Asset performance with an explicit window end.
    pub async fn get_asset_performance_as_of(
        &self,
        asset_id: &str,
        period: Period,
        as_of: DateTime<Utc>,
    ) -> Result<AssetPerformanceSummary, CoreError> {
        self.performance_service
            .asset_as_of(asset_id, period, as_of)
            .await
    }

    // ── Holdings & Cash ─────────────────────────────────────────────

    /// Open positions across all accounts as of a point in time.
    pub async fn get_holdings_at(
        &self,
        at: DateTime<Utc>,
    ) -> Result<HashMap<String, Holding>, CoreError> {
        let mut transactions = self.source.all_transactions().await?;
        self.ledger_service.sort_chronologically(&mut transactions);
        let state = self.ledger_service.replay_until(&transactions, at)?;
        Ok(state.holdings)
    }

    /// Open positions across all accounts right now.
    pub async fn get_current_holdings(&self) -> Result<HashMap<String, Holding>, CoreError> {
        self.get_holdings_at(Utc::now()).await
    }

    /// Cumulative cash flows over the entire recorded history.
    pub async fn get_cash_summary(&self) -> Result<CashSummary, CoreError> {
        Ok(self.get_ledger_state().await?.cash)
    }

    /// Full replay of the entire history: holdings, cash, realized
    /// gains and data-quality counters in one place.
    pub async fn get_ledger_state(&self) -> Result<LedgerState, CoreError> {
        let mut transactions = self.source.all_transactions().await?;
        self.ledger_service.sort_chronologically(&mut transactions);
        self.ledger_service.replay(&transactions)
    }

    // ── Log Inspection ──────────────────────────────────────────────

    /// Every asset id that appears in the log, sorted and deduplicated.
    pub async fn get_unique_assets(&self) -> Result<Vec<String>, CoreError> {
        let transactions = self.source.all_transactions().await?;
        let mut seen = HashSet::new();
        let mut assets: Vec<String> = transactions
            .into_iter()
            .filter_map(|tx| tx.asset_id)
            .filter(|id| seen.insert(id.clone()))
            .collect();
        assets.sort();
        Ok(assets)
    }

    /// Every account id that appears in the log, sorted and deduplicated.
    pub async fn get_unique_accounts(&self) -> Result<Vec<String>, CoreError> {
        let transactions = self.source.all_transactions().await?;
        let mut seen = HashSet::new();
        let mut accounts: Vec<String> = transactions
            .into_iter()
            .map(|tx| tx.account_id)
            .filter(|id| seen.insert(id.clone()))
            .collect();
        accounts.sort();
        Ok(accounts)
    }

    /// Timestamp of the earliest recorded transaction, if any.
    pub async fn earliest_activity(&self) -> Result<Option<DateTime<Utc>>, CoreError> {
        let transactions = self.source.all_transactions().await?;
        Ok(transactions.iter().map(|tx| tx.timestamp).min())
    }

    /// Timestamp of the most recent transaction, if any.
    pub async fn latest_activity(&self) -> Result<Option<DateTime<Utc>>, CoreError> {
        let transactions = self.source.all_transactions().await?;
        Ok(transactions.iter().map(|tx| tx.timestamp).max())
    }

    /// Number of transactions in the log.
    pub async fn transaction_count(&self) -> Result<usize, CoreError> {
        Ok(self.source.all_transactions().await?.len())
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Set the reporting currency label (e.g., "USD", "EUR").
    /// Currency code must be a 3-letter alphabetic string.
    pub fn set_reporting_currency(&mut self, currency: String) -> Result<(), CoreError> {
        let trimmed = currency.trim().to_uppercase();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency code '{currency}': must be exactly 3 ASCII letters (e.g., USD, EUR)"
            )));
        }
        self.settings.reporting_currency = trimmed;
        self.rebuild_services();
        Ok(())
    }

    /// Change how valuation checkpoints are spaced.
    pub fn set_checkpoint_policy(&mut self, policy: CheckpointPolicy) {
        self.settings.checkpoint_policy = policy;
        self.rebuild_services();
    }

    /// Current settings.
    #[must_use]
    pub fn get_settings(&self) -> &Settings {
        &self.settings
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Services hold their own settings copy; rebuild them after a
    /// settings change so it takes effect immediately.
    fn rebuild_services(&mut self) {
        self.performance_service = PerformanceService::with_settings(
            Arc::clone(&self.source),
            Arc::clone(&self.oracle),
            self.settings.clone(),
        );
    }
}
