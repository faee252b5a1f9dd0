use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::CoreError;
use crate::models::price::{PriceHistory, PricePoint};
use crate::oracle::traits::PriceOracle;

/// Price oracle backed entirely by in-memory data.
///
/// Hosts preload it with whatever series they have on hand (and the
/// tests with fixtures); it answers from those and nothing else.
/// Populate it fully before sharing it with the engine: the setters
/// take `&mut self`, so a shared oracle is immutable by construction.
#[derive(Debug, Clone, Default)]
pub struct MemoryPriceOracle {
    history: PriceHistory,
    current: HashMap<String, f64>,
}

impl MemoryPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: PriceHistory) -> Self {
        Self {
            history,
            current: HashMap::new(),
        }
    }

    /// Record a historical observation.
    pub fn set_price(&mut self, asset_id: &str, timestamp: DateTime<Utc>, price: f64) {
        self.history.set_price(asset_id, timestamp, price);
    }

    /// Record multiple historical observations.
    pub fn set_prices(&mut self, asset_id: &str, points: &[PricePoint]) {
        self.history.set_prices(asset_id, points);
    }

    /// Record the current quote for an asset.
    pub fn set_current_price(&mut self, asset_id: &str, price: f64) {
        self.current.insert(asset_id.to_string(), price);
    }

    #[must_use]
    pub fn history(&self) -> &PriceHistory {
        &self.history
    }
}

#[async_trait]
impl PriceOracle for MemoryPriceOracle {
    fn name(&self) -> &str {
        "memory"
    }

    async fn price_at_or_before(
        &self,
        asset_id: &str,
        at: DateTime<Utc>,
    ) -> Result<f64, CoreError> {
        self.history
            .price_at_or_before(asset_id, at)
            .ok_or_else(|| CoreError::PriceNotAvailable {
                asset_id: asset_id.to_string(),
                requested_at: at.to_rfc3339(),
            })
    }

    async fn current_price(&self, asset_id: &str) -> Result<f64, CoreError> {
        self.current
            .get(asset_id)
            .copied()
            .ok_or_else(|| CoreError::PriceNotAvailable {
                asset_id: asset_id.to_string(),
                requested_at: "now".to_string(),
            })
    }
}
