use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;

use crate::errors::CoreError;
use crate::oracle::traits::PriceOracle;

/// Price oracle that tries several sources in registration order.
///
/// The first oracle that answers with a usable price wins. A usable
/// price is finite and strictly positive; anything else counts as a
/// miss and the next source is tried. When every source misses, the
/// last error is returned so callers can see what actually failed.
#[derive(Default)]
pub struct FallbackPriceOracle {
    oracles: Vec<Arc<dyn PriceOracle>>,
}

impl FallbackPriceOracle {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            oracles: Vec::new(),
        }
    }

    /// Append an oracle to the chain. Registration order is priority
    /// order.
    pub fn register(&mut self, oracle: Arc<dyn PriceOracle>) {
        self.oracles.push(oracle);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }

    fn validate(asset_id: &str, price: f64) -> Result<f64, CoreError> {
        if price.is_finite() && price > 0.0 {
            Ok(price)
        } else {
            Err(CoreError::InvalidPrice {
                asset_id: asset_id.to_string(),
                price,
            })
        }
    }
}

impl std::fmt::Debug for FallbackPriceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.oracles.iter().map(|o| o.name()).collect();
        f.debug_struct("FallbackPriceOracle")
            .field("oracles", &names)
            .finish()
    }
}

#[async_trait]
impl PriceOracle for FallbackPriceOracle {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn price_at_or_before(
        &self,
        asset_id: &str,
        at: DateTime<Utc>,
    ) -> Result<f64, CoreError> {
        let mut last_error = None;
        for oracle in &self.oracles {
            match oracle.price_at_or_before(asset_id, at).await {
                Ok(price) => match Self::validate(asset_id, price) {
                    Ok(price) => return Ok(price),
                    Err(e) => last_error = Some(e),
                },
                Err(e) => {
                    debug!("Oracle {} missed {} at {}: {}", oracle.name(), asset_id, at, e);
                    last_error = Some(e);
                    // Try next oracle
                }
            }
        }
        Err(last_error.unwrap_or_else(|| CoreError::NoOracle(asset_id.to_string())))
    }

    async fn current_price(&self, asset_id: &str) -> Result<f64, CoreError> {
        let mut last_error = None;
        for oracle in &self.oracles {
            match oracle.current_price(asset_id).await {
                Ok(price) => match Self::validate(asset_id, price) {
                    Ok(price) => return Ok(price),
                    Err(e) => last_error = Some(e),
                },
                Err(e) => {
                    debug!("Oracle {} has no current price for {}: {}", oracle.name(), asset_id, e);
                    last_error = Some(e);
                    // Try next oracle
                }
            }
        }
        Err(last_error.unwrap_or_else(|| CoreError::NoOracle(asset_id.to_string())))
    }
}
