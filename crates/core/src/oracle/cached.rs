use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::CoreError;
use crate::oracle::traits::PriceOracle;

/// Caching layer over another price oracle.
///
/// Cache strategy:
/// - **Historical lookups**: settled prices never change, so each
///   (asset, day) answer is fetched once and kept for the lifetime of
///   the adapter. Lookups are keyed at day granularity; the engine's
///   checkpoints are day-spaced, so two lookups on the same day are the
///   same lookup.
/// - **Current quotes**: kept until the calendar day rolls over, then
///   refetched on the next request.
///
/// Misses are not cached: an oracle that answers "unavailable" now may
/// have the price on the next request.
pub struct CachedPriceOracle {
    inner: Arc<dyn PriceOracle>,
    name: String,
    /// (asset_id, day) → settled price
    historical: RwLock<HashMap<(String, NaiveDate), f64>>,
    /// asset_id → (quote, day it was fetched)
    current: RwLock<HashMap<String, (f64, NaiveDate)>>,
}

impl CachedPriceOracle {
    pub fn new(inner: Arc<dyn PriceOracle>) -> Self {
        let name = format!("cached {}", inner.name());
        Self {
            inner,
            name,
            historical: RwLock::new(HashMap::new()),
            current: RwLock::new(HashMap::new()),
        }
    }

    /// Number of settled historical answers currently held.
    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.historical
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Drop everything cached.
    pub fn clear(&self) {
        self.historical
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.current
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl std::fmt::Debug for CachedPriceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedPriceOracle")
            .field("inner", &self.inner.name())
            .field("cached_entries", &self.cached_entries())
            .finish()
    }
}

#[async_trait]
impl PriceOracle for CachedPriceOracle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn price_at_or_before(
        &self,
        asset_id: &str,
        at: DateTime<Utc>,
    ) -> Result<f64, CoreError> {
        let key = (asset_id.to_string(), at.date_naive());

        // Check cache first. The guard must not be held across the await
        // below, hence the block.
        {
            let cache = self.historical.read().unwrap_or_else(|e| e.into_inner());
            if let Some(price) = cache.get(&key).copied() {
                return Ok(price);
            }
        }

        let price = self.inner.price_at_or_before(asset_id, at).await?;

        self.historical
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, price);
        Ok(price)
    }

    async fn current_price(&self, asset_id: &str) -> Result<f64, CoreError> {
        let today = Utc::now().date_naive();

        {
            let cache = self.current.read().unwrap_or_else(|e| e.into_inner());
            if let Some((price, fetched)) = cache.get(asset_id).copied() {
                if fetched == today {
                    return Ok(price);
                }
            }
        }

        let price = self.inner.current_price(asset_id).await?;

        self.current
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(asset_id.to_string(), (price, today));
        Ok(price)
    }
}
