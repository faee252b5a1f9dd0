use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::CoreError;

/// Trait abstraction over whatever supplies asset prices.
///
/// Valuation asks exactly two questions: "latest price at or before this
/// instant" and "price right now". Caching and multi-source fallback
/// live behind this trait (see the adapters in this module); the engine
/// never bypasses it to reach a network source directly.
///
/// "Unavailable" is expressed as `Err(CoreError::PriceNotAvailable)`.
/// Valuation treats any error as a missed lookup and degrades; it never
/// aborts a calculation over a missing price.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Human-readable name of this oracle (for logs/errors).
    fn name(&self) -> &str;

    /// The latest known price of an asset at or before `at`.
    async fn price_at_or_before(
        &self,
        asset_id: &str,
        at: DateTime<Utc>,
    ) -> Result<f64, CoreError>;

    /// The current (latest) price of an asset.
    async fn current_price(&self, asset_id: &str) -> Result<f64, CoreError>;
}
