// ═══════════════════════════════════════════════════════════════════
// Oracle Tests — memory, cached and fallback adapters
// ═══════════════════════════════════════════════════════════════════

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use portfolio_pulse_core::errors::CoreError;
use portfolio_pulse_core::models::price::PriceHistory;
use portfolio_pulse_core::oracle::cached::CachedPriceOracle;
use portfolio_pulse_core::oracle::fallback::FallbackPriceOracle;
use portfolio_pulse_core::oracle::memory::MemoryPriceOracle;
use portfolio_pulse_core::oracle::traits::PriceOracle;

fn dt(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn dth(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Counts how many lookups actually reach the wrapped oracle.
struct CountingOracle {
    inner: MemoryPriceOracle,
    historical_calls: AtomicUsize,
    current_calls: AtomicUsize,
}

impl CountingOracle {
    fn new(inner: MemoryPriceOracle) -> Self {
        Self {
            inner,
            historical_calls: AtomicUsize::new(0),
            current_calls: AtomicUsize::new(0),
        }
    }

    fn historical_count(&self) -> usize {
        self.historical_calls.load(Ordering::SeqCst)
    }

    fn current_count(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceOracle for CountingOracle {
    fn name(&self) -> &str {
        "counting"
    }

    async fn price_at_or_before(
        &self,
        asset_id: &str,
        at: DateTime<Utc>,
    ) -> Result<f64, CoreError> {
        self.historical_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.price_at_or_before(asset_id, at).await
    }

    async fn current_price(&self, asset_id: &str) -> Result<f64, CoreError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.current_price(asset_id).await
    }
}

// ═══════════════════════════════════════════════════════════════════
// MemoryPriceOracle
// ═══════════════════════════════════════════════════════════════════

mod memory_oracle {
    use super::*;

    #[tokio::test]
    async fn name_is_memory() {
        assert_eq!(MemoryPriceOracle::new().name(), "memory");
    }

    #[tokio::test]
    async fn answers_at_an_exact_timestamp() {
        let mut oracle = MemoryPriceOracle::new();
        oracle.set_price("BTC", dt(2025, 1, 10), 100.0);

        let price = oracle.price_at_or_before("BTC", dt(2025, 1, 10)).await.unwrap();
        assert_eq!(price, 100.0);
    }

    #[tokio::test]
    async fn between_observations_takes_the_earlier_one() {
        let mut oracle = MemoryPriceOracle::new();
        oracle.set_price("BTC", dt(2025, 1, 10), 100.0);
        oracle.set_price("BTC", dt(2025, 1, 20), 120.0);

        let price = oracle.price_at_or_before("BTC", dt(2025, 1, 15)).await.unwrap();
        assert_eq!(price, 100.0);
    }

    #[tokio::test]
    async fn before_the_first_observation_is_unavailable() {
        let mut oracle = MemoryPriceOracle::new();
        oracle.set_price("BTC", dt(2025, 1, 10), 100.0);

        let result = oracle.price_at_or_before("BTC", dt(2025, 1, 5)).await;
        match result {
            Err(CoreError::PriceNotAvailable { asset_id, .. }) => assert_eq!(asset_id, "BTC"),
            other => panic!("Expected PriceNotAvailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_asset_is_unavailable() {
        let oracle = MemoryPriceOracle::new();
        assert!(oracle.price_at_or_before("NOPE", dt(2025, 1, 10)).await.is_err());
    }

    #[tokio::test]
    async fn current_price_answers_from_quotes() {
        let mut oracle = MemoryPriceOracle::new();
        oracle.set_current_price("BTC", 64_000.0);

        let price = oracle.current_price("BTC").await.unwrap();
        assert_eq!(price, 64_000.0);
    }

    #[tokio::test]
    async fn current_price_never_falls_back_to_history() {
        let mut oracle = MemoryPriceOracle::new();
        oracle.set_price("BTC", dt(2025, 1, 10), 100.0);

        assert!(oracle.current_price("BTC").await.is_err());
    }

    #[tokio::test]
    async fn with_history_preloads_a_series() {
        let mut history = PriceHistory::new();
        history.set_price("ETH", dt(2025, 1, 1), 3000.0);
        history.set_price("ETH", dt(2025, 1, 2), 3100.0);

        let oracle = MemoryPriceOracle::with_history(history);
        let price = oracle.price_at_or_before("ETH", dt(2025, 1, 5)).await.unwrap();
        assert_eq!(price, 3100.0);
        assert_eq!(oracle.history().total_entries(), 2);
    }
}

// ═══════════════════════════════════════════════════════════════════
// CachedPriceOracle
// ═══════════════════════════════════════════════════════════════════

mod cached_oracle {
    use super::*;

    fn counting_with(entries: &[(&str, DateTime<Utc>, f64)]) -> Arc<CountingOracle> {
        let mut inner = MemoryPriceOracle::new();
        for (asset_id, timestamp, price) in entries {
            inner.set_price(asset_id, *timestamp, *price);
        }
        Arc::new(CountingOracle::new(inner))
    }

    #[tokio::test]
    async fn name_includes_the_inner_oracle() {
        let counting = counting_with(&[]);
        let cached = CachedPriceOracle::new(counting);
        assert_eq!(cached.name(), "cached counting");
    }

    #[tokio::test]
    async fn historical_answer_is_fetched_once_per_day() {
        let counting = counting_with(&[("BTC", dt(2025, 1, 1), 50.0)]);
        let cached = CachedPriceOracle::new(counting.clone());

        // Same calendar day, different hours: one underlying fetch
        let first = cached.price_at_or_before("BTC", dth(2025, 1, 10, 9)).await.unwrap();
        let second = cached.price_at_or_before("BTC", dth(2025, 1, 10, 17)).await.unwrap();

        assert_eq!(first, 50.0);
        assert_eq!(second, 50.0);
        assert_eq!(counting.historical_count(), 1);
        assert_eq!(cached.cached_entries(), 1);
    }

    #[tokio::test]
    async fn different_days_fetch_separately() {
        let counting = counting_with(&[("BTC", dt(2025, 1, 1), 50.0)]);
        let cached = CachedPriceOracle::new(counting.clone());

        cached.price_at_or_before("BTC", dt(2025, 1, 10)).await.unwrap();
        cached.price_at_or_before("BTC", dt(2025, 1, 11)).await.unwrap();

        assert_eq!(counting.historical_count(), 2);
        assert_eq!(cached.cached_entries(), 2);
    }

    #[tokio::test]
    async fn different_assets_fetch_separately() {
        let counting = counting_with(&[
            ("BTC", dt(2025, 1, 1), 50.0),
            ("ETH", dt(2025, 1, 1), 30.0),
        ]);
        let cached = CachedPriceOracle::new(counting.clone());

        let btc = cached.price_at_or_before("BTC", dt(2025, 1, 10)).await.unwrap();
        let eth = cached.price_at_or_before("ETH", dt(2025, 1, 10)).await.unwrap();

        assert_eq!(btc, 50.0);
        assert_eq!(eth, 30.0);
        assert_eq!(counting.historical_count(), 2);
    }

    #[tokio::test]
    async fn misses_are_not_cached() {
        let counting = counting_with(&[]);
        let cached = CachedPriceOracle::new(counting.clone());

        assert!(cached.price_at_or_before("BTC", dt(2025, 1, 10)).await.is_err());
        assert!(cached.price_at_or_before("BTC", dt(2025, 1, 10)).await.is_err());

        // Both lookups went through; nothing was stored
        assert_eq!(counting.historical_count(), 2);
        assert_eq!(cached.cached_entries(), 0);
    }

    #[tokio::test]
    async fn current_quote_is_cached_within_the_day() {
        let mut inner = MemoryPriceOracle::new();
        inner.set_current_price("BTC", 64_000.0);
        let counting = Arc::new(CountingOracle::new(inner));
        let cached = CachedPriceOracle::new(counting.clone());

        let first = cached.current_price("BTC").await.unwrap();
        let second = cached.current_price("BTC").await.unwrap();

        assert_eq!(first, 64_000.0);
        assert_eq!(second, 64_000.0);
        assert_eq!(counting.current_count(), 1);
    }

    #[tokio::test]
    async fn clear_forgets_cached_answers() {
        let counting = counting_with(&[("BTC", dt(2025, 1, 1), 50.0)]);
        let cached = CachedPriceOracle::new(counting.clone());

        cached.price_at_or_before("BTC", dt(2025, 1, 10)).await.unwrap();
        assert_eq!(cached.cached_entries(), 1);

        cached.clear();
        assert_eq!(cached.cached_entries(), 0);

        cached.price_at_or_before("BTC", dt(2025, 1, 10)).await.unwrap();
        assert_eq!(counting.historical_count(), 2);
    }

    #[tokio::test]
    async fn debug_shows_inner_and_size() {
        let counting = counting_with(&[("BTC", dt(2025, 1, 1), 50.0)]);
        let cached = CachedPriceOracle::new(counting.clone());
        cached.price_at_or_before("BTC", dt(2025, 1, 10)).await.unwrap();

        let debug = format!("{:?}", cached);
        assert!(debug.contains("counting"));
        assert!(debug.contains("cached_entries"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// FallbackPriceOracle
// ═══════════════════════════════════════════════════════════════════

mod fallback_oracle {
    use super::*;

    fn memory_with(entries: &[(&str, DateTime<Utc>, f64)]) -> MemoryPriceOracle {
        let mut oracle = MemoryPriceOracle::new();
        for (asset_id, timestamp, price) in entries {
            oracle.set_price(asset_id, *timestamp, *price);
        }
        oracle
    }

    #[tokio::test]
    async fn empty_chain_reports_no_oracle() {
        let chain = FallbackPriceOracle::new();
        assert!(chain.is_empty());

        let result = chain.price_at_or_before("BTC", dt(2025, 1, 10)).await;
        match result {
            Err(CoreError::NoOracle(asset_id)) => assert_eq!(asset_id, "BTC"),
            other => panic!("Expected NoOracle, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn first_usable_answer_wins() {
        let mut chain = FallbackPriceOracle::new();
        chain.register(Arc::new(memory_with(&[("BTC", dt(2025, 1, 1), 100.0)])));
        chain.register(Arc::new(memory_with(&[("BTC", dt(2025, 1, 1), 999.0)])));

        let price = chain.price_at_or_before("BTC", dt(2025, 1, 10)).await.unwrap();
        assert_eq!(price, 100.0);
        assert_eq!(chain.len(), 2);
    }

    #[tokio::test]
    async fn skips_a_source_with_no_answer() {
        let mut chain = FallbackPriceOracle::new();
        chain.register(Arc::new(MemoryPriceOracle::new()));
        chain.register(Arc::new(memory_with(&[("BTC", dt(2025, 1, 1), 42.0)])));

        let price = chain.price_at_or_before("BTC", dt(2025, 1, 10)).await.unwrap();
        assert_eq!(price, 42.0);
    }

    #[tokio::test]
    async fn rejects_a_zero_price_and_moves_on() {
        let mut chain = FallbackPriceOracle::new();
        chain.register(Arc::new(memory_with(&[("BTC", dt(2025, 1, 1), 0.0)])));
        chain.register(Arc::new(memory_with(&[("BTC", dt(2025, 1, 1), 42.0)])));

        let price = chain.price_at_or_before("BTC", dt(2025, 1, 10)).await.unwrap();
        assert_eq!(price, 42.0);
    }

    #[tokio::test]
    async fn rejects_a_non_finite_price_and_moves_on() {
        let mut chain = FallbackPriceOracle::new();
        chain.register(Arc::new(memory_with(&[("BTC", dt(2025, 1, 1), f64::NAN)])));
        chain.register(Arc::new(memory_with(&[("BTC", dt(2025, 1, 1), 42.0)])));

        let price = chain.price_at_or_before("BTC", dt(2025, 1, 10)).await.unwrap();
        assert_eq!(price, 42.0);
    }

    #[tokio::test]
    async fn every_source_failing_returns_the_last_error() {
        let mut chain = FallbackPriceOracle::new();
        chain.register(Arc::new(MemoryPriceOracle::new()));
        chain.register(Arc::new(memory_with(&[("BTC", dt(2025, 1, 1), 0.0)])));

        let result = chain.price_at_or_before("BTC", dt(2025, 1, 10)).await;
        match result {
            Err(CoreError::InvalidPrice { asset_id, price }) => {
                assert_eq!(asset_id, "BTC");
                assert_eq!(price, 0.0);
            }
            other => panic!("Expected InvalidPrice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn current_price_follows_the_same_chain() {
        let mut quoteless = MemoryPriceOracle::new();
        quoteless.set_price("BTC", dt(2025, 1, 1), 100.0);
        let mut quoted = MemoryPriceOracle::new();
        quoted.set_current_price("BTC", 7.0);

        let mut chain = FallbackPriceOracle::new();
        chain.register(Arc::new(quoteless));
        chain.register(Arc::new(quoted));

        let price = chain.current_price("BTC").await.unwrap();
        assert_eq!(price, 7.0);
    }

    #[tokio::test]
    async fn debug_lists_registered_sources() {
        let mut chain = FallbackPriceOracle::new();
        chain.register(Arc::new(MemoryPriceOracle::new()));
        chain.register(Arc::new(MemoryPriceOracle::new()));

        let debug = format!("{:?}", chain);
        assert!(debug.contains("memory"));
    }

    #[tokio::test]
    async fn composes_with_the_caching_adapter() {
        let mut chain = FallbackPriceOracle::new();
        chain.register(Arc::new(memory_with(&[("BTC", dt(2025, 1, 1), 50.0)])));
        let cached = CachedPriceOracle::new(Arc::new(chain));

        assert_eq!(cached.name(), "cached fallback");
        let price = cached.price_at_or_before("BTC", dt(2025, 1, 10)).await.unwrap();
        assert_eq!(price, 50.0);
    }
}
