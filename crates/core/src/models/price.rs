use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single price observation (timestamp → price).
///
/// Prices arrive already normalized to the reporting currency; the
/// engine never converts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// In-memory store of historical prices per asset.
///
/// Entries are kept sorted by timestamp so "latest price at or before"
/// lookups are a binary search (O(log n)). Asset ids are opaque keys;
/// no case folding or other normalization is applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceHistory {
    /// asset_id → sorted Vec of PricePoints
    pub entries: HashMap<String, Vec<PricePoint>>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a price observation.
    /// Maintains sorted order by timestamp (O(log n) lookup, O(n) insert).
    pub fn set_price(&mut self, asset_id: &str, timestamp: DateTime<Utc>, price: f64) {
        let entries = self.entries.entry(asset_id.to_string()).or_default();

        match entries.binary_search_by_key(&timestamp, |p| p.timestamp) {
            Ok(idx) => {
                // Update existing entry at this timestamp
                entries[idx].price = price;
            }
            Err(idx) => {
                // Insert at sorted position
                entries.insert(idx, PricePoint { timestamp, price });
            }
        }
    }

    /// Insert multiple observations at once (e.g., a preloaded series).
    pub fn set_prices(&mut self, asset_id: &str, points: &[PricePoint]) {
        for point in points {
            self.set_price(asset_id, point.timestamp, point.price);
        }
    }

    /// The latest price at or before `at`, if the history reaches back
    /// that far. Returns None when every observation is newer than `at`
    /// or the asset is unknown.
    #[must_use]
    pub fn price_at_or_before(&self, asset_id: &str, at: DateTime<Utc>) -> Option<f64> {
        let entries = self.entries.get(asset_id)?;
        match entries.binary_search_by_key(&at, |p| p.timestamp) {
            Ok(idx) => Some(entries[idx].price),
            Err(0) => None,
            Err(idx) => Some(entries[idx - 1].price),
        }
    }

    /// The most recent observation for an asset.
    #[must_use]
    pub fn latest(&self, asset_id: &str) -> Option<f64> {
        self.entries
            .get(asset_id)
            .and_then(|entries| entries.last())
            .map(|p| p.price)
    }

    /// All observations for an asset within `[from, to]`, in order.
    #[must_use]
    pub fn price_range(&self, asset_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<PricePoint> {
        self.entries
            .get(asset_id)
            .map(|entries| {
                // Binary search for start index (first entry >= from)
                let start = entries
                    .binary_search_by_key(&from, |p| p.timestamp)
                    .unwrap_or_else(|pos| pos);
                // Binary search for end index (first entry > to)
                let end = entries
                    .binary_search_by_key(&to, |p| p.timestamp)
                    .map(|pos| pos + 1) // include the exact match
                    .unwrap_or_else(|pos| pos);
                entries[start..end].to_vec()
            })
            .unwrap_or_default()
    }

    /// Remove all observations older than `before`.
    /// Returns the number of entries removed.
    pub fn prune_before(&mut self, before: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for entries in self.entries.values_mut() {
            let old_len = entries.len();
            let split = entries
                .binary_search_by_key(&before, |p| p.timestamp)
                .unwrap_or_else(|pos| pos);
            if split > 0 {
                entries.drain(..split);
                removed += old_len - entries.len();
            }
        }
        self.entries.retain(|_, v| !v.is_empty());
        removed
    }

    /// Total observations across all assets.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }

    /// Number of distinct assets with at least one observation.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.entries.len()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
