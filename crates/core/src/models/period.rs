use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A named relative reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Trailing 30 days
    OneMonth,
    /// Trailing 90 days
    ThreeMonths,
    /// Trailing 365 days
    OneYear,
    /// Everything since the first recorded transaction
    All,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::OneMonth => write!(f, "1 month"),
            Period::ThreeMonths => write!(f, "3 months"),
            Period::OneYear => write!(f, "1 year"),
            Period::All => write!(f, "all"),
        }
    }
}

impl Period {
    /// Resolve the period into a concrete `(start, end)` window ending
    /// at `as_of`. `All` starts at a far-past sentinel; valuation clips
    /// it forward to the first transaction.
    #[must_use]
    pub fn window(&self, as_of: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = match self {
            Period::OneMonth => as_of - Duration::days(30),
            Period::ThreeMonths => as_of - Duration::days(90),
            Period::OneYear => as_of - Duration::days(365),
            Period::All => DateTime::<Utc>::MIN_UTC,
        };
        (start, as_of)
    }
}

/// Controls checkpoint spacing for a valuation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointPolicy {
    /// Spacing derived from window length: daily up to a month, every
    /// three days up to a quarter, weekly beyond. Bounds the number of
    /// price lookups for long windows while keeping short ones dense.
    Auto,
    /// Fixed spacing in days (values below 1 are treated as 1)
    EveryDays(i64),
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        CheckpointPolicy::Auto
    }
}

impl CheckpointPolicy {
    /// Days between checkpoints for a window spanning `window_days`.
    #[must_use]
    pub fn spacing_days(&self, window_days: i64) -> i64 {
        match self {
            CheckpointPolicy::Auto => {
                if window_days <= 30 {
                    1
                } else if window_days <= 90 {
                    3
                } else {
                    7
                }
            }
            CheckpointPolicy::EveryDays(days) => (*days).max(1),
        }
    }
}
