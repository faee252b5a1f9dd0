use thiserror::Error;

/// Unified error type for the entire portfolio-pulse-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Prices ──────────────────────────────────────────────────────
    #[error("Price not available for {asset_id} as of {requested_at}")]
    PriceNotAvailable {
        asset_id: String,
        requested_at: String,
    },

    #[error("Invalid price {price} for {asset_id}")]
    InvalidPrice {
        asset_id: String,
        price: f64,
    },

    #[error("No oracle available for {0}")]
    NoOracle(String),

    // ── Transactions ────────────────────────────────────────────────
    #[error("Invalid transaction {id}: {reason}")]
    InvalidTransaction {
        id: String,
        reason: String,
    },

    // ── Requests ────────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ── Sources ─────────────────────────────────────────────────────
    #[error("Transaction source error: {0}")]
    Source(String),

    // ── Serialization ───────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}
