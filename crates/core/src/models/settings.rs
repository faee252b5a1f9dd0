use serde::{Deserialize, Serialize};

use crate::models::period::CheckpointPolicy;

/// Engine-level configuration supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// The currency every monetary figure is reported in (e.g., "USD",
    /// "EUR"). Transactions and prices are assumed to arrive already
    /// normalized to it; this is a label, not a conversion target.
    pub reporting_currency: String,

    /// How valuation checkpoints are spaced across a window.
    pub checkpoint_policy: CheckpointPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reporting_currency: "USD".to_string(),
            checkpoint_policy: CheckpointPolicy::Auto,
        }
    }
}
