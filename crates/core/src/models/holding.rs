use serde::{Deserialize, Serialize};

/// Tolerance under which a floating-point quantity or currency amount is
/// treated as zero. Accumulated f64 arithmetic over long transaction
/// streams leaves dust well above `f64::EPSILON`.
pub const DUST_TOLERANCE: f64 = 1e-9;

/// The open position in one asset, carried at average cost.
///
/// `cost_basis` is the cash still invested in the open units. Selling
/// reduces it in proportion to the units sold, so the average cost per
/// unit is unchanged by a sale and re-averaged by every buy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// The asset this position tracks
    pub asset_id: String,

    /// Units currently held (never negative)
    pub quantity: f64,

    /// Cash invested in the open units (never negative)
    pub cost_basis: f64,
}

impl Holding {
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            quantity: 0.0,
            cost_basis: 0.0,
        }
    }

    /// Average cost per unit of the open position, or 0 for a flat one.
    #[must_use]
    pub fn average_cost(&self) -> f64 {
        if self.quantity > DUST_TOLERANCE {
            self.cost_basis / self.quantity
        } else {
            0.0
        }
    }

    /// Whether the position is (effectively) closed.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.quantity <= DUST_TOLERANCE
    }

    /// Add units bought for `cost` (the asset-side cash, fees excluded).
    pub fn apply_buy(&mut self, quantity: f64, cost: f64) {
        self.quantity += quantity;
        self.cost_basis += cost;
    }

    /// Remove units sold for `proceeds` (net cash received).
    ///
    /// Returns the realized gain of the sale and whether the sale
    /// exceeded the units held. The gain is `proceeds − avg_cost × qty`,
    /// which for a sale with no recorded basis means the full proceeds.
    /// Quantity and basis are clamped to zero rather than allowed to go
    /// negative, so an over-sell flattens the position.
    pub fn apply_sell(&mut self, quantity: f64, proceeds: f64) -> (f64, bool) {
        let clamped = quantity > self.quantity + DUST_TOLERANCE;
        let avg_cost = self.average_cost();
        let realized = proceeds - avg_cost * quantity;

        self.quantity -= quantity;
        self.cost_basis -= avg_cost * quantity;

        // Over-sells and arithmetic dust from repeated averaging both
        // land here: a position at (or below) zero units holds no basis.
        if self.quantity <= DUST_TOLERANCE {
            self.quantity = 0.0;
            self.cost_basis = 0.0;
        }
        if self.cost_basis < 0.0 {
            self.cost_basis = 0.0;
        }

        (realized, clamped)
    }
}
