use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;

/// Kind of ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Acquiring units of an asset
    Buy,
    /// Disposing of units of an asset
    Sell,
    /// Cash paid into the account
    Deposit,
    /// Cash taken out of the account
    Withdrawal,
    /// Dividend payout, optionally tagged with the paying asset
    Dividend,
    /// Interest credited on cash balances
    Interest,
    /// Standalone fee or account charge
    Fee,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "Buy"),
            TransactionKind::Sell => write!(f, "Sell"),
            TransactionKind::Deposit => write!(f, "Deposit"),
            TransactionKind::Withdrawal => write!(f, "Withdrawal"),
            TransactionKind::Dividend => write!(f, "Dividend"),
            TransactionKind::Interest => write!(f, "Interest"),
            TransactionKind::Fee => write!(f, "Fee"),
        }
    }
}

/// A single record in the append-only transaction log.
///
/// **Important**: `gross_amount` is the full signed cash effect of the
/// transaction in the reporting currency, with any fee already inside it.
/// Negative means cash left the account (buys, withdrawals, charges),
/// positive means cash came in (sells, deposits, dividends, interest).
/// `fee_amount` breaks out the fee portion so cost basis and fee totals
/// can be tracked separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: Uuid,

    /// The account this transaction belongs to
    pub account_id: String,

    /// When the transaction happened. Streams are replayed in timestamp
    /// order, with the original record order breaking ties.
    pub timestamp: DateTime<Utc>,

    /// The traded asset. Absent for pure cash movements; optional for
    /// dividends (an untagged dividend is an account-level payout).
    #[serde(default)]
    pub asset_id: Option<String>,

    /// Units moved (always non-negative; direction comes from `kind`)
    pub quantity: f64,

    /// Signed net cash effect, fee included
    pub gross_amount: f64,

    /// Fee portion of the cash effect (always non-negative)
    pub fee_amount: f64,

    /// What happened
    pub kind: TransactionKind,
}

impl Transaction {
    /// Buy `quantity` units, paying `total_cost` in cash (fee included).
    pub fn buy(
        account_id: impl Into<String>,
        asset_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        quantity: f64,
        total_cost: f64,
        fee_amount: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            timestamp,
            asset_id: Some(asset_id.into()),
            quantity,
            gross_amount: -total_cost.abs(),
            fee_amount,
            kind: TransactionKind::Buy,
        }
    }

    /// Sell `quantity` units for `net_proceeds` in cash (after `fee_amount`
    /// was already deducted by the broker).
    pub fn sell(
        account_id: impl Into<String>,
        asset_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        quantity: f64,
        net_proceeds: f64,
        fee_amount: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            timestamp,
            asset_id: Some(asset_id.into()),
            quantity,
            gross_amount: net_proceeds.abs(),
            fee_amount,
            kind: TransactionKind::Sell,
        }
    }

    /// Cash paid into the account.
    pub fn deposit(
        account_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        amount: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            timestamp,
            asset_id: None,
            quantity: 0.0,
            gross_amount: amount.abs(),
            fee_amount: 0.0,
            kind: TransactionKind::Deposit,
        }
    }

    /// Cash taken out of the account.
    pub fn withdrawal(
        account_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        amount: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            timestamp,
            asset_id: None,
            quantity: 0.0,
            gross_amount: -amount.abs(),
            fee_amount: 0.0,
            kind: TransactionKind::Withdrawal,
        }
    }

    /// Dividend received. Pass the paying asset where the upstream record
    /// identifies one; `None` books it against the account as a whole.
    pub fn dividend(
        account_id: impl Into<String>,
        asset_id: Option<String>,
        timestamp: DateTime<Utc>,
        amount: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            timestamp,
            asset_id,
            quantity: 0.0,
            gross_amount: amount.abs(),
            fee_amount: 0.0,
            kind: TransactionKind::Dividend,
        }
    }

    /// Interest credited on cash.
    pub fn interest(
        account_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        amount: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            timestamp,
            asset_id: None,
            quantity: 0.0,
            gross_amount: amount.abs(),
            fee_amount: 0.0,
            kind: TransactionKind::Interest,
        }
    }

    /// Standalone fee charged to the account.
    pub fn fee(
        account_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        amount: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            timestamp,
            asset_id: None,
            quantity: 0.0,
            gross_amount: -amount.abs(),
            fee_amount: amount.abs(),
            kind: TransactionKind::Fee,
        }
    }

    /// Whether this transaction moves units of an asset.
    #[must_use]
    pub fn is_trade(&self) -> bool {
        matches!(self.kind, TransactionKind::Buy | TransactionKind::Sell)
    }

    /// Whether this transaction is tagged with the given asset.
    #[must_use]
    pub fn affects_asset(&self, asset_id: &str) -> bool {
        self.asset_id.as_deref() == Some(asset_id)
    }

    /// The amount a standalone `Fee` transaction charges: `fee_amount`
    /// when the importer filled it in, otherwise the gross magnitude.
    #[must_use]
    pub fn fee_charge(&self) -> f64 {
        if self.fee_amount > 0.0 {
            self.fee_amount
        } else {
            self.gross_amount.abs()
        }
    }

    /// Check the structural invariants every record must satisfy before
    /// it can be replayed. Violations indicate importer bugs, not user
    /// data problems, so they surface as hard errors.
    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |reason: String| CoreError::InvalidTransaction {
            id: self.id.to_string(),
            reason,
        };

        if self.account_id.is_empty() {
            return Err(invalid("empty account id".to_string()));
        }
        if !self.quantity.is_finite() || !self.gross_amount.is_finite() || !self.fee_amount.is_finite() {
            return Err(invalid("non-finite amount".to_string()));
        }
        if self.quantity < 0.0 {
            return Err(invalid(format!("negative quantity {}", self.quantity)));
        }
        if self.fee_amount < 0.0 {
            return Err(invalid(format!("negative fee {}", self.fee_amount)));
        }
        if let Some(asset_id) = &self.asset_id {
            if asset_id.is_empty() {
                return Err(invalid("empty asset id".to_string()));
            }
        }

        match self.kind {
            TransactionKind::Buy | TransactionKind::Sell => {
                if self.asset_id.is_none() {
                    return Err(invalid(format!("{} without an asset id", self.kind)));
                }
                if self.quantity <= 0.0 {
                    return Err(invalid(format!("{} with zero quantity", self.kind)));
                }
                if self.kind == TransactionKind::Buy {
                    if self.gross_amount > 0.0 {
                        return Err(invalid("buy with positive cash effect".to_string()));
                    }
                    if self.fee_amount > self.gross_amount.abs() {
                        return Err(invalid("fee exceeds gross amount".to_string()));
                    }
                } else if self.gross_amount < 0.0 {
                    return Err(invalid("sell with negative cash effect".to_string()));
                }
            }
            TransactionKind::Deposit | TransactionKind::Interest => {
                if self.asset_id.is_some() {
                    return Err(invalid(format!("{} with an asset id", self.kind)));
                }
                if self.gross_amount < 0.0 {
                    return Err(invalid(format!("{} with negative cash effect", self.kind)));
                }
            }
            TransactionKind::Withdrawal => {
                if self.asset_id.is_some() {
                    return Err(invalid("withdrawal with an asset id".to_string()));
                }
                if self.gross_amount > 0.0 {
                    return Err(invalid("withdrawal with positive cash effect".to_string()));
                }
                if self.fee_amount > self.gross_amount.abs() {
                    return Err(invalid("fee exceeds gross amount".to_string()));
                }
            }
            TransactionKind::Dividend => {
                if self.gross_amount < 0.0 {
                    return Err(invalid("dividend with negative cash effect".to_string()));
                }
            }
            TransactionKind::Fee => {
                if self.asset_id.is_some() {
                    return Err(invalid("fee with an asset id".to_string()));
                }
                if self.gross_amount > 0.0 {
                    return Err(invalid("fee with positive cash effect".to_string()));
                }
            }
        }

        Ok(())
    }
}
