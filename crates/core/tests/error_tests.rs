// ═══════════════════════════════════════════════════════════════════
// Error Tests — display formats, conversions, trait properties
// ═══════════════════════════════════════════════════════════════════

use chrono::{TimeZone, Utc};

use portfolio_pulse_core::errors::CoreError;
use portfolio_pulse_core::models::transaction::Transaction;

// ═══════════════════════════════════════════════════════════════════
// Display formats
// ═══════════════════════════════════════════════════════════════════

mod display {
    use super::*;

    #[test]
    fn price_not_available() {
        let err = CoreError::PriceNotAvailable {
            asset_id: "BTC".to_string(),
            requested_at: "2025-01-10T12:00:00+00:00".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Price not available for BTC as of 2025-01-10T12:00:00+00:00"
        );
    }

    #[test]
    fn invalid_price_zero() {
        let err = CoreError::InvalidPrice {
            asset_id: "BTC".to_string(),
            price: 0.0,
        };
        assert_eq!(err.to_string(), "Invalid price 0 for BTC");
    }

    #[test]
    fn invalid_price_negative() {
        let err = CoreError::InvalidPrice {
            asset_id: "BTC".to_string(),
            price: -1.5,
        };
        assert_eq!(err.to_string(), "Invalid price -1.5 for BTC");
    }

    #[test]
    fn no_oracle() {
        let err = CoreError::NoOracle("BTC".to_string());
        assert_eq!(err.to_string(), "No oracle available for BTC");
    }

    #[test]
    fn invalid_transaction() {
        let err = CoreError::InvalidTransaction {
            id: "abc".to_string(),
            reason: "negative quantity -1".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid transaction abc: negative quantity -1");
    }

    #[test]
    fn validation_error() {
        let err = CoreError::ValidationError("bad request".to_string());
        assert_eq!(err.to_string(), "Validation failed: bad request");
    }

    #[test]
    fn source_error() {
        let err = CoreError::Source("backend offline".to_string());
        assert_eq!(err.to_string(), "Transaction source error: backend offline");
    }

    #[test]
    fn serialization_error() {
        let err = CoreError::Serialization("unexpected end of input".to_string());
        assert_eq!(err.to_string(), "Serialization error: unexpected end of input");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Conversions
// ═══════════════════════════════════════════════════════════════════

mod conversion {
    use super::*;

    #[test]
    fn serde_json_errors_convert() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err = CoreError::from(json_err);
        match err {
            CoreError::Serialization(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected Serialization, got {:?}", other),
        }
    }

    #[test]
    fn serde_json_errors_keep_the_message() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(err.to_string().starts_with("Serialization error:"));
    }

    #[test]
    fn validation_failures_carry_the_transaction_id() {
        let mut tx = Transaction::buy(
            "acct",
            "BTC",
            Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap(),
            1.0,
            100.0,
            0.0,
        );
        tx.fee_amount = -5.0;

        match tx.validate() {
            Err(CoreError::InvalidTransaction { id, reason }) => {
                assert_eq!(id, tx.id.to_string());
                assert!(reason.contains("fee"));
            }
            other => panic!("Expected InvalidTransaction, got {:?}", other),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Trait properties
// ═══════════════════════════════════════════════════════════════════

mod properties {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn errors_are_send_and_sync() {
        assert_send_sync::<CoreError>();
    }

    #[test]
    fn debug_output_is_nonempty() {
        let err = CoreError::NoOracle("BTC".to_string());
        assert!(!format!("{:?}", err).is_empty());
    }

    #[test]
    fn leaf_errors_have_no_source() {
        use std::error::Error;
        let err = CoreError::Source("backend offline".to_string());
        assert!(err.source().is_none());
    }
}
