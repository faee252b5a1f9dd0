pub mod holding;
pub mod ledger;
pub mod performance;
pub mod period;
pub mod price;
pub mod settings;
pub mod transaction;
