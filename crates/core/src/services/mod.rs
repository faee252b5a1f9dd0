pub mod ledger_service;
pub mod performance_service;
pub mod valuation_service;
