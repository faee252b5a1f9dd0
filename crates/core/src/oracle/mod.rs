pub mod traits;

// Oracle adapters
pub mod cached;
pub mod fallback;
pub mod memory;
