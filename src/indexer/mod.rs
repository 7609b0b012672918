pub mod demo;
pub mod rate_limit;
pub mod transaction_indexer;

pub use rate_limit::RateLimiter;
pub use transaction_indexer::{IndexOutcome, IndexerSettings, TransactionIndexer};
