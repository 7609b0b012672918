pub mod fifo;
pub mod validation;
pub mod wallet;

pub use fifo::{compute_stats, match_trades, MatchOutcome};
pub use validation::{normalize_address, AddressError};
pub use wallet::{analyze_wallet, wallet_balances, wallet_overview, WalletOverview};
