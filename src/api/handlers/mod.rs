pub mod analyze;
pub mod health;
pub mod leaderboard;
pub mod wallet;

use crate::errors::AppError;
use crate::models::Blockchain;

/// Parse a `blockchain` parameter, falling back to `default` when absent.
pub(crate) fn parse_chain(raw: Option<&str>, default: Blockchain) -> Result<Blockchain, AppError> {
    match raw {
        None => Ok(default),
        Some(s) if s.trim().is_empty() => Ok(default),
        Some(s) => s.parse::<Blockchain>().map_err(AppError::BadRequest),
    }
}
