pub mod card;
pub mod config;
pub mod deck;
pub mod review;
pub mod stats;
pub mod user;

use cardbox_core::{Config, CoreError, DeckDb, User};

/// Resolve the acting user from `--user` or the configured default.
pub fn resolve_user(
    db: &DeckDb,
    flag: Option<String>,
) -> Result<User, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let name = flag
        .or(config.default_user)
        .ok_or(CoreError::Unauthorized)?;
    let user = db
        .find_user_by_name(&name)?
        .ok_or_else(|| CoreError::NotFound(format!("user {name}")))?;
    Ok(user)
}
