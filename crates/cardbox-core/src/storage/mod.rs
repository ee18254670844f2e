mod config;
pub mod deck_db;
pub mod migrations;

pub use config::Config;
pub use deck_db::{DeckDb, ReviewStats};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the data directory, creating it if needed.
///
/// Resolution order:
/// 1. `CARDBOX_DATA_DIR` -- explicit override (used by the e2e tests).
/// 2. `~/.config/cardbox-dev/` when `CARDBOX_ENV=dev`.
/// 3. `~/.config/cardbox/` otherwise.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CARDBOX_DATA_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CARDBOX_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("cardbox-dev")
    } else {
        base_dir.join("cardbox")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
