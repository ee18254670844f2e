//! Deck management commands for CLI.

use cardbox_core::{CoreError, Deck, DeckDb, ValidationError};
use chrono::Utc;
use clap::Subcommand;

use super::resolve_user;

#[derive(Subcommand)]
pub enum DeckAction {
    /// Create a new deck
    Create {
        /// Deck name
        name: String,
        /// Deck description
        #[arg(long)]
        description: Option<String>,
        /// Acting user profile
        #[arg(long)]
        user: Option<String>,
    },
    /// List decks
    List {
        /// Acting user profile
        #[arg(long)]
        user: Option<String>,
    },
    /// Get deck details
    Get {
        /// Deck ID
        id: String,
        /// Acting user profile
        #[arg(long)]
        user: Option<String>,
    },
    /// Rename a deck
    Rename {
        /// Deck ID
        id: String,
        /// New name
        name: String,
        /// Acting user profile
        #[arg(long)]
        user: Option<String>,
    },
    /// Delete a deck with its cards and review logs
    Delete {
        /// Deck ID
        id: String,
        /// Acting user profile
        #[arg(long)]
        user: Option<String>,
    },
}

pub fn run(action: DeckAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = DeckDb::open()?;

    match action {
        DeckAction::Create {
            name,
            description,
            user,
        } => {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyField("name").into());
            }
            let user = resolve_user(&db, user)?;
            let deck = Deck::new(&user.id, name, description);
            db.create_deck(&deck)?;
            println!("Deck created: {}", deck.id);
            println!("{}", serde_json::to_string_pretty(&deck)?);
        }
        DeckAction::List { user } => {
            let user = resolve_user(&db, user)?;
            let decks = db.list_decks(&user.id)?;
            println!("{}", serde_json::to_string_pretty(&decks)?);
        }
        DeckAction::Get { id, user } => {
            let user = resolve_user(&db, user)?;
            let deck = db
                .get_deck_for_user(&id, &user.id)?
                .ok_or_else(|| CoreError::NotFound(format!("deck {id}")))?;
            println!("{}", serde_json::to_string_pretty(&deck)?);
        }
        DeckAction::Rename { id, name, user } => {
            let user = resolve_user(&db, user)?;
            let mut deck = db
                .get_deck_for_user(&id, &user.id)?
                .ok_or_else(|| CoreError::NotFound(format!("deck {id}")))?;
            deck.name = name;
            deck.updated_at = Utc::now();
            db.update_deck(&deck)?;
            println!("Deck renamed: {}", deck.id);
        }
        DeckAction::Delete { id, user } => {
            let user = resolve_user(&db, user)?;
            db.get_deck_for_user(&id, &user.id)?
                .ok_or_else(|| CoreError::NotFound(format!("deck {id}")))?;
            db.delete_deck(&id)?;
            println!("Deck deleted: {id}");
        }
    }
    Ok(())
}
