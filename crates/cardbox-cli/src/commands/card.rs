//! Card management commands for CLI.

use cardbox_core::{Card, Config, CoreError, DeckDb, ValidationError};
use chrono::Utc;
use clap::Subcommand;

use super::resolve_user;

#[derive(Subcommand)]
pub enum CardAction {
    /// Add a card to a deck
    Add {
        /// Deck ID
        deck_id: String,
        /// Question (front side)
        question: String,
        /// Answer (back side)
        answer: String,
        /// Acting user profile
        #[arg(long)]
        user: Option<String>,
    },
    /// List a deck's cards
    List {
        /// Deck ID
        deck_id: String,
        /// Acting user profile
        #[arg(long)]
        user: Option<String>,
    },
    /// Get card details
    Get {
        /// Card ID
        id: String,
        /// Acting user profile
        #[arg(long)]
        user: Option<String>,
    },
    /// Edit a card's content
    Edit {
        /// Card ID
        id: String,
        /// New question
        #[arg(long)]
        question: Option<String>,
        /// New answer
        #[arg(long)]
        answer: Option<String>,
        /// Acting user profile
        #[arg(long)]
        user: Option<String>,
    },
    /// Delete a card and its review logs
    Delete {
        /// Card ID
        id: String,
        /// Acting user profile
        #[arg(long)]
        user: Option<String>,
    },
    /// Show a card's review history, newest first
    History {
        /// Card ID
        id: String,
        /// Maximum number of log rows
        #[arg(long, default_value = "10")]
        limit: u32,
        /// Acting user profile
        #[arg(long)]
        user: Option<String>,
    },
}

pub fn run(action: CardAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = DeckDb::open()?;

    match action {
        CardAction::Add {
            deck_id,
            question,
            answer,
            user,
        } => {
            if question.trim().is_empty() {
                return Err(ValidationError::EmptyField("question").into());
            }
            if answer.trim().is_empty() {
                return Err(ValidationError::EmptyField("answer").into());
            }
            let user = resolve_user(&db, user)?;
            db.get_deck_for_user(&deck_id, &user.id)?
                .ok_or_else(|| CoreError::NotFound(format!("deck {deck_id}")))?;

            let config = Config::load()?;
            let card = Card::new(
                &deck_id,
                question,
                answer,
                config.scheduler.initial_interval_days,
            );
            db.create_card(&card)?;
            println!("Card created: {}", card.id);
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        CardAction::List { deck_id, user } => {
            let user = resolve_user(&db, user)?;
            db.get_deck_for_user(&deck_id, &user.id)?
                .ok_or_else(|| CoreError::NotFound(format!("deck {deck_id}")))?;
            let cards = db.list_cards(&deck_id)?;
            println!("{}", serde_json::to_string_pretty(&cards)?);
        }
        CardAction::Get { id, user } => {
            let user = resolve_user(&db, user)?;
            let card = db
                .get_card_for_user(&id, &user.id)?
                .ok_or_else(|| CoreError::NotFound(format!("card {id}")))?;
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        CardAction::Edit {
            id,
            question,
            answer,
            user,
        } => {
            let user = resolve_user(&db, user)?;
            let mut card = db
                .get_card_for_user(&id, &user.id)?
                .ok_or_else(|| CoreError::NotFound(format!("card {id}")))?;

            if let Some(q) = question {
                card.question = q;
            }
            if let Some(a) = answer {
                card.answer = a;
            }
            card.updated_at = Utc::now();
            db.update_card_content(&card)?;
            println!("Card updated:");
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        CardAction::Delete { id, user } => {
            let user = resolve_user(&db, user)?;
            db.get_card_for_user(&id, &user.id)?
                .ok_or_else(|| CoreError::NotFound(format!("card {id}")))?;
            db.delete_card(&id)?;
            println!("Card deleted: {id}");
        }
        CardAction::History { id, limit, user } => {
            let user = resolve_user(&db, user)?;
            db.get_card_for_user(&id, &user.id)?
                .ok_or_else(|| CoreError::NotFound(format!("card {id}")))?;
            let logs = db.recent_logs(&id, limit)?;
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
    }
    Ok(())
}
