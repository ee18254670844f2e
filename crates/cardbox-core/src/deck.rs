//! Model types: users, decks, cards, and review logs.
//!
//! A `User` owns `Deck`s, a `Deck` owns `Card`s, and every review of a
//! card appends one immutable `ReviewLog` row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scheduler::{Grade, MIN_BOX};

/// A local user profile. Ownership checks resolve through this id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// A named collection of cards owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A flashcard plus its repetition state.
///
/// `box_level` is always within 1..=5. `interval_days` only shrinks on a
/// `hard` step-back or an `again` reset; `next_due` marks when the card
/// becomes eligible for review again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub deck_id: String,
    pub question: String,
    pub answer: String,
    #[serde(rename = "box")]
    pub box_level: i32,
    pub interval_days: f64,
    pub next_due: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Card {
    /// Create a fresh card: box 1, due immediately.
    pub fn new(
        deck_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        initial_interval_days: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            deck_id: deck_id.into(),
            question: question.into(),
            answer: answer.into(),
            box_level: MIN_BOX,
            interval_days: initial_interval_days,
            next_due: now,
            created_at: now,
            updated_at: now,
            reviewed_at: None,
        }
    }

    /// Whether the card is eligible for review at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_due <= now
    }
}

/// One review event. Append-only: never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLog {
    pub id: String,
    pub card_id: String,
    pub user_id: String,
    pub grade: Grade,
    pub note: Option<String>,
    pub box_before: i32,
    pub box_after: i32,
    pub interval_days_after: f64,
    pub reviewed_at: DateTime<Utc>,
}

/// A due card bundled with display context for the review queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueCard {
    pub card: Card,
    /// The five most recent review logs, newest first.
    pub recent_logs: Vec<ReviewLog>,
}
