//! Review operations over the card store.
//!
//! `ReviewService` is the single entry point for the scheduler: it owns
//! the database handle and is constructed explicitly by the caller -- no
//! module-level state. Each call is one synchronous unit of work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deck::{Card, DueCard, ReviewLog};
use crate::error::{CoreError, Result};
use crate::scheduler::{schedule, Grade};
use crate::storage::{DeckDb, ReviewStats};

/// How many recent logs each due card carries for display context.
const RECENT_LOG_COUNT: u32 = 5;

/// Result of reviewing a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    pub card: Card,
    pub next_review: DateTime<Utc>,
    pub log: ReviewLog,
}

/// Review scheduler service.
pub struct ReviewService {
    db: DeckDb,
}

impl ReviewService {
    /// Construct a service over an open database.
    pub fn new(db: DeckDb) -> Self {
        Self { db }
    }

    /// Access the underlying store (for CRUD outside the review flow).
    pub fn db(&self) -> &DeckDb {
        &self.db
    }

    /// Grade a card and reschedule it.
    ///
    /// Looks the card up scoped to `user_id` (a card owned by someone else
    /// is indistinguishable from a missing one), applies the Leitner
    /// transition, and persists the card update together with exactly one
    /// appended review log. The lookup, transition, and both writes share
    /// a single transaction, so concurrent reviews of the same card
    /// serialize and each one starts from the last committed state.
    ///
    /// # Errors
    /// - [`CoreError::NotFound`] if the card is missing or not owned by
    ///   the caller.
    /// - [`CoreError::Database`] on any persistence failure; the card is
    ///   left in its prior state.
    pub fn review_card(
        &self,
        user_id: &str,
        card_id: &str,
        grade: Grade,
        note: Option<&str>,
    ) -> Result<ReviewResult> {
        self.review_card_at(user_id, card_id, grade, note, Utc::now())
    }

    /// [`review_card`](Self::review_card) with an explicit clock.
    pub fn review_card_at(
        &self,
        user_id: &str,
        card_id: &str,
        grade: Grade,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ReviewResult> {
        let note = note
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let (card, log) = self
            .db
            .apply_review_with(card_id, user_id, |current| {
                let outcome = schedule(current.box_level, current.interval_days, grade, now);
                let log = ReviewLog {
                    id: Uuid::new_v4().to_string(),
                    card_id: current.id.clone(),
                    user_id: user_id.to_string(),
                    grade,
                    note,
                    box_before: current.box_level,
                    box_after: outcome.box_level,
                    interval_days_after: outcome.interval_days,
                    reviewed_at: now,
                };

                let mut card = current.clone();
                card.box_level = outcome.box_level;
                card.interval_days = outcome.interval_days;
                card.next_due = outcome.next_due;
                card.reviewed_at = Some(now);
                card.updated_at = now;
                (card, log)
            })?
            .ok_or_else(|| CoreError::NotFound(format!("card {card_id}")))?;

        Ok(ReviewResult {
            next_review: card.next_due,
            card,
            log,
        })
    }

    /// All of the user's due cards, most overdue first, each with its
    /// five most recent review logs. Pure read.
    pub fn due_cards(&self, user_id: &str, limit: Option<u32>) -> Result<Vec<DueCard>> {
        self.due_cards_at(user_id, limit, Utc::now())
    }

    /// [`due_cards`](Self::due_cards) with an explicit clock.
    pub fn due_cards_at(
        &self,
        user_id: &str,
        limit: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DueCard>> {
        let cards = self.db.due_cards(user_id, now, limit)?;
        let mut due = Vec::with_capacity(cards.len());
        for card in cards {
            let recent_logs = self.db.recent_logs(&card.id, RECENT_LOG_COUNT)?;
            due.push(DueCard { card, recent_logs });
        }
        Ok(due)
    }

    /// Per-user review statistics.
    pub fn stats(&self, user_id: &str) -> Result<ReviewStats> {
        Ok(self.db.stats(user_id, Utc::now())?)
    }
}
