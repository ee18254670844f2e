//! SQLite-based storage for users, decks, cards, and review logs.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations};
use crate::deck::{Card, Deck, ReviewLog, User};
use crate::error::{DatabaseError, Result};
use crate::scheduler::Grade;

// === Helper Functions ===

/// Parse a grade from its database string.
///
/// A row holding anything but the four known grades is corrupt; refusing
/// it beats misreporting it as a recall outcome it never was.
fn parse_grade(grade_str: &str) -> std::result::Result<Grade, rusqlite::Error> {
    grade_str.parse::<Grade>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_datetime_opt(dt_str: Option<String>) -> Option<DateTime<Utc>> {
    dt_str
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Build a Card from a database row.
///
/// Column order: id, deck_id, question, answer, box, interval_days,
/// next_due, created_at, updated_at, reviewed_at.
fn row_to_card(row: &rusqlite::Row) -> std::result::Result<Card, rusqlite::Error> {
    let next_due_str: String = row.get(6)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;
    let reviewed_at_str: Option<String> = row.get(9)?;

    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
        box_level: row.get(4)?,
        interval_days: row.get(5)?,
        next_due: parse_datetime_fallback(&next_due_str),
        created_at: parse_datetime_fallback(&created_at_str),
        updated_at: parse_datetime_fallback(&updated_at_str),
        reviewed_at: parse_datetime_opt(reviewed_at_str),
    })
}

/// Build a ReviewLog from a database row.
///
/// Column order: id, card_id, user_id, grade, note, box_before,
/// box_after, interval_days_after, reviewed_at.
fn row_to_log(row: &rusqlite::Row) -> std::result::Result<ReviewLog, rusqlite::Error> {
    let grade_str: String = row.get(3)?;
    let reviewed_at_str: String = row.get(8)?;

    Ok(ReviewLog {
        id: row.get(0)?,
        card_id: row.get(1)?,
        user_id: row.get(2)?,
        grade: parse_grade(&grade_str)?,
        note: row.get(4)?,
        box_before: row.get(5)?,
        box_after: row.get(6)?,
        interval_days_after: row.get(7)?,
        reviewed_at: parse_datetime_fallback(&reviewed_at_str),
    })
}

/// Build a Deck from a database row.
///
/// Column order: id, user_id, name, description, created_at, updated_at.
fn row_to_deck(row: &rusqlite::Row) -> std::result::Result<Deck, rusqlite::Error> {
    let created_at_str: String = row.get(4)?;
    let updated_at_str: String = row.get(5)?;

    Ok(Deck {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_datetime_fallback(&created_at_str),
        updated_at: parse_datetime_fallback(&updated_at_str),
    })
}

const CARD_COLUMNS: &str = "id, deck_id, question, answer, box, interval_days, \
     next_due, created_at, updated_at, reviewed_at";

const LOG_COLUMNS: &str = "id, card_id, user_id, grade, note, box_before, \
     box_after, interval_days_after, reviewed_at";

/// Per-user review statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReviewStats {
    pub total_reviews: u64,
    pub today_reviews: u64,
    pub again: u64,
    pub hard: u64,
    pub good: u64,
    pub easy: u64,
    /// Card counts per box level, index 0 = box 1.
    pub cards_per_box: [u64; 5],
    pub due_now: u64,
}

/// SQLite database for deck storage.
///
/// Stores users, decks, cards, and the append-only review log.
pub struct DeckDb {
    conn: Connection,
}

impl DeckDb {
    /// Open the database at `cardbox.db` in the data directory.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("cardbox.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        // Wait out a concurrent writer instead of failing with SQLITE_BUSY.
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and ephemeral use).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        // Base (v1) schema first
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id         TEXT PRIMARY KEY,
                    name       TEXT NOT NULL UNIQUE,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS decks (
                    id          TEXT PRIMARY KEY,
                    user_id     TEXT NOT NULL,
                    name        TEXT NOT NULL,
                    description TEXT,
                    created_at  TEXT NOT NULL,
                    updated_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS cards (
                    id            TEXT PRIMARY KEY,
                    deck_id       TEXT NOT NULL,
                    question      TEXT NOT NULL,
                    answer        TEXT NOT NULL,
                    box           INTEGER NOT NULL DEFAULT 1,
                    interval_days REAL NOT NULL DEFAULT 1.0,
                    next_due      TEXT NOT NULL,
                    created_at    TEXT NOT NULL,
                    updated_at    TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS review_logs (
                    id                  TEXT PRIMARY KEY,
                    card_id             TEXT NOT NULL,
                    user_id             TEXT NOT NULL,
                    grade               TEXT NOT NULL,
                    note                TEXT,
                    box_before          INTEGER NOT NULL,
                    box_after           INTEGER NOT NULL,
                    interval_days_after REAL NOT NULL,
                    reviewed_at         TEXT NOT NULL
                );

                -- Indexes for the common query patterns
                CREATE INDEX IF NOT EXISTS idx_decks_user ON decks(user_id);
                CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id);
                CREATE INDEX IF NOT EXISTS idx_cards_next_due ON cards(next_due);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        // Incremental migrations (v1 -> v2, etc.)
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        Ok(())
    }

    // === User CRUD ===

    /// Create a new user profile.
    pub fn create_user(&self, user: &User) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO users (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![user.id, user.name, user.created_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Get a user by ID.
    pub fn get_user(&self, id: &str) -> Result<Option<User>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT id, name, created_at FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: parse_datetime_fallback(&row.get::<_, String>(2)?),
                    })
                },
            )
            .optional()
    }

    /// Look a user up by profile name.
    pub fn find_user_by_name(&self, name: &str) -> Result<Option<User>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT id, name, created_at FROM users WHERE name = ?1",
                params![name],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: parse_datetime_fallback(&row.get::<_, String>(2)?),
                    })
                },
            )
            .optional()
    }

    /// List all users.
    pub fn list_users(&self) -> Result<Vec<User>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM users ORDER BY created_at ASC")?;
        let users = stmt.query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: parse_datetime_fallback(&row.get::<_, String>(2)?),
            })
        })?;
        users.collect()
    }

    // === Deck CRUD ===

    /// Create a new deck.
    pub fn create_deck(&self, deck: &Deck) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO decks (id, user_id, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                deck.id,
                deck.user_id,
                deck.name,
                deck.description,
                deck.created_at.to_rfc3339(),
                deck.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a deck by ID.
    pub fn get_deck(&self, id: &str) -> Result<Option<Deck>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, description, created_at, updated_at
                 FROM decks WHERE id = ?1",
                params![id],
                row_to_deck,
            )
            .optional()
    }

    /// Get a deck by ID, scoped to its owner.
    pub fn get_deck_for_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Deck>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, description, created_at, updated_at
                 FROM decks WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
                row_to_deck,
            )
            .optional()
    }

    /// List a user's decks.
    pub fn list_decks(&self, user_id: &str) -> Result<Vec<Deck>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, description, created_at, updated_at
             FROM decks WHERE user_id = ?1 ORDER BY created_at ASC",
        )?;
        let decks = stmt.query_map(params![user_id], row_to_deck)?;
        decks.collect()
    }

    /// Update a deck's name and description.
    pub fn update_deck(&self, deck: &Deck) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE decks SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                deck.name,
                deck.description,
                deck.updated_at.to_rfc3339(),
                deck.id,
            ],
        )?;
        Ok(())
    }

    /// Delete a deck with its cards and their logs in a single transaction.
    pub fn delete_deck(&self, id: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        let result: Result<(), rusqlite::Error> = (|| {
            self.conn.execute(
                "DELETE FROM review_logs
                 WHERE card_id IN (SELECT id FROM cards WHERE deck_id = ?1)",
                params![id],
            )?;
            self.conn
                .execute("DELETE FROM cards WHERE deck_id = ?1", params![id])?;
            self.conn
                .execute("DELETE FROM decks WHERE id = ?1", params![id])?;
            Ok(())
        })();
        match result {
            Ok(()) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(())
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }

    // === Card CRUD ===

    /// Create a new card.
    pub fn create_card(&self, card: &Card) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO cards (id, deck_id, question, answer, box, interval_days,
                                next_due, created_at, updated_at, reviewed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                card.id,
                card.deck_id,
                card.question,
                card.answer,
                card.box_level,
                card.interval_days,
                card.next_due.to_rfc3339(),
                card.created_at.to_rfc3339(),
                card.updated_at.to_rfc3339(),
                card.reviewed_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Get a card by ID.
    pub fn get_card(&self, id: &str) -> Result<Option<Card>, rusqlite::Error> {
        self.conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1"),
                params![id],
                row_to_card,
            )
            .optional()
    }

    /// Get a card by ID, scoped to the owner of its deck.
    ///
    /// Returns `None` both when the card does not exist and when it belongs
    /// to another user -- callers cannot distinguish the two.
    pub fn get_card_for_user(
        &self,
        card_id: &str,
        user_id: &str,
    ) -> Result<Option<Card>, rusqlite::Error> {
        self.conn
            .query_row(
                &format!(
                    "SELECT c.{} FROM cards c
                     JOIN decks d ON d.id = c.deck_id
                     WHERE c.id = ?1 AND d.user_id = ?2",
                    CARD_COLUMNS.replace(", ", ", c.")
                ),
                params![card_id, user_id],
                row_to_card,
            )
            .optional()
    }

    /// List a deck's cards.
    pub fn list_cards(&self, deck_id: &str) -> Result<Vec<Card>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE deck_id = ?1 ORDER BY created_at ASC"
        ))?;
        let cards = stmt.query_map(params![deck_id], row_to_card)?;
        cards.collect()
    }

    /// Update a card's content (question/answer only).
    pub fn update_card_content(&self, card: &Card) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE cards SET question = ?1, answer = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                card.question,
                card.answer,
                card.updated_at.to_rfc3339(),
                card.id,
            ],
        )?;
        Ok(())
    }

    /// Delete a card and its logs in a single transaction.
    pub fn delete_card(&self, id: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        let result: Result<(), rusqlite::Error> = (|| {
            self.conn
                .execute("DELETE FROM review_logs WHERE card_id = ?1", params![id])?;
            self.conn
                .execute("DELETE FROM cards WHERE id = ?1", params![id])?;
            Ok(())
        })();
        match result {
            Ok(()) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(())
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }

    // === Review writes ===

    /// Apply one review as a single atomic unit.
    ///
    /// The ownership-scoped card lookup, the caller-supplied transition,
    /// the card update, and the log insert all run inside one
    /// `BEGIN IMMEDIATE` transaction. Concurrent reviews of the same card
    /// serialize through SQLite's write lock, so each transition starts
    /// from the state the previous review committed.
    ///
    /// Returns `None` when the card does not exist or is not owned by
    /// `user_id`. A failed write rolls back and leaves the card in its
    /// prior state.
    pub fn apply_review_with<F>(
        &self,
        card_id: &str,
        user_id: &str,
        update: F,
    ) -> Result<Option<(Card, ReviewLog)>, rusqlite::Error>
    where
        F: FnOnce(&Card) -> (Card, ReviewLog),
    {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        let result: Result<Option<(Card, ReviewLog)>, rusqlite::Error> = (|| {
            let current = match self.get_card_for_user(card_id, user_id)? {
                Some(card) => card,
                None => return Ok(None),
            };
            let (card, log) = update(&current);
            self.conn.execute(
                "UPDATE cards
                 SET box = ?1, interval_days = ?2, next_due = ?3,
                     reviewed_at = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    card.box_level,
                    card.interval_days,
                    card.next_due.to_rfc3339(),
                    card.reviewed_at.map(|dt| dt.to_rfc3339()),
                    card.updated_at.to_rfc3339(),
                    card.id,
                ],
            )?;
            self.conn.execute(
                "INSERT INTO review_logs (id, card_id, user_id, grade, note, box_before,
                                          box_after, interval_days_after, reviewed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    log.id,
                    log.card_id,
                    log.user_id,
                    log.grade.as_str(),
                    log.note,
                    log.box_before,
                    log.box_after,
                    log.interval_days_after,
                    log.reviewed_at.to_rfc3339(),
                ],
            )?;
            Ok(Some((card, log)))
        })();
        match result {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }

    /// List a user's due cards, most overdue first.
    pub fn due_cards(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        limit: Option<u32>,
    ) -> Result<Vec<Card>, rusqlite::Error> {
        let mut query = format!(
            "SELECT c.{} FROM cards c
             JOIN decks d ON d.id = c.deck_id
             WHERE d.user_id = ?1 AND c.next_due <= ?2
             ORDER BY c.next_due ASC",
            CARD_COLUMNS.replace(", ", ", c.")
        );
        if let Some(n) = limit {
            query.push_str(&format!(" LIMIT {n}"));
        }
        let mut stmt = self.conn.prepare(&query)?;
        let cards = stmt.query_map(params![user_id, now.to_rfc3339()], row_to_card)?;
        cards.collect()
    }

    /// A card's most recent review logs, newest first.
    pub fn recent_logs(
        &self,
        card_id: &str,
        limit: u32,
    ) -> Result<Vec<ReviewLog>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM review_logs
             WHERE card_id = ?1
             ORDER BY reviewed_at DESC
             LIMIT ?2"
        ))?;
        let logs = stmt.query_map(params![card_id, limit], row_to_log)?;
        logs.collect()
    }

    /// Per-user review statistics.
    pub fn stats(&self, user_id: &str, now: DateTime<Utc>) -> Result<ReviewStats, rusqlite::Error> {
        let mut stats = ReviewStats::default();

        let mut stmt = self.conn.prepare(
            "SELECT grade, COUNT(*) FROM review_logs WHERE user_id = ?1 GROUP BY grade",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;
        for row in rows {
            let (grade, count) = row?;
            stats.total_reviews += count;
            match grade.as_str() {
                "again" => stats.again += count,
                "hard" => stats.hard += count,
                "good" => stats.good += count,
                "easy" => stats.easy += count,
                _ => {}
            }
        }

        let today = now.format("%Y-%m-%d").to_string();
        stats.today_reviews = self.conn.query_row(
            "SELECT COUNT(*) FROM review_logs WHERE user_id = ?1 AND reviewed_at >= ?2",
            params![user_id, format!("{today}T00:00:00+00:00")],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT c.box, COUNT(*) FROM cards c
             JOIN decks d ON d.id = c.deck_id
             WHERE d.user_id = ?1
             GROUP BY c.box",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, u64>(1)?))
        })?;
        for row in rows {
            let (box_level, count) = row?;
            if (1..=5).contains(&box_level) {
                stats.cards_per_box[(box_level - 1) as usize] = count;
            }
        }

        stats.due_now = self.conn.query_row(
            "SELECT COUNT(*) FROM cards c
             JOIN decks d ON d.id = c.deck_id
             WHERE d.user_id = ?1 AND c.next_due <= ?2",
            params![user_id, now.to_rfc3339()],
            |row| row.get(0),
        )?;

        Ok(stats)
    }
}
