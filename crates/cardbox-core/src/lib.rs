//! # Cardbox Core Library
//!
//! This library provides the core business logic for Cardbox, a
//! Leitner-box spaced-repetition flashcard scheduler. It implements a
//! CLI-first philosophy where all operations are available via a
//! standalone CLI binary over the same core library.
//!
//! ## Architecture
//!
//! - **Scheduler**: A pure state machine over a card's box level and
//!   review interval, driven only by recall grades
//! - **Storage**: SQLite-based deck storage and TOML-based configuration
//! - **Review Service**: An explicitly constructed service composing the
//!   scheduler and storage into atomic review operations
//!
//! ## Key Components
//!
//! - [`ReviewService`]: Review and due-queue operations
//! - [`DeckDb`]: User/deck/card/log persistence
//! - [`Config`]: Application configuration management
//! - [`Grade`]: The four recall grades

pub mod deck;
pub mod error;
pub mod review;
pub mod scheduler;
pub mod storage;

pub use deck::{Card, Deck, DueCard, ReviewLog, User};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use review::{ReviewResult, ReviewService};
pub use scheduler::{next_state, schedule, Grade, ReviewOutcome, MAX_BOX, MIN_BOX};
pub use storage::{Config, DeckDb, ReviewStats};
