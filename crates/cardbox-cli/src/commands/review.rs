//! Review and due-queue commands for CLI.

use cardbox_core::{Config, CoreError, DeckDb, Grade, ReviewService};

use super::resolve_user;

pub fn run_review(
    card_id: String,
    grade: String,
    note: Option<String>,
    user: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let grade: Grade = grade.parse().map_err(CoreError::Validation)?;

    let db = DeckDb::open()?;
    let user = resolve_user(&db, user)?;
    let svc = ReviewService::new(db);

    let result = svc.review_card(&user.id, &card_id, grade, note.as_deref())?;
    println!(
        "Card reviewed ({}): box {}, next due {}",
        result.log.grade,
        result.card.box_level,
        result.next_review.to_rfc3339()
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn run_due(
    user: Option<String>,
    limit: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = DeckDb::open()?;
    let user = resolve_user(&db, user)?;
    let svc = ReviewService::new(db);

    let limit = limit.or(Config::load()?.scheduler.due_limit);
    let due = svc.due_cards(&user.id, limit)?;
    println!("{}", serde_json::to_string_pretty(&due)?);
    Ok(())
}
