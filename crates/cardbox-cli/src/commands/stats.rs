//! Review statistics command for CLI.

use cardbox_core::{DeckDb, ReviewService};

use super::resolve_user;

pub fn run(user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let db = DeckDb::open()?;
    let user = resolve_user(&db, user)?;
    let svc = ReviewService::new(db);

    let stats = svc.stats(&user.id)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
