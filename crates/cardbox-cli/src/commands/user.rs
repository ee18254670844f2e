//! User profile commands for CLI.

use cardbox_core::{Config, DeckDb, User, ValidationError};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a new user profile
    Create {
        /// Profile name
        name: String,
        /// Set as the default profile
        #[arg(long)]
        default: bool,
    },
    /// List user profiles
    List,
}

pub fn run(action: UserAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = DeckDb::open()?;

    match action {
        UserAction::Create { name, default } => {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyField("name").into());
            }
            if db.find_user_by_name(&name)?.is_some() {
                return Err(format!("user already exists: {name}").into());
            }
            let user = User::new(&name);
            db.create_user(&user)?;

            let mut config = Config::load()?;
            if default || config.default_user.is_none() {
                config.default_user = Some(name);
                config.save()?;
            }

            println!("User created: {}", user.id);
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        UserAction::List => {
            let users = db.list_users()?;
            println!("{}", serde_json::to_string_pretty(&users)?);
        }
    }
    Ok(())
}
