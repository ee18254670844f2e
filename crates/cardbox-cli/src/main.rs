use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;

#[derive(Parser)]
#[command(name = "cardbox", version, about = "Cardbox CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User profile management
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },
    /// Deck management
    Deck {
        #[command(subcommand)]
        action: commands::deck::DeckAction,
    },
    /// Card management
    Card {
        #[command(subcommand)]
        action: commands::card::CardAction,
    },
    /// Grade a card and reschedule it
    Review {
        /// Card ID
        card_id: String,
        /// Recall grade: again, hard, good, or easy
        grade: String,
        /// Optional note stored with the review
        #[arg(long)]
        note: Option<String>,
        /// Acting user profile (defaults to default_user in config)
        #[arg(long)]
        user: Option<String>,
    },
    /// List due cards, most overdue first
    Due {
        /// Acting user profile (defaults to default_user in config)
        #[arg(long)]
        user: Option<String>,
        /// Cap the number of cards returned
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Review statistics
    Stats {
        /// Acting user profile (defaults to default_user in config)
        #[arg(long)]
        user: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::User { action } => commands::user::run(action),
        Commands::Deck { action } => commands::deck::run(action),
        Commands::Card { action } => commands::card::run(action),
        Commands::Review {
            card_id,
            grade,
            note,
            user,
        } => commands::review::run_review(card_id, grade, note, user),
        Commands::Due { user, limit } => commands::review::run_due(user, limit),
        Commands::Stats { user } => commands::stats::run(user),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "cardbox", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
