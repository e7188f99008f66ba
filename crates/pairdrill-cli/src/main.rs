//! pairdrill CLI: the user-facing command-line interface.

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pairdrill_core::model::{Direction, QuizMode};
use pairdrill_core::quiz::Order;

mod commands;
mod console;
mod context;

use context::DeckArgs;

#[derive(Parser)]
#[command(
    name = "pairdrill",
    version,
    about = "Memorize A-B pairs from spreadsheets and word lists"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and sample deck
    Init,

    /// Show the current deck and mistake book
    Info {
        #[command(flatten)]
        deck: DeckArgs,
    },

    /// Print the first rows of a deck file
    Preview {
        #[command(flatten)]
        deck: DeckArgs,

        /// Rows to show
        #[arg(long, default_value = "30")]
        rows: usize,
    },

    /// Browse the deck as flashcards
    Flash {
        #[command(flatten)]
        deck: DeckArgs,
    },

    /// Run a quiz: choice, fill, or true-false
    Quiz {
        #[command(flatten)]
        deck: DeckArgs,

        /// Question type: choice, fill, true-false, review
        #[arg(long, default_value = "choice")]
        mode: QuizMode,

        /// Which side is asked: a2b, b2a, random
        #[arg(long)]
        direction: Option<Direction>,

        /// Options per multiple-choice question (2-8)
        #[arg(long)]
        choices: Option<usize>,

        /// Question order: random, shuffled, sequential
        #[arg(long)]
        order: Option<Order>,

        /// Stop after this many questions
        #[arg(long)]
        count: Option<usize>,

        /// Only ask items that have active mistakes
        #[arg(long)]
        wrong_only: bool,
    },

    /// Weighted true/false review of past mistakes
    Review {
        #[command(flatten)]
        deck: DeckArgs,
    },

    /// Inspect and maintain the mistake book
    Mistakes {
        /// list, dedup, purge, or clear
        #[arg(value_enum)]
        action: commands::mistakes::MistakesAction,

        #[command(flatten)]
        deck: DeckArgs,
    },

    /// Interactive numbered menu (default)
    Menu {
        #[command(flatten)]
        deck: DeckArgs,
    },
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pairdrill=warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Menu {
        deck: DeckArgs::default(),
    }) {
        Commands::Init => commands::init::execute(),
        Commands::Info { deck } => commands::info::execute(deck),
        Commands::Preview { deck, rows } => commands::preview::execute(deck, rows),
        Commands::Flash { deck } => commands::flash::execute(deck),
        Commands::Quiz {
            deck,
            mode,
            direction,
            choices,
            order,
            count,
            wrong_only,
        } => commands::quiz::execute(
            deck,
            commands::quiz::QuizOptions {
                mode,
                direction,
                choices,
                order,
                count,
                wrong_only,
            },
        ),
        Commands::Review { deck } => commands::review::execute(deck),
        Commands::Mistakes { action, deck } => commands::mistakes::execute(deck, action),
        Commands::Menu { deck } => commands::menu::execute(deck),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
