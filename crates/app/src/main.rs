//! `quickcal`: terminal front-end for arithmetic practice.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quickcal_core::generator::{QuestionGenerator, RandomQuestionGenerator};
use quickcal_core::model::{Category, QUESTIONS_PER_SESSION_RANGE, WrongAnswerId};
use services::{AppServices, Clock, HistoryRange};

mod commands;
mod config;
mod prompt;

#[derive(Parser)]
#[command(name = "quickcal", version, about = "Mental arithmetic practice")]
struct Cli {
    /// SQLite database URL or file path
    #[arg(long, global = true, env = "QUICKCAL_DB_URL", default_value = config::DEFAULT_DB_URL)]
    db: String,

    /// Seed for reproducible problem generation
    #[arg(long, global = true, env = "QUICKCAL_SEED")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List practice categories
    Categories,

    /// Run an interactive practice session
    Practice {
        /// Category slug, e.g. two_digit_addition (see `categories`)
        #[arg(default_value = "mixed")]
        category: Category,

        /// Number of problems (5-50); defaults to the saved preference
        #[arg(long, short = 'n', value_parser = question_count())]
        count: Option<u32>,
    },

    /// Browse and maintain the wrong-answer notebook
    Mistakes {
        #[command(subcommand)]
        action: Option<MistakesAction>,
    },

    /// Show completed sessions and statistics
    History {
        /// today, week, month or all
        #[arg(long, default_value = "all")]
        range: HistoryRange,

        /// Only sessions of this category
        #[arg(long)]
        category: Option<Category>,
    },

    /// Show or change preferences
    Settings {
        /// Questions per session (5-50)
        #[arg(long, value_parser = question_count())]
        questions: Option<u32>,

        #[arg(long)]
        sound: Option<bool>,

        #[arg(long)]
        haptics: Option<bool>,

        #[arg(long)]
        auto_submit: Option<bool>,
    },

    /// Delete all sessions and mistakes and restore default preferences
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum MistakesAction {
    /// List notebook entries
    List {
        #[arg(long, value_enum, default_value_t = commands::mistakes::FilterArg::All)]
        filter: commands::mistakes::FilterArg,

        /// Group entries by category
        #[arg(long)]
        grouped: bool,
    },
    /// Mark an entry as mastered
    Master { id: WrongAnswerId },
    /// Answer an entry again
    Retry {
        id: WrongAnswerId,
        /// Answer to check; prompts when omitted
        answer: Option<String>,
    },
    /// Delete mastered entries
    ClearMastered,
    /// Delete every entry
    ClearAll,
}

// Same bounds as the saved preference.
fn question_count() -> clap::builder::RangedI64ValueParser<u32> {
    let (low, high) = QUESTIONS_PER_SESSION_RANGE.into_inner();
    clap::value_parser!(u32).range(i64::from(low)..=i64::from(high))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Command::Categories = cli.command {
        commands::categories::execute();
        return Ok(());
    }

    let generator: Arc<dyn QuestionGenerator> = Arc::new(
        cli.seed
            .map_or_else(RandomQuestionGenerator::from_entropy, RandomQuestionGenerator::seeded),
    );
    let db_url = config::normalize_db_url(&cli.db);
    config::prepare_sqlite_file(&db_url)?;
    tracing::debug!(%db_url, seed = ?cli.seed, "opening storage");

    let app = AppServices::new_sqlite(&db_url, Clock::system(), generator)
        .await
        .with_context(|| format!("failed to open database {db_url}"))?;

    match cli.command {
        Command::Categories => Ok(()),
        Command::Practice { category, count } => {
            commands::practice::execute(&app, category, count).await
        }
        Command::Mistakes { action } => match action {
            None => commands::mistakes::list(&app, commands::mistakes::FilterArg::All, true).await,
            Some(MistakesAction::List { filter, grouped }) => {
                commands::mistakes::list(&app, filter, grouped).await
            }
            Some(MistakesAction::Master { id }) => commands::mistakes::master(&app, id).await,
            Some(MistakesAction::Retry { id, answer }) => {
                commands::mistakes::retry(&app, id, answer).await
            }
            Some(MistakesAction::ClearMastered) => commands::mistakes::clear(&app, false).await,
            Some(MistakesAction::ClearAll) => commands::mistakes::clear(&app, true).await,
        },
        Command::History { range, category } => {
            commands::history::execute(&app, range, category).await
        }
        Command::Settings {
            questions,
            sound,
            haptics,
            auto_submit,
        } => commands::settings::execute(&app, questions, sound, haptics, auto_submit).await,
        Command::Reset { yes } => commands::reset::execute(&app, yes).await,
    }
}
