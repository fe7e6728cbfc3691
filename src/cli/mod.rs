//! Command-line surface: one-shot `ask`, interactive `chat`, and `health`.

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::error::MedSafeError;
use crate::pipeline::{MatchPolicyKind, Pipeline};

pub mod chat;
pub mod health;

#[derive(Parser, Debug)]
#[command(
    name = "medsafe",
    version,
    about = "Most commonly reported side effects for a medication (RxNorm + openFDA)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct TurnArgs {
    /// Adverse-event reports fetched per turn (1-1000, default 100 or MEDSAFE_REPORT_LIMIT)
    #[arg(long)]
    pub limit: Option<usize>,

    /// How a query picks among vocabulary candidates: first-substring or prefer-exact
    #[arg(long, default_value = "first-substring")]
    pub match_policy: String,
}

impl TurnArgs {
    pub fn pipeline(&self) -> Result<Pipeline, MedSafeError> {
        let settings = Settings::from_env()?.with_report_limit(self.limit)?;
        let policy = MatchPolicyKind::from_flag(&self.match_policy)?;
        Pipeline::from_settings(&settings, policy)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single medication query
    Ask {
        /// Medication name (multiple words are joined with spaces)
        name: Vec<String>,

        /// Print the turn as JSON instead of the chat reply
        #[arg(short, long)]
        json: bool,

        #[command(flatten)]
        turn: TurnArgs,
    },
    /// Interactive chat: one medication name per line on stdin
    Chat {
        /// Wait for each reply before reading the next line
        #[arg(long)]
        sequential: bool,

        #[command(flatten)]
        turn: TurnArgs,
    },
    /// Look up a well-known drug in the vocabulary and adverse-event APIs
    Health,
    /// Print version
    Version,
}

/// Runs every command except `chat`, returning the text to print.
///
/// # Errors
///
/// Returns an error when configuration is invalid or an HTTP client cannot be built.
/// A failed lookup is not an error: its reply is part of the output.
pub async fn run(cli: Cli) -> anyhow::Result<String> {
    match cli.command {
        Commands::Ask { name, json, turn } => {
            let pipeline = turn.pipeline()?;
            let result = pipeline.run_turn(&name.join(" ")).await;
            if json {
                Ok(result.to_json()?)
            } else {
                Ok(result.reply())
            }
        }
        Commands::Chat { .. } => Err(MedSafeError::InvalidArgument(
            "chat runs interactively; use cli::chat::run_stdio".into(),
        )
        .into()),
        Commands::Health => {
            let settings = Settings::from_env()?;
            let report = health::check(&settings).await?;
            Ok(report.render())
        }
        Commands::Version => Ok(format!("medsafe {}", env!("CARGO_PKG_VERSION"))),
    }
}
