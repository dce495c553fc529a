use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cardgen")]
#[command(about = "Generate language-learning flashcards with a tiered LLM client")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// The `--config` path when given, otherwise `default`.
    pub fn config_file(&self, default: PathBuf) -> PathBuf {
        self.config.clone().unwrap_or(default)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate flashcards from text
    Generate {
        /// Source text
        #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read source text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Language for the back of each card (definitions when omitted)
        #[arg(short, long)]
        language: Option<String>,

        /// Maximum number of cards
        #[arg(short, long)]
        max_cards: Option<u32>,

        /// Force a model tier (economy, balanced, premium)
        #[arg(long)]
        tier: Option<String>,

        /// Tier selection priority (speed, cost, quality)
        #[arg(long)]
        priority: Option<String>,

        /// Content complexity (low, medium, high)
        #[arg(long)]
        complexity: Option<String>,

        /// User id recorded with the request
        #[arg(long)]
        user: Option<String>,
    },

    /// Show which tier would be selected for an input size
    Tier {
        /// Input length in characters
        #[arg(short, long)]
        length: usize,

        /// Tier selection priority (speed, cost, quality)
        #[arg(long)]
        priority: Option<String>,

        /// Content complexity (low, medium, high)
        #[arg(long)]
        complexity: Option<String>,
    },

    /// Print text with sensitive content redacted
    Redact {
        text: String,
    },

    /// Manage the provider API key in the OS keyring
    ApiKey {
        /// Store a new API key
        #[arg(short, long, conflicts_with = "remove")]
        set: Option<String>,

        /// Remove the stored API key
        #[arg(short, long)]
        remove: bool,
    },

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
