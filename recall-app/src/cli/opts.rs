use clap::{Parser, Subcommand, ValueEnum};
use recall_core::SourceType;
use std::path::PathBuf;

#[derive(Debug, Clone, ValueEnum)]
pub enum Backend {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SourceKind {
    Milestone,
    Concept,
}

impl From<SourceKind> for SourceType {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Milestone => SourceType::Milestone,
            SourceKind::Concept => SourceType::Concept,
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(name = "recall", version, about = "Recall CLI: spaced-repetition study over timeline content")]
pub struct Cli {
    /// Storage backend
    #[arg(long, value_enum, default_value_t = Backend::Local)]
    pub backend: Backend,

    /// Store file path (defaults to the app data dir)
    #[arg(long)]
    pub store_path: Option<PathBuf>,

    /// Base URL of the backend API when --backend remote
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub api_url: String,

    /// Session id for the backend API when --backend remote
    #[arg(long)]
    pub session: Option<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
    /// Pack operations
    #[command(subcommand)]
    Pack(PackCmd),
    /// Grade a card (quality 0-5)
    Review {
        card_id: String,
        quality: u8,
    },
    /// Revert the most recent review
    Undo { card_id: String },
    /// Log study minutes for today
    StudyTime { minutes: u32 },
    /// Show study statistics
    Stats,
    /// Delete all cards and custom packs, reinitialize defaults
    Reset,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    /// Save a card for a content source
    Add {
        #[arg(value_enum)]
        source: SourceKind,
        source_id: String,
        /// Extra packs (id or name) beyond the defaults
        #[arg(long = "pack")]
        packs: Vec<String>,
    },
    /// List all cards
    List,
    /// List due cards
    Due {
        #[arg(long)]
        pack: Option<String>,
    },
    Rm {
        card_id: String,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum PackCmd {
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "#6366f1")]
        color: String,
    },
    List,
    Rename { pack: String, name: String },
    Rm { pack: String },
    /// Add a card to a pack
    AddCard { card_id: String, pack: String },
    /// Remove a card from a pack
    RmCard { card_id: String, pack: String },
}
