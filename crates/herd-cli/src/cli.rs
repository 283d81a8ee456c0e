use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use herd_core::EntityKind;

#[derive(Parser)]
#[command(name = "herd")]
#[command(about = "Keep cattle records in sync, online or off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local store file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Skip the health check and work from the local store only
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List records (remote when reachable, local mirror otherwise)
    #[command(alias = "ls")]
    List {
        #[arg(value_enum)]
        entity: EntityArg,
        /// Only records for this animal
        #[arg(long, value_name = "ID")]
        cattle_id: Option<String>,
        /// Earliest recording date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        from: Option<String>,
        /// Latest recording date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a record
    #[command(alias = "add")]
    Create {
        #[arg(value_enum)]
        entity: EntityArg,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Change fields of an existing record
    Update {
        #[arg(value_enum)]
        entity: EntityArg,
        /// Record ID (server or temporary)
        id: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Delete a record
    Delete {
        #[arg(value_enum)]
        entity: EntityArg,
        /// Record ID (server or temporary)
        id: String,
    },
    /// Show pending operations and the last sync time
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Push pending operations and refresh every collection
    Sync,
    /// Manage the gateway configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct PayloadArgs {
    /// Record fields as a JSON object
    #[arg(long, value_name = "JSON")]
    pub data: Option<String>,
    /// Single field as key=value (repeatable; values are parsed as JSON when possible)
    #[arg(short, long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum EntityArg {
    Cattle,
    Milk,
    Feeding,
    #[value(alias = "expenses")]
    Expense,
    #[value(alias = "revenues")]
    Revenue,
}

impl From<EntityArg> for EntityKind {
    fn from(value: EntityArg) -> Self {
        match value {
            EntityArg::Cattle => Self::Cattle,
            EntityArg::Milk => Self::Milk,
            EntityArg::Feeding => Self::Feeding,
            EntityArg::Expense => Self::Expense,
            EntityArg::Revenue => Self::Revenue,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update the config file
    Init {
        /// API base URL (e.g. <http://localhost:3001/api>)
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
        /// Bearer token sent with every request
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,
        /// Request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Print the effective configuration
    Show,
}
