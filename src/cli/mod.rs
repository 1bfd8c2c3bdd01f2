//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;

/// Chat Archive - Export chat sessions from MongoDB and manage vector stores.
#[derive(Parser, Debug)]
#[command(name = "chat-archive")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (default: ~/.chat-archive/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: table or json.
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where sessions are read from.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Database name (overrides config and MONGODB_DATABASE).
    #[arg(long)]
    pub database: Option<String>,

    /// Collection name (overrides config and MONGODB_COLLECTION).
    #[arg(long)]
    pub collection: Option<String>,

    /// Read sessions from a mongoexport JSON dump instead of MongoDB.
    #[arg(long, conflicts_with_all = ["database", "collection"])]
    pub from_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export all conversations plus a statistics file.
    Export {
        /// Output file path (default: conversations_export_<timestamp>.json).
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show conversation statistics without writing files.
    Stats {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List databases and the collections of the configured database.
    Databases,

    /// Manage vector stores.
    #[command(subcommand)]
    Store(StoreCommands),

    /// Show or create the configuration file.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// Create a new vector store.
    Create {
        /// Store name.
        name: String,

        /// Store description.
        #[arg(short, long)]
        description: Option<String>,

        /// Append OPENAI_VECTOR_STORE_ID=<id> to ./.env.
        #[arg(long)]
        save_env: bool,
    },

    /// Upload files and attach them to a store.
    Upload {
        /// Target store ID.
        store_id: String,

        /// Files or folders to upload, in order; folders are walked recursively.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Wait for the store to finish processing.
        #[arg(short, long)]
        wait: bool,

        /// Seconds to wait (default from config).
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Show details of a store.
    Info {
        /// Store ID.
        store_id: String,
    },

    /// List all stores.
    List,

    /// Wait until a store finishes processing.
    Wait {
        /// Store ID.
        store_id: String,

        /// Seconds to wait (default from config).
        #[arg(short, long)]
        timeout: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration with secrets masked.
    Show,

    /// Write a default config file if none exists.
    Init,
}

impl Cli {
    /// Parse the output format argument.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export_with_dump() {
        let cli = Cli::parse_from([
            "chat-archive",
            "export",
            "-o",
            "out.json",
            "--from-file",
            "dump.json",
        ]);
        match cli.command {
            Commands::Export { output, source } => {
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert_eq!(source.from_file, Some(PathBuf::from("dump.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_dump_conflicts_with_collection() {
        let result = Cli::try_parse_from([
            "chat-archive",
            "stats",
            "--from-file",
            "dump.json",
            "--collection",
            "chats",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_upload_requires_files() {
        assert!(Cli::try_parse_from(["chat-archive", "store", "upload", "vs_1"]).is_err());

        let cli = Cli::parse_from([
            "chat-archive",
            "-v",
            "store",
            "upload",
            "vs_1",
            "a.md",
            "b.pdf",
            "--wait",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Store(StoreCommands::Upload { files, wait, .. }) => {
                assert_eq!(files.len(), 2);
                assert!(wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
