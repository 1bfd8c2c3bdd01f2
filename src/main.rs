//! Chat Archive - Export chat sessions and manage vector stores.
//!
//! Reads every chat session from a MongoDB collection, normalizes it into a
//! flat conversation record, and writes a JSON bundle plus a statistics file.
//! A second command group drives the vector store API (create, upload, poll).
//!
//! QUICK START:
//!   chat-archive export                       # Export to a timestamped file
//!   chat-archive export -o all.json           # Writes all.json + all_stats.json
//!   chat-archive stats --from-file dump.json  # Statistics from a mongoexport dump
//!   chat-archive databases                    # See what the connection can read
//!   chat-archive store create "Docs" --save-env
//!   chat-archive store upload <id> a.pdf b.md --wait

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    default_export_path, expand_upload_paths, format_collections_table, format_stats,
    format_store_info, format_stores_table, save_outcome, ExportOutcome, ExportService,
    ManagerTiming, OutputFormat, VectorStoreManager,
};
use cli::{Cli, Commands, ConfigCommands, SourceArgs, StoreCommands};
use domain::{AppConfig, Clock, DatabaseConfig, PollOutcome, SystemClock};
use infrastructure::{
    database_from_uri, ensure_config_exists, load_config, render_config, JsonDumpSource,
    MongoSessionSource, OpenAiVectorStoreClient,
};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli
        .output_format()
        .map_err(|message| domain::AppError::Config { message })?;

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Export { output, source } => {
            cmd_export(&config, &source, output.as_deref(), format)?;
        }
        Commands::Stats { source } => {
            cmd_stats(&config, &source, format)?;
        }
        Commands::Databases => {
            cmd_databases(&config, format)?;
        }
        Commands::Store(command) => {
            cmd_store(&config, command, format)?;
        }
        Commands::Config(ConfigCommands::Show) => {
            print!("{}", render_config(&config.redacted())?);
        }
        Commands::Config(ConfigCommands::Init) => {
            let path = ensure_config_exists(cli.config.as_deref())?;
            println!("{} Config file: {}", "✓".green().bold(), path.display());
        }
    }

    Ok(())
}

/// Database settings with command-line overrides applied.
fn database_config(config: &AppConfig, source: &SourceArgs) -> DatabaseConfig {
    let mut db = config.database.clone();
    if let Some(database) = &source.database {
        db.database.clone_from(database);
    }
    if let Some(collection) = &source.collection {
        db.collection.clone_from(collection);
    }
    db
}

/// Run the export pipeline against the selected source.
fn run_pipeline(config: &AppConfig, source: &SourceArgs) -> domain::Result<ExportOutcome> {
    let clock = SystemClock;

    if let Some(path) = &source.from_file {
        let dump = JsonDumpSource::new(path);
        return ExportService::new(&dump, &clock).run();
    }

    let db = database_config(config, source);
    let mongo = MongoSessionSource::connect(&db)?;

    if let Some(uri_db) = db.uri.as_deref().and_then(database_from_uri) {
        if uri_db != db.database {
            println!(
                "{} Your URI names database '{}', but '{}' is being read. Set MONGODB_DATABASE={} to use it.",
                "💡".bold(),
                uri_db,
                db.database,
                uri_db
            );
        }
    }

    match mongo.count_sessions() {
        Ok(count) => tracing::info!("Documents in collection: {}", count),
        Err(e) => tracing::warn!("Could not access collection: {}", e),
    }

    ExportService::new(&mongo, &clock).run()
}

/// Export conversations and statistics to files.
fn cmd_export(
    config: &AppConfig,
    source: &SourceArgs,
    output: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let outcome = run_pipeline(config, source)?;

    let path = output.map_or_else(
        || default_export_path(&config.output_dir(), SystemClock.now()),
        Path::to_path_buf,
    );
    let paths = save_outcome(&outcome, &path)?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "conversations_file": paths.bundle,
                    "stats_file": paths.statistics,
                    "exported": outcome.bundle.total_sessions,
                    "skipped": outcome.skipped.len(),
                }))?
            );
        }
        OutputFormat::Table => {
            println!("{}", format_stats(&outcome.statistics));
            println!();
            if !outcome.skipped.is_empty() {
                println!(
                    "{} Skipped {} malformed session(s): {}",
                    "⚠".yellow().bold(),
                    outcome.skipped.len(),
                    outcome
                        .skipped
                        .iter()
                        .map(|s| s.session_id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            println!(
                "{} Exported {} conversations",
                "✓".green().bold(),
                outcome.bundle.total_sessions
            );
            println!("   Main file:  {}", display_abs(&paths.bundle));
            println!("   Stats file: {}", display_abs(&paths.statistics));
        }
    }

    Ok(())
}

/// Show statistics without writing files.
fn cmd_stats(config: &AppConfig, source: &SourceArgs, format: OutputFormat) -> anyhow::Result<()> {
    let outcome = run_pipeline(config, source)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome.statistics)?);
        }
        OutputFormat::Table => {
            println!("{}", format_stats(&outcome.statistics));
            if !outcome.skipped.is_empty() {
                println!("  Skipped sessions: {}", outcome.skipped.len().to_string().red());
            }
        }
    }

    Ok(())
}

/// List databases and collections.
fn cmd_databases(config: &AppConfig, format: OutputFormat) -> anyhow::Result<()> {
    let mongo = MongoSessionSource::connect(&config.database)?;
    let databases = mongo.list_databases()?;
    let collections = mongo.list_collections()?;

    match format {
        OutputFormat::Json => {
            let collections: Vec<_> = collections
                .iter()
                .map(|c| serde_json::json!({ "name": c.name, "documents": c.documents }))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "databases": databases,
                    "collections": collections,
                }))?
            );
        }
        OutputFormat::Table => {
            println!("{}", "📋 Available databases".bold());
            for name in &databases {
                println!("   - {name}");
            }
            println!();
            println!(
                "{} {}",
                "📋 Collections in".bold(),
                config.database.database.cyan()
            );
            println!("{}", format_collections_table(&collections));
        }
    }

    Ok(())
}

/// Vector store commands.
fn cmd_store(
    config: &AppConfig,
    command: StoreCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let api = OpenAiVectorStoreClient::new(&config.vector_store)?;
    let manager = VectorStoreManager::new(
        api,
        SystemClock,
        ManagerTiming::from(&config.vector_store),
    );
    let default_timeout = config.vector_store.timeout_secs;

    match command {
        StoreCommands::Create {
            name,
            description,
            save_env,
        } => {
            let store = manager.create_store(&name, description.as_deref())?;
            print_store(&store, format)?;

            if save_env {
                append_store_id_to_env(Path::new(".env"), &store.id)?;
                println!("{} Vector store ID saved to .env", "💾".bold());
            }
        }
        StoreCommands::Upload {
            store_id,
            files,
            wait,
            timeout,
        } => {
            let files = expand_upload_paths(&files);
            if files.is_empty() {
                bail!("no files to upload");
            }
            println!("📁 Uploading {} files...", files.len());
            let report = manager.upload_files(&files, &store_id);

            for failure in &report.failures {
                println!(
                    "{} {} ({})",
                    "✗".red().bold(),
                    failure.path.display(),
                    failure.reason
                );
            }
            println!(
                "{} Uploaded {} out of {} files",
                "✓".green().bold(),
                report.file_ids.len(),
                report.attempted()
            );

            if wait {
                println!("⏳ Waiting for vector store processing to complete...");
                let timeout = Duration::from_secs(timeout.unwrap_or(default_timeout));
                if !manager.wait_for_processing(&store_id, timeout) {
                    bail!("vector store did not finish processing; check `store info {store_id}`");
                }
                println!("{} Vector store processing completed", "✓".green().bold());
            }
        }
        StoreCommands::Info { store_id } => {
            let store = manager.store_info(&store_id)?;
            print_store(&store, format)?;
        }
        StoreCommands::List => {
            let stores = manager.list_stores()?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stores)?),
                OutputFormat::Table => println!("{}", format_stores_table(&stores)),
            }
        }
        StoreCommands::Wait { store_id, timeout } => {
            wait_for_store(&manager, &store_id, timeout.unwrap_or(default_timeout))?;
        }
    }

    Ok(())
}

fn print_store(store: &domain::VectorStore, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(store)?),
        OutputFormat::Table => println!("{}", format_store_info(store)),
    }
    Ok(())
}

fn wait_for_store<A: domain::VectorStoreApi, C: Clock>(
    manager: &VectorStoreManager<A, C>,
    store_id: &str,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    println!("⏳ Waiting for vector store processing to complete...");

    match manager.poll_until_terminal(store_id, Duration::from_secs(timeout_secs)) {
        PollOutcome::Completed => {
            println!("{} Vector store processing completed", "✓".green().bold());
            Ok(())
        }
        PollOutcome::Failed => bail!("vector store processing failed"),
        PollOutcome::TimedOut => bail!("timed out after {timeout_secs}s waiting for processing"),
        PollOutcome::Error(e) => bail!("could not check vector store status: {e}"),
    }
}

/// Append the store ID to a dotenv file, creating it if needed.
fn append_store_id_to_env(path: &Path, store_id: &str) -> domain::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| domain::AppError::io(format!("Failed to open {}", path.display()), e))?;

    writeln!(file, "\nOPENAI_VECTOR_STORE_ID={store_id}")
        .map_err(|e| domain::AppError::io(format!("Failed to write {}", path.display()), e))
}

fn display_abs(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_database_config_applies_overrides() {
        let config = AppConfig::default();
        let source = SourceArgs {
            database: Some("other".into()),
            collection: None,
            from_file: None,
        };
        let db = database_config(&config, &source);
        assert_eq!(db.database, "other");
        assert_eq!(db.collection, "chats");
    }

    #[test]
    fn test_append_store_id_to_env() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "OPENAI_API_KEY=sk-test").unwrap();

        append_store_id_to_env(&path, "vs_123").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("OPENAI_API_KEY=sk-test"));
        assert!(content.contains("\nOPENAI_VECTOR_STORE_ID=vs_123\n"));
    }

    #[test]
    fn test_missing_uri_fails_before_output() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            export: domain::config::ExportConfig {
                output_dir: Some(dir.path().to_path_buf()),
            },
            ..AppConfig::default()
        };

        let err = cmd_export(&config, &SourceArgs::default(), None, OutputFormat::Table)
            .unwrap_err();
        assert!(err.to_string().contains("MONGODB_URI"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_from_dump_writes_both_files() {
        let dir = tempdir().unwrap();
        let dump = dir.path().join("dump.json");
        std::fs::write(
            &dump,
            r#"[
                {"sessionId": "a", "createdAt": {"$date": "2024-01-01T09:00:00Z"},
                 "messages": [{"role": "user", "content": "hola"}]},
                {"sessionId": "bad", "messages": "oops"},
                {"sessionId": "b", "createdAt": {"$date": "2024-01-02T09:00:00Z"}}
            ]"#,
        )
        .unwrap();

        let source = SourceArgs {
            from_file: Some(dump),
            ..SourceArgs::default()
        };
        let out = dir.path().join("export.json");
        cmd_export(&AppConfig::default(), &source, Some(&out), OutputFormat::Json).unwrap();

        let bundle: domain::ExportBundle =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(bundle.total_sessions, 2);
        assert_eq!(bundle.conversations[0].session_id(), "b");
        assert_eq!(bundle.conversations[1].datetime(), "2024-01-01T09:00:00.000Z");
        assert!(dir.path().join("export_stats.json").exists());
    }
}
