//! Output formatting for export results and vector stores.
//!
//! Supports a human-readable table view and JSON.

use chrono::DateTime;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{StatisticsReport, VectorStore, VectorStoreStatus};
use crate::infrastructure::CollectionInfo;

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Tables and colored summaries.
    #[default]
    Table,
    /// JSON for programmatic use.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}. Use: table, json")),
        }
    }
}

/// Formats export statistics for display.
pub fn format_stats(stats: &StatisticsReport) -> String {
    let earliest = stats.date_range.earliest.as_deref().unwrap_or("-");
    let latest = stats.date_range.latest.as_deref().unwrap_or("-");

    format!(
        "{}\n  Total sessions: {}\n  Total messages: {}\n  User messages: {}\n  Assistant messages: {}\n  Unique users: {}\n  Unique members: {}\n  Date range: {} to {}",
        "📈 Conversation Statistics".bold(),
        stats.total_sessions.to_string().cyan(),
        stats.total_messages.to_string().cyan(),
        stats.user_messages.to_string().green(),
        stats.assistant_messages.to_string().blue(),
        stats.unique_users.to_string().yellow(),
        stats.unique_members.to_string().yellow(),
        earliest,
        latest
    )
}

/// Formats a table listing of vector stores.
pub fn format_stores_table(stores: &[VectorStore]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Name", "Status", "Files", "Created"]);

    for store in stores {
        table.add_row(vec![
            store.id.clone(),
            truncate(store.name.as_deref().unwrap_or("-"), 30),
            store.status.to_string(),
            format!("{}/{}", store.file_counts.completed, store.file_counts.total),
            format_unix(store.created_at),
        ]);
    }

    table.to_string()
}

/// Formats the details of one vector store.
pub fn format_store_info(store: &VectorStore) -> String {
    let status = match store.status {
        VectorStoreStatus::Completed => store.status.to_string().green(),
        VectorStoreStatus::Failed | VectorStoreStatus::Expired => store.status.to_string().red(),
        _ => store.status.to_string().yellow(),
    };

    let expires = store.expires_after.as_ref().map_or_else(
        || "-".to_string(),
        |e| format!("{} days after {}", e.days, e.anchor),
    );

    format!(
        "{}\n  ID: {}\n  Name: {}\n  Description: {}\n  Status: {}\n  Files: {}\n  Created: {}\n  Expires: {}",
        "📊 Vector Store".bold(),
        store.id.cyan(),
        store.name.as_deref().unwrap_or("-"),
        store.description.as_deref().unwrap_or("-"),
        status,
        store.file_counts,
        format_unix(store.created_at),
        expires
    )
}

/// Formats a database's collections with document counts.
pub fn format_collections_table(collections: &[CollectionInfo]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Collection", "Documents"]);

    for info in collections {
        table.add_row(vec![info.name.clone(), info.documents.to_string()]);
    }

    table.to_string()
}

fn format_unix(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0).map_or_else(
        || "-".to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Truncates a string to max characters with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DateRange, FileCounts};

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world!", 8), "hello...");
        assert_eq!(truncate("¿qué pasó aquí?", 8), "¿qué ...");
    }

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table)));
        assert!(matches!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!("markdown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_stats_shows_range() {
        colored::control::set_override(false);
        let stats = StatisticsReport {
            total_sessions: 2,
            date_range: DateRange {
                earliest: Some("2024-01-01".into()),
                latest: Some("2024-01-02".into()),
            },
            ..StatisticsReport::default()
        };
        let out = format_stats(&stats);
        assert!(out.contains("Total sessions: 2"));
        assert!(out.contains("Date range: 2024-01-01 to 2024-01-02"));
    }

    #[test]
    fn test_stores_table_lists_ids() {
        let stores = vec![VectorStore {
            id: "vs_abc".into(),
            name: None,
            description: None,
            status: VectorStoreStatus::InProgress,
            file_counts: FileCounts {
                completed: 1,
                total: 2,
                ..FileCounts::default()
            },
            created_at: 1_699_061_776,
            expires_after: None,
        }];
        let out = format_stores_table(&stores);
        assert!(out.contains("vs_abc"));
        assert!(out.contains("in_progress"));
        assert!(out.contains("1/2"));
    }
}
