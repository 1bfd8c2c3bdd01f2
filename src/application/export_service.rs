//! Conversation export pipeline.
//!
//! Fetch → normalize → sort → aggregate, then persist the bundle and its
//! statistics as two JSON files.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::{
    Clock, ExportBundle, Result, SessionSource, SkippedSession, StatisticsReport,
};
use crate::infrastructure::write_json_atomic;

use super::normalizer::{to_iso8601, Normalizer};
use super::sorter::sort_newest_first;
use super::statistics::compute_statistics;

/// Everything one export run produced.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub bundle: ExportBundle,
    pub statistics: StatisticsReport,
    /// Sessions dropped because they could not be normalized.
    pub skipped: Vec<SkippedSession>,
}

/// Files written by `save_outcome`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub bundle: PathBuf,
    pub statistics: PathBuf,
}

/// Runs the export pipeline against a session source.
pub struct ExportService<'a, S, C> {
    source: &'a S,
    clock: &'a C,
}

impl<'a, S: SessionSource, C: Clock> ExportService<'a, S, C> {
    #[must_use]
    pub const fn new(source: &'a S, clock: &'a C) -> Self {
        Self { source, clock }
    }

    /// Fetch and process every session.
    ///
    /// # Errors
    /// Returns the source's error if fetching fails. Individual sessions
    /// that fail to normalize are skipped, not reported as errors.
    pub fn run(&self) -> Result<ExportOutcome> {
        tracing::info!("Fetching all chat sessions");
        let sessions = self.source.fetch_all()?;

        let now = self.clock.now();
        let (mut conversations, skipped) = Normalizer::new(now).normalize_all(&sessions);
        sort_newest_first(&mut conversations);

        let statistics = compute_statistics(&conversations);
        let bundle = ExportBundle::new(conversations, to_iso8601(now), self.source.location());

        tracing::info!(
            fetched = sessions.len(),
            exported = bundle.total_sessions,
            skipped = skipped.len(),
            "Processed conversations"
        );

        Ok(ExportOutcome {
            bundle,
            statistics,
            skipped,
        })
    }
}

/// Timestamped default file name inside `dir`.
#[must_use]
pub fn default_export_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "conversations_export_{}.json",
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Companion statistics path: `_stats` appended to the file stem.
#[must_use]
pub fn stats_path_for(bundle_path: &Path) -> PathBuf {
    let stem = bundle_path
        .file_stem()
        .map_or_else(|| "conversations".into(), |s| s.to_string_lossy());
    let ext = bundle_path
        .extension()
        .map_or_else(|| "json".into(), |e| e.to_string_lossy());

    bundle_path.with_file_name(format!("{stem}_stats.{ext}"))
}

/// Write the bundle to `path` and the statistics next to it.
///
/// # Errors
/// Returns `Io` if either file cannot be written.
pub fn save_outcome(outcome: &ExportOutcome, path: &Path) -> Result<ExportPaths> {
    let stats_path = stats_path_for(path);

    write_json_atomic(path, &outcome.bundle)?;
    tracing::info!(path = %path.display(), "Conversations saved");

    write_json_atomic(&stats_path, &outcome.statistics)?;
    tracing::info!(path = %stats_path.display(), "Statistics saved");

    Ok(ExportPaths {
        bundle: path.to_path_buf(),
        statistics: stats_path,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mongodb::bson::{doc, DateTime as BsonDateTime};
    use tempfile::tempdir;

    use super::*;
    use crate::domain::{AppError, RawSession, SourceLocation, ROLE_ASSISTANT, ROLE_USER};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }

        fn sleep(&self, _: Duration) {}
    }

    fn clock() -> FixedClock {
        FixedClock(DateTime::from_timestamp(1_717_243_200, 0).unwrap())
    }

    struct MemorySource(Vec<RawSession>);

    impl SessionSource for MemorySource {
        fn fetch_all(&self) -> Result<Vec<RawSession>> {
            Ok(self.0.clone())
        }

        fn location(&self) -> SourceLocation {
            SourceLocation {
                database: "testdb".into(),
                collection: "chats".into(),
            }
        }
    }

    struct DownSource;

    impl SessionSource for DownSource {
        fn fetch_all(&self) -> Result<Vec<RawSession>> {
            Err(AppError::Connectivity {
                message: "server selection timeout".into(),
                source: None,
            })
        }

        fn location(&self) -> SourceLocation {
            SourceLocation {
                database: "testdb".into(),
                collection: "chats".into(),
            }
        }
    }

    fn sample_sessions() -> Vec<RawSession> {
        vec![
            RawSession(doc! {
                "sessionId": "jan-03",
                "createdAt": "2024-01-03T09:00:00.000Z",
                "username": "ana",
                "messages": [
                    { "role": "user", "content": "¿Cuál es la probabilidad?" },
                    { "role": "assistant", "content": "Un medio." },
                ],
            }),
            RawSession(doc! {
                "sessionId": "jan-01",
                "createdAt": BsonDateTime::from_millis(1_704_099_600_000), // 2024-01-01T09:00:00Z
                "member": "gold",
                "messages": [ { "role": "user", "content": "hi" } ],
            }),
            RawSession(doc! { "sessionId": "broken", "messages": { "role": "user" } }),
            RawSession(doc! {
                "sessionId": "jan-02",
                "createdAt": "2024-01-02T09:00:00.000Z",
                "username": "ben",
            }),
        ]
    }

    #[test]
    fn test_run_sorts_and_skips_bad_sessions() {
        let source = MemorySource(sample_sessions());
        let clock = clock();
        let outcome = ExportService::new(&source, &clock).run().unwrap();

        let ids: Vec<_> = outcome
            .bundle
            .conversations
            .iter()
            .map(|c| c.session_id())
            .collect();
        assert_eq!(ids, vec!["jan-03", "jan-02", "jan-01"]);
        assert_eq!(outcome.bundle.total_sessions, 3);
        assert_eq!(outcome.bundle.export_timestamp, "2024-06-01T12:00:00.000Z");
        assert_eq!(outcome.bundle.database_info.database, "testdb");

        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].session_id, "broken");

        assert_eq!(outcome.statistics.total_sessions, 3);
        assert_eq!(outcome.statistics.total_messages, 3);
        assert_eq!(outcome.statistics.user_messages, 2);
        assert_eq!(outcome.statistics.assistant_messages, 1);
        assert_eq!(outcome.statistics.unique_users, 2);
        assert_eq!(outcome.statistics.unique_members, 1);
        assert_eq!(
            outcome.statistics.date_range.latest.as_deref(),
            Some("2024-01-03T09:00:00.000Z")
        );
    }

    #[test]
    fn test_run_propagates_connectivity_error() {
        let clock = clock();
        let err = ExportService::new(&DownSource, &clock).run().unwrap_err();
        assert!(matches!(err, AppError::Connectivity { .. }));
    }

    #[test]
    fn test_empty_collection() {
        let source = MemorySource(Vec::new());
        let clock = clock();
        let outcome = ExportService::new(&source, &clock).run().unwrap();

        assert!(outcome.bundle.conversations.is_empty());
        assert_eq!(outcome.statistics.total_sessions, 0);
        assert!(outcome.statistics.date_range.earliest.is_none());
    }

    #[test]
    fn test_saved_bundle_round_trips() {
        let dir = tempdir().unwrap();
        let source = MemorySource(sample_sessions());
        let clock = clock();
        let outcome = ExportService::new(&source, &clock).run().unwrap();

        let paths = save_outcome(&outcome, &dir.path().join("export.json")).unwrap();
        assert_eq!(paths.statistics, dir.path().join("export_stats.json"));

        let content = std::fs::read_to_string(&paths.bundle).unwrap();
        assert!(content.contains("¿Cuál es la probabilidad?"));

        let parsed: ExportBundle = serde_json::from_str(&content).unwrap();
        let recomputed = compute_statistics(&parsed.conversations);

        assert_eq!(parsed.conversations.len(), outcome.bundle.conversations.len());
        for (read, written) in parsed.conversations.iter().zip(&outcome.bundle.conversations) {
            assert_eq!(read.message_count(), written.message_count());
        }
        assert_eq!(recomputed.total_messages, outcome.statistics.total_messages);
        assert_eq!(recomputed.user_messages, outcome.statistics.user_messages);
        assert_eq!(
            recomputed.assistant_messages,
            outcome.statistics.assistant_messages
        );

        let stats: StatisticsReport =
            serde_json::from_str(&std::fs::read_to_string(&paths.statistics).unwrap()).unwrap();
        assert_eq!(stats, outcome.statistics);
        assert_eq!(
            stats.user_messages + stats.assistant_messages,
            parsed
                .conversations
                .iter()
                .map(|c| c.count_role(ROLE_USER) + c.count_role(ROLE_ASSISTANT))
                .sum::<usize>()
        );
    }

    #[test]
    fn test_default_export_path() {
        let now = DateTime::from_timestamp(1_704_276_005, 0).unwrap();
        assert_eq!(
            default_export_path(Path::new("out"), now),
            PathBuf::from("out/conversations_export_20240103_100005.json")
        );
    }

    #[test]
    fn test_stats_path_for() {
        assert_eq!(
            stats_path_for(Path::new("dir/all_conversations.json")),
            PathBuf::from("dir/all_conversations_stats.json")
        );
        assert_eq!(
            stats_path_for(Path::new("report")),
            PathBuf::from("report_stats.json")
        );
    }
}
