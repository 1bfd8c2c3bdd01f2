//! Domain models for exported chat data.
//!
//! Raw session documents come from the store as loosely typed BSON; everything
//! below is the canonical, type-stable shape written to the export files.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Role value counted as a user message.
pub const ROLE_USER: &str = "user";

/// Role value counted as an assistant message.
pub const ROLE_ASSISTANT: &str = "assistant";

/// A session document exactly as stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSession(pub mongodb::bson::Document);

impl RawSession {
    /// Borrow the underlying document.
    #[must_use]
    pub const fn document(&self) -> &mongodb::bson::Document {
        &self.0
    }
}

impl From<mongodb::bson::Document> for RawSession {
    fn from(doc: mongodb::bson::Document) -> Self {
        Self(doc)
    }
}

/// A single message after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    /// Free-form role; usually `user`, `assistant` or `unknown`.
    pub role: String,
    /// Text content, possibly empty.
    pub message: String,
    /// ISO-8601 timestamp, or the raw string the store held.
    pub timestamp: String,
}

/// A canonical conversation record.
///
/// `message_count` is derived from `messages` at construction and never
/// changes afterwards, so the fields are only reachable through accessors.
/// Deserialization rejects a `messageCount` that disagrees with `messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RecordFields")]
pub struct ConversationRecord {
    session_id: String,
    datetime: String,
    messages: Vec<NormalizedMessage>,
    username: Option<String>,
    member: Option<String>,
    message_count: usize,
}

impl ConversationRecord {
    #[must_use]
    pub fn new(
        session_id: String,
        datetime: String,
        messages: Vec<NormalizedMessage>,
        username: Option<String>,
        member: Option<String>,
    ) -> Self {
        let message_count = messages.len();
        Self {
            session_id,
            datetime,
            messages,
            username,
            member,
            message_count,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Creation time as stored; compared as a plain string.
    #[must_use]
    pub fn datetime(&self) -> &str {
        &self.datetime
    }

    #[must_use]
    pub fn messages(&self) -> &[NormalizedMessage] {
        &self.messages
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    #[must_use]
    pub const fn message_count(&self) -> usize {
        self.message_count
    }

    /// Count messages whose role matches exactly.
    #[must_use]
    pub fn count_role(&self, role: &str) -> usize {
        self.messages().iter().filter(|m| m.role == role).count()
    }
}

/// Wire shape of a record before the count is checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordFields {
    session_id: String,
    datetime: String,
    messages: Vec<NormalizedMessage>,
    username: Option<String>,
    member: Option<String>,
    message_count: usize,
}

impl TryFrom<RecordFields> for ConversationRecord {
    type Error = String;

    fn try_from(fields: RecordFields) -> Result<Self, Self::Error> {
        if fields.message_count != fields.messages.len() {
            return Err(format!(
                "messageCount is {} but {} messages are present",
                fields.message_count,
                fields.messages.len()
            ));
        }
        Ok(Self::new(
            fields.session_id,
            fields.datetime,
            fields.messages,
            fields.username,
            fields.member,
        ))
    }
}

/// Where the exported sessions came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub database: String,
    pub collection: String,
}

/// The conversations file written by an export run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportBundle {
    /// Sorted by `datetime`, newest first.
    pub conversations: Vec<ConversationRecord>,
    pub total_sessions: usize,
    pub export_timestamp: String,
    pub database_info: SourceLocation,
}

impl ExportBundle {
    #[must_use]
    pub fn new(
        conversations: Vec<ConversationRecord>,
        export_timestamp: String,
        database_info: SourceLocation,
    ) -> Self {
        Self {
            total_sessions: conversations.len(),
            conversations,
            export_timestamp,
            database_info,
        }
    }
}

/// Earliest and latest `datetime` strings of an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

/// Summary statistics written next to the bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub total_sessions: usize,
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub unique_users: usize,
    pub unique_members: usize,
    pub users: BTreeSet<String>,
    pub members: BTreeSet<String>,
    pub date_range: DateRange,
}

/// A session dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSession {
    pub session_id: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: &str) -> NormalizedMessage {
        NormalizedMessage {
            role: role.to_string(),
            message: "hi".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_message_count_matches_messages() {
        let record = ConversationRecord::new(
            "s1".into(),
            "2024-01-01T00:00:00.000Z".into(),
            vec![message("user"), message("assistant"), message("system")],
            None,
            None,
        );
        assert_eq!(record.message_count(), 3);
        assert_eq!(record.count_role(ROLE_USER), 1);
        assert_eq!(record.count_role("User"), 0);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = ConversationRecord::new(
            "s1".into(),
            "2024-01-01".into(),
            vec![message("user")],
            Some("ana".into()),
            None,
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["messageCount"], 1);
        assert!(json["member"].is_null());
    }

    #[test]
    fn test_record_rejects_inconsistent_count() {
        let json = r#"{"sessionId": "s1", "datetime": "2024-01-01", "messages": [],
                       "username": null, "member": null, "messageCount": 5}"#;
        let err = serde_json::from_str::<ConversationRecord>(json).unwrap_err();
        assert!(err.to_string().contains("messageCount is 5"));

        let record = ConversationRecord::new(
            "s1".into(),
            "2024-01-01".into(),
            vec![message("user")],
            None,
            Some("gold".into()),
        );
        let round_trip: ConversationRecord =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(round_trip, record);
    }

    #[test]
    fn test_bundle_total_matches_conversations() {
        let bundle = ExportBundle::new(
            Vec::new(),
            "2024-01-01T00:00:00Z".into(),
            SourceLocation {
                database: "db".into(),
                collection: "chats".into(),
            },
        );
        assert_eq!(bundle.total_sessions, 0);
    }
}
