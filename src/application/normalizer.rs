//! Session normalization.
//!
//! Turns loosely typed session documents into `ConversationRecord`s. Every
//! defaulted field is described by a `FieldRule` constant so the defaulting
//! policy can be read (and tested) as data.

use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::{Bson, Document};

use crate::domain::{
    AppError, ConversationRecord, NormalizedMessage, RawSession, Result, SkippedSession,
};

/// What a field falls back to when the document lacks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// A fixed string.
    Literal(&'static str),
    /// Wall-clock time of the export run.
    Now,
    /// Creation time of the enclosing session.
    SessionCreated,
    /// No value.
    Absent,
}

/// Which stored values a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any value, coerced to its string form.
    Any,
    /// Non-empty strings only; anything else counts as missing.
    Text,
}

/// A document key and its fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub key: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
}

pub const SESSION_ID: FieldRule = FieldRule {
    key: "sessionId",
    kind: FieldKind::Any,
    default: FieldDefault::Literal("unknown"),
};

pub const CREATED_AT: FieldRule = FieldRule {
    key: "createdAt",
    kind: FieldKind::Any,
    default: FieldDefault::Now,
};

pub const USERNAME: FieldRule = FieldRule {
    key: "username",
    kind: FieldKind::Text,
    default: FieldDefault::Absent,
};

pub const MEMBER: FieldRule = FieldRule {
    key: "member",
    kind: FieldKind::Text,
    default: FieldDefault::Absent,
};

pub const ROLE: FieldRule = FieldRule {
    key: "role",
    kind: FieldKind::Any,
    default: FieldDefault::Literal("unknown"),
};

pub const CONTENT: FieldRule = FieldRule {
    key: "content",
    kind: FieldKind::Any,
    default: FieldDefault::Literal(""),
};

pub const MESSAGE_TIMESTAMP: FieldRule = FieldRule {
    key: "timestamp",
    kind: FieldKind::Any,
    default: FieldDefault::SessionCreated,
};

/// Key of the message array; absent or null means no messages.
pub const MESSAGES_KEY: &str = "messages";

/// Values the non-literal defaults resolve against.
#[derive(Debug, Clone, Copy)]
pub struct DefaultContext<'a> {
    pub now: &'a str,
    pub session_created: Option<&'a str>,
}

impl FieldDefault {
    fn resolve(self, ctx: &DefaultContext<'_>) -> Option<String> {
        match self {
            Self::Literal(s) => Some(s.to_string()),
            Self::Now => Some(ctx.now.to_string()),
            Self::SessionCreated => ctx.session_created.map(str::to_string),
            Self::Absent => None,
        }
    }
}

impl FieldRule {
    /// Read the field as a string, without applying the default.
    #[must_use]
    pub fn extract(&self, doc: &Document) -> Option<String> {
        let value = doc.get(self.key)?;
        match self.kind {
            FieldKind::Any => coerce_to_string(value),
            FieldKind::Text => match value {
                Bson::String(s) if !s.is_empty() => Some(s.clone()),
                _ => None,
            },
        }
    }

    /// Read the field, falling back to the rule's default.
    #[must_use]
    pub fn resolve(&self, doc: &Document, ctx: &DefaultContext<'_>) -> Option<String> {
        self.extract(doc).or_else(|| self.default.resolve(ctx))
    }
}

/// Format a UTC instant the way exported timestamps are written.
#[must_use]
pub fn to_iso8601(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Coerce a stored value to its exported string form.
///
/// Temporal values become ISO-8601; strings pass through untouched; null
/// counts as missing.
#[must_use]
pub fn coerce_to_string(value: &Bson) -> Option<String> {
    match value {
        Bson::Null | Bson::Undefined => None,
        Bson::String(s) => Some(s.clone()),
        Bson::DateTime(dt) => Some(
            DateTime::from_timestamp_millis(dt.timestamp_millis())
                .map_or_else(|| value.to_string(), to_iso8601),
        ),
        Bson::Timestamp(ts) => Some(
            DateTime::from_timestamp(i64::from(ts.time), 0)
                .map_or_else(|| value.to_string(), to_iso8601),
        ),
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        other => Some(other.to_string()),
    }
}

/// Normalizes raw sessions captured during one export run.
#[derive(Debug, Clone)]
pub struct Normalizer {
    now: String,
}

impl Normalizer {
    /// `now` is used for sessions without a creation time.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: to_iso8601(now),
        }
    }

    /// Normalize one session.
    ///
    /// # Errors
    /// Returns `InvalidRecord` if `messages` is not an array or an entry is
    /// not a document.
    pub fn normalize(&self, raw: &RawSession) -> Result<ConversationRecord> {
        let doc = raw.document();
        let base = DefaultContext {
            now: &self.now,
            session_created: None,
        };

        let session_id = SESSION_ID
            .resolve(doc, &base)
            .unwrap_or_else(|| "unknown".to_string());
        let created_at = CREATED_AT
            .resolve(doc, &base)
            .unwrap_or_else(|| self.now.clone());

        let ctx = DefaultContext {
            now: &self.now,
            session_created: Some(&created_at),
        };

        let messages = match doc.get(MESSAGES_KEY) {
            None | Some(Bson::Null) => Vec::new(),
            Some(Bson::Array(entries)) => entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| match entry {
                    Bson::Document(message) => Ok(normalize_message(message, &ctx)),
                    other => Err(AppError::invalid_record(
                        &session_id,
                        format!(
                            "message {idx} is {:?}, expected a document",
                            other.element_type()
                        ),
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(AppError::invalid_record(
                    &session_id,
                    format!(
                        "`{MESSAGES_KEY}` is {:?}, expected an array",
                        other.element_type()
                    ),
                ))
            }
        };

        let username = USERNAME.resolve(doc, &ctx);
        let member = MEMBER.resolve(doc, &ctx);

        Ok(ConversationRecord::new(session_id, created_at, messages, username, member))
    }

    /// Normalize every session, skipping the ones that fail.
    ///
    /// Skipped sessions are logged and returned alongside the records.
    #[must_use]
    pub fn normalize_all(
        &self,
        sessions: &[RawSession],
    ) -> (Vec<ConversationRecord>, Vec<SkippedSession>) {
        let mut records = Vec::with_capacity(sessions.len());
        let mut skipped = Vec::new();

        for raw in sessions {
            match self.normalize(raw) {
                Ok(record) => records.push(record),
                Err(e) => {
                    let session_id = SESSION_ID
                        .extract(raw.document())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::warn!(session_id = %session_id, "Skipping session: {}", e);
                    skipped.push(SkippedSession {
                        session_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            normalized = records.len(),
            skipped = skipped.len(),
            "Normalized sessions"
        );

        (records, skipped)
    }
}

fn normalize_message(message: &Document, ctx: &DefaultContext<'_>) -> NormalizedMessage {
    NormalizedMessage {
        role: ROLE.resolve(message, ctx).unwrap_or_default(),
        message: CONTENT.resolve(message, ctx).unwrap_or_default(),
        timestamp: MESSAGE_TIMESTAMP.resolve(message, ctx).unwrap_or_default(),
    }
}
