//! Ordering of exported conversations.

use crate::domain::ConversationRecord;

/// Sort newest first by comparing `datetime` as plain strings.
///
/// The sort is stable. Strings of mixed format or precision order
/// lexicographically, not chronologically.
pub fn sort_newest_first(records: &mut [ConversationRecord]) {
    records.sort_by(|a, b| b.datetime().cmp(a.datetime()));
}
