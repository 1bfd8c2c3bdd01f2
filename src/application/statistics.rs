//! Summary statistics over normalized conversations.

use std::collections::BTreeSet;

use crate::domain::{ConversationRecord, DateRange, StatisticsReport, ROLE_ASSISTANT, ROLE_USER};

/// Compute statistics for a set of conversations.
///
/// The result does not depend on the order of `records`.
#[must_use]
pub fn compute_statistics(records: &[ConversationRecord]) -> StatisticsReport {
    let users: BTreeSet<String> = records
        .iter()
        .filter_map(ConversationRecord::username)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect();

    let members: BTreeSet<String> = records
        .iter()
        .filter_map(ConversationRecord::member)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();

    let date_range = DateRange {
        earliest: records.iter().map(ConversationRecord::datetime).min().map(str::to_string),
        latest: records.iter().map(ConversationRecord::datetime).max().map(str::to_string),
    };

    StatisticsReport {
        total_sessions: records.len(),
        total_messages: records.iter().map(ConversationRecord::message_count).sum(),
        user_messages: records.iter().map(|r| r.count_role(ROLE_USER)).sum(),
        assistant_messages: records.iter().map(|r| r.count_role(ROLE_ASSISTANT)).sum(),
        unique_users: users.len(),
        unique_members: members.len(),
        users,
        members,
        date_range,
    }
}
