use std::collections::BTreeSet;

use serde::Deserialize;

use super::LogEntry;

/// Audit screen filters. Blank fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogFilter {
    /// Substring of email, details or IP (case-insensitive).
    #[serde(default)]
    pub q: String,
    /// Substring of the action label (case-insensitive).
    #[serde(default)]
    pub action: String,
    /// `YYYY-MM-DD` of the entry timestamp (UTC).
    #[serde(default)]
    pub date: String,
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        let q = self.q.trim().to_lowercase();
        if !q.is_empty() {
            let hit = [&entry.user_email, &entry.details, &entry.ip_address]
                .iter()
                .any(|field| field.to_lowercase().contains(&q));
            if !hit {
                return false;
            }
        }

        let action = self.action.trim().to_lowercase();
        if !action.is_empty() && !entry.action.to_lowercase().contains(&action) {
            return false;
        }

        let date = self.date.trim();
        if !date.is_empty() && entry.created_at.format("%Y-%m-%d").to_string() != date {
            return false;
        }

        true
    }

    pub fn apply(&self, entries: Vec<LogEntry>) -> Vec<LogEntry> {
        entries.into_iter().filter(|e| self.matches(e)).collect()
    }
}

/// Sorted distinct action labels, for the action selector.
pub fn unique_actions(entries: &[LogEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.action.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
