use serde::Serialize;

/// Number of history records shown in the sidebar and the recent-queries box.
pub const HISTORY_DISPLAY_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub query: String,
    pub summary: String,
}

/// Queries answered during this process, newest first. Never written to disk.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<Q: Into<String>, S: Into<String>>(&mut self, query: Q, summary: S) {
        self.entries.insert(
            0,
            HistoryEntry {
                query: query.into(),
                summary: summary.into(),
            },
        );
    }

    pub fn recent(&self) -> &[HistoryEntry] {
        let n = self.entries.len().min(HISTORY_DISPLAY_LIMIT);
        &self.entries[..n]
    }

    pub fn get(&self, idx: usize) -> Option<&HistoryEntry> {
        self.entries.get(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
