//! Session history: a browser-style stack of URL entries.

use std::fmt::Debug;

use url::Url;

/// State object stored alongside a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavState {
    pub module_id: Option<String>,
}

/// One entry of the history stack.
///
/// `state` is `None` for entries the shell did not create itself (the
/// initial entry, for example); readers fall back to the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub state: Option<NavState>,
    pub url: Url,
}

impl HistoryEntry {
    pub fn new(state: Option<NavState>, url: Url) -> Self {
        Self { state, url }
    }
}

/// Storage behind the navigation synchronizer.
pub trait HistoryBackend: Debug {
    /// Add an entry after the current one, dropping any forward entries.
    fn push(&mut self, entry: HistoryEntry);

    /// Overwrite the current entry in place.
    fn replace(&mut self, entry: HistoryEntry);

    /// The entry the cursor is on.
    fn current(&self) -> &HistoryEntry;

    /// Number of entries in the stack.
    fn len(&self) -> usize;
}

/// In-process history with back/forward traversal.
///
/// `back` and `forward` move the cursor and return the entry arrived at,
/// playing the part of a browser's popstate event. They never add entries.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
    cursor: usize,
}

impl SessionHistory {
    /// Start a history whose only entry is `initial_url`, with no state.
    pub fn new(initial_url: Url) -> Self {
        Self {
            entries: vec![HistoryEntry::new(None, initial_url)],
            cursor: 0,
        }
    }

    /// Step back one entry. Returns `None` at the start of the stack.
    pub fn back(&mut self) -> Option<HistoryEntry> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].clone())
    }

    /// Step forward one entry. Returns `None` at the end of the stack.
    pub fn forward(&mut self) -> Option<HistoryEntry> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Zero-based position of the cursor.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl HistoryBackend for SessionHistory {
    fn push(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;
    }

    fn replace(&mut self, entry: HistoryEntry) {
        self.entries[self.cursor] = entry;
    }

    fn current(&self) -> &HistoryEntry {
        &self.entries[self.cursor]
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
