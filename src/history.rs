//! Bounded history of executed queries, most recent first.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Default number of queries kept.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// History shared between connections.
pub type SharedHistory = Arc<Mutex<HistoryRing>>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HistoryError {
    #[error("no query at history index {index} (history holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Most-recent-first list of query texts with a fixed capacity.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    queries: VecDeque<String>,
    capacity: usize,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            queries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_SIZE)),
            capacity,
        }
    }

    /// A new ring behind a mutex, ready to hand to connections.
    pub fn shared(capacity: usize) -> SharedHistory {
        Arc::new(Mutex::new(Self::new(capacity)))
    }

    /// Insert at the front, evicting the oldest entry when full.
    pub fn add(&mut self, query: impl Into<String>) {
        self.queries.push_front(query.into());
        self.queries.truncate(self.capacity);
    }

    /// Query at `index`, where 0 is the most recent.
    pub fn get(&self, index: usize) -> Result<&str, HistoryError> {
        self.queries
            .get(index)
            .map(String::as_str)
            .ok_or(HistoryError::IndexOutOfRange {
                index,
                len: self.queries.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queries from most to least recent.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.queries.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.queries.clear();
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
