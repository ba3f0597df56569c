//! Run journal — one entry per dispatched event, in dispatch order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{EventId, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Handled,
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EventId,
    pub cause: Option<EventId>,
    pub kind: EventKind,
    pub symbol: String,
    pub timestamp: NaiveDate,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EventId) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries of `kind`, in dispatch order.
    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Entries directly produced by the event `id`.
    pub fn effects_of(&self, id: EventId) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |e| e.cause == Some(id))
    }

    /// Position of `id` in dispatch order.
    pub fn position(&self, id: EventId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn dropped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == Outcome::Dropped)
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
