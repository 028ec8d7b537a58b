//! Conversation history — a bounded FIFO of turns for one session.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use gon_core::types::{Message, Role};

/// Turns kept per session; older turns are dropped.
pub const HISTORY_CAPACITY: usize = 10;

/// Turns rendered by [`ConversationHistory::context`].
const CONTEXT_TURNS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct ConversationHistory {
    entries: VecDeque<HistoryEntry>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
        }
    }

    /// Append a turn, dropping the oldest past [`HISTORY_CAPACITY`].
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.entries.push_back(HistoryEntry {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// All turns as chat messages, oldest first.
    pub fn as_messages(&self) -> Vec<Message> {
        self.entries
            .iter()
            .map(|e| Message {
                role: e.role,
                content: e.content.clone(),
            })
            .collect()
    }

    /// The last five turns as `role: content` lines under a header, or an
    /// empty string when there is no history.
    pub fn context(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let skip = self.entries.len().saturating_sub(CONTEXT_TURNS);
        let lines: Vec<String> = self
            .entries
            .iter()
            .skip(skip)
            .map(|e| format!("{}: {}", e.role, e.content))
            .collect();
        format!("Contexto da conversa recente:\n{}", lines.join("\n"))
    }
}
