use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One line of the display history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Chart artifacts produced while answering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<PathBuf>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            charts: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, charts: Vec<PathBuf>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            charts,
        }
    }
}

/// A question and the answer it produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// Rolling window of recent exchanges fed back into the model's context.
///
/// Holds at most `capacity` exchanges; pushing past the bound evicts the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct MemoryWindow {
    capacity: usize,
    exchanges: VecDeque<Exchange>,
}

impl MemoryWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            exchanges: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.exchanges.len() >= self.capacity {
            self.exchanges.pop_front();
        }
        self.exchanges.push_back(Exchange {
            question: question.into(),
            answer: answer.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    /// The newest `n` exchanges, oldest first
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter().skip(self.exchanges.len().saturating_sub(n))
    }

    /// Render the newest `n` exchanges as a transcript
    pub fn render_tail(&self, n: usize) -> String {
        self.tail(n)
            .map(|e| format!("Human: {}\nAI: {}", e.question, e.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_exceeds_capacity() {
        let mut memory = MemoryWindow::new(10);
        for i in 0..25 {
            memory.push(format!("q{}", i), format!("a{}", i));
            assert!(memory.len() <= 10);
        }
        assert_eq!(memory.len(), 10);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut memory = MemoryWindow::new(3);
        for i in 0..5 {
            memory.push(format!("q{}", i), format!("a{}", i));
        }
        let questions: Vec<_> = memory.iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, ["q2", "q3", "q4"]);
    }

    #[test]
    fn tail_keeps_order_and_bound() {
        let mut memory = MemoryWindow::new(10);
        for i in 0..5 {
            memory.push(format!("q{}", i), format!("a{}", i));
        }
        let transcript = memory.render_tail(3);
        assert_eq!(transcript, "Human: q2\nAI: a2\nHuman: q3\nAI: a3\nHuman: q4\nAI: a4");
        assert_eq!(memory.tail(50).count(), 5);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut memory = MemoryWindow::new(0);
        memory.push("q", "a");
        assert!(memory.is_empty());
    }
}
