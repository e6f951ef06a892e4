//! Context-window bookkeeping for chat history.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::toon;

pub const DEFAULT_MAX_TOKENS: usize = 2048;
pub const DEFAULT_KEEP_LAST: usize = 5;
const TOPIC_WORDS: usize = 8;
const MAX_TOPICS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn tokens(&self) -> usize {
        estimate_tokens(self.role.as_str()) + estimate_tokens(&self.content)
    }
}

/// Rough token count: one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

pub fn total_tokens(turns: &[ChatTurn]) -> usize {
    turns.iter().map(ChatTurn::tokens).sum()
}

#[derive(Debug, Serialize)]
struct ConversationSummary {
    #[serde(rename = "type")]
    kind: &'static str,
    messages_count: usize,
    user_turns: usize,
    assistant_turns: usize,
    topics: Vec<String>,
}

fn summarize(older: &[ChatTurn]) -> ConversationSummary {
    let topics = older
        .iter()
        .filter(|t| t.role == Role::User)
        .take(MAX_TOPICS)
        .map(|t| t.content.split_whitespace().take(TOPIC_WORDS).collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
        .collect();
    ConversationSummary {
        kind: "conversation_summary",
        messages_count: older.len(),
        user_turns: older.iter().filter(|t| t.role == Role::User).count(),
        assistant_turns: older.iter().filter(|t| t.role == Role::Assistant).count(),
        topics,
    }
}

/// Fold everything but the last `keep_last` turns into one system turn once
/// the history goes over `max_tokens`.
pub fn optimize_history(turns: &[ChatTurn], max_tokens: usize, keep_last: usize) -> Vec<ChatTurn> {
    let current = total_tokens(turns);
    if current <= max_tokens || turns.len() <= keep_last {
        return turns.to_vec();
    }

    let split = turns.len() - keep_last;
    let (older, recent) = turns.split_at(split);
    let summary = match toon::encode(&summarize(older)) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to encode history summary");
            format!("{} earlier messages", older.len())
        }
    };

    let mut out = Vec::with_capacity(keep_last + 1);
    out.push(ChatTurn::system(format!("Previous context summary (TOON format):\n{summary}")));
    out.extend_from_slice(recent);

    info!(before = current, after = total_tokens(&out), "history optimized");
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContextStats {
    pub message_count: usize,
    pub estimated_tokens: usize,
    pub utilization_percent: f64,
}

pub fn context_stats(turns: &[ChatTurn], max_tokens: usize) -> ContextStats {
    let tokens = total_tokens(turns);
    let pct = if max_tokens == 0 {
        0.0
    } else {
        (tokens as f64 / max_tokens as f64 * 1000.0).round() / 10.0
    };
    ContextStats {
        message_count: turns.len(),
        estimated_tokens: tokens,
        utilization_percent: pct,
    }
}
