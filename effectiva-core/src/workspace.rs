//! Everything a session mutates, owned in one place and passed by reference.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::capture::CaptureLog;
use crate::context::ChatTurn;
use crate::mode::ContextState;
use crate::store::{EventStore, TaskStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub tasks: TaskStore,
    #[serde(default)]
    pub events: EventStore,
    #[serde(default)]
    pub captures: CaptureLog,
    #[serde(default)]
    pub context: ContextState,
    /// Chat history, kept trimmed by the chat loop.
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

impl Workspace {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            context: ContextState::new(now),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Importance;
    use crate::time::parse_iso;

    #[test]
    fn test_survives_json() {
        let now = parse_iso("2026-03-01T08:00").unwrap();
        let mut ws = Workspace::new(now);
        ws.tasks.create("DBMS sheet", "", Importance::High, "study", None, now);
        ws.captures.note("bring charger", Default::default(), now);
        ws.context.switch("study", None, now).unwrap();

        let json = serde_json::to_string(&ws).unwrap();
        let back: Workspace = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tasks.len(), 1);
        assert_eq!(back.captures.len(), 1);
        assert_eq!(back.context.mode(), crate::mode::ContextMode::Study);
    }

    #[test]
    fn test_empty_object_loads() {
        let ws: Workspace = serde_json::from_str("{}").unwrap();
        assert!(ws.tasks.is_empty());
        assert!(ws.history.is_empty());
    }
}
