//! Deadline + importance scoring.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::task::Importance;
use crate::time::{days_until, parse_iso};

const DEFAULT_URGENCY: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineTask {
    pub name: String,
    pub deadline: Option<String>,
    /// Free text; anything unrecognised counts as medium.
    pub importance: Option<String>,
}

impl DeadlineTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deadline: None,
            importance: None,
        }
    }

    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    pub fn with_importance(mut self, importance: impl Into<String>) -> Self {
        self.importance = Some(importance.into());
        self
    }

    /// "name@deadline@importance", either trailing part may be empty or absent.
    pub fn parse_spec(spec: &str) -> Self {
        let mut parts = spec.splitn(3, '@').map(str::trim);
        let name = parts.next().unwrap_or_default().to_string();
        let deadline = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        let importance = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        Self { name, deadline, importance }
    }
}

/// Where an urgency value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencySource {
    Parsed,
    Missing,
    Unparseable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    pub fn from_score(score: i64) -> Self {
        if score >= 10 {
            PriorityTier::High
        } else if score >= 7 {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            PriorityTier::High => "🔴",
            PriorityTier::Medium => "🟡",
            PriorityTier::Low => "🟢",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTask {
    pub task: DeadlineTask,
    pub importance: Importance,
    pub urgency: i64,
    pub urgency_source: UrgencySource,
    pub priority: i64,
}

impl ScoredTask {
    pub fn tier(&self) -> PriorityTier {
        PriorityTier::from_score(self.priority)
    }
}

pub fn urgency(deadline: Option<&str>, now: NaiveDateTime) -> (i64, UrgencySource) {
    match deadline.map(str::trim).filter(|s| !s.is_empty()) {
        None => (DEFAULT_URGENCY, UrgencySource::Missing),
        Some(s) => match parse_iso(s) {
            Some(dt) => ((10 - days_until(dt, now)).max(0), UrgencySource::Parsed),
            None => {
                debug!(deadline = s, "unparseable deadline, using default urgency");
                (DEFAULT_URGENCY, UrgencySource::Unparseable)
            }
        },
    }
}

pub fn score(task: &DeadlineTask, now: NaiveDateTime) -> ScoredTask {
    let importance = task
        .importance
        .as_deref()
        .and_then(Importance::parse)
        .unwrap_or_default();
    let (urgency, urgency_source) = urgency(task.deadline.as_deref(), now);
    ScoredTask {
        task: task.clone(),
        importance,
        urgency,
        urgency_source,
        priority: urgency + 2 * importance.weight(),
    }
}

/// Highest priority first; ties keep input order.
pub fn prioritize(tasks: &[DeadlineTask], now: NaiveDateTime) -> Vec<ScoredTask> {
    let mut scored: Vec<ScoredTask> = tasks.iter().map(|t| score(t, now)).collect();
    scored.sort_by(|a, b| b.priority.cmp(&a.priority));
    scored
}

pub fn render(scored: &[ScoredTask]) -> String {
    if scored.is_empty() {
        return "No tasks provided.".to_string();
    }
    let mut out = String::from("**📋 Prioritized Task List:**\n\n");
    for (i, s) in scored.iter().enumerate() {
        out.push_str(&format!("{} **{}. {}**\n", s.tier().marker(), i + 1, s.task.name));
        out.push_str(&format!(
            "   Deadline: {} | Importance: {} | Score: {}\n\n",
            s.task.deadline.as_deref().unwrap_or("No deadline"),
            s.importance.as_str(),
            s.priority
        ));
    }
    out
}
