//! Quick captures: fast, append-only tasks, notes, reminders and energy checks.

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use crate::extract::extract_mood;
use crate::task::{EnergyLevel, Importance, TaskStatus};

static TASK_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(task|todo|do):\s*").expect("Invalid regex: task prefix"));
static NOTE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(note|idea|remember):\s*").expect("Invalid regex: note prefix")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Tired,
    Stressed,
    Unknown,
}

impl Mood {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "great" => Mood::Great,
            "good" => Mood::Good,
            "okay" | "ok" => Mood::Okay,
            "tired" => Mood::Tired,
            "stressed" => Mood::Stressed,
            _ => Mood::Unknown,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Great => "😊",
            Mood::Good => "🙂",
            Mood::Okay => "😐",
            Mood::Tired => "😴",
            Mood::Stressed => "😰",
            Mood::Unknown => "🤔",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteCategory {
    Study,
    Work,
    Personal,
    Idea,
    #[default]
    General,
}

impl NoteCategory {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "study" => NoteCategory::Study,
            "work" => NoteCategory::Work,
            "personal" => NoteCategory::Personal,
            "idea" => NoteCategory::Idea,
            _ => NoteCategory::General,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            NoteCategory::Study => "📚",
            NoteCategory::Work => "💼",
            NoteCategory::Personal => "🏠",
            NoteCategory::Idea => "💡",
            NoteCategory::General => "📝",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaptureKind {
    Task {
        description: String,
        priority: Importance,
        due_date: Option<String>,
        status: TaskStatus,
    },
    Note {
        content: String,
        category: NoteCategory,
    },
    Reminder {
        message: String,
        when: String,
        status: TaskStatus,
    },
    EnergyCheck {
        mood: Mood,
        energy_level: EnergyLevel,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureItem {
    pub id: String,
    /// ISO timestamp; compared as a string when looking for the latest entry.
    pub created_at: String,
    #[serde(flatten)]
    pub kind: CaptureKind,
}

impl CaptureItem {
    pub fn render_line(&self) -> String {
        let stamp = crate::time::parse_iso(&self.created_at)
            .map(|dt| dt.format("%m/%d %H:%M").to_string())
            .unwrap_or_else(|| self.created_at.clone());
        match &self.kind {
            CaptureKind::Task { description, priority, .. } => {
                format!("{} TASK: {} ({})", priority.marker(), description, stamp)
            }
            CaptureKind::Note { content, category } => {
                format!("{} NOTE: {}... ({})", category.emoji(), truncate(content, 60), stamp)
            }
            CaptureKind::Reminder { message, when, .. } => {
                format!("⏰ REMINDER: {message} ({when}) - {stamp}")
            }
            CaptureKind::EnergyCheck { mood, energy_level } => {
                format!("{} ENERGY: {} energy ({})", mood.emoji(), energy_level.as_str(), stamp)
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Raise or lower a medium priority based on words in the description.
pub fn infer_priority(description: &str, given: Importance) -> Importance {
    if given != Importance::Medium {
        return given;
    }
    let text = description.to_lowercase();
    if ["urgent", "asap", "important", "critical"].iter().any(|w| text.contains(w)) {
        Importance::High
    } else if ["low", "sometime", "eventually"].iter().any(|w| text.contains(w)) {
        Importance::Low
    } else {
        given
    }
}

pub fn energy_advice(level: EnergyLevel) -> &'static str {
    match level {
        EnergyLevel::High => "Great energy! Schedule deep work or challenging tasks now.",
        EnergyLevel::Medium => "Good energy for regular tasks. Take short breaks every 45 minutes.",
        EnergyLevel::Low => "Low energy detected. Schedule light tasks or rest. Consider a short walk.",
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureLog {
    items: Vec<CaptureItem>,
}

impl CaptureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CaptureItem] {
        &self.items
    }

    fn push(&mut self, prefix: &str, now: NaiveDateTime, kind: CaptureKind) -> &CaptureItem {
        let id = format!("{prefix}_{}_{}", self.items.len() + 1, now.and_utc().timestamp());
        self.items.push(CaptureItem {
            id,
            created_at: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
            kind,
        });
        &self.items[self.items.len() - 1]
    }

    pub fn add_task(
        &mut self,
        description: &str,
        priority: Importance,
        due_date: Option<&str>,
        now: NaiveDateTime,
    ) -> String {
        let priority = infer_priority(description, priority);
        self.push(
            "quick",
            now,
            CaptureKind::Task {
                description: description.to_string(),
                priority,
                due_date: due_date.map(str::to_string),
                status: TaskStatus::Pending,
            },
        );
        format!("{} Task captured: '{}'", priority.marker(), description)
    }

    pub fn note(&mut self, content: &str, category: NoteCategory, now: NaiveDateTime) -> String {
        self.push(
            "note",
            now,
            CaptureKind::Note {
                content: content.to_string(),
                category,
            },
        );
        format!("{} Note captured: '{}...'", category.emoji(), truncate(content, 50))
    }

    pub fn reminder(&mut self, message: &str, when: Option<&str>, now: NaiveDateTime) -> String {
        self.push(
            "reminder",
            now,
            CaptureKind::Reminder {
                message: message.to_string(),
                when: when.unwrap_or("asap").to_string(),
                status: TaskStatus::Pending,
            },
        );
        format!("⏰ Reminder set: '{}' ({})", message, when.unwrap_or("ASAP"))
    }

    pub fn energy_check(&mut self, mood: Mood, energy_level: EnergyLevel, now: NaiveDateTime) -> String {
        self.push("energy", now, CaptureKind::EnergyCheck { mood, energy_level });
        format!("{} Energy check logged. {}", mood.emoji(), energy_advice(energy_level))
    }

    /// Last `limit` captures, oldest first.
    pub fn recent(&self, limit: usize) -> &[CaptureItem] {
        let start = self.items.len().saturating_sub(limit);
        &self.items[start..]
    }

    pub fn render_recent(&self, limit: usize) -> String {
        let recent = self.recent(limit);
        if recent.is_empty() {
            return "No recent captures found. Start capturing tasks, notes, and reminders!".to_string();
        }
        let mut out = format!("**Recent Quick Captures (last {}):**\n\n", recent.len());
        for item in recent {
            out.push_str(&item.render_line());
            out.push('\n');
        }
        out.push_str(&format!("\n**Total captures:** {}", self.items.len()));
        out
    }

    /// Energy level of the energy check with the greatest timestamp string.
    pub fn current_energy(&self) -> Option<EnergyLevel> {
        self.items
            .iter()
            .filter_map(|i| match &i.kind {
                CaptureKind::EnergyCheck { energy_level, .. } => Some((i.created_at.as_str(), *energy_level)),
                _ => None,
            })
            .max_by(|a, b| a.0.cmp(b.0))
            .map(|(_, level)| level)
    }

    /// Route a free-form line to the right capture type.
    pub fn process_natural(&mut self, text: &str, now: NaiveDateTime) -> String {
        let trimmed = text.trim();
        let lower = trimmed.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["task:", "todo:", "do:", "need to"]) {
            let body = TASK_PREFIX_RE.replace(trimmed, "");
            debug!("natural capture routed to task");
            return self.add_task(body.trim(), Importance::Medium, None, now);
        }
        if has(&["remind"]) {
            return self.reminder(trimmed, None, now);
        }
        if has(&["note:", "idea:", "remember:"]) {
            let category = if lower.contains("study") {
                NoteCategory::Study
            } else if lower.contains("work") || lower.contains("job") {
                NoteCategory::Work
            } else if lower.contains("personal") {
                NoteCategory::Personal
            } else {
                NoteCategory::General
            };
            let body = NOTE_PREFIX_RE.replace(trimmed, "");
            return self.note(body.trim(), category, now);
        }
        if has(&["feeling", "feel", "energy", "mood", "tired", "great", "good", "stressed"]) {
            let (mood, level) = extract_mood(&lower);
            return self.energy_check(mood, level, now);
        }
        self.note(trimmed, NoteCategory::General, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_iso;

    fn at(s: &str) -> NaiveDateTime {
        parse_iso(s).unwrap()
    }

    #[test]
    fn test_priority_keywords() {
        assert_eq!(infer_priority("submit ASAP", Importance::Medium), Importance::High);
        assert_eq!(infer_priority("clean desk eventually", Importance::Medium), Importance::Low);
        assert_eq!(infer_priority("urgent thing", Importance::Low), Importance::Low);
    }

    #[test]
    fn test_natural_routing() {
        let mut log = CaptureLog::new();
        let now = at("2026-03-01T10:00");
        assert_eq!(
            log.process_natural("task: finish lab report, urgent", now),
            "🔴 Task captured: 'finish lab report, urgent'"
        );
        assert!(log.process_natural("remind me to call the library", now).starts_with("⏰ Reminder set"));
        assert!(log.process_natural("idea: study group for DBMS", now).starts_with("📚 Note captured"));
        assert!(log.process_natural("feeling drained today", now).starts_with("😴 Energy check logged."));
        assert!(log.process_natural("random thought", now).starts_with("📝 Note captured"));
        assert_eq!(log.len(), 5);

        match &log.items()[0].kind {
            CaptureKind::Task { description, .. } => assert_eq!(description, "finish lab report, urgent"),
            other => panic!("expected task, got {other:?}"),
        }
        match &log.items()[1].kind {
            CaptureKind::Reminder { when, .. } => assert_eq!(when, "asap"),
            other => panic!("expected reminder, got {other:?}"),
        }
    }

    #[test]
    fn test_current_energy_uses_latest_timestamp() {
        let mut log = CaptureLog::new();
        assert_eq!(log.current_energy(), None);
        log.energy_check(Mood::Great, EnergyLevel::High, at("2026-03-01T18:00"));
        log.energy_check(Mood::Tired, EnergyLevel::Low, at("2026-03-01T08:00"));
        assert_eq!(log.current_energy(), Some(EnergyLevel::High));
    }

    #[test]
    fn test_recent_and_ids() {
        let mut log = CaptureLog::new();
        let now = at("2026-03-01T10:00");
        for i in 0..7 {
            log.note(&format!("note {i}"), NoteCategory::General, now);
        }
        let recent = log.recent(5);
        assert_eq!(recent.len(), 5);
        assert!(recent[0].id.starts_with("note_3_"));
        let text = log.render_recent(2);
        assert!(text.contains("(last 2)"));
        assert!(text.contains("📝 NOTE: note 6... (03/01 10:00)"));
        assert!(text.ends_with("**Total captures:** 7"));
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let mut log = CaptureLog::new();
        log.energy_check(Mood::Good, EnergyLevel::Medium, at("2026-03-01T10:00"));
        let json = serde_json::to_value(&log.items()[0]).unwrap();
        assert_eq!(json["type"], "energy_check");
        assert_eq!(json["energy_level"], "medium");
        let back: CaptureItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, log.items()[0]);
    }
}
