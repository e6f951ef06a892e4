//! Context modes ("shapeshifting" between study, work and life).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    Study,
    Work,
    Life,
    #[default]
    Balanced,
}

impl ContextMode {
    pub const ALL: [ContextMode; 4] = [
        ContextMode::Study,
        ContextMode::Work,
        ContextMode::Life,
        ContextMode::Balanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextMode::Study => "study",
            ContextMode::Work => "work",
            ContextMode::Life => "life",
            ContextMode::Balanced => "balanced",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ContextMode::Study => "Study",
            ContextMode::Work => "Work",
            ContextMode::Life => "Life",
            ContextMode::Balanced => "Balanced",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ContextMode::Study => "📚",
            ContextMode::Work => "💼",
            ContextMode::Life => "🏠",
            ContextMode::Balanced => "⚖️",
        }
    }

    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            ContextMode::Study => &[
                "Create focused study blocks using the Pomodoro technique",
                "Review your upcoming assignments and deadlines",
                "Organize your study materials and notes",
                "Set specific learning goals for today",
            ],
            ContextMode::Work => &[
                "Check your work schedule and upcoming shifts",
                "Review job-related tasks and priorities",
                "Prepare for meetings or check-ins",
                "Update your professional development goals",
            ],
            ContextMode::Life => &[
                "Review your household chores and responsibilities",
                "Check personal appointments and errands",
                "Plan meals and grocery shopping",
                "Schedule self-care and relaxation time",
            ],
            ContextMode::Balanced => &[
                "Review tasks across all areas (study, work, life)",
                "Identify time conflicts and priorities",
                "Create a balanced daily schedule",
                "Check for urgent items in any area",
            ],
        }
    }

    fn switch_message(&self) -> &'static str {
        match self {
            ContextMode::Study => "📚 Switched to Study Mode. Let's focus on learning!",
            ContextMode::Work => "💼 Switched to Work Mode. Time to be productive!",
            ContextMode::Life => "🏠 Switched to Life Mode. Let's manage personal tasks!",
            ContextMode::Balanced => "⚖️ Switched to Balanced Mode. Managing all aspects together!",
        }
    }
}

impl std::str::FromStr for ContextMode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| ModeError::InvalidMode(s.to_string()))
    }
}

impl fmt::Display for ContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("Invalid mode {0:?}. Choose from: study, work, life, balanced")]
    InvalidMode(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub mode: ContextMode,
    pub focus_area: Option<String>,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextState {
    current: ContextSnapshot,
    /// Kept across mode switches.
    preferences: BTreeMap<String, String>,
    history: Vec<ContextSnapshot>,
}

impl Default for ContextSnapshot {
    fn default() -> Self {
        Self {
            mode: ContextMode::Balanced,
            focus_area: None,
            last_updated: NaiveDateTime::default(),
        }
    }
}

impl ContextState {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            current: ContextSnapshot {
                last_updated: now,
                ..ContextSnapshot::default()
            },
            ..Self::default()
        }
    }

    pub fn current(&self) -> &ContextSnapshot {
        &self.current
    }

    pub fn mode(&self) -> ContextMode {
        self.current.mode
    }

    /// Switch modes, pushing the previous state onto the history.
    pub fn switch(&mut self, mode: &str, focus_area: Option<&str>, now: NaiveDateTime) -> Result<String, ModeError> {
        let mode: ContextMode = mode.parse()?;
        let previous = std::mem::replace(
            &mut self.current,
            ContextSnapshot {
                mode,
                focus_area: focus_area.map(str::to_string),
                last_updated: now,
            },
        );
        info!(from = previous.mode.as_str(), to = mode.as_str(), "context switched");
        self.history.push(previous);

        let mut msg = mode.switch_message().to_string();
        if let Some(f) = focus_area {
            msg.push_str(&format!("\n🎯 Focus: {f}"));
        }
        Ok(msg)
    }

    pub fn render_current(&self) -> String {
        let c = &self.current;
        let mut out = format!("**Current Context:** {} {} Mode\n", c.mode.emoji(), c.mode.title());
        if let Some(f) = &c.focus_area {
            out.push_str(&format!("**Focus Area:** {f}\n"));
        }
        out.push_str(&format!("**Last Updated:** {}", c.last_updated.format("%Y-%m-%dT%H:%M:%S")));
        out
    }

    pub fn set_preference(&mut self, key: &str, value: &str) -> String {
        self.preferences.insert(key.to_string(), value.to_string());
        format!("✓ Preference set: {key} = {value} for {} mode", self.current.mode)
    }

    pub fn preferences(&self) -> &BTreeMap<String, String> {
        &self.preferences
    }

    pub fn render_preferences(&self) -> String {
        if self.preferences.is_empty() {
            return format!("No preferences set for {} mode.", self.current.mode);
        }
        let mut out = format!("**Preferences for {} Mode:**\n\n", self.current.mode.title());
        for (k, v) in &self.preferences {
            out.push_str(&format!("• {k}: {v}\n"));
        }
        out
    }

    pub fn render_suggestions(&self) -> String {
        let mode = self.current.mode;
        let mut out = format!("**Suggestions for {} Mode:**\n\n", mode.title());
        for (i, s) in mode.suggestions().iter().enumerate() {
            out.push_str(&format!("{}. {s}\n", i + 1));
        }
        out
    }

    /// Most recent previous states first.
    pub fn history(&self, limit: usize) -> Vec<&ContextSnapshot> {
        self.history.iter().rev().take(limit).collect()
    }

    pub fn render_history(&self, limit: usize) -> String {
        let recent = self.history(limit);
        if recent.is_empty() {
            return "No context history yet.".to_string();
        }
        let mut out = format!("**Recent Context Switches (last {}):**\n\n", recent.len());
        for (i, snap) in recent.iter().enumerate() {
            let focus = snap
                .focus_area
                .as_deref()
                .map(|f| format!(" ({f})"))
                .unwrap_or_default();
            out.push_str(&format!(
                "{}. {}{focus} - {}\n",
                i + 1,
                snap.mode.title(),
                snap.last_updated.format("%Y-%m-%dT%H:%M:%S")
            ));
        }
        out
    }
}
