//! Task model shared by the planners, the task store and the memory payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" | "in-progress" => Some(TaskStatus::InProgress),
            "completed" | "done" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// Coarse self-reported capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

impl EnergyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(EnergyLevel::Low),
            "medium" | "med" => Some(EnergyLevel::Medium),
            "high" => Some(EnergyLevel::High),
            _ => None,
        }
    }
}

/// Importance tier used by the task store and the deadline prioritizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Importance {
    /// Weight in the priority score (low=1 .. urgent=4).
    pub fn weight(&self) -> i64 {
        match self {
            Importance::Low => 1,
            Importance::Medium => 2,
            Importance::High => 3,
            Importance::Urgent => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Medium => "medium",
            Importance::High => "high",
            Importance::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Importance::Low),
            "medium" => Some(Importance::Medium),
            "high" => Some(Importance::High),
            "urgent" => Some(Importance::Urgent),
            _ => None,
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Importance::Urgent | Importance::High => "🔴",
            Importance::Medium => "🟡",
            Importance::Low => "🟢",
        }
    }
}

/// A unit of planned work.
///
/// Planners create these once per call and never mutate them afterwards;
/// status transitions belong to [`crate::store::TaskStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub subject: Option<String>,
    /// Free-form tag: assignment, lab, project, exam_prep, notes, practice, revision, study, general.
    pub kind: String,
    /// ISO date or date-time.
    pub deadline: Option<String>,
    pub location: Option<String>,
    /// Minutes.
    pub duration_estimate_min: Option<u32>,
    pub energy_level: Option<EnergyLevel>,
    pub dependencies: Option<Vec<String>>,
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subject: None,
            kind: "general".to_string(),
            deadline: None,
            location: None,
            duration_estimate_min: None,
            energy_level: None,
            dependencies: None,
            status: TaskStatus::Pending,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_estimate_min = Some(minutes);
        self
    }

    pub fn with_energy(mut self, energy: EnergyLevel) -> Self {
        self.energy_level = Some(energy);
        self
    }

    pub fn with_location(mut self, location: Option<&str>) -> Self {
        self.location = location.map(str::to_string);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    pub fn with_dependencies(mut self, deps: Vec<String>) -> Self {
        self.dependencies = Some(deps);
        self
    }

    /// " (~N min)" suffix used in the plan summaries; empty when no estimate.
    pub fn estimate_suffix(&self) -> String {
        match self.duration_estimate_min {
            Some(m) if m > 0 => format!(" (~{m} min)"),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_defaults_to_pending_general() {
        let t = Task::new("t1", "Read chapter 3");
        assert_eq!(t.status, TaskStatus::Pending);
        assert_eq!(t.kind, "general");
        assert!(t.duration_estimate_min.is_none());
    }

    #[test]
    fn estimate_suffix_skips_zero_and_missing() {
        assert_eq!(Task::new("a", "x").estimate_suffix(), "");
        assert_eq!(Task::new("a", "x").with_duration(0).estimate_suffix(), "");
        assert_eq!(Task::new("a", "x").with_duration(25).estimate_suffix(), " (~25 min)");
    }

    #[test]
    fn importance_weights_are_ordered() {
        assert_eq!(Importance::Low.weight(), 1);
        assert_eq!(Importance::Urgent.weight(), 4);
        assert_eq!(Importance::parse(" HIGH "), Some(Importance::High));
        assert_eq!(Importance::parse("whenever"), None);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
