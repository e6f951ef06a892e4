//! Schedule blocks and the student profile payload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::task::Task;

/// A contiguous chunk of planned time containing one or more tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub label: String,
    pub tasks: Vec<Task>,
    /// ISO date-time or a human range such as "evening".
    pub start_window: Option<String>,
    /// Advisory; not reconciled with the task estimates.
    pub duration_min: Option<u32>,
    pub location: Option<String>,
    /// 0.0 - 1.0
    pub confidence: Option<f64>,
    pub explanation: Option<String>,
}

impl ScheduleBlock {
    pub fn new(label: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            label: label.into(),
            tasks,
            start_window: None,
            duration_min: None,
            location: None,
            confidence: None,
            explanation: None,
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_min = Some(minutes);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// Sum of the tasks' own estimates. May disagree with `duration_min`.
    pub fn task_minutes(&self) -> u32 {
        self.tasks.iter().filter_map(|t| t.duration_estimate_min).sum()
    }

    /// "morning_block" -> "Morning Block"
    pub fn display_label(&self) -> String {
        self.label
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub persona: String,
    pub branch: String,
    pub semester: Option<u32>,
    pub typical_wake_time: Option<String>,
    pub typical_sleep_time: Option<String>,
    /// Short natural-language description of home duties.
    pub home_duty_pattern: Option<String>,
    pub study_preferences: Option<BTreeMap<String, String>>,
}

impl Default for StudentProfile {
    fn default() -> Self {
        Self {
            persona: "bca_student".to_string(),
            branch: "BCA".to_string(),
            semester: None,
            typical_wake_time: None,
            typical_sleep_time: None,
            home_duty_pattern: None,
            study_preferences: None,
        }
    }
}
