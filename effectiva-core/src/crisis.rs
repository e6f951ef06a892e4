//! Crisis triage and catch-up micro-plans for students who have fallen behind.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::extract::extract_crisis;
use crate::memory::{self, MemorySink, Namespace};
use crate::schedule::ScheduleBlock;
use crate::task::{EnergyLevel, Task};
use crate::time::id_stamp;

const MAX_TASKS: usize = 5;
const FALLBACK_MINUTES: u32 = 30;
/// Hours assumed when a crisis message does not say how much time is left.
pub const DEFAULT_CRISIS_HOURS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Medium,
    High,
    Overwhelmed,
}

impl StressLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(StressLevel::Low),
            "medium" => Some(StressLevel::Medium),
            "high" => Some(StressLevel::High),
            "overwhelmed" => Some(StressLevel::Overwhelmed),
            _ => None,
        }
    }
}

/// One crisis-handling invocation, written once to the coordinator's memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisEpisode {
    pub severity: Severity,
    pub days_missed: u32,
    pub labs_missed: u32,
    pub assignments_pending: u32,
    pub upcoming_exam_in_days: Option<u32>,
    pub stress_level: Option<StressLevel>,
    pub notes: Option<String>,
}

/// Numeric inputs to a catch-up plan.
#[derive(Debug, Clone, PartialEq)]
pub struct CrisisParams {
    pub days_missed: u32,
    pub labs_missed: u32,
    pub assignments_pending: u32,
    pub upcoming_exam_in_days: Option<u32>,
    pub stress_level: Option<StressLevel>,
}

impl Default for CrisisParams {
    /// Tuned for "bad but not catastrophic".
    fn default() -> Self {
        Self {
            days_missed: 5,
            labs_missed: 0,
            assignments_pending: 1,
            upcoming_exam_in_days: None,
            stress_level: None,
        }
    }
}

impl CrisisParams {
    pub fn severity(&self) -> Severity {
        classify_severity(
            self.days_missed,
            self.labs_missed,
            self.assignments_pending,
            self.upcoming_exam_in_days,
        )
    }
}

/// Severe checks run first; a near exam alone is enough to make it severe.
pub fn classify_severity(
    days_missed: u32,
    labs_missed: u32,
    assignments_pending: u32,
    upcoming_exam_in_days: Option<u32>,
) -> Severity {
    if days_missed >= 6 || upcoming_exam_in_days.is_some_and(|d| d <= 2) {
        Severity::Severe
    } else if days_missed >= 3 || assignments_pending >= 2 || labs_missed >= 1 {
        Severity::Moderate
    } else {
        Severity::Mild
    }
}

/// Result of [`plan_catchup`]. `Display` renders the student-facing summary.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchupPlan {
    pub episode: CrisisEpisode,
    pub block: ScheduleBlock,
    pub total_minutes: u32,
}

impl CatchupPlan {
    pub fn tasks(&self) -> &[Task] {
        &self.block.tasks
    }

    pub fn render(&self) -> String {
        let ep = &self.episode;
        let exam = ep
            .upcoming_exam_in_days
            .map(|d| d.to_string())
            .unwrap_or_else(|| "none".to_string());
        let place = self
            .tasks()
            .first()
            .and_then(|t| t.location.as_deref())
            .unwrap_or("wherever you are right now");

        let mut lines = vec![
            format!(
                "Crisis level: {} (days missed={}, labs missed={}, assignments pending={}, upcoming exam in days={})",
                ep.severity.as_str().to_uppercase(),
                ep.days_missed,
                ep.labs_missed,
                ep.assignments_pending,
                exam
            ),
            String::new(),
            format!("Next ~{} minutes at {}:", self.block.duration_min.unwrap_or(0), place),
        ];
        for (i, t) in self.tasks().iter().enumerate() {
            lines.push(format!("{}. {}{}", i + 1, t.title, t.estimate_suffix()));
        }
        lines.push(String::new());
        lines.push("Remember: small wins count. Even completing the first 1–2 tasks is progress.".to_string());
        lines.join("\n")
    }
}

impl fmt::Display for CatchupPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Budget in whole minutes; non-positive or non-finite hours fall back to 30.
fn total_minutes(available_hours: f64) -> u32 {
    let minutes = (available_hours * 60.0).round();
    if !minutes.is_finite() || minutes <= 0.0 {
        FALLBACK_MINUTES
    } else {
        minutes as u32
    }
}

fn block_minutes(total: u32) -> u32 {
    if total > 60 { (total - 15).min(90) } else { total }
}

/// Build a short, low-resistance catch-up plan and log it to memory.
///
/// The episode goes to the coordinator namespace; tasks and the block go to
/// the study namespace.
pub fn plan_catchup(
    params: &CrisisParams,
    location: Option<&str>,
    available_hours: f64,
    now: NaiveDateTime,
    sink: &mut dyn MemorySink,
) -> CatchupPlan {
    let severity = params.severity();
    let episode = CrisisEpisode {
        severity,
        days_missed: params.days_missed,
        labs_missed: params.labs_missed,
        assignments_pending: params.assignments_pending,
        upcoming_exam_in_days: params.upcoming_exam_in_days,
        stress_level: params.stress_level,
        notes: Some(format!(
            "location={}, available_hours={}",
            location.unwrap_or("none"),
            available_hours
        )),
    };
    memory::store_crisis_episode(sink, Namespace::Coordinator, &episode);

    let prefix = id_stamp(now);
    let mut tasks = vec![
        Task::new(
            format!("{prefix}-notes"),
            "Message 1–2 classmates and ask for notes of missed classes",
        )
        .with_kind("notes")
        .with_duration(10)
        .with_energy(EnergyLevel::Low)
        .with_location(location),
    ];
    if params.assignments_pending > 0 {
        tasks.push(
            Task::new(
                format!("{prefix}-assignments-overview"),
                "List all pending assignments with deadlines in one place",
            )
            .with_kind("assignment")
            .with_duration(20)
            .with_energy(EnergyLevel::Medium)
            .with_location(location),
        );
    }
    if params.labs_missed > 0 {
        tasks.push(
            Task::new(
                format!("{prefix}-lab-plan"),
                "Ask lab partner / class group what was covered in missed labs",
            )
            .with_kind("lab")
            .with_duration(15)
            .with_energy(EnergyLevel::Low)
            .with_location(location),
        );
    }
    if params.upcoming_exam_in_days.is_some_and(|d| d <= 7) {
        tasks.push(
            Task::new(
                format!("{prefix}-exam-outline"),
                "Write a 5–10 bullet outline of topics for the nearest exam",
            )
            .with_kind("exam_prep")
            .with_duration(25)
            .with_energy(EnergyLevel::Medium)
            .with_location(location),
        );
    }
    tasks.truncate(MAX_TASKS);

    for t in &tasks {
        memory::store_task(sink, Namespace::Study, t);
    }

    let total = total_minutes(available_hours);
    let block = ScheduleBlock::new("crisis_catchup_block_1", tasks)
        .with_duration(block_minutes(total))
        .with_location(location.unwrap_or("home"))
        .with_explanation(
            "Focus on tiny wins: get notes, list assignments, and understand what you missed before deep study.",
        );
    memory::store_schedule_block(sink, Namespace::Study, &block);

    info!(
        severity = severity.as_str(),
        tasks = block.tasks.len(),
        block_min = block.duration_min,
        "crisis catch-up plan generated"
    );

    CatchupPlan {
        episode,
        block,
        total_minutes: total,
    }
}

/// Free-text entry point: infer the parameters, then plan.
pub fn handle_crisis(
    message: &str,
    location: Option<&str>,
    available_hours: f64,
    now: NaiveDateTime,
    sink: &mut dyn MemorySink,
) -> CatchupPlan {
    let params = extract_crisis(message);
    plan_catchup(&params, location, available_hours, now, sink)
}
