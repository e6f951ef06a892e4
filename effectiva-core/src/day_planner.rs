//! Normal-day planning: up to three themed blocks sized from the available time.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::extract::extract_day;
use crate::memory::{self, MemorySink, Namespace};
use crate::schedule::ScheduleBlock;
use crate::task::{EnergyLevel, Task};

const MIN_DAY_MINUTES: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    #[default]
    Home,
    College,
}

impl Location {
    /// Anything that isn't "college" is treated as home.
    pub fn normalize(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("college") {
            Location::College
        } else {
            Location::Home
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Home => "home",
            Location::College => "college",
        }
    }

    fn human(&self) -> &'static str {
        match self {
            Location::Home => "home / your own space",
            Location::College => "college",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayRequest {
    pub location: Location,
    pub available_hours: f64,
    pub assignments_pending: u32,
    pub labs_today: u32,
    pub projects_active: bool,
    pub upcoming_exam_in_days: Option<u32>,
}

impl Default for DayRequest {
    fn default() -> Self {
        Self {
            location: Location::Home,
            available_hours: 6.0,
            assignments_pending: 0,
            labs_today: 0,
            projects_active: false,
            upcoming_exam_in_days: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub location: Location,
    pub total_minutes: u32,
    pub blocks: Vec<ScheduleBlock>,
}

impl DayPlan {
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.blocks.iter().flat_map(|b| b.tasks.iter())
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            format!(
                "Planned day for a BCA student at {} (~{} minutes total, {} block(s)).",
                self.location.human(),
                self.total_minutes,
                self.num_blocks()
            ),
            String::new(),
        ];
        for b in &self.blocks {
            lines.push(format!(
                "Block: {} (~{} min)",
                b.display_label(),
                b.duration_min.unwrap_or(0)
            ));
            for (i, t) in b.tasks.iter().enumerate() {
                lines.push(format!("  {}. {}{}", i + 1, t.title, t.estimate_suffix()));
            }
            lines.push(String::new());
        }
        lines.push(
            "Tip: it's okay if reality shifts; treat these blocks as anchors, not a rigid timetable."
                .to_string(),
        );
        lines.join("\n")
    }
}

impl fmt::Display for DayPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Whole minutes available, never below 90.
pub fn day_minutes(available_hours: f64) -> u32 {
    let raw = available_hours * 60.0;
    let minutes = if raw.is_finite() && raw > 0.0 { raw.trunc() as u32 } else { 0 };
    if minutes < MIN_DAY_MINUTES {
        debug!(available_hours, "day budget below floor, using 90 minutes");
    }
    minutes.max(MIN_DAY_MINUTES)
}

pub fn num_blocks(total_minutes: u32) -> u32 {
    if total_minutes >= 240 {
        3
    } else if total_minutes >= 150 {
        2
    } else {
        1
    }
}

/// Collects tasks for one planning call so ids stay unique across blocks.
struct TaskFactory {
    location: Location,
    count: usize,
    created: Vec<Task>,
}

impl TaskFactory {
    fn add(&mut self, title: &str, kind: &str, est: u32, energy: EnergyLevel) -> Task {
        self.count += 1;
        let task = Task::new(format!("bca-day-{kind}-{}", self.count), title)
            .with_kind(kind)
            .with_duration(est)
            .with_energy(energy)
            .with_location(Some(self.location.as_str()));
        self.created.push(task.clone());
        task
    }
}

pub fn plan_day(req: &DayRequest, sink: &mut dyn MemorySink) -> DayPlan {
    let loc = req.location;
    let total = day_minutes(req.available_hours);
    let n = num_blocks(total);
    let block_min = total / n;
    let exam_within = |days: u32| req.upcoming_exam_in_days.is_some_and(|d| d <= days);

    let mut factory = TaskFactory {
        location: loc,
        count: 0,
        created: Vec::new(),
    };
    let mut blocks = Vec::with_capacity(n as usize);

    // Heaviest cognitive work first.
    let mut first = Vec::new();
    match loc {
        Location::College => {
            first.push(factory.add(
                "Attend / review today's core classes and take concise notes",
                "notes",
                block_min / 2,
                EnergyLevel::High,
            ));
            if req.labs_today > 0 {
                first.push(factory.add(
                    "Prepare questions or code snippets for today's lab sessions",
                    "lab_prep",
                    block_min / 3,
                    EnergyLevel::Medium,
                ));
            }
        }
        Location::Home => {
            if req.assignments_pending > 0 {
                first.push(factory.add(
                    "Work on the most urgent assignment (core theory or coding)",
                    "assignment",
                    block_min / 2,
                    EnergyLevel::High,
                ));
            }
            if exam_within(10) {
                first.push(factory.add(
                    "Deep study: revise key topics for the nearest exam",
                    "exam_prep",
                    block_min / 3,
                    EnergyLevel::High,
                ));
            }
        }
    }
    if first.is_empty() {
        first.push(factory.add(
            "Focused study on the hardest subject right now",
            "study",
            block_min / 2,
            EnergyLevel::High,
        ));
    }
    blocks.push(
        ScheduleBlock::new(if n > 1 { "morning_block" } else { "main_block" }, first)
            .with_duration(block_min)
            .with_location(loc.as_str())
            .with_explanation(
                "Start the day with your highest-impact work: classes/labs if at college, \
                 or urgent assignments/exam prep if at home.",
            ),
    );

    if n >= 2 {
        let mut second = Vec::new();
        if req.assignments_pending > 1 {
            second.push(factory.add(
                "Continue or start the second most urgent assignment",
                "assignment",
                block_min / 2,
                EnergyLevel::Medium,
            ));
        }
        if req.projects_active {
            second.push(factory.add(
                "Project progress: implement or debug one small feature",
                "project",
                block_min / 3,
                EnergyLevel::Medium,
            ));
        }
        if second.is_empty() {
            second.push(factory.add(
                "Organize notes and consolidate what you studied earlier",
                "notes",
                block_min / 2,
                EnergyLevel::Medium,
            ));
        }
        blocks.push(
            ScheduleBlock::new("afternoon_block", second)
                .with_duration(block_min)
                .with_location(loc.as_str())
                .with_explanation(
                    "Use the afternoon for steady progress on assignments and projects, \
                     or for consolidating class material.",
                ),
        );
    }

    if n >= 3 {
        let mut third = vec![factory.add(
            "Coding practice: 1–3 small problems (DSA or language of the semester)",
            "practice",
            block_min / 2,
            EnergyLevel::Medium,
        )];
        if exam_within(7) {
            third.push(factory.add(
                "Light revision: flashcards or quick recap of today's topics",
                "revision",
                block_min / 3,
                EnergyLevel::Low,
            ));
        }
        blocks.push(
            ScheduleBlock::new("evening_block", third)
                .with_duration(block_min)
                .with_location(loc.as_str())
                .with_explanation(
                    "In the evening, do lighter coding practice and gentle revision so you \
                     can wind down without wasting the time.",
                ),
        );
    }

    for t in &factory.created {
        memory::store_task(sink, Namespace::Study, t);
    }
    for b in &blocks {
        memory::store_schedule_block(sink, Namespace::Study, b);
    }

    info!(
        location = loc.as_str(),
        total_minutes = total,
        blocks = blocks.len(),
        tasks = factory.count,
        "day plan generated"
    );

    DayPlan {
        location: loc,
        total_minutes: total,
        blocks,
    }
}

/// Free-text entry point: infer location, hours and workload, then plan.
pub fn handle_day(message: &str, default_location: Location, sink: &mut dyn MemorySink) -> DayPlan {
    let req = extract_day(message, default_location);
    plan_day(&req, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemorySink, RecordKind};

    fn labels(plan: &DayPlan) -> Vec<&str> {
        plan.blocks.iter().map(|b| b.label.as_str()).collect()
    }

    #[test]
    fn test_block_count_thresholds() {
        assert_eq!(num_blocks(day_minutes(1.0)), 1);
        assert_eq!(num_blocks(day_minutes(2.49)), 1);
        assert_eq!(num_blocks(day_minutes(2.5)), 2);
        assert_eq!(num_blocks(day_minutes(3.99)), 2);
        assert_eq!(num_blocks(day_minutes(4.0)), 3);
        assert_eq!(day_minutes(-2.0), 90);
        assert_eq!(day_minutes(f64::NAN), 90);
    }

    #[test]
    fn test_single_block_is_main_block_with_fallback() {
        let mut sink = InMemorySink::new();
        let req = DayRequest {
            available_hours: 1.0,
            ..DayRequest::default()
        };
        let plan = plan_day(&req, &mut sink);
        assert_eq!(labels(&plan), vec!["main_block"]);
        let t = &plan.blocks[0].tasks[0];
        assert_eq!(t.id, "bca-day-study-1");
        assert_eq!(t.duration_estimate_min, Some(45));
        assert_eq!(t.energy_level, Some(EnergyLevel::High));
    }

    #[test]
    fn test_college_day_with_lab() {
        let mut sink = InMemorySink::new();
        let req = DayRequest {
            location: Location::College,
            available_hours: 3.0,
            labs_today: 1,
            projects_active: true,
            ..DayRequest::default()
        };
        let plan = plan_day(&req, &mut sink);
        assert_eq!(labels(&plan), vec!["morning_block", "afternoon_block"]);
        let ids: Vec<&str> = plan.all_tasks().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["bca-day-notes-1", "bca-day-lab_prep-2", "bca-day-project-3"]);
        assert!(plan.all_tasks().all(|t| t.location.as_deref() == Some("college")));
        assert_eq!(plan.blocks[0].duration_min, Some(90));
    }

    #[test]
    fn test_afternoon_fallback_is_notes() {
        let mut sink = InMemorySink::new();
        let req = DayRequest {
            available_hours: 3.0,
            assignments_pending: 1,
            ..DayRequest::default()
        };
        let plan = plan_day(&req, &mut sink);
        assert_eq!(plan.blocks[1].tasks[0].kind, "notes");
        assert_eq!(plan.blocks[1].tasks[0].id, "bca-day-notes-2");
    }

    #[test]
    fn test_persists_each_task_and_block() {
        let mut sink = InMemorySink::new();
        let plan = plan_day(&DayRequest::default(), &mut sink);
        assert_eq!(
            sink.count(Namespace::Study, RecordKind::Task),
            plan.all_tasks().count()
        );
        assert_eq!(sink.count(Namespace::Study, RecordKind::ScheduleBlock), 3);
    }

    #[test]
    fn test_render_lists_title_cased_blocks() {
        let mut sink = InMemorySink::new();
        let plan = handle_day("at home with 6 hours, 2 assignments, exam in 5 days", Location::Home, &mut sink);
        let text = plan.render();
        assert!(text.starts_with(
            "Planned day for a BCA student at home / your own space (~360 minutes total, 3 block(s))."
        ));
        assert!(text.contains("Block: Morning Block (~120 min)"));
        assert!(text.contains("  1. Work on the most urgent assignment (core theory or coding) (~60 min)"));
        assert!(text.contains("  2. Deep study: revise key topics for the nearest exam (~40 min)"));
        assert!(text.contains("Block: Evening Block (~120 min)"));
    }
}
