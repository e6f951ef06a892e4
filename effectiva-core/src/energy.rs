//! Energy-aware ordering and greedy scheduling of a task list.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::task::EnergyLevel;

const DEFAULT_DIFFICULTY: &str = "medium";
const DEFAULT_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyTask {
    pub name: String,
    pub difficulty: Option<String>,
    pub duration_minutes: Option<u32>,
}

impl EnergyTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            difficulty: None,
            duration_minutes: None,
        }
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// "name:difficulty:minutes", trailing parts optional. A bad minute count is ignored.
    pub fn parse_spec(spec: &str) -> Self {
        let mut parts = spec.splitn(3, ':').map(str::trim);
        let name = parts.next().unwrap_or_default().to_string();
        let difficulty = parts
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase());
        let duration_minutes = parts.next().and_then(|s| s.parse().ok());
        Self {
            name,
            difficulty,
            duration_minutes,
        }
    }

    pub fn difficulty(&self) -> &str {
        self.difficulty.as_deref().unwrap_or(DEFAULT_DIFFICULTY)
    }

    pub fn minutes(&self) -> u32 {
        self.duration_minutes.unwrap_or(DEFAULT_MINUTES)
    }
}

pub fn preferred_order(energy: Option<EnergyLevel>) -> &'static [&'static str] {
    match energy {
        Some(EnergyLevel::High) => &["easy", "medium", "hard"],
        Some(EnergyLevel::Medium) => &["medium", "easy", "hard"],
        Some(EnergyLevel::Low) => &["easy", "medium"],
        None => &["easy", "medium", "hard"],
    }
}

pub fn break_minutes(energy: Option<EnergyLevel>) -> Option<u32> {
    match energy {
        Some(EnergyLevel::Medium) => Some(10),
        Some(EnergyLevel::Low) => Some(15),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    pub task: EnergyTask,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub break_after: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergySchedule {
    pub energy: Option<EnergyLevel>,
    pub budget_minutes: u32,
    pub scheduled: Vec<ScheduledTask>,
    /// Tasks that did not fit, in the order they would have run.
    pub dropped: Vec<EnergyTask>,
    /// Task plus break minutes; never above `budget_minutes`.
    pub used_minutes: u32,
}

impl EnergySchedule {
    pub fn remaining_minutes(&self) -> u32 {
        self.budget_minutes - self.used_minutes
    }

    fn energy_label(&self) -> &'static str {
        self.energy.map(|e| e.as_str()).unwrap_or("unknown")
    }

    pub fn render(&self) -> String {
        let hours = self.budget_minutes as f64 / 60.0;
        let mut out = format!("**⚡ Energy-Aware Schedule ({hours}h available):**\n\n");
        let label = self.energy_label();
        let mut chars = label.chars();
        let title: String = chars
            .next()
            .map(|c| c.to_uppercase().chain(chars).collect())
            .unwrap_or_default();
        out.push_str(&format!("**Current Energy Level:** {title}\n\n"));
        out.push_str(match self.energy {
            Some(EnergyLevel::High) => "💪 **High Energy Plan:** Warm up with easy wins, then ride the momentum into harder work\n\n",
            Some(EnergyLevel::Medium) => "🔋 **Medium Energy Plan:** Balance difficulty, include breaks\n\n",
            Some(EnergyLevel::Low) => "🪫 **Low Energy Plan:** Focus on easier tasks, shorter sessions\n\n",
            None => "🤔 **Default Plan:** Balanced approach for unknown energy\n\n",
        });

        for (i, s) in self.scheduled.iter().enumerate() {
            let diff = s.task.difficulty();
            let marker = match diff {
                "easy" => "🟢",
                "medium" => "🟡",
                "hard" => "🔴",
                _ => "🤔",
            };
            out.push_str(&format!("**{}. {} {}**\n", i + 1, marker, s.task.name));
            out.push_str(&format!(
                "   ⏰ {}-{} ({}min)\n",
                s.start.format("%H:%M"),
                s.end.format("%H:%M"),
                s.task.minutes()
            ));
            out.push_str(&format!("   📊 Difficulty: {diff}\n\n"));
            if let Some(b) = s.break_after {
                out.push_str(&format!("   ☕ Break: {b} minutes\n\n"));
            }
        }

        if !self.dropped.is_empty() {
            let names: Vec<&str> = self.dropped.iter().map(|t| t.name.as_str()).collect();
            out.push_str(&format!("**⏭️ Didn't fit today:** {}\n\n", names.join(", ")));
        }

        let remaining = self.remaining_minutes();
        if remaining > 0 {
            out.push_str(&format!("**💡 Remaining time:** {remaining} minutes\n"));
            out.push_str("Use for review, planning, or flexible tasks.");
        }
        out
    }
}

impl fmt::Display for EnergySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Order tasks by the energy-specific difficulty preference; unknown difficulties go last.
pub fn order_tasks(tasks: &[EnergyTask], energy: Option<EnergyLevel>) -> Vec<EnergyTask> {
    let order = preferred_order(energy);
    let rank = |t: &EnergyTask| {
        order
            .iter()
            .position(|d| *d == t.difficulty())
            .unwrap_or(order.len())
    };
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(|t| rank(t));
    sorted
}

/// Greedy fill from `now`. Stops at the first task or break that would
/// overrun the budget; everything after that is reported as dropped.
pub fn schedule_by_energy(
    tasks: &[EnergyTask],
    energy: Option<EnergyLevel>,
    available_hours: f64,
    now: NaiveDateTime,
) -> EnergySchedule {
    let raw = available_hours * 60.0;
    let budget = if raw.is_finite() && raw > 0.0 { raw.trunc() as u32 } else { 0 };
    let ordered = order_tasks(tasks, energy);
    let pause = break_minutes(energy);

    let mut clock = now;
    let mut used = 0u32;
    let mut scheduled = Vec::new();
    let mut next = 0;

    while next < ordered.len() {
        let task = &ordered[next];
        let minutes = task.minutes();
        if used.saturating_add(minutes) > budget {
            debug!(task = task.name.as_str(), minutes, used, budget, "task does not fit");
            break;
        }
        let start = clock;
        clock += Duration::minutes(i64::from(minutes));
        used += minutes;
        next += 1;

        let is_last = next == ordered.len();
        let mut break_after = None;
        let mut out_of_time = false;
        if let (Some(b), false) = (pause, is_last) {
            if used + b > budget {
                out_of_time = true;
            } else {
                clock += Duration::minutes(i64::from(b));
                used += b;
                break_after = Some(b);
            }
        }
        scheduled.push(ScheduledTask {
            task: task.clone(),
            start,
            end: start + Duration::minutes(i64::from(minutes)),
            break_after,
        });
        if out_of_time {
            break;
        }
    }

    let dropped = ordered[next..].to_vec();
    info!(
        energy = energy.map(|e| e.as_str()).unwrap_or("unknown"),
        scheduled = scheduled.len(),
        dropped = dropped.len(),
        used,
        budget,
        "energy-aware schedule built"
    );

    EnergySchedule {
        energy,
        budget_minutes: budget,
        scheduled,
        dropped,
        used_minutes: used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_iso;

    fn now() -> NaiveDateTime {
        parse_iso("2026-03-01T09:00").unwrap()
    }

    fn sample() -> Vec<EnergyTask> {
        vec![
            EnergyTask::new("DSA problems").with_difficulty("hard").with_minutes(60),
            EnergyTask::new("Email prof").with_difficulty("easy").with_minutes(10),
            EnergyTask::new("Read chapter").with_minutes(40),
            EnergyTask::new("Meditate").with_difficulty("zen").with_minutes(5),
        ]
    }

    fn names(s: &EnergySchedule) -> Vec<&str> {
        s.scheduled.iter().map(|t| t.task.name.as_str()).collect()
    }

    #[test]
    fn test_order_by_energy() {
        let high = order_tasks(&sample(), Some(EnergyLevel::High));
        let high: Vec<&str> = high.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(high, vec!["Email prof", "Read chapter", "DSA problems", "Meditate"]);

        let medium = order_tasks(&sample(), Some(EnergyLevel::Medium));
        assert_eq!(medium[0].name, "Read chapter");

        // hard is not in the low-energy table so it ties with unknown difficulties
        let low = order_tasks(&sample(), Some(EnergyLevel::Low));
        let low: Vec<&str> = low.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(low, vec!["Email prof", "Read chapter", "DSA problems", "Meditate"]);
    }

    #[test]
    fn test_no_breaks_at_high_energy() {
        let s = schedule_by_energy(&sample(), Some(EnergyLevel::High), 2.0, now());
        assert_eq!(s.used_minutes, 115);
        assert!(s.scheduled.iter().all(|t| t.break_after.is_none()));
        assert_eq!(s.scheduled[1].start, parse_iso("2026-03-01T09:10").unwrap());
        assert!(s.dropped.is_empty());
    }

    #[test]
    fn test_breaks_between_tasks_at_medium_energy() {
        let tasks = vec![
            EnergyTask::new("a").with_minutes(30),
            EnergyTask::new("b").with_minutes(30),
        ];
        let s = schedule_by_energy(&tasks, Some(EnergyLevel::Medium), 2.0, now());
        assert_eq!(s.scheduled[0].break_after, Some(10));
        assert_eq!(s.scheduled[1].break_after, None);
        assert_eq!(s.scheduled[1].start, parse_iso("2026-03-01T09:40").unwrap());
        assert_eq!(s.used_minutes, 70);
    }

    #[test]
    fn test_overflow_stops_and_reports_dropped() {
        let s = schedule_by_energy(&sample(), None, 1.0, now());
        assert_eq!(names(&s), vec!["Email prof", "Read chapter"]);
        let dropped: Vec<&str> = s.dropped.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(dropped, vec!["DSA problems", "Meditate"]);
        assert!(s.render().contains("Didn't fit today:** DSA problems, Meditate"));
    }

    #[test]
    fn test_break_that_overruns_ends_schedule() {
        let tasks = vec![
            EnergyTask::new("a").with_minutes(55),
            EnergyTask::new("b").with_minutes(5),
        ];
        let s = schedule_by_energy(&tasks, Some(EnergyLevel::Low), 1.0, now());
        assert_eq!(names(&s), vec!["a"]);
        assert_eq!(s.used_minutes, 55);
        assert_eq!(s.dropped.len(), 1);
    }

    #[test]
    fn test_zero_budget() {
        let s = schedule_by_energy(&sample(), Some(EnergyLevel::Low), -1.0, now());
        assert!(s.scheduled.is_empty());
        assert_eq!(s.dropped.len(), 4);
        assert_eq!(s.remaining_minutes(), 0);
    }

    #[test]
    fn test_parse_spec() {
        let t = EnergyTask::parse_spec("OS notes:Hard:45");
        assert_eq!(t.difficulty(), "hard");
        assert_eq!(t.minutes(), 45);
        let t = EnergyTask::parse_spec("Laundry");
        assert_eq!(t.difficulty(), "medium");
        assert_eq!(t.minutes(), 30);
        assert_eq!(EnergyTask::parse_spec("x:easy:lots").duration_minutes, None);
    }
}
