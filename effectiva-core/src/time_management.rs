//! Time blocking, Pomodoro study schedules, break plans and optimal-slot
//! suggestions.

use chrono::{Duration, NaiveDateTime, Timelike};
use std::fmt;

use crate::energy::EnergyTask;
use crate::task::{EnergyLevel, Importance};
use crate::time::format_hhmm;

pub const POMODORO_MINUTES: u32 = 50;
pub const TASK_BREAK_MINUTES: u32 = 10;
/// Upper bound on sessions in one generated study schedule.
pub const MAX_STUDY_SESSIONS: usize = 48;
const MINUTES_PER_DAY: u32 = 24 * 60;

pub fn time_block(activity: &str, minutes: u32, preferred_time: Option<&str>, priority: Importance) -> String {
    let mut out = format!("⏰ Time Block Created:\n**Activity:** {activity}\n**Duration:** {minutes} minutes\n");
    match preferred_time.map(str::trim).filter(|s| !s.is_empty()) {
        Some(t) => {
            out.push_str(&format!("**Suggested Time:** {t}\n"));
            out.push_str(&format!("**Priority:** {}\n", priority.as_str()));
        }
        None => {
            let when = match priority {
                Importance::Urgent => "As soon as possible",
                Importance::High => "Within the next 2 hours",
                Importance::Medium => "Today, during a free slot",
                Importance::Low => "When convenient, this week",
            };
            out.push_str(&format!("**Recommendation:** {when}\n"));
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudySession {
    pub number: usize,
    pub subject: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub break_after: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudySchedule {
    pub hours: u32,
    pub break_minutes: u32,
    pub sessions: Vec<StudySession>,
}

/// Split the available hours into 50 minute sessions, the same number per
/// subject in the order given. Every subject gets at least one session and
/// the schedule never exceeds [`MAX_STUDY_SESSIONS`] unless there are more
/// subjects than that.
pub fn study_schedule(subjects: &[String], hours: u32, break_minutes: u32, now: NaiveDateTime) -> Option<StudySchedule> {
    if subjects.is_empty() {
        return None;
    }
    let fits = (hours.saturating_mul(60) / POMODORO_MINUTES.saturating_add(break_minutes)) as usize;
    let per_subject = (fits / subjects.len())
        .min(MAX_STUDY_SESSIONS / subjects.len())
        .max(1);

    let mut clock = now;
    let mut sessions = Vec::new();
    for subject in subjects {
        for _ in 0..per_subject {
            let number = sessions.len() + 1;
            let start = clock;
            clock = advance(clock, POMODORO_MINUTES);
            let end = clock;
            let break_after = (number < fits).then_some(break_minutes);
            if let Some(b) = break_after {
                clock = advance(clock, b);
            }
            sessions.push(StudySession {
                number,
                subject: subject.clone(),
                start,
                end,
                break_after,
            });
        }
    }
    Some(StudySchedule {
        hours,
        break_minutes,
        sessions,
    })
}

fn advance(clock: NaiveDateTime, minutes: u32) -> NaiveDateTime {
    clock
        .checked_add_signed(Duration::minutes(minutes.into()))
        .unwrap_or(NaiveDateTime::MAX)
}

impl StudySchedule {
    pub fn render(&self) -> String {
        let mut out = format!("**📚 Study Schedule ({}h total):**\n\n", self.hours);
        out.push_str(&format!(
            "Using Pomodoro technique: {POMODORO_MINUTES} min study + {} min break\n\n",
            self.break_minutes
        ));
        for s in &self.sessions {
            out.push_str(&format!(
                "**Session {}:** {}-{} - {}\n",
                s.number,
                s.start.format("%H:%M"),
                s.end.format("%H:%M"),
                s.subject
            ));
            if let Some(b) = s.break_after {
                out.push_str(&format!("   ☕ Break: {b} min\n"));
            }
        }
        out
    }
}

impl fmt::Display for StudySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEstimate {
    pub task_minutes: u32,
    pub break_minutes: u32,
}

impl TimeEstimate {
    pub fn total(&self) -> u32 {
        self.task_minutes.saturating_add(self.break_minutes)
    }
}

/// Total time for a task list, with a 10 minute break between consecutive tasks.
pub fn time_needed(tasks: &[EnergyTask], include_breaks: bool) -> TimeEstimate {
    let gaps = u32::try_from(tasks.len().saturating_sub(1)).unwrap_or(u32::MAX);
    TimeEstimate {
        task_minutes: tasks.iter().map(EnergyTask::minutes).fold(0, u32::saturating_add),
        break_minutes: if include_breaks { gaps.saturating_mul(TASK_BREAK_MINUTES) } else { 0 },
    }
}

pub fn render_time_needed(tasks: &[EnergyTask], estimate: TimeEstimate, include_breaks: bool) -> String {
    if tasks.is_empty() {
        return "No tasks provided.".to_string();
    }
    let total = estimate.total();
    let mut out = format!(
        "**⏱️ Time Calculation:**\n\n**Number of tasks:** {}\n**Total time needed:** {}h {}m\n\n**Task Breakdown:**\n",
        tasks.len(),
        total / 60,
        total % 60
    );
    for (i, t) in tasks.iter().enumerate() {
        out.push_str(&format!("{}. {}: {} min\n", i + 1, t.name, t.minutes()));
    }
    if include_breaks {
        out.push_str(&format!("\n*Includes {} minutes of break time*", estimate.break_minutes));
    }
    out
}

pub fn break_schedule(hours: u32) -> String {
    if hours == 0 {
        return "❌ Work duration must be positive.".to_string();
    }
    let mut out = format!("**☕ Break Schedule for {hours}h work session:**\n\n");
    if hours <= 2 {
        out.push_str("• Take a 5-10 minute break every 50 minutes\n");
        out.push_str(&format!("• Expected breaks: {} short breaks", hours.saturating_mul(2)));
    } else {
        out.push_str("**Recommended schedule:**\n");
        out.push_str("• 50 minutes work → 10 minute short break\n");
        out.push_str("• After 4 sessions (≈3.3h) → 30 minute long break\n");
        out.push_str(&format!("• Total short breaks: {}\n", hours.saturating_mul(2)));
        out.push_str(&format!("• Total long breaks: {}\n\n", hours / 4));
        out.push_str("**Tips:**\n");
        out.push_str("- Stand up and stretch during breaks\n");
        out.push_str("- Stay hydrated\n");
        out.push_str("- Step away from your workspace\n");
        out.push_str("- Do light exercise or walk around");
    }
    out
}

/// Good hour ranges for a kind of task at a given energy level.
fn optimal_ranges(task_type: &str, energy: Option<EnergyLevel>) -> &'static [(u32, u32)] {
    match (task_type, energy) {
        ("study", Some(EnergyLevel::High)) => &[(8, 12), (19, 21)],
        ("study", Some(EnergyLevel::Medium)) => &[(9, 11), (15, 17)],
        ("study", Some(EnergyLevel::Low)) => &[(10, 12), (16, 18)],
        ("creative", Some(EnergyLevel::High)) => &[(10, 12), (20, 22)],
        ("creative", Some(EnergyLevel::Medium)) => &[(14, 16), (19, 21)],
        ("analytical", Some(EnergyLevel::High)) => &[(9, 11), (14, 16)],
        ("meeting", _) => &[(9, 11), (14, 16)],
        _ => &[(9, 17)],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Today { start: u32, end: u32 },
    Tomorrow { start: u32, end: u32 },
}

impl Slot {
    pub fn minutes(&self) -> u32 {
        match *self {
            Slot::Today { start, end } | Slot::Tomorrow { start, end } => end - start,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Today { start, end } => write!(f, "Today {}-{}", format_hhmm(*start), format_hhmm(*end)),
            Slot::Tomorrow { start, end } => write!(f, "Tomorrow {}-{}", format_hhmm(*start), format_hhmm(*end)),
        }
    }
}

/// First range that has not started yet today and can hold the whole task;
/// otherwise the first range tomorrow. Times are minutes since midnight and a
/// slot never ends after 24:00, so a task longer than the rest of the day gets
/// a shorter slot.
pub fn next_optimal_slot(task_type: &str, energy: Option<EnergyLevel>, duration_minutes: u32, now: NaiveDateTime) -> Slot {
    let ranges = optimal_ranges(&task_type.trim().to_lowercase(), energy);
    let hour = now.hour();
    for &(start_h, end_h) in ranges {
        let start = start_h * 60;
        if hour < start_h && start.saturating_add(duration_minutes) <= end_h * 60 {
            return Slot::Today {
                start,
                end: start + duration_minutes,
            };
        }
    }
    let start = ranges[0].0 * 60;
    Slot::Tomorrow {
        start,
        end: start.saturating_add(duration_minutes).min(MINUTES_PER_DAY),
    }
}

/// Markdown advice combining energy and task type, ending with the next slot.
pub fn optimal_time(task_type: &str, energy: Option<EnergyLevel>, duration_minutes: u32, now: NaiveDateTime) -> String {
    let (energy_times, energy_reason) = match energy {
        Some(EnergyLevel::High) => ("8:00-12:00, 14:00-16:00", "High energy - tackle challenging tasks during peak focus times"),
        Some(EnergyLevel::Medium) => ("9:00-11:00, 15:00-17:00", "Medium energy - schedule regular tasks during moderate focus periods"),
        Some(EnergyLevel::Low) => ("10:00-12:00, 16:00-18:00", "Low energy - focus on lighter tasks during easier periods"),
        None => ("9:00-11:00, 14:00-16:00", "Default schedule - adjust based on your energy patterns"),
    };
    let kind = task_type.trim().to_lowercase();
    let (task_times, task_reason) = match kind.as_str() {
        "creative" => ("10:00-12:00, 20:00-22:00", "Mid-morning when mind is flexible, evening when relaxed"),
        "analytical" => ("9:00-11:00, 14:00-16:00", "Morning analytical peak, early afternoon focus"),
        "physical" => ("7:00-9:00, 17:00-19:00", "Morning energy boost, evening stress relief"),
        "meeting" => ("9:00-11:00, 14:00-16:00", "Standard business hours for coordination"),
        _ => ("8:00-12:00, 19:00-21:00", "Morning for deep focus, evening for review"),
    };
    let (emoji, label) = match energy {
        Some(EnergyLevel::High) => ("⚡", "High"),
        Some(EnergyLevel::Medium) => ("🔋", "Medium"),
        Some(EnergyLevel::Low) => ("🪫", "Low"),
        None => ("❓", "Unknown"),
    };

    let mut out = format!("**🎯 Optimal Time for {kind} task ({duration_minutes}min):**\n\n");
    out.push_str(&format!("**Current Energy:** {emoji} {label}\n\n"));
    out.push_str(&format!("**Energy-Based Suggestion:**\n{energy_reason}\n**Recommended Times:** {energy_times}\n\n"));
    out.push_str(&format!("**Task-Specific Guidance:**\n{task_reason}\n**Optimal Times:** {task_times}\n\n"));
    let slot = next_optimal_slot(&kind, energy, duration_minutes, now);
    out.push_str(&format!("**Next Available Slot:** {slot}\n"));
    if slot.minutes() < duration_minutes {
        out.push_str(&format!(
            "⚠️ Only {} of {duration_minutes} minutes fit before midnight; split the task across days.\n",
            slot.minutes()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_iso;

    fn at(s: &str) -> NaiveDateTime {
        parse_iso(s).unwrap()
    }

    #[test]
    fn test_time_block_recommendation_by_priority() {
        let b = time_block("DBMS revision", 45, None, Importance::High);
        assert!(b.contains("**Recommendation:** Within the next 2 hours"));
        let b = time_block("DBMS revision", 45, Some("18:00"), Importance::Low);
        assert!(b.contains("**Suggested Time:** 18:00"));
        assert!(b.contains("**Priority:** low"));
    }

    #[test]
    fn test_study_schedule_splits_sessions() {
        let subjects = vec!["DBMS".to_string(), "Java".to_string()];
        let s = study_schedule(&subjects, 4, 15, at("2026-03-02T09:00")).unwrap();
        // 240 / 65 = 3 sessions fit, so one per subject.
        assert_eq!(s.sessions.len(), 2);
        assert_eq!(s.sessions[0].subject, "DBMS");
        assert_eq!(s.sessions[1].start, at("2026-03-02T10:05"));
        assert!(s.sessions.iter().all(|x| x.break_after == Some(15)));
        assert!(s.render().contains("**Session 2:** 10:05-10:55 - Java"));
    }

    #[test]
    fn test_study_schedule_last_break_dropped() {
        let s = study_schedule(&["OS".to_string()], 2, 10, at("2026-03-02T09:00")).unwrap();
        assert_eq!(s.sessions.len(), 2);
        assert_eq!(s.sessions[1].break_after, None);
        assert!(study_schedule(&[], 2, 10, at("2026-03-02T09:00")).is_none());
    }

    #[test]
    fn test_study_schedule_caps_huge_hours() {
        let s = study_schedule(&["OS".to_string()], 80_000_000, 10, at("2026-03-02T09:00")).unwrap();
        assert_eq!(s.sessions.len(), MAX_STUDY_SESSIONS);
        assert_eq!(s.sessions[1].start, at("2026-03-02T10:00"));

        let s = study_schedule(&["OS".to_string(), "CN".to_string()], u32::MAX, u32::MAX, at("2026-03-02T09:00")).unwrap();
        assert_eq!(s.sessions.len(), 2);
        assert!(s.sessions.iter().all(|x| x.start <= x.end));
    }

    #[test]
    fn test_large_inputs_saturate() {
        let tasks = vec![
            EnergyTask::new("a").with_minutes(u32::MAX),
            EnergyTask::new("b").with_minutes(u32::MAX),
        ];
        assert_eq!(time_needed(&tasks, true).total(), u32::MAX);
        assert!(break_schedule(u32::MAX).contains(&format!("Total short breaks: {}", u32::MAX)));
    }

    #[test]
    fn test_time_needed() {
        let tasks = vec![EnergyTask::new("a").with_minutes(40), EnergyTask::new("b")];
        let e = time_needed(&tasks, true);
        assert_eq!((e.task_minutes, e.break_minutes, e.total()), (70, 10, 80));
        assert_eq!(time_needed(&tasks, false).total(), 70);
        assert!(render_time_needed(&tasks, e, true).contains("**Total time needed:** 1h 20m"));
        assert_eq!(time_needed(&[], true).total(), 0);
    }

    #[test]
    fn test_break_schedule() {
        assert!(break_schedule(0).starts_with("❌"));
        assert!(break_schedule(2).contains("Expected breaks: 4 short breaks"));
        assert!(break_schedule(8).contains("Total long breaks: 2"));
    }

    #[test]
    fn test_next_slot_today_and_tomorrow() {
        let slot = next_optimal_slot("study", Some(EnergyLevel::High), 60, at("2026-03-02T07:30"));
        assert_eq!(slot, Slot::Today { start: 480, end: 540 });
        assert_eq!(slot.to_string(), "Today 08:00-09:00");

        // Morning has started, evening range still ahead.
        let slot = next_optimal_slot("study", Some(EnergyLevel::High), 90, at("2026-03-02T09:10"));
        assert_eq!(slot.to_string(), "Today 19:00-20:30");

        let slot = next_optimal_slot("study", Some(EnergyLevel::High), 90, at("2026-03-02T22:00"));
        assert_eq!(slot.to_string(), "Tomorrow 08:00-09:30");
    }

    #[test]
    fn test_next_slot_falls_back_to_working_hours() {
        let slot = next_optimal_slot("laundry", None, 30, at("2026-03-02T06:00"));
        assert_eq!(slot.to_string(), "Today 09:00-09:30");
        let slot = next_optimal_slot("meeting", Some(EnergyLevel::Low), 240, at("2026-03-02T06:00"));
        assert_eq!(slot.to_string(), "Tomorrow 09:00-13:00");
    }

    #[test]
    fn test_long_task_slot_stops_at_midnight() {
        let slot = next_optimal_slot("study", Some(EnergyLevel::High), 2000, at("2026-03-02T07:00"));
        assert_eq!(slot, Slot::Tomorrow { start: 480, end: 1440 });
        assert_eq!(slot.to_string(), "Tomorrow 08:00-24:00");

        let out = optimal_time("study", Some(EnergyLevel::High), 2000, at("2026-03-02T07:00"));
        assert!(!out.contains("41:20"));
        assert!(out.contains("Only 960 of 2000 minutes fit before midnight"));
        assert!(next_optimal_slot("study", None, u32::MAX, at("2026-03-02T07:00")).minutes() <= 1440);
    }

    #[test]
    fn test_optimal_time_mentions_next_slot() {
        let out = optimal_time("creative", Some(EnergyLevel::High), 60, at("2026-03-02T08:00"));
        assert!(out.contains("**Current Energy:** ⚡ High"));
        assert!(out.contains("**Next Available Slot:** Today 10:00-11:00"));
    }
}
