//! Free-text parameter extraction.
//!
//! Every extractor is total: a field with no matching signal keeps its
//! default, and numbers that overflow count as no match.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::capture::Mood;
use crate::crisis::{CrisisParams, StressLevel};
use crate::day_planner::{DayRequest, Location};
use crate::task::EnergyLevel;

// Compiled once; the patterns are literals so a failure here is a programming error.
static DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+(day|days)").expect("Invalid regex: days"));
static LABS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(lab|labs|practical|practicals)").expect("Invalid regex: labs")
});
static ASSIGNMENTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(assignment|assignments|hw|homework)").expect("Invalid regex: assignments")
});
static EXAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"exam[^\d]*(in\s+)?(\d+)\s+(day|days)").expect("Invalid regex: exam")
});
static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(hour|hours|hr|hrs)").expect("Invalid regex: hours")
});

const DAY_WINDOW: usize = 20;
const STRESS_WORDS: &[&str] = &["stressed", "overwhelmed", "panic", "anxious"];
const ABSENCE_WORDS: &[&str] = &["behind", "missed", "absent"];

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn first_count(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn exam_days(text: &str) -> Option<u32> {
    EXAM_RE
        .captures(text)
        .and_then(|c| c.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

/// Slice `text` around the byte range `[start, end)` widened by `pad`
/// characters on each side.
fn window(text: &str, start: usize, end: usize, pad: usize) -> &str {
    let lo = match pad {
        0 => start,
        _ => text[..start].char_indices().rev().nth(pad - 1).map_or(0, |(i, _)| i),
    };
    let hi = text[end..]
        .char_indices()
        .nth(pad)
        .map_or(text.len(), |(i, _)| end + i);
    &text[lo..hi]
}

/// Crisis parameters from a message like "I'm 5 days behind, missed 2 labs".
pub fn extract_crisis(message: &str) -> CrisisParams {
    let text = message.to_lowercase();
    let mut params = CrisisParams::default();

    params.stress_level = Some(if contains_any(&text, STRESS_WORDS) {
        StressLevel::High
    } else {
        StressLevel::Medium
    });

    let days = DAYS_RE.captures_iter(&text).find_map(|c| {
        let whole = c.get(0)?;
        let ctx = window(&text, whole.start(), whole.end(), DAY_WINDOW);
        if contains_any(ctx, ABSENCE_WORDS) {
            c.get(1)?.as_str().parse::<u32>().ok()
        } else {
            None
        }
    });
    match days {
        Some(d) => params.days_missed = d,
        None => debug!(default = params.days_missed, "days_missed not found in message"),
    }

    if let Some(labs) = first_count(&LABS_RE, &text) {
        params.labs_missed = labs;
    }
    match first_count(&ASSIGNMENTS_RE, &text) {
        Some(n) => params.assignments_pending = n,
        None => debug!(default = params.assignments_pending, "assignments_pending not found"),
    }
    params.upcoming_exam_in_days = exam_days(&text);

    params
}

/// Day-planning request from a message like "at college today, 4 hours, lab at 2".
pub fn extract_day(message: &str, default_location: Location) -> DayRequest {
    let text = message.to_lowercase();

    let location = if contains_any(&text, &["college", "campus", "class"]) {
        Location::College
    } else if contains_any(&text, &["home", "house"]) {
        Location::Home
    } else {
        default_location
    };

    let available_hours = HOURS_RE
        .captures(&text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or_else(|| {
            debug!("available hours not found, assuming 6");
            6.0
        });

    let mut assignments_pending = u32::from(contains_any(&text, &["assignment", "homework"]));
    if let Some(n) = first_count(&ASSIGNMENTS_RE, &text) {
        assignments_pending = n;
    }

    DayRequest {
        location,
        available_hours,
        assignments_pending,
        labs_today: u32::from(contains_any(&text, &["lab", "practical"])),
        projects_active: text.contains("project"),
        upcoming_exam_in_days: exam_days(&text),
    }
}

/// Mood and energy implied by a short status line.
pub fn extract_mood(message: &str) -> (Mood, EnergyLevel) {
    let text = message.to_lowercase();
    if contains_any(&text, &["tired", "exhausted", "drained"]) {
        (Mood::Tired, EnergyLevel::Low)
    } else if contains_any(&text, &["great", "awesome", "energized"]) {
        (Mood::Great, EnergyLevel::High)
    } else if contains_any(&text, &["good", "okay", "fine"]) {
        (Mood::Good, EnergyLevel::Medium)
    } else if contains_any(&text, &["stressed", "anxious", "overwhelmed"]) {
        (Mood::Stressed, EnergyLevel::Low)
    } else {
        (Mood::Unknown, EnergyLevel::Medium)
    }
}
