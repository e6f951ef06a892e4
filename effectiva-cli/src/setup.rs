use anyhow::Result;
use effectiva_core::memory::store_student_profile;
use effectiva_core::time::parse_hhmm;
use effectiva_core::{MemorySink, Namespace, StudentProfile};
use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::state::{Paths, Profile, read_profile, write_profile};

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

fn prompt_multiline(label: &str) -> Result<Vec<String>> {
    println!("{} (enter one per line; blank line to finish)", label);
    let mut out = Vec::new();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let mut s = String::new();
        io::stdin().read_line(&mut s)?;
        let s = s.trim().to_string();
        if s.is_empty() {
            break;
        }
        out.push(s);
    }
    Ok(out)
}

fn optional(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Keep a wake/sleep time only if it reads as HH:MM.
fn clock(s: String) -> Option<String> {
    match parse_hhmm(&s) {
        Some(_) => Some(s),
        None => {
            if !s.is_empty() {
                println!("  (ignoring {s:?}; expected HH:MM)");
            }
            None
        }
    }
}

/// `key=value` lines into a map; lines without `=` are skipped.
pub(crate) fn parse_preferences(lines: &[String]) -> Option<BTreeMap<String, String>> {
    let prefs: BTreeMap<String, String> = lines
        .iter()
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect();
    if prefs.is_empty() { None } else { Some(prefs) }
}

pub fn run_setup(paths: &Paths, sink: &mut dyn MemorySink) -> Result<()> {
    println!("Effectiva setup\n");
    let existing = read_profile(paths)?;

    let name = prompt("Your name (optional)")?;
    let branch = prompt("Programme (default BCA)")?;
    let semester = prompt("Current semester (optional)")?;
    let wake = prompt("Usual wake time, HH:MM (optional)")?;
    let sleep = prompt("Usual sleep time, HH:MM (optional)")?;
    let duties = prompt("Home duties, in a sentence (optional)")?;
    let prefs = prompt_multiline("Study preferences as key=value, e.g. focus_window=morning")?;

    let mut student = StudentProfile::default();
    if !branch.is_empty() {
        student.branch = branch;
    }
    student.semester = semester.parse().ok();
    student.typical_wake_time = clock(wake);
    student.typical_sleep_time = clock(sleep);
    student.home_duty_pattern = optional(duties);
    student.study_preferences = parse_preferences(&prefs);

    let profile = Profile {
        created_at_utc: existing
            .created_at_utc
            .or_else(|| Some(chrono::Utc::now().to_rfc3339())),
        name: optional(name).or(existing.name),
        student,
    };
    write_profile(paths, &profile)?;
    let remembered = store_student_profile(sink, Namespace::Coordinator, &profile.student);

    println!("\nWrote:");
    println!("- {}", paths.profile().display());
    if remembered {
        println!("- {}", paths.memory_dir().join("coordinator.toon").display());
    } else {
        println!("(profile not added to memory; see the log for details)");
    }

    println!("\nNext recommended steps:");
    println!("- effectiva config init        (LLM provider, timezone, default location)");
    println!("- effectiva plan-day \"I'm at home with 5 hours free\"");
    println!("- effectiva chat");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_parse() {
        let lines = vec![
            "focus_window = morning".to_string(),
            "no equals sign".to_string(),
            "music=".to_string(),
            "breaks=short".to_string(),
        ];
        let prefs = parse_preferences(&lines).unwrap();
        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs["focus_window"], "morning");
        assert_eq!(prefs["breaks"], "short");
        assert!(parse_preferences(&[]).is_none());
    }

    #[test]
    fn test_spaced_preference_keys_reach_memory() {
        let prefs = parse_preferences(&["focus time = morning".to_string()]).unwrap();
        let student = StudentProfile {
            study_preferences: Some(prefs),
            ..StudentProfile::default()
        };
        let mut sink = effectiva_core::InMemorySink::new();
        assert!(store_student_profile(&mut sink, Namespace::Coordinator, &student));
    }

    #[test]
    fn test_clock_filters_bad_times() {
        assert_eq!(clock("06:30".into()).as_deref(), Some("06:30"));
        assert_eq!(clock("late".into()), None);
        assert_eq!(clock(String::new()), None);
    }
}
