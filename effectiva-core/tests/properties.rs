//! Property tests for the planners and the TOON codec.

use chrono::NaiveDateTime;
use effectiva_core::crisis::classify_severity;
use effectiva_core::day_planner::{day_minutes, num_blocks};
use effectiva_core::memory::{latest, store_student_profile};
use effectiva_core::time::parse_iso;
use effectiva_core::{
    CrisisEpisode, CrisisParams, EnergyLevel, EnergyTask, InMemorySink, Namespace, RecordKind, ScheduleBlock, Severity,
    StressLevel, StudentProfile, Task, TaskStatus, plan_catchup, schedule_by_energy, toon,
};
use proptest::prelude::*;

fn now() -> NaiveDateTime {
    parse_iso("2026-03-02T18:45").unwrap()
}

fn energy() -> impl Strategy<Value = Option<EnergyLevel>> {
    prop_oneof![
        Just(None),
        Just(Some(EnergyLevel::Low)),
        Just(Some(EnergyLevel::Medium)),
        Just(Some(EnergyLevel::High)),
    ]
}

/// Text that exercises the codec's quoting rules.
fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,:#\\-\\.\"]{0,24}"
}

fn task() -> impl Strategy<Value = Task> {
    (
        "[a-z0-9-]{1,12}",
        text(),
        proptest::option::of(text()),
        proptest::option::of(0u32..600),
        energy(),
        proptest::option::of(proptest::collection::vec("[a-z0-9-]{1,8}", 0..3)),
    )
        .prop_map(|(id, title, location, minutes, energy, deps)| {
            let mut t = Task::new(id, title).with_kind("assignment");
            t.location = location;
            t.duration_estimate_min = minutes;
            t.energy_level = energy;
            t.dependencies = deps;
            t.status = TaskStatus::InProgress;
            t
        })
}

proptest! {
    #[test]
    fn prop_six_days_missed_is_severe(days in 6u32..1000, labs in 0u32..10, asg in 0u32..10, exam in proptest::option::of(0u32..60)) {
        prop_assert_eq!(classify_severity(days, labs, asg, exam), Severity::Severe);
    }

    #[test]
    fn prop_catchup_starts_with_notes(
        days in 0u32..30,
        labs in 0u32..5,
        asg in 0u32..5,
        exam in proptest::option::of(0u32..30),
        hours in -2.0f64..12.0,
    ) {
        let params = CrisisParams {
            days_missed: days,
            labs_missed: labs,
            assignments_pending: asg,
            upcoming_exam_in_days: exam,
            ..CrisisParams::default()
        };
        let mut sink = InMemorySink::new();
        let plan = plan_catchup(&params, None, hours, now(), &mut sink);
        prop_assert!(!plan.tasks().is_empty());
        prop_assert!(plan.tasks().len() <= 5);
        prop_assert!(plan.tasks()[0].title.contains("classmates"));
        prop_assert!(plan.block.duration_min.unwrap_or(0) >= 1);
    }

    #[test]
    fn prop_blocks_are_monotone(a in 0.0f64..24.0, b in 0.0f64..24.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let n_lo = num_blocks(day_minutes(lo));
        let n_hi = num_blocks(day_minutes(hi));
        prop_assert!((1..=3).contains(&n_lo));
        prop_assert!(n_lo <= n_hi);
    }

    #[test]
    fn prop_energy_budget_holds(
        minutes in proptest::collection::vec(proptest::option::of(1u32..240), 0..12),
        level in energy(),
        hours in 0.0f64..10.0,
    ) {
        let tasks: Vec<EnergyTask> = minutes
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let t = EnergyTask::new(format!("t{i}")).with_difficulty(["easy", "medium", "hard", "weird"][i % 4]);
                match m {
                    Some(m) => t.with_minutes(*m),
                    None => t,
                }
            })
            .collect();
        let s = schedule_by_energy(&tasks, level, hours, now());
        let task_total: u32 = s.scheduled.iter().map(|x| x.task.minutes()).sum();
        let break_total: u32 = s.scheduled.iter().filter_map(|x| x.break_after).sum();
        prop_assert_eq!(task_total + break_total, s.used_minutes);
        prop_assert!(s.used_minutes as f64 <= hours * 60.0);
        prop_assert_eq!(s.scheduled.len() + s.dropped.len(), tasks.len());
    }

    #[test]
    fn prop_task_toon_roundtrip(t in task()) {
        let encoded = toon::encode(&t).unwrap();
        let back: Task = toon::decode(&encoded).unwrap();
        prop_assert_eq!(back, t);
    }

    #[test]
    fn prop_block_toon_roundtrip(
        tasks in proptest::collection::vec(task(), 0..4),
        label in "[a-z_]{1,16}",
        minutes in proptest::option::of(0u32..600),
        confidence in proptest::option::of(0.0f64..=1.0),
        explanation in proptest::option::of(text()),
    ) {
        let mut block = ScheduleBlock::new(label, tasks);
        block.duration_min = minutes;
        block.confidence = confidence;
        block.explanation = explanation;
        let back: ScheduleBlock = toon::decode(&toon::encode(&block).unwrap()).unwrap();
        prop_assert_eq!(back, block);
    }

    #[test]
    fn prop_episode_toon_roundtrip(
        days in 0u32..100,
        labs in 0u32..10,
        asg in 0u32..10,
        exam in proptest::option::of(0u32..60),
        stressed in any::<bool>(),
        notes in proptest::option::of(text()),
    ) {
        let episode = CrisisEpisode {
            severity: classify_severity(days, labs, asg, exam),
            days_missed: days,
            labs_missed: labs,
            assignments_pending: asg,
            upcoming_exam_in_days: exam,
            stress_level: Some(if stressed { StressLevel::High } else { StressLevel::Medium }),
            notes,
        };
        let back: CrisisEpisode = toon::decode(&toon::encode(&episode).unwrap()).unwrap();
        prop_assert_eq!(back, episode);
    }

    #[test]
    fn prop_any_preference_keys_are_stored(
        prefs in proptest::collection::btree_map("\\PC{0,16}", any::<String>(), 0..6),
        duties in proptest::option::of("\\PC{0,24}"),
    ) {
        let mut profile = StudentProfile::default();
        profile.study_preferences = Some(prefs);
        profile.home_duty_pattern = duties;
        let mut sink = InMemorySink::new();
        prop_assert!(store_student_profile(&mut sink, Namespace::Coordinator, &profile));
        let back: Option<StudentProfile> = latest(&sink, Namespace::Coordinator, RecordKind::StudentProfile);
        prop_assert_eq!(back, Some(profile));
    }

    #[test]
    fn prop_non_ascii_titles_roundtrip(title in "\\PC{0,24}", location in proptest::option::of("\\PC{0,12}")) {
        let mut t = Task::new("t-1", title);
        t.location = location;
        let back: Task = toon::decode(&toon::encode(&t).unwrap()).unwrap();
        prop_assert_eq!(back, t);
    }
}
