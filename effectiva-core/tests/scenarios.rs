//! End-to-end scenarios across extraction, planning, classification and
//! memory persistence.

use chrono::NaiveDateTime;
use effectiva_core::memory::{self, InMemorySink, Namespace, RecordKind};
use effectiva_core::time::parse_iso;
use effectiva_core::{
    CrisisEpisode, DayRequest, DeadlineTask, HeuristicClassifier, IntentClassifier, Location, Outcome, Severity,
    Workspace, classify_heuristic, handle_crisis, plan_day, prioritize,
};

fn now() -> NaiveDateTime {
    parse_iso("2026-03-02T09:00").unwrap()
}

#[test]
fn test_home_day_with_two_assignments_and_exam() {
    let mut sink = InMemorySink::new();
    let req = DayRequest {
        location: Location::Home,
        available_hours: 6.0,
        assignments_pending: 2,
        upcoming_exam_in_days: Some(5),
        ..DayRequest::default()
    };
    let plan = plan_day(&req, &mut sink);

    assert_eq!(plan.num_blocks(), 3);
    let kinds: Vec<Vec<&str>> = plan
        .blocks
        .iter()
        .map(|b| b.tasks.iter().map(|t| t.kind.as_str()).collect())
        .collect();
    assert_eq!(
        kinds,
        vec![
            vec!["assignment", "exam_prep"],
            vec!["assignment"],
            vec!["practice", "revision"],
        ]
    );
    assert!(plan.blocks[0].tasks[0].title.contains("most urgent assignment"));
    assert!(plan.blocks[1].tasks[0].title.contains("second most urgent assignment"));
    assert!(plan.blocks[2].tasks[1].title.starts_with("Light revision"));

    // 360 / 3 = 120 minute blocks
    assert!(plan.blocks.iter().all(|b| b.duration_min == Some(120)));
    assert_eq!(sink.count(Namespace::Study, RecordKind::Task), 5);
    assert_eq!(sink.count(Namespace::Study, RecordKind::ScheduleBlock), 3);
}

#[test]
fn test_heuristic_crisis_json() {
    let p = classify_heuristic("I am 5 days behind and feeling overwhelmed");
    assert_eq!(
        p.to_json(),
        serde_json::json!({"intent": "bca_crisis", "confidence": "0.8"})
    );
    assert_eq!(HeuristicClassifier.classify("I am 5 days behind and feeling overwhelmed"), p);
}

#[test]
fn test_prioritizer_orders_by_score() {
    let tasks = vec![
        DeadlineTask::new("B").with_deadline("2026-03-12T09:00").with_importance("medium"),
        DeadlineTask::new("A").with_deadline("2026-03-04T09:00").with_importance("high"),
    ];
    let ranked = prioritize(&tasks, now());
    assert_eq!(ranked[0].task.name, "A");
    assert_eq!(ranked[0].priority, 14);
    assert_eq!(ranked[1].priority, 4);
}

#[test]
fn test_crisis_message_end_to_end() {
    let mut sink = InMemorySink::new();
    let plan = handle_crisis(
        "missed 7 days of college, 2 labs and 3 assignments, exam in 2 days",
        Some("hostel"),
        1.5,
        now(),
        &mut sink,
    );

    assert_eq!(plan.episode.severity, Severity::Severe);
    assert_eq!(plan.tasks().len(), 4);
    assert_eq!(plan.block.duration_min, Some(75));
    assert!(plan.render().contains("Next ~75 minutes at hostel:"));

    let stored: CrisisEpisode = memory::latest(&sink, Namespace::Coordinator, RecordKind::CrisisEpisode).unwrap();
    assert_eq!(stored, plan.episode);
}

#[test]
fn test_coordinator_over_a_session() {
    let mut ws = Workspace::new(now());
    let mut sink = InMemorySink::new();
    let coordinator = effectiva_core::Coordinator::new(HeuristicClassifier);

    let reply = coordinator.handle("my energy is great today", &mut ws, now(), &mut sink);
    assert!(matches!(reply.outcome, Outcome::EnergyCheck(_)));

    let reply = coordinator.handle("plan my day", &mut ws, now(), &mut sink);
    assert!(matches!(reply.outcome, Outcome::Day(_)));
    assert!(!sink.is_empty());
}
