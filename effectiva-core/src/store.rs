//! In-memory task list and calendar.
//!
//! Both stores keep insertion order and hand out ids of the form
//! `task_{n}_{unix_ts}` / `event_{n}_{unix_ts}`, where `n` only grows.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::task::{Importance, TaskStatus};
use crate::time::parse_iso;

const DAY_START_HOUR: u32 = 8;
const DAY_END_HOUR: u32 = 22;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid time {0:?}, expected YYYY-MM-DDTHH:MM")]
    InvalidTime(String),
    #[error("event ends ({end}) before it starts ({start})")]
    EndsBeforeStart { start: NaiveDateTime, end: NaiveDateTime },
}

impl StoreError {
    fn task(id: &str) -> Self {
        StoreError::NotFound {
            kind: "Task",
            id: id.to_string(),
        }
    }

    fn event(id: &str) -> Self {
        StoreError::NotFound {
            kind: "Event",
            id: id.to_string(),
        }
    }
}

fn stamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H:%M:%S").to_string()
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Importance,
    /// study, work, life, personal, general...
    pub category: String,
    pub deadline: Option<String>,
    pub status: TaskStatus,
    pub created_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
    pub priority: Option<Importance>,
}

impl TaskFilter {
    fn matches(&self, t: &StoredTask) -> bool {
        self.status.is_none_or(|s| t.status == s)
            && self.category.as_deref().is_none_or(|c| t.category == c)
            && self.priority.is_none_or(|p| t.priority == p)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskStore {
    tasks: Vec<StoredTask>,
    #[serde(default)]
    issued: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&StoredTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut StoredTask, StoreError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::task(id))
    }

    pub fn create(
        &mut self,
        title: &str,
        description: &str,
        priority: Importance,
        category: &str,
        deadline: Option<&str>,
        now: NaiveDateTime,
    ) -> &StoredTask {
        self.issued += 1;
        let id = format!("task_{}_{}", self.issued, now.and_utc().timestamp());
        debug!(id = id.as_str(), "task created");
        self.tasks.push(StoredTask {
            id,
            title: title.to_string(),
            description: description.to_string(),
            priority,
            category: category.to_string(),
            deadline: deadline.map(str::to_string),
            status: TaskStatus::Pending,
            created_at: stamp(now),
            completed_at: None,
        });
        &self.tasks[self.tasks.len() - 1]
    }

    pub fn list(&self, filter: &TaskFilter) -> Vec<&StoredTask> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    pub fn complete(&mut self, id: &str, now: NaiveDateTime) -> Result<&StoredTask, StoreError> {
        let t = self.get_mut(id)?;
        t.status = TaskStatus::Completed;
        t.completed_at = Some(stamp(now));
        Ok(t)
    }

    /// Returns the previous priority.
    pub fn update_priority(&mut self, id: &str, priority: Importance) -> Result<Importance, StoreError> {
        let t = self.get_mut(id)?;
        Ok(std::mem::replace(&mut t.priority, priority))
    }

    pub fn delete(&mut self, id: &str) -> Result<StoredTask, StoreError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::task(id))?;
        Ok(self.tasks.remove(idx))
    }

    /// Pending tasks at high or urgent priority.
    pub fn urgent(&self) -> Vec<&StoredTask> {
        self.tasks
            .iter()
            .filter(|t| t.priority >= Importance::High && t.status == TaskStatus::Pending)
            .collect()
    }
}

pub fn render_tasks(tasks: &[&StoredTask]) -> String {
    if tasks.is_empty() {
        return "No tasks found matching the criteria.".to_string();
    }
    let mut out = format!("**Found {} task(s):**\n\n", tasks.len());
    for t in tasks {
        let icon = if t.status == TaskStatus::Completed { "✓" } else { "○" };
        let deadline = t
            .deadline
            .as_deref()
            .map(|d| format!(" | Deadline: {d}"))
            .unwrap_or_default();
        out.push_str(&format!("{icon} **{}** [{}]{deadline}\n", t.title, t.priority.as_str()));
        if !t.description.is_empty() {
            out.push_str(&format!("   {}\n", t.description));
        }
        out.push_str(&format!("   Category: {} | ID: {}\n\n", t.category, t.id));
    }
    out
}

pub fn render_urgent(tasks: &[&StoredTask]) -> String {
    if tasks.is_empty() {
        return "No urgent tasks at the moment. Great job! 🎉".to_string();
    }
    let mut out = format!("**⚠️ {} Urgent Task(s):**\n\n", tasks.len());
    for t in tasks {
        let due = t
            .deadline
            .as_deref()
            .map(|d| format!(" | Due: {d}"))
            .unwrap_or_default();
        out.push_str(&format!("🔴 **{}** [{}]{due}\n", t.title, t.priority.as_str()));
        out.push_str(&format!("   Category: {}\n\n", t.category));
    }
    out
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// class, work, study, personal, meeting, general...
    pub category: String,
    pub description: String,
    pub location: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl FreeSlot {
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Fields for [`EventStore::add`].
#[derive(Debug, Clone, Default)]
pub struct NewEvent<'a> {
    pub title: &'a str,
    pub start: &'a str,
    pub end: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    pub location: &'a str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventStore {
    events: Vec<Event>,
    #[serde(default)]
    issued: u64,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn add(&mut self, new: NewEvent<'_>, now: NaiveDateTime) -> Result<&Event, StoreError> {
        let start = parse_iso(new.start).ok_or_else(|| StoreError::InvalidTime(new.start.to_string()))?;
        let end = parse_iso(new.end).ok_or_else(|| StoreError::InvalidTime(new.end.to_string()))?;
        if end < start {
            return Err(StoreError::EndsBeforeStart { start, end });
        }
        self.issued += 1;
        let category = if new.category.trim().is_empty() { "general" } else { new.category };
        self.events.push(Event {
            id: format!("event_{}_{}", self.issued, now.and_utc().timestamp()),
            title: new.title.to_string(),
            start,
            end,
            category: category.to_string(),
            description: new.description.to_string(),
            location: new.location.to_string(),
            created_at: stamp(now),
        });
        Ok(&self.events[self.events.len() - 1])
    }

    /// Events starting on `date`, earliest first.
    pub fn events_on(&self, date: NaiveDate, category: Option<&str>) -> Vec<&Event> {
        let mut out: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| e.start.date() == date)
            .filter(|e| category.is_none_or(|c| e.category == c))
            .collect();
        out.sort_by_key(|e| e.start);
        out
    }

    /// Gaps of at least `min_minutes` between 08:00 and 22:00 on `date`.
    /// Any event overlapping that window blocks time, including one that
    /// started the night before.
    pub fn free_slots(&self, date: NaiveDate, min_minutes: u32) -> Vec<FreeSlot> {
        let day_start = date.and_time(NaiveTime::from_hms_opt(DAY_START_HOUR, 0, 0).unwrap_or(NaiveTime::MIN));
        let day_end = date.and_time(NaiveTime::from_hms_opt(DAY_END_HOUR, 0, 0).unwrap_or(NaiveTime::MIN));
        let need = Duration::minutes(i64::from(min_minutes));

        let mut busy: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| e.start < day_end && e.end > day_start)
            .collect();
        busy.sort_by_key(|e| e.start);

        let mut slots = Vec::new();
        let mut cursor = day_start;
        for e in busy {
            let gap_end = e.start.clamp(day_start, day_end);
            if gap_end - cursor >= need && gap_end > cursor {
                slots.push(FreeSlot { start: cursor, end: gap_end });
            }
            cursor = cursor.max(e.end);
        }
        if day_end - cursor >= need && day_end > cursor {
            slots.push(FreeSlot { start: cursor, end: day_end });
        }
        slots
    }

    pub fn delete(&mut self, id: &str) -> Result<Event, StoreError> {
        let idx = self
            .events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StoreError::event(id))?;
        Ok(self.events.remove(idx))
    }

    /// Events starting within `[now, now + days]`, earliest first.
    pub fn upcoming(&self, days: u32, now: NaiveDateTime) -> Vec<&Event> {
        let horizon = now
            .checked_add_signed(Duration::days(i64::from(days)))
            .unwrap_or(NaiveDateTime::MAX);
        let mut out: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| e.start >= now && e.start <= horizon)
            .collect();
        out.sort_by_key(|e| e.start);
        out
    }
}

pub fn render_events(date: NaiveDate, events: &[&Event]) -> String {
    if events.is_empty() {
        return format!("No events found for {date}.");
    }
    let mut out = format!("**Events for {date}:**\n\n");
    for e in events {
        out.push_str(&format!(
            "📅 {}-{}: **{}** [{}]\n",
            e.start.format("%H:%M"),
            e.end.format("%H:%M"),
            e.title,
            e.category
        ));
        if !e.location.is_empty() {
            out.push_str(&format!("   📍 {}\n", e.location));
        }
        if !e.description.is_empty() {
            out.push_str(&format!("   {}\n", e.description));
        }
        out.push_str(&format!("   ID: {}\n\n", e.id));
    }
    out
}

pub fn render_free_slots(date: NaiveDate, min_minutes: u32, slots: &[FreeSlot]) -> String {
    if slots.is_empty() {
        return format!("No free slots of {min_minutes} minutes found on {date}.");
    }
    let mut out = format!("**Free time slots on {date} (min {min_minutes} min):**\n\n");
    for s in slots {
        out.push_str(&format!("🕐 {} - {}\n", s.start.format("%H:%M"), s.end.format("%H:%M")));
    }
    out
}

pub fn render_upcoming(days: u32, events: &[&Event]) -> String {
    if events.is_empty() {
        return format!("No events scheduled for the next {days} days.");
    }
    let mut out = format!("**Upcoming Events (next {days} days):**\n\n");
    for e in events {
        out.push_str(&format!(
            "📅 {} at {}: **{}** [{}]\n",
            e.start.format("%Y-%m-%d"),
            e.start.format("%H:%M"),
            e.title,
            e.category
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        parse_iso(s).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn ev<'a>(title: &'a str, start: &'a str, end: &'a str) -> NewEvent<'a> {
        NewEvent {
            title,
            start,
            end,
            category: "class",
            ..NewEvent::default()
        }
    }

    #[test]
    fn test_task_lifecycle() {
        let mut store = TaskStore::new();
        let now = at("2026-03-01T10:00");
        let id = store
            .create("DBMS assignment", "ER diagram", Importance::High, "study", Some("2026-03-04"), now)
            .id
            .clone();
        assert!(id.starts_with("task_1_"));
        store.create("Groceries", "", Importance::Low, "life", None, now);

        assert_eq!(store.urgent().len(), 1);
        assert_eq!(store.update_priority(&id, Importance::Urgent), Ok(Importance::High));
        store.complete(&id, now).unwrap();
        assert!(store.urgent().is_empty());

        let done = store.list(&TaskFilter {
            status: Some(TaskStatus::Completed),
            ..TaskFilter::default()
        });
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].completed_at.as_deref(), Some("2026-03-01T10:00:00"));

        store.delete(&id).unwrap();
        assert_eq!(store.len(), 1);
        // ids keep counting after a delete
        assert!(store.create("x", "", Importance::Medium, "general", None, now).id.starts_with("task_3_"));
    }

    #[test]
    fn test_not_found_sentinel_text() {
        let mut store = TaskStore::new();
        let err = store.complete("task_9_0", at("2026-03-01T10:00")).unwrap_err();
        assert_eq!(err.to_string(), "Task not found: task_9_0");

        let mut events = EventStore::new();
        assert_eq!(events.delete("event_1_0").unwrap_err().to_string(), "Event not found: event_1_0");
    }

    #[test]
    fn test_list_filters_and_render() {
        let mut store = TaskStore::new();
        let now = at("2026-03-01T10:00");
        store.create("Lab record", "", Importance::Medium, "study", None, now);
        store.create("Shift swap", "ask Ravi", Importance::High, "work", Some("2026-03-03"), now);
        let work = store.list(&TaskFilter {
            category: Some("work".into()),
            ..TaskFilter::default()
        });
        let text = render_tasks(&work);
        assert!(text.starts_with("**Found 1 task(s):**"));
        assert!(text.contains("○ **Shift swap** [high] | Deadline: 2026-03-03"));
        assert!(text.contains("   ask Ravi\n"));
        assert_eq!(render_tasks(&[]), "No tasks found matching the criteria.");
    }

    #[test]
    fn test_free_slots_between_events() {
        let mut cal = EventStore::new();
        let now = at("2026-03-01T10:00");
        cal.add(ev("DS lecture", "2026-03-02T09:00", "2026-03-02T10:30"), now).unwrap();
        cal.add(ev("Lab", "2026-03-02T11:00", "2026-03-02T13:00"), now).unwrap();
        cal.add(ev("Shift", "2026-03-02T18:00", "2026-03-02T21:30"), now).unwrap();

        let slots = cal.free_slots(day(), 60);
        let text: Vec<String> = slots
            .iter()
            .map(|s| format!("{}-{}", s.start.format("%H:%M"), s.end.format("%H:%M")))
            .collect();
        assert_eq!(text, vec!["08:00-09:00", "13:00-18:00"]);

        let slots = cal.free_slots(day(), 30);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[3].minutes(), 30);
    }

    #[test]
    fn test_empty_day_is_fully_free() {
        let cal = EventStore::new();
        let slots = cal.free_slots(day(), 60);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].minutes(), 14 * 60);
    }

    #[test]
    fn test_overnight_event_blocks_the_morning() {
        let mut cal = EventStore::new();
        let now = at("2026-03-01T10:00");
        cal.add(ev("Night shift", "2026-03-01T23:00", "2026-03-02T09:00"), now).unwrap();
        cal.add(ev("Late talk", "2026-03-02T21:00", "2026-03-03T01:00"), now).unwrap();

        let slots = cal.free_slots(day(), 60);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start, at("2026-03-02T09:00"));
        assert_eq!(slots[0].end, at("2026-03-02T21:00"));
    }

    #[test]
    fn test_rejects_bad_times() {
        let mut cal = EventStore::new();
        let now = at("2026-03-01T10:00");
        assert!(matches!(
            cal.add(ev("x", "tomorrow", "2026-03-02T10:00"), now),
            Err(StoreError::InvalidTime(_))
        ));
        assert!(matches!(
            cal.add(ev("x", "2026-03-02T10:00", "2026-03-02T09:00"), now),
            Err(StoreError::EndsBeforeStart { .. })
        ));
    }

    #[test]
    fn test_events_on_and_upcoming() {
        let mut cal = EventStore::new();
        let now = at("2026-03-01T10:00");
        cal.add(ev("Late", "2026-03-02T15:00", "2026-03-02T16:00"), now).unwrap();
        cal.add(ev("Early", "2026-03-02T08:30", "2026-03-02T09:00"), now).unwrap();
        cal.add(ev("Far", "2026-03-20T08:30", "2026-03-20T09:00"), now).unwrap();
        cal.add(ev("Past", "2026-02-20T08:30", "2026-02-20T09:00"), now).unwrap();

        let today: Vec<&str> = cal.events_on(day(), None).iter().map(|e| e.title.as_str()).collect();
        assert_eq!(today, vec!["Early", "Late"]);
        assert!(cal.events_on(day(), Some("work")).is_empty());

        let soon = cal.upcoming(7, now);
        assert_eq!(soon.len(), 2);
        assert!(render_upcoming(7, &soon).contains("📅 2026-03-02 at 08:30: **Early** [class]"));
    }

    #[test]
    fn test_upcoming_with_huge_horizon() {
        let mut cal = EventStore::new();
        let now = at("2026-03-01T10:00");
        cal.add(ev("Far", "2030-01-01T08:00", "2030-01-01T09:00"), now).unwrap();
        let all = cal.upcoming(u32::MAX, now);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Far");
    }
}
