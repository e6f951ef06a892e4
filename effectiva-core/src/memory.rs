//! Namespaced memory persistence for agents.
//!
//! Objects are TOON-encoded and handed to a [`MemorySink`]. Persistence is
//! best effort: the `store_*` helpers log failures and keep going.

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::crisis::CrisisEpisode;
use crate::schedule::{ScheduleBlock, StudentProfile};
use crate::task::Task;
use crate::toon;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Study,
    Work,
    Life,
    Scheduling,
    Coordinator,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [
        Namespace::Study,
        Namespace::Work,
        Namespace::Life,
        Namespace::Scheduling,
        Namespace::Coordinator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Study => "study",
            Namespace::Work => "work",
            Namespace::Life => "life",
            Namespace::Scheduling => "scheduling",
            Namespace::Coordinator => "coordinator",
        }
    }

    /// Fully qualified name, e.g. "effectiva:study".
    pub fn qualified(&self) -> String {
        format!("effectiva:{}", self.as_str())
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        let s = s.strip_prefix("effectiva:").unwrap_or(&s);
        Self::ALL.into_iter().find(|ns| ns.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Task,
    ScheduleBlock,
    CrisisEpisode,
    StudentProfile,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Task,
        RecordKind::ScheduleBlock,
        RecordKind::CrisisEpisode,
        RecordKind::StudentProfile,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Task => "task",
            RecordKind::ScheduleBlock => "schedule_block",
            RecordKind::CrisisEpisode => "crisis_episode",
            RecordKind::StudentProfile => "student_profile",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub namespace: Namespace,
    pub kind: RecordKind,
    /// TOON text.
    pub payload: String,
}

impl MemoryRecord {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, toon::ToonError> {
        toon::decode(&self.payload)
    }
}

/// Where memory records end up. The CLI writes files; tests use [`InMemorySink`].
pub trait MemorySink {
    fn store(&mut self, record: MemoryRecord) -> Result<()>;

    /// Records in a namespace, oldest first.
    fn records(&self, namespace: Namespace) -> Result<Vec<MemoryRecord>>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    records: Vec<MemoryRecord>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count(&self, namespace: Namespace, kind: RecordKind) -> usize {
        self.records
            .iter()
            .filter(|r| r.namespace == namespace && r.kind == kind)
            .count()
    }
}

impl MemorySink for InMemorySink {
    fn store(&mut self, record: MemoryRecord) -> Result<()> {
        self.records.push(record);
        Ok(())
    }

    fn records(&self, namespace: Namespace) -> Result<Vec<MemoryRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.namespace == namespace)
            .cloned()
            .collect())
    }
}

fn store_encoded<T: Serialize>(
    sink: &mut dyn MemorySink,
    namespace: Namespace,
    kind: RecordKind,
    value: &T,
) -> bool {
    let payload = match toon::encode(value) {
        Ok(p) => p,
        Err(e) => {
            warn!(namespace = namespace.as_str(), kind = kind.as_str(), error = %e, "failed to encode memory record");
            return false;
        }
    };
    match sink.store(MemoryRecord { namespace, kind, payload }) {
        Ok(()) => {
            debug!(namespace = namespace.as_str(), kind = kind.as_str(), "stored memory record");
            true
        }
        Err(e) => {
            warn!(namespace = namespace.as_str(), kind = kind.as_str(), error = %e, "failed to store memory record");
            false
        }
    }
}

pub fn store_task(sink: &mut dyn MemorySink, namespace: Namespace, task: &Task) -> bool {
    store_encoded(sink, namespace, RecordKind::Task, task)
}

pub fn store_schedule_block(sink: &mut dyn MemorySink, namespace: Namespace, block: &ScheduleBlock) -> bool {
    store_encoded(sink, namespace, RecordKind::ScheduleBlock, block)
}

pub fn store_crisis_episode(sink: &mut dyn MemorySink, namespace: Namespace, episode: &CrisisEpisode) -> bool {
    store_encoded(sink, namespace, RecordKind::CrisisEpisode, episode)
}

pub fn store_student_profile(sink: &mut dyn MemorySink, namespace: Namespace, profile: &StudentProfile) -> bool {
    store_encoded(sink, namespace, RecordKind::StudentProfile, profile)
}

/// Most recent record of `kind` in `namespace`, decoded. Undecodable records are skipped.
pub fn latest<T: DeserializeOwned>(sink: &dyn MemorySink, namespace: Namespace, kind: RecordKind) -> Option<T> {
    let records = match sink.records(namespace) {
        Ok(r) => r,
        Err(e) => {
            warn!(namespace = namespace.as_str(), error = %e, "failed to read memory");
            return None;
        }
    };
    records
        .iter()
        .rev()
        .filter(|r| r.kind == kind)
        .find_map(|r| r.decode().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl MemorySink for FailingSink {
        fn store(&mut self, _record: MemoryRecord) -> Result<()> {
            anyhow::bail!("disk full")
        }

        fn records(&self, _namespace: Namespace) -> Result<Vec<MemoryRecord>> {
            anyhow::bail!("unreadable")
        }
    }

    #[test]
    fn test_namespace_names() {
        assert_eq!(Namespace::Study.qualified(), "effectiva:study");
        assert_eq!(Namespace::parse("effectiva:coordinator"), Some(Namespace::Coordinator));
        assert_eq!(Namespace::parse("Work"), Some(Namespace::Work));
        assert_eq!(Namespace::parse("finance"), None);
    }

    #[test]
    fn test_store_and_recall_latest() {
        let mut sink = InMemorySink::new();
        assert!(store_task(&mut sink, Namespace::Study, &Task::new("a", "first")));
        assert!(store_task(&mut sink, Namespace::Study, &Task::new("b", "second")));
        assert!(store_task(&mut sink, Namespace::Work, &Task::new("c", "other")));

        let t: Task = latest(&sink, Namespace::Study, RecordKind::Task).unwrap();
        assert_eq!(t.id, "b");
        assert_eq!(sink.count(Namespace::Study, RecordKind::Task), 2);
        assert!(latest::<Task>(&sink, Namespace::Life, RecordKind::Task).is_none());
    }

    #[test]
    fn test_profile_roundtrip_through_sink() {
        let mut sink = InMemorySink::new();
        let mut profile = StudentProfile::default();
        profile.semester = Some(3);
        profile.home_duty_pattern = Some("cooking in the evening, sibling pickup at 4".into());
        store_student_profile(&mut sink, Namespace::Coordinator, &profile);

        let back: StudentProfile = latest(&sink, Namespace::Coordinator, RecordKind::StudentProfile).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_profile_with_spaced_preference_keys_is_stored() {
        let mut sink = InMemorySink::new();
        let mut profile = StudentProfile::default();
        profile.study_preferences = Some(
            [("focus time", "morning"), ("break length", "10 min")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        assert!(store_student_profile(&mut sink, Namespace::Coordinator, &profile));

        let back: StudentProfile = latest(&sink, Namespace::Coordinator, RecordKind::StudentProfile).unwrap();
        assert_eq!(back.study_preferences.unwrap()["focus time"], "morning");
    }

    #[test]
    fn test_failures_are_swallowed() {
        let mut sink = FailingSink;
        assert!(!store_task(&mut sink, Namespace::Study, &Task::new("a", "x")));
        assert!(latest::<Task>(&sink, Namespace::Study, RecordKind::Task).is_none());
    }
}
