//! effectiva-core: planners, classifiers and stores for the Effectiva student assistant

pub mod agents;
pub mod capture;
pub mod context;
pub mod crisis;
pub mod day_planner;
pub mod energy;
pub mod extract;
pub mod intent;
pub mod memory;
pub mod mode;
pub mod prioritizer;
pub mod prompts;
pub mod routing;
pub mod schedule;
pub mod store;
pub mod study;
pub mod task;
pub mod time;
pub mod time_management;
pub mod toon;
pub mod workspace;

pub use agents::{AgentKind, AgentProfile};
pub use capture::{CaptureItem, CaptureKind, CaptureLog, Mood, NoteCategory};
pub use context::{ChatTurn, ContextStats, Role, context_stats, optimize_history};
pub use crisis::{CatchupPlan, CrisisEpisode, CrisisParams, Severity, StressLevel, handle_crisis, plan_catchup};
pub use day_planner::{DayPlan, DayRequest, Location, handle_day, plan_day};
pub use energy::{EnergySchedule, EnergyTask, schedule_by_energy};
pub use intent::{
    CompletionBackend, HeuristicClassifier, Intent, IntentClassifier, IntentPrediction, ModelClassifier,
    classify_heuristic,
};
pub use memory::{InMemorySink, MemoryRecord, MemorySink, Namespace, RecordKind};
pub use mode::{ContextMode, ContextState, ModeError};
pub use prioritizer::{DeadlineTask, ScoredTask, prioritize};
pub use prompts::PromptTemplate;
pub use routing::{Coordinator, CoordinatorReply, Outcome, Route, RouteConfidence, route_message};
pub use schedule::{ScheduleBlock, StudentProfile};
pub use store::{Event, EventStore, NewEvent, StoreError, StoredTask, TaskFilter, TaskStore};
pub use task::{EnergyLevel, Importance, Task, TaskStatus};
pub use toon::ToonError;
pub use workspace::Workspace;
