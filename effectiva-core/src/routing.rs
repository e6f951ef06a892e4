//! Deterministic routing: map a classified message to the agent that should
//! answer it, and run the local planners directly when one applies.
//!
//! Only messages no planner can handle need an LLM reply; the route tells the
//! caller which agent's prompt and namespace to use for it.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::agents::{AgentKind, AgentProfile, CRISIS_PLANNER, DAY_PLANNER};
use crate::crisis::{CatchupPlan, DEFAULT_CRISIS_HOURS, handle_crisis};
use crate::day_planner::{DayPlan, Location, handle_day};
use crate::extract::extract_mood;
use crate::intent::{Intent, IntentClassifier, IntentPrediction};
use crate::memory::MemorySink;
use crate::mode::ContextMode;
use crate::workspace::Workspace;

/// Below this, a generic_study guess yields to the active context mode.
const MODE_OVERRIDE_BELOW: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteConfidence {
    High,
    Medium,
    Low,
    None,
}

impl RouteConfidence {
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= 0.75 {
            RouteConfidence::High
        } else if confidence >= 0.6 {
            RouteConfidence::Medium
        } else if confidence > 0.0 {
            RouteConfidence::Low
        } else {
            RouteConfidence::None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub agent: AgentKind,
    pub confidence: RouteConfidence,
    pub reason: String,
}

fn mode_agent(mode: ContextMode) -> Option<AgentKind> {
    match mode {
        ContextMode::Study => Some(AgentKind::Study),
        ContextMode::Work => Some(AgentKind::Work),
        ContextMode::Life => Some(AgentKind::Life),
        ContextMode::Balanced => None,
    }
}

/// Pick the agent for a prediction.
///
/// - study-flavoured intents go to the study agent, except crises, which go
///   to whichever agent carries the crisis planner
/// - work, life and meta_productivity go to work, life and scheduling
/// - a weak generic_study guess follows a non-balanced context mode
pub fn route_message(prediction: &IntentPrediction, mode: ContextMode) -> Route {
    let confidence = RouteConfidence::from_score(prediction.confidence);
    let (agent, reason) = match prediction.intent {
        Intent::BcaCrisis => {
            if AgentProfile::for_kind(AgentKind::Scheduling).has_tool(CRISIS_PLANNER) {
                (AgentKind::Scheduling, "crisis: scheduling agent owns the crisis planner".to_string())
            } else {
                (AgentKind::Study, "crisis: academic catch-up".to_string())
            }
        }
        Intent::GenericStudy if prediction.confidence < MODE_OVERRIDE_BELOW => match mode_agent(mode) {
            Some(agent) => (agent, format!("weak generic_study ({}), following {mode} mode", prediction.confidence)),
            None => (AgentKind::Study, "generic_study".to_string()),
        },
        Intent::BcaExamPrep | Intent::BcaAssignment | Intent::BcaLab | Intent::GenericStudy => {
            (AgentKind::Study, prediction.intent.as_str().to_string())
        }
        Intent::Work => (AgentKind::Work, "work".to_string()),
        Intent::Life => (AgentKind::Life, "life".to_string()),
        Intent::MetaProductivity => (AgentKind::Scheduling, "meta_productivity".to_string()),
    };
    debug!(intent = prediction.intent.as_str(), agent = agent.as_str(), "routed");
    Route { agent, confidence, reason }
}

/// What the coordinator did with a message.
#[derive(Debug, Clone)]
pub enum Outcome {
    Crisis(CatchupPlan),
    Day(DayPlan),
    EnergyCheck(String),
    /// No local planner applies; the routed agent should answer.
    Delegate,
}

#[derive(Debug, Clone)]
pub struct CoordinatorReply {
    pub prediction: IntentPrediction,
    pub route: Route,
    pub outcome: Outcome,
}

impl CoordinatorReply {
    /// Text produced locally, if any.
    pub fn text(&self) -> Option<String> {
        match &self.outcome {
            Outcome::Crisis(plan) => Some(plan.render()),
            Outcome::Day(plan) => Some(plan.render()),
            Outcome::EnergyCheck(msg) => Some(msg.clone()),
            Outcome::Delegate => None,
        }
    }
}

fn is_day_request(text: &str) -> bool {
    text.contains("plan my day") || text.contains("plan today")
}

fn is_energy_check(text: &str) -> bool {
    ["energy", "i feel", "i'm feeling", "im feeling", "feeling ", "mood"]
        .iter()
        .any(|w| text.contains(w))
}

pub struct Coordinator<C> {
    classifier: C,
    location: Option<String>,
    crisis_hours: f64,
    default_location: Location,
}

impl<C: IntentClassifier> Coordinator<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            location: None,
            crisis_hours: DEFAULT_CRISIS_HOURS,
            default_location: Location::Home,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        self.default_location = Location::normalize(&location);
        self.location = Some(location);
        self
    }

    pub fn with_crisis_hours(mut self, hours: f64) -> Self {
        self.crisis_hours = hours;
        self
    }

    pub fn classify(&self, message: &str) -> IntentPrediction {
        self.classifier.classify(message)
    }

    /// Classify, route, and run a planner when one fits the message.
    pub fn handle(
        &self,
        message: &str,
        workspace: &mut Workspace,
        now: NaiveDateTime,
        sink: &mut dyn MemorySink,
    ) -> CoordinatorReply {
        let prediction = self.classifier.classify(message);
        let route = route_message(&prediction, workspace.context.mode());
        let profile = AgentProfile::for_kind(route.agent);
        let text = message.to_lowercase();

        let outcome = if prediction.intent == Intent::BcaCrisis && profile.has_tool(CRISIS_PLANNER) {
            Outcome::Crisis(handle_crisis(
                message,
                self.location.as_deref(),
                self.crisis_hours,
                now,
                sink,
            ))
        } else if is_day_request(&text) && profile.has_tool(DAY_PLANNER) {
            Outcome::Day(handle_day(message, self.default_location, sink))
        } else if is_energy_check(&text) {
            let (mood, level) = extract_mood(&text);
            Outcome::EnergyCheck(workspace.captures.energy_check(mood, level, now))
        } else {
            Outcome::Delegate
        };

        info!(
            intent = prediction.intent.as_str(),
            agent = route.agent.as_str(),
            local = !matches!(outcome, Outcome::Delegate),
            "coordinator handled message"
        );
        CoordinatorReply {
            prediction,
            route,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{HeuristicClassifier, PredictionSource};
    use crate::memory::{InMemorySink, Namespace, RecordKind};
    use crate::task::EnergyLevel;
    use crate::time::parse_iso;

    fn predict(intent: Intent, confidence: f64) -> IntentPrediction {
        IntentPrediction {
            intent,
            confidence,
            source: PredictionSource::Heuristic,
        }
    }

    fn now() -> NaiveDateTime {
        parse_iso("2026-03-02T18:45").unwrap()
    }

    #[test]
    fn test_intent_to_agent() {
        let cases = [
            (Intent::BcaCrisis, AgentKind::Scheduling),
            (Intent::BcaExamPrep, AgentKind::Study),
            (Intent::BcaAssignment, AgentKind::Study),
            (Intent::BcaLab, AgentKind::Study),
            (Intent::GenericStudy, AgentKind::Study),
            (Intent::Work, AgentKind::Work),
            (Intent::Life, AgentKind::Life),
            (Intent::MetaProductivity, AgentKind::Scheduling),
        ];
        for (intent, agent) in cases {
            let r = route_message(&predict(intent, 0.7), ContextMode::Balanced);
            assert_eq!(r.agent, agent, "{intent}");
        }
    }

    #[test]
    fn test_weak_generic_follows_mode() {
        let weak = predict(Intent::GenericStudy, 0.5);
        assert_eq!(route_message(&weak, ContextMode::Work).agent, AgentKind::Work);
        assert_eq!(route_message(&weak, ContextMode::Life).agent, AgentKind::Life);
        assert_eq!(route_message(&weak, ContextMode::Balanced).agent, AgentKind::Study);

        let r = route_message(&weak, ContextMode::Work);
        assert_eq!(r.confidence, RouteConfidence::Low);
        assert!(r.reason.contains("work mode"));

        // Confident guesses ignore the mode.
        let strong = predict(Intent::GenericStudy, 0.65);
        assert_eq!(route_message(&strong, ContextMode::Work).agent, AgentKind::Study);
        assert_eq!(route_message(&predict(Intent::Life, 0.6), ContextMode::Work).agent, AgentKind::Life);
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(RouteConfidence::from_score(0.8), RouteConfidence::High);
        assert_eq!(RouteConfidence::from_score(0.6), RouteConfidence::Medium);
        assert_eq!(RouteConfidence::from_score(0.5), RouteConfidence::Low);
        assert_eq!(RouteConfidence::from_score(0.0), RouteConfidence::None);
    }

    #[test]
    fn test_coordinator_runs_crisis_planner() {
        let mut ws = Workspace::new(now());
        let mut sink = InMemorySink::new();
        let reply = Coordinator::new(HeuristicClassifier).handle(
            "I am 5 days behind and feeling overwhelmed",
            &mut ws,
            now(),
            &mut sink,
        );
        assert_eq!(reply.route.agent, AgentKind::Scheduling);
        let Outcome::Crisis(plan) = &reply.outcome else {
            panic!("expected crisis plan, got {:?}", reply.outcome);
        };
        assert_eq!(plan.total_minutes, 120);
        assert_eq!(sink.count(Namespace::Coordinator, RecordKind::CrisisEpisode), 1);
        // Crisis wins over the energy check.
        assert!(ws.captures.is_empty());
    }

    #[test]
    fn test_coordinator_plans_day() {
        let mut ws = Workspace::new(now());
        let mut sink = InMemorySink::new();
        let reply = Coordinator::new(HeuristicClassifier)
            .with_location("college")
            .handle("plan my day, 3 hours free", &mut ws, now(), &mut sink);
        assert_eq!(reply.prediction.intent, Intent::MetaProductivity);
        let Outcome::Day(plan) = &reply.outcome else {
            panic!("expected day plan");
        };
        assert_eq!(plan.location, Location::College);
        assert_eq!(plan.num_blocks(), 2);
        assert!(reply.text().unwrap().contains("Afternoon"));
    }

    #[test]
    fn test_coordinator_records_energy() {
        let mut ws = Workspace::new(now());
        let mut sink = InMemorySink::new();
        let reply = Coordinator::new(HeuristicClassifier).handle("feeling tired today", &mut ws, now(), &mut sink);
        assert!(matches!(reply.outcome, Outcome::EnergyCheck(_)));
        assert_eq!(ws.captures.current_energy(), Some(EnergyLevel::Low));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_coordinator_delegates_the_rest() {
        let mut ws = Workspace::new(now());
        ws.context.switch("work", None, now()).unwrap();
        let mut sink = InMemorySink::new();
        let reply = Coordinator::new(HeuristicClassifier).handle("what should I say to my manager", &mut ws, now(), &mut sink);
        assert!(matches!(reply.outcome, Outcome::Delegate));
        assert_eq!(reply.route.agent, AgentKind::Work);
        assert!(reply.text().is_none());
    }
}
