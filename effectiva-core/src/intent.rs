//! Intent classification: a keyword heuristic and a model-backed classifier
//! that falls back to it.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BcaCrisis,
    BcaExamPrep,
    BcaAssignment,
    BcaLab,
    GenericStudy,
    Work,
    Life,
    MetaProductivity,
}

impl Intent {
    pub const ALL: [Intent; 8] = [
        Intent::BcaCrisis,
        Intent::BcaExamPrep,
        Intent::BcaAssignment,
        Intent::BcaLab,
        Intent::GenericStudy,
        Intent::Work,
        Intent::Life,
        Intent::MetaProductivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::BcaCrisis => "bca_crisis",
            Intent::BcaExamPrep => "bca_exam_prep",
            Intent::BcaAssignment => "bca_assignment",
            Intent::BcaLab => "bca_lab",
            Intent::GenericStudy => "generic_study",
            Intent::Work => "work",
            Intent::Life => "life",
            Intent::MetaProductivity => "meta_productivity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_matches('"').to_lowercase();
        Self::ALL.into_iter().find(|i| i.as_str() == s)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Heuristic,
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentPrediction {
    pub intent: Intent,
    pub confidence: f64,
    pub source: PredictionSource,
}

impl IntentPrediction {
    fn heuristic(intent: Intent, confidence: f64) -> Self {
        Self {
            intent,
            confidence,
            source: PredictionSource::Heuristic,
        }
    }

    /// `{"intent": "...", "confidence": "0.8"}`, confidence as a string.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "intent": self.intent.as_str(),
            "confidence": self.confidence.to_string(),
        })
    }
}

impl fmt::Display for IntentPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.intent, self.confidence)
    }
}

pub trait IntentClassifier {
    fn classify(&self, message: &str) -> IntentPrediction;
}

/// Ordered keyword groups; the first group with a hit wins.
const KEYWORD_TABLE: &[(&[&str], Intent, f64)] = &[
    (&["panic", "stressed", "overwhelmed", "crisis", "behind"], Intent::BcaCrisis, 0.8),
    (&["exam", "test"], Intent::BcaExamPrep, 0.75),
    (&["assignment", "homework", "sheet", "submission"], Intent::BcaAssignment, 0.7),
    (&["lab", "practical", "practicals"], Intent::BcaLab, 0.7),
    (&["project"], Intent::GenericStudy, 0.65),
    (&["job", "shift", "office"], Intent::Work, 0.6),
    (&["family", "chores", "cooking", "cleaning"], Intent::Life, 0.6),
    (&["schedule", "plan my day", "productivity", "focus"], Intent::MetaProductivity, 0.6),
];

pub fn classify_heuristic(message: &str) -> IntentPrediction {
    let text = message.to_lowercase();
    KEYWORD_TABLE
        .iter()
        .find(|(words, _, _)| words.iter().any(|w| text.contains(w)))
        .map(|(_, intent, confidence)| IntentPrediction::heuristic(*intent, *confidence))
        .unwrap_or_else(|| IntentPrediction::heuristic(Intent::GenericStudy, 0.5))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl IntentClassifier for HeuristicClassifier {
    fn classify(&self, message: &str) -> IntentPrediction {
        classify_heuristic(message)
    }
}

/// A chat-completion call. Implemented over HTTP in the CLI.
pub trait CompletionBackend {
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

impl<B: CompletionBackend + ?Sized> CompletionBackend for &B {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        (**self).complete(system, user)
    }
}

const DEFAULT_MODEL_CONFIDENCE: f64 = 0.7;

pub fn intent_system_prompt() -> String {
    let labels: Vec<&str> = Intent::ALL.iter().map(|i| i.as_str()).collect();
    format!(
        "Classify a student's request into a high-level intent.\n\
         Allowed intents (must be one of these): {}.\n\
         Reply with a single JSON object: {{\"intent\": \"<label>\", \"confidence\": <0.0-1.0>}}",
        labels.join(", ")
    )
}

/// Pull `intent`/`confidence` out of a model reply that contains a JSON object.
pub fn parse_model_reply(reply: &str) -> Result<IntentPrediction> {
    let start = reply
        .find('{')
        .ok_or_else(|| anyhow::anyhow!("no JSON object in model reply"))?;
    let end = reply
        .rfind('}')
        .filter(|e| *e > start)
        .ok_or_else(|| anyhow::anyhow!("unterminated JSON object in model reply"))?;
    let v: Value = serde_json::from_str(&reply[start..=end])?;

    let intent = match v.get("intent").and_then(Value::as_str) {
        Some(label) => Intent::parse(label).unwrap_or_else(|| {
            debug!(label, "unknown intent label from model");
            Intent::GenericStudy
        }),
        None => Intent::GenericStudy,
    };
    let confidence = match v.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|c: &f64| c.is_finite())
    .map(|c| c.clamp(0.0, 1.0))
    .unwrap_or(DEFAULT_MODEL_CONFIDENCE);

    Ok(IntentPrediction {
        intent,
        confidence,
        source: PredictionSource::Model,
    })
}

pub struct ModelClassifier<B> {
    backend: B,
}

impl<B: CompletionBackend> ModelClassifier<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: CompletionBackend> IntentClassifier for ModelClassifier<B> {
    fn classify(&self, message: &str) -> IntentPrediction {
        let reply = self
            .backend
            .complete(&intent_system_prompt(), message)
            .and_then(|r| parse_model_reply(&r));
        match reply {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "model intent classification failed, using heuristic");
                classify_heuristic(message)
            }
        }
    }
}
