//! Study techniques: spaced repetition, active recall questions and technique
//! recommendations.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Performance assumed when laying out a fresh schedule.
const PLANNED_PERFORMANCE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Leitner,
    Sm2,
    Fibonacci,
    Exponential,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Leitner => "leitner",
            Algorithm::Sm2 => "sm2",
            Algorithm::Fibonacci => "fibonacci",
            Algorithm::Exponential => "exponential",
        }
    }

    /// Unknown names fall back to Leitner.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sm2" => Algorithm::Sm2,
            "fibonacci" => Algorithm::Fibonacci,
            "exponential" => Algorithm::Exponential,
            "leitner" => Algorithm::Leitner,
            other => {
                debug!(algorithm = other, "unknown spaced repetition algorithm, using leitner");
                Algorithm::Leitner
            }
        }
    }

    /// Base interval in days before the `review`-th review (1-based).
    pub fn interval_days(&self, review: u32) -> u32 {
        let table: &[u32] = match self {
            Algorithm::Leitner => &[1, 2, 4, 7, 15, 30],
            Algorithm::Sm2 => &[1, 6],
            Algorithm::Fibonacci => &[1, 1, 2, 3, 5, 8, 13, 21],
            Algorithm::Exponential => return 1u32.checked_shl(review.saturating_sub(1)).unwrap_or(u32::MAX),
        };
        let idx = (review.max(1) as usize - 1).min(table.len() - 1);
        table[idx]
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next review date. The base interval is scaled by `0.5 + performance`
/// (performance clamped to 0..=1) and truncated to whole days.
pub fn next_review(algorithm: Algorithm, review: u32, last: NaiveDate, performance: f64) -> NaiveDate {
    let performance = if performance.is_finite() { performance.clamp(0.0, 1.0) } else { 1.0 };
    let days = (algorithm.interval_days(review) as f64 * (0.5 + performance)) as i64;
    last.checked_add_signed(Duration::days(days)).unwrap_or(last)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudySession {
    pub number: u32,
    pub date: NaiveDate,
    pub topic: String,
    pub focus: &'static str,
    pub technique: &'static str,
    pub duration: &'static str,
}

pub fn session_focus(number: u32) -> &'static str {
    match number {
        0 | 1 => "Initial exposure and overview",
        2..=3 => "Active recall and practice",
        4..=5 => "Deep understanding and connections",
        _ => "Mastery and long-term retention",
    }
}

const TECHNIQUES: [&str; 7] = [
    "Note-taking and concept mapping",
    "Practice testing and self-quizzing",
    "Teaching the material to someone else",
    "Spaced retrieval practice",
    "Interleaved practice with related topics",
    "Elaborative interrogation",
    "Dual coding (diagrams + text)",
];

pub fn session_technique(number: u32) -> &'static str {
    let idx = (number.max(1) as usize - 1).min(TECHNIQUES.len() - 1);
    TECHNIQUES[idx]
}

pub fn session_duration(number: u32) -> &'static str {
    match number {
        0 | 1 => "45-60 minutes",
        2..=3 => "30-45 minutes",
        _ => "20-30 minutes",
    }
}

pub fn spaced_schedule(topic: &str, sessions: u32, algorithm: Algorithm, start: NaiveDate) -> Vec<StudySession> {
    let mut date = start;
    let mut out = Vec::with_capacity(sessions as usize);
    for number in 1..=sessions {
        out.push(StudySession {
            number,
            date,
            topic: topic.to_string(),
            focus: session_focus(number),
            technique: session_technique(number),
            duration: session_duration(number),
        });
        if number < sessions {
            date = next_review(algorithm, number, date, PLANNED_PERFORMANCE);
        }
    }
    out
}

pub fn render_spaced_schedule(topic: &str, algorithm: Algorithm, sessions: &[StudySession]) -> String {
    let mut out = format!("**Spaced Repetition Study Schedule for: {topic}**\n\n");
    out.push_str(&format!("**Algorithm:** {}\n**Total Sessions:** {}\n\n", algorithm, sessions.len()));
    for s in sessions {
        out.push_str(&format!("**Session {}:** {}\n", s.number, s.date.format("%Y-%m-%d")));
        out.push_str(&format!("   • Focus: {}\n", s.focus));
        out.push_str(&format!("   • Technique: {}\n", s.technique));
        out.push_str(&format!("   • Duration: {}\n\n", s.duration));
    }
    out.push_str("**Tips:**\n");
    out.push_str("• Test yourself before looking at answers\n");
    out.push_str("• Space out your practice sessions\n");
    out.push_str("• Focus on difficult items more frequently\n");
    out.push_str("• Review material just before you forget it\n");
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn estimated_time(&self) -> &'static str {
        match self {
            Difficulty::Easy => "2-3 minutes",
            Difficulty::Medium => "5-7 minutes",
            Difficulty::Hard => "10-15 minutes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    DefinitionRecall,
    ConceptApplication,
    ProblemSolving,
    ComparisonAnalysis,
    PredictionForesight,
    CritiqueEvaluation,
}

impl QuestionType {
    pub const ALL: [QuestionType; 6] = [
        QuestionType::DefinitionRecall,
        QuestionType::ConceptApplication,
        QuestionType::ProblemSolving,
        QuestionType::ComparisonAnalysis,
        QuestionType::PredictionForesight,
        QuestionType::CritiqueEvaluation,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            QuestionType::DefinitionRecall => "Definition Recall",
            QuestionType::ConceptApplication => "Concept Application",
            QuestionType::ProblemSolving => "Problem Solving",
            QuestionType::ComparisonAnalysis => "Comparison Analysis",
            QuestionType::PredictionForesight => "Prediction Foresight",
            QuestionType::CritiqueEvaluation => "Critique Evaluation",
        }
    }

    fn question(&self, topic: &str, difficulty: Difficulty) -> String {
        use Difficulty::*;
        use QuestionType::*;
        match (self, difficulty) {
            (DefinitionRecall, Easy) => format!("What is the basic definition of {topic}?"),
            (DefinitionRecall, Medium) => format!("Explain {topic} in your own words without looking at your notes."),
            (DefinitionRecall, Hard) => format!("Compare and contrast {topic} with a closely related concept."),
            (ConceptApplication, Easy) => format!("Give a simple example of {topic} in everyday life."),
            (ConceptApplication, Medium) => format!("How would you apply {topic} to solve a real-world problem?"),
            (ConceptApplication, Hard) => format!("Design a complex scenario where {topic} plays a crucial role."),
            (ProblemSolving, Easy) => format!("Solve this basic problem related to {topic}."),
            (ProblemSolving, Medium) => format!("Analyze the steps needed to solve a {topic}-related challenge."),
            (ProblemSolving, Hard) => format!("Create and solve an original problem involving {topic}."),
            (ComparisonAnalysis, Easy) => {
                format!("What are the main similarities between {topic} and a related concept?")
            }
            (ComparisonAnalysis, Medium) => {
                format!("Compare the advantages and disadvantages of different approaches to {topic}.")
            }
            (ComparisonAnalysis, Hard) => {
                format!("Critically analyze how {topic} differs from alternative theories or methods.")
            }
            (PredictionForesight, Easy) => format!("What might happen if {topic} is applied incorrectly?"),
            (PredictionForesight, Medium) => format!("Predict the outcomes of a scenario involving {topic}."),
            (PredictionForesight, Hard) => format!("Forecast how {topic} might evolve or change in the future."),
            (CritiqueEvaluation, Easy) => format!("What are the strengths of {topic}?"),
            (CritiqueEvaluation, Medium) => format!("Evaluate the effectiveness of {topic} in different contexts."),
            (CritiqueEvaluation, Hard) => format!(
                "Provide a comprehensive critique of {topic}, including limitations and potential improvements."
            ),
        }
    }

    fn hints(&self, topic: &str) -> Vec<String> {
        match self {
            QuestionType::DefinitionRecall => vec![
                format!("Think about the key characteristics of {topic}"),
                "Recall the main purpose or function".to_string(),
                "Consider related terms or concepts".to_string(),
            ],
            QuestionType::ConceptApplication => vec![
                "Think of real-world scenarios".to_string(),
                "Consider practical examples".to_string(),
                "Break down the concept into steps".to_string(),
            ],
            QuestionType::ProblemSolving => vec![
                "Identify the key variables involved".to_string(),
                "Consider what information you need".to_string(),
                "Think step-by-step through the process".to_string(),
            ],
            _ => vec![
                "Try to recall the main ideas".to_string(),
                "Think about examples".to_string(),
                "Break it down into smaller parts".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecallQuestion {
    pub id: String,
    pub kind: QuestionType,
    pub difficulty: Difficulty,
    pub question: String,
    pub hints: Vec<String>,
    pub estimated_time: &'static str,
}

/// `count` questions cycling through the question types in a fixed order,
/// so the same input always yields the same set.
pub fn recall_questions(topic: &str, difficulty: Difficulty, count: usize) -> Vec<RecallQuestion> {
    QuestionType::ALL
        .iter()
        .cycle()
        .take(count)
        .enumerate()
        .map(|(i, kind)| RecallQuestion {
            id: format!("q_{}", i + 1),
            kind: *kind,
            difficulty,
            question: kind.question(topic, difficulty),
            hints: kind.hints(topic),
            estimated_time: difficulty.estimated_time(),
        })
        .collect()
}

pub fn render_recall_questions(topic: &str, difficulty: Difficulty, questions: &[RecallQuestion]) -> String {
    let mut out = format!("**Active Recall Practice Questions for: {topic}**\n\n");
    out.push_str(&format!(
        "**Difficulty:** {}\n**Questions:** {}\n\n",
        difficulty.as_str(),
        questions.len()
    ));
    for q in questions {
        out.push_str(&format!("**Question {}:** {}\n", q.id, q.question));
        out.push_str(&format!("   • Type: {}\n", q.kind.title()));
        out.push_str(&format!("   • Estimated time: {}\n", q.estimated_time));
        out.push_str("   • Hints:\n");
        for h in &q.hints {
            out.push_str(&format!("     - {h}\n"));
        }
        out.push('\n');
    }
    out.push_str("**Instructions:**\n");
    out.push_str("• Try to answer each question without looking at your notes\n");
    out.push_str("• Use hints only if you're truly stuck\n");
    out.push_str("• Review correct answers and understand why you got them wrong\n");
    out.push_str("• Repeat difficult questions in future sessions\n");
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechniqueAdvice {
    pub technique: String,
    pub goal: String,
    pub minutes: u32,
    pub level: String,
    pub rationale: String,
}

/// Pick a technique by goal and knowledge level, then adjust for time.
/// Unknown goals are treated as "understanding".
pub fn recommend_technique(goal: &str, minutes: u32, level: &str) -> TechniqueAdvice {
    let goal_key = goal.trim().to_lowercase();
    let level_key = level.trim().to_lowercase();
    let by_level: [&str; 3] = match goal_key.as_str() {
        "memorization" => ["Spaced repetition flashcards", "Active recall testing", "Memory palace technique"],
        "application" => [
            "Guided practice problems",
            "Real-world application scenarios",
            "Problem creation and solving",
        ],
        "analysis" => [
            "Compare and contrast exercises",
            "Critical evaluation",
            "Theoretical critique and synthesis",
        ],
        _ => ["Concept mapping with explanations", "Teaching the material", "Comparative analysis"],
    };
    let base = match level_key.as_str() {
        "beginner" => by_level[0],
        "intermediate" => by_level[1],
        "advanced" => by_level[2],
        _ => "Active recall practice",
    };
    let technique = if minutes < 15 {
        "Quick active recall quiz".to_string()
    } else if minutes < 30 {
        "Focused practice testing".to_string()
    } else if minutes > 60 {
        format!("{base} with interleaved practice")
    } else {
        base.to_string()
    };
    TechniqueAdvice {
        rationale: format!(
            "This technique is optimal for {goal_key} when you have {minutes} minutes and {level_key} knowledge level."
        ),
        technique,
        goal: goal_key,
        minutes,
        level: level_key,
    }
}

impl TechniqueAdvice {
    pub fn render(&self) -> String {
        let mut out = "**🎯 Personalized Study Technique Recommendation**\n\n".to_string();
        out.push_str(&format!("**Recommended Technique:** {}\n\n", self.technique));
        out.push_str(&format!("**Learning Goal:** {}\n", self.goal));
        out.push_str(&format!("**Time Available:** {} minutes\n", self.minutes));
        out.push_str(&format!("**Knowledge Level:** {}\n\n", self.level));
        out.push_str(&format!("**Why this technique:** {}\n\n", self.rationale));
        out.push_str("**💡 Implementation Tips:**\n");
        let t = self.technique.to_lowercase();
        if t.contains("recall") {
            out.push_str("• Test yourself before looking at answers\n• Use spaced repetition for better retention\n");
        } else if t.contains("teaching") {
            out.push_str("• Explain concepts as if teaching a friend\n• Use simple language and examples\n");
        } else if t.contains("practice") {
            out.push_str("• Start with easier problems, then progress\n• Review mistakes and understand solutions\n");
        } else if t.contains("mapping") {
            out.push_str("• Draw connections between concepts\n• Use colors and diagrams for visual learning\n");
        }
        out
    }
}
