use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    #[default]
    Arithmetic,
    Fractions,
    Algebra,
    Geometry,
    Probability,
}

impl Topic {
    pub const COUNT: usize = 5;

    pub const ALL: [Topic; Topic::COUNT] = [
        Topic::Arithmetic,
        Topic::Fractions,
        Topic::Algebra,
        Topic::Geometry,
        Topic::Probability,
    ];

    pub fn index(self) -> usize {
        match self {
            Topic::Arithmetic => 0,
            Topic::Fractions => 1,
            Topic::Algebra => 2,
            Topic::Geometry => 3,
            Topic::Probability => 4,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Topic::Arithmetic => "arithmetic",
            Topic::Fractions => "fractions",
            Topic::Algebra => "algebra",
            Topic::Geometry => "geometry",
            Topic::Probability => "probability",
        }
    }

    /// 展示名称（简体中文）
    pub fn label(self) -> &'static str {
        match self {
            Topic::Arithmetic => "四则运算",
            Topic::Fractions => "分数与小数",
            Topic::Algebra => "代数方程",
            Topic::Geometry => "平面几何",
            Topic::Probability => "概率统计",
        }
    }
}

/// Mastery of every topic at one instant, ordered by topic.
pub type MasterySnapshot = BTreeMap<Topic, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    /// Unix milliseconds.
    pub timestamp: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub topic: Topic,
    pub mastery_level: f64,
    pub history: Vec<HistoryPoint>,
}

impl MasteryRecord {
    pub fn new(topic: Topic, initial: f64, timestamp: i64) -> Self {
        Self {
            topic,
            mastery_level: initial,
            history: vec![HistoryPoint {
                timestamp,
                value: initial,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepLogEntry {
    pub step_index: u64,
    pub topic: Topic,
    pub is_correct: bool,
    pub mastery_snapshot: MasterySnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerResult {
    Correct,
    Incorrect,
}

impl From<bool> for AnswerResult {
    fn from(is_correct: bool) -> Self {
        if is_correct {
            AnswerResult::Correct
        } else {
            AnswerResult::Incorrect
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLogEntry {
    pub topic: Topic,
    pub result: AnswerResult,
    pub delta: f64,
}

/// Provider output before the engine stamps id, topic and difficulty on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
    pub reasoning_for_selection: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub topic: Topic,
    pub difficulty: u8,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
    pub reasoning_for_selection: String,
}

impl Question {
    pub fn from_draft(draft: QuestionDraft, topic: Topic, difficulty: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic,
            difficulty,
            text: draft.text,
            options: draft.options,
            correct_index: draft.correct_index,
            explanation: draft.explanation,
            reasoning_for_selection: draft.reasoning_for_selection,
        }
    }

    pub fn view(&self) -> QuestionView {
        QuestionView {
            id: self.id,
            topic: self.topic,
            difficulty: self.difficulty,
            text: self.text.clone(),
            options: self.options.clone(),
            reasoning_for_selection: self.reasoning_for_selection.clone(),
        }
    }
}

/// Learner-facing question: the answer key is withheld until feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: Uuid,
    pub topic: Topic,
    pub difficulty: u8,
    pub text: String,
    pub options: Vec<String>,
    pub reasoning_for_selection: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub topic: Topic,
    pub is_correct: bool,
    pub prior: f64,
    pub posterior: f64,
    pub delta: f64,
    pub step_index: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub question_id: Uuid,
    pub selected_index: usize,
    pub correct_index: usize,
    pub explanation: String,
    pub outcome: AnswerOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicMastery {
    pub topic: Topic,
    pub label: String,
    pub mastery_level: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub active_topic: Topic,
    pub total_answered: u64,
    pub topics: Vec<TopicMastery>,
    pub current_question: Option<QuestionView>,
}
