//! Question model - the immutable unit of learning content
//!
//! Questions belong to a goal, carry a difficulty level, and (for choice
//! questions) a set of choices whose correctness flags never leave the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{GoalId, QuestionId, UserId};

// ============================================================================
// QUESTION TYPE
// ============================================================================

/// Types of questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    /// Exactly one correct choice
    #[default]
    SingleChoice,
    /// One or more correct choices
    MultipleChoice,
    /// Free-text answer
    Open,
}

impl QuestionType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Open => "open",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "single_choice" => QuestionType::SingleChoice,
            "multiple_choice" => QuestionType::MultipleChoice,
            "open" => QuestionType::Open,
            _ => QuestionType::SingleChoice,
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DIFFICULTY SCALE
// ============================================================================

/// Totally ordered 4-level difficulty scale.
///
/// Promotion and demotion are single-step and saturate at the ends:
/// there is no wraparound and no multi-level jump. The skill adapter
/// relies on this to dampen difficulty oscillation across sessions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    VeryHard,
}

impl QuestionDifficulty {
    /// Numeric level, 1 (easy) to 4 (very hard)
    pub fn level(&self) -> u8 {
        match self {
            QuestionDifficulty::Easy => 1,
            QuestionDifficulty::Medium => 2,
            QuestionDifficulty::Hard => 3,
            QuestionDifficulty::VeryHard => 4,
        }
    }

    /// Build from a numeric level, defaulting to Medium for unknown values
    pub fn from_level(level: u8) -> Self {
        match level {
            1 => QuestionDifficulty::Easy,
            2 => QuestionDifficulty::Medium,
            3 => QuestionDifficulty::Hard,
            4 => QuestionDifficulty::VeryHard,
            _ => QuestionDifficulty::Medium,
        }
    }

    /// The next harder level, or `None` when already at the ceiling
    pub fn promote(&self) -> Option<Self> {
        match self {
            QuestionDifficulty::Easy => Some(QuestionDifficulty::Medium),
            QuestionDifficulty::Medium => Some(QuestionDifficulty::Hard),
            QuestionDifficulty::Hard => Some(QuestionDifficulty::VeryHard),
            QuestionDifficulty::VeryHard => None,
        }
    }

    /// The next easier level, or `None` when already at the floor
    pub fn demote(&self) -> Option<Self> {
        match self {
            QuestionDifficulty::Easy => None,
            QuestionDifficulty::Medium => Some(QuestionDifficulty::Easy),
            QuestionDifficulty::Hard => Some(QuestionDifficulty::Medium),
            QuestionDifficulty::VeryHard => Some(QuestionDifficulty::Hard),
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionDifficulty::Easy => "easy",
            QuestionDifficulty::Medium => "medium",
            QuestionDifficulty::Hard => "hard",
            QuestionDifficulty::VeryHard => "very_hard",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "easy" => QuestionDifficulty::Easy,
            "medium" => QuestionDifficulty::Medium,
            "hard" => QuestionDifficulty::Hard,
            "very_hard" => QuestionDifficulty::VeryHard,
            _ => QuestionDifficulty::Medium,
        }
    }
}

impl std::fmt::Display for QuestionDifficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A choice for single/multiple-choice questions.
///
/// `is_correct` is internal grading data. Outward-facing projections
/// (`ChoiceView`) strip it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: Uuid,
    pub label: String,
    pub is_correct: bool,
}

impl Choice {
    /// Create a choice with a fresh id
    pub fn new(label: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            is_correct,
        }
    }
}

/// A question. Immutable once created; content editing is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub goal_id: GoalId,
    pub question_type: QuestionType,
    pub prompt: String,
    /// Reference answer text (open questions) - internal grading data
    pub answer: String,
    /// Choice set for choice questions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    /// Optional explanation shown after grading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub difficulty: QuestionDifficulty,
    /// Optional chapter tag within the goal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A learning goal: an owned, optionally public collection of questions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    pub user_id: UserId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for creating a new goal
///
/// Uses `deny_unknown_fields` to prevent field injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewGoal {
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Input for creating a new question
///
/// Uses `deny_unknown_fields` to prevent field injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewQuestion {
    pub goal_id: GoalId,
    #[serde(default)]
    pub question_type: QuestionType,
    pub prompt: String,
    pub answer: String,
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: QuestionDifficulty,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ============================================================================
// TESTS
// ============================================================================
