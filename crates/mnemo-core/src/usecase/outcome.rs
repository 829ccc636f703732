//! Use-case outcomes - sealed result types
//!
//! No exceptions for nominal control flow: every business outcome is a
//! variant the caller matches on. `Forbidden` variants are reserved for
//! an authorization layer at the edge.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    DistributionStrategy, GoalId, Profile, Question, QuestionDifficulty, QuestionId, QuestionType,
    ReviewState,
};

// ============================================================================
// OUTWARD QUESTION PROJECTION
// ============================================================================

/// A choice as shown to the learner: no correctness flag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceView {
    pub id: Uuid,
    pub label: String,
}

/// A question as shown to the learner.
///
/// Deliberately omits the reference answer, the explanation, and every
/// correctness flag; grading data never crosses this boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: QuestionId,
    pub goal_id: GoalId,
    pub question_type: QuestionType,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ChoiceView>>,
    pub difficulty: QuestionDifficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            goal_id: question.goal_id,
            question_type: question.question_type,
            prompt: question.prompt.clone(),
            choices: question.choices.as_ref().map(|choices| {
                choices
                    .iter()
                    .map(|c| ChoiceView {
                        id: c.id,
                        label: c.label.clone(),
                    })
                    .collect()
            }),
            difficulty: question.difficulty,
            chapter: question.chapter.clone(),
        }
    }
}

// ============================================================================
// USAGE SNAPSHOT
// ============================================================================

/// Quota snapshot returned with review and bootstrap responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageInfo {
    pub date: NaiveDate,
    pub reviews_used: u32,
    pub reviews_limit: u32,
    pub premium: bool,
}

impl UsageInfo {
    /// Reviews left today; effectively unbounded for premium users
    pub fn remaining(&self) -> u32 {
        if self.premium {
            u32::MAX
        } else {
            self.reviews_limit.saturating_sub(self.reviews_used)
        }
    }

    /// Percentage of the quota consumed, 0 for premium users
    pub fn percent_used(&self) -> u32 {
        if self.premium || self.reviews_limit == 0 {
            0
        } else {
            ((f64::from(self.reviews_used) / f64::from(self.reviews_limit)) * 100.0) as u32
        }
    }
}

// ============================================================================
// GENERATE SESSION
// ============================================================================

/// Outcome of session generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum GenerateSessionOutcome {
    #[serde(rename_all = "camelCase")]
    Success {
        /// Opaque session token
        session_id: String,
        questions: Vec<QuestionView>,
        strategy: DistributionStrategy,
        review_count: usize,
        discovery_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    GoalNotFound { goal_id: GoalId },
    /// Graceful empty result, not an error
    #[serde(rename_all = "camelCase")]
    NoQuestionsAvailable {
        goal_id: Option<GoalId>,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    ValidationFailed { errors: Vec<String> },
    /// Reserved for an authorization layer
    #[serde(rename_all = "camelCase")]
    Forbidden { message: String },
}

// ============================================================================
// SUBMIT REVIEW
// ============================================================================

/// Grading verdict echoed back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerResult {
    Correct,
    Incorrect,
}

/// Outcome of one review submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SubmitReviewOutcome {
    #[serde(rename_all = "camelCase")]
    Success {
        question_id: QuestionId,
        result: AnswerResult,
        review_state: ReviewState,
        usage: UsageInfo,
    },
    /// Business rule, not a transient failure: no retry implied
    #[serde(rename_all = "camelCase")]
    QuotaExceeded {
        limit: u32,
        used: u32,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    QuestionNotFound { question_id: QuestionId },
    #[serde(rename_all = "camelCase")]
    ValidationFailed { errors: Vec<String> },
    /// Reserved for an authorization layer
    #[serde(rename_all = "camelCase")]
    Forbidden { message: String },
}

// ============================================================================
// BOOTSTRAP
// ============================================================================

/// Dashboard aggregates computed at bootstrap
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardInfo {
    /// Review states due at or before now
    pub due_count: usize,
    /// Questions across owned and public goals, de-duplicated by goal
    pub total_questions: usize,
    pub goals_count: usize,
    /// Review states at the mastered level
    pub mastered_count: usize,
}

/// Outcome of the bootstrap use case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum BootstrapOutcome {
    #[serde(rename_all = "camelCase")]
    Success {
        profile: Profile,
        usage: UsageInfo,
        dashboard: DashboardInfo,
    },
}

// ============================================================================
// TESTS
// ============================================================================
