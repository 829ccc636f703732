//! Domain module - Core value types and models
//!
//! The foundation every algorithm builds on:
//! - Newtype identifiers for questions, users, and goals
//! - Ordered enumerations (difficulty scale, mastery scale)
//! - Immutable question/attempt models and the review-state aggregate
//! - Distribution strategies for session balancing

mod question;
mod review;
mod strategy;

pub use question::{Choice, Goal, NewGoal, NewQuestion, Question, QuestionDifficulty, QuestionType};
pub use review::{
    MasteryLevel, Profile, QuestionAttempt, ReviewState, UsageDaily, COMPETENT_SUCCESS_RATE,
    MASTERY_SUCCESS_RATE, MIN_REVIEWS_FOR_MASTERY,
};
pub use strategy::{DistributionStrategy, SessionConfig};

use serde::{Deserialize, Serialize};

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Identifier of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub i64);

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a learning goal (a collection of questions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(pub i64);

impl std::fmt::Display for GoalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Build a user id from anything string-like
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
