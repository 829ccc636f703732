//! Review model - attempts, mastery, and the per-user review aggregate
//!
//! `QuestionAttempt` rows are the append-only source of truth. `ReviewState`
//! is the materialized aggregate over them, one row per (user, question),
//! and is recomputed deterministically by the decay scheduler on every
//! submission.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{QuestionId, UserId};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Reviews required before a question can leave the learning band
pub const MIN_REVIEWS_FOR_MASTERY: u32 = 3;

/// Success rate at or above which a question counts as mastered
pub const MASTERY_SUCCESS_RATE: f64 = 0.85;

/// Success rate at or above which a question counts as competent
pub const COMPETENT_SUCCESS_RATE: f64 = 0.70;

// ============================================================================
// MASTERY SCALE
// ============================================================================

/// Discrete competence tier derived from review count and success rate.
///
/// Each level maps to an index into the spaced-interval table; the index
/// controls how far out the next review is scheduled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MasteryLevel {
    /// Fewer than 2 reviews
    #[default]
    Novice,
    /// Fewer than 3 reviews, or success rate below 70%
    Learning,
    /// Success rate below 85%
    Competent,
    /// 3+ reviews at 85% success or better
    Mastered,
}

impl MasteryLevel {
    /// Index into the spaced-interval table for this level
    pub fn interval_index(&self) -> usize {
        match self {
            MasteryLevel::Novice => 0,
            MasteryLevel::Learning => 0,
            MasteryLevel::Competent => 2,
            MasteryLevel::Mastered => 4,
        }
    }

    /// Pure mastery determination.
    ///
    /// Identical inputs always yield the identical level; fewer than two
    /// reviews is Novice regardless of success rate.
    pub fn determine(review_count: u32, success_rate: f64) -> Self {
        if review_count < 2 {
            MasteryLevel::Novice
        } else if review_count < MIN_REVIEWS_FOR_MASTERY || success_rate < COMPETENT_SUCCESS_RATE {
            MasteryLevel::Learning
        } else if success_rate < MASTERY_SUCCESS_RATE {
            MasteryLevel::Competent
        } else {
            MasteryLevel::Mastered
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MasteryLevel::Novice => "novice",
            MasteryLevel::Learning => "learning",
            MasteryLevel::Competent => "competent",
            MasteryLevel::Mastered => "mastered",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "novice" => MasteryLevel::Novice,
            "learning" => MasteryLevel::Learning,
            "competent" => MasteryLevel::Competent,
            "mastered" => MasteryLevel::Mastered,
            _ => MasteryLevel::Novice,
        }
    }
}

impl std::fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ATTEMPTS
// ============================================================================

/// One graded answer to a question. Append-only: never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAttempt {
    pub id: Uuid,
    pub question_id: QuestionId,
    pub user_id: UserId,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_choice_ids: Option<Vec<Uuid>>,
    pub timestamp: DateTime<Utc>,
}

impl QuestionAttempt {
    /// Record a new attempt with a fresh id
    pub fn new(
        question_id: QuestionId,
        user_id: UserId,
        is_correct: bool,
        selected_choice_ids: Option<Vec<Uuid>>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_id,
            user_id,
            is_correct,
            selected_choice_ids,
            timestamp,
        }
    }
}

// ============================================================================
// REVIEW STATE
// ============================================================================

/// Per-(user, question) review aggregate.
///
/// Invariant: `success_count + fail_count == review_count()`, and the
/// mastery level is a pure function of those counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub question_id: QuestionId,
    pub user_id: UserId,
    pub mastery_level: MasteryLevel,
    pub success_count: u32,
    pub fail_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: DateTime<Utc>,
    pub optimal_interval_days: i64,
}

impl ReviewState {
    /// Total number of graded reviews
    pub fn review_count(&self) -> u32 {
        self.success_count + self.fail_count
    }

    /// Fraction of successful reviews, 0.0 when none recorded
    pub fn success_rate(&self) -> f64 {
        let count = self.review_count();
        if count == 0 {
            0.0
        } else {
            f64::from(self.success_count) / f64::from(count)
        }
    }

    /// Whether this question is due at the given instant
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }
}

// ============================================================================
// PROFILE & QUOTA
// ============================================================================

/// User profile. Premium users bypass the daily review quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: UserId,
    #[serde(default)]
    pub premium: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Fresh non-premium profile
    pub fn new(user_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            premium: false,
            created_at,
        }
    }
}

/// Per-(user, calendar day) review counter for quota enforcement.
/// Monotonic non-decreasing within a day; created lazily.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageDaily {
    pub user_id: UserId,
    pub date: NaiveDate,
    #[serde(default)]
    pub reviews_count: u32,
}

impl UsageDaily {
    /// Empty counter for the given day
    pub fn new(user_id: UserId, date: NaiveDate) -> Self {
        Self {
            user_id,
            date,
            reviews_count: 0,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mastery_below_two_reviews_is_novice() {
        // Regardless of success rate
        assert_eq!(MasteryLevel::determine(0, 0.0), MasteryLevel::Novice);
        assert_eq!(MasteryLevel::determine(1, 1.0), MasteryLevel::Novice);
        assert_eq!(MasteryLevel::determine(1, 0.0), MasteryLevel::Novice);
    }

    #[test]
    fn mastery_thresholds() {
        assert_eq!(MasteryLevel::determine(2, 1.0), MasteryLevel::Learning);
        assert_eq!(MasteryLevel::determine(10, 0.69), MasteryLevel::Learning);
        assert_eq!(MasteryLevel::determine(10, 0.70), MasteryLevel::Competent);
        assert_eq!(MasteryLevel::determine(10, 0.84), MasteryLevel::Competent);
        assert_eq!(MasteryLevel::determine(10, 0.85), MasteryLevel::Mastered);
        assert_eq!(MasteryLevel::determine(3, 1.0), MasteryLevel::Mastered);
    }

    #[test]
    fn mastery_determination_is_pure() {
        for _ in 0..3 {
            assert_eq!(
                MasteryLevel::determine(7, 0.72),
                MasteryLevel::determine(7, 0.72)
            );
        }
    }

    #[test]
    fn interval_indexes() {
        assert_eq!(MasteryLevel::Novice.interval_index(), 0);
        assert_eq!(MasteryLevel::Learning.interval_index(), 0);
        assert_eq!(MasteryLevel::Competent.interval_index(), 2);
        assert_eq!(MasteryLevel::Mastered.interval_index(), 4);
    }

    #[test]
    fn review_state_counters() {
        let state = ReviewState {
            question_id: QuestionId(1),
            user_id: UserId::from("u1"),
            mastery_level: MasteryLevel::Learning,
            success_count: 3,
            fail_count: 1,
            last_reviewed_at: Some(Utc::now()),
            next_review_at: Utc::now(),
            optimal_interval_days: 1,
        };
        assert_eq!(state.review_count(), 4);
        assert!((state.success_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn success_rate_of_empty_state_is_zero() {
        let state = ReviewState {
            question_id: QuestionId(1),
            user_id: UserId::from("u1"),
            mastery_level: MasteryLevel::Novice,
            success_count: 0,
            fail_count: 0,
            last_reviewed_at: None,
            next_review_at: Utc::now(),
            optimal_interval_days: 1,
        };
        assert_eq!(state.success_rate(), 0.0);
    }
}
