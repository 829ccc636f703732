//! Ports - contracts between the core and the infrastructure
//!
//! All ports are synchronous and absence-friendly: a missing row is
//! `Ok(None)` or an empty vec, never an error. Only genuine
//! infrastructure failures surface as `StoreError`.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Mutex;

use crate::domain::{
    Goal, GoalId, Profile, Question, QuestionAttempt, QuestionId, ReviewState, UsageDaily, UserId,
};
use crate::storage::Result;

// ============================================================================
// READ PORTS
// ============================================================================

/// Question lookup
pub trait QuestionPort: Send + Sync {
    fn find_by_id(&self, id: QuestionId) -> Result<Option<Question>>;
    fn find_by_goal(&self, goal_id: GoalId) -> Result<Vec<Question>>;
}

/// Goal lookup
pub trait GoalPort: Send + Sync {
    fn find_by_id(&self, id: GoalId) -> Result<Option<Goal>>;
    fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Goal>>;
    fn find_public(&self) -> Result<Vec<Goal>>;
    fn exists(&self, id: GoalId) -> Result<bool>;
}

/// Attempt history lookup (append-only data, so reads only)
pub trait AttemptPort: Send + Sync {
    fn find_by_user(&self, user_id: &UserId) -> Result<Vec<QuestionAttempt>>;
    fn find_by_user_and_question(
        &self,
        user_id: &UserId,
        question_id: QuestionId,
    ) -> Result<Vec<QuestionAttempt>>;
    fn find_by_user_and_goal(&self, user_id: &UserId, goal_id: GoalId)
        -> Result<Vec<QuestionAttempt>>;
}

/// Review-state aggregate lookup
pub trait ReviewStatePort: Send + Sync {
    fn find_by_user_and_question(
        &self,
        user_id: &UserId,
        question_id: QuestionId,
    ) -> Result<Option<ReviewState>>;
    fn find_by_user(&self, user_id: &UserId) -> Result<Vec<ReviewState>>;
    fn find_due(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<Vec<ReviewState>>;
}

/// Profile lookup and persistence
pub trait ProfilePort: Send + Sync {
    fn find(&self, user_id: &UserId) -> Result<Option<Profile>>;
    fn save(&self, profile: &Profile) -> Result<Profile>;
}

/// Daily usage counter lookup and persistence
pub trait UsageDailyPort: Send + Sync {
    fn find(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<UsageDaily>>;
    fn save(&self, usage: &UsageDaily) -> Result<UsageDaily>;
}

// ============================================================================
// WRITE PORT
// ============================================================================

/// Atomic application of one graded review.
///
/// Records the attempt, upserts the review state, and increments the
/// daily counter in a single transaction. Either all three effects land
/// or none do; the implementation must also serialize concurrent
/// submissions per (user, question) and per (user, day).
pub trait ReviewWritePort: Send + Sync {
    fn apply_review(
        &self,
        attempt: &QuestionAttempt,
        new_state: &ReviewState,
        date: NaiveDate,
    ) -> Result<UsageDaily>;
}

// ============================================================================
// CLOCK
// ============================================================================

/// Time source, injectable for testability
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Settable clock for tests and replay
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Pin the clock at the given instant
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(at),
        }
    }

    /// Move the clock to a new instant
    pub fn set(&self, at: DateTime<Utc>) {
        *self.lock() = at;
    }

    /// Advance the clock by a duration
    pub fn advance(&self, by: chrono::Duration) {
        let mut instant = self.lock();
        *instant += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid instant
        self.instant.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }

    fn today(&self) -> NaiveDate {
        self.lock().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn fixed_clock_advances() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap();
        let clock = FixedClock::new(t0);
        assert_eq!(clock.now(), t0);
        assert_eq!(clock.today(), t0.date_naive());

        clock.advance(Duration::hours(1));
        assert_eq!(clock.now(), t0 + Duration::hours(1));
        // Crossed midnight
        assert_eq!(clock.today(), (t0 + Duration::hours(1)).date_naive());
    }
}
