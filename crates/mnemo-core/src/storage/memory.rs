//! In-Memory Storage
//!
//! Port implementations over plain collections. Backs the use-case
//! tests and serves as the executable reference for the port contracts:
//! absent rows are `Ok(None)` or empty vecs, attempts come back most
//! recent first, `apply_review` lands all three effects together.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::{
    Goal, GoalId, NewGoal, NewQuestion, Profile, Question, QuestionAttempt, QuestionId,
    ReviewState, UsageDaily, UserId,
};
use crate::usecase::{
    AttemptPort, GoalPort, ProfilePort, QuestionPort, ReviewStatePort, ReviewWritePort,
    UsageDailyPort,
};

use super::Result;

#[derive(Debug, Default)]
struct Inner {
    goals: Vec<Goal>,
    questions: Vec<Question>,
    attempts: Vec<QuestionAttempt>,
    review_states: HashMap<(UserId, QuestionId), ReviewState>,
    profiles: HashMap<UserId, Profile>,
    usage: HashMap<(UserId, NaiveDate), UsageDaily>,
    next_goal_id: i64,
    next_question_id: i64,
}

/// Thread-safe in-memory store implementing all persistence ports
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Poisoned data is still consistent; every mutation is a single
        // guarded block that leaves the collections whole
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a goal, assigning its id
    pub fn create_goal(&self, input: &NewGoal) -> Goal {
        let mut inner = self.lock();
        inner.next_goal_id += 1;
        let goal = Goal {
            id: GoalId(inner.next_goal_id),
            user_id: input.user_id.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            is_public: input.is_public,
            created_at: Utc::now(),
        };
        inner.goals.push(goal.clone());
        goal
    }

    /// Create a question, assigning its id
    pub fn create_question(&self, input: &NewQuestion) -> Question {
        let mut inner = self.lock();
        inner.next_question_id += 1;
        let question = Question {
            id: QuestionId(inner.next_question_id),
            goal_id: input.goal_id,
            question_type: input.question_type,
            prompt: input.prompt.clone(),
            answer: input.answer.clone(),
            choices: input.choices.clone(),
            explanation: input.explanation.clone(),
            difficulty: input.difficulty,
            chapter: input.chapter.clone(),
            tags: input.tags.clone(),
            created_at: Utc::now(),
        };
        inner.questions.push(question.clone());
        question
    }

    /// Insert an attempt directly, bypassing the review pipeline.
    /// History seeding for tests.
    pub fn insert_attempt(&self, attempt: QuestionAttempt) {
        self.lock().attempts.push(attempt);
    }

    /// Insert or replace a review state directly
    pub fn insert_review_state(&self, state: ReviewState) {
        self.lock()
            .review_states
            .insert((state.user_id.clone(), state.question_id), state);
    }

    /// Mark a user premium, creating the profile if needed
    pub fn set_premium(&self, user_id: &UserId, premium: bool) {
        let mut inner = self.lock();
        inner
            .profiles
            .entry(user_id.clone())
            .or_insert_with(|| Profile::new(user_id.clone(), Utc::now()))
            .premium = premium;
    }

    /// Number of recorded attempts across all users
    pub fn attempt_count(&self) -> usize {
        self.lock().attempts.len()
    }
}

fn most_recent_first(attempts: &mut [QuestionAttempt]) {
    attempts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

// ============================================================================
// PORT IMPLEMENTATIONS
// ============================================================================

impl QuestionPort for MemoryStore {
    fn find_by_id(&self, id: QuestionId) -> Result<Option<Question>> {
        Ok(self.lock().questions.iter().find(|q| q.id == id).cloned())
    }

    fn find_by_goal(&self, goal_id: GoalId) -> Result<Vec<Question>> {
        Ok(self
            .lock()
            .questions
            .iter()
            .filter(|q| q.goal_id == goal_id)
            .cloned()
            .collect())
    }
}

impl GoalPort for MemoryStore {
    fn find_by_id(&self, id: GoalId) -> Result<Option<Goal>> {
        Ok(self.lock().goals.iter().find(|g| g.id == id).cloned())
    }

    fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Goal>> {
        Ok(self
            .lock()
            .goals
            .iter()
            .filter(|g| &g.user_id == user_id)
            .cloned()
            .collect())
    }

    fn find_public(&self) -> Result<Vec<Goal>> {
        Ok(self
            .lock()
            .goals
            .iter()
            .filter(|g| g.is_public)
            .cloned()
            .collect())
    }

    fn exists(&self, id: GoalId) -> Result<bool> {
        Ok(self.lock().goals.iter().any(|g| g.id == id))
    }
}

impl AttemptPort for MemoryStore {
    fn find_by_user(&self, user_id: &UserId) -> Result<Vec<QuestionAttempt>> {
        let mut attempts: Vec<_> = self
            .lock()
            .attempts
            .iter()
            .filter(|a| &a.user_id == user_id)
            .cloned()
            .collect();
        most_recent_first(&mut attempts);
        Ok(attempts)
    }

    fn find_by_user_and_question(
        &self,
        user_id: &UserId,
        question_id: QuestionId,
    ) -> Result<Vec<QuestionAttempt>> {
        let mut attempts: Vec<_> = self
            .lock()
            .attempts
            .iter()
            .filter(|a| &a.user_id == user_id && a.question_id == question_id)
            .cloned()
            .collect();
        most_recent_first(&mut attempts);
        Ok(attempts)
    }

    fn find_by_user_and_goal(
        &self,
        user_id: &UserId,
        goal_id: GoalId,
    ) -> Result<Vec<QuestionAttempt>> {
        let inner = self.lock();
        let mut attempts: Vec<_> = inner
            .attempts
            .iter()
            .filter(|a| {
                &a.user_id == user_id
                    && inner
                        .questions
                        .iter()
                        .any(|q| q.id == a.question_id && q.goal_id == goal_id)
            })
            .cloned()
            .collect();
        most_recent_first(&mut attempts);
        Ok(attempts)
    }
}

impl ReviewStatePort for MemoryStore {
    fn find_by_user_and_question(
        &self,
        user_id: &UserId,
        question_id: QuestionId,
    ) -> Result<Option<ReviewState>> {
        Ok(self
            .lock()
            .review_states
            .get(&(user_id.clone(), question_id))
            .cloned())
    }

    fn find_by_user(&self, user_id: &UserId) -> Result<Vec<ReviewState>> {
        Ok(self
            .lock()
            .review_states
            .values()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect())
    }

    fn find_due(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<Vec<ReviewState>> {
        Ok(self
            .lock()
            .review_states
            .values()
            .filter(|s| &s.user_id == user_id && s.is_due(now))
            .cloned()
            .collect())
    }
}

impl ProfilePort for MemoryStore {
    fn find(&self, user_id: &UserId) -> Result<Option<Profile>> {
        Ok(self.lock().profiles.get(user_id).cloned())
    }

    fn save(&self, profile: &Profile) -> Result<Profile> {
        self.lock()
            .profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(profile.clone())
    }
}

impl UsageDailyPort for MemoryStore {
    fn find(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<UsageDaily>> {
        Ok(self.lock().usage.get(&(user_id.clone(), date)).cloned())
    }

    fn save(&self, usage: &UsageDaily) -> Result<UsageDaily> {
        self.lock()
            .usage
            .insert((usage.user_id.clone(), usage.date), usage.clone());
        Ok(usage.clone())
    }
}

impl ReviewWritePort for MemoryStore {
    fn apply_review(
        &self,
        attempt: &QuestionAttempt,
        new_state: &ReviewState,
        date: NaiveDate,
    ) -> Result<UsageDaily> {
        let mut inner = self.lock();

        inner.attempts.push(attempt.clone());
        inner.review_states.insert(
            (new_state.user_id.clone(), new_state.question_id),
            new_state.clone(),
        );

        let usage = inner
            .usage
            .entry((attempt.user_id.clone(), date))
            .or_insert_with(|| UsageDaily::new(attempt.user_id.clone(), date));
        usage.reviews_count += 1;

        Ok(usage.clone())
    }
}

// ============================================================================
// TESTS
// ============================================================================
