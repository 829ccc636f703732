//! Generate Session - build one study session for a user
//!
//! Gathers the candidate pool and the user's history through the ports,
//! then delegates the actual composition to the hybrid session composer.

use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    DistributionStrategy, GoalId, Question, QuestionDifficulty, QuestionId, ReviewState,
    SessionConfig, UserId,
};
use crate::session::SessionComposer;
use crate::storage::Result;
use crate::usecase::{
    AttemptPort, Clock, GenerateSessionOutcome, GoalPort, LimitsConfig, QuestionPort, QuestionView,
    ReviewStatePort,
};

/// Command for one session request
#[derive(Debug, Clone)]
pub struct GenerateSessionCommand {
    pub user_id: UserId,
    /// Restrict to one goal; `None` draws from all public goals
    pub goal_id: Option<GoalId>,
    /// Requested size; `None` uses the configured default
    pub max_questions: Option<usize>,
    pub difficulty_filter: Option<QuestionDifficulty>,
    pub distribution_strategy: Option<DistributionStrategy>,
}

impl GenerateSessionCommand {
    /// Session over all public goals with default settings
    pub fn for_user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            goal_id: None,
            max_questions: None,
            difficulty_filter: None,
            distribution_strategy: None,
        }
    }
}

/// The session-generation use case
pub struct GenerateSession {
    questions: Arc<dyn QuestionPort>,
    goals: Arc<dyn GoalPort>,
    attempts: Arc<dyn AttemptPort>,
    review_states: Arc<dyn ReviewStatePort>,
    clock: Arc<dyn Clock>,
    composer: SessionComposer,
    limits: LimitsConfig,
}

impl GenerateSession {
    pub fn new(
        questions: Arc<dyn QuestionPort>,
        goals: Arc<dyn GoalPort>,
        attempts: Arc<dyn AttemptPort>,
        review_states: Arc<dyn ReviewStatePort>,
        clock: Arc<dyn Clock>,
        composer: SessionComposer,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            questions,
            goals,
            attempts,
            review_states,
            clock,
            composer,
            limits,
        }
    }

    /// Execute with the thread-local RNG
    pub fn execute(&self, command: &GenerateSessionCommand) -> Result<GenerateSessionOutcome> {
        self.execute_with_rng(command, &mut rand::thread_rng())
    }

    /// Execute with an explicit RNG (seedable for deterministic tests)
    pub fn execute_with_rng<R: Rng + ?Sized>(
        &self,
        command: &GenerateSessionCommand,
        rng: &mut R,
    ) -> Result<GenerateSessionOutcome> {
        info!(
            user = %command.user_id,
            goal = ?command.goal_id,
            max = ?command.max_questions,
            "generating session"
        );

        if command.user_id.as_str().trim().is_empty() {
            return Ok(GenerateSessionOutcome::ValidationFailed {
                errors: vec!["userId must not be blank".to_string()],
            });
        }

        let now = self.clock.now();
        let max_questions = command
            .max_questions
            .unwrap_or(self.limits.default_max_questions)
            .clamp(1, self.limits.max_questions_cap);

        // Candidate pool: one goal, or everything public
        let available: Vec<Question> = match command.goal_id {
            Some(goal_id) => {
                if !self.goals.exists(goal_id)? {
                    warn!(goal = %goal_id, "goal not found");
                    return Ok(GenerateSessionOutcome::GoalNotFound { goal_id });
                }
                self.questions.find_by_goal(goal_id)?
            }
            None => {
                let mut pool = vec![];
                for goal in self.goals.find_public()? {
                    pool.extend(self.questions.find_by_goal(goal.id)?);
                }
                pool
            }
        };

        if available.is_empty() {
            warn!(user = %command.user_id, "no questions available for session");
            return Ok(GenerateSessionOutcome::NoQuestionsAvailable {
                goal_id: command.goal_id,
                message: "No questions available for this session.".to_string(),
            });
        }

        // User history, goal-scoped when a goal was requested
        let attempts = match command.goal_id {
            Some(goal_id) => self.attempts.find_by_user_and_goal(&command.user_id, goal_id)?,
            None => self.attempts.find_by_user(&command.user_id)?,
        };

        let review_states: HashMap<QuestionId, ReviewState> = self
            .review_states
            .find_by_user(&command.user_id)?
            .into_iter()
            .map(|state| (state.question_id, state))
            .collect();

        let config = SessionConfig {
            goal_id: command.goal_id,
            max_questions,
            difficulty_filter: command.difficulty_filter,
            chapter_filter: None,
            distribution_strategy: command.distribution_strategy,
        };

        let plan = self
            .composer
            .compose(&config, &available, &attempts, &review_states, now, rng);

        if plan.is_empty() {
            warn!(user = %command.user_id, "composer returned no questions");
            return Ok(GenerateSessionOutcome::NoQuestionsAvailable {
                goal_id: command.goal_id,
                message: "Every question was reviewed recently. Come back later.".to_string(),
            });
        }

        let session_id = format!("session_{}", &Uuid::new_v4().to_string()[..12]);

        info!(
            session = %session_id,
            total = plan.total(),
            strategy = %plan.strategy,
            review = plan.review_count,
            discovery = plan.discovery_count,
            "session generated"
        );

        Ok(GenerateSessionOutcome::Success {
            session_id,
            questions: plan.questions.iter().map(QuestionView::from).collect(),
            strategy: plan.strategy,
            review_count: plan.review_count,
            discovery_count: plan.discovery_count,
        })
    }
}
