//! Bootstrap - first call of an app session
//!
//! Ensures the profile and today's usage row exist, then assembles the
//! dashboard aggregates in one round trip. Safe to call repeatedly; the
//! get-or-create steps are idempotent.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::domain::{MasteryLevel, Profile, UsageDaily, UserId};
use crate::storage::Result;
use crate::usecase::{
    BootstrapOutcome, Clock, DashboardInfo, GoalPort, LimitsConfig, ProfilePort, QuestionPort,
    ReviewStatePort, UsageDailyPort, UsageInfo,
};

/// Command for one bootstrap call
#[derive(Debug, Clone)]
pub struct BootstrapCommand {
    pub user_id: UserId,
}

impl BootstrapCommand {
    pub fn for_user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// The bootstrap use case
pub struct Bootstrap {
    profiles: Arc<dyn ProfilePort>,
    usage: Arc<dyn UsageDailyPort>,
    review_states: Arc<dyn ReviewStatePort>,
    goals: Arc<dyn GoalPort>,
    questions: Arc<dyn QuestionPort>,
    clock: Arc<dyn Clock>,
    limits: LimitsConfig,
}

impl Bootstrap {
    pub fn new(
        profiles: Arc<dyn ProfilePort>,
        usage: Arc<dyn UsageDailyPort>,
        review_states: Arc<dyn ReviewStatePort>,
        goals: Arc<dyn GoalPort>,
        questions: Arc<dyn QuestionPort>,
        clock: Arc<dyn Clock>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            profiles,
            usage,
            review_states,
            goals,
            questions,
            clock,
            limits,
        }
    }

    pub fn execute(&self, command: &BootstrapCommand) -> Result<BootstrapOutcome> {
        let now = self.clock.now();
        let today = self.clock.today();
        info!(user = %command.user_id, "bootstrapping");

        let profile = match self.profiles.find(&command.user_id)? {
            Some(profile) => profile,
            None => self
                .profiles
                .save(&Profile::new(command.user_id.clone(), now))?,
        };

        let usage = match self.usage.find(&command.user_id, today)? {
            Some(usage) => usage,
            None => self
                .usage
                .save(&UsageDaily::new(command.user_id.clone(), today))?,
        };

        // Dashboard aggregates
        let states = self.review_states.find_by_user(&command.user_id)?;
        let due_count = self
            .review_states
            .find_due(&command.user_id, now)?
            .len();
        let mastered_count = states
            .iter()
            .filter(|s| s.mastery_level == MasteryLevel::Mastered)
            .count();

        // Owned and public goals, de-duplicated by id
        let mut seen = HashSet::new();
        let mut goals = self.goals.find_by_user(&command.user_id)?;
        goals.extend(self.goals.find_public()?);
        goals.retain(|goal| seen.insert(goal.id));

        let mut total_questions = 0;
        for goal in &goals {
            total_questions += self.questions.find_by_goal(goal.id)?.len();
        }

        info!(
            user = %command.user_id,
            due = due_count,
            goals = goals.len(),
            questions = total_questions,
            mastered = mastered_count,
            "bootstrap complete"
        );

        Ok(BootstrapOutcome::Success {
            profile: profile.clone(),
            usage: UsageInfo {
                date: today,
                reviews_used: usage.reviews_count,
                reviews_limit: self.limits.free_daily_reviews,
                premium: profile.premium,
            },
            dashboard: DashboardInfo {
                due_count,
                total_questions,
                goals_count: goals.len(),
                mastered_count,
            },
        })
    }
}
