//! Submit Review - grade one answer
//!
//! Enforces the daily quota, records the attempt, folds the new review
//! state through the decay scheduler, and bumps the usage counter. The
//! three write effects go through `ReviewWritePort::apply_review` so they
//! land together or not at all.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Profile, QuestionAttempt, QuestionId, UsageDaily, UserId};
use crate::scheduler::SpacedRepetition;
use crate::storage::Result;
use crate::usecase::{
    AnswerResult, Clock, LimitsConfig, ProfilePort, QuestionPort, ReviewStatePort, ReviewWritePort,
    SubmitReviewOutcome, UsageDailyPort, UsageInfo,
};

/// Command for one graded answer
#[derive(Debug, Clone)]
pub struct SubmitReviewCommand {
    pub user_id: UserId,
    pub question_id: QuestionId,
    pub is_correct: bool,
    pub selected_choice_ids: Option<Vec<Uuid>>,
}

/// The review-submission use case
pub struct SubmitReview {
    questions: Arc<dyn QuestionPort>,
    review_states: Arc<dyn ReviewStatePort>,
    profiles: Arc<dyn ProfilePort>,
    usage: Arc<dyn UsageDailyPort>,
    writer: Arc<dyn ReviewWritePort>,
    clock: Arc<dyn Clock>,
    scheduler: SpacedRepetition,
    limits: LimitsConfig,
}

impl SubmitReview {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        questions: Arc<dyn QuestionPort>,
        review_states: Arc<dyn ReviewStatePort>,
        profiles: Arc<dyn ProfilePort>,
        usage: Arc<dyn UsageDailyPort>,
        writer: Arc<dyn ReviewWritePort>,
        clock: Arc<dyn Clock>,
        scheduler: SpacedRepetition,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            questions,
            review_states,
            profiles,
            usage,
            writer,
            clock,
            scheduler,
            limits,
        }
    }

    pub fn execute(&self, command: &SubmitReviewCommand) -> Result<SubmitReviewOutcome> {
        info!(
            user = %command.user_id,
            question = %command.question_id,
            correct = command.is_correct,
            "submitting review"
        );

        if command.user_id.as_str().trim().is_empty() {
            return Ok(SubmitReviewOutcome::ValidationFailed {
                errors: vec!["userId must not be blank".to_string()],
            });
        }

        let now = self.clock.now();
        let today = self.clock.today();

        // Profile, created on first contact
        let profile = match self.profiles.find(&command.user_id)? {
            Some(profile) => profile,
            None => self
                .profiles
                .save(&Profile::new(command.user_id.clone(), now))?,
        };

        // Quota gate before any mutation
        if !profile.premium {
            let used = self
                .usage
                .find(&command.user_id, today)?
                .map_or(0, |u| u.reviews_count);

            if used >= self.limits.free_daily_reviews {
                warn!(
                    user = %command.user_id,
                    used,
                    limit = self.limits.free_daily_reviews,
                    "daily quota exceeded"
                );
                return Ok(SubmitReviewOutcome::QuotaExceeded {
                    limit: self.limits.free_daily_reviews,
                    used,
                    message: "Daily review quota exceeded. Upgrade to premium to continue."
                        .to_string(),
                });
            }
        }

        let Some(question) = self.questions.find_by_id(command.question_id)? else {
            warn!(question = %command.question_id, "question not found");
            return Ok(SubmitReviewOutcome::QuestionNotFound {
                question_id: command.question_id,
            });
        };

        // Fold the new attempt into the review aggregate
        let attempt = QuestionAttempt::new(
            question.id,
            command.user_id.clone(),
            command.is_correct,
            command.selected_choice_ids.clone(),
            now,
        );
        let current = self
            .review_states
            .find_by_user_and_question(&command.user_id, question.id)?;
        let new_state = self.scheduler.update_review_state(
            current.as_ref(),
            question.id,
            &command.user_id,
            command.is_correct,
            now,
        );

        // All three effects in one transaction
        let usage: UsageDaily = self.writer.apply_review(&attempt, &new_state, today)?;

        info!(
            user = %command.user_id,
            question = %command.question_id,
            mastery = %new_state.mastery_level,
            used = usage.reviews_count,
            limit = self.limits.free_daily_reviews,
            "review submitted"
        );

        Ok(SubmitReviewOutcome::Success {
            question_id: question.id,
            result: if command.is_correct {
                AnswerResult::Correct
            } else {
                AnswerResult::Incorrect
            },
            review_state: new_state,
            usage: UsageInfo {
                date: today,
                reviews_used: usage.reviews_count,
                reviews_limit: self.limits.free_daily_reviews,
                premium: profile.premium,
            },
        })
    }
}
