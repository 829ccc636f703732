//! Use-case orchestration
//!
//! The only layer that talks to mutable storage, always through the port
//! traits. Business outcomes (quota exceeded, not found, empty session)
//! are enum variants the caller branches on exhaustively; infrastructure
//! failures propagate as `StoreError`.

mod bootstrap;
mod generate_session;
mod outcome;
mod ports;
mod submit_review;

pub use bootstrap::{Bootstrap, BootstrapCommand};
pub use generate_session::{GenerateSession, GenerateSessionCommand};
pub use outcome::{
    AnswerResult, BootstrapOutcome, ChoiceView, DashboardInfo, GenerateSessionOutcome,
    QuestionView, SubmitReviewOutcome, UsageInfo,
};
pub use ports::{
    AttemptPort, Clock, FixedClock, GoalPort, ProfilePort, QuestionPort, ReviewStatePort,
    ReviewWritePort, SystemClock, UsageDailyPort,
};
pub use submit_review::{SubmitReview, SubmitReviewCommand};

use serde::{Deserialize, Serialize};

// ============================================================================
// LIMITS
// ============================================================================

/// Business limits enforced by the use cases. Tunable, not derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsConfig {
    /// Daily graded-review cap for non-premium users
    pub free_daily_reviews: u32,
    /// Session size when the caller does not ask for one
    pub default_max_questions: usize,
    /// Hard cap on session size regardless of what the caller asks for
    pub max_questions_cap: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            free_daily_reviews: 20,
            default_max_questions: 10,
            max_questions_cap: 20,
        }
    }
}
