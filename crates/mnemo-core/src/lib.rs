//! # Mnemo Core
//!
//! Learning engine for question-based study apps. Combines three
//! cooperating algorithms:
//!
//! - **Decay Scheduler**: mastery-driven spaced repetition with a
//!   forgetting-probability priority score
//! - **Skill Adapter**: windowed performance analysis that moves the
//!   recommended difficulty one step at a time
//! - **Session Composer**: hybrid review/discovery session assembly with
//!   automatic strategy selection
//!
//! The use-case layer wires the algorithms to persistence ports and
//! returns sealed outcome enums instead of throwing: quota exceeded,
//! goal not found, and an empty session are ordinary variants the caller
//! matches on.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mnemo_core::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteStore::new(None)?);
//! let clock = Arc::new(SystemClock);
//!
//! let generate = GenerateSession::new(
//!     store.clone(), store.clone(), store.clone(), store.clone(),
//!     clock.clone(), SessionComposer::default(), LimitsConfig::default(),
//! );
//! let outcome = generate.execute(&GenerateSessionCommand::for_user("user-1"))?;
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): compile SQLite from source instead of
//!   linking the system library

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod adaptive;
pub mod domain;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod usecase;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Domain types
pub use domain::{
    Choice, DistributionStrategy, Goal, GoalId, MasteryLevel, NewGoal, NewQuestion, Profile,
    Question, QuestionAttempt, QuestionDifficulty, QuestionId, QuestionType, ReviewState,
    SessionConfig, UsageDaily, UserId,
};

// Decay scheduler
pub use scheduler::{
    QuestionPriority, ReviewAnalysis, SchedulerConfig, SpacedRepetition, FORGETTING_THRESHOLD,
    SPACED_INTERVALS_DAYS,
};

// Skill adapter
pub use adaptive::{
    analyze_performance, AdaptationReason, AdaptiveConfig, AdaptiveDifficulty, AdaptiveOutcome,
    PerformanceMetrics,
};

// Session composer
pub use session::{auto_strategy, SessionComposer, SessionPlan};

// Use cases and ports
pub use usecase::{
    AnswerResult, AttemptPort, Bootstrap, BootstrapCommand, BootstrapOutcome, ChoiceView, Clock,
    DashboardInfo, FixedClock, GenerateSession, GenerateSessionCommand, GenerateSessionOutcome,
    GoalPort, LimitsConfig, ProfilePort, QuestionPort, QuestionView, ReviewStatePort,
    ReviewWritePort, SubmitReview, SubmitReviewCommand, SubmitReviewOutcome, SystemClock,
    UsageDailyPort, UsageInfo,
};

// Storage layer
pub use storage::{MemoryStore, Result, SqliteStore, StoreError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        AdaptiveDifficulty, Bootstrap, BootstrapCommand, BootstrapOutcome, Clock,
        DistributionStrategy, FixedClock, GenerateSession, GenerateSessionCommand,
        GenerateSessionOutcome, LimitsConfig, MasteryLevel, MemoryStore, Question,
        QuestionDifficulty, Result, ReviewState, SessionComposer, SpacedRepetition, SqliteStore,
        StoreError, SubmitReview, SubmitReviewCommand, SubmitReviewOutcome, SystemClock, UserId,
    };
}
