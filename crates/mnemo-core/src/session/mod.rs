//! Session Composer - the hybrid learning algorithm
//!
//! Orchestrates the decay scheduler and the skill adapter to build one
//! balanced study session:
//!
//! 1. Pick a distribution strategy (explicit override or auto-selected)
//! 2. Gather review candidates (spaced repetition priorities)
//! 3. Gather discovery candidates (unanswered, at the adaptive difficulty)
//! 4. Balance both pools against the strategy's ratios
//! 5. Shuffle the combined selection
//!
//! Pure apart from the injected RNG: no I/O, no shared mutable state.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::adaptive::AdaptiveDifficulty;
use crate::domain::{
    DistributionStrategy, Question, QuestionAttempt, QuestionDifficulty, QuestionId, ReviewState,
    SessionConfig,
};
use crate::scheduler::{ReviewAnalysis, SpacedRepetition};

// ============================================================================
// SESSION PLAN
// ============================================================================

/// The composed question set for one study session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    pub strategy: DistributionStrategy,
    pub review_count: usize,
    pub discovery_count: usize,
}

impl SessionPlan {
    /// Total number of questions in the plan
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Whether the plan came back empty
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    fn empty() -> Self {
        Self {
            questions: vec![],
            strategy: DistributionStrategy::ExplorationFocused,
            review_count: 0,
            discovery_count: 0,
        }
    }
}

// ============================================================================
// SESSION COMPOSER
// ============================================================================

/// Builds balanced sessions from the two pure services.
///
/// Sub-services are injected at construction so behavior stays
/// deterministic and testable.
#[derive(Debug, Clone, Default)]
pub struct SessionComposer {
    scheduler: SpacedRepetition,
    adaptive: AdaptiveDifficulty,
}

impl SessionComposer {
    /// Build a composer from explicitly configured services
    pub fn new(scheduler: SpacedRepetition, adaptive: AdaptiveDifficulty) -> Self {
        Self { scheduler, adaptive }
    }

    /// Compose one session.
    ///
    /// `review_states` are the persisted aggregates for the user; analysis
    /// itself derives from the attempt log, the source of truth.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        config: &SessionConfig,
        available: &[Question],
        attempts: &[QuestionAttempt],
        review_states: &HashMap<QuestionId, ReviewState>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> SessionPlan {
        info!(
            available = available.len(),
            attempts = attempts.len(),
            tracked_states = review_states.len(),
            max = config.max_questions,
            "composing session"
        );

        if available.is_empty() {
            warn!("no questions available");
            return SessionPlan::empty();
        }

        if attempts.is_empty() {
            return self.introduction_session(config, available, rng);
        }

        self.hybrid_session(config, available, attempts, now, rng)
    }

    /// Introduction mode: the user has no history anywhere, so everything
    /// is discovery.
    fn introduction_session<R: Rng + ?Sized>(
        &self,
        config: &SessionConfig,
        available: &[Question],
        rng: &mut R,
    ) -> SessionPlan {
        let mut pool: Vec<Question> = available.to_vec();
        pool.shuffle(rng);
        pool.truncate(config.max_questions);

        info!(selected = pool.len(), "introduction session for new user");

        let discovery_count = pool.len();
        SessionPlan {
            questions: pool,
            strategy: DistributionStrategy::ExplorationFocused,
            review_count: 0,
            discovery_count,
        }
    }

    /// Hybrid mode: mix review and discovery according to the strategy
    fn hybrid_session<R: Rng + ?Sized>(
        &self,
        config: &SessionConfig,
        available: &[Question],
        attempts: &[QuestionAttempt],
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> SessionPlan {
        let strategy = config
            .distribution_strategy
            .unwrap_or_else(|| auto_strategy(attempts));
        debug!(strategy = %strategy, "{}", strategy.description());

        let review_pool = self.review_candidates(available, attempts, config.max_questions, now);
        debug!(review = review_pool.len(), "review candidates");

        let answered: HashSet<QuestionId> = attempts.iter().map(|a| a.question_id).collect();
        let discovery_pool = self.discovery_candidates(available, &answered, attempts, config, rng);
        debug!(discovery = discovery_pool.len(), "discovery candidates");

        let (selected_review, selected_discovery) =
            balance(review_pool, discovery_pool, config.max_questions, strategy);

        let review_count = selected_review.len();
        let discovery_count = selected_discovery.len();

        let mut questions = selected_review;
        questions.extend(selected_discovery);
        questions.shuffle(rng);

        info!(
            review = review_count,
            discovery = discovery_count,
            total = questions.len(),
            "hybrid session composed"
        );

        SessionPlan {
            questions,
            strategy,
            review_count,
            discovery_count,
        }
    }

    /// Questions the decay scheduler flags as due for review
    fn review_candidates(
        &self,
        available: &[Question],
        attempts: &[QuestionAttempt],
        max_questions: usize,
        now: DateTime<Utc>,
    ) -> Vec<Question> {
        let mut by_question: HashMap<QuestionId, Vec<QuestionAttempt>> = HashMap::new();
        for attempt in attempts {
            by_question
                .entry(attempt.question_id)
                .or_default()
                .push(attempt.clone());
        }

        let analyses: Vec<ReviewAnalysis> = available
            .iter()
            .filter_map(|question| {
                by_question
                    .get(&question.id)
                    .map(|attempts| self.scheduler.analyze(question, attempts, now))
            })
            .collect();

        self.scheduler.select_for_review(&analyses, max_questions, now)
    }

    /// Unanswered questions at the adaptive target difficulty.
    ///
    /// When no unanswered question matches the target, the search widens
    /// to the full unanswered pool rather than returning nothing.
    fn discovery_candidates<R: Rng + ?Sized>(
        &self,
        available: &[Question],
        answered: &HashSet<QuestionId>,
        attempts: &[QuestionAttempt],
        config: &SessionConfig,
        rng: &mut R,
    ) -> Vec<Question> {
        let unanswered: Vec<Question> = available
            .iter()
            .filter(|q| !answered.contains(&q.id))
            .filter(|q| match &config.chapter_filter {
                Some(chapter) => q.chapter.as_deref() == Some(chapter.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        if unanswered.is_empty() {
            return vec![];
        }

        let baseline = config.difficulty_filter.unwrap_or(QuestionDifficulty::Medium);
        let mut recent: Vec<QuestionAttempt> = attempts.to_vec();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let adaptive = self.adaptive.recommend(&recent, baseline);
        debug!(
            target = %adaptive.recommended,
            reason = ?adaptive.reason,
            "adaptive difficulty"
        );

        let mut at_target: Vec<Question> = unanswered
            .iter()
            .filter(|q| q.difficulty == adaptive.recommended)
            .cloned()
            .collect();

        if at_target.is_empty() {
            debug!(target = %adaptive.recommended, "no questions at target difficulty, widening search");
            let mut widened = unanswered;
            widened.shuffle(rng);
            widened
        } else {
            at_target.shuffle(rng);
            at_target
        }
    }
}

/// Auto-select the strategy from distinct answered questions and the
/// average success rate over all attempts
pub fn auto_strategy(attempts: &[QuestionAttempt]) -> DistributionStrategy {
    let distinct: HashSet<QuestionId> = attempts.iter().map(|a| a.question_id).collect();
    let avg_success_rate = if attempts.is_empty() {
        0.0
    } else {
        attempts.iter().filter(|a| a.is_correct).count() as f64 / attempts.len() as f64
    };

    DistributionStrategy::determine_optimal(distinct.len(), avg_success_rate)
}

/// Split the session budget between the two pools.
///
/// Targets follow the strategy's ratios; slots a short pool cannot fill
/// are reallocated to the other pool up to its availability, so the total
/// is `min(max_questions, review_pool + discovery_pool)`.
fn balance(
    review_pool: Vec<Question>,
    discovery_pool: Vec<Question>,
    max_questions: usize,
    strategy: DistributionStrategy,
) -> (Vec<Question>, Vec<Question>) {
    if review_pool.is_empty() && discovery_pool.is_empty() {
        return (vec![], vec![]);
    }
    if review_pool.is_empty() {
        let mut discovery = discovery_pool;
        discovery.truncate(max_questions);
        return (vec![], discovery);
    }
    if discovery_pool.is_empty() {
        let mut review = review_pool;
        review.truncate(max_questions);
        return (review, vec![]);
    }

    let target_review = (max_questions as f64 * strategy.review_ratio()) as usize;
    let target_discovery = max_questions - target_review;

    let actual_review = target_review.min(review_pool.len());
    let actual_discovery = target_discovery.min(discovery_pool.len());

    // Reallocate leftover slots from an exhausted pool
    let remaining = max_questions - actual_review - actual_discovery;
    let final_review = if discovery_pool.len() <= actual_discovery && review_pool.len() > actual_review
    {
        (actual_review + remaining).min(review_pool.len())
    } else {
        actual_review
    };
    let final_discovery =
        if review_pool.len() <= actual_review && discovery_pool.len() > actual_discovery {
            (actual_discovery + remaining).min(discovery_pool.len())
        } else {
            actual_discovery
        };

    debug!(
        target_review,
        target_discovery, final_review, final_discovery, "balanced session pools"
    );

    let mut review = review_pool;
    review.truncate(final_review);
    let mut discovery = discovery_pool;
    discovery.truncate(final_discovery);
    (review, discovery)
}

// ============================================================================
// TESTS
// ============================================================================
