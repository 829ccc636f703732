//! Decay Scheduler - Ebbinghaus spaced repetition
//!
//! Pure, stateless service that decides when a question is likely to be
//! forgotten and how urgently it should be reviewed:
//!
//! - Forgetting probability from elapsed time vs. the optimal interval
//! - Mastery determination (novice -> mastered)
//! - A weighted 0-100 priority score per question
//! - Selection of the most urgent questions for one session
//!
//! No I/O, no shared mutable state: safe to call concurrently from any
//! number of workers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::{MasteryLevel, Question, QuestionAttempt, QuestionId, ReviewState, UserId};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Spaced-interval table in days, indexed by mastery level
pub const SPACED_INTERVALS_DAYS: [i64; 6] = [1, 3, 7, 14, 30, 90];

/// Forgetting probability at or above which a question needs review
pub const FORGETTING_THRESHOLD: f64 = 0.60;

/// Tunable constants of the priority score.
///
/// The weights and the 0-100 scale are heuristics, not derived values.
/// They are carried as configuration so deployments can tune them without
/// touching the algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Interval table in days, indexed by `MasteryLevel::interval_index`
    pub intervals_days: Vec<i64>,
    /// Priority-score threshold factor for review selection
    pub forgetting_threshold: f64,
    /// Weight of the forgetting probability
    pub weight_forgetting: f64,
    /// Weight of past performance (1 - success rate)
    pub weight_performance: f64,
    /// Weight of the question's difficulty level
    pub weight_difficulty: f64,
    /// Weight of time since the last review
    pub weight_recency: f64,
    /// Days after which the recency component saturates
    pub recency_saturation_days: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            intervals_days: SPACED_INTERVALS_DAYS.to_vec(),
            forgetting_threshold: FORGETTING_THRESHOLD,
            weight_forgetting: 50.0,
            weight_performance: 30.0,
            weight_difficulty: 15.0,
            weight_recency: 5.0,
            recency_saturation_days: 25.0,
        }
    }
}

// ============================================================================
// ANALYSIS TYPES
// ============================================================================

/// Review metrics computed for one answered question
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAnalysis {
    pub question: Question,
    pub review_count: u32,
    pub success_rate: f64,
    pub last_reviewed_at: DateTime<Utc>,
    pub optimal_interval_days: i64,
    pub forgetting_probability: f64,
    pub last_answer_correct: bool,
    pub mastery_level: MasteryLevel,
}

impl ReviewAnalysis {
    /// Whether the forgetting probability crossed the given threshold
    pub fn needs_review(&self, threshold: f64) -> bool {
        self.forgetting_probability >= threshold
    }
}

/// Priority of one question, 0-100 scale (higher = more urgent)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPriority {
    pub priority_score: f64,
    pub analysis: ReviewAnalysis,
}

impl QuestionPriority {
    /// Coarse urgency band for display purposes
    pub fn priority_band(&self) -> &'static str {
        if self.priority_score >= 80.0 {
            "URGENT"
        } else if self.priority_score >= 60.0 {
            "HIGH"
        } else if self.priority_score >= 40.0 {
            "MEDIUM"
        } else {
            "LOW"
        }
    }
}

// ============================================================================
// SPACED REPETITION SERVICE
// ============================================================================

/// The decay scheduler. Stateless apart from its configuration.
#[derive(Debug, Clone, Default)]
pub struct SpacedRepetition {
    config: SchedulerConfig,
}

impl SpacedRepetition {
    /// Build a scheduler with explicit tunables
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Analyze one question's review metrics from its attempt history.
    ///
    /// # Panics
    ///
    /// Panics when `attempts` is empty. Callers only analyze answered
    /// questions, so an empty slice is a programmer error, not a
    /// user-facing condition.
    pub fn analyze(
        &self,
        question: &Question,
        attempts: &[QuestionAttempt],
        now: DateTime<Utc>,
    ) -> ReviewAnalysis {
        assert!(!attempts.is_empty(), "attempts must be non-empty");

        let mut sorted: Vec<&QuestionAttempt> = attempts.iter().collect();
        sorted.sort_by_key(|a| a.timestamp);
        let last = sorted[sorted.len() - 1];

        let review_count = attempts.len() as u32;
        let success_count = attempts.iter().filter(|a| a.is_correct).count();
        let success_rate = success_count as f64 / review_count as f64;

        let mastery_level = MasteryLevel::determine(review_count, success_rate);
        let optimal_interval_days = self.optimal_interval(mastery_level);
        let forgetting_probability =
            self.forgetting_probability(last.timestamp, optimal_interval_days, now);

        ReviewAnalysis {
            question: question.clone(),
            review_count,
            success_rate,
            last_reviewed_at: last.timestamp,
            optimal_interval_days,
            forgetting_probability,
            last_answer_correct: last.is_correct,
            mastery_level,
        }
    }

    /// Weighted priority score for one analyzed question
    pub fn priority(&self, analysis: &ReviewAnalysis, now: DateTime<Utc>) -> QuestionPriority {
        let days_since_review = (now - analysis.last_reviewed_at).num_days() as f64;

        let forgetting_score = self.config.weight_forgetting * analysis.forgetting_probability;
        let performance_score = self.config.weight_performance * (1.0 - analysis.success_rate);
        let difficulty_score =
            self.config.weight_difficulty * (f64::from(analysis.question.difficulty.level()) / 4.0);
        let recency_score = self.config.weight_recency
            * (days_since_review / self.config.recency_saturation_days).min(1.0);

        QuestionPriority {
            priority_score: forgetting_score + performance_score + difficulty_score + recency_score,
            analysis: analysis.clone(),
        }
    }

    /// Select the questions most in need of review.
    ///
    /// Keeps analyses scoring at or above `forgetting_threshold * 100`,
    /// sorted by descending score, capped at `max_questions`. The sort is
    /// stable: equal scores keep their input order, which carries no
    /// semantic meaning.
    pub fn select_for_review(
        &self,
        analyses: &[ReviewAnalysis],
        max_questions: usize,
        now: DateTime<Utc>,
    ) -> Vec<Question> {
        let threshold_score = self.config.forgetting_threshold * 100.0;

        let mut priorities: Vec<QuestionPriority> = analyses
            .iter()
            .map(|a| self.priority(a, now))
            .filter(|p| p.priority_score >= threshold_score)
            .collect();

        priorities.sort_by(|a, b| {
            b.priority_score
                .partial_cmp(&a.priority_score)
                .unwrap_or(Ordering::Equal)
        });

        priorities
            .into_iter()
            .take(max_questions)
            .map(|p| p.analysis.question)
            .collect()
    }

    /// Fold one graded answer into the review aggregate.
    ///
    /// Pure: identical inputs yield identical output apart from the
    /// `now`-derived timestamps.
    pub fn update_review_state(
        &self,
        current: Option<&ReviewState>,
        question_id: QuestionId,
        user_id: &UserId,
        is_correct: bool,
        now: DateTime<Utc>,
    ) -> ReviewState {
        let success_count =
            current.map_or(0, |s| s.success_count) + u32::from(is_correct);
        let fail_count = current.map_or(0, |s| s.fail_count) + u32::from(!is_correct);
        let review_count = success_count + fail_count;
        let success_rate = f64::from(success_count) / f64::from(review_count);

        let mastery_level = MasteryLevel::determine(review_count, success_rate);
        let optimal_interval_days = self.optimal_interval(mastery_level);

        ReviewState {
            question_id,
            user_id: user_id.clone(),
            mastery_level,
            success_count,
            fail_count,
            last_reviewed_at: Some(now),
            next_review_at: now + Duration::days(optimal_interval_days),
            optimal_interval_days,
        }
    }

    /// Interval in days for the given mastery level
    pub fn optimal_interval(&self, mastery_level: MasteryLevel) -> i64 {
        let table = &self.config.intervals_days;
        let index = mastery_level.interval_index().min(table.len() - 1);
        table[index]
    }

    /// Probability the question has been forgotten, bounded to [0, 1].
    ///
    /// Linear in whole elapsed days, reaching 1.0 at twice the optimal
    /// interval; monotonically non-decreasing as `now` advances.
    fn forgetting_probability(
        &self,
        last_reviewed_at: DateTime<Utc>,
        optimal_interval_days: i64,
        now: DateTime<Utc>,
    ) -> f64 {
        let days_since = (now - last_reviewed_at).num_days() as f64;
        (days_since / (optimal_interval_days as f64 * 2.0)).clamp(0.0, 1.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GoalId, QuestionDifficulty, QuestionType};
    use chrono::TimeZone;

    fn question(id: i64, difficulty: QuestionDifficulty) -> Question {
        Question {
            id: QuestionId(id),
            goal_id: GoalId(1),
            question_type: QuestionType::Open,
            prompt: format!("q{id}"),
            answer: "a".to_string(),
            choices: None,
            explanation: None,
            difficulty,
            chapter: None,
            tags: vec![],
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn attempt(question_id: i64, is_correct: bool, at: DateTime<Utc>) -> QuestionAttempt {
        QuestionAttempt::new(
            QuestionId(question_id),
            UserId::from("u1"),
            is_correct,
            None,
            at,
        )
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn analyze_computes_success_rate_and_mastery() {
        let srs = SpacedRepetition::default();
        let q = question(1, QuestionDifficulty::Medium);
        let attempts = vec![
            attempt(1, true, t0()),
            attempt(1, true, t0() + Duration::days(1)),
            attempt(1, true, t0() + Duration::days(2)),
        ];

        let analysis = srs.analyze(&q, &attempts, t0() + Duration::days(2));
        assert_eq!(analysis.review_count, 3);
        assert!((analysis.success_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(analysis.mastery_level, MasteryLevel::Mastered);
        assert_eq!(analysis.optimal_interval_days, 30);
        assert!(analysis.last_answer_correct);
    }

    #[test]
    #[should_panic(expected = "attempts must be non-empty")]
    fn analyze_empty_attempts_is_a_contract_violation() {
        let srs = SpacedRepetition::default();
        let q = question(1, QuestionDifficulty::Medium);
        srs.analyze(&q, &[], t0());
    }

    #[test]
    fn forgetting_probability_is_monotone_and_bounded() {
        let srs = SpacedRepetition::default();
        let q = question(1, QuestionDifficulty::Medium);
        let attempts = vec![attempt(1, false, t0())];

        let mut previous = -1.0;
        for days in 0..20 {
            let analysis = srs.analyze(&q, &attempts, t0() + Duration::days(days));
            let p = analysis.forgetting_probability;
            assert!((0.0..=1.0).contains(&p), "p={p} out of bounds");
            assert!(p >= previous, "probability decreased at day {days}");
            previous = p;
        }
        // One attempt => novice => interval 1 day, saturates at 2 days
        let saturated = srs.analyze(&q, &attempts, t0() + Duration::days(5));
        assert!((saturated.forgetting_probability - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn probability_is_clamped_when_clock_runs_backwards() {
        let srs = SpacedRepetition::default();
        let q = question(1, QuestionDifficulty::Medium);
        let attempts = vec![attempt(1, true, t0())];

        let analysis = srs.analyze(&q, &attempts, t0() - Duration::days(3));
        assert_eq!(analysis.forgetting_probability, 0.0);
    }

    #[test]
    fn priority_weights_compose() {
        let srs = SpacedRepetition::default();
        let q = question(1, QuestionDifficulty::VeryHard);
        // One failed attempt 25 days ago: forgetting saturates, recency saturates
        let attempts = vec![attempt(1, false, t0())];
        let now = t0() + Duration::days(25);

        let analysis = srs.analyze(&q, &attempts, now);
        let priority = srs.priority(&analysis, now);

        // 50*1.0 + 30*1.0 + 15*(4/4) + 5*1.0 = 100
        assert!((priority.priority_score - 100.0).abs() < 1e-9);
        assert_eq!(priority.priority_band(), "URGENT");
    }

    #[test]
    fn select_for_review_filters_sorts_and_caps() {
        let srs = SpacedRepetition::default();
        let now = t0() + Duration::days(10);

        // Urgent: failed long ago, hard
        let urgent = srs.analyze(
            &question(1, QuestionDifficulty::VeryHard),
            &[attempt(1, false, t0())],
            now,
        );
        // Also above threshold but lower score
        let high = srs.analyze(
            &question(2, QuestionDifficulty::Easy),
            &[attempt(2, false, t0() + Duration::days(8))],
            now,
        );
        // Fresh and mastered: below threshold
        let calm = srs.analyze(
            &question(3, QuestionDifficulty::Easy),
            &[
                attempt(3, true, now - Duration::days(2)),
                attempt(3, true, now - Duration::days(1)),
                attempt(3, true, now),
            ],
            now,
        );

        let selected = srs.select_for_review(&[high.clone(), urgent.clone(), calm], 10, now);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].id, QuestionId(1));
        assert_eq!(selected[1].id, QuestionId(2));

        let capped = srs.select_for_review(&[high, urgent], 1, now);
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].id, QuestionId(1));
    }

    #[test]
    fn update_review_state_from_scratch() {
        let srs = SpacedRepetition::default();
        let user = UserId::from("u1");

        let first = srs.update_review_state(None, QuestionId(9), &user, true, t0());
        assert_eq!(first.success_count, 1);
        assert_eq!(first.fail_count, 0);
        assert_eq!(first.mastery_level, MasteryLevel::Novice);
        assert_eq!(first.optimal_interval_days, 1);
        assert_eq!(first.next_review_at, t0() + Duration::days(1));
    }

    #[test]
    fn three_correct_answers_reach_mastered() {
        let srs = SpacedRepetition::default();
        let user = UserId::from("u1");
        let now3 = t0() + Duration::days(2);

        let s1 = srs.update_review_state(None, QuestionId(9), &user, true, t0());
        let s2 =
            srs.update_review_state(Some(&s1), QuestionId(9), &user, true, t0() + Duration::days(1));
        let s3 = srs.update_review_state(Some(&s2), QuestionId(9), &user, true, now3);

        assert_eq!(s3.review_count(), 3);
        assert!((s3.success_rate() - 1.0).abs() < f64::EPSILON);
        assert_eq!(s3.mastery_level, MasteryLevel::Mastered);
        assert_eq!(s3.optimal_interval_days, 30);
        assert_eq!(s3.last_reviewed_at, Some(now3));
        assert_eq!(s3.next_review_at, now3 + Duration::days(30));
    }

    #[test]
    fn failures_keep_the_interval_short() {
        let srs = SpacedRepetition::default();
        let user = UserId::from("u1");

        let mut state = None;
        for day in 0..4 {
            let next = srs.update_review_state(
                state.as_ref(),
                QuestionId(9),
                &user,
                false,
                t0() + Duration::days(day),
            );
            state = Some(next);
        }
        let state = state.unwrap();
        assert_eq!(state.mastery_level, MasteryLevel::Learning);
        assert_eq!(state.optimal_interval_days, 1);
    }
}
