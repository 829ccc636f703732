//! Skill Adapter - adaptive difficulty
//!
//! Pure, stateless service that recommends the difficulty of the next new
//! question from a window of recent performance. Adjustment is capped at a
//! single adjacent level per call regardless of streak length; this
//! dampening keeps the difficulty from ping-ponging across sessions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{QuestionAttempt, QuestionDifficulty};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Tunable parameters of the adaptation algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveConfig {
    /// How many of the most recent attempts are analyzed
    pub analysis_window: usize,
    /// Success rate at or above which difficulty is promoted
    pub promotion_threshold: f64,
    /// Success rate at or below which difficulty is demoted
    pub demotion_threshold: f64,
    /// Minimum attempts before any adaptation happens
    pub min_attempts: usize,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            analysis_window: 10,
            promotion_threshold: 0.75,
            demotion_threshold: 0.40,
            min_attempts: 3,
        }
    }
}

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Why the recommended difficulty is what it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdaptationReason {
    /// Too few attempts to adapt; difficulty unchanged
    InsufficientData,
    /// High success rate; difficulty raised one step
    Promoted,
    /// Low success rate; difficulty lowered one step
    Demoted,
    /// Stable performance, or already at a saturated end
    Maintained,
}

/// Performance over the analyzed window
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub total_attempts: usize,
    pub success_rate: f64,
}

/// Outcome of one adaptation call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveOutcome {
    pub recommended: QuestionDifficulty,
    pub reason: AdaptationReason,
    pub metrics: PerformanceMetrics,
}

// ============================================================================
// ADAPTIVE DIFFICULTY SERVICE
// ============================================================================

/// The skill adapter. Stateless apart from its configuration.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveDifficulty {
    config: AdaptiveConfig,
}

impl AdaptiveDifficulty {
    /// Build an adapter with explicit tunables
    pub fn new(config: AdaptiveConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    /// Recommend the difficulty of the next new question.
    ///
    /// `recent_attempts` must be ordered most recent first; only the
    /// configured window is analyzed.
    pub fn recommend(
        &self,
        recent_attempts: &[QuestionAttempt],
        current: QuestionDifficulty,
    ) -> AdaptiveOutcome {
        if recent_attempts.len() < self.config.min_attempts {
            debug!(
                attempts = recent_attempts.len(),
                current = %current,
                "not enough data, keeping current difficulty"
            );
            return AdaptiveOutcome {
                recommended: current,
                reason: AdaptationReason::InsufficientData,
                metrics: PerformanceMetrics {
                    total_attempts: recent_attempts.len(),
                    success_rate: 0.0,
                },
            };
        }

        let window = &recent_attempts[..recent_attempts.len().min(self.config.analysis_window)];
        let metrics = analyze_performance(window);

        self.apply(current, metrics)
    }

    /// One-step promotion/demotion against the thresholds
    fn apply(&self, current: QuestionDifficulty, metrics: PerformanceMetrics) -> AdaptiveOutcome {
        if metrics.success_rate >= self.config.promotion_threshold {
            if let Some(promoted) = current.promote() {
                debug!(from = %current, to = %promoted, "promoting difficulty");
                return AdaptiveOutcome {
                    recommended: promoted,
                    reason: AdaptationReason::Promoted,
                    metrics,
                };
            }
        }

        if metrics.success_rate <= self.config.demotion_threshold {
            if let Some(demoted) = current.demote() {
                debug!(from = %current, to = %demoted, "demoting difficulty");
                return AdaptiveOutcome {
                    recommended: demoted,
                    reason: AdaptationReason::Demoted,
                    metrics,
                };
            }
        }

        AdaptiveOutcome {
            recommended: current,
            reason: AdaptationReason::Maintained,
            metrics,
        }
    }
}

/// Success metrics over a slice of attempts
pub fn analyze_performance(attempts: &[QuestionAttempt]) -> PerformanceMetrics {
    let total_attempts = attempts.len();
    let successful = attempts.iter().filter(|a| a.is_correct).count();
    let success_rate = if total_attempts > 0 {
        successful as f64 / total_attempts as f64
    } else {
        0.0
    };

    PerformanceMetrics {
        total_attempts,
        success_rate,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QuestionId, UserId};
    use chrono::{Duration, TimeZone, Utc};

    /// `outcomes` ordered most recent first
    fn attempts(outcomes: &[bool]) -> Vec<QuestionAttempt> {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        outcomes
            .iter()
            .enumerate()
            .map(|(i, &ok)| {
                QuestionAttempt::new(
                    QuestionId(i as i64),
                    UserId::from("u1"),
                    ok,
                    None,
                    t0 - Duration::hours(i as i64),
                )
            })
            .collect()
    }

    #[test]
    fn two_attempts_is_insufficient_data() {
        let adapter = AdaptiveDifficulty::default();
        let outcome = adapter.recommend(&attempts(&[true, false]), QuestionDifficulty::Hard);
        assert_eq!(outcome.recommended, QuestionDifficulty::Hard);
        assert_eq!(outcome.reason, AdaptationReason::InsufficientData);
        assert_eq!(outcome.metrics.total_attempts, 2);
    }

    #[test]
    fn three_correct_promotes_easy_to_medium() {
        let adapter = AdaptiveDifficulty::default();
        let outcome = adapter.recommend(&attempts(&[true, true, true]), QuestionDifficulty::Easy);
        assert_eq!(outcome.recommended, QuestionDifficulty::Medium);
        assert_eq!(outcome.reason, AdaptationReason::Promoted);
        assert!((outcome.metrics.success_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn thirty_percent_over_ten_demotes_hard_to_medium() {
        let outcomes = [
            true, false, false, true, false, false, false, true, false, false,
        ];
        let adapter = AdaptiveDifficulty::default();
        let outcome = adapter.recommend(&attempts(&outcomes), QuestionDifficulty::Hard);
        assert_eq!(outcome.recommended, QuestionDifficulty::Medium);
        assert_eq!(outcome.reason, AdaptationReason::Demoted);
        assert!((outcome.metrics.success_rate - 0.3).abs() < 1e-9);
    }

    #[test]
    fn promotion_saturates_at_very_hard() {
        let adapter = AdaptiveDifficulty::default();
        let outcome =
            adapter.recommend(&attempts(&[true, true, true, true]), QuestionDifficulty::VeryHard);
        assert_eq!(outcome.recommended, QuestionDifficulty::VeryHard);
        assert_eq!(outcome.reason, AdaptationReason::Maintained);
    }

    #[test]
    fn demotion_saturates_at_easy() {
        let adapter = AdaptiveDifficulty::default();
        let outcome =
            adapter.recommend(&attempts(&[false, false, false]), QuestionDifficulty::Easy);
        assert_eq!(outcome.recommended, QuestionDifficulty::Easy);
        assert_eq!(outcome.reason, AdaptationReason::Maintained);
    }

    #[test]
    fn middling_performance_is_maintained() {
        let adapter = AdaptiveDifficulty::default();
        let outcome = adapter.recommend(
            &attempts(&[true, false, true, false, true, false]),
            QuestionDifficulty::Medium,
        );
        assert_eq!(outcome.recommended, QuestionDifficulty::Medium);
        assert_eq!(outcome.reason, AdaptationReason::Maintained);
    }

    #[test]
    fn only_the_window_is_analyzed() {
        // 10 recent failures, then 10 old successes beyond the window
        let mut outcomes = vec![false; 10];
        outcomes.extend(vec![true; 10]);
        let adapter = AdaptiveDifficulty::default();
        let outcome = adapter.recommend(&attempts(&outcomes), QuestionDifficulty::Hard);
        assert_eq!(outcome.recommended, QuestionDifficulty::Medium);
        assert_eq!(outcome.reason, AdaptationReason::Demoted);
        assert_eq!(outcome.metrics.total_attempts, 10);
    }

    #[test]
    fn adjustment_is_one_step_per_call() {
        // A perfect long streak still promotes only one level
        let adapter = AdaptiveDifficulty::default();
        let outcome = adapter.recommend(&attempts(&[true; 10]), QuestionDifficulty::Easy);
        assert_eq!(outcome.recommended, QuestionDifficulty::Medium);
    }
}
