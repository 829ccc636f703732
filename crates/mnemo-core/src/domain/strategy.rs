//! Distribution strategies - the review/discovery mix of a session

use serde::{Deserialize, Serialize};

use super::{GoalId, QuestionDifficulty};

// ============================================================================
// DISTRIBUTION STRATEGY
// ============================================================================

/// Named review/discovery ratio applied when balancing a session.
///
/// The ratios of every strategy sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionStrategy {
    /// 80% new questions - the default for new users and empty sessions
    #[default]
    ExplorationFocused,
    /// 70% new questions
    DiscoveryPreferred,
    /// 50/50
    Balanced,
    /// 70% review
    ReviewPreferred,
    /// 80% review
    MasteryFocused,
}

impl DistributionStrategy {
    /// Fraction of the session reserved for review questions
    pub fn review_ratio(&self) -> f64 {
        match self {
            DistributionStrategy::ExplorationFocused => 0.20,
            DistributionStrategy::DiscoveryPreferred => 0.30,
            DistributionStrategy::Balanced => 0.50,
            DistributionStrategy::ReviewPreferred => 0.70,
            DistributionStrategy::MasteryFocused => 0.80,
        }
    }

    /// Fraction of the session reserved for discovery questions
    pub fn discovery_ratio(&self) -> f64 {
        1.0 - self.review_ratio()
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            DistributionStrategy::ExplorationFocused => "Exploration focus - 80% new questions",
            DistributionStrategy::DiscoveryPreferred => "Discovery preferred - 70% new questions",
            DistributionStrategy::Balanced => "Balanced - 50/50",
            DistributionStrategy::ReviewPreferred => "Review preferred - 70% review",
            DistributionStrategy::MasteryFocused => "Mastery focus - 80% review",
        }
    }

    /// Auto-select the strategy from the user's history.
    ///
    /// `total_answered` is the number of distinct questions the user has
    /// answered; `avg_success_rate` the success rate over all attempts.
    pub fn determine_optimal(total_answered: usize, avg_success_rate: f64) -> Self {
        if total_answered < 10 {
            DistributionStrategy::ExplorationFocused
        } else if total_answered < 50 && avg_success_rate > 0.7 {
            DistributionStrategy::DiscoveryPreferred
        } else if avg_success_rate < 0.5 {
            DistributionStrategy::ReviewPreferred
        } else {
            DistributionStrategy::Balanced
        }
    }
}

impl std::fmt::Display for DistributionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionStrategy::ExplorationFocused => write!(f, "exploration_focused"),
            DistributionStrategy::DiscoveryPreferred => write!(f, "discovery_preferred"),
            DistributionStrategy::Balanced => write!(f, "balanced"),
            DistributionStrategy::ReviewPreferred => write!(f, "review_preferred"),
            DistributionStrategy::MasteryFocused => write!(f, "mastery_focused"),
        }
    }
}

// ============================================================================
// SESSION CONFIG
// ============================================================================

/// Configuration of one study session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionConfig {
    /// Restrict the session to one goal; `None` draws from all public goals
    #[serde(default)]
    pub goal_id: Option<GoalId>,
    /// Upper bound on session size
    pub max_questions: usize,
    /// Baseline difficulty for discovery questions (None = Medium)
    #[serde(default)]
    pub difficulty_filter: Option<QuestionDifficulty>,
    /// Restrict discovery to one chapter
    #[serde(default)]
    pub chapter_filter: Option<String>,
    /// Explicit strategy override (None = auto-select from history)
    #[serde(default)]
    pub distribution_strategy: Option<DistributionStrategy>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            goal_id: None,
            max_questions: 10,
            difficulty_filter: None,
            chapter_filter: None,
            distribution_strategy: None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_sum_to_one() {
        for s in [
            DistributionStrategy::ExplorationFocused,
            DistributionStrategy::DiscoveryPreferred,
            DistributionStrategy::Balanced,
            DistributionStrategy::ReviewPreferred,
            DistributionStrategy::MasteryFocused,
        ] {
            assert!((s.review_ratio() + s.discovery_ratio() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn auto_selection_thresholds() {
        assert_eq!(
            DistributionStrategy::determine_optimal(0, 0.0),
            DistributionStrategy::ExplorationFocused
        );
        assert_eq!(
            DistributionStrategy::determine_optimal(9, 1.0),
            DistributionStrategy::ExplorationFocused
        );
        assert_eq!(
            DistributionStrategy::determine_optimal(20, 0.8),
            DistributionStrategy::DiscoveryPreferred
        );
        assert_eq!(
            DistributionStrategy::determine_optimal(20, 0.4),
            DistributionStrategy::ReviewPreferred
        );
        assert_eq!(
            DistributionStrategy::determine_optimal(60, 0.8),
            DistributionStrategy::Balanced
        );
        assert_eq!(
            DistributionStrategy::determine_optimal(60, 0.6),
            DistributionStrategy::Balanced
        );
    }
}
