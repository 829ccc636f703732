//! Use-case integration tests over the in-memory store.
//!
//! Every test pins the clock, seeds content through the store helpers,
//! and drives the use cases end to end through the port traits.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use mnemo_core::{
    Bootstrap, BootstrapCommand, BootstrapOutcome, FixedClock, GenerateSession,
    GenerateSessionCommand, GenerateSessionOutcome, GoalId, LimitsConfig, MasteryLevel,
    MemoryStore, NewGoal, NewQuestion, Question, QuestionDifficulty, QuestionId, SessionComposer,
    SpacedRepetition, SubmitReview, SubmitReviewCommand, SubmitReviewOutcome, UserId,
};

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
    ))
}

fn seed_goal(store: &MemoryStore, owner: &str, is_public: bool) -> GoalId {
    store
        .create_goal(&NewGoal {
            user_id: UserId::from(owner),
            title: format!("{owner}'s goal"),
            description: None,
            is_public,
        })
        .id
}

fn seed_questions(store: &MemoryStore, goal_id: GoalId, count: usize) -> Vec<Question> {
    (0..count)
        .map(|i| {
            store.create_question(&NewQuestion {
                goal_id,
                question_type: Default::default(),
                prompt: format!("Question {i}?"),
                answer: format!("Answer {i}"),
                choices: None,
                explanation: None,
                difficulty: QuestionDifficulty::Medium,
                chapter: None,
                tags: vec![],
            })
        })
        .collect()
}

fn generate_session(store: &Arc<MemoryStore>, clock: &Arc<FixedClock>) -> GenerateSession {
    GenerateSession::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        clock.clone(),
        SessionComposer::default(),
        LimitsConfig::default(),
    )
}

fn submit_review(store: &Arc<MemoryStore>, clock: &Arc<FixedClock>) -> SubmitReview {
    SubmitReview::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        clock.clone(),
        SpacedRepetition::default(),
        LimitsConfig::default(),
    )
}

fn bootstrap(store: &Arc<MemoryStore>, clock: &Arc<FixedClock>) -> Bootstrap {
    Bootstrap::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        clock.clone(),
        LimitsConfig::default(),
    )
}

// ============================================================================
// GENERATE SESSION
// ============================================================================

#[test]
fn new_user_gets_an_introduction_session_from_public_goals() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let goal_id = seed_goal(&store, "owner", true);
    seed_questions(&store, goal_id, 8);

    let usecase = generate_session(&store, &clock);
    let mut rng = StdRng::seed_from_u64(7);
    let outcome = usecase
        .execute_with_rng(&GenerateSessionCommand::for_user("learner"), &mut rng)
        .expect("execute");

    match outcome {
        GenerateSessionOutcome::Success {
            session_id,
            questions,
            review_count,
            discovery_count,
            ..
        } => {
            assert!(session_id.starts_with("session_"));
            assert_eq!(questions.len(), 8);
            assert_eq!(review_count, 0);
            assert_eq!(discovery_count, 8);
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn unknown_goal_is_reported_not_thrown() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let usecase = generate_session(&store, &clock);

    let command = GenerateSessionCommand {
        goal_id: Some(GoalId(42)),
        ..GenerateSessionCommand::for_user("learner")
    };
    let outcome = usecase.execute(&command).expect("execute");

    assert!(matches!(
        outcome,
        GenerateSessionOutcome::GoalNotFound {
            goal_id: GoalId(42)
        }
    ));
}

#[test]
fn empty_pool_yields_no_questions_available() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    // A private goal contributes nothing to the public pool
    seed_goal(&store, "owner", false);

    let usecase = generate_session(&store, &clock);
    let outcome = usecase
        .execute(&GenerateSessionCommand::for_user("learner"))
        .expect("execute");

    assert!(matches!(
        outcome,
        GenerateSessionOutcome::NoQuestionsAvailable { goal_id: None, .. }
    ));
}

#[test]
fn blank_user_id_fails_validation() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let usecase = generate_session(&store, &clock);

    let outcome = usecase
        .execute(&GenerateSessionCommand::for_user("   "))
        .expect("execute");

    assert!(matches!(
        outcome,
        GenerateSessionOutcome::ValidationFailed { .. }
    ));
}

#[test]
fn requested_size_is_clamped_to_the_cap() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let goal_id = seed_goal(&store, "owner", true);
    seed_questions(&store, goal_id, 30);

    let usecase = generate_session(&store, &clock);
    let mut rng = StdRng::seed_from_u64(7);
    let command = GenerateSessionCommand {
        max_questions: Some(50),
        ..GenerateSessionCommand::for_user("learner")
    };
    let outcome = usecase.execute_with_rng(&command, &mut rng).expect("execute");

    match outcome {
        GenerateSessionOutcome::Success { questions, .. } => {
            assert_eq!(questions.len(), LimitsConfig::default().max_questions_cap);
        }
        other => panic!("expected success, got {other:?}"),
    }
}

// ============================================================================
// SUBMIT REVIEW
// ============================================================================

#[test]
fn three_correct_answers_reach_mastered_with_a_thirty_day_interval() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let goal_id = seed_goal(&store, "owner", true);
    let question = &seed_questions(&store, goal_id, 1)[0];

    let usecase = submit_review(&store, &clock);
    let command = SubmitReviewCommand {
        user_id: UserId::from("learner"),
        question_id: question.id,
        is_correct: true,
        selected_choice_ids: None,
    };

    let mut last = None;
    for _ in 0..3 {
        last = Some(usecase.execute(&command).expect("execute"));
        clock.advance(Duration::days(1));
    }

    match last.expect("three submissions") {
        SubmitReviewOutcome::Success {
            review_state,
            usage,
            ..
        } => {
            assert_eq!(review_state.mastery_level, MasteryLevel::Mastered);
            assert_eq!(review_state.optimal_interval_days, 30);
            assert_eq!(review_state.success_count, 3);
            assert_eq!(usage.reviews_used, 1); // third answer fell on day three
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn twenty_first_review_of_the_day_is_rejected_with_no_writes() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let goal_id = seed_goal(&store, "owner", true);
    let question = &seed_questions(&store, goal_id, 1)[0];

    let usecase = submit_review(&store, &clock);
    let command = SubmitReviewCommand {
        user_id: UserId::from("learner"),
        question_id: question.id,
        is_correct: true,
        selected_choice_ids: None,
    };

    let mut state_before_rejection = None;
    for _ in 0..20 {
        let outcome = usecase.execute(&command).expect("execute");
        match outcome {
            SubmitReviewOutcome::Success { review_state, .. } => {
                state_before_rejection = Some(review_state);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }
    assert_eq!(store.attempt_count(), 20);

    let outcome = usecase.execute(&command).expect("execute");
    match outcome {
        SubmitReviewOutcome::QuotaExceeded { limit, used, .. } => {
            assert_eq!(limit, 20);
            assert_eq!(used, 20);
        }
        other => panic!("expected quota exceeded, got {other:?}"),
    }

    // The rejected submission left nothing behind
    assert_eq!(store.attempt_count(), 20);
    let state_after = mnemo_core::ReviewStatePort::find_by_user_and_question(
        store.as_ref(),
        &UserId::from("learner"),
        question.id,
    )
    .expect("state query")
    .expect("state present");
    let expected = state_before_rejection.expect("twenty successes");
    assert_eq!(state_after.success_count, expected.success_count);
    assert_eq!(state_after.next_review_at, expected.next_review_at);
}

#[test]
fn quota_resets_on_the_next_calendar_day() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let goal_id = seed_goal(&store, "owner", true);
    let question = &seed_questions(&store, goal_id, 1)[0];

    let usecase = submit_review(&store, &clock);
    let command = SubmitReviewCommand {
        user_id: UserId::from("learner"),
        question_id: question.id,
        is_correct: false,
        selected_choice_ids: None,
    };

    for _ in 0..20 {
        usecase.execute(&command).expect("execute");
    }
    assert!(matches!(
        usecase.execute(&command).expect("execute"),
        SubmitReviewOutcome::QuotaExceeded { .. }
    ));

    clock.advance(Duration::days(1));
    match usecase.execute(&command).expect("execute") {
        SubmitReviewOutcome::Success { usage, .. } => assert_eq!(usage.reviews_used, 1),
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn premium_users_bypass_the_quota() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let goal_id = seed_goal(&store, "owner", true);
    let question = &seed_questions(&store, goal_id, 1)[0];
    let user = UserId::from("vip");
    store.set_premium(&user, true);

    let usecase = submit_review(&store, &clock);
    let command = SubmitReviewCommand {
        user_id: user,
        question_id: question.id,
        is_correct: true,
        selected_choice_ids: None,
    };

    for _ in 0..25 {
        let outcome = usecase.execute(&command).expect("execute");
        assert!(matches!(outcome, SubmitReviewOutcome::Success { .. }));
    }
    assert_eq!(store.attempt_count(), 25);
}

#[test]
fn reviewing_a_missing_question_is_reported() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let usecase = submit_review(&store, &clock);

    let outcome = usecase
        .execute(&SubmitReviewCommand {
            user_id: UserId::from("learner"),
            question_id: QuestionId(999),
            is_correct: true,
            selected_choice_ids: None,
        })
        .expect("execute");

    assert!(matches!(
        outcome,
        SubmitReviewOutcome::QuestionNotFound {
            question_id: QuestionId(999)
        }
    ));
}

// ============================================================================
// BOOTSTRAP
// ============================================================================

#[test]
fn bootstrap_creates_profile_and_usage_idempotently() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let usecase = bootstrap(&store, &clock);
    let command = BootstrapCommand::for_user("learner");

    let BootstrapOutcome::Success { profile, usage, .. } =
        usecase.execute(&command).expect("execute");
    assert_eq!(profile.user_id, UserId::from("learner"));
    assert!(!profile.premium);
    assert_eq!(usage.reviews_used, 0);
    assert_eq!(usage.remaining(), 20);

    // Second call sees the same rows, it does not reset anything
    let BootstrapOutcome::Success { usage, .. } = usecase.execute(&command).expect("execute");
    assert_eq!(usage.reviews_used, 0);
}

#[test]
fn bootstrap_dashboard_counts_goals_questions_and_mastery() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();

    // One owned private goal, one foreign public goal
    let own_goal = seed_goal(&store, "learner", false);
    let public_goal = seed_goal(&store, "owner", true);
    seed_questions(&store, own_goal, 3);
    let public_questions = seed_questions(&store, public_goal, 5);

    // Master one public question, leave it far from due
    let user = UserId::from("learner");
    let submit = submit_review(&store, &clock);
    for _ in 0..3 {
        submit
            .execute(&SubmitReviewCommand {
                user_id: user.clone(),
                question_id: public_questions[0].id,
                is_correct: true,
                selected_choice_ids: None,
            })
            .expect("execute");
    }

    let BootstrapOutcome::Success { dashboard, .. } = bootstrap(&store, &clock)
        .execute(&BootstrapCommand::for_user("learner"))
        .expect("execute");

    assert_eq!(dashboard.goals_count, 2);
    assert_eq!(dashboard.total_questions, 8);
    assert_eq!(dashboard.mastered_count, 1);
    // Last interval is 30 days out, nothing is due yet
    assert_eq!(dashboard.due_count, 0);
}

#[test]
fn bootstrap_counts_an_owned_public_goal_once() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let goal_id = seed_goal(&store, "learner", true);
    seed_questions(&store, goal_id, 4);

    let BootstrapOutcome::Success { dashboard, .. } = bootstrap(&store, &clock)
        .execute(&BootstrapCommand::for_user("learner"))
        .expect("execute");

    assert_eq!(dashboard.goals_count, 1);
    assert_eq!(dashboard.total_questions, 4);
}
