//! SQLite Storage Implementation
//!
//! Implements every port over a single database file. Uses separate
//! reader/writer connections behind mutexes so all methods take `&self`
//! and the store can be shared as `Arc<SqliteStore>`.

use chrono::{DateTime, NaiveDate, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{
    Goal, GoalId, NewGoal, NewQuestion, Profile, Question, QuestionAttempt, QuestionDifficulty,
    QuestionId, QuestionType, ReviewState, UsageDaily, UserId,
};
use crate::usecase::{
    AttemptPort, GoalPort, ProfilePort, QuestionPort, ReviewStatePort, ReviewWritePort,
    UsageDailyPort,
};

use super::{Result, StoreError};

// ============================================================================
// STORE
// ============================================================================

/// SQLite-backed store implementing all persistence ports.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl SqliteStore {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Create a new store instance
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "mnemo", "core").ok_or_else(|| {
                    StoreError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join("mnemo.db")
            }
        };

        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
        })
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StoreError::Lock("writer connection".to_string()))
    }

    fn reader(&self) -> Result<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StoreError::Lock("reader connection".to_string()))
    }

    // ========================================================================
    // CONTENT CREATION
    // ========================================================================

    /// Create a goal, assigning its id
    pub fn create_goal(&self, input: &NewGoal) -> Result<Goal> {
        let now = Utc::now();
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO goals (user_id, title, description, is_public, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                input.user_id.as_str(),
                input.title,
                input.description,
                input.is_public,
                now,
            ],
        )?;
        let id = GoalId(writer.last_insert_rowid());

        Ok(Goal {
            id,
            user_id: input.user_id.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            is_public: input.is_public,
            created_at: now,
        })
    }

    /// Create a question, assigning its id
    pub fn create_question(&self, input: &NewQuestion) -> Result<Question> {
        let now = Utc::now();
        let choices_json = input
            .choices
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let tags_json = serde_json::to_string(&input.tags)?;

        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO questions
                 (goal_id, question_type, prompt, answer, choices, explanation,
                  difficulty, chapter, tags, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                input.goal_id.0,
                input.question_type.as_str(),
                input.prompt,
                input.answer,
                choices_json,
                input.explanation,
                input.difficulty.level(),
                input.chapter,
                tags_json,
                now,
            ],
        )?;
        let id = QuestionId(writer.last_insert_rowid());

        Ok(Question {
            id,
            goal_id: input.goal_id,
            question_type: input.question_type,
            prompt: input.prompt.clone(),
            answer: input.answer.clone(),
            choices: input.choices.clone(),
            explanation: input.explanation.clone(),
            difficulty: input.difficulty,
            chapter: input.chapter.clone(),
            tags: input.tags.clone(),
            created_at: now,
        })
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn map_goal(row: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: GoalId(row.get("id")?),
        user_id: UserId::from(row.get::<_, String>("user_id")?.as_str()),
        title: row.get("title")?,
        description: row.get("description")?,
        is_public: row.get("is_public")?,
        created_at: row.get("created_at")?,
    })
}

fn map_question(row: &Row<'_>) -> rusqlite::Result<Question> {
    let question_type = QuestionType::parse_name(&row.get::<_, String>("question_type")?);
    let difficulty = QuestionDifficulty::from_level(row.get("difficulty")?);
    let choices: Option<serde_json::Value> = row.get("choices")?;
    let tags: serde_json::Value = row.get("tags")?;

    Ok(Question {
        id: QuestionId(row.get("id")?),
        goal_id: GoalId(row.get("goal_id")?),
        question_type,
        prompt: row.get("prompt")?,
        answer: row.get("answer")?,
        choices: choices.and_then(|v| serde_json::from_value(v).ok()),
        explanation: row.get("explanation")?,
        difficulty,
        chapter: row.get("chapter")?,
        tags: serde_json::from_value(tags).unwrap_or_default(),
        created_at: row.get("created_at")?,
    })
}

fn map_attempt(row: &Row<'_>) -> rusqlite::Result<QuestionAttempt> {
    let id: String = row.get("id")?;
    let selected: Option<serde_json::Value> = row.get("selected_choice_ids")?;

    Ok(QuestionAttempt {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        question_id: QuestionId(row.get("question_id")?),
        user_id: UserId::from(row.get::<_, String>("user_id")?.as_str()),
        is_correct: row.get("is_correct")?,
        selected_choice_ids: selected.and_then(|v| serde_json::from_value(v).ok()),
        timestamp: row.get("timestamp")?,
    })
}

fn map_review_state(row: &Row<'_>) -> rusqlite::Result<ReviewState> {
    Ok(ReviewState {
        question_id: QuestionId(row.get("question_id")?),
        user_id: UserId::from(row.get::<_, String>("user_id")?.as_str()),
        mastery_level: crate::domain::MasteryLevel::parse_name(
            &row.get::<_, String>("mastery_level")?,
        ),
        success_count: row.get("success_count")?,
        fail_count: row.get("fail_count")?,
        last_reviewed_at: row.get("last_reviewed_at")?,
        next_review_at: row.get("next_review_at")?,
        optimal_interval_days: row.get("optimal_interval_days")?,
    })
}

// ============================================================================
// READ PORTS
// ============================================================================

impl QuestionPort for SqliteStore {
    fn find_by_id(&self, id: QuestionId) -> Result<Option<Question>> {
        let reader = self.reader()?;
        let question = reader
            .query_row(
                "SELECT * FROM questions WHERE id = ?1",
                params![id.0],
                map_question,
            )
            .optional()?;
        Ok(question)
    }

    fn find_by_goal(&self, goal_id: GoalId) -> Result<Vec<Question>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM questions WHERE goal_id = ?1 ORDER BY id")?;
        let questions = stmt
            .query_map(params![goal_id.0], map_question)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(questions)
    }
}

impl GoalPort for SqliteStore {
    fn find_by_id(&self, id: GoalId) -> Result<Option<Goal>> {
        let reader = self.reader()?;
        let goal = reader
            .query_row("SELECT * FROM goals WHERE id = ?1", params![id.0], map_goal)
            .optional()?;
        Ok(goal)
    }

    fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Goal>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM goals WHERE user_id = ?1 ORDER BY id")?;
        let goals = stmt
            .query_map(params![user_id.as_str()], map_goal)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(goals)
    }

    fn find_public(&self) -> Result<Vec<Goal>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM goals WHERE is_public = 1 ORDER BY id")?;
        let goals = stmt
            .query_map([], map_goal)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(goals)
    }

    fn exists(&self, id: GoalId) -> Result<bool> {
        let reader = self.reader()?;
        let count: i64 = reader.query_row(
            "SELECT COUNT(*) FROM goals WHERE id = ?1",
            params![id.0],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl AttemptPort for SqliteStore {
    fn find_by_user(&self, user_id: &UserId) -> Result<Vec<QuestionAttempt>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM question_attempts
             WHERE user_id = ?1
             ORDER BY timestamp DESC",
        )?;
        let attempts = stmt
            .query_map(params![user_id.as_str()], map_attempt)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(attempts)
    }

    fn find_by_user_and_question(
        &self,
        user_id: &UserId,
        question_id: QuestionId,
    ) -> Result<Vec<QuestionAttempt>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM question_attempts
             WHERE user_id = ?1 AND question_id = ?2
             ORDER BY timestamp DESC",
        )?;
        let attempts = stmt
            .query_map(params![user_id.as_str(), question_id.0], map_attempt)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(attempts)
    }

    fn find_by_user_and_goal(
        &self,
        user_id: &UserId,
        goal_id: GoalId,
    ) -> Result<Vec<QuestionAttempt>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT a.* FROM question_attempts a
             JOIN questions q ON q.id = a.question_id
             WHERE a.user_id = ?1 AND q.goal_id = ?2
             ORDER BY a.timestamp DESC",
        )?;
        let attempts = stmt
            .query_map(params![user_id.as_str(), goal_id.0], map_attempt)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(attempts)
    }
}

impl ReviewStatePort for SqliteStore {
    fn find_by_user_and_question(
        &self,
        user_id: &UserId,
        question_id: QuestionId,
    ) -> Result<Option<ReviewState>> {
        let reader = self.reader()?;
        let state = reader
            .query_row(
                "SELECT * FROM review_states WHERE user_id = ?1 AND question_id = ?2",
                params![user_id.as_str(), question_id.0],
                map_review_state,
            )
            .optional()?;
        Ok(state)
    }

    fn find_by_user(&self, user_id: &UserId) -> Result<Vec<ReviewState>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM review_states WHERE user_id = ?1")?;
        let states = stmt
            .query_map(params![user_id.as_str()], map_review_state)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(states)
    }

    fn find_due(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<Vec<ReviewState>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM review_states
             WHERE user_id = ?1 AND next_review_at <= ?2
             ORDER BY next_review_at",
        )?;
        let states = stmt
            .query_map(params![user_id.as_str(), now], map_review_state)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(states)
    }
}

impl ProfilePort for SqliteStore {
    fn find(&self, user_id: &UserId) -> Result<Option<Profile>> {
        let reader = self.reader()?;
        let profile = reader
            .query_row(
                "SELECT * FROM profiles WHERE user_id = ?1",
                params![user_id.as_str()],
                |row| {
                    Ok(Profile {
                        user_id: UserId::from(row.get::<_, String>("user_id")?.as_str()),
                        premium: row.get("premium")?,
                        created_at: row.get("created_at")?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    fn save(&self, profile: &Profile) -> Result<Profile> {
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO profiles (user_id, premium, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET premium = excluded.premium",
            params![
                profile.user_id.as_str(),
                profile.premium,
                profile.created_at,
            ],
        )?;
        Ok(profile.clone())
    }
}

impl UsageDailyPort for SqliteStore {
    fn find(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<UsageDaily>> {
        let reader = self.reader()?;
        let usage = reader
            .query_row(
                "SELECT * FROM usage_daily WHERE user_id = ?1 AND date = ?2",
                params![user_id.as_str(), date],
                |row| {
                    Ok(UsageDaily {
                        user_id: UserId::from(row.get::<_, String>("user_id")?.as_str()),
                        date: row.get("date")?,
                        reviews_count: row.get("reviews_count")?,
                    })
                },
            )
            .optional()?;
        Ok(usage)
    }

    fn save(&self, usage: &UsageDaily) -> Result<UsageDaily> {
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO usage_daily (user_id, date, reviews_count)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, date) DO UPDATE SET reviews_count = excluded.reviews_count",
            params![usage.user_id.as_str(), usage.date, usage.reviews_count],
        )?;
        Ok(usage.clone())
    }
}

// ============================================================================
// WRITE PORT
// ============================================================================

impl ReviewWritePort for SqliteStore {
    fn apply_review(
        &self,
        attempt: &QuestionAttempt,
        new_state: &ReviewState,
        date: NaiveDate,
    ) -> Result<UsageDaily> {
        let selected_json = attempt
            .selected_choice_ids
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut writer = self.writer()?;
        let tx = writer.transaction()?;

        tx.execute(
            "INSERT INTO question_attempts
                 (id, question_id, user_id, is_correct, selected_choice_ids, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                attempt.id.to_string(),
                attempt.question_id.0,
                attempt.user_id.as_str(),
                attempt.is_correct,
                selected_json,
                attempt.timestamp,
            ],
        )?;

        tx.execute(
            "INSERT INTO review_states
                 (user_id, question_id, mastery_level, success_count, fail_count,
                  last_reviewed_at, next_review_at, optimal_interval_days)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id, question_id) DO UPDATE SET
                 mastery_level = excluded.mastery_level,
                 success_count = excluded.success_count,
                 fail_count = excluded.fail_count,
                 last_reviewed_at = excluded.last_reviewed_at,
                 next_review_at = excluded.next_review_at,
                 optimal_interval_days = excluded.optimal_interval_days",
            params![
                new_state.user_id.as_str(),
                new_state.question_id.0,
                new_state.mastery_level.as_str(),
                new_state.success_count,
                new_state.fail_count,
                new_state.last_reviewed_at,
                new_state.next_review_at,
                new_state.optimal_interval_days,
            ],
        )?;

        tx.execute(
            "INSERT INTO usage_daily (user_id, date, reviews_count)
             VALUES (?1, ?2, 1)
             ON CONFLICT(user_id, date) DO UPDATE SET
                 reviews_count = reviews_count + 1",
            params![attempt.user_id.as_str(), date],
        )?;

        let usage = tx.query_row(
            "SELECT reviews_count FROM usage_daily WHERE user_id = ?1 AND date = ?2",
            params![attempt.user_id.as_str(), date],
            |row| row.get::<_, u32>(0),
        )?;

        tx.commit()?;

        Ok(UsageDaily {
            user_id: attempt.user_id.clone(),
            date,
            reviews_count: usage,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
