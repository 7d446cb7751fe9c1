//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! `StudySetStore` and `UserDirectory` ports from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mindload_core::domain::{Flashcard, Quiz, QuizQuestion, QuizResult, QuizType, StudySet};
use mindload_core::ports::{
    PortError, PortResult, StudySetStore, User, UserCredentials, UserDirectory,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage and user directory ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct FlashcardJson {
    id: Uuid,
    front: String,
    back: String,
}

#[derive(Serialize, Deserialize)]
struct QuizQuestionJson {
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct QuizResultJson {
    score: u32,
    total: u32,
    completed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct QuizJson {
    id: Uuid,
    title: String,
    quiz_type: String,
    questions: Vec<QuizQuestionJson>,
    #[serde(default)]
    results: Vec<QuizResultJson>,
    created_at: DateTime<Utc>,
}

impl From<&Flashcard> for FlashcardJson {
    fn from(card: &Flashcard) -> Self {
        Self {
            id: card.id,
            front: card.front.clone(),
            back: card.back.clone(),
        }
    }
}

impl From<&Quiz> for QuizJson {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            quiz_type: quiz.quiz_type.as_str().to_string(),
            questions: quiz
                .questions
                .iter()
                .map(|q| QuizQuestionJson {
                    question: q.question.clone(),
                    options: q.options.clone(),
                    correct_answer: q.correct_answer,
                    explanation: q.explanation.clone(),
                })
                .collect(),
            results: quiz
                .results
                .iter()
                .map(|r| QuizResultJson {
                    score: r.score,
                    total: r.total,
                    completed_at: r.completed_at,
                })
                .collect(),
            created_at: quiz.created_at,
        }
    }
}

impl QuizJson {
    fn to_domain(self) -> PortResult<Quiz> {
        let quiz_type = self
            .quiz_type
            .parse::<QuizType>()
            .map_err(PortError::Unexpected)?;
        Ok(Quiz {
            id: self.id,
            title: self.title,
            quiz_type,
            questions: self
                .questions
                .into_iter()
                .map(|q| QuizQuestion {
                    question: q.question,
                    options: q.options,
                    correct_answer: q.correct_answer,
                    explanation: q.explanation,
                })
                .collect(),
            results: self
                .results
                .into_iter()
                .map(|r| QuizResult {
                    score: r.score,
                    total: r.total,
                    completed_at: r.completed_at,
                })
                .collect(),
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct StudySetRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    flashcards: Json<Vec<FlashcardJson>>,
    quizzes: Json<Vec<QuizJson>>,
    created_at: DateTime<Utc>,
    last_studied_at: DateTime<Utc>,
    notifications_enabled: bool,
}

impl StudySetRecord {
    fn to_domain(self) -> PortResult<StudySet> {
        let quizzes = self
            .quizzes
            .0
            .into_iter()
            .map(QuizJson::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok(StudySet {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            flashcards: self
                .flashcards
                .0
                .into_iter()
                .map(|c| Flashcard {
                    id: c.id,
                    front: c.front,
                    back: c.back,
                })
                .collect(),
            quizzes,
            created_at: self.created_at,
            last_studied_at: self.last_studied_at,
            notifications_enabled: self.notifications_enabled,
        })
    }
}

fn flashcards_json(set: &StudySet) -> Json<Vec<FlashcardJson>> {
    Json(set.flashcards.iter().map(FlashcardJson::from).collect())
}

fn quizzes_json(set: &StudySet) -> Json<Vec<QuizJson>> {
    Json(set.quizzes.iter().map(QuizJson::from).collect())
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}

const STUDY_SET_COLUMNS: &str = "id, user_id, title, content, flashcards, quizzes, \
     created_at, last_studied_at, notifications_enabled";

//=========================================================================================
// `StudySetStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl StudySetStore for DbAdapter {
    async fn add_study_set(&self, study_set: &StudySet) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO study_sets (id, user_id, title, content, flashcards, quizzes, \
             created_at, last_studied_at, notifications_enabled) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) ON CONFLICT (id) DO NOTHING",
        )
        .bind(study_set.id)
        .bind(study_set.user_id)
        .bind(&study_set.title)
        .bind(&study_set.content)
        .bind(flashcards_json(study_set))
        .bind(quizzes_json(study_set))
        .bind(study_set.created_at)
        .bind(study_set.last_studied_at)
        .bind(study_set.notifications_enabled)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn update_study_set(&self, study_set: &StudySet) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE study_sets SET title = $3, content = $4, flashcards = $5, quizzes = $6, \
             last_studied_at = $7, notifications_enabled = $8 \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(study_set.id)
        .bind(study_set.user_id)
        .bind(&study_set.title)
        .bind(&study_set.content)
        .bind(flashcards_json(study_set))
        .bind(quizzes_json(study_set))
        .bind(study_set.last_studied_at)
        .bind(study_set.notifications_enabled)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Study set {} not found", study_set.id)));
        }
        Ok(())
    }

    async fn get_study_set(&self, user_id: Uuid, study_set_id: Uuid) -> PortResult<StudySet> {
        let record = sqlx::query_as::<_, StudySetRecord>(&format!(
            "SELECT {} FROM study_sets WHERE id = $1 AND user_id = $2",
            STUDY_SET_COLUMNS
        ))
        .bind(study_set_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Study set {} not found", study_set_id))
            }
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn list_study_sets(&self, user_id: Uuid) -> PortResult<Vec<StudySet>> {
        let records = sqlx::query_as::<_, StudySetRecord>(&format!(
            "SELECT {} FROM study_sets WHERE user_id = $1 ORDER BY created_at DESC",
            STUDY_SET_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn delete_study_set(&self, user_id: Uuid, study_set_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM study_sets WHERE id = $1 AND user_id = $2")
            .bind(study_set_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Study set {} not found", study_set_id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `UserDirectory` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserDirectory for DbAdapter {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email, hashed_password",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == UNIQUE_VIOLATION);
            if duplicate {
                PortError::InvalidInput(format!("Email {} is already registered", email))
            } else {
                unexpected(e)
            }
        })?;

        Ok(User {
            user_id: record.user_id,
            email: record.email,
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;

        Ok(UserCredentials {
            user_id: record.user_id,
            email: record.email,
            hashed_password: record.hashed_password,
        })
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_json_round_trips_to_domain() {
        let quiz = Quiz::from_questions(
            "Mitosis",
            vec![QuizQuestion {
                question: "How many daughter cells?".to_string(),
                options: vec!["1".to_string(), "2".to_string()],
                correct_answer: 1,
                explanation: Some("Mitosis yields two cells".to_string()),
            }],
        )
        .unwrap();

        let stored = serde_json::to_value(QuizJson::from(&quiz)).unwrap();
        assert_eq!(stored["quiz_type"], "multiple_choice");

        let restored = serde_json::from_value::<QuizJson>(stored)
            .unwrap()
            .to_domain()
            .unwrap();
        assert_eq!(restored, quiz);
    }

    #[test]
    fn unknown_quiz_type_is_rejected() {
        let raw = serde_json::json!({
            "id": Uuid::new_v4(),
            "title": "Legacy Quiz",
            "quiz_type": "matching",
            "questions": [],
            "created_at": "2026-01-15T09:00:00Z"
        });
        let json: QuizJson = serde_json::from_value(raw).unwrap();
        assert!(matches!(json.to_domain(), Err(PortError::Unexpected(_))));
    }
}
