//! crates/mindload_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    EnforcementResult, Flashcard, GenerationDepth, GenerationRequest, QuizQuestion, StudySet,
};
use crate::quota::UserEconomy;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// Each adapter translates its own failures into one of these kinds at its boundary.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Per-account credit balance. Implementations must make `use_credits_for_generation`
/// atomic per account; the orchestrator does not serialize concurrent charges.
#[async_trait]
pub trait QuotaLedger: Send + Sync {
    /// Checks whether the request fits the account's limits. No side effect.
    async fn can_generate_content(
        &self,
        user_id: Uuid,
        request: &GenerationRequest,
    ) -> PortResult<EnforcementResult>;

    /// Deducts the request's cost. Returns `false` if the balance no longer allows it.
    async fn use_credits_for_generation(
        &self,
        user_id: Uuid,
        request: &GenerationRequest,
    ) -> PortResult<bool>;

    async fn user_economy(&self, user_id: Uuid) -> PortResult<UserEconomy>;
}

/// Where the text of a new study set comes from.
#[derive(Debug, Clone)]
pub enum IngestSource {
    Text(String),
    Document { file_name: String, bytes: Vec<u8> },
    YouTube { video_id: String },
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Turns an ingest source into plain text.
    async fn extract_text(&self, source: IngestSource) -> PortResult<String>;
}

#[async_trait]
pub trait GenerationEngine: Send + Sync {
    async fn generate_flashcards_from_content(
        &self,
        text: &str,
        count: usize,
        depth: GenerationDepth,
    ) -> PortResult<Vec<Flashcard>>;

    async fn generate_quiz_questions_from_content(
        &self,
        text: &str,
        count: usize,
        depth: GenerationDepth,
    ) -> PortResult<Vec<QuizQuestion>>;
}

#[async_trait]
pub trait StudySetStore: Send + Sync {
    /// Inserts the set. Inserting an id that already exists is a no-op.
    async fn add_study_set(&self, study_set: &StudySet) -> PortResult<()>;

    /// Replaces the stored set with the same id.
    async fn update_study_set(&self, study_set: &StudySet) -> PortResult<()>;

    async fn get_study_set(&self, user_id: Uuid, study_set_id: Uuid) -> PortResult<StudySet>;

    async fn list_study_sets(&self, user_id: Uuid) -> PortResult<Vec<StudySet>>;

    async fn delete_study_set(&self, user_id: Uuid, study_set_id: Uuid) -> PortResult<()>;
}

/// Best-effort progress tracking. Callers never await these on the critical path
/// and ignore their failures.
#[async_trait]
pub trait AchievementTracker: Send + Sync {
    async fn track_study_set_created(&self, user_id: Uuid) -> PortResult<()>;

    async fn track_cards_created(&self, user_id: Uuid, count: usize) -> PortResult<()>;
}

/// Represents a user account.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user of a live (unexpired) auth session.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}
