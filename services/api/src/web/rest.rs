//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the study-set REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{auth, state::AppState};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use mindload_core::{
    domain::{Flashcard, Quiz, QuizQuestion, StudySet},
    ports::{IngestSource, PortError},
    quota::UserEconomy,
    GenerationError, ProcessOutcome,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

type HandlerError = (StatusCode, String);

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        create_study_set_handler,
        upload_study_set_handler,
        youtube_study_set_handler,
        list_study_sets_handler,
        get_study_set_handler,
        update_study_set_handler,
        delete_study_set_handler,
        refresh_study_set_handler,
        economy_handler,
    ),
    components(
        schemas(
            auth::CredentialsRequest,
            auth::AuthResponse,
            CreateStudySetRequest,
            YouTubeStudySetRequest,
            UpdateStudySetRequest,
            ProcessResponse,
            StudySetResponse,
            FlashcardResponse,
            QuizResponse,
            QuizQuestionResponse,
            EconomyResponse,
        )
    ),
    tags(
        (name = "Mindload API", description = "Study-set generation backed by a credit quota.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateStudySetRequest {
    pub title: String,
    pub content: String,
    pub flashcard_count: usize,
    pub quiz_count: usize,
}

#[derive(Deserialize, ToSchema)]
pub struct YouTubeStudySetRequest {
    pub video_id: String,
    pub title: String,
    pub flashcard_count: usize,
    pub quiz_count: usize,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStudySetRequest {
    pub title: Option<String>,
    pub notifications_enabled: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct FlashcardResponse {
    id: Uuid,
    front: String,
    back: String,
}

#[derive(Serialize, ToSchema)]
pub struct QuizQuestionResponse {
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    explanation: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct QuizResponse {
    id: Uuid,
    title: String,
    quiz_type: String,
    questions: Vec<QuizQuestionResponse>,
    attempts: usize,
    created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct StudySetResponse {
    id: Uuid,
    title: String,
    content: String,
    flashcards: Vec<FlashcardResponse>,
    quizzes: Vec<QuizResponse>,
    created_at: DateTime<Utc>,
    last_studied_at: DateTime<Utc>,
    notifications_enabled: bool,
}

/// Sent after a study set was created. `notice` is set when AI generation was
/// unavailable and the set holds only the source content.
#[derive(Serialize, ToSchema)]
pub struct ProcessResponse {
    study_set: StudySetResponse,
    notice: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EconomyResponse {
    tier: String,
    credits_used: u32,
    monthly_quota: u32,
    remaining_credits: u32,
    resets_at: DateTime<Utc>,
}

impl From<&Flashcard> for FlashcardResponse {
    fn from(card: &Flashcard) -> Self {
        Self {
            id: card.id,
            front: card.front.clone(),
            back: card.back.clone(),
        }
    }
}

impl From<&QuizQuestion> for QuizQuestionResponse {
    fn from(q: &QuizQuestion) -> Self {
        Self {
            question: q.question.clone(),
            options: q.options.clone(),
            correct_answer: q.correct_answer,
            explanation: q.explanation.clone(),
        }
    }
}

impl From<&Quiz> for QuizResponse {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            quiz_type: quiz.quiz_type.as_str().to_string(),
            questions: quiz.questions.iter().map(QuizQuestionResponse::from).collect(),
            attempts: quiz.results.len(),
            created_at: quiz.created_at,
        }
    }
}

impl From<StudySet> for StudySetResponse {
    fn from(set: StudySet) -> Self {
        Self {
            id: set.id,
            flashcards: set.flashcards.iter().map(FlashcardResponse::from).collect(),
            quizzes: set.quizzes.iter().map(QuizResponse::from).collect(),
            title: set.title,
            content: set.content,
            created_at: set.created_at,
            last_studied_at: set.last_studied_at,
            notifications_enabled: set.notifications_enabled,
        }
    }
}

impl From<ProcessOutcome> for ProcessResponse {
    fn from(outcome: ProcessOutcome) -> Self {
        let notice = outcome.notice().map(str::to_string);
        Self {
            study_set: outcome.into_study_set().into(),
            notice,
        }
    }
}

impl From<UserEconomy> for EconomyResponse {
    fn from(economy: UserEconomy) -> Self {
        Self {
            tier: economy.tier.to_string(),
            credits_used: economy.credits_used,
            monthly_quota: economy.monthly_quota(),
            remaining_credits: economy.remaining_credits(),
            resets_at: economy.resets_at(),
        }
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps an orchestrator failure to the status and message shown to the user.
pub fn generation_error_response(err: GenerationError) -> HandlerError {
    let status = match &err {
        GenerationError::InvalidSelection | GenerationError::InvalidTitle => StatusCode::BAD_REQUEST,
        GenerationError::QuotaBlocked(_) => StatusCode::PAYMENT_REQUIRED,
        GenerationError::ChargeFailed => StatusCode::CONFLICT,
        GenerationError::NotFound(_) => StatusCode::NOT_FOUND,
        GenerationError::GenerationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        GenerationError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match err {
        GenerationError::PersistenceFailure(detail) => {
            error!("Persistence failure: {}", detail);
            "Failed to process content".to_string()
        }
        other => other.to_string(),
    };
    (status, message)
}

fn extraction_error_response(err: PortError) -> HandlerError {
    match err {
        PortError::Unsupported(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        PortError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        other => {
            error!("Content extraction failed: {:?}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read content".to_string(),
            )
        }
    }
}

//=========================================================================================
// Shared Ingest Flow
//=========================================================================================

/// Extracts text from `source`, rejects empty results, and runs the generation workflow.
async fn ingest(
    state: &AppState,
    user_id: Uuid,
    source: IngestSource,
    title: &str,
    flashcard_count: usize,
    quiz_count: usize,
) -> Result<(StatusCode, Json<ProcessResponse>), HandlerError> {
    let title = title.trim();
    if title.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "A title is required".to_string()));
    }

    let content = state
        .extractor
        .extract_text(source)
        .await
        .map_err(extraction_error_response)?;
    if content.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Please provide some content to study".to_string(),
        ));
    }

    let outcome = state
        .orchestrator
        .process_content(user_id, &content, title, quiz_count, flashcard_count)
        .await
        .map_err(generation_error_response)?;
    if let Some(notice) = outcome.notice() {
        warn!("Study set {} created without AI content: {}", outcome.study_set().id, notice);
    }

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a study set from pasted text.
#[utoipa::path(
    post,
    path = "/study-sets",
    request_body = CreateStudySetRequest,
    responses(
        (status = 201, description = "Study set created", body = ProcessResponse),
        (status = 400, description = "Empty content, missing title, or nothing selected"),
        (status = 402, description = "Quota exhausted"),
        (status = 409, description = "Credits could not be consumed"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_study_set_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateStudySetRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    ingest(
        &state,
        user_id,
        IngestSource::Text(req.content),
        &req.title,
        req.flashcard_count,
        req.quiz_count,
    )
    .await
}

/// Create a study set from an uploaded document.
///
/// Accepts multipart/form-data with a `file` part and `title`, `flashcard_count`
/// and `quiz_count` text parts. The title defaults to the file name.
#[utoipa::path(
    post,
    path = "/study-sets/upload",
    request_body(content_type = "multipart/form-data", description = "The document to study."),
    responses(
        (status = 201, description = "Study set created", body = ProcessResponse),
        (status = 400, description = "Bad request (e.g., missing file)"),
        (status = 402, description = "Quota exhausted"),
        (status = 422, description = "Unsupported document type"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_study_set_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let mut document: Option<(String, Vec<u8>)> = None;
    let mut title: Option<String> = None;
    let mut flashcard_count = 0;
    let mut quiz_count = 0;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("untitled.txt").to_string();
                let data = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file bytes: {}", e),
                    )
                })?;
                document = Some((file_name, data.to_vec()));
            }
            "title" => title = Some(read_text_field(field).await?),
            "flashcard_count" => flashcard_count = parse_count(&read_text_field(field).await?)?,
            "quiz_count" => quiz_count = parse_count(&read_text_field(field).await?)?,
            other => info!("Ignoring unknown multipart field '{}'", other),
        }
    }

    let (file_name, bytes) = document.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "Multipart form must include a file".to_string(),
        )
    })?;
    let title = title.unwrap_or_else(|| title_from_file_name(&file_name));

    ingest(
        &state,
        user_id,
        IngestSource::Document { file_name, bytes },
        &title,
        flashcard_count,
        quiz_count,
    )
    .await
}

/// Create a study set from a YouTube video's transcript.
#[utoipa::path(
    post,
    path = "/study-sets/youtube",
    request_body = YouTubeStudySetRequest,
    responses(
        (status = 201, description = "Study set created", body = ProcessResponse),
        (status = 402, description = "Quota exhausted"),
        (status = 422, description = "No transcript available")
    )
)]
pub async fn youtube_study_set_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<YouTubeStudySetRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    ingest(
        &state,
        user_id,
        IngestSource::YouTube {
            video_id: req.video_id,
        },
        &req.title,
        req.flashcard_count,
        req.quiz_count,
    )
    .await
}

/// List the caller's study sets, newest first.
#[utoipa::path(
    get,
    path = "/study-sets",
    responses((status = 200, description = "The caller's study sets", body = [StudySetResponse]))
)]
pub async fn list_study_sets_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let sets = state
        .library
        .list(user_id)
        .await
        .map_err(generation_error_response)?;
    let body: Vec<StudySetResponse> = sets.into_iter().map(StudySetResponse::from).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/study-sets/{id}",
    params(("id" = Uuid, Path, description = "Study set id")),
    responses(
        (status = 200, description = "The study set", body = StudySetResponse),
        (status = 404, description = "No such study set")
    )
)]
pub async fn get_study_set_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(study_set_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let set = state
        .library
        .get(user_id, study_set_id)
        .await
        .map_err(generation_error_response)?;
    Ok(Json(StudySetResponse::from(set)))
}

/// Rename a study set and/or toggle its study reminders.
#[utoipa::path(
    patch,
    path = "/study-sets/{id}",
    params(("id" = Uuid, Path, description = "Study set id")),
    request_body = UpdateStudySetRequest,
    responses(
        (status = 200, description = "Updated study set", body = StudySetResponse),
        (status = 400, description = "Blank title"),
        (status = 404, description = "No such study set")
    )
)]
pub async fn update_study_set_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(study_set_id): Path<Uuid>,
    Json(req): Json<UpdateStudySetRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let set = state
        .library
        .update(user_id, study_set_id, req.title.as_deref(), req.notifications_enabled)
        .await
        .map_err(generation_error_response)?;
    Ok(Json(StudySetResponse::from(set)))
}

#[utoipa::path(
    delete,
    path = "/study-sets/{id}",
    params(("id" = Uuid, Path, description = "Study set id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such study set")
    )
)]
pub async fn delete_study_set_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(study_set_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    state
        .library
        .delete(user_id, study_set_id)
        .await
        .map_err(generation_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Regenerate a study set's flashcards and quiz from its original content.
#[utoipa::path(
    post,
    path = "/study-sets/{id}/refresh",
    params(("id" = Uuid, Path, description = "Study set id")),
    responses(
        (status = 200, description = "Refreshed study set", body = StudySetResponse),
        (status = 402, description = "Quota exhausted"),
        (status = 404, description = "No such study set"),
        (status = 503, description = "Generation unavailable, set unchanged")
    )
)]
pub async fn refresh_study_set_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(study_set_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let set = state
        .orchestrator
        .refresh_study_set(user_id, study_set_id)
        .await
        .map_err(generation_error_response)?;
    Ok(Json(StudySetResponse::from(set)))
}

/// The caller's tier and credit balance.
#[utoipa::path(
    get,
    path = "/economy",
    responses((status = 200, description = "Credit balance", body = EconomyResponse))
)]
pub async fn economy_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let economy = state.ledger.user_economy(user_id).await.map_err(|e| {
        error!("Failed to load economy for user {}: {:?}", user_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load credits".to_string(),
        )
    })?;
    Ok(Json(EconomyResponse::from(economy)))
}

//=========================================================================================
// Multipart Helpers
//=========================================================================================

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, HandlerError> {
    field.text().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read form field: {}", e),
        )
    })
}

fn parse_count(raw: &str) -> Result<usize, HandlerError> {
    raw.trim().parse::<usize>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("'{}' is not a valid count", raw.trim()),
        )
    })
}

/// "Cell Biology.notes.md" -> "Cell Biology.notes"
fn title_from_file_name(file_name: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
        .trim();
    if stem.is_empty() {
        "Untitled".to_string()
    } else {
        stem.to_string()
    }
}
