//! crates/mindload_core/src/orchestrator.rs
//!
//! The credit-gated generation workflow shared by every ingest path.
//!
//! Each call is an independent run of:
//! quota check -> single charge -> concurrent generation -> persist (or persist a
//! fallback shell) -> best-effort achievement tracking. Nothing is carried between calls.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    Flashcard, GenerationDepth, GenerationRequest, OutputShape, Quiz, QuizQuestion, StudySet,
};
use crate::ports::{
    AchievementTracker, GenerationEngine, PortError, PortResult, QuotaLedger, StudySetStore,
};

/// Shown alongside a study set created without generated material.
pub const DEGRADED_NOTICE: &str = "AI generation unavailable, created working set";

const LEDGER_UNAVAILABLE: &str = "Unable to verify your credit balance";

//=========================================================================================
// Errors and Outcomes
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Please select at least one type of content to generate")]
    InvalidSelection,
    #[error("{0}")]
    QuotaBlocked(String),
    #[error("Failed to consume credits")]
    ChargeFailed,
    #[error("Failed to process content: {0}")]
    PersistenceFailure(String),
    #[error("Study set {0} not found")]
    NotFound(Uuid),
    #[error("AI generation unavailable, study set left unchanged")]
    GenerationUnavailable,
    #[error("Study set title must not be empty")]
    InvalidTitle,
}

impl GenerationError {
    pub(crate) fn from_store(study_set_id: Uuid, err: PortError) -> Self {
        match err {
            PortError::NotFound(_) => GenerationError::NotFound(study_set_id),
            other => GenerationError::PersistenceFailure(other.to_string()),
        }
    }
}

/// What a successful `process_content` call left in storage.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// The set holds real generated material.
    Generated(StudySet),
    /// Generation failed; the set holds only the source content.
    Degraded { study_set: StudySet, notice: String },
}

impl ProcessOutcome {
    pub fn study_set(&self) -> &StudySet {
        match self {
            ProcessOutcome::Generated(study_set) => study_set,
            ProcessOutcome::Degraded { study_set, .. } => study_set,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            ProcessOutcome::Generated(_) => None,
            ProcessOutcome::Degraded { notice, .. } => Some(notice.as_str()),
        }
    }

    pub fn into_study_set(self) -> StudySet {
        match self {
            ProcessOutcome::Generated(study_set) => study_set,
            ProcessOutcome::Degraded { study_set, .. } => study_set,
        }
    }
}

/// Engine results for one run, each half already clamped to its requested count.
struct GenerationRun {
    flashcards: PortResult<Vec<Flashcard>>,
    quiz_questions: PortResult<Vec<QuizQuestion>>,
}

impl GenerationRun {
    /// Keeps whatever succeeded. A failed half contributes nothing.
    fn salvage(self) -> GeneratedMaterial {
        GeneratedMaterial {
            flashcards: self.flashcards.unwrap_or_else(|e| {
                warn!("Flashcard generation failed: {:?}", e);
                Vec::new()
            }),
            quiz_questions: self.quiz_questions.unwrap_or_else(|e| {
                warn!("Quiz generation failed: {:?}", e);
                Vec::new()
            }),
        }
    }

    /// All-or-nothing: any failed half fails the whole run.
    fn complete(self) -> PortResult<GeneratedMaterial> {
        Ok(GeneratedMaterial {
            flashcards: self.flashcards?,
            quiz_questions: self.quiz_questions?,
        })
    }
}

struct GeneratedMaterial {
    flashcards: Vec<Flashcard>,
    quiz_questions: Vec<QuizQuestion>,
}

impl GeneratedMaterial {
    fn is_empty(&self) -> bool {
        self.flashcards.is_empty() && self.quiz_questions.is_empty()
    }
}

//=========================================================================================
// The Orchestrator
//=========================================================================================

#[derive(Clone)]
pub struct GenerationOrchestrator {
    ledger: Arc<dyn QuotaLedger>,
    engine: Arc<dyn GenerationEngine>,
    store: Arc<dyn StudySetStore>,
    achievements: Arc<dyn AchievementTracker>,
    depth: GenerationDepth,
}

impl GenerationOrchestrator {
    pub fn new(
        ledger: Arc<dyn QuotaLedger>,
        engine: Arc<dyn GenerationEngine>,
        store: Arc<dyn StudySetStore>,
        achievements: Arc<dyn AchievementTracker>,
    ) -> Self {
        Self {
            ledger,
            engine,
            store,
            achievements,
            depth: GenerationDepth::default(),
        }
    }

    pub fn with_depth(mut self, depth: GenerationDepth) -> Self {
        self.depth = depth;
        self
    }

    /// Creates a study set from `content`, charging the caller's ledger exactly once.
    ///
    /// `content` must be non-empty; callers reject empty input before getting here.
    pub async fn process_content(
        &self,
        user_id: Uuid,
        content: &str,
        title: &str,
        quiz_count: usize,
        flashcard_count: usize,
    ) -> Result<ProcessOutcome, GenerationError> {
        let shape = OutputShape::classify(flashcard_count, quiz_count)
            .ok_or(GenerationError::InvalidSelection)?;
        info!(
            "Processing content for user {}: {} chars, shape={}",
            user_id,
            content.chars().count(),
            shape.as_str()
        );

        let request = GenerationRequest::new(content);
        self.check_and_charge(user_id, &request).await?;

        let material = self
            .generate(content, flashcard_count, quiz_count)
            .await
            .salvage();

        if material.is_empty() {
            warn!("Generation produced nothing for user {}, saving fallback set", user_id);
            let study_set = StudySet::new(user_id, title, content, Vec::new(), None);
            self.store.add_study_set(&study_set).await.map_err(|e| {
                error!("Failed to store fallback study set {}: {:?}", study_set.id, e);
                GenerationError::PersistenceFailure(e.to_string())
            })?;
            return Ok(ProcessOutcome::Degraded {
                study_set,
                notice: DEGRADED_NOTICE.to_string(),
            });
        }

        let card_count = material.flashcards.len();
        let quiz = Quiz::from_questions(title, material.quiz_questions);
        let study_set = StudySet::new(user_id, title, content, material.flashcards, quiz);
        self.store.add_study_set(&study_set).await.map_err(|e| {
            error!("Failed to store study set {}: {:?}", study_set.id, e);
            GenerationError::PersistenceFailure(e.to_string())
        })?;
        info!(
            "Created study set {} with {} flashcards and {} questions",
            study_set.id,
            card_count,
            study_set.question_count()
        );

        self.track_creation(user_id, card_count);
        Ok(ProcessOutcome::Generated(study_set))
    }

    /// Regenerates an existing set's material from its original content.
    ///
    /// Counts come from the account tier. If either generation call fails, or both come
    /// back empty, the stored set is left exactly as it was.
    pub async fn refresh_study_set(
        &self,
        user_id: Uuid,
        study_set_id: Uuid,
    ) -> Result<StudySet, GenerationError> {
        let existing = self
            .store
            .get_study_set(user_id, study_set_id)
            .await
            .map_err(|e| GenerationError::from_store(study_set_id, e))?;

        let economy = self.ledger.user_economy(user_id).await.map_err(|e| {
            error!("Failed to load economy for user {}: {:?}", user_id, e);
            GenerationError::QuotaBlocked(LEDGER_UNAVAILABLE.to_string())
        })?;
        let (flashcard_count, quiz_count) = economy.tier.refresh_counts();

        let request = GenerationRequest::new(&existing.content);
        self.check_and_charge(user_id, &request).await?;

        let material = self
            .generate(&existing.content, flashcard_count, quiz_count)
            .await
            .complete()
            .map_err(|e| {
                warn!("Refresh of study set {} failed, keeping old content: {:?}", study_set_id, e);
                GenerationError::GenerationUnavailable
            })?;
        if material.is_empty() {
            warn!("Refresh of study set {} produced nothing, keeping old content", study_set_id);
            return Err(GenerationError::GenerationUnavailable);
        }

        let quiz = Quiz::from_questions(&existing.title, material.quiz_questions);
        let refreshed = existing.with_generated_content(material.flashcards, quiz);
        self.store
            .update_study_set(&refreshed)
            .await
            .map_err(|e| GenerationError::from_store(study_set_id, e))?;
        info!("Refreshed study set {}", study_set_id);

        Ok(refreshed)
    }

    /// One quota check followed by one charge attempt. A failed charge is never retried.
    async fn check_and_charge(
        &self,
        user_id: Uuid,
        request: &GenerationRequest,
    ) -> Result<(), GenerationError> {
        let enforcement = self
            .ledger
            .can_generate_content(user_id, request)
            .await
            .map_err(|e| {
                error!("Quota check failed for user {}: {:?}", user_id, e);
                GenerationError::QuotaBlocked(LEDGER_UNAVAILABLE.to_string())
            })?;
        if !enforcement.can_proceed {
            let reason = enforcement
                .block_reason
                .unwrap_or_else(|| "Generation limit reached".to_string());
            info!("Generation blocked for user {}: {}", user_id, reason);
            return Err(GenerationError::QuotaBlocked(reason));
        }

        match self.ledger.use_credits_for_generation(user_id, request).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!("Ledger refused charge for user {}", user_id);
                Err(GenerationError::ChargeFailed)
            }
            Err(e) => {
                error!("Charge failed for user {}: {:?}", user_id, e);
                Err(GenerationError::ChargeFailed)
            }
        }
    }

    /// Runs the requested generation calls concurrently and reports each half on its own.
    async fn generate(
        &self,
        content: &str,
        flashcard_count: usize,
        quiz_count: usize,
    ) -> GenerationRun {
        let flashcards = async {
            if flashcard_count > 0 {
                self.engine
                    .generate_flashcards_from_content(content, flashcard_count, self.depth)
                    .await
            } else {
                Ok(Vec::new())
            }
        };
        let questions = async {
            if quiz_count > 0 {
                self.engine
                    .generate_quiz_questions_from_content(content, quiz_count, self.depth)
                    .await
            } else {
                Ok(Vec::new())
            }
        };

        let (flashcards, questions) = futures::join!(flashcards, questions);

        GenerationRun {
            flashcards: flashcards.map(|mut cards| {
                cards.truncate(flashcard_count);
                cards
            }),
            quiz_questions: questions.map(|mut questions| {
                questions.truncate(quiz_count);
                questions
            }),
        }
    }

    /// Spawns achievement tracking. Failures are logged and dropped.
    fn track_creation(&self, user_id: Uuid, card_count: usize) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available, skipping achievement tracking");
            return;
        };
        let achievements = self.achievements.clone();
        handle.spawn(async move {
            if let Err(e) = achievements.track_study_set_created(user_id).await {
                warn!("Failed to track study set creation: {:?}", e);
            }
            if card_count > 0 {
                if let Err(e) = achievements.track_cards_created(user_id, card_count).await {
                    warn!("Failed to track created cards: {:?}", e);
                }
            }
        });
    }
}
