//! crates/mindload_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generation Inputs
//=========================================================================================

/// The value used to query and charge the quota ledger for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub content: String,
    pub char_count: usize,
}

impl GenerationRequest {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            char_count: content.chars().count(),
        }
    }
}

/// Outcome of a quota check. Produced by the ledger and consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcementResult {
    pub can_proceed: bool,
    pub block_reason: Option<String>,
}

impl EnforcementResult {
    pub fn allowed() -> Self {
        Self {
            can_proceed: true,
            block_reason: None,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            can_proceed: false,
            block_reason: Some(reason.into()),
        }
    }
}

/// Which kinds of study material a single request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    FlashcardsOnly,
    QuizOnly,
    Both,
}

impl OutputShape {
    /// Returns `None` when neither kind was requested.
    pub fn classify(flashcard_count: usize, quiz_count: usize) -> Option<Self> {
        match (flashcard_count > 0, quiz_count > 0) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::FlashcardsOnly),
            (false, true) => Some(Self::QuizOnly),
            (false, false) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashcardsOnly => "flashcards",
            Self::QuizOnly => "quiz",
            Self::Both => "flashcards_and_quiz",
        }
    }
}

/// How thoroughly the generation engine should work through the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationDepth {
    Quick,
    #[default]
    Standard,
    Deep,
}

impl std::str::FromStr for GenerationDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "standard" => Ok(Self::Standard),
            "deep" => Ok(Self::Deep),
            other => Err(format!("Unknown generation depth: {}", other)),
        }
    }
}

//=========================================================================================
// Study Material
//=========================================================================================

/// A front/back pair. Owned by exactly one `StudySet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    pub id: Uuid,
    pub front: String,
    pub back: String,
}

impl Flashcard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            front: front.into(),
            back: back.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl QuizType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::ShortAnswer => "short_answer",
        }
    }
}

impl std::str::FromStr for QuizType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(Self::MultipleChoice),
            "true_false" => Ok(Self::TrueFalse),
            "short_answer" => Ok(Self::ShortAnswer),
            other => Err(format!("Unknown quiz type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
    pub explanation: Option<String>,
}

/// One completed attempt at a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub quiz_type: QuizType,
    pub questions: Vec<QuizQuestion>,
    pub results: Vec<QuizResult>,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    /// Builds a multiple-choice quiz, or `None` if there are no questions to hold.
    pub fn from_questions(title: &str, questions: Vec<QuizQuestion>) -> Option<Self> {
        if questions.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            title: format!("{} Quiz", title),
            quiz_type: QuizType::MultipleChoice,
            questions,
            results: Vec::new(),
            created_at: Utc::now(),
        })
    }
}

/// The persisted bundle of source content plus the material derived from it.
///
/// The id never changes once assigned. Every later change produces a new value
/// through one of the `with_*`/`renamed` helpers, which then replaces the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub flashcards: Vec<Flashcard>,
    pub quizzes: Vec<Quiz>,
    pub created_at: DateTime<Utc>,
    pub last_studied_at: DateTime<Utc>,
    pub notifications_enabled: bool,
}

impl StudySet {
    pub fn new(
        user_id: Uuid,
        title: &str,
        content: &str,
        flashcards: Vec<Flashcard>,
        quiz: Option<Quiz>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            content: content.to_string(),
            flashcards,
            quizzes: quiz.into_iter().collect(),
            created_at: now,
            last_studied_at: now,
            notifications_enabled: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flashcards.is_empty() && self.quizzes.is_empty()
    }

    pub fn question_count(&self) -> usize {
        self.quizzes.iter().map(|q| q.questions.len()).sum()
    }

    pub fn renamed(&self, title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..self.clone()
        }
    }

    pub fn with_notifications(&self, enabled: bool) -> Self {
        Self {
            notifications_enabled: enabled,
            ..self.clone()
        }
    }

    /// Replaces the generated material, keeping identity and source content.
    pub fn with_generated_content(&self, flashcards: Vec<Flashcard>, quiz: Option<Quiz>) -> Self {
        Self {
            flashcards,
            quizzes: quiz.into_iter().collect(),
            last_studied_at: Utc::now(),
            ..self.clone()
        }
    }
}
