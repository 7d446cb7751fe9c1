pub mod domain;
pub mod library;
pub mod orchestrator;
pub mod ports;
pub mod quota;

pub use domain::{
    EnforcementResult, Flashcard, GenerationDepth, GenerationRequest, OutputShape, Quiz,
    QuizQuestion, QuizResult, QuizType, StudySet,
};
pub use library::StudySetLibrary;
pub use orchestrator::{GenerationError, GenerationOrchestrator, ProcessOutcome, DEGRADED_NOTICE};
pub use ports::{
    AchievementTracker, ContentExtractor, GenerationEngine, IngestSource, PortError, PortResult,
    QuotaLedger, StudySetStore, User, UserCredentials, UserDirectory,
};
pub use quota::{credit_cost, Tier, UserEconomy};
