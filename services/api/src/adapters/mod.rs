pub mod achievements;
pub mod db;
pub mod extractor;
pub mod generation_llm;
pub mod ledger;

pub use achievements::PgAchievementTracker;
pub use db::DbAdapter;
pub use extractor::PlainTextExtractor;
pub use generation_llm::OpenAiGenerationAdapter;
pub use ledger::PgQuotaLedger;
