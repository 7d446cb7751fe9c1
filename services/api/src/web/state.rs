//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use mindload_core::ports::{ContentExtractor, QuotaLedger, UserDirectory};
use mindload_core::{GenerationOrchestrator, StudySetLibrary};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserDirectory>,
    pub ledger: Arc<dyn QuotaLedger>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub orchestrator: GenerationOrchestrator,
    pub library: StudySetLibrary,
}
