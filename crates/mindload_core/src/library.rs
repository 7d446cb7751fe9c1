//! crates/mindload_core/src/library.rs
//!
//! Everyday operations on a user's saved study sets. Each change builds a new
//! `StudySet` value and replaces the stored record with it.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::StudySet;
use crate::orchestrator::GenerationError;
use crate::ports::StudySetStore;

#[derive(Clone)]
pub struct StudySetLibrary {
    store: Arc<dyn StudySetStore>,
}

impl StudySetLibrary {
    pub fn new(store: Arc<dyn StudySetStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<StudySet>, GenerationError> {
        self.store
            .list_study_sets(user_id)
            .await
            .map_err(|e| GenerationError::PersistenceFailure(e.to_string()))
    }

    pub async fn get(&self, user_id: Uuid, study_set_id: Uuid) -> Result<StudySet, GenerationError> {
        self.store
            .get_study_set(user_id, study_set_id)
            .await
            .map_err(|e| GenerationError::from_store(study_set_id, e))
    }

    pub async fn rename(
        &self,
        user_id: Uuid,
        study_set_id: Uuid,
        title: &str,
    ) -> Result<StudySet, GenerationError> {
        self.update(user_id, study_set_id, Some(title), None).await
    }

    pub async fn set_notifications(
        &self,
        user_id: Uuid,
        study_set_id: Uuid,
        enabled: bool,
    ) -> Result<StudySet, GenerationError> {
        self.update(user_id, study_set_id, None, Some(enabled)).await
    }

    /// Applies a title and/or reminder change to one fetched set and writes it once.
    /// Nothing is stored when the title is blank or no change is given.
    pub async fn update(
        &self,
        user_id: Uuid,
        study_set_id: Uuid,
        title: Option<&str>,
        notifications_enabled: Option<bool>,
    ) -> Result<StudySet, GenerationError> {
        let title = title.map(str::trim);
        if title.is_some_and(str::is_empty) {
            return Err(GenerationError::InvalidTitle);
        }

        let mut study_set = self.get(user_id, study_set_id).await?;
        if title.is_none() && notifications_enabled.is_none() {
            return Ok(study_set);
        }
        if let Some(title) = title {
            study_set = study_set.renamed(title);
        }
        if let Some(enabled) = notifications_enabled {
            study_set = study_set.with_notifications(enabled);
        }
        self.replace(&study_set).await?;
        info!(
            "Updated study set {} (title: {:?}, notifications: {:?})",
            study_set_id, title, notifications_enabled
        );
        Ok(study_set)
    }

    pub async fn delete(&self, user_id: Uuid, study_set_id: Uuid) -> Result<(), GenerationError> {
        self.store
            .delete_study_set(user_id, study_set_id)
            .await
            .map_err(|e| GenerationError::from_store(study_set_id, e))?;
        info!("Deleted study set {}", study_set_id);
        Ok(())
    }

    async fn replace(&self, study_set: &StudySet) -> Result<(), GenerationError> {
        self.store
            .update_study_set(study_set)
            .await
            .map_err(|e| GenerationError::from_store(study_set.id, e))
    }
}
