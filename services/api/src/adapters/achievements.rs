//! services/api/src/adapters/achievements.rs
//!
//! Keeps per-user creation counters in PostgreSQL for the achievements screen.

use async_trait::async_trait;
use mindload_core::ports::{AchievementTracker, PortError, PortResult};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgAchievementTracker {
    pool: PgPool,
}

impl PgAchievementTracker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn bump(&self, user_id: Uuid, sets: i32, cards: i64) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_achievements (user_id, study_sets_created, cards_created) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                study_sets_created = user_achievements.study_sets_created + EXCLUDED.study_sets_created, \
                cards_created = user_achievements.cards_created + EXCLUDED.cards_created, \
                updated_at = NOW()",
        )
        .bind(user_id)
        .bind(sets)
        .bind(cards)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AchievementTracker for PgAchievementTracker {
    async fn track_study_set_created(&self, user_id: Uuid) -> PortResult<()> {
        self.bump(user_id, 1, 0).await
    }

    async fn track_cards_created(&self, user_id: Uuid, count: usize) -> PortResult<()> {
        self.bump(user_id, 0, i64::try_from(count).unwrap_or(i64::MAX)).await
    }
}
