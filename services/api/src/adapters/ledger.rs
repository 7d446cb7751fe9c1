//! services/api/src/adapters/ledger.rs
//!
//! A PostgreSQL-backed implementation of the `QuotaLedger` port. Tier policy lives in
//! the core crate; this adapter only loads usage rows and applies charges atomically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mindload_core::domain::{EnforcementResult, GenerationRequest};
use mindload_core::ports::{PortError, PortResult, QuotaLedger};
use mindload_core::quota::{credit_cost, Tier, UserEconomy};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgQuotaLedger {
    pool: PgPool,
}

impl PgQuotaLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reads the account's usage row without writing. An account with no row yet is a
    /// fresh free-tier account.
    async fn read_economy(&self, user_id: Uuid) -> PortResult<UserEconomy> {
        let record = sqlx::query_as::<_, EconomyRecord>(
            "SELECT user_id, tier, credits_used, period_start FROM user_economy WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        economy_or_fresh(user_id, record, Utc::now())
    }

    /// Loads the account's usage row, creating a free-tier row on first use.
    async fn load_economy(&self, user_id: Uuid) -> PortResult<UserEconomy> {
        sqlx::query("INSERT INTO user_economy (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let record = sqlx::query_as::<_, EconomyRecord>(
            "SELECT user_id, tier, credits_used, period_start FROM user_economy WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Economy for user {} not found", user_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        record.to_domain()
    }
}

fn economy_or_fresh(
    user_id: Uuid,
    record: Option<EconomyRecord>,
    now: DateTime<Utc>,
) -> PortResult<UserEconomy> {
    match record {
        Some(record) => record.to_domain(),
        None => Ok(UserEconomy::new(user_id, Tier::Free, now)),
    }
}

#[derive(FromRow)]
struct EconomyRecord {
    user_id: Uuid,
    tier: String,
    credits_used: i32,
    period_start: DateTime<Utc>,
}

impl EconomyRecord {
    fn to_domain(self) -> PortResult<UserEconomy> {
        let tier = self.tier.parse::<Tier>().map_err(PortError::Unexpected)?;
        Ok(UserEconomy {
            user_id: self.user_id,
            tier,
            credits_used: u32::try_from(self.credits_used).unwrap_or(0),
            period_start: self.period_start,
        })
    }
}

#[async_trait]
impl QuotaLedger for PgQuotaLedger {
    async fn can_generate_content(
        &self,
        user_id: Uuid,
        request: &GenerationRequest,
    ) -> PortResult<EnforcementResult> {
        let economy = self.read_economy(user_id).await?;
        Ok(economy.enforce(request, Utc::now()))
    }

    async fn use_credits_for_generation(
        &self,
        user_id: Uuid,
        request: &GenerationRequest,
    ) -> PortResult<bool> {
        let economy = self.load_economy(user_id).await?;
        let cost = i32::try_from(credit_cost(request.char_count)).unwrap_or(i32::MAX);
        let quota = i32::try_from(economy.monthly_quota()).unwrap_or(i32::MAX);

        // One conditional statement per charge: a period that has ended restarts at zero,
        // and the row only changes if the charge still fits the quota.
        let result = sqlx::query(
            "UPDATE user_economy SET \
                credits_used = CASE WHEN period_start + INTERVAL '1 month' <= NOW() \
                    THEN $2 ELSE credits_used + $2 END, \
                period_start = CASE WHEN period_start + INTERVAL '1 month' <= NOW() \
                    THEN NOW() ELSE period_start END \
             WHERE user_id = $1 \
               AND (CASE WHEN period_start + INTERVAL '1 month' <= NOW() \
                    THEN 0 ELSE credits_used END) + $2 <= $3",
        )
        .bind(user_id)
        .bind(cost)
        .bind(quota)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let charged = result.rows_affected() == 1;
        if charged {
            info!("Charged {} credit(s) to user {}", cost, user_id);
        }
        Ok(charged)
    }

    async fn user_economy(&self, user_id: Uuid) -> PortResult<UserEconomy> {
        let economy = self.read_economy(user_id).await?;
        Ok(economy.rolled_over(Utc::now()))
    }
}
