//! crates/mindload_core/src/quota.rs
//!
//! The credit economy: subscription tiers, what a generation costs, and the
//! per-account usage record that quota ledgers enforce against.

use chrono::{DateTime, Months, Utc};
use uuid::Uuid;

use crate::domain::{EnforcementResult, GenerationRequest};

/// Characters covered by a single credit. Longer sources cost proportionally more.
pub const CHARS_PER_CREDIT: usize = 50_000;

/// Returns the number of credits a request of `char_count` characters consumes.
pub fn credit_cost(char_count: usize) -> u32 {
    let credits = char_count.div_ceil(CHARS_PER_CREDIT).max(1);
    u32::try_from(credits).unwrap_or(u32::MAX)
}

/// A subscription level governing monthly quota and feature limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Premium,
}

impl Tier {
    pub fn monthly_credits(&self) -> u32 {
        match self {
            Tier::Free => 20,
            Tier::Pro => 300,
            Tier::Premium => 1000,
        }
    }

    pub fn max_content_chars(&self) -> usize {
        match self {
            Tier::Free => 50_000,
            Tier::Pro => 250_000,
            Tier::Premium => 500_000,
        }
    }

    /// `(flashcards, quiz questions)` generated when a study set is refreshed.
    pub fn refresh_counts(&self) -> (usize, usize) {
        match self {
            Tier::Free => (10, 5),
            Tier::Pro => (25, 15),
            Tier::Premium => (50, 25),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Premium => "premium",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            "premium" => Ok(Tier::Premium),
            _ => Err(format!("Unknown tier: {}", s)),
        }
    }
}

/// Usage of one account within its current monthly period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEconomy {
    pub user_id: Uuid,
    pub tier: Tier,
    pub credits_used: u32,
    pub period_start: DateTime<Utc>,
}

impl UserEconomy {
    pub fn new(user_id: Uuid, tier: Tier, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            tier,
            credits_used: 0,
            period_start: now,
        }
    }

    pub fn monthly_quota(&self) -> u32 {
        self.tier.monthly_credits()
    }

    pub fn remaining_credits(&self) -> u32 {
        self.monthly_quota().saturating_sub(self.credits_used)
    }

    pub fn resets_at(&self) -> DateTime<Utc> {
        self.period_start
            .checked_add_months(Months::new(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns the record as it stands at `now`, starting a fresh period if the old one ended.
    pub fn rolled_over(&self, now: DateTime<Utc>) -> Self {
        if now < self.resets_at() {
            return self.clone();
        }
        Self {
            credits_used: 0,
            period_start: now,
            ..self.clone()
        }
    }

    /// Decides whether `request` may run. Has no side effect.
    pub fn enforce(&self, request: &GenerationRequest, now: DateTime<Utc>) -> EnforcementResult {
        let current = self.rolled_over(now);
        let max_chars = current.tier.max_content_chars();
        if request.char_count > max_chars {
            return EnforcementResult::blocked(format!(
                "Content exceeds the {} character limit for your tier",
                max_chars
            ));
        }
        if credit_cost(request.char_count) > current.remaining_credits() {
            return EnforcementResult::blocked("Monthly credit limit reached");
        }
        EnforcementResult::allowed()
    }
}
