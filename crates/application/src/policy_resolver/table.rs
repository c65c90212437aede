use serde::Serialize;
use tollgate_core::{AppError, AppResult};
use tollgate_domain::{EndpointCategory, Tier};

use crate::policy::CountingMode;

/// Per-tier request limits for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierLimits {
    /// Limit for anonymous callers.
    pub anonymous: u32,
    /// Limit for authenticated callers.
    pub authenticated: u32,
    /// Limit for premium callers.
    pub premium: u32,
}

impl TierLimits {
    /// Same limit for every tier.
    #[must_use]
    pub fn flat(limit: u32) -> Self {
        Self {
            anonymous: limit,
            authenticated: limit,
            premium: limit,
        }
    }

    /// Returns the limit for one tier.
    #[must_use]
    pub fn for_tier(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Anonymous => self.anonymous,
            Tier::Authenticated => self.authenticated,
            Tier::Premium => self.premium,
        }
    }
}

/// Window, tier limits and counting mode for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryLimits {
    /// Fixed window length in seconds.
    pub window_seconds: u64,
    /// Tier limits.
    pub tiers: TierLimits,
    /// Counting mode.
    pub counting_mode: CountingMode,
}

/// Dumpable table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRow {
    /// Endpoint category.
    pub category: EndpointCategory,
    /// Window length in seconds.
    pub window_seconds: u64,
    /// Limit for anonymous callers.
    pub anonymous: u32,
    /// Limit for authenticated callers.
    pub authenticated: u32,
    /// Limit for premium callers.
    pub premium: u32,
    /// Counting mode.
    pub counting_mode: CountingMode,
}

/// Limit table for all endpoint categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    search: CategoryLimits,
    detail_read: CategoryLimits,
    write_action: CategoryLimits,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            search: CategoryLimits {
                window_seconds: 15 * 60,
                tiers: TierLimits {
                    anonymous: 100,
                    authenticated: 200,
                    premium: 500,
                },
                counting_mode: CountingMode::Always,
            },
            detail_read: CategoryLimits {
                window_seconds: 15 * 60,
                tiers: TierLimits {
                    anonymous: 500,
                    authenticated: 1000,
                    premium: 2000,
                },
                counting_mode: CountingMode::Always,
            },
            write_action: CategoryLimits {
                window_seconds: 5 * 60,
                tiers: TierLimits::flat(50),
                counting_mode: CountingMode::SkipOnFailure,
            },
        }
    }
}

impl PolicyTable {
    /// Replaces the limits for one category.
    #[must_use]
    pub fn with_category(mut self, category: EndpointCategory, limits: CategoryLimits) -> Self {
        match category {
            EndpointCategory::Search => self.search = limits,
            EndpointCategory::DetailRead => self.detail_read = limits,
            EndpointCategory::WriteAction => self.write_action = limits,
        }
        self
    }

    /// Returns the limits for one category.
    #[must_use]
    pub fn limits_for(&self, category: EndpointCategory) -> CategoryLimits {
        match category {
            EndpointCategory::Search => self.search,
            EndpointCategory::DetailRead => self.detail_read,
            EndpointCategory::WriteAction => self.write_action,
        }
    }

    /// Checks positive windows and limits, and that limits never shrink as
    /// the tier rises.
    pub fn validate(&self) -> AppResult<()> {
        for category in EndpointCategory::ALL {
            let limits = self.limits_for(category);
            if limits.window_seconds == 0 {
                return Err(AppError::Validation(format!(
                    "{category} window must be greater than zero"
                )));
            }

            let tiers = limits.tiers;
            if tiers.anonymous == 0 {
                return Err(AppError::Validation(format!(
                    "{category} limits must be greater than zero"
                )));
            }

            if tiers.authenticated < tiers.anonymous || tiers.premium < tiers.authenticated {
                return Err(AppError::Validation(format!(
                    "{category} limits must satisfy premium >= authenticated >= anonymous"
                )));
            }
        }

        Ok(())
    }

    /// Returns the table as dumpable rows.
    #[must_use]
    pub fn rows(&self) -> Vec<PolicyRow> {
        EndpointCategory::ALL
            .into_iter()
            .map(|category| {
                let limits = self.limits_for(category);
                PolicyRow {
                    category,
                    window_seconds: limits.window_seconds,
                    anonymous: limits.tiers.anonymous,
                    authenticated: limits.tiers.authenticated,
                    premium: limits.tiers.premium,
                    counting_mode: limits.counting_mode,
                }
            })
            .collect()
    }
}
