//! Identity tiers used to select differentiated admission policies.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tollgate_core::AppError;

/// Caller classification used to pick policy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// No valid credential was presented.
    Anonymous,
    /// Signed-in user on the free plan.
    Authenticated,
    /// Signed-in user on a paid plan.
    Premium,
}

impl Tier {
    /// All tiers in ascending privilege order.
    pub const ALL: [Self; 3] = [Self::Anonymous, Self::Authenticated, Self::Premium];

    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated => "authenticated",
            Self::Premium => "premium",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "anonymous" => Ok(Self::Anonymous),
            "authenticated" => Ok(Self::Authenticated),
            "premium" => Ok(Self::Premium),
            other => Err(AppError::Validation(format!("unknown identity tier '{other}'"))),
        }
    }
}

/// Outcome of resolving the caller's credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    tier: Tier,
    identity_id: Option<String>,
}

impl ResolvedIdentity {
    /// Identity for callers without a usable credential.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            tier: Tier::Anonymous,
            identity_id: None,
        }
    }

    /// Identity for a verified caller.
    ///
    /// A blank identity id cannot namespace a counter, so it demotes the
    /// caller to anonymous.
    #[must_use]
    pub fn verified(tier: Tier, identity_id: impl Into<String>) -> Self {
        let identity_id = identity_id.into();
        if tier == Tier::Anonymous || identity_id.trim().is_empty() {
            return Self::anonymous();
        }

        Self {
            tier,
            identity_id: Some(identity_id),
        }
    }

    /// Returns the resolved tier.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Returns the identity id for authenticated and premium callers.
    #[must_use]
    pub fn identity_id(&self) -> Option<&str> {
        self.identity_id.as_deref()
    }
}
