//! Identity-tiered policy resolution per endpoint category.

use std::sync::Arc;

use ipnet::IpNet;
use tollgate_core::AppResult;
use tollgate_domain::{EndpointCategory, RequestContext, ResolvedIdentity, Tier};

use crate::admission_ports::IdentityResolver;
use crate::policy::Policy;

mod table;

pub use table::{CategoryLimits, PolicyRow, PolicyTable, TierLimits};

/// Builds per-request policies from the limit table and the caller's tier.
#[derive(Clone)]
pub struct TieredPolicyResolver {
    identity_resolver: Arc<dyn IdentityResolver>,
    table: Arc<PolicyTable>,
    bypass_networks: Arc<Vec<IpNet>>,
}

impl TieredPolicyResolver {
    /// Creates a resolver over a validated table.
    pub fn new(identity_resolver: Arc<dyn IdentityResolver>, table: PolicyTable) -> AppResult<Self> {
        table.validate()?;

        Ok(Self {
            identity_resolver,
            table: Arc::new(table),
            bypass_networks: Arc::new(Vec::new()),
        })
    }

    /// Exempts callers inside the given networks from limiting.
    #[must_use]
    pub fn with_bypass_networks(mut self, bypass_networks: Vec<IpNet>) -> Self {
        self.bypass_networks = Arc::new(bypass_networks);
        self
    }

    /// Resolves the policy for one request in one category.
    ///
    /// The returned limit and key functions resolve the caller's tier
    /// themselves. Tier resolution is pure, so both observe the same tier.
    #[must_use]
    pub fn resolve_policy(&self, request: &RequestContext, category: EndpointCategory) -> Policy {
        let limits = self.table.limits_for(category);
        let caller = self.identity_resolver.resolve(request);

        let limit_resolver = self.identity_resolver.clone();
        let key_resolver = self.identity_resolver.clone();
        let bypass_networks = self.bypass_networks.clone();

        Policy::new(
            limits.window_seconds.saturating_mul(1000),
            limits.tiers.anonymous,
        )
        .with_limit(move |request| {
            Ok(limits
                .tiers
                .for_tier(limit_resolver.resolve(request).tier()))
        })
        .with_key(move |request| {
            Ok(counter_scope(
                category,
                &key_resolver.resolve(request),
                request,
            ))
        })
        .with_skip(move |request| {
            request.client_ip().is_some_and(|address| {
                bypass_networks
                    .iter()
                    .any(|network| network.contains(&address))
            })
        })
        .with_counting_mode(limits.counting_mode)
        .with_caller_identity(caller.identity_id().map(str::to_owned))
    }

    /// Returns the active limit table for operational dumps.
    #[must_use]
    pub fn policy_table(&self) -> Vec<PolicyRow> {
        self.table.rows()
    }
}

/// `{category}:{tier}:{identifier}`; identity id for signed-in tiers, client
/// address for anonymous callers.
fn counter_scope(
    category: EndpointCategory,
    identity: &ResolvedIdentity,
    request: &RequestContext,
) -> String {
    let identifier = match (identity.tier(), identity.identity_id()) {
        (Tier::Anonymous, _) | (_, None) => request.client_address(),
        (_, Some(identity_id)) => identity_id,
    };

    format!("{}:{}:{identifier}", category.as_str(), identity.tier().as_str())
}
