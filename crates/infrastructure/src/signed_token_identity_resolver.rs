//! Identity resolution from HMAC signed bearer tokens.
//!
//! A token reads `{identity_id}.{tier}.{signature}` where the signature is the
//! hex HMAC-SHA256 of `{identity_id}.{tier}` keyed with the shared secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tollgate_application::IdentityResolver;
use tollgate_core::{AppError, AppResult};
use tollgate_domain::{RequestContext, ResolvedIdentity, Tier};
use tracing::debug;

/// Resolves caller tiers from signed bearer tokens.
///
/// Missing, malformed or forged tokens resolve to anonymous. Resolution has
/// no side effects, so calling it repeatedly for one request is safe.
#[derive(Clone)]
pub struct SignedTokenIdentityResolver {
    keyed_mac: Hmac<Sha256>,
}

impl SignedTokenIdentityResolver {
    /// Creates a resolver verifying tokens with `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> AppResult<Self> {
        let keyed_mac = Hmac::<Sha256>::new_from_slice(secret.as_ref()).map_err(|error| {
            AppError::PolicyConfiguration(format!("invalid identity token secret: {error}"))
        })?;

        Ok(Self { keyed_mac })
    }

    /// Issues a token for an identity and tier.
    #[must_use]
    pub fn issue(&self, identity_id: &str, tier: Tier) -> String {
        let claims = format!("{identity_id}.{tier}");
        let signature = self.sign(&claims);
        format!("{claims}.{signature}")
    }

    fn sign(&self, claims: &str) -> String {
        hex::encode(self.mac(claims).finalize().into_bytes())
    }

    fn mac(&self, claims: &str) -> Hmac<Sha256> {
        let mut mac = self.keyed_mac.clone();
        mac.update(claims.as_bytes());
        mac
    }

    fn verify(&self, token: &str) -> Option<ResolvedIdentity> {
        let (claims, signature) = token.rsplit_once('.')?;
        let (identity_id, tier) = claims.rsplit_once('.')?;
        let tier = tier.parse::<Tier>().ok()?;

        let signature = hex::decode(signature).ok()?;
        if self.mac(claims).verify_slice(&signature).is_err() {
            debug!(identity_id = %identity_id, "rejected token with invalid signature");
            return None;
        }

        Some(ResolvedIdentity::verified(tier, identity_id))
    }
}

impl IdentityResolver for SignedTokenIdentityResolver {
    fn resolve(&self, request: &RequestContext) -> ResolvedIdentity {
        request
            .credential()
            .and_then(|token| self.verify(token))
            .unwrap_or_else(ResolvedIdentity::anonymous)
    }
}

#[cfg(test)]
mod tests;
