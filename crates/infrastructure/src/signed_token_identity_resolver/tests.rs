use sha2::{Digest, Sha256};
use tollgate_application::IdentityResolver;
use tollgate_domain::{RequestContext, Tier};

use super::SignedTokenIdentityResolver;

fn resolver(secret: &str) -> SignedTokenIdentityResolver {
    SignedTokenIdentityResolver::new(secret).unwrap_or_else(|_| unreachable!())
}

fn request_with(credential: Option<String>) -> RequestContext {
    RequestContext::new("GET", "/api/properties/search", "203.0.113.7").with_credential(credential)
}

#[test]
fn issued_tokens_resolve_to_their_tier() {
    let resolver = resolver("test-secret");
    let token = resolver.issue("user-42", Tier::Premium);

    let identity = resolver.resolve(&request_with(Some(token)));

    assert_eq!(identity.tier(), Tier::Premium);
    assert_eq!(identity.identity_id(), Some("user-42"));
}

#[test]
fn forged_or_foreign_tokens_resolve_to_anonymous() {
    let foreign = resolver("other-secret").issue("user-42", Tier::Premium);
    let resolver = resolver("test-secret");
    let upgraded = resolver
        .issue("user-42", Tier::Authenticated)
        .replacen("authenticated", "premium", 1);

    for token in [
        foreign,
        upgraded,
        "user-42.premium".to_owned(),
        "garbage".to_owned(),
    ] {
        let identity = resolver.resolve(&request_with(Some(token)));
        assert_eq!(identity.tier(), Tier::Anonymous);
        assert_eq!(identity.identity_id(), None);
    }
}

#[test]
fn missing_credential_is_anonymous_and_resolution_is_repeatable() {
    let resolver = resolver("test-secret");
    let token = resolver.issue("user-7", Tier::Authenticated);
    let request = request_with(Some(token));

    assert_eq!(resolver.resolve(&request), resolver.resolve(&request));
    assert_eq!(resolver.resolve(&request_with(None)).tier(), Tier::Anonymous);
}

#[test]
fn signatures_are_hmac_sha256() {
    // RFC 4231 test case 2.
    let signature = resolver("Jefe").sign("what do ya want for nothing?");

    assert_eq!(
        signature,
        "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
    );
}

#[test]
fn secret_prefixed_digests_and_non_hex_signatures_are_rejected() {
    let resolver = resolver("test-secret");
    let claims = "user-42.premium";
    let mut hasher = Sha256::new();
    hasher.update(b"test-secret:");
    hasher.update(claims.as_bytes());
    let prefixed = format!("{claims}.{}", hex::encode(hasher.finalize()));
    let issued = resolver.issue("user-42", Tier::Premium);
    let non_hex = format!("{claims}.{}", "zz".repeat(32));
    let truncated = issued[..issued.len() - 2].to_owned();

    for token in [prefixed, non_hex, truncated] {
        let identity = resolver.resolve(&request_with(Some(token)));
        assert_eq!(identity.tier(), Tier::Anonymous);
    }
    assert_eq!(
        resolver.resolve(&request_with(Some(issued))).tier(),
        Tier::Premium
    );
}
