use std::net::{IpAddr, SocketAddr};

use axum::Json;
use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tollgate_core::AppError;
use tollgate_domain::{Decision, RejectionBody, RequestContext};
use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::state::AppState;

const UNKNOWN_CLIENT: &str = "unknown";

/// Counts the request against its tiered policy and rejects it with 429
/// once the window is exhausted.
pub async fn admission(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let context = request_context(&request, state.trust_forwarded_for);
    let policy = state
        .policy_resolver
        .resolve_policy(&context, context.category());

    let (decision, compensation) = state
        .admission_gate
        .evaluate(&context, &policy)
        .await?
        .into_parts();

    if let Decision::Deny(rejection) = &decision {
        debug!(
            client = %context.client_address(),
            path = %context.path(),
            limit = rejection.limit,
            "request rejected by admission gate"
        );
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(RejectionBody::from(rejection)),
        )
            .into_response();
        apply_headers(response.headers_mut(), &decision);
        return Ok(response);
    }

    let mut response = next.run(request).await;
    apply_headers(response.headers_mut(), &decision);

    if let Some(hook) = compensation {
        let status = response.status().as_u16();
        tokio::spawn(async move {
            hook.on_response_complete(status).await;
        });
    }

    Ok(response)
}

/// Guards the operational endpoints with the configured admin bearer token.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if let Some(expected) = state.admin_token.as_deref() {
        if !admin_token_matches(bearer_token(request.headers()), expected) {
            return Err(AppError::Unauthorized("admin token required".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn admin_token_matches(provided: Option<&str>, expected: &str) -> bool {
    provided.is_some_and(|provided| bool::from(provided.as_bytes().ct_eq(expected.as_bytes())))
}

fn request_context(request: &Request, trust_forwarded_for: bool) -> RequestContext {
    let headers = request.headers();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip());

    RequestContext::new(
        request.method().as_str(),
        request.uri().path(),
        client_address(headers, peer, trust_forwarded_for),
    )
    .with_route(
        request
            .extensions()
            .get::<MatchedPath>()
            .map(|route| route.as_str().to_owned()),
    )
    .with_user_agent(header_string(headers, &USER_AGENT))
    .with_credential(bearer_token(headers).map(str::to_owned))
}

/// Forwarded headers are honoured only behind a trusted proxy; otherwise any
/// caller could pick its own counter key.
fn client_address(headers: &HeaderMap, peer: Option<IpAddr>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = header_string(headers, &HeaderName::from_static("x-forwarded-for"))
            .and_then(|value| {
                value
                    .split(',')
                    .next()
                    .map(str::trim)
                    .and_then(|first| first.parse::<IpAddr>().ok())
            })
            .or_else(|| {
                header_string(headers, &HeaderName::from_static("x-real-ip"))
                    .and_then(|value| value.trim().parse::<IpAddr>().ok())
            });
        if let Some(address) = forwarded {
            return address.to_string();
        }
    }

    peer.map_or_else(|| UNKNOWN_CLIENT.to_owned(), |address| address.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn apply_headers(headers: &mut HeaderMap, decision: &Decision) {
    for (name, value) in decision.headers() {
        let encoded = HeaderName::from_bytes(name.as_bytes())
            .map_err(|error| error.to_string())
            .and_then(|name| {
                HeaderValue::from_str(&value)
                    .map(|value| (name, value))
                    .map_err(|error| error.to_string())
            });

        match encoded {
            Ok((name, value)) => {
                headers.insert(name, value);
            }
            Err(error) => {
                warn!(header = name, error = %error, "failed to encode rate limit header");
            }
        }
    }
}
