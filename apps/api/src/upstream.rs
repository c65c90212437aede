//! Forwarding of admitted requests to the protected upstream service.

use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::header;
use axum::response::Response;
use tollgate_core::AppError;

const MAX_FORWARDED_BODY_BYTES: usize = 2 * 1024 * 1024;

// Connection-scoped headers that must not be relayed by a proxy.
const HOP_BY_HOP_HEADERS: [header::HeaderName; 6] = [
    header::CONNECTION,
    header::HOST,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// HTTP client bound to the upstream base URL.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Relays one request and returns the upstream response unchanged.
    pub async fn forward(&self, request: Request) -> Result<Response, AppError> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |value| value.as_str());
        let url = format!("{}{path_and_query}", self.base_url);

        let body = to_bytes(body, MAX_FORWARDED_BODY_BYTES)
            .await
            .map_err(|error| AppError::Validation(format!("failed to read request body: {error}")))?;

        let mut headers = parts.headers;
        for name in &HOP_BY_HOP_HEADERS {
            headers.remove(name);
        }

        let upstream_response = self
            .client
            .request(parts.method, url.as_str())
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to forward request to '{url}': {error}"))
            })?;

        let status = upstream_response.status();
        let mut response_headers = upstream_response.headers().clone();
        for name in &HOP_BY_HOP_HEADERS {
            response_headers.remove(name);
        }
        let bytes = upstream_response.bytes().await.map_err(|error| {
            AppError::Internal(format!("failed to read upstream response: {error}"))
        })?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}
