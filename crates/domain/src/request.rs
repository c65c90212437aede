//! Request facts the admission subsystem reasons about.

use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tollgate_core::AppError;

/// Logical endpoint category used to select a limit table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointCategory {
    /// Property search and query endpoints.
    Search,
    /// Property detail reads.
    DetailRead,
    /// State-changing actions such as saving favourites or alerts.
    WriteAction,
}

impl EndpointCategory {
    /// All categories in table order.
    pub const ALL: [Self; 3] = [Self::Search, Self::DetailRead, Self::WriteAction];

    /// Returns the stable storage value used in counter keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::DetailRead => "detail-read",
            Self::WriteAction => "write-action",
        }
    }

    /// Classifies an HTTP request by method and path.
    ///
    /// Anything other than `GET`/`HEAD` is a write action. Reads whose path
    /// has a `search` segment are searches; every other read is a detail read.
    #[must_use]
    pub fn classify(method: &str, path: &str) -> Self {
        let is_read = method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD");
        if !is_read {
            return Self::WriteAction;
        }

        if path
            .split('/')
            .any(|segment| segment.eq_ignore_ascii_case("search"))
        {
            Self::Search
        } else {
            Self::DetailRead
        }
    }
}

impl Display for EndpointCategory {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for EndpointCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "search" => Ok(Self::Search),
            "detail-read" => Ok(Self::DetailRead),
            "write-action" => Ok(Self::WriteAction),
            other => Err(AppError::Validation(format!(
                "unknown endpoint category '{other}'"
            ))),
        }
    }
}

/// Transport-independent view of one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    method: String,
    path: String,
    client_address: String,
    route: Option<String>,
    user_agent: Option<String>,
    credential: Option<String>,
}

impl RequestContext {
    /// Creates a request context from the caller's method, path and address.
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        client_address: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            client_address: client_address.into(),
            route: None,
            user_agent: None,
            credential: None,
        }
    }

    /// Attaches the route template the request matched, e.g.
    /// `/api/properties/{*rest}`.
    #[must_use]
    pub fn with_route(mut self, route: Option<String>) -> Self {
        self.route = route;
        self
    }

    /// Attaches the caller's user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent.filter(|value| !value.trim().is_empty());
        self
    }

    /// Attaches the caller's bearer credential.
    #[must_use]
    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential.filter(|value| !value.trim().is_empty());
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Returns the caller's network address as reported by the transport.
    #[must_use]
    pub fn client_address(&self) -> &str {
        self.client_address.as_str()
    }

    /// Parses the caller's network address, when it is an IP literal.
    #[must_use]
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_address.parse().ok()
    }

    /// Returns the caller's user agent.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Returns the raw bearer credential, if one was presented.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Returns the endpoint category implied by method and path.
    #[must_use]
    pub fn category(&self) -> EndpointCategory {
        EndpointCategory::classify(&self.method, &self.path)
    }

    /// Returns the label analytics and violations group this request under.
    ///
    /// Built from the category and the matched route template, never the raw
    /// path, so the set of labels is bounded by the routing table.
    #[must_use]
    pub fn endpoint(&self) -> String {
        match self.route.as_deref() {
            Some(route) => format!("{} {route}", self.category()),
            None => self.category().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EndpointCategory, RequestContext};

    #[test]
    fn classify_separates_search_detail_and_write() {
        assert_eq!(
            EndpointCategory::classify("GET", "/api/properties/search"),
            EndpointCategory::Search
        );
        assert_eq!(
            EndpointCategory::classify("GET", "/api/properties/42"),
            EndpointCategory::DetailRead
        );
        assert_eq!(
            EndpointCategory::classify("POST", "/api/properties/search"),
            EndpointCategory::WriteAction
        );
        assert_eq!(
            EndpointCategory::classify("GET", "/api/properties/research-notes"),
            EndpointCategory::DetailRead
        );
    }

    #[test]
    fn endpoint_labels_ignore_path_parameters() {
        let route = Some("/api/properties/{*rest}".to_owned());
        let first = RequestContext::new("GET", "/api/properties/42", "203.0.113.7")
            .with_route(route.clone());
        let second = RequestContext::new("GET", "/api/properties/9f1c-junk/x", "203.0.113.7")
            .with_route(route.clone());
        let search = RequestContext::new("GET", "/api/properties/search", "203.0.113.7")
            .with_route(route);

        assert_eq!(first.endpoint(), "detail-read /api/properties/{*rest}");
        assert_eq!(first.endpoint(), second.endpoint());
        assert_eq!(search.endpoint(), "search /api/properties/{*rest}");
        assert_eq!(
            RequestContext::new("POST", "/anything/at/all", "203.0.113.7").endpoint(),
            "write-action"
        );
    }

    #[test]
    fn blank_credentials_are_ignored() {
        let request = RequestContext::new("GET", "/", "203.0.113.7")
            .with_credential(Some("   ".to_owned()))
            .with_user_agent(Some(String::new()));

        assert_eq!(request.credential(), None);
        assert_eq!(request.user_agent(), None);
        assert!(request.client_ip().is_some());
    }
}
