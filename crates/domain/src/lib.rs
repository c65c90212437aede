//! Domain types for admission control and abuse monitoring.

#![forbid(unsafe_code)]

mod analytics;
mod anomaly;
mod decision;
mod identity;
mod request;
mod violation;
mod window;

pub use analytics::{AnalyticsSnapshot, RankedCount, TOP_RANKING_SIZE, block_rate, top_ranked};
pub use anomaly::{AnomalyEvent, AnomalyKind, window_label};
pub use decision::{
    Decision, HEADER_LIMIT, HEADER_REMAINING, HEADER_RESET, HEADER_RETRY_AFTER, Quota, Rejection,
    RejectionBody,
};
pub use identity::{ResolvedIdentity, Tier};
pub use request::{EndpointCategory, RequestContext};
pub use violation::Violation;
pub use window::{WindowKey, bucket_for, window_ttl_seconds};
