use axum::Json;
use axum::extract::{Query, State};
use tollgate_application::PolicyRow;
use tollgate_domain::Violation;

use crate::dto::{AnalyticsResponse, AnomalyScanResponse, ViolationListQuery};
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_VIOLATION_PAGE: usize = 50;

pub async fn policies_handler(State(state): State<AppState>) -> Json<Vec<PolicyRow>> {
    Json(state.policy_resolver.policy_table())
}

pub async fn analytics_handler(State(state): State<AppState>) -> ApiResult<Json<AnalyticsResponse>> {
    let snapshot = state.analytics_aggregator.snapshot().await?;
    Ok(Json(AnalyticsResponse::from(snapshot)))
}

pub async fn violations_handler(
    State(state): State<AppState>,
    Query(query): Query<ViolationListQuery>,
) -> ApiResult<Json<Vec<Violation>>> {
    let violations = state
        .analytics_aggregator
        .recent_violations(query.limit.unwrap_or(DEFAULT_VIOLATION_PAGE))
        .await?;

    Ok(Json(violations))
}

pub async fn anomalies_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<AnomalyScanResponse>> {
    let flagged_sources = state.anomaly_detector.detect_suspicious_activity().await?;
    Ok(Json(AnomalyScanResponse { flagged_sources }))
}
