use axum::extract::{Request, State};
use axum::response::Response;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn forward_handler(State(state): State<AppState>, request: Request) -> ApiResult<Response> {
    Ok(state.upstream.forward(request).await?)
}
