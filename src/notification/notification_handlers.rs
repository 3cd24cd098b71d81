use axum::{extract::State, Json};
use chrono::Utc;

use crate::{error::Result, state::AppState};
use super::notification_dto::DispatchSummary;

/// Run one dispatcher pass now, for deployments driven by an external timer
#[utoipa::path(
    post,
    path = "/api/dispatch",
    responses(
        (status = 200, description = "Due notifications processed", body = DispatchSummary),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Queue unavailable")
    ),
    tag = "dispatch",
    security(("bearer_auth" = []))
)]
pub async fn dispatch_now(State(state): State<AppState>) -> Result<Json<DispatchSummary>> {
    let summary = state.dispatcher.dispatch_due(Utc::now()).await?;
    Ok(Json(summary))
}
