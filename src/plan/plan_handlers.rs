use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    error::Result,
    schedule::preview_schedule,
    state::AppState,
};
use super::plan_dto::{
    PlanCreatedPayload, ScheduleOutcome, SchedulePreviewRequest, SchedulePreviewResponse,
};

/// Build the reminder schedule for a newly created plan
#[utoipa::path(
    post,
    path = "/api/webhooks/plan-created",
    request_body = PlanCreatedPayload,
    responses(
        (status = 200, description = "Reminders scheduled, or a no-op with the reason", body = ScheduleOutcome),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Storage unavailable")
    ),
    tag = "schedule",
    security(("bearer_auth" = []))
)]
pub async fn plan_created(
    State(state): State<AppState>,
    Json(payload): Json<PlanCreatedPayload>,
) -> Result<Json<ScheduleOutcome>> {
    let plan = payload.into_plan()?;
    let outcome = state.schedule_builder.build(&plan, Utc::now()).await?;

    Ok(Json(outcome))
}

/// Preview the delivery times a plan would get, without writing anything
#[utoipa::path(
    post,
    path = "/api/plans/schedule-preview",
    request_body = SchedulePreviewRequest,
    responses(
        (status = 200, description = "Computed schedule", body = SchedulePreviewResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "schedule",
    security(("bearer_auth" = []))
)]
pub async fn schedule_preview(
    State(state): State<AppState>,
    Json(request): Json<SchedulePreviewRequest>,
) -> Result<Json<SchedulePreviewResponse>> {
    let plan = request.plan.into_plan()?;
    let zone = state.config.civil_zone;
    let entries = preview_schedule(&plan, &request.preferences, zone);

    Ok(Json(SchedulePreviewResponse {
        utc_offset_minutes: zone.offset().local_minus_utc() / 60,
        entries,
    }))
}
