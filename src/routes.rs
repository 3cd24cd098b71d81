use crate::{
    middleware::webhook_auth_middleware,
    notification::{self, DispatchSummary},
    plan::{self, plan_dto::*},
    settings::{DoNotDisturb, NotificationPreferences},
    state::AppState,
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        plan::plan_handlers::plan_created,
        plan::plan_handlers::schedule_preview,
        notification::notification_handlers::dispatch_now,
    ),
    components(
        schemas(
            PlanCreatedPayload,
            ScheduleOutcome,
            SkipReason,
            SchedulePreviewRequest,
            SchedulePreviewResponse,
            PreviewEntry,
            NotificationPreferences,
            DoNotDisturb,
            DispatchSummary,
        )
    ),
    tags(
        (name = "schedule", description = "Reminder schedule building"),
        (name = "dispatch", description = "Reminder delivery")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Every /api route is called by the datastore webhook or the timer, never by end users
    let api_routes = Router::new()
        .route("/webhooks/plan-created", post(plan::plan_created))
        .route("/plans/schedule-preview", post(plan::schedule_preview))
        .route("/dispatch", post(notification::dispatch_now))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            webhook_auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    const SECRET: &str = "s3cret";

    fn test_router() -> Router {
        let config = Config::from_lookup(|key: &str| {
            let value = match key {
                "DATABASE_URL" => Some("postgres://localhost/reminders_test"),
                "WEBHOOK_SECRET" => Some(SECRET),
                "PUSH_GATEWAY_URL" => Some("http://127.0.0.1:9/send"),
                "PUSH_GATEWAY_KEY" => Some("key"),
                _ => None,
            };
            value.map(str::to_string)
        })
        .unwrap();
        // Never connects: the requests below return before touching storage.
        let pool = PgPoolOptions::new().connect_lazy(&config.database_url).unwrap();

        create_router(AppState::new(pool, config).unwrap())
    }

    fn post_json(uri: &str, secret: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(secret) = secret {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", secret));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn plan_json(days: Value) -> Value {
        json!({
            "planId": "6f9619ff-8b86-d011-b42d-00cf4fc964ff",
            "ownerId": "7f9619ff-8b86-d011-b42d-00cf4fc964ff",
            "title": "Index fund",
            "startDate": "2024-01-15",
            "durationYears": 1,
            "paymentDaysOfMonth": days
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), b"ok");
    }

    #[tokio::test]
    async fn test_api_requires_secret() {
        let missing = test_router()
            .oneshot(post_json("/api/dispatch", None, json!({})))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = test_router()
            .oneshot(post_json("/api/dispatch", Some("guess"), json!({})))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_plan_without_days_is_a_no_op() {
        let response = test_router()
            .oneshot(post_json("/api/webhooks/plan-created", Some(SECRET), plan_json(json!([]))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["created"], 0);
        assert_eq!(body["skipped"], "no_payment_days");
    }

    #[tokio::test]
    async fn test_plan_with_invalid_day_is_rejected() {
        let response = test_router()
            .oneshot(post_json("/api/webhooks/plan-created", Some(SECRET), plan_json(json!([1, 40]))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_schedule_preview() {
        let request = json!({
            "plan": plan_json(json!([1, 31])),
            "preferences": {
                "globalEnabled": true,
                "defaultReminderTime": "23:30:00",
                "preReminderOffsetDays": 0,
                "doNotDisturb": { "enabled": true, "start": "22:00:00", "end": "08:00:00" }
            }
        });

        let response = test_router()
            .oneshot(post_json("/api/plans/schedule-preview", Some(SECRET), request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["utcOffsetMinutes"], 540);
        let entries = body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 19);
        assert_eq!(entries[0]["paymentDate"], "2024-01-31");
        assert_eq!(entries[0]["civilDelivery"], "2024-02-01T08:00:00");
        assert_eq!(entries[0]["scheduledAt"], "2024-01-31T23:00:00Z");
    }
}
