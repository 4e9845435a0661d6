use crate::infra::{AppState, Workflows};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::put;
use axum::{Extension, Json, Router};
use recruit_ai::infra::StaticAvailability;
use recruit_ai::workflows::matching::fit_score_router;
use recruit_ai::workflows::pipeline::{health_router, pipeline_router};
use recruit_ai::workflows::scheduling::{scheduling_router, InterviewerId, TimeWindow};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// All workflow routers plus the operational endpoints.
pub(crate) fn with_workflow_routes(workflows: &Workflows) -> axum::Router {
    fit_score_router(workflows.engine.clone())
        .merge(pipeline_router(workflows.pipeline.clone()))
        .merge(health_router(workflows.monitor.clone()))
        .merge(scheduling_router(workflows.scheduler.clone()))
        .merge(calendar_router(workflows.availability.clone()))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

/// Free-block feed for the built-in calendar adapter.
fn calendar_router(availability: Arc<StaticAvailability>) -> Router {
    Router::new()
        .route(
            "/api/v1/interviewers/:interviewer_id/availability",
            put(availability_handler),
        )
        .with_state(availability)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvailabilityRequest {
    pub(crate) blocks: Vec<TimeWindow>,
}

/// Replace an interviewer's free blocks wholesale.
pub(crate) async fn availability_handler(
    State(availability): State<Arc<StaticAvailability>>,
    Path(interviewer_id): Path<String>,
    Json(request): Json<AvailabilityRequest>,
) -> Response {
    if let Some(block) = request.blocks.iter().find(|block| block.is_empty()) {
        let payload = json!({
            "error": format!("block starting {} does not end after it starts", block.start),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    let blocks = request.blocks.len();
    availability.set_blocks(InterviewerId(interviewer_id.clone()), request.blocks);
    info!(interviewer = %interviewer_id, blocks, "interviewer availability replaced");

    let payload = json!({ "interviewer_id": interviewer_id, "blocks": blocks });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
