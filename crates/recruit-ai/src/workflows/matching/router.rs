use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{CandidateProfile, JobRequirement};
use super::evaluation::FitScoreEngine;

/// Stateless scoring endpoint; nothing is persisted.
pub fn fit_score_router(engine: Arc<FitScoreEngine>) -> Router {
    Router::new()
        .route("/api/v1/fit-scores", post(score_handler))
        .with_state(engine)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub job: JobRequirement,
    pub candidate: CandidateProfile,
    /// Clock for ongoing roles; identical requests with the same `as_of` score identically.
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

pub(crate) async fn score_handler(
    State(engine): State<Arc<FitScoreEngine>>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response {
    let now = request.as_of.unwrap_or_else(Utc::now);
    let result = engine.score_as_of(&request.job, &request.candidate, now);
    (StatusCode::OK, axum::Json(result)).into_response()
}
