use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::availability::AvailabilitySource;
use super::domain::{InterviewerId, ProposalId, TimeWindow};
use super::repository::SchedulingRepository;
use super::scheduler::{InterviewScheduler, SchedulingError};
use crate::workflows::pipeline::{ApplicationId, RepositoryError};

const DEFAULT_UPCOMING_DAYS: u32 = 7;

/// Router builder exposing proposal and confirmation endpoints.
pub fn scheduling_router<S, A>(scheduler: Arc<InterviewScheduler<S, A>>) -> Router
where
    S: SchedulingRepository + 'static,
    A: AvailabilitySource + 'static,
{
    Router::new()
        .route("/api/v1/interviews/proposals", post(propose_handler::<S, A>))
        .route(
            "/api/v1/interviews/proposals/:proposal_id",
            get(proposal_handler::<S, A>),
        )
        .route(
            "/api/v1/interviews/proposals/:proposal_id/confirm",
            post(confirm_handler::<S, A>),
        )
        .route("/api/v1/interviews/upcoming", get(upcoming_handler::<S, A>))
        .with_state(scheduler)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProposeRequest {
    pub application_id: ApplicationId,
    pub interviewer_id: InterviewerId,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmRequest {
    pub window: TimeWindow,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpcomingQuery {
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub interviewer_id: Option<String>,
}

pub(crate) async fn propose_handler<S, A>(
    State(scheduler): State<Arc<InterviewScheduler<S, A>>>,
    axum::Json(request): axum::Json<ProposeRequest>,
) -> Response
where
    S: SchedulingRepository + 'static,
    A: AvailabilitySource + 'static,
{
    match scheduler
        .propose(request.application_id, request.interviewer_id, request.count)
        .await
    {
        Ok(proposal) => (StatusCode::CREATED, axum::Json(proposal)).into_response(),
        Err(error) => scheduling_error_response(error),
    }
}

pub(crate) async fn proposal_handler<S, A>(
    State(scheduler): State<Arc<InterviewScheduler<S, A>>>,
    Path(proposal_id): Path<String>,
) -> Response
where
    S: SchedulingRepository + 'static,
    A: AvailabilitySource + 'static,
{
    match scheduler.proposal(&ProposalId(proposal_id)) {
        Ok(proposal) => (StatusCode::OK, axum::Json(proposal)).into_response(),
        Err(error) => scheduling_error_response(error),
    }
}

pub(crate) async fn confirm_handler<S, A>(
    State(scheduler): State<Arc<InterviewScheduler<S, A>>>,
    Path(proposal_id): Path<String>,
    axum::Json(request): axum::Json<ConfirmRequest>,
) -> Response
where
    S: SchedulingRepository + 'static,
    A: AvailabilitySource + 'static,
{
    match scheduler.confirm(&ProposalId(proposal_id), request.window) {
        Ok(interview) => (StatusCode::CREATED, axum::Json(interview)).into_response(),
        Err(error) => scheduling_error_response(error),
    }
}

pub(crate) async fn upcoming_handler<S, A>(
    State(scheduler): State<Arc<InterviewScheduler<S, A>>>,
    Query(query): Query<UpcomingQuery>,
) -> Response
where
    S: SchedulingRepository + 'static,
    A: AvailabilitySource + 'static,
{
    let interviewer = query.interviewer_id.map(InterviewerId);
    let days = query.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    match scheduler.upcoming(interviewer.as_ref(), days, Utc::now()) {
        Ok(interviews) => (StatusCode::OK, axum::Json(interviews)).into_response(),
        Err(error) => scheduling_error_response(error),
    }
}

pub(crate) fn scheduling_status(error: &SchedulingError) -> StatusCode {
    match error {
        SchedulingError::NoAvailability { .. } | SchedulingError::SlotConflict { .. } => {
            StatusCode::CONFLICT
        }
        SchedulingError::InvalidSlot(_) | SchedulingError::InvalidRequest(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SchedulingError::ProposalNotFound(_)
        | SchedulingError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        SchedulingError::Collaborator(_) => StatusCode::SERVICE_UNAVAILABLE,
        SchedulingError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        SchedulingError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn scheduling_error_response(error: SchedulingError) -> Response {
    let status = scheduling_status(&error);
    let mut payload = json!({
        "error": error.to_string(),
    });
    if let SchedulingError::Collaborator(collaborator) = &error {
        payload["retryable"] = json!(collaborator.retryable);
    }
    (status, axum::Json(payload)).into_response()
}
