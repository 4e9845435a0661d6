use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, OutreachRecord, PipelineStage};
use super::events::PipelineEventPublisher;
use super::monitor::{MonitorError, PipelineHealthMonitor};
use super::repository::{CampaignLauncher, CampaignStore, PipelineRepository, RepositoryError};
use super::service::{PipelineError, PipelineService};
use super::sourcing::SourcingError;
use crate::workflows::matching::{CandidateId, CandidateProfile, JobId, JobRequirement};

const DEFAULT_TOP_CANDIDATES: usize = 10;

/// Requisition, application, and reporting endpoints.
pub fn pipeline_router<R, E>(service: Arc<PipelineService<R, E>>) -> Router
where
    R: PipelineRepository + 'static,
    E: PipelineEventPublisher + 'static,
{
    Router::new()
        .route("/api/v1/requisitions", post(publish_handler::<R, E>))
        .route(
            "/api/v1/requisitions/:requisition_id/applications",
            post(submit_handler::<R, E>),
        )
        .route(
            "/api/v1/requisitions/:requisition_id/outreach",
            post(outreach_handler::<R, E>),
        )
        .route(
            "/api/v1/requisitions/:requisition_id/funnel",
            get(funnel_handler::<R, E>),
        )
        .route(
            "/api/v1/requisitions/:requisition_id/top-candidates",
            get(top_candidates_handler::<R, E>),
        )
        .route(
            "/api/v1/applications/:application_id/fit-score",
            post(score_handler::<R, E>),
        )
        .route(
            "/api/v1/applications/:application_id/stage",
            post(stage_handler::<R, E>),
        )
        .with_state(service)
}

/// On-demand health evaluation and snapshot history.
pub fn health_router<R, C, L>(monitor: Arc<PipelineHealthMonitor<R, C, L>>) -> Router
where
    R: PipelineRepository + 'static,
    C: CampaignStore + 'static,
    L: CampaignLauncher + 'static,
{
    Router::new()
        .route(
            "/api/v1/requisitions/:requisition_id/health",
            post(evaluate_handler::<R, C, L>),
        )
        .route(
            "/api/v1/requisitions/:requisition_id/snapshots",
            get(snapshots_handler::<R, C, L>),
        )
        .with_state(monitor)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplicationRequest {
    pub candidate_id: CandidateId,
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutreachRequest {
    pub candidate_id: CandidateId,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub replied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StageRequest {
    pub stage: PipelineStage,
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopCandidatesQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

pub(crate) async fn publish_handler<R, E>(
    State(service): State<Arc<PipelineService<R, E>>>,
    axum::Json(requirement): axum::Json<JobRequirement>,
) -> Response
where
    R: PipelineRepository + 'static,
    E: PipelineEventPublisher + 'static,
{
    match service.publish_requirement(requirement) {
        Ok(stored) => (StatusCode::CREATED, axum::Json(stored)).into_response(),
        Err(error) => pipeline_error_response(error),
    }
}

pub(crate) async fn submit_handler<R, E>(
    State(service): State<Arc<PipelineService<R, E>>>,
    Path(requisition_id): Path<String>,
    axum::Json(request): axum::Json<ApplicationRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    E: PipelineEventPublisher + 'static,
{
    let applied_at = request.applied_at.unwrap_or_else(Utc::now);
    match service.submit_application(&JobId(requisition_id), request.candidate_id, applied_at) {
        Ok(application) => (StatusCode::CREATED, axum::Json(application)).into_response(),
        Err(error) => pipeline_error_response(error),
    }
}

pub(crate) async fn outreach_handler<R, E>(
    State(service): State<Arc<PipelineService<R, E>>>,
    Path(requisition_id): Path<String>,
    axum::Json(request): axum::Json<OutreachRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    E: PipelineEventPublisher + 'static,
{
    let record = OutreachRecord {
        requisition: JobId(requisition_id),
        candidate: request.candidate_id,
        sent_at: request.sent_at.unwrap_or_else(Utc::now),
        replied_at: request.replied_at,
    };
    match service.record_outreach(record) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => pipeline_error_response(error),
    }
}

pub(crate) async fn score_handler<R, E>(
    State(service): State<Arc<PipelineService<R, E>>>,
    Path(application_id): Path<String>,
    axum::Json(profile): axum::Json<CandidateProfile>,
) -> Response
where
    R: PipelineRepository + 'static,
    E: PipelineEventPublisher + 'static,
{
    match service.score_application(&ApplicationId(application_id), &profile, Utc::now()) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => pipeline_error_response(error),
    }
}

pub(crate) async fn stage_handler<R, E>(
    State(service): State<Arc<PipelineService<R, E>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<StageRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    E: PipelineEventPublisher + 'static,
{
    let id = ApplicationId(application_id);
    match service.move_stage(&id, request.stage, &request.actor, Utc::now()) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => pipeline_error_response(error),
    }
}

pub(crate) async fn funnel_handler<R, E>(
    State(service): State<Arc<PipelineService<R, E>>>,
    Path(requisition_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    E: PipelineEventPublisher + 'static,
{
    match service.funnel(&JobId(requisition_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => pipeline_error_response(error),
    }
}

pub(crate) async fn top_candidates_handler<R, E>(
    State(service): State<Arc<PipelineService<R, E>>>,
    Path(requisition_id): Path<String>,
    Query(query): Query<TopCandidatesQuery>,
) -> Response
where
    R: PipelineRepository + 'static,
    E: PipelineEventPublisher + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_TOP_CANDIDATES);
    match service.top_candidates(&JobId(requisition_id), limit) {
        Ok(ranked) => (StatusCode::OK, axum::Json(ranked)).into_response(),
        Err(error) => pipeline_error_response(error),
    }
}

pub(crate) async fn evaluate_handler<R, C, L>(
    State(monitor): State<Arc<PipelineHealthMonitor<R, C, L>>>,
    Path(requisition_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    C: CampaignStore + 'static,
    L: CampaignLauncher + 'static,
{
    match monitor.evaluate(&JobId(requisition_id)).await {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => monitor_error_response(error),
    }
}

pub(crate) async fn snapshots_handler<R, C, L>(
    State(monitor): State<Arc<PipelineHealthMonitor<R, C, L>>>,
    Path(requisition_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    C: CampaignStore + 'static,
    L: CampaignLauncher + 'static,
{
    match monitor.snapshots(&JobId(requisition_id)) {
        Ok(snapshots) => (StatusCode::OK, axum::Json(snapshots)).into_response(),
        Err(error) => monitor_error_response(error),
    }
}

fn pipeline_error_response(error: PipelineError) -> Response {
    let status = match &error {
        PipelineError::RequisitionNotFound(_) | PipelineError::ApplicationNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        PipelineError::InvalidTransition(_)
        | PipelineError::CandidateMismatch { .. }
        | PipelineError::ReplyBeforeSend { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::Repository(error) => repository_status(error),
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

fn monitor_error_response(error: MonitorError) -> Response {
    let status = match &error {
        MonitorError::RequisitionNotFound(_) => StatusCode::NOT_FOUND,
        MonitorError::Sourcing(SourcingError::Collaborator(_)) => StatusCode::SERVICE_UNAVAILABLE,
        MonitorError::Sourcing(SourcingError::Repository(error))
        | MonitorError::Repository(error) => repository_status(error),
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

fn repository_status(error: &RepositoryError) -> StatusCode {
    match error {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
