use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use chrono::Duration;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::infra::{
    InMemoryCampaignLauncher, InMemoryCampaignStore, InMemoryEventLog, InMemoryPipelineRepository,
};
use crate::workflows::matching::{CandidateId, JobId};
use crate::workflows::pipeline::router::{
    evaluate_handler, stage_handler, submit_handler, ApplicationRequest, StageRequest,
};
use crate::workflows::pipeline::{health_router, pipeline_router, PipelineStage};

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn publish_route_creates_requirement() {
    let harness = harness();
    let router = pipeline_router(harness.service.clone());
    let body = serde_json::to_value(requirement("req-platform")).expect("serializes");

    let response = router
        .oneshot(json_request("POST", "/api/v1/requisitions", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("id"), Some(&json!("req-platform")));
    assert_eq!(payload.get("version"), Some(&json!(1)));
}

#[tokio::test]
async fn submit_handler_returns_not_found_for_unknown_requisition() {
    let harness = harness();

    let response = submit_handler::<InMemoryPipelineRepository, InMemoryEventLog>(
        State(harness.service.clone()),
        Path("req-missing".to_string()),
        axum::Json(ApplicationRequest {
            candidate_id: CandidateId("cand-1".to_string()),
            applied_at: Some(now()),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload
        .get("error")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .contains("req-missing"));
}

#[tokio::test]
async fn stage_handler_returns_unprocessable_for_backward_move() {
    let harness = harness();
    harness.publish("req-platform");
    let application = harness.apply("req-platform", "cand-1", now());
    harness
        .service
        .move_stage(&application.id, PipelineStage::Interview, "recruiter", now())
        .expect("advance");

    let response = stage_handler::<InMemoryPipelineRepository, InMemoryEventLog>(
        State(harness.service.clone()),
        Path(application.id.0.clone()),
        axum::Json(StageRequest {
            stage: PipelineStage::New,
            actor: "recruiter".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload.get("error"),
        Some(&json!("cannot move application from interview to new"))
    );
}

#[tokio::test]
async fn stage_route_accepts_snake_case_stage_names() {
    let harness = harness();
    harness.publish("req-platform");
    let application = harness.apply("req-platform", "cand-1", now());
    let router = pipeline_router(harness.service.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/applications/{}/stage", application.id.0),
            json!({ "stage": "shortlisted", "actor": "recruiter:dana" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("stage"), Some(&json!("shortlisted")));
}

#[tokio::test]
async fn top_candidates_route_honours_limit() {
    let harness = harness();
    let requirement = harness.publish("req-platform");
    harness.seed_scored(&requirement, "cand", 3, 0.8, now() - Duration::days(1));
    let router = pipeline_router(harness.service.clone());

    let response = router
        .oneshot(
            Request::get("/api/v1/requisitions/req-platform/top-candidates?limit=2")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn health_route_returns_snapshot_and_history() {
    let harness = harness();
    harness.publish("req-platform");

    let response = health_router(harness.monitor.clone())
        .oneshot(json_request(
            "POST",
            "/api/v1/requisitions/req-platform/health",
            json!({}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("decision"), Some(&json!("start_sourcing")));
    assert_eq!(payload.get("sourcing"), Some(&json!("started")));

    let response = health_router(harness.monitor.clone())
        .oneshot(
            Request::get("/api/v1/requisitions/req-platform/snapshots")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn evaluate_handler_returns_not_found_for_unknown_requisition() {
    let harness = harness();

    let response = evaluate_handler::<
        InMemoryPipelineRepository,
        InMemoryCampaignStore,
        InMemoryCampaignLauncher,
    >(State(harness.monitor.clone()), Path("req-missing".to_string()))
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn evaluate_handler_returns_service_unavailable_when_launcher_is_down() {
    let harness = harness();
    harness.publish("req-platform");
    harness.launcher.fail_next(10);

    let response = evaluate_handler::<
        InMemoryPipelineRepository,
        InMemoryCampaignStore,
        InMemoryCampaignLauncher,
    >(State(harness.monitor.clone()), Path("req-platform".to_string()))
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!harness
        .monitor
        .trigger()
        .is_active(&JobId("req-platform".to_string()))
        .expect("flag readable"));
}

#[tokio::test]
async fn outreach_route_feeds_the_reply_rate() {
    let harness = harness();
    harness.publish("req-platform");
    let pipeline = pipeline_router(harness.service.clone());

    for prospect in ["prospect-1", "prospect-2"] {
        let response = pipeline
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/requisitions/req-platform/outreach",
                json!({ "candidate_id": prospect }),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = health_router(harness.monitor.clone())
        .oneshot(json_request(
            "POST",
            "/api/v1/requisitions/req-platform/health",
            json!({}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.pointer("/outreach/sent"), Some(&json!(2)));
    assert_eq!(payload.get("reply_rate"), Some(&json!(0.0)));
}

#[tokio::test]
async fn outreach_route_rejects_reply_before_send() {
    let harness = harness();
    harness.publish("req-platform");

    let response = pipeline_router(harness.service.clone())
        .oneshot(json_request(
            "POST",
            "/api/v1/requisitions/req-platform/outreach",
            json!({
                "candidate_id": "prospect-1",
                "sent_at": now(),
                "replied_at": now() - Duration::hours(1),
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(harness.events.events().iter().all(|event| event.kind.label() != "outreach_recorded"));
}
