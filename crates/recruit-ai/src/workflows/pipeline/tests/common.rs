use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::infra::{
    InMemoryCampaignLauncher, InMemoryCampaignStore, InMemoryEventLog, InMemoryPipelineRepository,
};
use crate::workflows::matching::{
    CandidateId, CandidateProfile, FitScoreEngine, FitScoreResult, JobId, JobRequirement,
    RedFlagConfig, ScoringConfig, SeniorityBand, SkillRequirement, SkillSynonymTable,
};
use crate::workflows::pipeline::{
    Application, CampaignAction, CampaignStore, CampaignTransition, HealthConfig,
    OutreachRecord, PipelineHealthMonitor, PipelineRepository, PipelineService, SourcingTrigger,
};
use crate::workflows::retry::RetryPolicy;

pub(super) type MemoryService = PipelineService<InMemoryPipelineRepository, InMemoryEventLog>;
pub(super) type MemoryMonitor = PipelineHealthMonitor<
    InMemoryPipelineRepository,
    InMemoryCampaignStore,
    InMemoryCampaignLauncher,
>;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn engine() -> Arc<FitScoreEngine> {
    Arc::new(
        FitScoreEngine::new(
            ScoringConfig::default(),
            RedFlagConfig::default(),
            SkillSynonymTable::with_defaults(),
        )
        .expect("default configuration is valid"),
    )
}

pub(super) fn requirement(id: &str) -> JobRequirement {
    JobRequirement {
        id: JobId(id.to_string()),
        version: 1,
        title: "Platform Engineer".to_string(),
        skills: vec![
            SkillRequirement::must_have("Rust"),
            SkillRequirement::must_have("Kubernetes"),
            SkillRequirement::nice_to_have("Terraform"),
        ],
        min_years: Some(3.0),
        max_years: None,
        seniority: SeniorityBand::Senior,
        location: "Remote".to_string(),
        compensation: None,
        domain_keywords: Vec::new(),
        minimum_education: None,
        description: String::new(),
    }
}

pub(super) fn profile(id: &str) -> CandidateProfile {
    CandidateProfile {
        id: CandidateId(id.to_string()),
        name: format!("Candidate {id}"),
        skills: vec!["rust".to_string(), "k8s".to_string()],
        experience: Vec::new(),
        education: Vec::new(),
        domains: Vec::new(),
        location: None,
    }
}

/// Recorded result with the overall pinned, so health counts are easy to reason about.
pub(super) fn score_with(
    requisition: &JobRequirement,
    candidate: &str,
    overall: f64,
    at: DateTime<Utc>,
) -> FitScoreResult {
    let mut result = engine().score_as_of(requisition, &profile(candidate), at);
    result.overall = overall;
    result
}

pub(super) struct Harness {
    pub repository: Arc<InMemoryPipelineRepository>,
    pub events: Arc<InMemoryEventLog>,
    pub store: Arc<InMemoryCampaignStore>,
    pub launcher: Arc<InMemoryCampaignLauncher>,
    pub service: Arc<MemoryService>,
    pub monitor: Arc<MemoryMonitor>,
}

pub(super) fn harness() -> Harness {
    harness_with(HealthConfig::default())
}

pub(super) fn harness_with(config: HealthConfig) -> Harness {
    let repository = Arc::new(InMemoryPipelineRepository::default());
    let events = Arc::new(InMemoryEventLog::default());
    let store = Arc::new(InMemoryCampaignStore::default());
    let launcher = Arc::new(InMemoryCampaignLauncher::default());

    let service = Arc::new(PipelineService::new(
        repository.clone(),
        events.clone(),
        engine(),
    ));
    let trigger = Arc::new(SourcingTrigger::new(
        store.clone(),
        launcher.clone(),
        RetryPolicy::default(),
    ));
    let monitor = Arc::new(PipelineHealthMonitor::new(
        repository.clone(),
        trigger,
        config,
    ));

    Harness {
        repository,
        events,
        store,
        launcher,
        service,
        monitor,
    }
}

impl Harness {
    pub(super) fn publish(&self, id: &str) -> JobRequirement {
        self.service
            .publish_requirement(requirement(id))
            .expect("requirement published")
    }

    pub(super) fn apply(
        &self,
        requisition: &str,
        candidate: &str,
        at: DateTime<Utc>,
    ) -> Application {
        self.service
            .submit_application(
                &JobId(requisition.to_string()),
                CandidateId(candidate.to_string()),
                at,
            )
            .expect("application accepted")
    }

    /// `count` applications, each with a recorded score of `overall`.
    pub(super) fn seed_scored(
        &self,
        requisition: &JobRequirement,
        prefix: &str,
        count: usize,
        overall: f64,
        applied_at: DateTime<Utc>,
    ) -> Vec<Application> {
        (0..count)
            .map(|index| {
                let candidate = format!("{prefix}-{index}");
                let application = self.apply(&requisition.id.0, &candidate, applied_at);
                self.repository
                    .record_score(score_with(requisition, &candidate, overall, applied_at))
                    .expect("score recorded");
                application
            })
            .collect()
    }

    pub(super) fn seed_outreach(
        &self,
        requisition: &str,
        sent: usize,
        replied: usize,
        at: DateTime<Utc>,
    ) {
        for index in 0..sent {
            self.repository
                .record_outreach(OutreachRecord {
                    requisition: JobId(requisition.to_string()),
                    candidate: CandidateId(format!("prospect-{index}")),
                    sent_at: at,
                    replied_at: (index < replied).then(|| at + Duration::hours(2)),
                })
                .expect("outreach recorded");
        }
    }

    pub(super) fn activate_campaign(&self, requisition: &str) {
        self.store
            .record_transition(CampaignTransition {
                requisition: JobId(requisition.to_string()),
                action: CampaignAction::Started,
                actor: "recruiter:dana".to_string(),
                reason: "manual kickoff".to_string(),
                at: now() - Duration::days(3),
            })
            .expect("transition recorded");
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
