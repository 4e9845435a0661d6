use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId, OutreachRecord, OutreachStats};
use super::health::HealthSnapshot;
use crate::workflows::matching::{CandidateId, FitScoreResult, JobId, JobRequirement};
use crate::workflows::retry::CollaboratorError;

/// Storage abstraction for requisitions, applications, scores, outreach, and snapshots.
pub trait PipelineRepository: Send + Sync {
    fn save_requirement(&self, requirement: JobRequirement) -> Result<(), RepositoryError>;
    fn requirement(&self, id: &JobId) -> Result<Option<JobRequirement>, RepositoryError>;
    fn requisitions(&self) -> Result<Vec<JobId>, RepositoryError>;

    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    fn update_application(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn applications_for(&self, requisition: &JobId) -> Result<Vec<Application>, RepositoryError>;

    /// Append-only; earlier results for the same pair are kept.
    fn record_score(&self, result: FitScoreResult) -> Result<(), RepositoryError>;
    /// Most recent result for the pair by `generated_at`.
    fn latest_score(
        &self,
        job: &JobId,
        candidate: &CandidateId,
    ) -> Result<Option<FitScoreResult>, RepositoryError>;

    fn record_outreach(&self, record: OutreachRecord) -> Result<(), RepositoryError>;
    /// Messages sent and replies received at or after `since`.
    fn outreach_stats(
        &self,
        requisition: &JobId,
        since: DateTime<Utc>,
    ) -> Result<OutreachStats, RepositoryError>;

    fn append_snapshot(&self, snapshot: HealthSnapshot) -> Result<(), RepositoryError>;
    fn snapshots(&self, requisition: &JobId) -> Result<Vec<HealthSnapshot>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignAction {
    Started,
    Stopped,
}

impl CampaignAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
        }
    }
}

/// Audit entry for a sourcing campaign flip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignTransition {
    pub requisition: JobId,
    pub action: CampaignAction,
    pub actor: String,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Persisted two-state campaign flag per requisition plus its audit trail.
pub trait CampaignStore: Send + Sync {
    fn is_active(&self, requisition: &JobId) -> Result<bool, RepositoryError>;
    /// Flip the flag and append the audit entry as one unit.
    fn record_transition(&self, transition: CampaignTransition) -> Result<(), RepositoryError>;
    fn transitions(&self, requisition: &JobId) -> Result<Vec<CampaignTransition>, RepositoryError>;
}

/// External sourcing execution (job boards, outreach sequencer).
#[async_trait]
pub trait CampaignLauncher: Send + Sync {
    async fn start_campaign(&self, requisition: &JobId) -> Result<(), CollaboratorError>;
    async fn stop_campaign(&self, requisition: &JobId) -> Result<(), CollaboratorError>;
}
