//! Requisition pipeline: applications and stage moves, health monitoring, and the
//! idempotent sourcing trigger fed by it.

pub mod dispatcher;
pub mod domain;
pub mod events;
pub mod health;
pub mod monitor;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod sourcing;

#[cfg(test)]
mod tests;

pub use dispatcher::{DispatcherHandle, HealthDispatcher};
pub use domain::{
    Application, ApplicationId, InvalidTransition, OutreachRecord, OutreachStats,
    PipelineStage, StageTransition,
};
pub use events::{EventError, PipelineEvent, PipelineEventKind, PipelineEventPublisher};
pub use health::{
    HealthConfig, HealthInputs, HealthRisk, HealthSnapshot, HealthWeights, SourcingDecision,
};
pub use monitor::{MonitorError, PipelineHealthMonitor};
pub use report::{FunnelReport, FunnelStage};
pub use repository::{
    CampaignAction, CampaignLauncher, CampaignStore, CampaignTransition, PipelineRepository,
    RepositoryError,
};
pub use router::{health_router, pipeline_router};
pub use service::{PipelineError, PipelineService, RankedCandidate};
pub use sourcing::{SourcingError, SourcingOutcome, SourcingTrigger, HEALTH_MONITOR_ACTOR};
