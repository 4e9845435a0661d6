use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, PipelineStage};
use crate::workflows::matching::{CandidateId, JobId};

/// Pipeline mutation that may change a requisition's health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub requisition: JobId,
    pub kind: PipelineEventKind,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEventKind {
    ApplicationReceived {
        application: ApplicationId,
    },
    StageChanged {
        application: ApplicationId,
        from: PipelineStage,
        to: PipelineStage,
    },
    ScoreRecorded {
        candidate: CandidateId,
    },
    OutreachRecorded {
        candidate: CandidateId,
        replied: bool,
    },
}

impl PipelineEventKind {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ApplicationReceived { .. } => "application_received",
            Self::StageChanged { .. } => "stage_changed",
            Self::ScoreRecorded { .. } => "score_recorded",
            Self::OutreachRecorded { .. } => "outreach_recorded",
        }
    }
}

/// Outbound hook for pipeline events (health dispatcher, audit sinks).
pub trait PipelineEventPublisher: Send + Sync {
    fn publish(&self, event: PipelineEvent) -> Result<(), EventError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event channel closed")]
    ChannelClosed,
}
