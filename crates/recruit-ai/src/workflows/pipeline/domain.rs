use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::matching::{CandidateId, JobId};

/// Identifier wrapper for an application of one candidate to one requisition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Hiring funnel position. `Hired` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    New,
    Screening,
    Shortlisted,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl PipelineStage {
    /// Forward funnel order, excluding `Rejected`.
    pub const FUNNEL: [PipelineStage; 6] = [
        PipelineStage::New,
        PipelineStage::Screening,
        PipelineStage::Shortlisted,
        PipelineStage::Interview,
        PipelineStage::Offer,
        PipelineStage::Hired,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Screening => "screening",
            Self::Shortlisted => "shortlisted",
            Self::Interview => "interview",
            Self::Offer => "offer",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Hired | Self::Rejected)
    }

    /// Still moving through the funnel and counted toward the qualified pool.
    pub const fn is_active(self) -> bool {
        !self.is_terminal()
    }

    fn funnel_position(self) -> Option<usize> {
        match self {
            Self::New => Some(0),
            Self::Screening => Some(1),
            Self::Shortlisted => Some(2),
            Self::Interview => Some(3),
            Self::Offer => Some(4),
            Self::Hired => Some(5),
            Self::Rejected => None,
        }
    }

    /// Forward moves (skipping allowed) and rejection from any non-terminal stage.
    pub fn can_transition_to(self, next: PipelineStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.funnel_position(), next.funnel_position()) {
            (_, None) => true,
            (Some(current), Some(target)) => target > current,
            (None, Some(_)) => false,
        }
    }

    /// Whether an application that reached `self` has passed through `stage`.
    pub fn has_reached(self, stage: PipelineStage) -> bool {
        match (self.funnel_position(), stage.funnel_position()) {
            (Some(current), Some(target)) => current >= target,
            _ => self == stage,
        }
    }
}

/// Audit entry for one stage move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: PipelineStage,
    pub to: PipelineStage,
    pub actor: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub requisition: JobId,
    pub candidate: CandidateId,
    pub stage: PipelineStage,
    pub applied_at: DateTime<Utc>,
    pub history: Vec<StageTransition>,
}

impl Application {
    pub fn new(
        id: ApplicationId,
        requisition: JobId,
        candidate: CandidateId,
        applied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            requisition,
            candidate,
            stage: PipelineStage::New,
            applied_at,
            history: Vec::new(),
        }
    }

    /// Move to `to`, appending the audit entry. The application is untouched on refusal.
    pub fn transition(
        &mut self,
        to: PipelineStage,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<StageTransition, InvalidTransition> {
        if !self.stage.can_transition_to(to) {
            return Err(InvalidTransition {
                from: self.stage,
                to,
            });
        }

        let entry = StageTransition {
            from: self.stage,
            to,
            actor: actor.to_string(),
            at,
        };
        self.stage = to;
        self.history.push(entry.clone());
        Ok(entry)
    }

    /// Deepest funnel stage ever held, looking through a rejection to where it happened.
    pub fn furthest_stage(&self) -> PipelineStage {
        self.history
            .iter()
            .flat_map(|entry| [entry.from, entry.to])
            .chain([self.stage])
            .filter(|stage| *stage != PipelineStage::Rejected)
            .max()
            .unwrap_or(PipelineStage::New)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move application from {} to {}", .from.label(), .to.label())]
pub struct InvalidTransition {
    pub from: PipelineStage,
    pub to: PipelineStage,
}

/// One outreach message and, when it came, the candidate's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachRecord {
    pub requisition: JobId,
    pub candidate: CandidateId,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub replied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachStats {
    pub sent: u32,
    pub replied: u32,
}

impl OutreachStats {
    /// Replies over sends; no outreach yet counts as a perfect rate.
    pub fn reply_rate(&self) -> f64 {
        if self.sent == 0 {
            1.0
        } else {
            (f64::from(self.replied) / f64::from(self.sent)).min(1.0)
        }
    }
}
