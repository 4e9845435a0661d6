use chrono::{DateTime, Utc};

use super::domain::{Interview, InterviewSlotProposal, InterviewerId, ProposalId};
use crate::workflows::pipeline::RepositoryError;

/// Storage for proposals and confirmed interviews.
///
/// The scheduler serializes confirmations per interviewer; implementations only need
/// per-call atomicity.
pub trait SchedulingRepository: Send + Sync {
    fn insert_proposal(&self, proposal: InterviewSlotProposal) -> Result<(), RepositoryError>;
    fn update_proposal(&self, proposal: InterviewSlotProposal) -> Result<(), RepositoryError>;
    fn fetch_proposal(
        &self,
        id: &ProposalId,
    ) -> Result<Option<InterviewSlotProposal>, RepositoryError>;
    fn open_proposals(&self) -> Result<Vec<InterviewSlotProposal>, RepositoryError>;

    fn insert_interview(&self, interview: Interview) -> Result<(), RepositoryError>;
    fn interviews_for(&self, interviewer: &InterviewerId)
        -> Result<Vec<Interview>, RepositoryError>;
    /// Interviews starting within `[from, to)`.
    fn interviews_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Interview>, RepositoryError>;
}
