use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::availability::{carve_slots, AvailabilitySource};
use super::config::{SchedulingConfig, MAX_HORIZON_DAYS};
use super::domain::{
    Interview, InterviewId, InterviewSlotProposal, InterviewerId, ProposalId, ProposalStatus,
    TimeWindow,
};
use super::repository::SchedulingRepository;
use crate::workflows::locks::KeyedLocks;
use crate::workflows::pipeline::{ApplicationId, RepositoryError};
use crate::workflows::retry::{CollaboratorError, RetryPolicy};

static PROPOSAL_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static INTERVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_proposal_id() -> ProposalId {
    let id = PROPOSAL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ProposalId(format!("prop-{id:06}"))
}

fn next_interview_id() -> InterviewId {
    let id = INTERVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InterviewId(format!("int-{id:06}"))
}

/// Typed scheduling failures. None of them are retried on the caller's behalf.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error(
        "interviewer {interviewer} has only {found} of {requested} free window(s) in the horizon"
    )]
    NoAvailability {
        interviewer: String,
        requested: usize,
        found: usize,
    },
    #[error("invalid slot: {0}")]
    InvalidSlot(String),
    #[error("window starting {start} overlaps a confirmed interview for {interviewer}")]
    SlotConflict {
        interviewer: String,
        start: DateTime<Utc>,
    },
    #[error("proposal {0} not found")]
    ProposalNotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Proposes interview windows and confirms them without double-booking an interviewer.
///
/// Proposals are optimistic: nothing is held between `propose` and `confirm`. Confirmation
/// re-checks the interviewer's calendar under a per-interviewer lock, so the overlap check and
/// the interview insert form one unit.
pub struct InterviewScheduler<S, A> {
    repository: Arc<S>,
    availability: Arc<A>,
    config: SchedulingConfig,
    retry: RetryPolicy,
    locks: KeyedLocks<InterviewerId, Mutex<()>>,
}

impl<S, A> InterviewScheduler<S, A>
where
    S: SchedulingRepository + 'static,
    A: AvailabilitySource + 'static,
{
    pub fn new(
        repository: Arc<S>,
        availability: Arc<A>,
        config: SchedulingConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repository,
            availability,
            config,
            retry,
            locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub async fn propose(
        &self,
        application: ApplicationId,
        interviewer: InterviewerId,
        desired_count: Option<usize>,
    ) -> Result<InterviewSlotProposal, SchedulingError> {
        self.propose_at(application, interviewer, desired_count, Utc::now())
            .await
    }

    pub async fn propose_at(
        &self,
        application: ApplicationId,
        interviewer: InterviewerId,
        desired_count: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<InterviewSlotProposal, SchedulingError> {
        let count = desired_count.unwrap_or(self.config.slot_count);
        if count == 0 {
            return Err(SchedulingError::InvalidRequest(
                "at least one window must be requested".to_string(),
            ));
        }
        if count > self.config.max_slot_count {
            return Err(SchedulingError::InvalidRequest(format!(
                "at most {} windows may be requested, got {count}",
                self.config.max_slot_count
            )));
        }
        let horizon_end = offset(now, self.config.horizon())?;
        let expires_at = offset(now, self.config.proposal_ttl)?;

        let availability = &self.availability;
        let horizon_days = self.config.horizon_days;
        let free_blocks = self
            .retry
            .run("calendar.availability", || {
                availability.availability(&interviewer, horizon_days)
            })
            .await?;

        let booked: Vec<TimeWindow> = self
            .repository
            .interviews_for(&interviewer)?
            .into_iter()
            .map(|interview| interview.window)
            .collect();

        let windows = carve_slots(
            &free_blocks,
            self.config.slot_duration,
            now,
            horizon_end,
            &booked,
            count,
        );
        if windows.len() < count {
            return Err(SchedulingError::NoAvailability {
                interviewer: interviewer.0,
                requested: count,
                found: windows.len(),
            });
        }

        let proposal = InterviewSlotProposal {
            id: next_proposal_id(),
            application,
            interviewer,
            windows,
            status: ProposalStatus::Proposed,
            chosen: None,
            created_at: now,
            expires_at,
        };
        self.repository.insert_proposal(proposal.clone())?;

        info!(
            proposal = %proposal.id.0,
            application = %proposal.application.0,
            interviewer = %proposal.interviewer.0,
            windows = proposal.windows.len(),
            "interview slots proposed"
        );

        Ok(proposal)
    }

    pub fn confirm(
        &self,
        proposal_id: &ProposalId,
        chosen: TimeWindow,
    ) -> Result<Interview, SchedulingError> {
        self.confirm_at(proposal_id, chosen, Utc::now())
    }

    pub fn confirm_at(
        &self,
        proposal_id: &ProposalId,
        chosen: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Interview, SchedulingError> {
        let interviewer = self.proposal(proposal_id)?.interviewer;

        let lock = self.locks.lock_for(&interviewer);
        let _guard = lock.lock().expect("interviewer lock poisoned");

        // Re-read under the lock; a racing confirm may have changed it.
        let mut proposal = self.proposal(proposal_id)?;

        if !proposal.is_open() {
            return Err(SchedulingError::InvalidSlot(format!(
                "proposal {} is {}",
                proposal_id.0,
                proposal.status.label()
            )));
        }

        if proposal.has_lapsed(now) {
            proposal.status = ProposalStatus::Expired;
            self.repository.update_proposal(proposal)?;
            return Err(SchedulingError::InvalidSlot(format!(
                "proposal {} expired",
                proposal_id.0
            )));
        }

        if !proposal.offers(&chosen) {
            return Err(SchedulingError::InvalidSlot(format!(
                "window starting {} was not offered by proposal {}",
                chosen.start, proposal_id.0
            )));
        }

        let conflict = self
            .repository
            .interviews_for(&interviewer)?
            .into_iter()
            .any(|interview| interview.window.overlaps(&chosen));
        if conflict {
            proposal.status = ProposalStatus::Expired;
            self.repository.update_proposal(proposal)?;
            warn!(
                proposal = %proposal_id.0,
                interviewer = %interviewer.0,
                start = %chosen.start,
                "slot taken since proposal, proposal expired"
            );
            return Err(SchedulingError::SlotConflict {
                interviewer: interviewer.0,
                start: chosen.start,
            });
        }

        let interview = Interview {
            id: next_interview_id(),
            proposal: proposal.id.clone(),
            application: proposal.application.clone(),
            interviewer: interviewer.clone(),
            window: chosen,
            confirmed_at: now,
        };
        self.repository.insert_interview(interview.clone())?;

        proposal.status = ProposalStatus::Confirmed;
        proposal.chosen = Some(chosen);
        self.repository.update_proposal(proposal)?;

        info!(
            interview = %interview.id.0,
            proposal = %proposal_id.0,
            interviewer = %interviewer.0,
            start = %chosen.start,
            "interview confirmed"
        );

        Ok(interview)
    }

    pub fn proposal(&self, id: &ProposalId) -> Result<InterviewSlotProposal, SchedulingError> {
        self.repository
            .fetch_proposal(id)?
            .ok_or_else(|| SchedulingError::ProposalNotFound(id.0.clone()))
    }

    /// Move open proposals past their TTL to `expired`. Returns how many lapsed.
    pub fn expire_stale(&self, now: DateTime<Utc>) -> Result<usize, SchedulingError> {
        let mut expired = 0;
        for proposal in self.repository.open_proposals()? {
            if !proposal.has_lapsed(now) {
                continue;
            }

            let lock = self.locks.lock_for(&proposal.interviewer);
            let _guard = lock.lock().expect("interviewer lock poisoned");

            let mut current = self.proposal(&proposal.id)?;
            if current.is_open() && current.has_lapsed(now) {
                current.status = ProposalStatus::Expired;
                self.repository.update_proposal(current)?;
                expired += 1;
            }
        }

        if expired > 0 {
            info!(expired, "stale interview proposals expired");
        }
        Ok(expired)
    }

    /// Interviews starting within the next `days`, ordered by start.
    pub fn upcoming(
        &self,
        interviewer: Option<&InterviewerId>,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Interview>, SchedulingError> {
        if days > MAX_HORIZON_DAYS {
            return Err(SchedulingError::InvalidRequest(format!(
                "look-ahead is limited to {MAX_HORIZON_DAYS} days, got {days}"
            )));
        }
        let until = offset(now, chrono::Duration::days(i64::from(days)))?;
        let mut interviews: Vec<Interview> = self
            .repository
            .interviews_between(now, until)?
            .into_iter()
            .filter(|interview| interviewer.map_or(true, |id| &interview.interviewer == id))
            .collect();
        interviews.sort_by(|left, right| {
            left.window
                .start
                .cmp(&right.window.start)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(interviews)
    }
}

fn offset(now: DateTime<Utc>, span: chrono::Duration) -> Result<DateTime<Utc>, SchedulingError> {
    now.checked_add_signed(span).ok_or_else(|| {
        SchedulingError::InvalidRequest(format!("{now} plus {span} is out of range"))
    })
}
