//! In-memory adapters for every storage and collaborator seam. Used by the demo, the
//! `serve` command until a database is wired in, and the test suites.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::info;

use crate::workflows::matching::{CandidateId, FitScoreResult, JobId, JobRequirement};
use crate::workflows::pipeline::{
    Application, ApplicationId, CampaignAction, CampaignLauncher, CampaignStore,
    CampaignTransition, EventError, HealthSnapshot, OutreachRecord, OutreachStats, PipelineEvent,
    PipelineEventPublisher, PipelineRepository, RepositoryError,
};
use crate::workflows::retry::CollaboratorError;
use crate::workflows::scheduling::{
    AvailabilitySource, Interview, InterviewSlotProposal, InterviewerId, ProposalId,
    SchedulingRepository, TimeWindow,
};

#[derive(Default)]
struct PipelineTables {
    requirements: BTreeMap<JobId, JobRequirement>,
    applications: BTreeMap<ApplicationId, Application>,
    scores: Vec<FitScoreResult>,
    outreach: Vec<OutreachRecord>,
    snapshots: Vec<HealthSnapshot>,
}

#[derive(Default, Clone)]
pub struct InMemoryPipelineRepository {
    tables: Arc<Mutex<PipelineTables>>,
}

impl PipelineRepository for InMemoryPipelineRepository {
    fn save_requirement(&self, requirement: JobRequirement) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        guard.requirements.insert(requirement.id.clone(), requirement);
        Ok(())
    }

    fn requirement(&self, id: &JobId) -> Result<Option<JobRequirement>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.requirements.get(id).cloned())
    }

    fn requisitions(&self) -> Result<Vec<JobId>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.requirements.keys().cloned().collect())
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        if guard.applications.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        match guard.applications.get_mut(&application.id) {
            Some(existing) => {
                *existing = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.applications.get(id).cloned())
    }

    fn applications_for(&self, requisition: &JobId) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard
            .applications
            .values()
            .filter(|application| &application.requisition == requisition)
            .cloned()
            .collect())
    }

    fn record_score(&self, result: FitScoreResult) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        guard.scores.push(result);
        Ok(())
    }

    fn latest_score(
        &self,
        job: &JobId,
        candidate: &CandidateId,
    ) -> Result<Option<FitScoreResult>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard
            .scores
            .iter()
            .filter(|score| &score.job_id == job && &score.candidate_id == candidate)
            .max_by_key(|score| score.generated_at)
            .cloned())
    }

    fn record_outreach(&self, record: OutreachRecord) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        guard.outreach.push(record);
        Ok(())
    }

    fn outreach_stats(
        &self,
        requisition: &JobId,
        since: DateTime<Utc>,
    ) -> Result<OutreachStats, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        let mut stats = OutreachStats::default();
        for record in guard
            .outreach
            .iter()
            .filter(|record| &record.requisition == requisition)
        {
            if record.sent_at >= since {
                stats.sent += 1;
            }
            if record.replied_at.is_some_and(|replied| replied >= since) {
                stats.replied += 1;
            }
        }
        Ok(stats)
    }

    fn append_snapshot(&self, snapshot: HealthSnapshot) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        guard.snapshots.push(snapshot);
        Ok(())
    }

    fn snapshots(&self, requisition: &JobId) -> Result<Vec<HealthSnapshot>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard
            .snapshots
            .iter()
            .filter(|snapshot| &snapshot.requisition == requisition)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct CampaignTables {
    active: HashMap<JobId, bool>,
    log: Vec<CampaignTransition>,
}

#[derive(Default, Clone)]
pub struct InMemoryCampaignStore {
    tables: Arc<Mutex<CampaignTables>>,
}

impl CampaignStore for InMemoryCampaignStore {
    fn is_active(&self, requisition: &JobId) -> Result<bool, RepositoryError> {
        let guard = self.tables.lock().expect("campaign mutex poisoned");
        Ok(guard.active.get(requisition).copied().unwrap_or(false))
    }

    fn record_transition(&self, transition: CampaignTransition) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("campaign mutex poisoned");
        let active = transition.action == CampaignAction::Started;
        guard.active.insert(transition.requisition.clone(), active);
        guard.log.push(transition);
        Ok(())
    }

    fn transitions(&self, requisition: &JobId) -> Result<Vec<CampaignTransition>, RepositoryError> {
        let guard = self.tables.lock().expect("campaign mutex poisoned");
        Ok(guard
            .log
            .iter()
            .filter(|transition| &transition.requisition == requisition)
            .cloned()
            .collect())
    }
}

/// Launcher that records calls instead of reaching a sourcing vendor.
#[derive(Default, Clone)]
pub struct InMemoryCampaignLauncher {
    calls: Arc<Mutex<Vec<(JobId, bool)>>>,
    outages: Arc<AtomicU32>,
}

impl InMemoryCampaignLauncher {
    /// Fail the next `count` calls with a retryable outage.
    pub fn fail_next(&self, count: u32) {
        self.outages.store(count, Ordering::SeqCst);
    }

    pub fn starts(&self) -> Vec<JobId> {
        self.calls_where(true)
    }

    pub fn stops(&self) -> Vec<JobId> {
        self.calls_where(false)
    }

    fn calls_where(&self, started: bool) -> Vec<JobId> {
        self.calls
            .lock()
            .expect("launcher mutex poisoned")
            .iter()
            .filter(|(_, start)| *start == started)
            .map(|(requisition, _)| requisition.clone())
            .collect()
    }

    fn take_outage(&self) -> bool {
        self.outages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }

    fn record(
        &self,
        operation: &str,
        requisition: &JobId,
        start: bool,
    ) -> Result<(), CollaboratorError> {
        if self.take_outage() {
            return Err(CollaboratorError::unavailable(
                operation,
                "sourcing vendor unavailable",
            ));
        }
        info!(requisition = %requisition.0, operation, "sourcing vendor call");
        self.calls
            .lock()
            .expect("launcher mutex poisoned")
            .push((requisition.clone(), start));
        Ok(())
    }
}

#[async_trait]
impl CampaignLauncher for InMemoryCampaignLauncher {
    async fn start_campaign(&self, requisition: &JobId) -> Result<(), CollaboratorError> {
        self.record("sourcing.start_campaign", requisition, true)
    }

    async fn stop_campaign(&self, requisition: &JobId) -> Result<(), CollaboratorError> {
        self.record("sourcing.stop_campaign", requisition, false)
    }
}

/// Event sink that keeps everything it is handed.
#[derive(Default, Clone)]
pub struct InMemoryEventLog {
    events: Arc<Mutex<Vec<PipelineEvent>>>,
}

impl InMemoryEventLog {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl PipelineEventPublisher for InMemoryEventLog {
    fn publish(&self, event: PipelineEvent) -> Result<(), EventError> {
        self.events.lock().expect("event mutex poisoned").push(event);
        Ok(())
    }
}

#[derive(Default)]
struct SchedulingTables {
    proposals: BTreeMap<ProposalId, InterviewSlotProposal>,
    interviews: Vec<Interview>,
}

#[derive(Default, Clone)]
pub struct InMemorySchedulingRepository {
    tables: Arc<Mutex<SchedulingTables>>,
}

impl SchedulingRepository for InMemorySchedulingRepository {
    fn insert_proposal(&self, proposal: InterviewSlotProposal) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("scheduling mutex poisoned");
        if guard.proposals.contains_key(&proposal.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.proposals.insert(proposal.id.clone(), proposal);
        Ok(())
    }

    fn update_proposal(&self, proposal: InterviewSlotProposal) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("scheduling mutex poisoned");
        match guard.proposals.get_mut(&proposal.id) {
            Some(existing) => {
                *existing = proposal;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_proposal(
        &self,
        id: &ProposalId,
    ) -> Result<Option<InterviewSlotProposal>, RepositoryError> {
        let guard = self.tables.lock().expect("scheduling mutex poisoned");
        Ok(guard.proposals.get(id).cloned())
    }

    fn open_proposals(&self) -> Result<Vec<InterviewSlotProposal>, RepositoryError> {
        let guard = self.tables.lock().expect("scheduling mutex poisoned");
        Ok(guard
            .proposals
            .values()
            .filter(|proposal| proposal.is_open())
            .cloned()
            .collect())
    }

    fn insert_interview(&self, interview: Interview) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("scheduling mutex poisoned");
        guard.interviews.push(interview);
        Ok(())
    }

    fn interviews_for(
        &self,
        interviewer: &InterviewerId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        let guard = self.tables.lock().expect("scheduling mutex poisoned");
        Ok(guard
            .interviews
            .iter()
            .filter(|interview| &interview.interviewer == interviewer)
            .cloned()
            .collect())
    }

    fn interviews_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Interview>, RepositoryError> {
        let guard = self.tables.lock().expect("scheduling mutex poisoned");
        Ok(guard
            .interviews
            .iter()
            .filter(|interview| interview.window.start >= from && interview.window.start < to)
            .cloned()
            .collect())
    }
}

/// Calendar stand-in serving fixed free blocks per interviewer.
#[derive(Default, Clone)]
pub struct StaticAvailability {
    blocks: Arc<Mutex<HashMap<InterviewerId, Vec<TimeWindow>>>>,
    outages: Arc<AtomicU32>,
}

impl StaticAvailability {
    pub fn set_blocks(&self, interviewer: InterviewerId, blocks: Vec<TimeWindow>) {
        self.blocks
            .lock()
            .expect("availability mutex poisoned")
            .insert(interviewer, blocks);
    }

    /// Weekday blocks between `start_hour` and `end_hour` UTC for `days` days from `first_day`.
    pub fn set_working_hours(
        &self,
        interviewer: InterviewerId,
        first_day: NaiveDate,
        days: u32,
        start_hour: u32,
        end_hour: u32,
    ) {
        use chrono::Datelike;

        let blocks = first_day
            .iter_days()
            .take(days as usize)
            .filter(|day| day.weekday().number_from_monday() <= 5)
            .filter_map(|day| {
                let start = day.and_hms_opt(start_hour, 0, 0)?;
                let end = day.and_hms_opt(end_hour, 0, 0)?;
                Some(TimeWindow::new(
                    Utc.from_utc_datetime(&start),
                    Utc.from_utc_datetime(&end),
                ))
            })
            .collect();
        self.set_blocks(interviewer, blocks);
    }

    /// Fail the next `count` lookups with a retryable outage.
    pub fn fail_next(&self, count: u32) {
        self.outages.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl AvailabilitySource for StaticAvailability {
    async fn availability(
        &self,
        interviewer: &InterviewerId,
        _horizon_days: u32,
    ) -> Result<Vec<TimeWindow>, CollaboratorError> {
        let outage = self
            .outages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok();
        if outage {
            return Err(CollaboratorError::unavailable(
                "calendar.availability",
                "calendar provider unavailable",
            ));
        }

        let guard = self.blocks.lock().expect("availability mutex poisoned");
        Ok(guard.get(interviewer).cloned().unwrap_or_default())
    }
}
