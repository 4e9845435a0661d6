use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{Application, ApplicationId, InvalidTransition, OutreachRecord, PipelineStage};
use super::events::{PipelineEvent, PipelineEventKind, PipelineEventPublisher};
use super::report::FunnelReport;
use super::repository::{PipelineRepository, RepositoryError};
use crate::workflows::locks::KeyedLocks;
use crate::workflows::matching::{
    CandidateId, CandidateProfile, FitScoreEngine, FitScoreResult, FlagTag, JobId,
    JobRequirement,
};

/// Service composing the scoring engine, pipeline repository, and event publisher.
pub struct PipelineService<R, E> {
    repository: Arc<R>,
    events: Arc<E>,
    engine: Arc<FitScoreEngine>,
    applications: KeyedLocks<ApplicationId, Mutex<()>>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("requisition {0} is not registered")]
    RequisitionNotFound(String),
    #[error("application {0} not found")]
    ApplicationNotFound(String),
    #[error("profile {profile} does not belong to application {application}")]
    CandidateMismatch {
        application: String,
        profile: String,
    },
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("reply at {replied_at} precedes the message sent at {sent_at}")]
    ReplyBeforeSend {
        sent_at: DateTime<Utc>,
        replied_at: DateTime<Utc>,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Active application ranked by its latest FitScore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub application_id: ApplicationId,
    pub candidate_id: CandidateId,
    pub stage: PipelineStage,
    pub overall: f64,
    pub red_flags: Vec<FlagTag>,
}

impl<R, E> PipelineService<R, E>
where
    R: PipelineRepository + 'static,
    E: PipelineEventPublisher + 'static,
{
    pub fn new(repository: Arc<R>, events: Arc<E>, engine: Arc<FitScoreEngine>) -> Self {
        Self {
            repository,
            events,
            engine,
            applications: KeyedLocks::new(),
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn engine(&self) -> &FitScoreEngine {
        &self.engine
    }

    /// Register a requirement. Re-publishing an existing id stores the next version instead
    /// of overwriting the one earlier scores were computed against.
    pub fn publish_requirement(
        &self,
        requirement: JobRequirement,
    ) -> Result<JobRequirement, PipelineError> {
        let stored = match self.repository.requirement(&requirement.id)? {
            Some(existing) => JobRequirement {
                version: existing.version.saturating_add(1),
                ..requirement
            },
            None => requirement,
        };
        self.repository.save_requirement(stored.clone())?;
        info!(
            requisition = %stored.id.0,
            version = stored.version,
            "job requirement published"
        );
        Ok(stored)
    }

    pub fn submit_application(
        &self,
        requisition: &JobId,
        candidate: CandidateId,
        applied_at: DateTime<Utc>,
    ) -> Result<Application, PipelineError> {
        self.require_requisition(requisition)?;

        let application = Application::new(
            next_application_id(),
            requisition.clone(),
            candidate,
            applied_at,
        );
        let application = self.repository.insert_application(application)?;

        self.notify(PipelineEvent {
            requisition: requisition.clone(),
            kind: PipelineEventKind::ApplicationReceived {
                application: application.id.clone(),
            },
            at: applied_at,
        });

        Ok(application)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<Application, PipelineError> {
        self.repository
            .fetch_application(id)?
            .ok_or_else(|| PipelineError::ApplicationNotFound(id.0.clone()))
    }

    /// Score the application's candidate against the current requirement and record it.
    pub fn score_application(
        &self,
        id: &ApplicationId,
        profile: &CandidateProfile,
        now: DateTime<Utc>,
    ) -> Result<FitScoreResult, PipelineError> {
        let application = self.get(id)?;
        if application.candidate != profile.id {
            return Err(PipelineError::CandidateMismatch {
                application: id.0.clone(),
                profile: profile.id.0.clone(),
            });
        }
        let requirement = self.require_requisition(&application.requisition)?;

        let result = self.engine.score_as_of(&requirement, profile, now);
        self.record_score(result.clone())?;
        Ok(result)
    }

    pub fn record_score(&self, result: FitScoreResult) -> Result<(), PipelineError> {
        let event = PipelineEvent {
            requisition: result.job_id.clone(),
            kind: PipelineEventKind::ScoreRecorded {
                candidate: result.candidate_id.clone(),
            },
            at: result.generated_at,
        };
        self.repository.record_score(result)?;
        self.notify(event);
        Ok(())
    }

    pub fn move_stage(
        &self,
        id: &ApplicationId,
        to: PipelineStage,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Application, PipelineError> {
        let lock = self.applications.lock_for(id);
        let guard = lock.lock().expect("application lock poisoned");
        let mut application = self.get(id)?;
        let transition = application.transition(to, actor, at)?;
        self.repository.update_application(application.clone())?;
        drop(guard);

        info!(
            application = %id.0,
            requisition = %application.requisition.0,
            from = transition.from.label(),
            to = transition.to.label(),
            actor,
            "application stage changed"
        );

        self.notify(PipelineEvent {
            requisition: application.requisition.clone(),
            kind: PipelineEventKind::StageChanged {
                application: id.clone(),
                from: transition.from,
                to: transition.to,
            },
            at,
        });

        Ok(application)
    }

    /// Log an outreach message (and its reply, if any) against a registered requisition.
    pub fn record_outreach(&self, record: OutreachRecord) -> Result<OutreachRecord, PipelineError> {
        self.require_requisition(&record.requisition)?;
        if let Some(replied_at) = record.replied_at.filter(|reply| *reply < record.sent_at) {
            return Err(PipelineError::ReplyBeforeSend {
                sent_at: record.sent_at,
                replied_at,
            });
        }
        self.repository.record_outreach(record.clone())?;

        self.notify(PipelineEvent {
            requisition: record.requisition.clone(),
            kind: PipelineEventKind::OutreachRecorded {
                candidate: record.candidate.clone(),
                replied: record.replied_at.is_some(),
            },
            at: record.replied_at.unwrap_or(record.sent_at),
        });

        Ok(record)
    }

    pub fn top_candidates(
        &self,
        requisition: &JobId,
        limit: usize,
    ) -> Result<Vec<RankedCandidate>, PipelineError> {
        self.require_requisition(requisition)?;

        let mut ranked = Vec::new();
        for application in self.repository.applications_for(requisition)? {
            if !application.stage.is_active() {
                continue;
            }
            if let Some(score) = self
                .repository
                .latest_score(requisition, &application.candidate)?
            {
                ranked.push(RankedCandidate {
                    application_id: application.id,
                    candidate_id: application.candidate,
                    stage: application.stage,
                    overall: score.overall,
                    red_flags: score.red_flags,
                });
            }
        }

        ranked.sort_by(|left, right| {
            right
                .overall
                .total_cmp(&left.overall)
                .then_with(|| left.application_id.cmp(&right.application_id))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    pub fn funnel(&self, requisition: &JobId) -> Result<FunnelReport, PipelineError> {
        self.require_requisition(requisition)?;
        let applications = self.repository.applications_for(requisition)?;
        Ok(FunnelReport::from_applications(
            requisition.clone(),
            &applications,
        ))
    }

    fn require_requisition(&self, requisition: &JobId) -> Result<JobRequirement, PipelineError> {
        self.repository
            .requirement(requisition)?
            .ok_or_else(|| PipelineError::RequisitionNotFound(requisition.0.clone()))
    }

    /// Health re-evaluation is best effort; a lost event is picked up by the next sweep.
    fn notify(&self, event: PipelineEvent) {
        let requisition = event.requisition.0.clone();
        let kind = event.kind.label();
        if let Err(error) = self.events.publish(event) {
            warn!(requisition = %requisition, kind, error = %error, "pipeline event not delivered");
        }
    }
}
