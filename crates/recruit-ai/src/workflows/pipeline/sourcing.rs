use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::health::SourcingDecision;
use super::repository::{
    CampaignAction, CampaignLauncher, CampaignStore, CampaignTransition, RepositoryError,
};
use crate::workflows::locks::KeyedLocks;
use crate::workflows::matching::JobId;
use crate::workflows::retry::{CollaboratorError, RetryPolicy};

/// Actor recorded on every automated campaign transition.
pub const HEALTH_MONITOR_ACTOR: &str = "system:health-monitor";

/// What `apply` actually did with a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcingOutcome {
    Started,
    Stopped,
    AlreadyActive,
    AlreadyInactive,
    Unchanged,
}

impl SourcingOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::AlreadyActive => "already_active",
            Self::AlreadyInactive => "already_inactive",
            Self::Unchanged => "unchanged",
        }
    }

    pub const fn changed_state(self) -> bool {
        matches!(self, Self::Started | Self::Stopped)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourcingError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Idempotent owner of the per-requisition campaign flag.
///
/// Start while active and stop while inactive are no-ops. Calls for one requisition are
/// serialized so two racing starts cannot both launch a campaign.
pub struct SourcingTrigger<C, L> {
    store: Arc<C>,
    launcher: Arc<L>,
    retry: RetryPolicy,
    locks: KeyedLocks<JobId, Mutex<()>>,
}

impl<C, L> SourcingTrigger<C, L>
where
    C: CampaignStore + 'static,
    L: CampaignLauncher + 'static,
{
    pub fn new(store: Arc<C>, launcher: Arc<L>, retry: RetryPolicy) -> Self {
        Self {
            store,
            launcher,
            retry,
            locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<C> {
        &self.store
    }

    pub fn is_active(&self, requisition: &JobId) -> Result<bool, SourcingError> {
        Ok(self.store.is_active(requisition)?)
    }

    pub async fn apply(
        &self,
        decision: SourcingDecision,
        requisition: &JobId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<SourcingOutcome, SourcingError> {
        let action = match decision {
            SourcingDecision::StartSourcing => CampaignAction::Started,
            SourcingDecision::StopSourcing => CampaignAction::Stopped,
            SourcingDecision::NoAction => return Ok(SourcingOutcome::Unchanged),
        };

        let lock = self.locks.lock_for(requisition);
        let _guard = lock.lock().await;

        let active = self.store.is_active(requisition)?;
        match (action, active) {
            (CampaignAction::Started, true) => {
                debug!(requisition = %requisition.0, "sourcing already active, start ignored");
                return Ok(SourcingOutcome::AlreadyActive);
            }
            (CampaignAction::Stopped, false) => {
                debug!(requisition = %requisition.0, "sourcing already inactive, stop ignored");
                return Ok(SourcingOutcome::AlreadyInactive);
            }
            _ => {}
        }

        let launcher = &self.launcher;
        match action {
            CampaignAction::Started => {
                self.retry
                    .run("sourcing.start_campaign", || {
                        launcher.start_campaign(requisition)
                    })
                    .await?
            }
            CampaignAction::Stopped => {
                self.retry
                    .run("sourcing.stop_campaign", || launcher.stop_campaign(requisition))
                    .await?
            }
        }

        self.store.record_transition(CampaignTransition {
            requisition: requisition.clone(),
            action,
            actor: HEALTH_MONITOR_ACTOR.to_string(),
            reason: reason.to_string(),
            at,
        })?;

        info!(
            requisition = %requisition.0,
            action = action.label(),
            actor = HEALTH_MONITOR_ACTOR,
            reason,
            "sourcing campaign transitioned"
        );

        Ok(match action {
            CampaignAction::Started => SourcingOutcome::Started,
            CampaignAction::Stopped => SourcingOutcome::Stopped,
        })
    }
}
