use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

use super::domain::Application;
use super::health::{assess_risks, next_actions, HealthConfig, HealthInputs, HealthSnapshot};
use super::repository::{CampaignLauncher, CampaignStore, PipelineRepository, RepositoryError};
use super::sourcing::{SourcingError, SourcingTrigger};
use crate::workflows::locks::KeyedLocks;
use crate::workflows::matching::JobId;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("requisition {0} is not registered")]
    RequisitionNotFound(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Sourcing(#[from] SourcingError),
}

/// Recomputes requisition health and hands the decision to the sourcing trigger.
///
/// Evaluations of one requisition run one at a time; different requisitions proceed in parallel.
pub struct PipelineHealthMonitor<R, C, L> {
    repository: Arc<R>,
    trigger: Arc<SourcingTrigger<C, L>>,
    config: HealthConfig,
    locks: KeyedLocks<JobId, Mutex<()>>,
}

impl<R, C, L> PipelineHealthMonitor<R, C, L>
where
    R: PipelineRepository + 'static,
    C: CampaignStore + 'static,
    L: CampaignLauncher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        trigger: Arc<SourcingTrigger<C, L>>,
        config: HealthConfig,
    ) -> Self {
        Self {
            repository,
            trigger,
            config,
            locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn trigger(&self) -> &Arc<SourcingTrigger<C, L>> {
        &self.trigger
    }

    pub async fn evaluate(&self, requisition: &JobId) -> Result<HealthSnapshot, MonitorError> {
        self.evaluate_at(requisition, Utc::now()).await
    }

    pub async fn evaluate_at(
        &self,
        requisition: &JobId,
        now: DateTime<Utc>,
    ) -> Result<HealthSnapshot, MonitorError> {
        let lock = self.locks.lock_for(requisition);
        let _guard = lock.lock().await;

        if self.repository.requirement(requisition)?.is_none() {
            return Err(MonitorError::RequisitionNotFound(requisition.0.clone()));
        }

        let inputs = self.measure(requisition, now)?;
        let reply_rate = inputs.outreach.reply_rate();
        let health = self
            .config
            .composite(inputs.qualified, inputs.new_applications, reply_rate);
        let campaign_active = self.trigger.is_active(requisition)?;
        let decision = self.config.decide(health, inputs.qualified, campaign_active);

        let reason = format!(
            "health {:.1}% with {} qualified of {} targeted",
            health * 100.0,
            inputs.qualified,
            self.config.qualified_target
        );
        let sourcing = self
            .trigger
            .apply(decision, requisition, &reason, now)
            .await?;

        let risks = assess_risks(&self.config, &inputs, health);
        let snapshot = HealthSnapshot {
            requisition: requisition.clone(),
            qualified_count: inputs.qualified,
            new_applications: inputs.new_applications,
            outreach: inputs.outreach,
            reply_rate,
            health,
            health_percent: health * 100.0,
            decision,
            sourcing,
            stage_distribution: inputs.stage_distribution,
            next_actions: next_actions(&risks),
            risks,
            taken_at: now,
        };
        self.repository.append_snapshot(snapshot.clone())?;

        info!(
            requisition = %requisition.0,
            health = snapshot.health_percent,
            qualified = snapshot.qualified_count,
            new_applications = snapshot.new_applications,
            reply_rate,
            decision = decision.label(),
            sourcing = sourcing.label(),
            "pipeline health evaluated"
        );

        Ok(snapshot)
    }

    pub fn snapshots(&self, requisition: &JobId) -> Result<Vec<HealthSnapshot>, MonitorError> {
        Ok(self.repository.snapshots(requisition)?)
    }

    fn measure(
        &self,
        requisition: &JobId,
        now: DateTime<Utc>,
    ) -> Result<HealthInputs, MonitorError> {
        let applications = self.repository.applications_for(requisition)?;

        let mut qualified = 0;
        for application in applications.iter().filter(|app| app.stage.is_active()) {
            if self.is_qualified(requisition, application)? {
                qualified += 1;
            }
        }

        let inflow_since = now - self.config.new_application_window;
        let new_applications = applications
            .iter()
            .filter(|app| app.applied_at >= inflow_since && app.applied_at <= now)
            .count();

        let mut stage_distribution = BTreeMap::new();
        for application in &applications {
            *stage_distribution
                .entry(application.stage.label().to_string())
                .or_insert(0) += 1;
        }

        let outreach = self
            .repository
            .outreach_stats(requisition, now - self.config.reply_window)?;

        Ok(HealthInputs {
            qualified,
            new_applications: u32::try_from(new_applications).unwrap_or(u32::MAX),
            outreach,
            stage_distribution,
        })
    }

    fn is_qualified(
        &self,
        requisition: &JobId,
        application: &Application,
    ) -> Result<bool, MonitorError> {
        let latest = self
            .repository
            .latest_score(requisition, &application.candidate)?;
        Ok(latest
            .map(|score| score.is_qualified(self.config.qualification_threshold))
            .unwrap_or(false))
    }
}
