use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::events::{EventError, PipelineEvent, PipelineEventPublisher};
use super::monitor::PipelineHealthMonitor;
use super::repository::{CampaignLauncher, CampaignStore, PipelineRepository};
use crate::workflows::matching::JobId;

const DEFAULT_CAPACITY: usize = 256;

/// Sending half handed to whatever mutates the pipeline.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    sender: mpsc::Sender<PipelineEvent>,
}

impl PipelineEventPublisher for DispatcherHandle {
    fn publish(&self, event: PipelineEvent) -> Result<(), EventError> {
        match self.sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                debug!(
                    requisition = %event.requisition.0,
                    kind = event.kind.label(),
                    "health dispatcher saturated, leaving event to the sweep"
                );
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(EventError::ChannelClosed),
        }
    }
}

/// Background task driving health evaluations from pipeline events and a periodic sweep.
///
/// Events are throttled per requisition on the leading edge: the first event evaluates
/// immediately, later ones inside the debounce interval are dropped and left to the sweep.
pub struct HealthDispatcher<R, C, L> {
    monitor: Arc<PipelineHealthMonitor<R, C, L>>,
    receiver: mpsc::Receiver<PipelineEvent>,
    debounce: Duration,
    sweep_interval: Duration,
    last_run: HashMap<JobId, Instant>,
}

impl<R, C, L> HealthDispatcher<R, C, L>
where
    R: PipelineRepository + 'static,
    C: CampaignStore + 'static,
    L: CampaignLauncher + 'static,
{
    pub fn channel(monitor: Arc<PipelineHealthMonitor<R, C, L>>) -> (DispatcherHandle, Self) {
        Self::with_capacity(monitor, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(
        monitor: Arc<PipelineHealthMonitor<R, C, L>>,
        capacity: usize,
    ) -> (DispatcherHandle, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let debounce = monitor.config().debounce;
        let sweep_interval = monitor.config().sweep_interval;
        let dispatcher = Self {
            monitor,
            receiver,
            debounce,
            sweep_interval,
            last_run: HashMap::new(),
        };
        (DispatcherHandle { sender }, dispatcher)
    }

    /// Runs until every handle is dropped.
    pub async fn run(mut self) {
        let mut sweep = interval_at(Instant::now() + self.sweep_interval, self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = self.receiver.recv() => match event {
                    Some(event) => {
                        self.handle_event(event).await;
                    }
                    None => break,
                },
                _ = sweep.tick() => {
                    self.sweep().await;
                }
            }
        }

        debug!("health dispatcher stopped");
    }

    /// Evaluate the event's requisition unless it ran within the debounce interval.
    /// Returns whether an evaluation happened.
    pub async fn handle_event(&mut self, event: PipelineEvent) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_run.get(&event.requisition) {
            if now.duration_since(*last) < self.debounce {
                debug!(
                    requisition = %event.requisition.0,
                    kind = event.kind.label(),
                    "health evaluation debounced"
                );
                return false;
            }
        }

        self.last_run.insert(event.requisition.clone(), now);
        self.evaluate(&event.requisition).await
    }

    /// Evaluate every registered requisition. Returns how many evaluations succeeded.
    pub async fn sweep(&mut self) -> usize {
        let requisitions = match self.monitor.repository().requisitions() {
            Ok(requisitions) => requisitions,
            Err(error) => {
                warn!(error = %error, "health sweep could not list requisitions");
                return 0;
            }
        };

        let mut evaluated = 0;
        for requisition in requisitions {
            self.last_run.insert(requisition.clone(), Instant::now());
            if self.evaluate(&requisition).await {
                evaluated += 1;
            }
        }
        evaluated
    }

    async fn evaluate(&self, requisition: &JobId) -> bool {
        match self.monitor.evaluate(requisition).await {
            Ok(_) => true,
            Err(error) => {
                warn!(
                    requisition = %requisition.0,
                    error = %error,
                    "health evaluation failed"
                );
                false
            }
        }
    }
}
