use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use recruit_ai::config::{ConfigError, EngineSettings};
use recruit_ai::infra::{
    InMemoryCampaignLauncher, InMemoryCampaignStore, InMemoryPipelineRepository,
    InMemorySchedulingRepository, StaticAvailability,
};
use recruit_ai::workflows::matching::FitScoreEngine;
use recruit_ai::workflows::pipeline::{
    DispatcherHandle, HealthDispatcher, PipelineHealthMonitor, PipelineService, SourcingTrigger,
};
use recruit_ai::workflows::scheduling::InterviewScheduler;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Pipeline = PipelineService<InMemoryPipelineRepository, DispatcherHandle>;
pub(crate) type Monitor = PipelineHealthMonitor<
    InMemoryPipelineRepository,
    InMemoryCampaignStore,
    InMemoryCampaignLauncher,
>;
pub(crate) type Dispatcher =
    HealthDispatcher<InMemoryPipelineRepository, InMemoryCampaignStore, InMemoryCampaignLauncher>;
pub(crate) type Scheduler = InterviewScheduler<InMemorySchedulingRepository, StaticAvailability>;

/// Every workflow wired to the in-memory adapters, sharing one pipeline store.
pub(crate) struct Workflows {
    pub(crate) engine: Arc<FitScoreEngine>,
    pub(crate) pipeline: Arc<Pipeline>,
    pub(crate) monitor: Arc<Monitor>,
    pub(crate) scheduler: Arc<Scheduler>,
    pub(crate) repository: Arc<InMemoryPipelineRepository>,
    pub(crate) launcher: Arc<InMemoryCampaignLauncher>,
    pub(crate) availability: Arc<StaticAvailability>,
}

impl Workflows {
    /// Build the workflows and the dispatcher that must be spawned to keep health current.
    pub(crate) fn build(settings: &EngineSettings) -> Result<(Self, Dispatcher), ConfigError> {
        settings.validate()?;

        let engine = Arc::new(FitScoreEngine::new(
            settings.scoring.clone(),
            settings.red_flags.clone(),
            settings.load_synonyms()?,
        )?);

        let repository = Arc::new(InMemoryPipelineRepository::default());
        let launcher = Arc::new(InMemoryCampaignLauncher::default());
        let trigger = Arc::new(SourcingTrigger::new(
            Arc::new(InMemoryCampaignStore::default()),
            launcher.clone(),
            settings.retry.clone(),
        ));
        let monitor = Arc::new(PipelineHealthMonitor::new(
            repository.clone(),
            trigger,
            settings.health.clone(),
        ));
        let (events, dispatcher) = HealthDispatcher::channel(monitor.clone());
        let pipeline = Arc::new(PipelineService::new(
            repository.clone(),
            Arc::new(events),
            engine.clone(),
        ));

        let availability = Arc::new(StaticAvailability::default());
        let scheduler = Arc::new(InterviewScheduler::new(
            Arc::new(InMemorySchedulingRepository::default()),
            availability.clone(),
            settings.scheduling.clone(),
            settings.retry.clone(),
        ));

        Ok((
            Self {
                engine,
                pipeline,
                monitor,
                scheduler,
                repository,
                launcher,
                availability,
            },
            dispatcher,
        ))
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
