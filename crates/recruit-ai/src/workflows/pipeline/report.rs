use serde::Serialize;

use super::domain::{Application, PipelineStage};
use crate::workflows::matching::JobId;

/// Per-stage reach and conversion for one requisition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelReport {
    pub requisition: JobId,
    pub total: usize,
    pub rejected: usize,
    pub stages: Vec<FunnelStage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub stage: PipelineStage,
    /// Applications currently sitting in this stage.
    pub current: usize,
    /// Applications that reached this stage at some point, including ones rejected later.
    pub reached: usize,
    /// `reached` over the previous stage's `reached`; `None` for the first stage or an empty one.
    pub conversion: Option<f64>,
}

impl FunnelReport {
    pub fn from_applications(requisition: JobId, applications: &[Application]) -> Self {
        let mut stages = Vec::with_capacity(PipelineStage::FUNNEL.len());
        let mut previous_reached: Option<usize> = None;

        for stage in PipelineStage::FUNNEL {
            let current = applications
                .iter()
                .filter(|application| application.stage == stage)
                .count();
            let reached = applications
                .iter()
                .filter(|application| application.furthest_stage().has_reached(stage))
                .count();
            let conversion = match previous_reached {
                Some(previous) if previous > 0 => Some(reached as f64 / previous as f64),
                _ => None,
            };

            stages.push(FunnelStage {
                stage,
                current,
                reached,
                conversion,
            });
            previous_reached = Some(reached);
        }

        let rejected = applications
            .iter()
            .filter(|application| application.stage == PipelineStage::Rejected)
            .count();

        Self {
            requisition,
            total: applications.len(),
            rejected,
            stages,
        }
    }

    pub fn stage(&self, stage: PipelineStage) -> Option<&FunnelStage> {
        self.stages.iter().find(|entry| entry.stage == stage)
    }
}
