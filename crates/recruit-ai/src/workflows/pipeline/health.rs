use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::OutreachStats;
use super::sourcing::SourcingOutcome;
use crate::config::{ensure_unit_interval, ConfigError};
use crate::workflows::matching::JobId;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Composite weights for qualified pool, application inflow, and reply rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthWeights {
    pub qualified: f64,
    pub new_applications: f64,
    pub reply_rate: f64,
}

impl HealthWeights {
    pub fn sum(&self) -> f64 {
        self.qualified + self.new_applications + self.reply_rate
    }
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            qualified: 0.5,
            new_applications: 0.2,
            reply_rate: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthConfig {
    pub qualification_threshold: f64,
    pub qualified_target: u32,
    pub new_application_target: u32,
    pub reply_rate_target: f64,
    pub weights: HealthWeights,
    pub low_water: f64,
    pub high_water: f64,
    pub debounce: Duration,
    pub sweep_interval: Duration,
    pub new_application_window: chrono::Duration,
    pub reply_window: chrono::Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            qualification_threshold: 0.7,
            qualified_target: 10,
            new_application_target: 5,
            reply_rate_target: 0.3,
            weights: HealthWeights::default(),
            low_water: 0.70,
            high_water: 0.80,
            debounce: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(900),
            new_application_window: chrono::Duration::hours(24),
            reply_window: chrono::Duration::days(7),
        }
    }
}

impl HealthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_unit_interval("qualification_threshold", self.qualification_threshold)?;
        ensure_unit_interval("low_water", self.low_water)?;
        ensure_unit_interval("high_water", self.high_water)?;
        if self.low_water > self.high_water {
            return Err(ConfigError::invalid(
                "low_water",
                format!(
                    "must not exceed high_water ({} > {})",
                    self.low_water, self.high_water
                ),
            ));
        }

        if !(self.reply_rate_target > 0.0 && self.reply_rate_target <= 1.0) {
            return Err(ConfigError::invalid(
                "reply_rate_target",
                "must be within (0, 1]",
            ));
        }
        if self.qualified_target == 0 {
            return Err(ConfigError::invalid("qualified_target", "must be positive"));
        }
        if self.new_application_target == 0 {
            return Err(ConfigError::invalid(
                "new_application_target",
                "must be positive",
            ));
        }

        let weights = [
            ("health.weights.qualified", self.weights.qualified),
            ("health.weights.new_applications", self.weights.new_applications),
            ("health.weights.reply_rate", self.weights.reply_rate),
        ];
        for (field, value) in weights {
            ensure_unit_interval(field, value)?;
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne {
                section: "health",
                sum,
            });
        }

        if self.sweep_interval.is_zero() {
            return Err(ConfigError::invalid("sweep_interval", "must be positive"));
        }
        let year = chrono::Duration::days(366);
        let windows = [
            ("new_application_window", self.new_application_window),
            ("reply_window", self.reply_window),
        ];
        for (field, window) in windows {
            if window <= chrono::Duration::zero() || window > year {
                return Err(ConfigError::invalid(
                    field,
                    "must be positive and at most 366 days",
                ));
            }
        }

        Ok(())
    }

    /// Weighted sum of each signal relative to its target, clamped to [0, 1].
    pub fn composite(&self, qualified: u32, new_applications: u32, reply_rate: f64) -> f64 {
        let qualified_ratio = ratio(f64::from(qualified), f64::from(self.qualified_target));
        let inflow_ratio = ratio(
            f64::from(new_applications),
            f64::from(self.new_application_target),
        );
        let reply_ratio = ratio(reply_rate, self.reply_rate_target);

        let health = qualified_ratio * self.weights.qualified
            + inflow_ratio * self.weights.new_applications
            + reply_ratio * self.weights.reply_rate;
        health.clamp(0.0, 1.0)
    }

    pub fn decide(&self, health: f64, qualified: u32, campaign_active: bool) -> SourcingDecision {
        if health < self.low_water && qualified < self.qualified_target {
            SourcingDecision::StartSourcing
        } else if health >= self.high_water && campaign_active {
            SourcingDecision::StopSourcing
        } else {
            SourcingDecision::NoAction
        }
    }
}

fn ratio(value: f64, target: f64) -> f64 {
    if target <= 0.0 {
        1.0
    } else {
        (value / target).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcingDecision {
    StartSourcing,
    StopSourcing,
    NoAction,
}

impl SourcingDecision {
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartSourcing => "start_sourcing",
            Self::StopSourcing => "stop_sourcing",
            Self::NoAction => "no_action",
        }
    }
}

/// Reviewer-facing pipeline risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthRisk {
    LowHealth,
    LowApplicationVolume,
    ScreeningBacklog,
    LowQualifiedPool,
}

impl HealthRisk {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LowHealth => "low_health",
            Self::LowApplicationVolume => "low_application_volume",
            Self::ScreeningBacklog => "screening_backlog",
            Self::LowQualifiedPool => "low_qualified_pool",
        }
    }

    pub const fn next_action(self) -> &'static str {
        match self {
            Self::LowHealth => "Start sourcing campaign for this role",
            Self::LowApplicationVolume => "Boost job distribution and referral outreach",
            Self::ScreeningBacklog => "Review and screen pending candidates",
            Self::LowQualifiedPool => "Adjust screening criteria or expand search",
        }
    }
}

/// Everything the monitor measured before deciding.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthInputs {
    pub qualified: u32,
    pub new_applications: u32,
    pub outreach: OutreachStats,
    pub stage_distribution: BTreeMap<String, u32>,
}

pub fn assess_risks(config: &HealthConfig, inputs: &HealthInputs, health: f64) -> Vec<HealthRisk> {
    let mut risks = Vec::new();

    if health < config.low_water {
        risks.push(HealthRisk::LowHealth);
    }
    if inputs.new_applications < config.new_application_target {
        risks.push(HealthRisk::LowApplicationVolume);
    }

    let count = |label: &str| inputs.stage_distribution.get(label).copied().unwrap_or(0);
    let waiting = count("new");
    if waiting > 0 && waiting > count("screening") * 2 {
        risks.push(HealthRisk::ScreeningBacklog);
    }

    if inputs.qualified < config.qualified_target {
        risks.push(HealthRisk::LowQualifiedPool);
    }

    risks
}

pub fn next_actions(risks: &[HealthRisk]) -> Vec<String> {
    let mut actions: Vec<String> = risks
        .iter()
        .map(|risk| risk.next_action().to_string())
        .collect();
    actions.push("Review outreach performance and optimize".to_string());
    actions
}

/// Append-only point-in-time measurement of a requisition, with the decision taken on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub requisition: JobId,
    pub qualified_count: u32,
    pub new_applications: u32,
    pub outreach: OutreachStats,
    pub reply_rate: f64,
    pub health: f64,
    pub health_percent: f64,
    pub decision: SourcingDecision,
    pub sourcing: SourcingOutcome,
    pub stage_distribution: BTreeMap<String, u32>,
    pub risks: Vec<HealthRisk>,
    pub next_actions: Vec<String>,
    pub taken_at: DateTime<Utc>,
}
