use crate::config::ConfigError;

/// Longest calendar search and `upcoming` look-ahead accepted, in days.
pub const MAX_HORIZON_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingConfig {
    pub slot_count: usize,
    /// Upper bound on the windows a single proposal may ask for.
    pub max_slot_count: usize,
    pub slot_duration: chrono::Duration,
    pub proposal_ttl: chrono::Duration,
    pub horizon_days: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_count: 3,
            max_slot_count: 10,
            slot_duration: chrono::Duration::minutes(60),
            proposal_ttl: chrono::Duration::hours(48),
            horizon_days: 14,
        }
    }
}

impl SchedulingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_count == 0 {
            return Err(ConfigError::invalid("slot_count", "must be positive"));
        }
        if self.slot_count > self.max_slot_count {
            return Err(ConfigError::invalid(
                "slot_count",
                format!("must not exceed max_slot_count ({})", self.max_slot_count),
            ));
        }
        let longest = chrono::Duration::days(i64::from(MAX_HORIZON_DAYS));
        if self.slot_duration <= chrono::Duration::zero() || self.slot_duration > longest {
            return Err(ConfigError::invalid(
                "slot_duration",
                format!("must be positive and at most {MAX_HORIZON_DAYS} days"),
            ));
        }
        if self.proposal_ttl <= chrono::Duration::zero() || self.proposal_ttl > longest {
            return Err(ConfigError::invalid(
                "proposal_ttl",
                format!("must be positive and at most {MAX_HORIZON_DAYS} days"),
            ));
        }
        if self.horizon_days == 0 || self.horizon_days > MAX_HORIZON_DAYS {
            return Err(ConfigError::invalid(
                "horizon_days",
                format!("must be within 1..={MAX_HORIZON_DAYS}"),
            ));
        }
        Ok(())
    }

    pub fn horizon(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.horizon_days))
    }
}
