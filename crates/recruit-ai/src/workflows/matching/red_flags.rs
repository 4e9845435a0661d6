use std::collections::BTreeSet;

use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::CandidateProfile;
use super::timeline::months_between;
use crate::config::ConfigError;

/// Advisory risk patterns found in a work-history timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagTag {
    ShortTenure,
    FrequentJobHopping,
    EmploymentGap,
}

impl FlagTag {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShortTenure => "short_tenure",
            Self::FrequentJobHopping => "frequent_job_hopping",
            Self::EmploymentGap => "employment_gap",
        }
    }
}

/// A flag plus the evidence shown to the reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedFlag {
    pub tag: FlagTag,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlagConfig {
    pub short_tenure_months: u32,
    pub job_hop_max_roles: u32,
    pub job_hop_window_years: u32,
    pub gap_months: u32,
}

impl Default for RedFlagConfig {
    fn default() -> Self {
        Self {
            short_tenure_months: 9,
            job_hop_max_roles: 3,
            job_hop_window_years: 5,
            gap_months: 6,
        }
    }
}

impl RedFlagConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_tenure_months == 0 {
            return Err(ConfigError::invalid("short_tenure_months", "must be positive"));
        }
        if self.job_hop_max_roles == 0 {
            return Err(ConfigError::invalid("job_hop_max_roles", "must be positive"));
        }
        if self.job_hop_window_years == 0 {
            return Err(ConfigError::invalid(
                "job_hop_window_years",
                "must be positive",
            ));
        }
        if self.gap_months == 0 {
            return Err(ConfigError::invalid("gap_months", "must be positive"));
        }
        Ok(())
    }
}

/// Stateless inspector over a candidate's timeline. Never touches the numeric score directly.
#[derive(Debug, Clone)]
pub struct RedFlagDetector {
    config: RedFlagConfig,
}

impl RedFlagDetector {
    pub fn new(config: RedFlagConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RedFlagConfig {
        &self.config
    }

    pub fn detect_flags(&self, candidate: &CandidateProfile) -> BTreeSet<FlagTag> {
        self.detect_flags_as_of(candidate, Utc::now().date_naive())
    }

    pub fn detect_flags_as_of(
        &self,
        candidate: &CandidateProfile,
        as_of: NaiveDate,
    ) -> BTreeSet<FlagTag> {
        self.inspect(candidate, as_of)
            .into_iter()
            .map(|flag| flag.tag)
            .collect()
    }

    /// Every finding with its evidence, in timeline order per tag.
    pub fn inspect(&self, candidate: &CandidateProfile, as_of: NaiveDate) -> Vec<RedFlag> {
        let timeline = candidate.resolved_experience();
        let mut flags = Vec::new();

        if timeline.is_empty() {
            return flags;
        }

        let most_recent = timeline.len() - 1;
        for (index, item) in timeline.iter().enumerate() {
            if index == most_recent || item.span.is_ongoing() {
                continue;
            }
            let months = item.span.months(as_of);
            if months < i64::from(self.config.short_tenure_months) {
                flags.push(RedFlag {
                    tag: FlagTag::ShortTenure,
                    detail: format!(
                        "{} at {} lasted {} month(s)",
                        item.entry.role, item.entry.company, months
                    ),
                });
            }
        }

        let window_start = as_of
            .checked_sub_months(Months::new(self.config.job_hop_window_years * 12))
            .unwrap_or(NaiveDate::MIN);
        let recent_roles = timeline
            .iter()
            .filter(|item| item.span.start >= window_start)
            .count();
        if recent_roles > self.config.job_hop_max_roles as usize {
            flags.push(RedFlag {
                tag: FlagTag::FrequentJobHopping,
                detail: format!(
                    "{} roles started within the last {} year(s)",
                    recent_roles, self.config.job_hop_window_years
                ),
            });
        }

        let mut covered_until = timeline[0].span.end_or(as_of);
        for item in timeline.iter().skip(1) {
            if item.span.start > covered_until {
                let gap = months_between(covered_until, item.span.start);
                if gap > i64::from(self.config.gap_months) {
                    flags.push(RedFlag {
                        tag: FlagTag::EmploymentGap,
                        detail: format!(
                            "{} month gap before joining {}",
                            gap, item.entry.company
                        ),
                    });
                }
            }
            covered_until = covered_until.max(item.span.end_or(as_of));
        }

        flags
    }
}

impl Default for RedFlagDetector {
    fn default() -> Self {
        Self::new(RedFlagConfig::default())
    }
}
