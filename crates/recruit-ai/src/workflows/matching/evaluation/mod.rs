mod config;
mod recommendations;
mod rules;

pub use config::{ScoringConfig, ScoringWeights};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{
    CandidateId, CandidateProfile, EducationLevel, JobId, JobRequirement, SeniorityBand,
};
use super::red_flags::{FlagTag, RedFlag, RedFlagConfig, RedFlagDetector};
use super::synonyms::SkillSynonymTable;
use crate::config::ConfigError;
use recommendations::build_recommendations;

/// Stateless scorer applying the validated rubric to a requirement/profile pair.
#[derive(Debug, Clone)]
pub struct FitScoreEngine {
    config: ScoringConfig,
    detector: RedFlagDetector,
    synonyms: Arc<SkillSynonymTable>,
}

impl FitScoreEngine {
    pub fn new(
        config: ScoringConfig,
        red_flags: RedFlagConfig,
        synonyms: SkillSynonymTable,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        red_flags.validate()?;

        Ok(Self {
            config,
            detector: RedFlagDetector::new(red_flags),
            synonyms: Arc::new(synonyms),
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn detector(&self) -> &RedFlagDetector {
        &self.detector
    }

    pub fn synonyms(&self) -> &SkillSynonymTable {
        &self.synonyms
    }

    pub fn score(&self, job: &JobRequirement, candidate: &CandidateProfile) -> FitScoreResult {
        self.score_as_of(job, candidate, Utc::now())
    }

    /// Score against an explicit clock; ongoing roles are measured up to `now`.
    pub fn score_as_of(
        &self,
        job: &JobRequirement,
        candidate: &CandidateProfile,
        now: DateTime<Utc>,
    ) -> FitScoreResult {
        let as_of = now.date_naive();

        let (skill_match, skills) =
            rules::skill_match(job, candidate, &self.synonyms, &self.config);
        let (experience_match, experience) =
            rules::experience_match(job, candidate.total_years(as_of), &self.config);
        let (domain_match, domain) = rules::domain_match(job, candidate, &self.synonyms);

        let flag_evidence = self.detector.inspect(candidate, as_of);
        let mut red_flags: Vec<FlagTag> = flag_evidence.iter().map(|flag| flag.tag).collect();
        red_flags.sort();
        red_flags.dedup();

        let (quality_signal, quality) =
            rules::quality_signal(candidate, red_flags.len(), &self.config);

        let sub_scores = SubScores {
            skill_match: clamp_unit(skill_match),
            experience_match: clamp_unit(experience_match),
            domain_match: clamp_unit(domain_match),
            quality_signal: clamp_unit(quality_signal),
        };
        let overall = clamp_unit(sub_scores.weighted(&self.config.weights));

        let recommendations =
            build_recommendations(&sub_scores, &skills, &experience, &red_flags);

        debug!(
            job = %job.id.0,
            candidate = %candidate.id.0,
            overall,
            flags = red_flags.len(),
            "computed fit score"
        );

        FitScoreResult {
            job_id: job.id.clone(),
            job_version: job.version,
            candidate_id: candidate.id.clone(),
            sub_scores,
            overall,
            breakdown: ScoreBreakdown {
                skills,
                experience,
                domain,
                quality,
                flag_evidence,
            },
            red_flags,
            recommendations,
            generated_at: now,
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub skill_match: f64,
    pub experience_match: f64,
    pub domain_match: f64,
    pub quality_signal: f64,
}

impl SubScores {
    pub fn weighted(&self, weights: &ScoringWeights) -> f64 {
        self.skill_match * weights.skill
            + self.experience_match * weights.experience
            + self.domain_match * weights.domain
            + self.quality_signal * weights.quality
    }
}

/// Per-requirement skill outcome so reviewers can audit the skill sub-score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMatchLine {
    pub skill: String,
    pub must_have: bool,
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceBreakdown {
    pub candidate_years: f64,
    pub minimum_years: f64,
    pub maximum_years: Option<f64>,
    pub seniority: SeniorityBand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainBreakdown {
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub required_education: Option<EducationLevel>,
    pub candidate_education: Option<EducationLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub tenure_stability: f64,
    pub completeness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skills: Vec<SkillMatchLine>,
    pub experience: ExperienceBreakdown,
    pub domain: DomainBreakdown,
    pub quality: QualityBreakdown,
    pub flag_evidence: Vec<RedFlag>,
}

/// Immutable scoring record. A pair may accumulate several; consumers read the latest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitScoreResult {
    pub job_id: JobId,
    pub job_version: u32,
    pub candidate_id: CandidateId,
    pub sub_scores: SubScores,
    pub overall: f64,
    pub breakdown: ScoreBreakdown,
    pub red_flags: Vec<FlagTag>,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl FitScoreResult {
    pub fn is_qualified(&self, threshold: f64) -> bool {
        self.overall >= threshold
    }

    pub fn missing_must_haves(&self) -> Vec<&str> {
        self.breakdown
            .skills
            .iter()
            .filter(|line| line.must_have && !line.matched)
            .map(|line| line.skill.as_str())
            .collect()
    }
}
