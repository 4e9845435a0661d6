//! FitScore engine: explainable, deterministic matching of a job requirement against a
//! candidate profile, plus the advisory red-flag detector that feeds its quality signal.

pub mod domain;
pub(crate) mod evaluation;
pub mod red_flags;
pub mod router;
pub mod synonyms;
pub mod timeline;

#[cfg(test)]
mod tests;

pub use domain::{
    CandidateId, CandidateProfile, CompensationRange, EducationEntry, EducationLevel,
    ExperienceEntry, InputDataError, JobId, JobRequirement, SeniorityBand, SkillRequirement,
};
pub use evaluation::{
    DomainBreakdown, ExperienceBreakdown, FitScoreEngine, FitScoreResult, QualityBreakdown,
    ScoreBreakdown, ScoringConfig, ScoringWeights, SkillMatchLine, SubScores,
};
pub use red_flags::{FlagTag, RedFlag, RedFlagConfig, RedFlagDetector};
pub use router::fit_score_router;
pub use synonyms::{SkillSynonymTable, SynonymTableError};
