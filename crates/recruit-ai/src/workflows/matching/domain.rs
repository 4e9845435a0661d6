use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::timeline::{merged_years, ExperienceSpan};

/// Identifier wrapper for job requisitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Identifier wrapper for candidate profiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Single skill line from a requirement, tagged as hard or bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub name: String,
    pub must_have: bool,
}

impl SkillRequirement {
    pub fn must_have(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            must_have: true,
        }
    }

    pub fn nice_to_have(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            must_have: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityBand {
    Junior,
    Mid,
    Senior,
    Lead,
    Principal,
}

impl SeniorityBand {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::Mid => "mid",
            Self::Senior => "senior",
            Self::Lead => "lead",
            Self::Principal => "principal",
        }
    }

    /// Years-of-experience band used when a requirement does not state one.
    pub const fn default_years(self) -> (f64, Option<f64>) {
        match self {
            Self::Junior => (0.0, Some(2.0)),
            Self::Mid => (2.0, Some(5.0)),
            Self::Senior => (5.0, Some(10.0)),
            Self::Lead => (8.0, Some(15.0)),
            Self::Principal => (10.0, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationRange {
    pub minimum: u32,
    pub maximum: u32,
    pub currency: String,
}

/// Ordered education ladder; a higher rank satisfies any lower requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    HighSchool,
    Associate,
    Bachelor,
    Master,
    Doctorate,
}

impl EducationLevel {
    pub const fn rank(self) -> u8 {
        match self {
            Self::HighSchool => 1,
            Self::Associate => 2,
            Self::Bachelor => 3,
            Self::Master => 4,
            Self::Doctorate => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HighSchool => "high school",
            Self::Associate => "associate",
            Self::Bachelor => "bachelor",
            Self::Master => "master",
            Self::Doctorate => "doctorate",
        }
    }

    /// Best-effort detection from a free-text degree title.
    pub fn detect(degree: &str) -> Option<Self> {
        let lowered = degree.to_lowercase();
        let has = |needle: &str| lowered.contains(needle);

        if has("phd") || has("ph.d") || has("doctor") {
            Some(Self::Doctorate)
        } else if has("master") || has("mba") || has("msc") || has("m.s.") {
            Some(Self::Master)
        } else if has("bachelor") || has("bsc") || has("b.s.") || has("b.a.") || has("beng") {
            Some(Self::Bachelor)
        } else if has("associate") {
            Some(Self::Associate)
        } else if has("high school") || has("ged") {
            Some(Self::HighSchool)
        } else {
            None
        }
    }
}

/// Structured requirement produced by the external extractor.
///
/// Never mutated once scored against; `revise` yields the superseding version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequirement {
    pub id: JobId,
    #[serde(default = "first_version")]
    pub version: u32,
    pub title: String,
    pub skills: Vec<SkillRequirement>,
    #[serde(default)]
    pub min_years: Option<f64>,
    #[serde(default)]
    pub max_years: Option<f64>,
    pub seniority: SeniorityBand,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub compensation: Option<CompensationRange>,
    #[serde(default)]
    pub domain_keywords: Vec<String>,
    #[serde(default)]
    pub minimum_education: Option<EducationLevel>,
    #[serde(default)]
    pub description: String,
}

fn first_version() -> u32 {
    1
}

impl JobRequirement {
    pub fn must_haves(&self) -> impl Iterator<Item = &SkillRequirement> {
        self.skills.iter().filter(|skill| skill.must_have)
    }

    pub fn nice_to_haves(&self) -> impl Iterator<Item = &SkillRequirement> {
        self.skills.iter().filter(|skill| !skill.must_have)
    }

    /// Effective `[minimum, maximum]` years, falling back to the seniority band.
    pub fn experience_band(&self) -> (f64, Option<f64>) {
        let (band_min, band_max) = self.seniority.default_years();
        match (self.min_years, self.max_years) {
            (None, None) => (band_min, band_max),
            (min, max) => (min.unwrap_or(0.0), max),
        }
    }

    pub fn has_domain_requirement(&self) -> bool {
        !self.domain_keywords.is_empty() || self.minimum_education.is_some()
    }

    /// Copy of this requirement carrying the next version number.
    pub fn revise(&self) -> JobRequirement {
        let mut next = self.clone();
        next.version = self.version.saturating_add(1);
        next
    }
}

/// Work-history line as delivered by the profile builder.
///
/// Dates stay as the raw strings the builder produced so unparseable values remain displayable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub company: String,
    pub role: String,
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

impl ExperienceEntry {
    pub fn span(&self) -> Result<ExperienceSpan, InputDataError> {
        ExperienceSpan::parse(&self.start, self.end.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub level: Option<EducationLevel>,
}

impl EducationEntry {
    pub fn resolved_level(&self) -> Option<EducationLevel> {
        self.level.or_else(|| EducationLevel::detect(&self.degree))
    }
}

/// Structured candidate record produced by the external profile builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: CandidateId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// An experience entry whose dates resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedExperience<'a> {
    pub entry: &'a ExperienceEntry,
    pub span: ExperienceSpan,
}

impl CandidateProfile {
    /// Entries with usable dates, ordered by start. Unusable entries are logged and skipped.
    pub fn resolved_experience(&self) -> Vec<ResolvedExperience<'_>> {
        let mut resolved: Vec<ResolvedExperience<'_>> = self
            .experience
            .iter()
            .filter_map(|entry| match entry.span() {
                Ok(span) => Some(ResolvedExperience { entry, span }),
                Err(err) => {
                    warn!(
                        candidate = %self.id.0,
                        company = %entry.company,
                        error = %err,
                        "excluding experience entry from duration math"
                    );
                    None
                }
            })
            .collect();
        resolved.sort_by_key(|item| item.span.start);
        resolved
    }

    /// Sum of non-overlapping experience spans, with ongoing roles running to `as_of`.
    pub fn total_years(&self, as_of: NaiveDate) -> f64 {
        let spans: Vec<ExperienceSpan> = self
            .resolved_experience()
            .into_iter()
            .map(|item| item.span)
            .collect();
        merged_years(&spans, as_of)
    }

    pub fn highest_education(&self) -> Option<EducationLevel> {
        self.education
            .iter()
            .filter_map(EducationEntry::resolved_level)
            .max()
    }
}

/// Recoverable data-quality problems; affected values are excluded, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputDataError {
    #[error("unparseable {field} date '{value}'")]
    UnparseableDate { field: &'static str, value: String },
    #[error("end date {end} precedes start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}
