use std::collections::HashSet;

use super::super::domain::{CandidateProfile, JobRequirement};
use super::super::synonyms::SkillSynonymTable;
use super::config::ScoringConfig;
use super::{DomainBreakdown, ExperienceBreakdown, QualityBreakdown, SkillMatchLine};

pub(crate) fn skill_match(
    job: &JobRequirement,
    candidate: &CandidateProfile,
    synonyms: &SkillSynonymTable,
    config: &ScoringConfig,
) -> (f64, Vec<SkillMatchLine>) {
    let candidate_skills: HashSet<String> = candidate
        .skills
        .iter()
        .map(|skill| synonyms.normalize(skill))
        .collect();

    let lines: Vec<SkillMatchLine> = job
        .skills
        .iter()
        .map(|requirement| SkillMatchLine {
            skill: requirement.name.clone(),
            must_have: requirement.must_have,
            matched: candidate_skills.contains(&synonyms.normalize(&requirement.name)),
        })
        .collect();

    let must_total = lines.iter().filter(|line| line.must_have).count();
    if must_total == 0 {
        return (1.0, lines);
    }

    let must_matched = lines
        .iter()
        .filter(|line| line.must_have && line.matched)
        .count();
    let nice_matched = lines
        .iter()
        .filter(|line| !line.must_have && line.matched)
        .count();

    let base = must_matched as f64 / must_total as f64;
    let bonus = nice_matched as f64 * config.nice_to_have_bonus;
    ((base + bonus).min(1.0), lines)
}

pub(crate) fn experience_match(
    job: &JobRequirement,
    candidate_years: f64,
    config: &ScoringConfig,
) -> (f64, ExperienceBreakdown) {
    let (minimum, maximum) = job.experience_band();
    let breakdown = ExperienceBreakdown {
        candidate_years,
        minimum_years: minimum,
        maximum_years: maximum,
        seniority: job.seniority,
    };

    if candidate_years < minimum {
        return (0.0, breakdown);
    }

    let score = match maximum {
        Some(max) if candidate_years > max => {
            let overshoot = ((candidate_years - max) / config.overqualified_span_years).min(1.0);
            1.0 - overshoot * (1.0 - config.overqualified_floor)
        }
        _ => 1.0,
    };

    (score, breakdown)
}

pub(crate) fn domain_match(
    job: &JobRequirement,
    candidate: &CandidateProfile,
    synonyms: &SkillSynonymTable,
) -> (f64, DomainBreakdown) {
    let pool: Vec<String> = candidate
        .domains
        .iter()
        .map(String::as_str)
        .chain(
            candidate
                .education
                .iter()
                .flat_map(|entry| {
                    entry
                        .field
                        .as_deref()
                        .into_iter()
                        .chain([entry.degree.as_str()])
                }),
        )
        .map(|raw| synonyms.normalize(raw))
        .collect();

    let mut matched_keywords = Vec::new();
    let mut missing_keywords = Vec::new();
    for keyword in &job.domain_keywords {
        let normalized = synonyms.normalize(keyword);
        if pool.iter().any(|entry| phrase_contains(entry, &normalized)) {
            matched_keywords.push(keyword.clone());
        } else {
            missing_keywords.push(keyword.clone());
        }
    }

    let candidate_education = candidate.highest_education();
    let mut components = Vec::new();

    if !job.domain_keywords.is_empty() {
        components.push(matched_keywords.len() as f64 / job.domain_keywords.len() as f64);
    }

    if let Some(required) = job.minimum_education {
        let level_score = match candidate_education {
            Some(level) => (f64::from(level.rank()) / f64::from(required.rank())).min(1.0),
            None => 0.0,
        };
        components.push(level_score);
    }

    let score = if components.is_empty() {
        1.0
    } else {
        components.iter().sum::<f64>() / components.len() as f64
    };

    (
        score,
        DomainBreakdown {
            matched_keywords,
            missing_keywords,
            required_education: job.minimum_education,
            candidate_education,
        },
    )
}

pub(crate) fn quality_signal(
    candidate: &CandidateProfile,
    distinct_flags: usize,
    config: &ScoringConfig,
) -> (f64, QualityBreakdown) {
    let tenure_stability = (1.0 - config.flag_penalty * distinct_flags as f64).max(0.0);

    let sections = [
        !candidate.skills.is_empty(),
        !candidate.experience.is_empty(),
        !candidate.education.is_empty(),
    ];
    let completeness =
        sections.iter().filter(|present| **present).count() as f64 / sections.len() as f64;

    let share = config.quality_stability_share;
    let score = share * tenure_stability + (1.0 - share) * completeness;

    (
        score,
        QualityBreakdown {
            tenure_stability,
            completeness,
        },
    )
}

/// Whole-phrase containment on word boundaries: "computer science" is inside
/// "computer science and engineering" but "go" is not inside "google".
fn phrase_contains(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    format!(" {haystack} ").contains(&format!(" {needle} "))
}
