use super::super::red_flags::FlagTag;
use super::{ExperienceBreakdown, SkillMatchLine, SubScores};

const MAX_RECOMMENDATIONS: usize = 5;
const MAX_LISTED_SKILLS: usize = 3;

/// Reviewer-facing hints derived from the sub-scores and breakdown.
pub(crate) fn build_recommendations(
    scores: &SubScores,
    skills: &[SkillMatchLine],
    experience: &ExperienceBreakdown,
    flags: &[FlagTag],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    let missing: Vec<&str> = skills
        .iter()
        .filter(|line| line.must_have && !line.matched)
        .take(MAX_LISTED_SKILLS)
        .map(|line| line.skill.as_str())
        .collect();
    if !missing.is_empty() {
        recommendations.push(format!("Missing must-have skills: {}", missing.join(", ")));
    }

    if experience.candidate_years < experience.minimum_years {
        recommendations.push(format!(
            "Needs {:.1} more year(s) of experience to reach the {:.1}-year minimum",
            experience.minimum_years - experience.candidate_years,
            experience.minimum_years
        ));
    } else if scores.experience_match < 1.0 {
        recommendations.push(format!(
            "Experience exceeds the {} band; confirm seniority and compensation expectations",
            experience.seniority.label()
        ));
    }

    if !flags.is_empty() {
        let labels: Vec<&str> = flags.iter().map(|flag| flag.label()).collect();
        recommendations.push(format!("Review work history: {}", labels.join(", ")));
    }

    if scores.skill_match >= 0.9 {
        recommendations.push("Strong skill alignment with the requirement".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push("Good overall match; proceed to screening".to_string());
    }

    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}
