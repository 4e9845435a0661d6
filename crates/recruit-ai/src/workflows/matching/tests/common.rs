use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::matching::{
    CandidateId, CandidateProfile, EducationEntry, EducationLevel, ExperienceEntry,
    FitScoreEngine, JobId, JobRequirement, RedFlagConfig, ScoringConfig, SeniorityBand,
    SkillRequirement, SkillSynonymTable,
};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn as_of() -> NaiveDate {
    now().date_naive()
}

pub(super) fn engine() -> FitScoreEngine {
    FitScoreEngine::new(
        ScoringConfig::default(),
        RedFlagConfig::default(),
        SkillSynonymTable::with_defaults(),
    )
    .expect("default configuration is valid")
}

pub(super) fn backend_requirement() -> JobRequirement {
    JobRequirement {
        id: JobId("job-backend".to_string()),
        version: 1,
        title: "Senior Backend Engineer".to_string(),
        skills: vec![
            SkillRequirement::must_have("Rust"),
            SkillRequirement::must_have("PostgreSQL"),
            SkillRequirement::must_have("Kubernetes"),
            SkillRequirement::nice_to_have("JavaScript"),
            SkillRequirement::nice_to_have("Terraform"),
        ],
        min_years: Some(4.0),
        max_years: Some(8.0),
        seniority: SeniorityBand::Senior,
        location: "Remote".to_string(),
        compensation: None,
        domain_keywords: Vec::new(),
        minimum_education: None,
        description: "Own the payments ledger services.".to_string(),
    }
}

pub(super) fn role(company: &str, start: &str, end: Option<&str>) -> ExperienceEntry {
    ExperienceEntry {
        company: company.to_string(),
        role: "Engineer".to_string(),
        start: start.to_string(),
        end: end.map(str::to_string),
    }
}

/// Six steady years across two employers, currently employed.
pub(super) fn steady_candidate() -> CandidateProfile {
    CandidateProfile {
        id: CandidateId("cand-steady".to_string()),
        name: "Avery Quinn".to_string(),
        skills: vec![
            "rust".to_string(),
            "Postgres".to_string(),
            "k8s".to_string(),
            "JS".to_string(),
        ],
        experience: vec![
            role("Northwind", "2019-06-01", Some("2022-06-01")),
            role("Contoso", "2022-06-01", None),
        ],
        education: vec![EducationEntry {
            institution: "State University".to_string(),
            degree: "BSc".to_string(),
            field: Some("Computer Science".to_string()),
            level: Some(EducationLevel::Bachelor),
        }],
        domains: vec!["Fintech".to_string()],
        location: Some("Remote".to_string()),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
