use crate::infra::Workflows;
use chrono::{DateTime, Local, Months, NaiveDate, TimeZone, Utc};
use clap::Args;
use recruit_ai::config::EngineSettings;
use recruit_ai::error::AppError;
use recruit_ai::workflows::matching::{
    CandidateId, CandidateProfile, EducationEntry, ExperienceEntry, FitScoreEngine,
    FitScoreResult, JobId, JobRequirement, SeniorityBand, SkillRequirement,
};
use recruit_ai::workflows::pipeline::{
    Application, FunnelReport, HealthSnapshot, PipelineRepository, PipelineStage,
};
use recruit_ai::workflows::scheduling::{Interview, InterviewerId};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

const DEMO_ACTOR: &str = "recruiter:demo";

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Job requirement JSON document
    #[arg(long)]
    pub(crate) job: PathBuf,
    /// Candidate profile JSON document
    #[arg(long)]
    pub(crate) candidate: PathBuf,
    /// Measure ongoing roles up to this date (YYYY-MM-DD) instead of today
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Demo date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the collected results as JSON instead of the narrated walkthrough.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let settings = EngineSettings::from_env()?;
    let engine = FitScoreEngine::new(
        settings.scoring.clone(),
        settings.red_flags.clone(),
        settings.load_synonyms()?,
    )?;

    let job: JobRequirement = read_document(&args.job)?;
    let candidate: CandidateProfile = read_document(&args.candidate)?;

    let result = match args.as_of {
        Some(date) => engine.score_as_of(&job, &candidate, morning_of(date)),
        None => engine.score(&job, &candidate),
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[derive(Debug, Serialize)]
struct DemoSummary {
    scores: Vec<FitScoreResult>,
    health: HealthSnapshot,
    interview: Option<Interview>,
    funnel: FunnelReport,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let now = morning_of(today);

    let (workflows, _dispatcher) = Workflows::build(&EngineSettings::default())?;
    let interviewer = InterviewerId("interviewer-morgan".to_string());
    workflows
        .availability
        .set_working_hours(interviewer.clone(), today, 14, 9, 17);

    let requirement = match workflows.pipeline.publish_requirement(demo_requirement()) {
        Ok(requirement) => requirement,
        Err(err) => {
            println!("Requirement rejected: {err}");
            return Ok(());
        }
    };

    let mut scored = Vec::new();
    for profile in demo_candidates(today) {
        let application = match workflows.pipeline.submit_application(
            &requirement.id,
            profile.id.clone(),
            now - chrono::Duration::hours(3),
        ) {
            Ok(application) => application,
            Err(err) => {
                println!("Application for {} rejected: {err}", profile.id.0);
                continue;
            }
        };
        match workflows
            .pipeline
            .score_application(&application.id, &profile, now)
        {
            Ok(result) => scored.push((application, profile, result)),
            Err(err) => println!("Scoring {} failed: {err}", profile.id.0),
        }
    }

    let health = match workflows.monitor.evaluate_at(&requirement.id, now).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            println!("Health evaluation failed: {err}");
            return Ok(());
        }
    };

    let interview = book_top_candidate(&workflows, &requirement.id, &interviewer, now).await;

    let funnel = match workflows.pipeline.funnel(&requirement.id) {
        Ok(funnel) => funnel,
        Err(err) => {
            println!("Funnel unavailable: {err}");
            return Ok(());
        }
    };

    let summary = DemoSummary {
        scores: scored.iter().map(|(_, _, result)| result.clone()).collect(),
        health,
        interview,
        funnel,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        render_summary(&workflows, &requirement, &scored, &summary);
    }

    Ok(())
}

async fn book_top_candidate(
    workflows: &Workflows,
    requisition: &JobId,
    interviewer: &InterviewerId,
    now: DateTime<Utc>,
) -> Option<Interview> {
    let top = match workflows.pipeline.top_candidates(requisition, 1) {
        Ok(mut ranked) if !ranked.is_empty() => ranked.remove(0),
        Ok(_) => return None,
        Err(err) => {
            println!("Ranking unavailable: {err}");
            return None;
        }
    };

    if let Err(err) =
        workflows
            .pipeline
            .move_stage(&top.application_id, PipelineStage::Interview, DEMO_ACTOR, now)
    {
        println!("Could not advance {}: {err}", top.application_id.0);
        return None;
    }

    let proposal = match workflows
        .scheduler
        .propose_at(top.application_id.clone(), interviewer.clone(), None, now)
        .await
    {
        Ok(proposal) => proposal,
        Err(err) => {
            println!("No interview slots proposed: {err}");
            return None;
        }
    };

    let chosen = proposal.windows.first().copied()?;
    match workflows.scheduler.confirm_at(&proposal.id, chosen, now) {
        Ok(interview) => Some(interview),
        Err(err) => {
            println!("Interview not confirmed: {err}");
            None
        }
    }
}

fn render_summary(
    workflows: &Workflows,
    requirement: &JobRequirement,
    scored: &[(Application, CandidateProfile, FitScoreResult)],
    summary: &DemoSummary,
) {
    println!(
        "Recruiting workflow demo: {} (v{})",
        requirement.title, requirement.version
    );

    println!("\nFitScores");
    for (application, profile, result) in scored {
        println!(
            "- {} [{}] overall {:.2} (skills {:.2}, experience {:.2}, domain {:.2}, quality {:.2})",
            profile.name,
            application.id.0,
            result.overall,
            result.sub_scores.skill_match,
            result.sub_scores.experience_match,
            result.sub_scores.domain_match,
            result.sub_scores.quality_signal
        );
        if !result.red_flags.is_empty() {
            let flags: Vec<&str> = result.red_flags.iter().map(|flag| flag.label()).collect();
            println!("    red flags: {}", flags.join(", "));
        }
        for recommendation in &result.recommendations {
            println!("    * {recommendation}");
        }
    }

    let health = &summary.health;
    println!(
        "\nPipeline health {:.1}% ({} qualified, {} new, reply rate {:.0}%)",
        health.health_percent,
        health.qualified_count,
        health.new_applications,
        health.reply_rate * 100.0
    );
    println!(
        "Decision: {} -> {}",
        health.decision.label(),
        health.sourcing.label()
    );
    println!(
        "Sourcing vendor calls: {} start, {} stop",
        workflows.launcher.starts().len(),
        workflows.launcher.stops().len()
    );
    if !health.risks.is_empty() {
        let risks: Vec<&str> = health.risks.iter().map(|risk| risk.label()).collect();
        println!("Risks: {}", risks.join(", "));
    }
    println!("Next actions:");
    for action in &health.next_actions {
        println!("- {action}");
    }

    match &summary.interview {
        Some(interview) => println!(
            "\nInterview {} booked for {} with {}: {} to {}",
            interview.id.0,
            interview.application.0,
            interview.interviewer.0,
            interview.window.start.format("%a %Y-%m-%d %H:%M"),
            interview.window.end.format("%H:%M UTC")
        ),
        None => println!("\nNo interview booked"),
    }

    println!(
        "\nFunnel ({} applications, {} rejected)",
        summary.funnel.total, summary.funnel.rejected
    );
    for stage in &summary.funnel.stages {
        let conversion = stage
            .conversion
            .map(|rate| format!("{:.0}%", rate * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "- {:<12} current {:>2}  reached {:>2}  conversion {}",
            stage.stage.label(),
            stage.current,
            stage.reached,
            conversion
        );
    }

    let stored = workflows
        .repository
        .snapshots(&requirement.id)
        .map(|snapshots| snapshots.len())
        .unwrap_or_default();
    println!("\nHealth snapshots recorded: {stored}");
}

fn morning_of(date: NaiveDate) -> DateTime<Utc> {
    let morning = date
        .and_hms_opt(8, 0, 0)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN));
    Utc.from_utc_datetime(&morning)
}

fn months_before(today: NaiveDate, months: u32) -> String {
    today
        .checked_sub_months(Months::new(months))
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

fn demo_requirement() -> JobRequirement {
    JobRequirement {
        id: JobId("req-payments-backend".to_string()),
        version: 1,
        title: "Senior Payments Backend Engineer".to_string(),
        skills: vec![
            SkillRequirement::must_have("Rust"),
            SkillRequirement::must_have("PostgreSQL"),
            SkillRequirement::must_have("Kubernetes"),
            SkillRequirement::nice_to_have("Kafka"),
        ],
        min_years: None,
        max_years: None,
        seniority: SeniorityBand::Senior,
        location: "Remote (EU)".to_string(),
        compensation: None,
        domain_keywords: vec!["fintech".to_string(), "payments".to_string()],
        minimum_education: None,
        description: "Own settlement and ledger services.".to_string(),
    }
}

fn role(company: &str, title: &str, start: String, end: Option<String>) -> ExperienceEntry {
    ExperienceEntry {
        company: company.to_string(),
        role: title.to_string(),
        start,
        end,
    }
}

fn demo_candidates(today: NaiveDate) -> Vec<CandidateProfile> {
    let ago = |months| months_before(today, months);
    let degree = || EducationEntry {
        institution: "Delft University of Technology".to_string(),
        degree: "MSc Computer Science".to_string(),
        field: Some("Computer Science".to_string()),
        level: None,
    };

    vec![
        CandidateProfile {
            id: CandidateId("cand-priya".to_string()),
            name: "Priya Natarajan".to_string(),
            skills: Vec::from(["Rust", "Postgres", "k8s", "Kafka"].map(str::to_string)),
            experience: vec![
                role("Adyen", "Backend Engineer", ago(84), Some(ago(36))),
                role("Mollie", "Senior Engineer", ago(36), None),
            ],
            education: vec![degree()],
            domains: vec!["Fintech".to_string(), "Payments".to_string()],
            location: Some("Amsterdam".to_string()),
        },
        CandidateProfile {
            id: CandidateId("cand-tomas".to_string()),
            name: "Tomas Berg".to_string(),
            skills: Vec::from(["Rust", "PostgreSQL", "Docker"].map(str::to_string)),
            experience: vec![
                role("Klarna", "Engineer", ago(60), Some(ago(50))),
                role("Bolt", "Engineer", ago(48), Some(ago(42))),
                role("Wise", "Engineer", ago(40), Some(ago(30))),
                role("Revolut", "Engineer", ago(28), Some(ago(18))),
                role("N26", "Engineer", ago(16), None),
            ],
            education: Vec::new(),
            domains: vec!["Fintech".to_string()],
            location: Some("Stockholm".to_string()),
        },
        CandidateProfile {
            id: CandidateId("cand-lea".to_string()),
            name: "Lea Fischer".to_string(),
            skills: Vec::from(["Python", "PostgreSQL"].map(str::to_string)),
            experience: vec![role("Zalando", "Data Engineer", ago(20), None)],
            education: vec![degree()],
            domains: vec!["E-commerce".to_string()],
            location: Some("Berlin".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date")
    }

    #[test]
    fn demo_candidates_span_the_score_range() {
        let engine = FitScoreEngine::new(
            Default::default(),
            Default::default(),
            recruit_ai::workflows::matching::SkillSynonymTable::with_defaults(),
        )
        .expect("default configuration is valid");
        let requirement = demo_requirement();
        let now = morning_of(today());

        let scores: Vec<FitScoreResult> = demo_candidates(today())
            .iter()
            .map(|profile| engine.score_as_of(&requirement, profile, now))
            .collect();

        assert!(scores[0].overall > scores[1].overall);
        assert!(scores[1].overall > scores[2].overall);
        assert!(scores[0].red_flags.is_empty());
        assert!(!scores[1].red_flags.is_empty());
    }

    #[tokio::test]
    async fn demo_runs_to_completion() {
        let args = DemoArgs {
            today: Some(today()),
            json: true,
        };

        run_demo(args).await.expect("demo completes");
    }

    #[test]
    fn months_before_formats_iso_dates() {
        assert_eq!(months_before(today(), 14), "2024-04-02");
    }
}
