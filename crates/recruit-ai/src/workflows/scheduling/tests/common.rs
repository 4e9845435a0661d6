use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::infra::{InMemorySchedulingRepository, StaticAvailability};
use crate::workflows::pipeline::ApplicationId;
use crate::workflows::retry::RetryPolicy;
use crate::workflows::scheduling::{
    InterviewScheduler, InterviewerId, SchedulingConfig, TimeWindow,
};

pub(super) type MemoryScheduler =
    InterviewScheduler<InMemorySchedulingRepository, StaticAvailability>;

/// Monday morning, before working hours open.
pub(super) fn now() -> DateTime<Utc> {
    at(2, 8)
}

pub(super) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn hour_window(day: u32, hour: u32) -> TimeWindow {
    TimeWindow::new(at(day, hour), at(day, hour + 1))
}

pub(super) fn interviewer(id: &str) -> InterviewerId {
    InterviewerId(id.to_string())
}

pub(super) fn application(id: &str) -> ApplicationId {
    ApplicationId(id.to_string())
}

pub(super) struct Harness {
    pub repository: Arc<InMemorySchedulingRepository>,
    pub availability: Arc<StaticAvailability>,
    pub scheduler: Arc<MemoryScheduler>,
}

/// Scheduler whose interviewers `ada` and `lin` keep 09:00-17:00 UTC on weekdays.
pub(super) fn harness() -> Harness {
    let repository = Arc::new(InMemorySchedulingRepository::default());
    let availability = Arc::new(StaticAvailability::default());
    let first_day = NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date");
    for id in ["ada", "lin"] {
        availability.set_working_hours(interviewer(id), first_day, 14, 9, 17);
    }

    let scheduler = Arc::new(InterviewScheduler::new(
        repository.clone(),
        availability.clone(),
        SchedulingConfig::default(),
        RetryPolicy::default(),
    ));

    Harness {
        repository,
        availability,
        scheduler,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
