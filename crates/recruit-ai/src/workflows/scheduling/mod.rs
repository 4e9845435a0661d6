//! Interview slot scheduling: bounded proposals, optimistic confirmation, and expiry.

pub mod availability;
pub mod config;
pub mod domain;
pub mod repository;
pub mod router;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use availability::{carve_slots, AvailabilitySource};
pub use config::SchedulingConfig;
pub use domain::{
    Interview, InterviewId, InterviewSlotProposal, InterviewerId, ProposalId, ProposalStatus,
    TimeWindow,
};
pub use repository::SchedulingRepository;
pub use router::scheduling_router;
pub use scheduler::{InterviewScheduler, SchedulingError};
