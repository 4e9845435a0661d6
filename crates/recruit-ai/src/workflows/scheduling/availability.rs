use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{InterviewerId, TimeWindow};
use crate::workflows::retry::CollaboratorError;

/// External calendar returning an interviewer's free blocks within the horizon.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn availability(
        &self,
        interviewer: &InterviewerId,
        horizon_days: u32,
    ) -> Result<Vec<TimeWindow>, CollaboratorError>;
}

/// Earliest `count` fixed-length windows carved from the free blocks.
///
/// Blocks are sliced from their own start. Windows starting before `now`, ending after
/// `horizon_end`, overlapping a `booked` window, or overlapping an already picked window are
/// skipped. May return fewer than `count`.
pub fn carve_slots(
    free_blocks: &[TimeWindow],
    duration: chrono::Duration,
    now: DateTime<Utc>,
    horizon_end: DateTime<Utc>,
    booked: &[TimeWindow],
    count: usize,
) -> Vec<TimeWindow> {
    if duration <= chrono::Duration::zero() || count == 0 {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for block in free_blocks.iter().filter(|block| !block.is_empty()) {
        let mut start = block.start;
        while start + duration <= block.end && start + duration <= horizon_end {
            let window = TimeWindow::starting_at(start, duration);
            if window.start >= now && !booked.iter().any(|taken| taken.overlaps(&window)) {
                candidates.push(window);
            }
            start += duration;
        }
    }
    candidates.sort();

    let mut picked: Vec<TimeWindow> = Vec::new();
    for window in candidates {
        if picked.len() == count {
            break;
        }
        if !picked.iter().any(|existing| existing.overlaps(&window)) {
            picked.push(window);
        }
    }
    picked
}
