use std::sync::Barrier;

use chrono::Duration;

use super::common::*;
use crate::workflows::scheduling::{
    ProposalStatus, SchedulingError, SchedulingRepository, TimeWindow,
};

#[tokio::test]
async fn proposal_offers_earliest_free_windows() {
    let harness = harness();

    let proposal = harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), None, now())
        .await
        .expect("proposal created");

    assert_eq!(
        proposal.windows,
        vec![hour_window(2, 9), hour_window(2, 10), hour_window(2, 11)]
    );
    assert_eq!(proposal.status, ProposalStatus::Proposed);
    assert_eq!(proposal.expires_at, now() + Duration::hours(48));
    assert!(proposal.id.0.starts_with("prop-"));

    let stored = harness.scheduler.proposal(&proposal.id).expect("stored");
    assert_eq!(stored, proposal);
}

#[tokio::test]
async fn proposal_skips_confirmed_interviews() {
    let harness = harness();
    let first = harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), None, now())
        .await
        .expect("proposal created");
    harness
        .scheduler
        .confirm_at(&first.id, hour_window(2, 9), now())
        .expect("confirmed");

    let second = harness
        .scheduler
        .propose_at(application("app-2"), interviewer("ada"), Some(2), now())
        .await
        .expect("proposal created");

    assert_eq!(second.windows, vec![hour_window(2, 10), hour_window(2, 11)]);
}

#[tokio::test]
async fn windows_already_started_are_not_offered() {
    let harness = harness();
    harness.availability.set_blocks(
        interviewer("ada"),
        vec![TimeWindow::new(at(2, 6), at(2, 10))],
    );

    let proposal = harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), Some(2), now())
        .await
        .expect("proposal created");

    assert_eq!(proposal.windows, vec![hour_window(2, 8), hour_window(2, 9)]);
}

#[tokio::test]
async fn thin_calendar_reports_no_availability() {
    let harness = harness();
    harness.availability.set_blocks(
        interviewer("ada"),
        vec![
            TimeWindow::new(at(3, 9), at(3, 11)),
            TimeWindow::new(at(27, 9), at(27, 17)),
        ],
    );

    match harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), None, now())
        .await
    {
        Err(SchedulingError::NoAvailability {
            requested, found, ..
        }) => assert_eq!((requested, found), (3, 2)),
        other => panic!("expected no availability, got {other:?}"),
    }
    assert!(harness
        .repository
        .open_proposals()
        .expect("listing")
        .is_empty());
}

#[tokio::test]
async fn zero_windows_is_an_invalid_request() {
    let harness = harness();

    let outcome = harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), Some(0), now())
        .await;

    assert!(matches!(outcome, Err(SchedulingError::InvalidRequest(_))));
}

#[tokio::test]
async fn window_count_above_the_cap_is_an_invalid_request() {
    let harness = harness();
    let cap = harness.scheduler.config().max_slot_count;

    for count in [cap + 1, usize::MAX] {
        let outcome = harness
            .scheduler
            .propose_at(application("app-1"), interviewer("ada"), Some(count), now())
            .await;
        assert!(matches!(outcome, Err(SchedulingError::InvalidRequest(_))));
    }

    let allowed = harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), Some(cap), now())
        .await
        .expect("cap itself is accepted");
    assert_eq!(allowed.windows.len(), cap);
}

#[tokio::test]
async fn clock_at_the_end_of_time_is_rejected_not_overflowed() {
    let harness = harness();
    let end_of_time = chrono::DateTime::<chrono::Utc>::MAX_UTC;

    let proposed = harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), None, end_of_time)
        .await;
    assert!(matches!(proposed, Err(SchedulingError::InvalidRequest(_))));

    let listed = harness.scheduler.upcoming(None, 1, end_of_time);
    assert!(matches!(listed, Err(SchedulingError::InvalidRequest(_))));
}

#[tokio::test]
async fn confirming_an_unoffered_window_changes_nothing() {
    let harness = harness();
    let proposal = harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), None, now())
        .await
        .expect("proposal created");

    let outcome = harness
        .scheduler
        .confirm_at(&proposal.id, hour_window(2, 15), now());

    assert!(matches!(outcome, Err(SchedulingError::InvalidSlot(_))));
    let stored = harness.scheduler.proposal(&proposal.id).expect("stored");
    assert_eq!(stored.status, ProposalStatus::Proposed);
    assert!(harness
        .repository
        .interviews_for(&interviewer("ada"))
        .expect("listing")
        .is_empty());
}

#[tokio::test]
async fn confirmed_proposal_cannot_be_confirmed_again() {
    let harness = harness();
    let proposal = harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), None, now())
        .await
        .expect("proposal created");

    let interview = harness
        .scheduler
        .confirm_at(&proposal.id, hour_window(2, 10), now())
        .expect("confirmed");
    assert_eq!(interview.window, hour_window(2, 10));
    assert_eq!(interview.application, application("app-1"));

    let stored = harness.scheduler.proposal(&proposal.id).expect("stored");
    assert_eq!(stored.status, ProposalStatus::Confirmed);
    assert_eq!(stored.chosen, Some(hour_window(2, 10)));

    let again = harness
        .scheduler
        .confirm_at(&proposal.id, hour_window(2, 11), now());
    assert!(matches!(again, Err(SchedulingError::InvalidSlot(_))));
}

#[tokio::test]
async fn racing_confirmations_book_the_slot_once() {
    let harness = harness();
    let mut proposals = Vec::new();
    for app in ["app-1", "app-2"] {
        proposals.push(
            harness
                .scheduler
                .propose_at(application(app), interviewer("ada"), None, now())
                .await
                .expect("proposal created"),
        );
    }
    let contested = hour_window(2, 9);
    assert!(proposals.iter().all(|proposal| proposal.offers(&contested)));

    let barrier = Barrier::new(proposals.len());
    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = proposals
            .iter()
            .map(|proposal| {
                let scheduler = &harness.scheduler;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    scheduler.confirm_at(&proposal.id, contested, now())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread joins"))
            .collect()
    });

    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(winners, 1);
    let loser = outcomes
        .iter()
        .position(|outcome| matches!(outcome, Err(SchedulingError::SlotConflict { .. })))
        .expect("one confirmation loses");

    let expired = harness
        .scheduler
        .proposal(&proposals[loser].id)
        .expect("stored");
    assert_eq!(expired.status, ProposalStatus::Expired);
    assert_eq!(
        harness
            .repository
            .interviews_for(&interviewer("ada"))
            .expect("listing")
            .len(),
        1
    );
}

#[tokio::test]
async fn different_interviewers_do_not_conflict() {
    let harness = harness();
    let window = hour_window(2, 9);

    for (app, person) in [("app-1", "ada"), ("app-2", "lin")] {
        let proposal = harness
            .scheduler
            .propose_at(application(app), interviewer(person), None, now())
            .await
            .expect("proposal created");
        harness
            .scheduler
            .confirm_at(&proposal.id, window, now())
            .expect("each interviewer has the hour free");
    }
}

#[tokio::test]
async fn lapsed_proposal_expires_on_confirm() {
    let harness = harness();
    let proposal = harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), None, now())
        .await
        .expect("proposal created");

    let late = now() + Duration::hours(48);
    let outcome = harness
        .scheduler
        .confirm_at(&proposal.id, hour_window(2, 9), late);

    assert!(matches!(outcome, Err(SchedulingError::InvalidSlot(_))));
    let stored = harness.scheduler.proposal(&proposal.id).expect("stored");
    assert_eq!(stored.status, ProposalStatus::Expired);
}

#[tokio::test]
async fn expire_stale_only_touches_open_lapsed_proposals() {
    let harness = harness();
    let mut proposals = Vec::new();
    for app in ["app-1", "app-2", "app-3"] {
        proposals.push(
            harness
                .scheduler
                .propose_at(application(app), interviewer("lin"), Some(1), now())
                .await
                .expect("proposal created"),
        );
    }
    harness
        .scheduler
        .confirm_at(&proposals[0].id, proposals[0].windows[0], now())
        .expect("confirmed");
    let fresh = harness
        .scheduler
        .propose_at(
            application("app-4"),
            interviewer("lin"),
            Some(1),
            now() + Duration::hours(24),
        )
        .await
        .expect("proposal created");

    let sweep_at = now() + Duration::hours(49);
    assert_eq!(harness.scheduler.expire_stale(sweep_at).expect("sweep"), 2);
    assert_eq!(harness.scheduler.expire_stale(sweep_at).expect("sweep"), 0);

    let status = |index: usize| {
        harness
            .scheduler
            .proposal(&proposals[index].id)
            .expect("stored")
            .status
    };
    assert_eq!(status(0), ProposalStatus::Confirmed);
    assert_eq!(status(1), ProposalStatus::Expired);
    assert_eq!(status(2), ProposalStatus::Expired);
    assert_eq!(
        harness.scheduler.proposal(&fresh.id).expect("stored").status,
        ProposalStatus::Proposed
    );
}

#[tokio::test]
async fn upcoming_lists_interviews_in_start_order() {
    let harness = harness();
    let bookings = [
        ("app-1", "ada", hour_window(3, 14)),
        ("app-2", "lin", hour_window(2, 11)),
        ("app-3", "ada", hour_window(2, 9)),
        ("app-4", "lin", hour_window(12, 10)),
    ];
    for (app, person, window) in bookings {
        harness
            .availability
            .set_blocks(interviewer(person), vec![window]);
        let proposal = harness
            .scheduler
            .propose_at(application(app), interviewer(person), Some(1), now())
            .await
            .expect("proposal created");
        harness
            .scheduler
            .confirm_at(&proposal.id, window, now())
            .expect("confirmed");
    }

    let week = harness
        .scheduler
        .upcoming(None, 7, now())
        .expect("listing");
    let starts: Vec<_> = week.iter().map(|interview| interview.window).collect();
    assert_eq!(
        starts,
        vec![hour_window(2, 9), hour_window(2, 11), hour_window(3, 14)]
    );

    let ada = harness
        .scheduler
        .upcoming(Some(&interviewer("ada")), 14, now())
        .expect("listing");
    assert_eq!(ada.len(), 2);
    assert!(ada.iter().all(|interview| interview.interviewer == interviewer("ada")));
}

#[test]
fn upcoming_rejects_look_ahead_beyond_the_cap() {
    let harness = harness();

    let outcome = harness.scheduler.upcoming(None, u32::MAX, now());

    assert!(matches!(outcome, Err(SchedulingError::InvalidRequest(_))));
    assert!(harness.scheduler.upcoming(None, 366, now()).is_ok());
}

#[tokio::test(start_paused = true)]
async fn calendar_outage_is_retried() {
    let harness = harness();
    harness.availability.fail_next(2);

    let proposal = harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), None, now())
        .await
        .expect("third lookup succeeds");

    assert_eq!(proposal.windows.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn exhausted_calendar_retries_surface_as_collaborator_error() {
    let harness = harness();
    harness.availability.fail_next(3);

    match harness
        .scheduler
        .propose_at(application("app-1"), interviewer("ada"), None, now())
        .await
    {
        Err(SchedulingError::Collaborator(error)) => {
            assert!(error.retryable);
            assert_eq!(error.operation, "calendar.availability");
        }
        other => panic!("expected collaborator failure, got {other:?}"),
    }
    assert!(harness
        .repository
        .open_proposals()
        .expect("listing")
        .is_empty());
}
