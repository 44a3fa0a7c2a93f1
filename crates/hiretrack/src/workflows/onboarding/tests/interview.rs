use chrono::Duration;

use super::common::*;
use crate::workflows::onboarding::domain::{
    BackgroundCheckStatus, InterviewResult, InterviewStatus, LicenseStatus,
};
use crate::workflows::onboarding::interview::{
    add_evaluation, cancel_interview, complete_interview, schedule_interview, start_interview,
    transition, InterviewCommand,
};
use crate::workflows::onboarding::OnboardingError;

#[test]
fn schedule_records_time_location_and_calendar_event() {
    let candidate = fresh_candidate("cand-1", LicenseStatus::Unlicensed);
    let scheduled = apply(
        &candidate,
        schedule_interview(&candidate, schedule_request(), now()).expect("schedule"),
    );

    let interview = &scheduled.interview;
    assert_eq!(interview.status, InterviewStatus::Scheduled);
    assert_eq!(interview.location.as_deref(), Some("Phoenix HQ, Room 4"));
    assert_eq!(interview.calendar_event_id.as_deref(), Some("evt-2041"));
    assert_eq!(
        scheduled.audit.last().map(|entry| entry.action.as_str()),
        Some("interview scheduled")
    );
}

#[test]
fn schedule_rejects_past_times_and_blank_locations() {
    let candidate = fresh_candidate("cand-1", LicenseStatus::Unlicensed);

    let mut past = schedule_request();
    past.at = now() - Duration::hours(1);
    assert!(matches!(
        schedule_interview(&candidate, past, now()),
        Err(OnboardingError::InvalidSchedule(_))
    ));

    let mut nowhere = schedule_request();
    nowhere.location = "  ".to_string();
    assert!(matches!(
        schedule_interview(&candidate, nowhere, now()),
        Err(OnboardingError::InvalidSchedule(_))
    ));
}

#[test]
fn start_requires_a_scheduled_interview() {
    let candidate = fresh_candidate("cand-1", LicenseStatus::Unlicensed);

    match start_interview(&candidate, now()) {
        Err(OnboardingError::InvalidTransition { current, requested }) => {
            assert_eq!(current, InterviewStatus::NotStarted);
            assert_eq!(requested, InterviewStatus::InProgress);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn cancel_returns_to_not_started_and_clears_the_slot() {
    let candidate = fresh_candidate("cand-1", LicenseStatus::Unlicensed);
    let scheduled = apply(
        &candidate,
        transition(
            &candidate,
            InterviewCommand::Schedule(schedule_request()),
            now(),
        )
        .expect("schedule"),
    );

    let cancelled = apply(
        &scheduled,
        cancel_interview(&scheduled, now()).expect("cancel"),
    );

    assert_eq!(cancelled.interview.status, InterviewStatus::NotStarted);
    assert!(cancelled.interview.scheduled_at.is_none());
    assert!(cancelled.interview.calendar_event_id.is_none());
}

#[test]
fn in_progress_interviews_cannot_be_cancelled() {
    let candidate = in_progress(&fresh_candidate("cand-1", LicenseStatus::Unlicensed));

    assert!(matches!(
        cancel_interview(&candidate, now()),
        Err(OnboardingError::InvalidTransition {
            current: InterviewStatus::InProgress,
            requested: InterviewStatus::NotStarted,
        })
    ));
}

#[test]
fn completion_requires_an_evaluation() {
    let candidate = in_progress(&fresh_candidate("cand-1", LicenseStatus::Unlicensed));

    match complete_interview(&candidate, now()) {
        Err(OnboardingError::EvaluationRequired) => {}
        other => panic!("expected evaluation required, got {other:?}"),
    }
}

#[test]
fn scores_averaging_exactly_four_pass() {
    let candidate = interviewed(
        &fresh_candidate("cand-1", LicenseStatus::Unlicensed),
        &[[3, 4, 4, 3, 4], [4, 4, 5, 4, 5]],
    );

    assert_eq!(candidate.interview.status, InterviewStatus::Completed);
    assert_eq!(candidate.interview.result, Some(InterviewResult::Passed));
    assert_eq!(
        candidate.background_check.status,
        BackgroundCheckStatus::Pending
    );
}

#[test]
fn low_scores_fail_and_leave_the_background_check_untouched() {
    let candidate = interviewed(
        &fresh_candidate("cand-1", LicenseStatus::Unlicensed),
        &[[3, 3, 3, 3, 3], [4, 3, 4, 3, 4]],
    );

    assert_eq!(candidate.interview.result, Some(InterviewResult::Failed));
    assert_eq!(
        candidate.background_check.status,
        BackgroundCheckStatus::NotStarted
    );
}

#[test]
fn completed_interviews_are_terminal() {
    let candidate = interviewed(
        &fresh_candidate("cand-1", LicenseStatus::Unlicensed),
        &passing_cards(),
    );

    assert!(matches!(
        complete_interview(&candidate, now()),
        Err(OnboardingError::InvalidTransition {
            current: InterviewStatus::Completed,
            ..
        })
    ));
    assert!(matches!(
        schedule_interview(&candidate, schedule_request(), now()),
        Err(OnboardingError::InvalidTransition { .. })
    ));
}

#[test]
fn every_command_from_every_status() {
    let fresh = fresh_candidate("cand-1", LicenseStatus::Unlicensed);
    let scheduled = apply(
        &fresh,
        schedule_interview(&fresh, schedule_request(), now()).expect("schedule"),
    );
    let started = in_progress(&fresh);
    let scored = apply(
        &started,
        add_evaluation(&started, draft("Panel", [4, 4, 4, 4, 4]), now()).expect("evaluation"),
    );
    let completed = interviewed(&fresh, &passing_cards());

    let commands = [
        InterviewCommand::Schedule(schedule_request()),
        InterviewCommand::Start,
        InterviewCommand::Cancel,
        InterviewCommand::Complete,
    ];
    let mut legal = Vec::new();

    for candidate in [&fresh, &scheduled, &scored, &completed] {
        let current = candidate.interview.status;
        for command in &commands {
            let requested = command.target();
            match transition(candidate, command.clone(), now()) {
                Ok(patch) => {
                    assert_eq!(apply(candidate, patch).interview.status, requested);
                    legal.push((current, requested));
                }
                Err(OnboardingError::InvalidTransition {
                    current: reported,
                    requested: asked,
                }) => {
                    assert_eq!(reported, current);
                    assert_eq!(asked, requested);
                }
                Err(other) => panic!("{current:?} -> {requested:?} failed with {other:?}"),
            }
        }
    }

    assert_eq!(
        legal,
        vec![
            (InterviewStatus::NotStarted, InterviewStatus::Scheduled),
            (InterviewStatus::Scheduled, InterviewStatus::InProgress),
            (InterviewStatus::Scheduled, InterviewStatus::NotStarted),
            (InterviewStatus::InProgress, InterviewStatus::Completed),
        ]
    );

    assert!(matches!(
        transition(&started, InterviewCommand::Complete, now()),
        Err(OnboardingError::EvaluationRequired)
    ));
}

#[test]
fn evaluations_are_closed_before_the_interview_starts() {
    let candidate = fresh_candidate("cand-1", LicenseStatus::Unlicensed);

    match add_evaluation(&candidate, draft("Panel", [4, 4, 4, 4, 4]), now()) {
        Err(OnboardingError::EvaluationClosed { status }) => {
            assert_eq!(status, InterviewStatus::NotStarted);
        }
        other => panic!("expected closed evaluation window, got {other:?}"),
    }
}

#[test]
fn late_evaluations_refresh_the_composite_but_keep_the_result() {
    let candidate = interviewed(
        &fresh_candidate("cand-1", LicenseStatus::Unlicensed),
        &passing_cards(),
    );
    let late = apply(
        &candidate,
        add_evaluation(&candidate, draft("Late Panelist", [1, 1, 1, 1, 1]), now())
            .expect("late evaluation"),
    );

    assert_eq!(late.interview.evaluations.len(), 3);
    assert!(late.interview.composite_score < 4.0);
    assert_eq!(late.interview.result, Some(InterviewResult::Passed));
}
