use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::background::advance_to_at_least;
use super::domain::{
    BackgroundCheckStatus, Candidate, ChangeSource, EvaluationDraft, InterviewEvaluation,
    InterviewResult, InterviewStatus,
};
use super::error::OnboardingError;
use super::evaluation::{composite_score, passes_interview};
use super::patch::CandidatePatch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub at: DateTime<Utc>,
    pub location: String,
    pub calendar_event_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterviewCommand {
    Schedule(ScheduleRequest),
    Start,
    Cancel,
    Complete,
}

impl InterviewCommand {
    /// Status the command asks the interview to move into.
    pub fn target(&self) -> InterviewStatus {
        match self {
            InterviewCommand::Schedule(_) => InterviewStatus::Scheduled,
            InterviewCommand::Start => InterviewStatus::InProgress,
            InterviewCommand::Cancel => InterviewStatus::NotStarted,
            InterviewCommand::Complete => InterviewStatus::Completed,
        }
    }
}

/// `Scheduled -> Not Started` (cancel) is the only backwards edge and
/// `Completed` is terminal.
pub fn transition(
    candidate: &Candidate,
    command: InterviewCommand,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    match command {
        InterviewCommand::Schedule(request) => schedule_interview(candidate, request, now),
        InterviewCommand::Start => start_interview(candidate, now),
        InterviewCommand::Cancel => cancel_interview(candidate, now),
        InterviewCommand::Complete => complete_interview(candidate, now),
    }
}

fn require_status(
    candidate: &Candidate,
    expected: InterviewStatus,
    requested: InterviewStatus,
) -> Result<(), OnboardingError> {
    let current = candidate.interview.status;
    if current == expected {
        Ok(())
    } else {
        Err(OnboardingError::InvalidTransition { current, requested })
    }
}

pub fn schedule_interview(
    candidate: &Candidate,
    request: ScheduleRequest,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    require_status(
        candidate,
        InterviewStatus::NotStarted,
        InterviewStatus::Scheduled,
    )?;

    if request.at <= now {
        return Err(OnboardingError::InvalidSchedule(format!(
            "interview time {} is not in the future",
            request.at.to_rfc3339()
        )));
    }
    let location = request.location.trim();
    if location.is_empty() {
        return Err(OnboardingError::InvalidSchedule(
            "location is required".to_string(),
        ));
    }
    let event_id = request.calendar_event_id.trim();
    if event_id.is_empty() {
        return Err(OnboardingError::InvalidSchedule(
            "calendar event reference is required".to_string(),
        ));
    }

    let mut interview = candidate.interview.clone();
    interview.status = InterviewStatus::Scheduled;
    interview.scheduled_at = Some(request.at);
    interview.location = Some(location.to_string());
    interview.calendar_event_id = Some(event_id.to_string());

    Ok(CandidatePatch {
        interview: Some(interview),
        ..CandidatePatch::default()
    }
    .record(now, "interview scheduled", ChangeSource::Automated))
}

pub fn start_interview(
    candidate: &Candidate,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    require_status(
        candidate,
        InterviewStatus::Scheduled,
        InterviewStatus::InProgress,
    )?;

    let mut interview = candidate.interview.clone();
    interview.status = InterviewStatus::InProgress;
    interview.started_at = Some(now);

    Ok(CandidatePatch {
        interview: Some(interview),
        ..CandidatePatch::default()
    }
    .record(now, "interview started", ChangeSource::Automated))
}

pub fn cancel_interview(
    candidate: &Candidate,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    require_status(
        candidate,
        InterviewStatus::Scheduled,
        InterviewStatus::NotStarted,
    )?;

    let mut interview = candidate.interview.clone();
    interview.status = InterviewStatus::NotStarted;
    interview.scheduled_at = None;
    interview.location = None;
    interview.calendar_event_id = None;

    Ok(CandidatePatch {
        interview: Some(interview),
        ..CandidatePatch::default()
    }
    .record(now, "interview cancelled", ChangeSource::Automated))
}

pub fn complete_interview(
    candidate: &Candidate,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    require_status(
        candidate,
        InterviewStatus::InProgress,
        InterviewStatus::Completed,
    )?;

    if candidate.interview.evaluations.is_empty() {
        return Err(OnboardingError::EvaluationRequired);
    }

    Ok(finish_interview(candidate, None, now).record(
        now,
        "interview completed",
        ChangeSource::Automated,
    ))
}

/// Shared completion path. A forced result skips the score threshold.
pub(crate) fn finish_interview(
    candidate: &Candidate,
    forced: Option<InterviewResult>,
    now: DateTime<Utc>,
) -> CandidatePatch {
    let mut interview = candidate.interview.clone();
    interview.composite_score = composite_score(&interview.evaluations);
    interview.result = Some(forced.unwrap_or(if passes_interview(&interview.evaluations) {
        InterviewResult::Passed
    } else {
        InterviewResult::Failed
    }));
    interview.result_overridden = forced.is_some();
    interview.status = InterviewStatus::Completed;
    interview.completed_at = Some(now);

    let background_check = if interview.result == Some(InterviewResult::Passed) {
        let mut check = candidate.background_check.clone();
        advance_to_at_least(&mut check, BackgroundCheckStatus::Pending);
        Some(check)
    } else {
        None
    };

    CandidatePatch {
        interview: Some(interview),
        background_check,
        ..CandidatePatch::default()
    }
}

/// Append a scorecard and refresh the composite score.
///
/// A completed interview keeps the result decided at completion.
pub fn add_evaluation(
    candidate: &Candidate,
    draft: EvaluationDraft,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    let status = candidate.interview.status;
    if !matches!(
        status,
        InterviewStatus::InProgress | InterviewStatus::Completed
    ) {
        return Err(OnboardingError::EvaluationClosed { status });
    }

    let evaluation = InterviewEvaluation::from_draft(draft, now)?;
    let evaluator = evaluation.evaluator.clone();

    let mut interview = candidate.interview.clone();
    interview.evaluations.push(evaluation);
    interview.composite_score = composite_score(&interview.evaluations);

    Ok(CandidatePatch {
        interview: Some(interview),
        ..CandidatePatch::default()
    }
    .record(
        now,
        format!("evaluation submitted by {evaluator}"),
        ChangeSource::Automated,
    ))
}
