use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    BackgroundCheckStatus, Candidate, ChangeSource, InterviewResult, InterviewStatus,
};
use super::error::OnboardingError;
use super::interview::finish_interview;
use super::patch::CandidatePatch;
use super::stages::OnboardingStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgroundOverride {
    Completed,
    Failed,
}

impl BackgroundOverride {
    const fn status(self) -> BackgroundCheckStatus {
        match self {
            BackgroundOverride::Completed => BackgroundCheckStatus::Completed,
            BackgroundOverride::Failed => BackgroundCheckStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualBackgroundDecision {
    pub outcome: BackgroundOverride,
    pub actor: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualInterviewDecision {
    pub result: InterviewResult,
    pub actor: String,
    #[serde(default)]
    pub note: Option<String>,
}

fn require_actor(actor: &str) -> Result<String, OnboardingError> {
    let actor = actor.trim();
    if actor.is_empty() {
        return Err(OnboardingError::InvalidPatch(
            "manual overrides must name the acting user".to_string(),
        ));
    }
    Ok(actor.to_string())
}

fn describe(action: &str, note: Option<&str>) -> String {
    match note.map(str::trim).filter(|note| !note.is_empty()) {
        Some(note) => format!("{action}: {note}"),
        None => action.to_string(),
    }
}

/// Force the background check to a terminal status without waiting on the vendor.
/// Leaves a `ChangeSource::Manual` audit entry naming the actor.
pub fn force_background_check(
    candidate: &Candidate,
    decision: &ManualBackgroundDecision,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    let actor = require_actor(&decision.actor)?;
    if !candidate.interview.passed() {
        return Err(OnboardingError::StageLocked {
            step: OnboardingStep::BackgroundCheck,
            requirement: "interview must be completed and passed",
        });
    }
    if !candidate.background_check.initiated {
        return Err(OnboardingError::StageLocked {
            step: OnboardingStep::BackgroundCheck,
            requirement: "background check must be initiated",
        });
    }

    let status = decision.outcome.status();
    warn!(
        candidate = %candidate.id,
        %actor,
        from = %candidate.background_check.status,
        to = %status,
        "manual background check override"
    );

    let mut check = candidate.background_check.clone();
    check.status = status;
    check.passed = Some(status == BackgroundCheckStatus::Completed);
    check.completed_at = Some(now);

    Ok(CandidatePatch {
        background_check: Some(check),
        ..CandidatePatch::default()
    }
    .record(
        now,
        describe(
            &format!("background check manually set to {status}"),
            decision.note.as_deref(),
        ),
        ChangeSource::Manual { actor },
    ))
}

/// Complete an in-progress interview with a chosen result, even with no scorecards.
pub fn force_interview_result(
    candidate: &Candidate,
    decision: &ManualInterviewDecision,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    let actor = require_actor(&decision.actor)?;
    let current = candidate.interview.status;
    if current != InterviewStatus::InProgress {
        return Err(OnboardingError::InvalidTransition {
            current,
            requested: InterviewStatus::Completed,
        });
    }

    warn!(
        candidate = %candidate.id,
        %actor,
        result = decision.result.label(),
        "manual interview result override"
    );

    Ok(finish_interview(candidate, Some(decision.result), now).record(
        now,
        describe(
            &format!("interview manually marked {}", decision.result.label()),
            decision.note.as_deref(),
        ),
        ChangeSource::Manual { actor },
    ))
}
