use std::fmt;

use serde::Serialize;

use super::domain::InterviewStatus;
use super::eligibility::IneligibilityReason;
use super::stages::OnboardingStep;

/// Kinds of records the decision engine reads from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Candidate,
    Cohort,
    Trainer,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Candidate => "candidate",
            EntityKind::Cohort => "cohort",
            EntityKind::Trainer => "trainer",
        };
        f.write_str(label)
    }
}

/// Structured failures raised by onboarding transitions and derivations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OnboardingError {
    #[error("interview cannot move from {current} to {requested}")]
    InvalidTransition {
        current: InterviewStatus,
        requested: InterviewStatus,
    },
    #[error("interview cannot be completed without at least one evaluation")]
    EvaluationRequired,
    #[error("evaluations cannot be added while the interview is {status}")]
    EvaluationClosed { status: InterviewStatus },
    #[error("candidate is not eligible for this cohort: {}", join_reasons(.reasons))]
    IneligibleAssignment { reasons: Vec<IneligibilityReason> },
    #[error("{kind} {id} not found")]
    StaleOrMissingEntity { kind: EntityKind, id: String },
    #[error("{} is locked: {requirement}", .step.label())]
    StageLocked {
        step: OnboardingStep,
        requirement: &'static str,
    },
    #[error("invalid interview schedule: {0}")]
    InvalidSchedule(String),
    #[error("invalid evaluation: {0}")]
    InvalidEvaluation(String),
    #[error("invalid candidate update: {0}")]
    InvalidPatch(String),
    #[error("cohort has already completed its final stage")]
    CohortFinished,
    #[error("trainer {trainer} cannot lead this cohort: {reason}")]
    TrainerUnavailable {
        trainer: String,
        reason: &'static str,
    },
}

impl OnboardingError {
    pub fn missing(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::StaleOrMissingEntity {
            kind,
            id: id.into(),
        }
    }
}

fn join_reasons(reasons: &[IneligibilityReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
