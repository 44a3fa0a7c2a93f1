use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{
    BackgroundCheckStatus, CallCenter, Candidate, CandidateStatus, ChangeSource, ClassType,
    LicenseStatus,
};
use super::error::OnboardingError;
use super::patch::CandidatePatch;
use crate::workflows::cohort::Cohort;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum IneligibilityReason {
    CallCenterMismatch {
        candidate: CallCenter,
        cohort: CallCenter,
    },
    CandidateNotActive {
        status: CandidateStatus,
    },
    BackgroundCheckIncomplete {
        status: BackgroundCheckStatus,
    },
    AlreadyParticipant,
    ConfirmedForDifferentStart {
        confirmed: NaiveDate,
        cohort: NaiveDate,
    },
    LicensedCandidateInUnlicensedClass,
    PreLicenseOfferUnsigned,
    UnlicensedCandidateInAgentClass,
}

impl fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibilityReason::CallCenterMismatch { candidate, cohort } => write!(
                f,
                "Candidate call center {} does not match cohort call center {}",
                candidate.label(),
                cohort.label()
            ),
            IneligibilityReason::CandidateNotActive { status } => {
                write!(f, "Candidate status must be Active (currently {})", status.label())
            }
            IneligibilityReason::BackgroundCheckIncomplete { status } => write!(
                f,
                "Background check must be Completed (currently {})",
                status.label()
            ),
            IneligibilityReason::AlreadyParticipant => {
                write!(f, "Candidate is already a participant of this cohort")
            }
            IneligibilityReason::ConfirmedForDifferentStart { confirmed, cohort } => write!(
                f,
                "Candidate is confirmed for a {} start, not this cohort's {} start",
                confirmed, cohort
            ),
            IneligibilityReason::LicensedCandidateInUnlicensedClass => {
                write!(f, "Candidate must be Unlicensed for UNL class")
            }
            IneligibilityReason::PreLicenseOfferUnsigned => {
                write!(f, "Pre-license offer must be signed for UNL class")
            }
            IneligibilityReason::UnlicensedCandidateInAgentClass => {
                write!(f, "Candidate must be Licensed for AGENT class")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityReport {
    pub is_eligible: bool,
    pub reasons: Vec<IneligibilityReason>,
}

impl EligibilityReport {
    pub fn messages(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}

/// Every rule is checked independently so all violations surface at once. The
/// pre-license offer gate applies to `UNL` cohorts only.
pub fn check_eligibility(candidate: &Candidate, cohort: &Cohort) -> EligibilityReport {
    let mut reasons = Vec::new();

    if candidate.call_center != cohort.call_center {
        reasons.push(IneligibilityReason::CallCenterMismatch {
            candidate: candidate.call_center,
            cohort: cohort.call_center,
        });
    }

    if candidate.status != CandidateStatus::Active {
        reasons.push(IneligibilityReason::CandidateNotActive {
            status: candidate.status,
        });
    }

    if candidate.background_check.status != BackgroundCheckStatus::Completed {
        reasons.push(IneligibilityReason::BackgroundCheckIncomplete {
            status: candidate.background_check.status,
        });
    }

    if cohort.has_participant(&candidate.id) {
        reasons.push(IneligibilityReason::AlreadyParticipant);
    }

    let assignment = &candidate.class_assignment;
    if let (true, Some(confirmed)) = (assignment.start_confirmed, assignment.start_date) {
        if confirmed != cohort.start_date {
            reasons.push(IneligibilityReason::ConfirmedForDifferentStart {
                confirmed,
                cohort: cohort.start_date,
            });
        }
    }

    match cohort.class_type {
        ClassType::Unlicensed => {
            if candidate.license_status != LicenseStatus::Unlicensed {
                reasons.push(IneligibilityReason::LicensedCandidateInUnlicensedClass);
            }
            if !candidate.offers.pre_license_offer.signed {
                reasons.push(IneligibilityReason::PreLicenseOfferUnsigned);
            }
        }
        ClassType::Agent => {
            if candidate.license_status != LicenseStatus::Licensed {
                reasons.push(IneligibilityReason::UnlicensedCandidateInAgentClass);
            }
        }
    }

    EligibilityReport {
        is_eligible: reasons.is_empty(),
        reasons,
    }
}

/// Candidates that may be added to `cohort`, in input order.
pub fn eligible_candidates<'a>(cohort: &Cohort, candidates: &'a [Candidate]) -> Vec<&'a Candidate> {
    candidates
        .iter()
        .filter(|candidate| check_eligibility(candidate, cohort).is_eligible)
        .collect()
}

/// Result of placing a candidate into a cohort.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortAssignment {
    pub candidate_patch: CandidatePatch,
    pub cohort: Cohort,
}

pub fn assign_to_cohort(
    candidate: &Candidate,
    cohort: &Cohort,
    now: DateTime<Utc>,
) -> Result<CohortAssignment, OnboardingError> {
    let report = check_eligibility(candidate, cohort);
    if !report.is_eligible {
        return Err(OnboardingError::IneligibleAssignment {
            reasons: report.reasons,
        });
    }

    let mut class_assignment = candidate.class_assignment.clone();
    class_assignment.class_type = Some(cohort.class_type);
    class_assignment.start_date = Some(cohort.start_date);
    class_assignment.cohort_id = Some(cohort.id.clone());

    let mut updated = cohort.clone();
    updated.participant_ids.push(candidate.id.clone());

    let candidate_patch = CandidatePatch {
        class_assignment: Some(class_assignment),
        ..CandidatePatch::default()
    }
    .record(
        now,
        format!(
            "assigned to {} class {} starting {}",
            cohort.class_type.label(),
            cohort.name,
            cohort.start_date
        ),
        ChangeSource::Automated,
    );

    Ok(CohortAssignment {
        candidate_patch,
        cohort: updated,
    })
}
