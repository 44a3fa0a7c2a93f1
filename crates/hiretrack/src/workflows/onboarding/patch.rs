use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AuditEntry, BackgroundCheck, BackgroundCheckStatus, Candidate, CandidateStatus, ChangeSource,
    ChecklistItem, ClassAssignment, InterviewRecord, InterviewStatus, LicenseStatus, Licensing,
    Offers,
};
use super::error::OnboardingError;
use super::evaluation::{average_score, composite_score};

const SCORE_TOLERANCE: f64 = 0.05;

/// Partial update produced by a transition. It is validated against the merged
/// record before the service persists it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CandidatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CandidateStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_status: Option<LicenseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview: Option<InterviewRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_check: Option<BackgroundCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offers: Option<Offers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licensing: Option<Licensing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_assignment: Option<ClassAssignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_to_go: Option<bool>,
    /// Entries appended to the candidate's audit trail.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit: Vec<AuditEntry>,
}

impl CandidatePatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.license_status.is_none()
            && self.interview.is_none()
            && self.background_check.is_none()
            && self.offers.is_none()
            && self.licensing.is_none()
            && self.class_assignment.is_none()
            && self.ready_to_go.is_none()
            && self.audit.is_empty()
    }

    pub(crate) fn record(
        mut self,
        at: DateTime<Utc>,
        action: impl Into<String>,
        source: ChangeSource,
    ) -> Self {
        self.audit.push(AuditEntry {
            at,
            action: action.into(),
            source,
        });
        self
    }

    /// Merge into a copy of `candidate`, rejecting results that break record invariants.
    pub fn apply(&self, candidate: &Candidate, now: DateTime<Utc>) -> Result<Candidate, OnboardingError> {
        let mut merged = candidate.clone();

        if let Some(status) = self.status {
            merged.status = status;
        }
        if let Some(license_status) = self.license_status {
            merged.license_status = license_status;
        }
        if let Some(interview) = &self.interview {
            merged.interview = interview.clone();
        }
        if let Some(background_check) = &self.background_check {
            merged.background_check = background_check.clone();
        }
        if let Some(offers) = &self.offers {
            merged.offers = offers.clone();
        }
        if let Some(licensing) = &self.licensing {
            merged.licensing = licensing.clone();
        }
        if let Some(class_assignment) = &self.class_assignment {
            merged.class_assignment = class_assignment.clone();
        }
        if let Some(ready_to_go) = self.ready_to_go {
            merged.ready_to_go = ready_to_go;
        }
        merged.audit.extend(self.audit.iter().cloned());

        validate_candidate(&merged)?;
        merged.updated_at = now;
        Ok(merged)
    }
}

/// Record-level invariants every persisted candidate satisfies.
pub fn validate_candidate(candidate: &Candidate) -> Result<(), OnboardingError> {
    validate_interview(&candidate.interview)?;

    let check = &candidate.background_check;
    match (check.status, check.passed) {
        (BackgroundCheckStatus::Completed, Some(false)) => {
            return Err(OnboardingError::InvalidPatch(
                "completed background check cannot be marked as not passed".to_string(),
            ))
        }
        (BackgroundCheckStatus::Failed, Some(true)) => {
            return Err(OnboardingError::InvalidPatch(
                "failed background check cannot be marked as passed".to_string(),
            ))
        }
        _ => {}
    }

    for (label, offer) in [
        ("pre-license offer", &candidate.offers.pre_license_offer),
        ("full agent offer", &candidate.offers.full_agent_offer),
    ] {
        if offer.signed && !offer.sent {
            return Err(OnboardingError::InvalidPatch(format!(
                "{label} cannot be signed before it is sent"
            )));
        }
    }

    if candidate.ready_to_go && !candidate.class_assignment.checklist_done() {
        return Err(OnboardingError::InvalidPatch(
            "ready to go requires every onboarding checklist item".to_string(),
        ));
    }

    Ok(())
}

fn validate_interview(interview: &InterviewRecord) -> Result<(), OnboardingError> {
    let completed = interview.status == InterviewStatus::Completed;
    if completed != interview.result.is_some() {
        return Err(OnboardingError::InvalidPatch(
            "interview result is present exactly when the interview is completed".to_string(),
        ));
    }

    for evaluation in &interview.evaluations {
        if (evaluation.average_score - average_score(&evaluation.scores)).abs() > SCORE_TOLERANCE {
            return Err(OnboardingError::InvalidPatch(format!(
                "evaluation by {} has an average inconsistent with its scores",
                evaluation.evaluator
            )));
        }
    }

    if (interview.composite_score - composite_score(&interview.evaluations)).abs() > SCORE_TOLERANCE
    {
        return Err(OnboardingError::InvalidPatch(
            "composite score does not match submitted evaluations".to_string(),
        ));
    }

    Ok(())
}

/// Partial checklist update; omitted items keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecklistUpdate {
    #[serde(default)]
    pub pre_start_call: Option<bool>,
    #[serde(default)]
    pub start_confirmed: Option<bool>,
    #[serde(default)]
    pub background_disclosure: Option<bool>,
    #[serde(default)]
    pub badge: Option<bool>,
    #[serde(default)]
    pub it_request: Option<bool>,
}

impl ChecklistUpdate {
    pub fn single(item: ChecklistItem, done: bool) -> Self {
        let mut update = Self::default();
        match item {
            ChecklistItem::PreStartCall => update.pre_start_call = Some(done),
            ChecklistItem::StartConfirmed => update.start_confirmed = Some(done),
            ChecklistItem::BackgroundDisclosure => update.background_disclosure = Some(done),
            ChecklistItem::Badge => update.badge = Some(done),
            ChecklistItem::ItRequest => update.it_request = Some(done),
        }
        update
    }

    pub fn entries(&self) -> impl Iterator<Item = (ChecklistItem, bool)> {
        [
            (ChecklistItem::PreStartCall, self.pre_start_call),
            (ChecklistItem::StartConfirmed, self.start_confirmed),
            (ChecklistItem::BackgroundDisclosure, self.background_disclosure),
            (ChecklistItem::Badge, self.badge),
            (ChecklistItem::ItRequest, self.it_request),
        ]
        .into_iter()
        .filter_map(|(item, value)| value.map(|done| (item, done)))
    }
}
