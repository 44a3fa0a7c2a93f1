use chrono::{DateTime, Utc};

use super::domain::{BackgroundCheckStatus, Candidate, ChangeSource, LicenseStatus, OfferKind};
use super::error::OnboardingError;
use super::patch::{CandidatePatch, ChecklistUpdate};
use super::stages::OnboardingStep;

const fn offer_step(kind: OfferKind) -> OnboardingStep {
    match kind {
        OfferKind::PreLicense => OnboardingStep::PreLicenseOffer,
        OfferKind::FullAgent => OnboardingStep::FullAgentOffer,
    }
}

/// Same prerequisite the stage deriver shows as the offer's lock.
fn require_offer_unlocked(candidate: &Candidate, kind: OfferKind) -> Result<(), OnboardingError> {
    match kind {
        OfferKind::PreLicense
            if candidate.background_check.status != BackgroundCheckStatus::Completed =>
        {
            Err(OnboardingError::StageLocked {
                step: offer_step(kind),
                requirement: "background check must be completed",
            })
        }
        OfferKind::FullAgent if candidate.license_status != LicenseStatus::Licensed => {
            Err(OnboardingError::StageLocked {
                step: offer_step(kind),
                requirement: "candidate must be licensed",
            })
        }
        _ => Ok(()),
    }
}

pub fn send_offer(
    candidate: &Candidate,
    kind: OfferKind,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    require_offer_unlocked(candidate, kind)?;

    let mut offers = candidate.offers.clone();
    let offer = offers.get_mut(kind);
    if offer.sent {
        return Err(OnboardingError::InvalidPatch(format!(
            "{} already sent",
            kind.label()
        )));
    }
    offer.sent = true;
    offer.sent_at = Some(now);

    Ok(CandidatePatch {
        offers: Some(offers),
        ..CandidatePatch::default()
    }
    .record(now, format!("{} sent", kind.label()), ChangeSource::Automated))
}

/// Mark an offer signed. An unsent offer is stamped as sent at the same time.
pub fn sign_offer(
    candidate: &Candidate,
    kind: OfferKind,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    require_offer_unlocked(candidate, kind)?;

    let mut offers = candidate.offers.clone();
    let offer = offers.get_mut(kind);
    if offer.signed {
        return Err(OnboardingError::InvalidPatch(format!(
            "{} already signed",
            kind.label()
        )));
    }
    if !offer.sent {
        offer.sent = true;
        offer.sent_at = Some(now);
    }
    offer.signed = true;
    offer.signed_at = Some(now);

    Ok(CandidatePatch {
        offers: Some(offers),
        ..CandidatePatch::default()
    }
    .record(now, format!("{} signed", kind.label()), ChangeSource::Automated))
}

pub fn complete_training(
    candidate: &Candidate,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    if !candidate.is_unlicensed() {
        return Err(OnboardingError::StageLocked {
            step: OnboardingStep::TrainingCompletion,
            requirement: "training applies to unlicensed candidates only",
        });
    }
    if !candidate.offers.pre_license_offer.signed {
        return Err(OnboardingError::StageLocked {
            step: OnboardingStep::TrainingCompletion,
            requirement: "pre-license offer must be signed",
        });
    }
    if !candidate.class_assignment.is_assigned() {
        return Err(OnboardingError::StageLocked {
            step: OnboardingStep::TrainingCompletion,
            requirement: "candidate must be assigned to a class",
        });
    }

    let mut assignment = candidate.class_assignment.clone();
    if assignment.training_completed {
        return Ok(CandidatePatch::default());
    }
    assignment.training_completed = true;
    assignment.training_completed_at = Some(now);

    Ok(CandidatePatch {
        class_assignment: Some(assignment),
        ..CandidatePatch::default()
    }
    .record(now, "training completed", ChangeSource::Automated))
}

/// Record one licensing exam attempt. A pass flips the candidate to `Licensed`.
pub fn record_license_exam(
    candidate: &Candidate,
    passed: bool,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    if !candidate.class_assignment.training_completed {
        return Err(OnboardingError::StageLocked {
            step: OnboardingStep::LicensingMilestone,
            requirement: "training must be completed",
        });
    }
    if candidate.licensing.license_passed {
        return Err(OnboardingError::InvalidPatch(
            "license exam already passed".to_string(),
        ));
    }

    let mut licensing = candidate.licensing.clone();
    licensing.exam_attempts = licensing.exam_attempts.saturating_add(1);

    let mut patch = CandidatePatch::default();
    let action = if passed {
        licensing.license_passed = true;
        licensing.license_obtained = true;
        licensing.passed_at = Some(now);
        patch.license_status = Some(LicenseStatus::Licensed);
        format!("license exam passed on attempt {}", licensing.exam_attempts)
    } else {
        format!("license exam attempt {} failed", licensing.exam_attempts)
    };
    patch.licensing = Some(licensing);

    Ok(patch.record(now, action, ChangeSource::Automated))
}

/// Apply checklist changes and recompute `ready_to_go` from the result.
pub fn update_checklist(
    candidate: &Candidate,
    update: ChecklistUpdate,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    if !candidate.offers.any_signed() {
        return Err(OnboardingError::StageLocked {
            step: OnboardingStep::ClassAssignment,
            requirement: "an offer must be signed",
        });
    }

    let mut assignment = candidate.class_assignment.clone();
    let mut changed = Vec::new();
    for (item, done) in update.entries() {
        if assignment.item(item) != done {
            assignment.set_item(item, done);
            changed.push(format!(
                "{} {}",
                item.label(),
                if done { "done" } else { "reopened" }
            ));
        }
    }

    if changed.is_empty() {
        return Ok(CandidatePatch::default());
    }

    let ready_to_go = assignment.checklist_done();
    let mut patch = CandidatePatch {
        class_assignment: Some(assignment),
        ready_to_go: Some(ready_to_go),
        ..CandidatePatch::default()
    }
    .record(
        now,
        format!("checklist: {}", changed.join(", ")),
        ChangeSource::Automated,
    );
    if ready_to_go && !candidate.ready_to_go {
        patch = patch.record(now, "ready to go", ChangeSource::Automated);
    }
    Ok(patch)
}
