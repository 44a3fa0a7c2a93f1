use super::common::*;
use crate::workflows::onboarding::actions::{
    complete_training, record_license_exam, send_offer, sign_offer, update_checklist,
};
use crate::workflows::onboarding::domain::{
    CallCenter, Candidate, ClassType, LicenseStatus, OfferKind,
};
use crate::workflows::onboarding::eligibility::assign_to_cohort;
use crate::workflows::onboarding::patch::{CandidatePatch, ChecklistUpdate};
use crate::workflows::onboarding::stages::OnboardingStep;
use crate::workflows::onboarding::{ChecklistItem, OnboardingError};

fn trained(id: &str) -> Candidate {
    let cleared = cleared_candidate(id, LicenseStatus::Unlicensed);
    let signed = apply(
        &cleared,
        sign_offer(&cleared, OfferKind::PreLicense, now()).expect("sign"),
    );
    let cohort = cohort("unl-1", CallCenter::Phoenix, ClassType::Unlicensed);
    let in_class = apply(
        &signed,
        assign_to_cohort(&signed, &cohort, now())
            .expect("eligible")
            .candidate_patch,
    );
    apply(
        &in_class,
        complete_training(&in_class, now()).expect("training"),
    )
}

#[test]
fn pre_license_offer_waits_for_a_cleared_background_check() {
    let passed = interviewed(
        &fresh_candidate("cand-1", LicenseStatus::Unlicensed),
        &passing_cards(),
    );

    match send_offer(&passed, OfferKind::PreLicense, now()) {
        Err(OnboardingError::StageLocked { step, .. }) => {
            assert_eq!(step, OnboardingStep::PreLicenseOffer);
        }
        other => panic!("expected locked offer, got {other:?}"),
    }
}

#[test]
fn full_agent_offer_requires_a_license() {
    let cleared = cleared_candidate("cand-1", LicenseStatus::Unlicensed);

    assert!(matches!(
        send_offer(&cleared, OfferKind::FullAgent, now()),
        Err(OnboardingError::StageLocked {
            step: OnboardingStep::FullAgentOffer,
            ..
        })
    ));
}

#[test]
fn offers_are_sent_then_signed_once() {
    let cleared = cleared_candidate("cand-1", LicenseStatus::Unlicensed);
    let sent = apply(
        &cleared,
        send_offer(&cleared, OfferKind::PreLicense, now()).expect("send"),
    );
    assert!(sent.offers.pre_license_offer.sent);
    assert!(matches!(
        send_offer(&sent, OfferKind::PreLicense, now()),
        Err(OnboardingError::InvalidPatch(_))
    ));

    let signed = apply(
        &sent,
        sign_offer(&sent, OfferKind::PreLicense, now()).expect("sign"),
    );
    assert!(signed.offers.pre_license_offer.signed);
    assert!(matches!(
        sign_offer(&signed, OfferKind::PreLicense, now()),
        Err(OnboardingError::InvalidPatch(_))
    ));
}

#[test]
fn training_needs_a_class_assignment() {
    let cleared = cleared_candidate("cand-1", LicenseStatus::Unlicensed);
    let signed = apply(
        &cleared,
        sign_offer(&cleared, OfferKind::PreLicense, now()).expect("sign"),
    );

    assert!(matches!(
        complete_training(&signed, now()),
        Err(OnboardingError::StageLocked {
            step: OnboardingStep::TrainingCompletion,
            ..
        })
    ));
}

#[test]
fn failed_exam_attempts_are_counted() {
    let candidate = trained("cand-1");
    let first = apply(
        &candidate,
        record_license_exam(&candidate, false, now()).expect("attempt"),
    );
    assert_eq!(first.licensing.exam_attempts, 1);
    assert_eq!(first.license_status, LicenseStatus::Unlicensed);

    let second = apply(
        &first,
        record_license_exam(&first, true, now()).expect("attempt"),
    );
    assert_eq!(second.licensing.exam_attempts, 2);
    assert!(second.licensing.license_obtained);
    assert_eq!(second.license_status, LicenseStatus::Licensed);
    assert!(matches!(
        record_license_exam(&second, true, now()),
        Err(OnboardingError::InvalidPatch(_))
    ));
}

#[test]
fn checklist_is_locked_until_an_offer_is_signed() {
    let cleared = cleared_candidate("cand-1", LicenseStatus::Unlicensed);

    assert!(matches!(
        update_checklist(
            &cleared,
            ChecklistUpdate::single(ChecklistItem::Badge, true),
            now()
        ),
        Err(OnboardingError::StageLocked {
            step: OnboardingStep::ClassAssignment,
            ..
        })
    ));
}

#[test]
fn completing_the_checklist_sets_ready_to_go_and_reopening_clears_it() {
    let mut candidate = trained("cand-1");
    for item in ChecklistItem::ordered() {
        let patch = update_checklist(&candidate, ChecklistUpdate::single(item, true), now())
            .expect("checklist item");
        candidate = apply(&candidate, patch);
    }
    assert!(candidate.ready_to_go);
    assert_eq!(
        candidate.audit.last().map(|entry| entry.action.as_str()),
        Some("ready to go")
    );

    let unchanged = update_checklist(
        &candidate,
        ChecklistUpdate::single(ChecklistItem::Badge, true),
        now(),
    )
    .expect("no-op update");
    assert!(unchanged.is_empty());

    let reopened = apply(
        &candidate,
        update_checklist(
            &candidate,
            ChecklistUpdate::single(ChecklistItem::ItRequest, false),
            now(),
        )
        .expect("reopen"),
    );
    assert!(!reopened.ready_to_go);
}

#[test]
fn patches_cannot_mark_ready_with_an_open_checklist() {
    let candidate = trained("cand-1");
    let patch = CandidatePatch {
        ready_to_go: Some(true),
        ..CandidatePatch::default()
    };

    assert!(matches!(
        patch.apply(&candidate, now()),
        Err(OnboardingError::InvalidPatch(_))
    ));
}

#[test]
fn patches_reject_unknown_fields() {
    let parsed = serde_json::from_str::<CandidatePatch>(r#"{"ready_to_go": true, "salary": 1}"#);
    assert!(parsed.is_err());

    let parsed = serde_json::from_str::<CandidatePatch>(r#"{"ready_to_go": true}"#)
        .expect("known fields parse");
    assert_eq!(parsed.ready_to_go, Some(true));
}
