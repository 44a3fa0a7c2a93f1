//! Candidate onboarding: interview scoring, background checks, offers,
//! licensing, class assignment, and the step list derived from them.
//!
//! Transition functions are pure and return a [`CandidatePatch`]; the
//! [`OnboardingService`] loads snapshots, applies validated patches, and
//! publishes notifications.

pub mod actions;
pub mod background;
pub mod domain;
pub mod eligibility;
pub mod error;
pub mod evaluation;
pub mod intake;
pub mod interview;
pub mod overrides;
pub mod patch;
pub mod repository;
pub mod router;
pub mod service;
pub mod stages;

#[cfg(test)]
mod tests;

pub use background::{
    map_vendor_status, BackgroundCheckRequest, PostalAddress, VendorReference, VendorReport,
    VendorSection, VENDOR_STATUS_TABLE,
};
pub use domain::{
    AuditEntry, BackgroundCheck, BackgroundCheckStatus, CallCenter, Candidate, CandidateId,
    CandidateStatus, ChangeSource, ChecklistItem, ClassAssignment, ClassType, CohortId,
    EvaluationDraft, InterviewEvaluation, InterviewRecord, InterviewResult, InterviewStatus,
    LicenseStatus, OfferKind, Recommendation, ScoreCard, TrainerId,
};
pub use eligibility::{check_eligibility, eligible_candidates, EligibilityReport, IneligibilityReason};
pub use error::{EntityKind, OnboardingError};
pub use evaluation::{
    composite_score, meets_hiring_criteria, passes_interview, EvaluationSummary, PASSING_SCORE,
};
pub use intake::{CandidateIntake, IntakeImportError, RosterImport, RosterImporter, RosterRejection};
pub use interview::{InterviewCommand, ScheduleRequest};
pub use overrides::{
    BackgroundOverride, ManualBackgroundDecision, ManualInterviewDecision,
};
pub use patch::{CandidatePatch, ChecklistUpdate};
pub use repository::{
    CandidateFilter, CandidateView, Notification, NotificationChannel, NotificationError,
    NotificationPublisher, OnboardingRepository, RepositoryError,
};
pub use router::onboarding_router;
pub use service::{DeletionSummary, OnboardingService, OnboardingServiceError, PollSummary};
pub use stages::{derive_steps, NextAction, OnboardingProgress, OnboardingStep, StepView};
