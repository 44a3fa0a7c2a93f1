use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::actions;
use super::background::{self, BackgroundCheckRequest, VendorReference, VendorReport};
use super::domain::{Candidate, CandidateId, CohortId, EvaluationDraft, OfferKind, TrainerId};
use super::eligibility::{self, EligibilityReport};
use super::error::{EntityKind, OnboardingError};
use super::evaluation::EvaluationSummary;
use super::intake::{new_candidate, next_candidate_id, CandidateIntake, RosterImport};
use super::interview::{self, InterviewCommand};
use super::overrides::{self, ManualBackgroundDecision, ManualInterviewDecision};
use super::patch::{CandidatePatch, ChecklistUpdate};
use super::repository::{
    CandidateFilter, CandidateView, Notification, NotificationChannel, NotificationError,
    NotificationPublisher, OnboardingRepository, RepositoryError,
};
use crate::workflows::cohort::{Cohort, CohortProgressView, Trainer};
use crate::workflows::monitor::{
    BackgroundCheckMonitor, BackgroundCheckVendor, MonitorEvent, VendorError,
};

/// Facade that loads snapshots, runs the pure transitions, and persists
/// validated patches.
pub struct OnboardingService<R, N, V> {
    repository: Arc<R>,
    notifications: Arc<N>,
    monitor: Arc<BackgroundCheckMonitor<V>>,
}

impl<R, N, V> OnboardingService<R, N, V>
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifications: Arc<N>,
        monitor: Arc<BackgroundCheckMonitor<V>>,
    ) -> Self {
        Self {
            repository,
            notifications,
            monitor,
        }
    }

    pub fn monitor(&self) -> &BackgroundCheckMonitor<V> {
        &self.monitor
    }

    fn candidate(&self, id: &CandidateId) -> Result<Candidate, OnboardingServiceError> {
        self.repository
            .fetch_candidate(id)?
            .ok_or_else(|| OnboardingError::missing(EntityKind::Candidate, id.0.clone()).into())
    }

    fn cohort(&self, id: &CohortId) -> Result<Cohort, OnboardingServiceError> {
        self.repository
            .fetch_cohort(id)?
            .ok_or_else(|| OnboardingError::missing(EntityKind::Cohort, id.0.clone()).into())
    }

    fn persist(
        &self,
        candidate: &Candidate,
        patch: CandidatePatch,
        now: DateTime<Utc>,
    ) -> Result<Candidate, OnboardingServiceError> {
        if patch.is_empty() {
            return Ok(candidate.clone());
        }
        let merged = patch.apply(candidate, now)?;
        self.repository
            .update_candidate(merged.clone())
            .map_err(|err| match err {
                RepositoryError::NotFound => OnboardingServiceError::Onboarding(
                    OnboardingError::missing(EntityKind::Candidate, candidate.id.0.clone()),
                ),
                other => OnboardingServiceError::Repository(other),
            })?;
        Ok(merged)
    }

    fn notify(
        &self,
        channel: NotificationChannel,
        template: &str,
        candidate: &Candidate,
        details: BTreeMap<String, String>,
    ) -> Result<(), OnboardingServiceError> {
        self.notifications.publish(Notification {
            channel,
            template: template.to_string(),
            candidate_id: candidate.id.clone(),
            details,
        })?;
        Ok(())
    }

    fn notify_ready_to_go(
        &self,
        before: &Candidate,
        after: &Candidate,
    ) -> Result<(), OnboardingServiceError> {
        if after.ready_to_go && !before.ready_to_go {
            let mut details = BTreeMap::new();
            if let Some(start) = after.class_assignment.start_date {
                details.insert("start_date".to_string(), start.to_string());
            }
            self.notify(NotificationChannel::Sms, "ready_to_go", after, details)?;
        }
        Ok(())
    }

    pub fn create_candidate(
        &self,
        intake: CandidateIntake,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = new_candidate(intake, next_candidate_id(), now)?;
        let stored = self.repository.insert_candidate(candidate)?;
        info!(candidate = %stored.id, call_center = stored.call_center.label(), "candidate created");
        Ok(CandidateView::new(stored))
    }

    /// Insert every accepted roster row; stops at the first storage failure.
    pub fn import_roster(
        &self,
        roster: RosterImport,
        now: DateTime<Utc>,
    ) -> Result<Vec<CandidateView>, OnboardingServiceError> {
        for rejection in &roster.rejected {
            warn!(row = rejection.row, reason = %rejection.reason, "roster row skipped");
        }
        roster
            .intakes
            .into_iter()
            .map(|intake| self.create_candidate(intake, now))
            .collect()
    }

    pub fn get_candidate(&self, id: &CandidateId) -> Result<CandidateView, OnboardingServiceError> {
        Ok(CandidateView::new(self.candidate(id)?))
    }

    pub fn list_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<CandidateView>, OnboardingServiceError> {
        Ok(self
            .repository
            .list_candidates(filter)?
            .into_iter()
            .map(CandidateView::new)
            .collect())
    }

    /// Remove a candidate together with cohort memberships, pending vendor
    /// polling, and notification history.
    pub fn delete_candidate(
        &self,
        id: &CandidateId,
    ) -> Result<DeletionSummary, OnboardingServiceError> {
        self.candidate(id)?;
        self.monitor.cancel(id);

        let mut cohorts_updated = Vec::new();
        for mut cohort in self.repository.list_cohorts()? {
            if cohort.has_participant(id) {
                cohort.participant_ids.retain(|participant| participant != id);
                cohorts_updated.push(cohort.id.clone());
                self.repository.update_cohort(cohort)?;
            }
        }

        let notifications_removed = self.notifications.forget(id)?;
        if !self.repository.delete_candidate(id)? {
            return Err(OnboardingError::missing(EntityKind::Candidate, id.0.clone()).into());
        }

        info!(candidate = %id, cohorts = cohorts_updated.len(), "candidate deleted");
        Ok(DeletionSummary {
            candidate_id: id.clone(),
            cohorts_updated,
            notifications_removed,
        })
    }

    pub fn interview(
        &self,
        id: &CandidateId,
        command: InterviewCommand,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        let requested = command.target();
        let patch = interview::transition(&candidate, command, now)?;
        let updated = self.persist(&candidate, patch, now)?;
        info!(
            candidate = %id,
            from = %candidate.interview.status,
            to = %requested,
            "interview transition"
        );
        self.notify_interview_passed(&candidate, &updated)?;
        Ok(CandidateView::new(updated))
    }

    fn notify_interview_passed(
        &self,
        before: &Candidate,
        after: &Candidate,
    ) -> Result<(), OnboardingServiceError> {
        if after.interview.passed() && !before.interview.passed() {
            let mut details = BTreeMap::new();
            details.insert(
                "composite_score".to_string(),
                format!("{:.1}", after.interview.composite_score),
            );
            self.notify(NotificationChannel::Email, "interview_passed", after, details)?;
        }
        Ok(())
    }

    pub fn add_evaluation(
        &self,
        id: &CandidateId,
        draft: EvaluationDraft,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        let patch = interview::add_evaluation(&candidate, draft, now)?;
        let updated = self.persist(&candidate, patch, now)?;
        info!(
            candidate = %id,
            evaluations = updated.interview.evaluations.len(),
            composite = updated.interview.composite_score,
            "evaluation recorded"
        );
        Ok(CandidateView::new(updated))
    }

    pub fn evaluation_summary(
        &self,
        id: &CandidateId,
    ) -> Result<EvaluationSummary, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        Ok(EvaluationSummary::from_interview(&candidate.interview))
    }

    pub fn force_interview_result(
        &self,
        id: &CandidateId,
        decision: &ManualInterviewDecision,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        let patch = overrides::force_interview_result(&candidate, decision, now)?;
        let updated = self.persist(&candidate, patch, now)?;
        self.notify_interview_passed(&candidate, &updated)?;
        Ok(CandidateView::new(updated))
    }

    /// Submit the candidate to the screening vendor and start polling.
    pub fn initiate_background_check(
        &self,
        id: &CandidateId,
        request: &BackgroundCheckRequest,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        background::ensure_initiable(&candidate)?;

        let reference = self.monitor.submit(id, request, now)?;
        let recorded = background::record_initiation(&candidate, &reference, now)
            .map_err(OnboardingServiceError::from)
            .and_then(|patch| self.persist(&candidate, patch, now));
        match recorded {
            Ok(updated) => Ok(CandidateView::new(updated)),
            Err(err) => {
                self.monitor.cancel(id);
                Err(err)
            }
        }
    }

    /// Record a submission made outside the monitor and start polling it.
    pub fn record_background_reference(
        &self,
        id: &CandidateId,
        reference: VendorReference,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        let patch = background::record_initiation(&candidate, &reference, now)?;
        let updated = self.persist(&candidate, patch, now)?;
        self.monitor.watch(id.clone(), reference, now);
        Ok(CandidateView::new(updated))
    }

    pub fn apply_vendor_report(
        &self,
        id: &CandidateId,
        report: &VendorReport,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        let patch = background::apply_vendor_report(&candidate, report, now)?;
        let changed = !patch.is_empty();
        let updated = self.persist(&candidate, patch, now)?;
        if changed {
            info!(
                candidate = %id,
                from = %candidate.background_check.status,
                to = %updated.background_check.status,
                "background check updated from vendor"
            );
        }
        if updated.background_check.status.is_terminal() {
            self.monitor.cancel(id);
        }
        Ok(CandidateView::new(updated))
    }

    /// Run one monitor round and fold every report into the matching candidate.
    ///
    /// A failure for one candidate is logged and does not stop the round.
    pub fn poll_background_checks(&self, now: DateTime<Utc>) -> PollSummary {
        let mut summary = PollSummary::default();
        for event in self.monitor.poll_due(now) {
            match event {
                MonitorEvent::Report {
                    candidate_id,
                    report,
                } => {
                    summary.polled += 1;
                    match self.apply_vendor_report(&candidate_id, &report, now) {
                        Ok(_) => summary.applied += 1,
                        Err(error) => {
                            warn!(candidate = %candidate_id, %error, "vendor report not applied");
                            summary.failed += 1;
                        }
                    }
                }
                MonitorEvent::PollFailed { .. } => {
                    summary.polled += 1;
                    summary.failed += 1;
                }
                MonitorEvent::Abandoned { candidate_id, .. } => {
                    warn!(candidate = %candidate_id, "background check needs manual follow-up");
                    summary.abandoned += 1;
                }
            }
        }
        summary
    }

    pub fn force_background_check(
        &self,
        id: &CandidateId,
        decision: &ManualBackgroundDecision,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        let patch = overrides::force_background_check(&candidate, decision, now)?;
        let updated = self.persist(&candidate, patch, now)?;
        self.monitor.cancel(id);
        Ok(CandidateView::new(updated))
    }

    pub fn send_offer(
        &self,
        id: &CandidateId,
        kind: OfferKind,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        let patch = actions::send_offer(&candidate, kind, now)?;
        let updated = self.persist(&candidate, patch, now)?;
        info!(candidate = %id, offer = kind.label(), "offer sent");

        let mut details = BTreeMap::new();
        details.insert("offer".to_string(), kind.label().to_string());
        self.notify(NotificationChannel::Email, "offer_sent", &updated, details)?;
        Ok(CandidateView::new(updated))
    }

    pub fn sign_offer(
        &self,
        id: &CandidateId,
        kind: OfferKind,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        let patch = actions::sign_offer(&candidate, kind, now)?;
        let updated = self.persist(&candidate, patch, now)?;
        info!(candidate = %id, offer = kind.label(), "offer signed");
        Ok(CandidateView::new(updated))
    }

    pub fn complete_training(
        &self,
        id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        let patch = actions::complete_training(&candidate, now)?;
        Ok(CandidateView::new(self.persist(&candidate, patch, now)?))
    }

    pub fn record_license_exam(
        &self,
        id: &CandidateId,
        passed: bool,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        let patch = actions::record_license_exam(&candidate, passed, now)?;
        let updated = self.persist(&candidate, patch, now)?;
        info!(
            candidate = %id,
            passed,
            attempts = updated.licensing.exam_attempts,
            "license exam recorded"
        );
        Ok(CandidateView::new(updated))
    }

    pub fn update_checklist(
        &self,
        id: &CandidateId,
        update: ChecklistUpdate,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(id)?;
        let patch = actions::update_checklist(&candidate, update, now)?;
        let updated = self.persist(&candidate, patch, now)?;
        self.notify_ready_to_go(&candidate, &updated)?;
        Ok(CandidateView::new(updated))
    }

    pub fn create_cohort(&self, cohort: Cohort) -> Result<Cohort, OnboardingServiceError> {
        if cohort.name.trim().is_empty() {
            return Err(OnboardingError::InvalidPatch("cohort name is required".to_string()).into());
        }
        if cohort.expected_end_date < cohort.start_date {
            return Err(OnboardingError::InvalidPatch(
                "cohort cannot end before it starts".to_string(),
            )
            .into());
        }
        let stored = self.repository.insert_cohort(cohort)?;
        info!(cohort = %stored.id, class_type = stored.class_type.label(), "cohort created");
        Ok(stored)
    }

    pub fn cohort_progress(
        &self,
        id: &CohortId,
        today: NaiveDate,
    ) -> Result<CohortProgressView, OnboardingServiceError> {
        Ok(CohortProgressView::for_cohort(&self.cohort(id)?, today))
    }

    pub fn list_cohort_progress(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<CohortProgressView>, OnboardingServiceError> {
        Ok(self
            .repository
            .list_cohorts()?
            .iter()
            .map(|cohort| CohortProgressView::for_cohort(cohort, today))
            .collect())
    }

    /// Every trainer on file, ordered by id.
    pub fn list_trainers(&self) -> Result<Vec<Trainer>, OnboardingServiceError> {
        let mut trainers = self.repository.list_trainers()?;
        trainers.sort_by(|left, right| left.id.0.cmp(&right.id.0));
        Ok(trainers)
    }

    pub fn advance_cohort(
        &self,
        id: &CohortId,
        today: NaiveDate,
        note: Option<String>,
    ) -> Result<CohortProgressView, OnboardingServiceError> {
        let cohort = self.cohort(id)?;
        let advanced = cohort.advanced(today, note)?;
        self.repository.update_cohort(advanced.clone())?;
        info!(
            cohort = %id,
            from = cohort.current_stage.code(),
            to = advanced.current_stage.code(),
            "cohort advanced"
        );
        Ok(CohortProgressView::for_cohort(&advanced, today))
    }

    pub fn assign_trainer(
        &self,
        cohort_id: &CohortId,
        trainer_id: &TrainerId,
    ) -> Result<Cohort, OnboardingServiceError> {
        let mut cohort = self.cohort(cohort_id)?;
        let trainer = self
            .repository
            .fetch_trainer(trainer_id)?
            .ok_or_else(|| OnboardingError::missing(EntityKind::Trainer, trainer_id.0.clone()))?;

        if cohort.trainer_id.as_ref() == Some(trainer_id) {
            return Ok(cohort);
        }

        let load = trainer.active_load(&self.repository.list_cohorts()?);
        if !trainer.can_lead(&cohort, load) {
            let reason = if !trainer.active {
                "trainer is inactive"
            } else if trainer.call_center != cohort.call_center {
                "trainer works at a different call center"
            } else {
                "trainer is at capacity"
            };
            return Err(OnboardingError::TrainerUnavailable {
                trainer: trainer_id.0.clone(),
                reason,
            }
            .into());
        }

        cohort.trainer_id = Some(trainer_id.clone());
        self.repository.update_cohort(cohort.clone())?;
        Ok(cohort)
    }

    pub fn check_eligibility(
        &self,
        candidate_id: &CandidateId,
        cohort_id: &CohortId,
    ) -> Result<EligibilityReport, OnboardingServiceError> {
        let candidate = self.candidate(candidate_id)?;
        let cohort = self.cohort(cohort_id)?;
        Ok(eligibility::check_eligibility(&candidate, &cohort))
    }

    /// Candidates that may join the cohort, using the same rules as assignment.
    pub fn eligible_candidates(
        &self,
        cohort_id: &CohortId,
    ) -> Result<Vec<CandidateView>, OnboardingServiceError> {
        let cohort = self.cohort(cohort_id)?;
        let candidates = self.repository.list_candidates(&CandidateFilter {
            call_center: Some(cohort.call_center),
            ..CandidateFilter::default()
        })?;
        Ok(eligibility::eligible_candidates(&cohort, &candidates)
            .into_iter()
            .cloned()
            .map(CandidateView::new)
            .collect())
    }

    /// Place a candidate into a cohort, leaving any earlier cohort.
    pub fn assign_to_cohort(
        &self,
        candidate_id: &CandidateId,
        cohort_id: &CohortId,
        now: DateTime<Utc>,
    ) -> Result<CandidateView, OnboardingServiceError> {
        let candidate = self.candidate(candidate_id)?;
        let cohort = self.cohort(cohort_id)?;
        let assignment = eligibility::assign_to_cohort(&candidate, &cohort, now)?;

        let updated = self.persist(&candidate, assignment.candidate_patch, now)?;
        self.repository.update_cohort(assignment.cohort)?;

        if let Some(previous) = candidate
            .class_assignment
            .cohort_id
            .as_ref()
            .filter(|previous| *previous != cohort_id)
        {
            if let Some(mut old) = self.repository.fetch_cohort(previous)? {
                old.participant_ids.retain(|id| id != candidate_id);
                self.repository.update_cohort(old)?;
            }
        }

        info!(candidate = %candidate_id, cohort = %cohort_id, "candidate assigned to cohort");
        Ok(CandidateView::new(updated))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionSummary {
    pub candidate_id: CandidateId,
    pub cohorts_updated: Vec<CohortId>,
    pub notifications_removed: usize,
}

/// Counts from one monitor round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    pub polled: usize,
    pub applied: usize,
    pub failed: usize,
    pub abandoned: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum OnboardingServiceError {
    #[error(transparent)]
    Onboarding(#[from] OnboardingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Vendor(#[from] VendorError),
}
