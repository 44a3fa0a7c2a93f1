use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use crate::workflows::cohort::{Cohort, CohortStage, Trainer};
use crate::workflows::monitor::{
    BackgroundCheckMonitor, BackgroundCheckVendor, MonitorPolicy, VendorError,
};
use crate::workflows::onboarding::background::{
    apply_vendor_report, record_initiation, BackgroundCheckRequest, PostalAddress,
    VendorReference, VendorReport, VendorSection,
};
use crate::workflows::onboarding::domain::{
    CallCenter, Candidate, CandidateId, ClassType, CohortId, EvaluationDraft, LicenseStatus,
    Recommendation, ScoreCard, TrainerId,
};
use crate::workflows::onboarding::intake::{new_candidate, CandidateIntake};
use crate::workflows::onboarding::interview::{
    add_evaluation, complete_interview, schedule_interview, start_interview, ScheduleRequest,
};
use crate::workflows::onboarding::patch::CandidatePatch;
use crate::workflows::onboarding::repository::{
    CandidateFilter, Notification, NotificationError, NotificationPublisher,
    OnboardingRepository, RepositoryError,
};
use crate::workflows::onboarding::{onboarding_router, OnboardingService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap()
}

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn intake(call_center: CallCenter, license_status: LicenseStatus) -> CandidateIntake {
    CandidateIntake {
        first_name: "Dana".to_string(),
        last_name: "Reyes".to_string(),
        email: "dana.reyes@example.com".to_string(),
        phone: Some("602-555-0148".to_string()),
        call_center,
        license_status,
    }
}

pub(super) fn fresh_candidate(id: &str, license_status: LicenseStatus) -> Candidate {
    new_candidate(
        intake(CallCenter::Phoenix, license_status),
        CandidateId(id.to_string()),
        now(),
    )
    .expect("valid intake")
}

pub(super) fn apply(candidate: &Candidate, patch: CandidatePatch) -> Candidate {
    patch.apply(candidate, now()).expect("patch applies")
}

pub(super) fn scores(values: [u8; 5]) -> ScoreCard {
    ScoreCard {
        communication: values[0],
        technical: values[1],
        customer_service: values[2],
        problem_solving: values[3],
        culture_fit: values[4],
    }
}

pub(super) fn draft(evaluator: &str, values: [u8; 5]) -> EvaluationDraft {
    EvaluationDraft {
        evaluator: evaluator.to_string(),
        scores: scores(values),
        recommendation: Recommendation::Recommend,
        strengths: String::new(),
        concerns: String::new(),
        notes: String::new(),
    }
}

pub(super) fn schedule_request() -> ScheduleRequest {
    ScheduleRequest {
        at: now() + Duration::days(2),
        location: "Phoenix HQ, Room 4".to_string(),
        calendar_event_id: "evt-2041".to_string(),
    }
}

pub(super) fn in_progress(candidate: &Candidate) -> Candidate {
    let scheduled = apply(
        candidate,
        schedule_interview(candidate, schedule_request(), now()).expect("schedule"),
    );
    apply(&scheduled, start_interview(&scheduled, now()).expect("start"))
}

/// Run a full interview with one scorecard per entry and complete it.
pub(super) fn interviewed(candidate: &Candidate, cards: &[[u8; 5]]) -> Candidate {
    let mut current = in_progress(candidate);
    for (index, card) in cards.iter().enumerate() {
        let patch = add_evaluation(&current, draft(&format!("Evaluator {index}"), *card), now())
            .expect("evaluation");
        current = apply(&current, patch);
    }
    apply(&current, complete_interview(&current, now()).expect("complete"))
}

pub(super) fn passing_cards() -> Vec<[u8; 5]> {
    vec![[4, 4, 5, 4, 5], [4, 4, 4, 4, 4]]
}

pub(super) fn vendor_report(reference: &str, overall: &str) -> VendorReport {
    VendorReport {
        reference: VendorReference(reference.to_string()),
        overall: overall.to_string(),
        sections: vec![
            VendorSection {
                name: "Federal".to_string(),
                status: "Pass".to_string(),
            },
            VendorSection {
                name: "Drug Screen".to_string(),
                status: "Pass".to_string(),
            },
        ],
    }
}

/// Interview passed and background check cleared through the vendor path.
pub(super) fn cleared_candidate(id: &str, license_status: LicenseStatus) -> Candidate {
    let passed = interviewed(&fresh_candidate(id, license_status), &passing_cards());
    let reference = VendorReference(format!("ref-{id}"));
    let submitted = apply(
        &passed,
        record_initiation(&passed, &reference, now()).expect("initiate"),
    );
    apply(
        &submitted,
        apply_vendor_report(&submitted, &vendor_report(&reference.0, "PASS"), now())
            .expect("vendor report"),
    )
}

pub(super) fn cohort(id: &str, call_center: CallCenter, class_type: ClassType) -> Cohort {
    Cohort {
        id: CohortId(id.to_string()),
        name: format!("{} {}", call_center.label(), class_type.label()),
        call_center,
        class_type,
        current_stage: CohortStage::Start,
        week_number: 0,
        start_date: date(2026, 3, 16),
        expected_end_date: date(2026, 5, 18),
        trainer_id: None,
        stage_statuses: Default::default(),
        milestones: Vec::new(),
        participant_ids: Vec::new(),
    }
}

pub(super) fn trainer(id: &str, call_center: CallCenter, capacity: u8) -> Trainer {
    Trainer {
        id: TrainerId(id.to_string()),
        name: format!("Trainer {id}"),
        call_center,
        capacity,
        active: true,
    }
}

pub(super) fn background_request() -> BackgroundCheckRequest {
    BackgroundCheckRequest {
        first_name: "Dana".to_string(),
        last_name: "Reyes".to_string(),
        ssn: "123-45-6789".to_string(),
        date_of_birth: date(1994, 5, 17),
        address: PostalAddress {
            street: "100 Main St".to_string(),
            city: "Phoenix".to_string(),
            state: "AZ".to_string(),
            postal_code: "85004".to_string(),
        },
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) candidates: Arc<Mutex<HashMap<CandidateId, Candidate>>>,
    pub(super) cohorts: Arc<Mutex<HashMap<CohortId, Cohort>>>,
    pub(super) trainers: Arc<Mutex<HashMap<TrainerId, Trainer>>>,
}

impl MemoryRepository {
    pub(super) fn seed_candidate(&self, candidate: Candidate) {
        self.candidates
            .lock()
            .expect("repository mutex poisoned")
            .insert(candidate.id.clone(), candidate);
    }

    pub(super) fn seed_cohort(&self, cohort: Cohort) {
        self.cohorts
            .lock()
            .expect("repository mutex poisoned")
            .insert(cohort.id.clone(), cohort);
    }

    pub(super) fn seed_trainer(&self, trainer: Trainer) {
        self.trainers
            .lock()
            .expect("repository mutex poisoned")
            .insert(trainer.id.clone(), trainer);
    }

    pub(super) fn stored(&self, id: &str) -> Candidate {
        self.fetch_candidate(&CandidateId(id.to_string()))
            .expect("fetch succeeds")
            .expect("candidate present")
    }

    pub(super) fn stored_cohort(&self, id: &str) -> Cohort {
        self.fetch_cohort(&CohortId(id.to_string()))
            .expect("fetch succeeds")
            .expect("cohort present")
    }
}

impl OnboardingRepository for MemoryRepository {
    fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        let mut guard = self.candidates.lock().expect("repository mutex poisoned");
        if guard.contains_key(&candidate.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(candidate.id.clone(), candidate.clone());
        Ok(candidate)
    }

    fn update_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError> {
        let mut guard = self.candidates.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&candidate.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(candidate.id.clone(), candidate);
        Ok(())
    }

    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        let guard = self.candidates.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, RepositoryError> {
        let guard = self.candidates.lock().expect("repository mutex poisoned");
        let mut candidates: Vec<Candidate> = guard
            .values()
            .filter(|candidate| filter.matches(candidate))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(candidates)
    }

    fn delete_candidate(&self, id: &CandidateId) -> Result<bool, RepositoryError> {
        let mut guard = self.candidates.lock().expect("repository mutex poisoned");
        Ok(guard.remove(id).is_some())
    }

    fn insert_cohort(&self, cohort: Cohort) -> Result<Cohort, RepositoryError> {
        let mut guard = self.cohorts.lock().expect("repository mutex poisoned");
        if guard.contains_key(&cohort.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(cohort.id.clone(), cohort.clone());
        Ok(cohort)
    }

    fn update_cohort(&self, cohort: Cohort) -> Result<(), RepositoryError> {
        let mut guard = self.cohorts.lock().expect("repository mutex poisoned");
        guard.insert(cohort.id.clone(), cohort);
        Ok(())
    }

    fn fetch_cohort(&self, id: &CohortId) -> Result<Option<Cohort>, RepositoryError> {
        let guard = self.cohorts.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_cohorts(&self) -> Result<Vec<Cohort>, RepositoryError> {
        let guard = self.cohorts.lock().expect("repository mutex poisoned");
        let mut cohorts: Vec<Cohort> = guard.values().cloned().collect();
        cohorts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(cohorts)
    }

    fn fetch_trainer(&self, id: &TrainerId) -> Result<Option<Trainer>, RepositoryError> {
        let guard = self.trainers.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_trainers(&self) -> Result<Vec<Trainer>, RepositoryError> {
        let guard = self.trainers.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

pub(super) struct UnavailableRepository;

impl OnboardingRepository for UnavailableRepository {
    fn insert_candidate(&self, _candidate: Candidate) -> Result<Candidate, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_candidate(&self, _candidate: Candidate) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_candidate(&self, _id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_candidates(&self, _filter: &CandidateFilter) -> Result<Vec<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete_candidate(&self, _id: &CandidateId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_cohort(&self, _cohort: Cohort) -> Result<Cohort, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_cohort(&self, _cohort: Cohort) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_cohort(&self, _id: &CohortId) -> Result<Option<Cohort>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_cohorts(&self) -> Result<Vec<Cohort>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_trainer(&self, _id: &TrainerId) -> Result<Option<Trainer>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_trainers(&self) -> Result<Vec<Trainer>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|notification| notification.template)
            .collect()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }

    fn forget(&self, candidate_id: &CandidateId) -> Result<usize, NotificationError> {
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        let before = guard.len();
        guard.retain(|notification| &notification.candidate_id != candidate_id);
        Ok(before - guard.len())
    }
}

/// Vendor that answers polls from a queue of overall statuses.
#[derive(Default)]
pub(super) struct ScriptedVendor {
    statuses: Mutex<VecDeque<Result<String, VendorError>>>,
    submissions: Mutex<usize>,
    reject_submissions: bool,
}

impl ScriptedVendor {
    pub(super) fn answering(statuses: &[&str]) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().map(|s| Ok(s.to_string())).collect()),
            ..Self::default()
        }
    }

    pub(super) fn rejecting() -> Self {
        Self {
            reject_submissions: true,
            ..Self::default()
        }
    }

    pub(super) fn submissions(&self) -> usize {
        *self.submissions.lock().expect("vendor mutex poisoned")
    }
}

impl BackgroundCheckVendor for ScriptedVendor {
    fn submit(&self, _request: &BackgroundCheckRequest) -> Result<VendorReference, VendorError> {
        if self.reject_submissions {
            return Err(VendorError::Rejected("ssn mismatch".to_string()));
        }
        let mut count = self.submissions.lock().expect("vendor mutex poisoned");
        *count += 1;
        Ok(VendorReference(format!("vendor-{count}")))
    }

    fn poll(&self, reference: &VendorReference) -> Result<VendorReport, VendorError> {
        let next = self
            .statuses
            .lock()
            .expect("vendor mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok("Pending".to_string()));
        next.map(|overall| vendor_report(&reference.0, &overall))
    }
}

pub(super) fn monitor_policy() -> MonitorPolicy {
    MonitorPolicy {
        poll_interval: Duration::minutes(15),
        max_polls: 4,
    }
}

pub(super) type TestService = OnboardingService<MemoryRepository, MemoryNotifications, ScriptedVendor>;

pub(super) fn build_service_with(
    vendor: ScriptedVendor,
) -> (
    TestService,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
    Arc<ScriptedVendor>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let vendor = Arc::new(vendor);
    let monitor = Arc::new(BackgroundCheckMonitor::new(vendor.clone(), monitor_policy()));
    let service = OnboardingService::new(repository.clone(), notifications.clone(), monitor);
    (service, repository, notifications, vendor)
}

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
    Arc<ScriptedVendor>,
) {
    build_service_with(ScriptedVendor::default())
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    onboarding_router(Arc::new(service))
}

pub(super) async fn send_json(
    router: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    router.oneshot(request).await.expect("router responds")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
