use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::background::BackgroundCheckRequest;
use super::domain::{CandidateId, CohortId, EvaluationDraft, OfferKind, TrainerId};
use super::error::OnboardingError;
use super::intake::CandidateIntake;
use super::interview::{InterviewCommand, ScheduleRequest};
use super::overrides::{ManualBackgroundDecision, ManualInterviewDecision};
use super::patch::ChecklistUpdate;
use super::repository::{
    CandidateFilter, NotificationPublisher, OnboardingRepository, RepositoryError,
};
use super::service::{OnboardingService, OnboardingServiceError};
use crate::workflows::cohort::Cohort;
use crate::workflows::monitor::{BackgroundCheckVendor, VendorError};

type Shared<R, N, V> = State<Arc<OnboardingService<R, N, V>>>;

/// Router exposing candidate onboarding and cohort endpoints.
pub fn onboarding_router<R, N, V>(service: Arc<OnboardingService<R, N, V>>) -> Router
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    Router::new()
        .route(
            "/api/v1/candidates",
            post(create_candidate_handler::<R, N, V>).get(list_candidates_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id",
            get(candidate_handler::<R, N, V>).delete(delete_candidate_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/interview/start",
            post(start_interview_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/interview/cancel",
            post(cancel_interview_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/interview/complete",
            post(complete_interview_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/interview/schedule",
            post(schedule_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/interview/evaluations",
            post(evaluation_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/interview/summary",
            get(evaluation_summary_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/interview/override",
            post(interview_override_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/background-check",
            post(background_check_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/background-check/override",
            post(background_override_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/offers/:kind/send",
            post(send_offer_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/offers/:kind/sign",
            post(sign_offer_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/training/complete",
            post(training_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/licensing/exam",
            post(license_exam_handler::<R, N, V>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/checklist",
            post(checklist_handler::<R, N, V>),
        )
        .route(
            "/api/v1/cohorts",
            post(create_cohort_handler::<R, N, V>).get(list_cohorts_handler::<R, N, V>),
        )
        .route("/api/v1/trainers", get(list_trainers_handler::<R, N, V>))
        .route(
            "/api/v1/cohorts/:cohort_id/progress",
            get(cohort_progress_handler::<R, N, V>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id/advance",
            post(advance_cohort_handler::<R, N, V>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id/trainer",
            post(assign_trainer_handler::<R, N, V>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id/eligible",
            get(eligible_candidates_handler::<R, N, V>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id/eligibility/:candidate_id",
            get(eligibility_handler::<R, N, V>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id/participants",
            post(assign_participant_handler::<R, N, V>),
        )
        .with_state(service)
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, OnboardingServiceError>) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: OnboardingServiceError) -> Response {
    let status = match &error {
        OnboardingServiceError::Onboarding(inner) => match inner {
            OnboardingError::InvalidTransition { .. }
            | OnboardingError::EvaluationRequired
            | OnboardingError::EvaluationClosed { .. }
            | OnboardingError::StageLocked { .. }
            | OnboardingError::CohortFinished
            | OnboardingError::TrainerUnavailable { .. } => StatusCode::CONFLICT,
            OnboardingError::IneligibleAssignment { reasons } => {
                let payload = json!({
                    "error": inner.to_string(),
                    "reasons": reasons.iter().map(ToString::to_string).collect::<Vec<_>>(),
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
            OnboardingError::InvalidSchedule(_)
            | OnboardingError::InvalidEvaluation(_)
            | OnboardingError::InvalidPatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OnboardingError::StaleOrMissingEntity { .. } => StatusCode::NOT_FOUND,
        },
        OnboardingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        OnboardingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        OnboardingServiceError::Repository(RepositoryError::Unavailable(_))
        | OnboardingServiceError::Vendor(VendorError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        OnboardingServiceError::Vendor(VendorError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        OnboardingServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn create_candidate_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    axum::Json(intake): axum::Json<CandidateIntake>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(StatusCode::CREATED, service.create_candidate(intake, Utc::now()))
}

pub(crate) async fn list_candidates_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Query(filter): Query<CandidateFilter>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(StatusCode::OK, service.list_candidates(&filter))
}

pub(crate) async fn candidate_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(StatusCode::OK, service.get_candidate(&CandidateId(candidate_id)))
}

pub(crate) async fn delete_candidate_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(StatusCode::OK, service.delete_candidate(&CandidateId(candidate_id)))
}

fn run_interview_command<R, N, V>(
    service: &OnboardingService<R, N, V>,
    candidate_id: String,
    command: InterviewCommand,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.interview(&CandidateId(candidate_id), command, Utc::now()),
    )
}

pub(crate) async fn start_interview_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    run_interview_command(&*service, candidate_id, InterviewCommand::Start)
}

pub(crate) async fn cancel_interview_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    run_interview_command(&*service, candidate_id, InterviewCommand::Cancel)
}

pub(crate) async fn complete_interview_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    run_interview_command(&*service, candidate_id, InterviewCommand::Complete)
}

pub(crate) async fn schedule_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
    axum::Json(request): axum::Json<ScheduleRequest>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    run_interview_command(&*service, candidate_id, InterviewCommand::Schedule(request))
}

pub(crate) async fn evaluation_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
    axum::Json(draft): axum::Json<EvaluationDraft>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::CREATED,
        service.add_evaluation(&CandidateId(candidate_id), draft, Utc::now()),
    )
}

pub(crate) async fn evaluation_summary_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.evaluation_summary(&CandidateId(candidate_id)),
    )
}

pub(crate) async fn interview_override_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
    axum::Json(decision): axum::Json<ManualInterviewDecision>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.force_interview_result(&CandidateId(candidate_id), &decision, Utc::now()),
    )
}

pub(crate) async fn background_check_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
    axum::Json(request): axum::Json<BackgroundCheckRequest>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::ACCEPTED,
        service.initiate_background_check(&CandidateId(candidate_id), &request, Utc::now()),
    )
}

pub(crate) async fn background_override_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
    axum::Json(decision): axum::Json<ManualBackgroundDecision>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.force_background_check(&CandidateId(candidate_id), &decision, Utc::now()),
    )
}

pub(crate) async fn send_offer_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path((candidate_id, kind)): Path<(String, OfferKind)>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.send_offer(&CandidateId(candidate_id), kind, Utc::now()),
    )
}

pub(crate) async fn sign_offer_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path((candidate_id, kind)): Path<(String, OfferKind)>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.sign_offer(&CandidateId(candidate_id), kind, Utc::now()),
    )
}

pub(crate) async fn training_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.complete_training(&CandidateId(candidate_id), Utc::now()),
    )
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LicenseExamBody {
    passed: bool,
}

pub(crate) async fn license_exam_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
    axum::Json(body): axum::Json<LicenseExamBody>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.record_license_exam(&CandidateId(candidate_id), body.passed, Utc::now()),
    )
}

pub(crate) async fn checklist_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(candidate_id): Path<String>,
    axum::Json(update): axum::Json<ChecklistUpdate>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.update_checklist(&CandidateId(candidate_id), update, Utc::now()),
    )
}

pub(crate) async fn create_cohort_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    axum::Json(cohort): axum::Json<Cohort>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(StatusCode::CREATED, service.create_cohort(cohort))
}

pub(crate) async fn list_trainers_handler<R, N, V>(State(service): Shared<R, N, V>) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(StatusCode::OK, service.list_trainers())
}

pub(crate) async fn list_cohorts_handler<R, N, V>(State(service): Shared<R, N, V>) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.list_cohort_progress(Utc::now().date_naive()),
    )
}

pub(crate) async fn cohort_progress_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(cohort_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.cohort_progress(&CohortId(cohort_id), Utc::now().date_naive()),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct AdvanceBody {
    #[serde(default)]
    note: Option<String>,
}

pub(crate) async fn advance_cohort_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(cohort_id): Path<String>,
    axum::Json(body): axum::Json<AdvanceBody>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.advance_cohort(&CohortId(cohort_id), Utc::now().date_naive(), body.note),
    )
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TrainerBody {
    trainer_id: TrainerId,
}

pub(crate) async fn assign_trainer_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(cohort_id): Path<String>,
    axum::Json(body): axum::Json<TrainerBody>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.assign_trainer(&CohortId(cohort_id), &body.trainer_id),
    )
}

pub(crate) async fn eligible_candidates_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(cohort_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.eligible_candidates(&CohortId(cohort_id)),
    )
}

pub(crate) async fn eligibility_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path((cohort_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    let report = service
        .check_eligibility(&CandidateId(candidate_id), &CohortId(cohort_id))
        .map(|report| {
            json!({
                "is_eligible": report.is_eligible,
                "reasons": report.messages(),
            })
        });
    respond(StatusCode::OK, report)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ParticipantBody {
    candidate_id: CandidateId,
}

pub(crate) async fn assign_participant_handler<R, N, V>(
    State(service): Shared<R, N, V>,
    Path(cohort_id): Path<String>,
    axum::Json(body): axum::Json<ParticipantBody>,
) -> Response
where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    respond(
        StatusCode::OK,
        service.assign_to_cohort(&body.candidate_id, &CohortId(cohort_id), Utc::now()),
    )
}
