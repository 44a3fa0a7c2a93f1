use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::json;

use super::common::*;
use crate::workflows::monitor::BackgroundCheckMonitor;
use crate::workflows::onboarding::domain::{CallCenter, ClassType, LicenseStatus};
use crate::workflows::onboarding::OnboardingService;

#[tokio::test]
async fn create_route_returns_created_candidate_view() {
    let (service, _, _, _) = build_service();
    let router = router_with_service(service);

    let response = send_json(
        router,
        "POST",
        "/api/v1/candidates",
        Some(json!({
            "first_name": "Dana",
            "last_name": "Reyes",
            "email": "dana.reyes@example.com",
            "call_center": "Phoenix",
            "license_status": "Unlicensed"
        })),
    )
    .await;

    assert_status(&response, StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["candidate"]["status"], "Active");
    assert_eq!(body["progress"]["active_step"], "interview");
}

#[tokio::test]
async fn create_route_rejects_unknown_fields() {
    let (service, _, _, _) = build_service();
    let router = router_with_service(service);

    let response = send_json(
        router,
        "POST",
        "/api/v1/candidates",
        Some(json!({
            "first_name": "Dana",
            "last_name": "Reyes",
            "email": "dana.reyes@example.com",
            "call_center": "Phoenix",
            "license_status": "Unlicensed",
            "ready_to_go": true
        })),
    )
    .await;

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_route_validates_email() {
    let (service, _, _, _) = build_service();
    let router = router_with_service(service);

    let response = send_json(
        router,
        "POST",
        "/api/v1/candidates",
        Some(json!({
            "first_name": "Dana",
            "last_name": "Reyes",
            "email": "not-an-address",
            "call_center": "Tampa",
            "license_status": "Licensed"
        })),
    )
    .await;

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("email"));
}

#[tokio::test]
async fn list_route_filters_by_call_center() {
    let (service, repository, _, _) = build_service();
    repository.seed_candidate(fresh_candidate("cand-a", LicenseStatus::Unlicensed));
    let mut tampa = fresh_candidate("cand-b", LicenseStatus::Licensed);
    tampa.call_center = CallCenter::Tampa;
    repository.seed_candidate(tampa);
    let router = router_with_service(service);

    let response = send_json(router, "GET", "/api/v1/candidates?call_center=Tampa", None).await;

    assert_status(&response, StatusCode::OK);
    let body = read_json_body(response).await;
    let listed = body.as_array().expect("array body");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["candidate"]["id"], "cand-b");
}

#[tokio::test]
async fn missing_candidate_returns_not_found() {
    let (service, _, _, _) = build_service();
    let router = router_with_service(service);

    let response = send_json(router, "GET", "/api/v1/candidates/ghost", None).await;

    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn illegal_interview_transition_returns_conflict() {
    let (service, repository, _, _) = build_service();
    repository.seed_candidate(fresh_candidate("cand-1", LicenseStatus::Unlicensed));
    let router = router_with_service(service);

    let response = send_json(
        router,
        "POST",
        "/api/v1/candidates/cand-1/interview/complete",
        None,
    )
    .await;

    assert_status(&response, StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(
        body["error"],
        "interview cannot move from Not Started to Completed"
    );
}

#[tokio::test]
async fn completing_without_evaluations_returns_conflict() {
    let (service, repository, _, _) = build_service();
    repository.seed_candidate(in_progress(&fresh_candidate(
        "cand-1",
        LicenseStatus::Unlicensed,
    )));
    let router = router_with_service(service);

    let response = send_json(
        router,
        "POST",
        "/api/v1/candidates/cand-1/interview/complete",
        None,
    )
    .await;

    assert_status(&response, StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("at least one evaluation"));
}

#[tokio::test]
async fn evaluation_route_records_scorecards() {
    let (service, repository, _, _) = build_service();
    repository.seed_candidate(in_progress(&fresh_candidate(
        "cand-1",
        LicenseStatus::Unlicensed,
    )));
    let router = router_with_service(service);

    let response = send_json(
        router,
        "POST",
        "/api/v1/candidates/cand-1/interview/evaluations",
        Some(serde_json::to_value(draft("Panel", [4, 4, 5, 4, 5])).expect("draft json")),
    )
    .await;

    assert_status(&response, StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["candidate"]["interview"]["composite_score"], 4.4);
}

#[tokio::test]
async fn ineligible_assignment_lists_reasons() {
    let (service, repository, _, _) = build_service();
    repository.seed_candidate(cleared_candidate("cand-1", LicenseStatus::Unlicensed));
    repository.seed_cohort(cohort("unl-1", CallCenter::Phoenix, ClassType::Unlicensed));
    let router = router_with_service(service);

    let response = send_json(
        router,
        "POST",
        "/api/v1/cohorts/unl-1/participants",
        Some(json!({ "candidate_id": "cand-1" })),
    )
    .await;

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(
        body["reasons"],
        json!(["Pre-license offer must be signed for UNL class"])
    );
}

#[tokio::test]
async fn eligibility_route_reports_messages() {
    let (service, repository, _, _) = build_service();
    repository.seed_candidate(fresh_candidate("cand-1", LicenseStatus::Licensed));
    repository.seed_cohort(cohort("agent-1", CallCenter::Phoenix, ClassType::Agent));
    let router = router_with_service(service);

    let response = send_json(
        router,
        "GET",
        "/api/v1/cohorts/agent-1/eligibility/cand-1",
        None,
    )
    .await;

    assert_status(&response, StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["is_eligible"], false);
    assert_eq!(
        body["reasons"],
        json!(["Background check must be Completed (currently Not Started)"])
    );
}

#[tokio::test]
async fn offer_routes_parse_the_offer_kind() {
    let (service, repository, notifications, _) = build_service();
    repository.seed_candidate(cleared_candidate("cand-1", LicenseStatus::Unlicensed));
    let router = router_with_service(service);

    let sent = send_json(
        router.clone(),
        "POST",
        "/api/v1/candidates/cand-1/offers/pre_license/send",
        None,
    )
    .await;
    assert_status(&sent, StatusCode::OK);
    assert_eq!(notifications.templates(), vec!["offer_sent".to_string()]);

    let locked = send_json(
        router.clone(),
        "POST",
        "/api/v1/candidates/cand-1/offers/full_agent/send",
        None,
    )
    .await;
    assert_status(&locked, StatusCode::CONFLICT);

    let unknown = send_json(
        router,
        "POST",
        "/api/v1/candidates/cand-1/offers/signing_bonus/send",
        None,
    )
    .await;
    assert_status(&unknown, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_vendor_submission_returns_unprocessable() {
    let (service, repository, _, _) = build_service_with(ScriptedVendor::rejecting());
    repository.seed_candidate(interviewed(
        &fresh_candidate("cand-1", LicenseStatus::Unlicensed),
        &passing_cards(),
    ));
    let router = router_with_service(service);

    let response = send_json(
        router,
        "POST",
        "/api/v1/candidates/cand-1/background-check",
        Some(serde_json::to_value(background_request()).expect("request json")),
    )
    .await;

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn background_check_route_accepts_submissions() {
    let (service, repository, _, _) = build_service();
    repository.seed_candidate(interviewed(
        &fresh_candidate("cand-1", LicenseStatus::Unlicensed),
        &passing_cards(),
    ));
    let router = router_with_service(service);

    let response = send_json(
        router,
        "POST",
        "/api/v1/candidates/cand-1/background-check",
        Some(serde_json::to_value(background_request()).expect("request json")),
    )
    .await;

    assert_status(&response, StatusCode::ACCEPTED);
    let body = read_json_body(response).await;
    assert_eq!(
        body["candidate"]["background_check"]["status"],
        "In Progress"
    );
}

#[tokio::test]
async fn cohort_routes_create_and_report_progress() {
    let (service, _, _, _) = build_service();
    let router = router_with_service(service);

    let created = send_json(
        router.clone(),
        "POST",
        "/api/v1/cohorts",
        Some(
            serde_json::to_value(cohort("unl-1", CallCenter::Phoenix, ClassType::Unlicensed))
                .expect("cohort json"),
        ),
    )
    .await;
    assert_status(&created, StatusCode::CREATED);

    let advanced = send_json(
        router.clone(),
        "POST",
        "/api/v1/cohorts/unl-1/advance",
        Some(json!({ "note": "orientation kicked off" })),
    )
    .await;
    assert_status(&advanced, StatusCode::OK);
    let body = read_json_body(advanced).await;
    assert_eq!(body["current_stage"], "WK_1_ORIENTATION");
    assert_eq!(body["progress"], 14);

    let progress = send_json(router, "GET", "/api/v1/cohorts/unl-1/progress", None).await;
    assert_status(&progress, StatusCode::OK);
}

#[tokio::test]
async fn trainer_route_lists_roster_in_id_order() {
    let (service, repository, _, _) = build_service();
    repository.seed_trainer(trainer("tr-2", CallCenter::Tampa, 1));
    repository.seed_trainer(trainer("tr-1", CallCenter::Phoenix, 2));
    let router = router_with_service(service);

    let response = send_json(router, "GET", "/api/v1/trainers", None).await;
    assert_status(&response, StatusCode::OK);
    let body = read_json_body(response).await;
    let roster = body.as_array().expect("trainer array");
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0]["id"], "tr-1");
    assert_eq!(roster[0]["call_center"], "Phoenix");
    assert_eq!(roster[1]["id"], "tr-2");
    assert_eq!(roster[1]["capacity"], 1);
}

#[tokio::test]
async fn handler_reports_unavailable_storage() {
    let service = Arc::new(OnboardingService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryNotifications::default()),
        Arc::new(BackgroundCheckMonitor::new(
            Arc::new(ScriptedVendor::default()),
            monitor_policy(),
        )),
    ));

    let response = crate::workflows::onboarding::router::candidate_handler::<
        UnavailableRepository,
        MemoryNotifications,
        ScriptedVendor,
    >(State(service), Path("cand-1".to_string()))
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
