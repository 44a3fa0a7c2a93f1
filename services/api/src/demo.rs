use crate::infra::{
    default_trainers, InMemoryOnboardingStore, LoggingNotifications, SimulatedVendor,
};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use clap::Args;
use hiretrack::error::AppError;
use hiretrack::workflows::cohort::{Cohort, CohortProgressView, CohortStage};
use hiretrack::workflows::monitor::{BackgroundCheckMonitor, MonitorPolicy};
use hiretrack::workflows::onboarding::{
    BackgroundCheckRequest, CallCenter, CandidateId, CandidateIntake, CandidateView,
    ChecklistUpdate, ClassType, CohortId, EvaluationDraft, InterviewCommand, LicenseStatus,
    OfferKind, OnboardingService, PostalAddress, Recommendation, RosterImport, RosterImporter,
    ScheduleRequest, ScoreCard, TrainerId,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

type DemoService = OnboardingService<InMemoryOnboardingStore, LoggingNotifications, SimulatedVendor>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the demo pipeline starts on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Optional roster CSV whose candidates are created alongside the samples.
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Print every onboarding step instead of the active one only.
    #[arg(long)]
    pub(crate) show_steps: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RosterImportArgs {
    /// Roster CSV export (First Name,Last Name,Email,Phone,Call Center,License Status)
    #[arg(long)]
    pub(crate) path: PathBuf,
}

pub(crate) fn run_roster_import(args: RosterImportArgs) -> Result<(), AppError> {
    let import = RosterImporter::from_path(&args.path)?;
    render_roster(&import);
    Ok(())
}

fn render_roster(import: &RosterImport) {
    println!(
        "Roster: {} candidate(s) accepted, {} row(s) rejected",
        import.intakes.len(),
        import.rejected.len()
    );
    for intake in &import.intakes {
        println!(
            "  + {} {} <{}> | {} | {}",
            intake.first_name,
            intake.last_name,
            intake.email,
            intake.call_center.label(),
            intake.license_status.label()
        );
    }
    for rejection in &import.rejected {
        println!("  - row {}: {}", rejection.row, rejection.reason);
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let start = args.start.unwrap_or_else(|| Local::now().date_naive());
    let notifications = Arc::new(LoggingNotifications::default());
    let service = demo_service(notifications.clone());
    let clock = DemoClock::starting(start);

    println!("Onboarding tracker demo (starting {start})");

    if let Some(path) = args.roster {
        let import = RosterImporter::from_path(path)?;
        render_roster(&import);
        let created = service.import_roster(import, clock.at(0, 8))?;
        println!("Created {} candidate(s) from roster", created.len());
    }

    let unl_cohort = service.create_cohort(sample_cohort(
        "phx-unl",
        "Phoenix UNL",
        ClassType::Unlicensed,
        start + Duration::days(7),
    ))?;
    let agent_cohort = service.create_cohort(sample_cohort(
        "phx-agent",
        "Phoenix Agent",
        ClassType::Agent,
        start + Duration::days(7),
    ))?;
    service.assign_trainer(&unl_cohort.id, &TrainerId("trn-phx-01".to_string()))?;
    service.assign_trainer(&agent_cohort.id, &TrainerId("trn-phx-01".to_string()))?;

    let dana = service.create_candidate(
        sample_intake("Dana", "Reyes", LicenseStatus::Unlicensed),
        clock.at(0, 9),
    )?;
    let marcus = service.create_candidate(
        sample_intake("Marcus", "Bell", LicenseStatus::Licensed),
        clock.at(0, 9),
    )?;
    let dana_id = dana.candidate.id.clone();
    let marcus_id = marcus.candidate.id.clone();

    for id in [&dana_id, &marcus_id] {
        interview_and_pass(&service, id, &clock)?;
    }
    render_candidate(&service.get_candidate(&dana_id)?, args.show_steps);

    for id in [&dana_id, &marcus_id] {
        service.initiate_background_check(id, &sample_background_request(id), clock.at(2, 10))?;
    }
    let mut round = 0;
    while !service.monitor().watched().is_empty() {
        round += 1;
        let summary = service.poll_background_checks(clock.at(2, 10) + Duration::minutes(5 * round));
        println!(
            "Vendor poll round {round}: {} polled, {} applied, {} abandoned",
            summary.polled, summary.applied, summary.abandoned
        );
    }

    service.send_offer(&dana_id, OfferKind::PreLicense, clock.at(3, 9))?;
    service.sign_offer(&dana_id, OfferKind::PreLicense, clock.at(3, 15))?;
    service.send_offer(&marcus_id, OfferKind::FullAgent, clock.at(3, 9))?;
    service.sign_offer(&marcus_id, OfferKind::FullAgent, clock.at(3, 16))?;

    let eligible = service.eligible_candidates(&unl_cohort.id)?;
    println!(
        "\nEligible for {}: {}",
        unl_cohort.name,
        eligible
            .iter()
            .map(|view| view.candidate.full_name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let mismatch = service.check_eligibility(&marcus_id, &unl_cohort.id)?;
    for message in mismatch.messages() {
        println!("  {} is not eligible: {message}", marcus.candidate.full_name());
    }

    service.assign_to_cohort(&dana_id, &unl_cohort.id, clock.at(4, 9))?;
    service.assign_to_cohort(&marcus_id, &agent_cohort.id, clock.at(4, 9))?;

    let mut today = start + Duration::days(7);
    for _ in 0..3 {
        service.advance_cohort(&unl_cohort.id, today, None)?;
        today += Duration::days(7);
    }

    service.complete_training(&dana_id, clock.at(28, 17))?;
    service.record_license_exam(&dana_id, true, clock.at(30, 9))?;
    service.send_offer(&dana_id, OfferKind::FullAgent, clock.at(31, 9))?;
    service.sign_offer(&dana_id, OfferKind::FullAgent, clock.at(31, 14))?;

    for id in [&dana_id, &marcus_id] {
        service.update_checklist(id, complete_checklist(), clock.at(32, 10))?;
    }

    println!();
    for id in [&dana_id, &marcus_id] {
        render_candidate(&service.get_candidate(id)?, args.show_steps);
    }

    println!("\nCohort progress as of {today}");
    for view in service.list_cohort_progress(today)? {
        render_cohort(&view);
    }

    let sent = notifications.events();
    println!("\nNotifications queued: {}", sent.len());
    for notification in sent {
        println!(
            "  {} -> {} ({:?})",
            notification.template, notification.candidate_id, notification.channel
        );
    }

    Ok(())
}

fn demo_service(notifications: Arc<LoggingNotifications>) -> DemoService {
    let monitor = BackgroundCheckMonitor::new(
        Arc::new(SimulatedVendor::new(2)),
        MonitorPolicy {
            poll_interval: Duration::minutes(5),
            max_polls: 12,
        },
    );
    OnboardingService::new(
        Arc::new(InMemoryOnboardingStore::with_trainers(default_trainers())),
        notifications,
        Arc::new(monitor),
    )
}

/// Maps demo day offsets to UTC timestamps.
struct DemoClock {
    origin: DateTime<Utc>,
}

impl DemoClock {
    fn starting(start: NaiveDate) -> Self {
        Self {
            origin: start.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    fn at(&self, day: i64, hour: i64) -> DateTime<Utc> {
        self.origin + Duration::days(day) + Duration::hours(hour)
    }
}

fn interview_and_pass(
    service: &DemoService,
    id: &CandidateId,
    clock: &DemoClock,
) -> Result<(), AppError> {
    service.interview(
        id,
        InterviewCommand::Schedule(ScheduleRequest {
            at: clock.at(1, 14),
            location: "Phoenix HQ, Room 2".to_string(),
            calendar_event_id: format!("demo-{}", id),
        }),
        clock.at(0, 10),
    )?;
    service.interview(id, InterviewCommand::Start, clock.at(1, 14))?;
    service.add_evaluation(id, scorecard("Hiring Manager", [4, 4, 5, 4, 5]), clock.at(1, 15))?;
    service.add_evaluation(id, scorecard("Team Lead", [4, 4, 4, 4, 4]), clock.at(1, 15))?;
    service.interview(id, InterviewCommand::Complete, clock.at(1, 16))?;
    Ok(())
}

fn scorecard(evaluator: &str, values: [u8; 5]) -> EvaluationDraft {
    EvaluationDraft {
        evaluator: evaluator.to_string(),
        scores: ScoreCard {
            communication: values[0],
            technical: values[1],
            customer_service: values[2],
            problem_solving: values[3],
            culture_fit: values[4],
        },
        recommendation: Recommendation::Recommend,
        strengths: "Clear phone presence".to_string(),
        concerns: String::new(),
        notes: String::new(),
    }
}

fn sample_intake(first: &str, last: &str, license_status: LicenseStatus) -> CandidateIntake {
    CandidateIntake {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!(
            "{}.{}@example.com",
            first.to_ascii_lowercase(),
            last.to_ascii_lowercase()
        ),
        phone: None,
        call_center: CallCenter::Phoenix,
        license_status,
    }
}

fn sample_background_request(id: &CandidateId) -> BackgroundCheckRequest {
    BackgroundCheckRequest {
        first_name: "Demo".to_string(),
        last_name: id.to_string(),
        ssn: "000-00-0000".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1995, 1, 1).unwrap_or_default(),
        address: PostalAddress {
            street: "1 Demo Way".to_string(),
            city: "Phoenix".to_string(),
            state: "AZ".to_string(),
            postal_code: "85004".to_string(),
        },
    }
}

fn sample_cohort(id: &str, name: &str, class_type: ClassType, start: NaiveDate) -> Cohort {
    Cohort {
        id: CohortId(id.to_string()),
        name: name.to_string(),
        call_center: CallCenter::Phoenix,
        class_type,
        current_stage: CohortStage::Start,
        week_number: 0,
        start_date: start,
        expected_end_date: start + Duration::weeks(9),
        trainer_id: None,
        stage_statuses: BTreeMap::new(),
        milestones: Vec::new(),
        participant_ids: Vec::new(),
    }
}

fn complete_checklist() -> ChecklistUpdate {
    ChecklistUpdate {
        pre_start_call: Some(true),
        start_confirmed: Some(true),
        background_disclosure: Some(true),
        badge: Some(true),
        it_request: Some(true),
    }
}

fn render_candidate(view: &CandidateView, show_steps: bool) {
    let candidate = &view.candidate;
    let progress = &view.progress;
    println!(
        "{} ({}, {}) {}/{} steps, {}%{}",
        candidate.full_name(),
        candidate.id,
        candidate.license_status.label(),
        progress.completed_steps,
        progress.total_steps,
        progress.percent,
        if candidate.ready_to_go { ", ready to go" } else { "" }
    );
    for step in &progress.steps {
        if !show_steps && !step.active {
            continue;
        }
        let marker = if step.completed {
            "x"
        } else if step.active {
            ">"
        } else if step.locked {
            "#"
        } else {
            " "
        };
        let action = step
            .next_action_label
            .map(|label| format!(" -> {label}"))
            .unwrap_or_default();
        println!("  [{marker}] {}: {}{action}", step.label, step.description);
    }
}

fn render_cohort(view: &CohortProgressView) {
    let expected = view
        .expected_progress
        .map(|value| format!("{value:.0}%"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "- {} | {} (week {}) | {}% vs {} expected | {} | {} participant(s)",
        view.cohort_id,
        view.current_stage_label,
        view.week_number,
        view.progress,
        expected,
        if view.on_track { "on track" } else { "behind" },
        view.participants
    );
}
