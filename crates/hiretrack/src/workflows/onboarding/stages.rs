use serde::{Deserialize, Serialize};

use super::domain::{
    BackgroundCheckStatus, Candidate, ChecklistItem, InterviewResult, InterviewStatus, OfferKind,
    OfferRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Interview,
    BackgroundCheck,
    PreLicenseOffer,
    TrainingCompletion,
    LicensingMilestone,
    FullAgentOffer,
    ClassAssignment,
}

impl OnboardingStep {
    pub const fn label(self) -> &'static str {
        match self {
            OnboardingStep::Interview => "Interview",
            OnboardingStep::BackgroundCheck => "Background Check",
            OnboardingStep::PreLicenseOffer => "Pre-License Offer",
            OnboardingStep::TrainingCompletion => "Training Completion",
            OnboardingStep::LicensingMilestone => "Licensing Milestone",
            OnboardingStep::FullAgentOffer => "Full Agent Offer",
            OnboardingStep::ClassAssignment => "Class Assignment",
        }
    }
}

/// Suggested action for the active step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    ScheduleInterview,
    StartInterview,
    AddEvaluation,
    CompleteInterview,
    InitiateBackgroundCheck,
    CheckBackgroundStatus,
    ReviewBackgroundCheck,
    SendPreLicenseOffer,
    MarkPreLicenseOfferSigned,
    AssignToClass,
    MarkTrainingComplete,
    RecordLicense,
    SendFullAgentOffer,
    MarkFullAgentOfferSigned,
    CompleteOnboardingChecklist,
}

impl NextAction {
    pub const fn label(self) -> &'static str {
        match self {
            NextAction::ScheduleInterview => "Schedule interview",
            NextAction::StartInterview => "Start interview",
            NextAction::AddEvaluation => "Add evaluation",
            NextAction::CompleteInterview => "Complete interview",
            NextAction::InitiateBackgroundCheck => "Initiate background check",
            NextAction::CheckBackgroundStatus => "Check background status",
            NextAction::ReviewBackgroundCheck => "Review background check",
            NextAction::SendPreLicenseOffer => "Send pre-license offer",
            NextAction::MarkPreLicenseOfferSigned => "Mark pre-license offer signed",
            NextAction::AssignToClass => "Assign to class",
            NextAction::MarkTrainingComplete => "Mark training complete",
            NextAction::RecordLicense => "Record license",
            NextAction::SendFullAgentOffer => "Send full agent offer",
            NextAction::MarkFullAgentOfferSigned => "Mark full agent offer signed",
            NextAction::CompleteOnboardingChecklist => "Complete onboarding checklist",
        }
    }

    fn send(kind: OfferKind) -> Self {
        match kind {
            OfferKind::PreLicense => NextAction::SendPreLicenseOffer,
            OfferKind::FullAgent => NextAction::SendFullAgentOffer,
        }
    }

    fn sign(kind: OfferKind) -> Self {
        match kind {
            OfferKind::PreLicense => NextAction::MarkPreLicenseOfferSigned,
            OfferKind::FullAgent => NextAction::MarkFullAgentOfferSigned,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub step: OnboardingStep,
    pub label: &'static str,
    pub completed: bool,
    pub active: bool,
    pub locked: bool,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<NextAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action_label: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnboardingProgress {
    pub steps: Vec<StepView>,
    pub completed_steps: usize,
    pub total_steps: usize,
    pub percent: u8,
    pub active_step: Option<OnboardingStep>,
}

impl OnboardingProgress {
    pub fn step(&self, step: OnboardingStep) -> Option<&StepView> {
        self.steps.iter().find(|view| view.step == step)
    }

    pub fn is_unlocked(&self, step: OnboardingStep) -> bool {
        self.step(step).map(|view| !view.locked).unwrap_or(false)
    }

    pub fn all_complete(&self) -> bool {
        self.completed_steps == self.total_steps
    }
}

struct DraftStep {
    step: OnboardingStep,
    completed: bool,
    locked: bool,
    description: String,
    action: Option<NextAction>,
}

/// Recompute the step list from the record. Exactly one step is active (the
/// first incomplete one) unless every step is complete. Training and licensing
/// steps only appear on the unlicensed track.
pub fn derive_steps(candidate: &Candidate) -> OnboardingProgress {
    let mut drafts = vec![
        interview_step(candidate),
        background_step(candidate),
        pre_license_step(candidate),
    ];

    // Candidates licensed through the program keep their training history.
    let unlicensed_track = candidate.is_unlicensed() || candidate.licensing.license_obtained;
    if unlicensed_track && candidate.offers.pre_license_offer.signed {
        drafts.push(training_step(candidate));
    }
    if unlicensed_track && candidate.class_assignment.training_completed {
        drafts.push(licensing_step(candidate));
    }

    drafts.push(full_agent_step(candidate));
    drafts.push(class_assignment_step(candidate));

    let active_index = drafts.iter().position(|draft| !draft.completed);
    let completed_steps = drafts.iter().filter(|draft| draft.completed).count();
    let total_steps = drafts.len();
    let percent = ((completed_steps as f64 / total_steps as f64) * 100.0).round() as u8;

    let steps = drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            let active = Some(index) == active_index;
            let next_action = if active { draft.action } else { None };
            StepView {
                step: draft.step,
                label: draft.step.label(),
                completed: draft.completed,
                active,
                locked: draft.locked,
                description: draft.description,
                next_action,
                next_action_label: next_action.map(NextAction::label),
            }
        })
        .collect::<Vec<_>>();

    let active_step = active_index.map(|index| steps[index].step);

    OnboardingProgress {
        steps,
        completed_steps,
        total_steps,
        percent,
        active_step,
    }
}

fn interview_step(candidate: &Candidate) -> DraftStep {
    let interview = &candidate.interview;
    let evaluations = interview.evaluations.len();

    let (description, action) = match interview.status {
        InterviewStatus::NotStarted => (
            "Interview not yet scheduled".to_string(),
            Some(NextAction::ScheduleInterview),
        ),
        InterviewStatus::Scheduled => {
            let when = interview
                .scheduled_at
                .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "an unconfirmed time".to_string());
            let location = interview.location.as_deref().unwrap_or("TBD");
            (
                format!("Interview scheduled for {when} at {location}"),
                Some(NextAction::StartInterview),
            )
        }
        InterviewStatus::InProgress => (
            format!(
                "Interview in progress ({evaluations} evaluation(s), composite {:.1})",
                interview.composite_score
            ),
            Some(if evaluations == 0 {
                NextAction::AddEvaluation
            } else {
                NextAction::CompleteInterview
            }),
        ),
        InterviewStatus::Completed => {
            let outcome = match interview.result {
                Some(InterviewResult::Passed) => "passed",
                _ => "failed",
            };
            (
                format!(
                    "Interview {outcome} with composite score {:.1}",
                    interview.composite_score
                ),
                None,
            )
        }
    };

    DraftStep {
        step: OnboardingStep::Interview,
        completed: interview.passed(),
        locked: false,
        description,
        action,
    }
}

fn background_step(candidate: &Candidate) -> DraftStep {
    let check = &candidate.background_check;
    let locked = !candidate.interview.passed();

    let (description, action) = if locked {
        ("Available after a passed interview".to_string(), None)
    } else {
        match check.status {
            BackgroundCheckStatus::NotStarted | BackgroundCheckStatus::Pending
                if !check.initiated =>
            {
                (
                    "Background check ready to submit".to_string(),
                    Some(NextAction::InitiateBackgroundCheck),
                )
            }
            BackgroundCheckStatus::NotStarted
            | BackgroundCheckStatus::Pending
            | BackgroundCheckStatus::InProgress => (
                format!("Background check {}", check.status),
                Some(NextAction::CheckBackgroundStatus),
            ),
            BackgroundCheckStatus::Review => (
                "Background check flagged for review".to_string(),
                Some(NextAction::ReviewBackgroundCheck),
            ),
            BackgroundCheckStatus::Completed => ("Background check cleared".to_string(), None),
            BackgroundCheckStatus::Failed => ("Background check failed".to_string(), None),
        }
    };

    DraftStep {
        step: OnboardingStep::BackgroundCheck,
        completed: check.status == BackgroundCheckStatus::Completed,
        locked,
        description,
        action,
    }
}

fn offer_description(kind: OfferKind, offer: &OfferRecord) -> (String, Option<NextAction>) {
    if offer.signed {
        (format!("{} signed", kind.label()), None)
    } else if offer.sent {
        (
            format!("{} sent, awaiting signature", kind.label()),
            Some(NextAction::sign(kind)),
        )
    } else {
        (
            format!("{} not yet sent", kind.label()),
            Some(NextAction::send(kind)),
        )
    }
}

fn pre_license_step(candidate: &Candidate) -> DraftStep {
    let offer = &candidate.offers.pre_license_offer;
    let locked = candidate.background_check.status != BackgroundCheckStatus::Completed;
    let (description, action) = if locked {
        ("Requires a cleared background check".to_string(), None)
    } else {
        offer_description(OfferKind::PreLicense, offer)
    };

    DraftStep {
        step: OnboardingStep::PreLicenseOffer,
        completed: offer.signed,
        locked,
        description,
        action,
    }
}

fn training_step(candidate: &Candidate) -> DraftStep {
    let assignment = &candidate.class_assignment;
    let (description, action) = if assignment.training_completed {
        ("Training completed".to_string(), None)
    } else if assignment.is_assigned() {
        let class = assignment
            .class_type
            .map(|class| class.label())
            .unwrap_or("unassigned");
        let start = assignment
            .start_date
            .map(|date| date.to_string())
            .unwrap_or_default();
        (
            format!("Training in progress ({class} class starting {start})"),
            Some(NextAction::MarkTrainingComplete),
        )
    } else {
        (
            "Awaiting class assignment for training".to_string(),
            Some(NextAction::AssignToClass),
        )
    };

    DraftStep {
        step: OnboardingStep::TrainingCompletion,
        completed: assignment.training_completed,
        locked: !candidate.offers.pre_license_offer.signed,
        description,
        action,
    }
}

fn licensing_step(candidate: &Candidate) -> DraftStep {
    let attempts = candidate.licensing.exam_attempts;
    let completed = !candidate.is_unlicensed();
    let description = if completed {
        "License obtained".to_string()
    } else {
        format!("Awaiting state license ({attempts} exam attempt(s))")
    };

    DraftStep {
        step: OnboardingStep::LicensingMilestone,
        completed,
        locked: !candidate.class_assignment.training_completed,
        description,
        action: (!completed).then_some(NextAction::RecordLicense),
    }
}

fn full_agent_step(candidate: &Candidate) -> DraftStep {
    let offer = &candidate.offers.full_agent_offer;
    let locked = candidate.is_unlicensed();
    let (description, action) = if locked {
        ("Requires an active license".to_string(), None)
    } else {
        offer_description(OfferKind::FullAgent, offer)
    };

    DraftStep {
        step: OnboardingStep::FullAgentOffer,
        completed: offer.signed,
        locked,
        description,
        action,
    }
}

fn class_assignment_step(candidate: &Candidate) -> DraftStep {
    let assignment = &candidate.class_assignment;
    let locked = !candidate.offers.any_signed();
    let done = assignment.checklist_completed();
    let total = ChecklistItem::ordered().len();

    let (description, action) = if candidate.ready_to_go {
        ("Ready to go".to_string(), None)
    } else if locked {
        ("Requires a signed offer".to_string(), None)
    } else if !assignment.is_assigned() {
        (
            format!("{done}/{total} onboarding tasks completed"),
            Some(NextAction::AssignToClass),
        )
    } else {
        (
            format!("{done}/{total} onboarding tasks completed"),
            Some(NextAction::CompleteOnboardingChecklist),
        )
    };

    DraftStep {
        step: OnboardingStep::ClassAssignment,
        completed: candidate.ready_to_go,
        locked,
        description,
        action,
    }
}
