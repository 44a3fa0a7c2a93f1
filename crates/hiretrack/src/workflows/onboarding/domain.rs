use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for candidates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for training cohorts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CohortId(pub String);

impl fmt::Display for CohortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for trainers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrainerId(pub String);

impl fmt::Display for TrainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two call-center sites candidates are hired into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallCenter {
    Phoenix,
    Tampa,
}

impl CallCenter {
    pub const fn label(self) -> &'static str {
        match self {
            CallCenter::Phoenix => "Phoenix",
            CallCenter::Tampa => "Tampa",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "phoenix" => Some(Self::Phoenix),
            "tampa" => Some(Self::Tampa),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStatus {
    Active,
    #[serde(rename = "On Hold")]
    OnHold,
    Withdrawn,
    Hired,
}

impl CandidateStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CandidateStatus::Active => "Active",
            CandidateStatus::OnHold => "On Hold",
            CandidateStatus::Withdrawn => "Withdrawn",
            CandidateStatus::Hired => "Hired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseStatus {
    Licensed,
    Unlicensed,
}

impl LicenseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LicenseStatus::Licensed => "Licensed",
            LicenseStatus::Unlicensed => "Unlicensed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "licensed" => Some(Self::Licensed),
            "unlicensed" => Some(Self::Unlicensed),
            _ => None,
        }
    }
}

/// Training class track. `UNL` trains unlicensed hires toward the exam,
/// `AGENT` onboards already licensed agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassType {
    #[serde(rename = "UNL")]
    Unlicensed,
    #[serde(rename = "AGENT")]
    Agent,
}

impl ClassType {
    pub const fn label(self) -> &'static str {
        match self {
            ClassType::Unlicensed => "UNL",
            ClassType::Agent => "AGENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    Scheduled,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl InterviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InterviewStatus::NotStarted => "Not Started",
            InterviewStatus::Scheduled => "Scheduled",
            InterviewStatus::InProgress => "In Progress",
            InterviewStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewResult {
    Passed,
    Failed,
}

impl InterviewResult {
    pub const fn label(self) -> &'static str {
        match self {
            InterviewResult::Passed => "Passed",
            InterviewResult::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strongly Recommend")]
    StronglyRecommend,
    Recommend,
    Neutral,
    #[serde(rename = "Do Not Recommend")]
    DoNotRecommend,
}

impl Recommendation {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::StronglyRecommend,
            Self::Recommend,
            Self::Neutral,
            Self::DoNotRecommend,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Recommendation::StronglyRecommend => "Strongly Recommend",
            Recommendation::Recommend => "Recommend",
            Recommendation::Neutral => "Neutral",
            Recommendation::DoNotRecommend => "Do Not Recommend",
        }
    }
}

/// The five scored interview dimensions, each 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub communication: u8,
    pub technical: u8,
    pub customer_service: u8,
    pub problem_solving: u8,
    pub culture_fit: u8,
}

impl ScoreCard {
    pub const fn values(&self) -> [u8; 5] {
        [
            self.communication,
            self.technical,
            self.customer_service,
            self.problem_solving,
            self.culture_fit,
        ]
    }
}

/// Evaluator input before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationDraft {
    pub evaluator: String,
    pub scores: ScoreCard,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub concerns: String,
    #[serde(default)]
    pub notes: String,
}

/// One evaluator's submitted scorecard. Construct through
/// [`InterviewEvaluation::from_draft`]; the average is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewEvaluation {
    pub evaluator: String,
    pub scores: ScoreCard,
    pub average_score: f64,
    pub recommendation: Recommendation,
    pub strengths: String,
    pub concerns: String,
    pub notes: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub status: InterviewStatus,
    pub result: Option<InterviewResult>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub calendar_event_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub evaluations: Vec<InterviewEvaluation>,
    pub composite_score: f64,
    /// Set when the result was forced rather than derived from scorecards.
    #[serde(default)]
    pub result_overridden: bool,
}

impl Default for InterviewRecord {
    fn default() -> Self {
        Self {
            status: InterviewStatus::NotStarted,
            result: None,
            scheduled_at: None,
            location: None,
            calendar_event_id: None,
            started_at: None,
            completed_at: None,
            evaluations: Vec::new(),
            composite_score: 0.0,
            result_overridden: false,
        }
    }
}

impl InterviewRecord {
    pub fn passed(&self) -> bool {
        self.status == InterviewStatus::Completed && self.result == Some(InterviewResult::Passed)
    }
}

/// Application-side background check vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BackgroundCheckStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Review,
    Completed,
    Failed,
}

impl BackgroundCheckStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BackgroundCheckStatus::NotStarted => "Not Started",
            BackgroundCheckStatus::Pending => "Pending",
            BackgroundCheckStatus::InProgress => "In Progress",
            BackgroundCheckStatus::Review => "Review",
            BackgroundCheckStatus::Completed => "Completed",
            BackgroundCheckStatus::Failed => "Failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            BackgroundCheckStatus::Completed | BackgroundCheckStatus::Failed
        )
    }
}

impl fmt::Display for BackgroundCheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckSection {
    Federal,
    State,
    County,
    Credit,
    Drug,
}

impl CheckSection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "federal" => Some(Self::Federal),
            "state" => Some(Self::State),
            "county" => Some(Self::County),
            "credit" => Some(Self::Credit),
            "drug" | "drug screen" => Some(Self::Drug),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionStatus {
    Pass,
    Fail,
    Review,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundCheck {
    pub initiated: bool,
    pub status: BackgroundCheckStatus,
    pub passed: Option<bool>,
    #[serde(default)]
    pub sections: BTreeMap<CheckSection, SectionStatus>,
    pub reference_id: Option<String>,
    pub initiated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Default for BackgroundCheck {
    fn default() -> Self {
        Self {
            initiated: false,
            status: BackgroundCheckStatus::NotStarted,
            passed: None,
            sections: BTreeMap::new(),
            reference_id: None,
            initiated_at: None,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferKind {
    PreLicense,
    FullAgent,
}

impl OfferKind {
    pub const fn label(self) -> &'static str {
        match self {
            OfferKind::PreLicense => "Pre-License Offer",
            OfferKind::FullAgent => "Full Agent Offer",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offers {
    pub pre_license_offer: OfferRecord,
    pub full_agent_offer: OfferRecord,
}

impl Offers {
    pub fn get(&self, kind: OfferKind) -> &OfferRecord {
        match kind {
            OfferKind::PreLicense => &self.pre_license_offer,
            OfferKind::FullAgent => &self.full_agent_offer,
        }
    }

    pub fn get_mut(&mut self, kind: OfferKind) -> &mut OfferRecord {
        match kind {
            OfferKind::PreLicense => &mut self.pre_license_offer,
            OfferKind::FullAgent => &mut self.full_agent_offer,
        }
    }

    pub fn any_signed(&self) -> bool {
        self.pre_license_offer.signed || self.full_agent_offer.signed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Licensing {
    pub license_obtained: bool,
    pub license_passed: bool,
    pub exam_attempts: u8,
    pub passed_at: Option<DateTime<Utc>>,
}

/// The five class-assignment checklist items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItem {
    PreStartCall,
    StartConfirmed,
    BackgroundDisclosure,
    Badge,
    ItRequest,
}

impl ChecklistItem {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::PreStartCall,
            Self::StartConfirmed,
            Self::BackgroundDisclosure,
            Self::Badge,
            Self::ItRequest,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            ChecklistItem::PreStartCall => "Pre-start call",
            ChecklistItem::StartConfirmed => "Start date confirmed",
            ChecklistItem::BackgroundDisclosure => "Background disclosure",
            ChecklistItem::Badge => "Badge",
            ChecklistItem::ItRequest => "IT request",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAssignment {
    pub class_type: Option<ClassType>,
    pub start_date: Option<NaiveDate>,
    pub cohort_id: Option<CohortId>,
    pub pre_start_call: bool,
    pub start_confirmed: bool,
    pub background_disclosure: bool,
    pub badge: bool,
    pub it_request: bool,
    pub training_completed: bool,
    pub training_completed_at: Option<DateTime<Utc>>,
}

impl ClassAssignment {
    pub fn is_assigned(&self) -> bool {
        self.class_type.is_some() && self.start_date.is_some()
    }

    pub fn item(&self, item: ChecklistItem) -> bool {
        match item {
            ChecklistItem::PreStartCall => self.pre_start_call,
            ChecklistItem::StartConfirmed => self.start_confirmed,
            ChecklistItem::BackgroundDisclosure => self.background_disclosure,
            ChecklistItem::Badge => self.badge,
            ChecklistItem::ItRequest => self.it_request,
        }
    }

    pub fn set_item(&mut self, item: ChecklistItem, done: bool) {
        match item {
            ChecklistItem::PreStartCall => self.pre_start_call = done,
            ChecklistItem::StartConfirmed => self.start_confirmed = done,
            ChecklistItem::BackgroundDisclosure => self.background_disclosure = done,
            ChecklistItem::Badge => self.badge = done,
            ChecklistItem::ItRequest => self.it_request = done,
        }
    }

    pub fn checklist_completed(&self) -> usize {
        ChecklistItem::ordered()
            .into_iter()
            .filter(|item| self.item(*item))
            .count()
    }

    pub fn checklist_done(&self) -> bool {
        self.checklist_completed() == ChecklistItem::ordered().len()
    }
}

/// Whether a change came from normal processing or a privileged manual action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeSource {
    Automated,
    Manual { actor: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub action: String,
    pub source: ChangeSource,
}

/// Central onboarding record, one per applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub call_center: CallCenter,
    pub status: CandidateStatus,
    pub license_status: LicenseStatus,
    pub interview: InterviewRecord,
    pub background_check: BackgroundCheck,
    pub offers: Offers,
    pub licensing: Licensing,
    pub class_assignment: ClassAssignment,
    pub ready_to_go: bool,
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_unlicensed(&self) -> bool {
        self.license_status == LicenseStatus::Unlicensed
    }
}
