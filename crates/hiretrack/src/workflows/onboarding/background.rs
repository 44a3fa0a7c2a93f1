use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    BackgroundCheck, BackgroundCheckStatus, Candidate, ChangeSource, CheckSection, SectionStatus,
};
use super::error::OnboardingError;
use super::patch::CandidatePatch;
use super::stages::OnboardingStep;

/// Vendor overall-status vocabulary and the application status it maps onto.
///
/// Keys are compared after [`normalize_vendor_token`]. Anything absent from the
/// table is unrecognized and leaves the stored check untouched.
pub const VENDOR_STATUS_TABLE: [(&str, BackgroundCheckStatus); 8] = [
    ("pass", BackgroundCheckStatus::Completed),
    ("passed", BackgroundCheckStatus::Completed),
    ("fail", BackgroundCheckStatus::Failed),
    ("failed", BackgroundCheckStatus::Failed),
    ("review", BackgroundCheckStatus::Review),
    ("pending", BackgroundCheckStatus::InProgress),
    ("in progress", BackgroundCheckStatus::InProgress),
    ("inprogress", BackgroundCheckStatus::InProgress),
];

const VENDOR_SECTION_TABLE: [(&str, SectionStatus); 5] = [
    ("pass", SectionStatus::Pass),
    ("passed", SectionStatus::Pass),
    ("fail", SectionStatus::Fail),
    ("failed", SectionStatus::Fail),
    ("review", SectionStatus::Review),
];

fn normalize_vendor_token(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn map_vendor_status(raw: &str) -> Option<BackgroundCheckStatus> {
    let token = normalize_vendor_token(raw);
    VENDOR_STATUS_TABLE
        .iter()
        .find(|(key, _)| *key == token)
        .map(|(_, status)| *status)
}

pub fn map_vendor_section(raw: &str) -> Option<SectionStatus> {
    let token = normalize_vendor_token(raw);
    VENDOR_SECTION_TABLE
        .iter()
        .find(|(key, _)| *key == token)
        .map(|(_, status)| *status)
}

/// Raise the check to `floor` unless it has already progressed past it.
pub fn advance_to_at_least(check: &mut BackgroundCheck, floor: BackgroundCheckStatus) {
    if check.status < floor {
        check.status = floor;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Submission payload for the screening vendor.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundCheckRequest {
    pub first_name: String,
    pub last_name: String,
    pub ssn: String,
    pub date_of_birth: NaiveDate,
    pub address: PostalAddress,
}

impl fmt::Debug for BackgroundCheckRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundCheckRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("ssn", &"***")
            .field("date_of_birth", &"***")
            .field("address", &self.address)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorReference(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSection {
    pub name: String,
    pub status: String,
}

/// Raw poll result, still in the vendor's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorReport {
    pub reference: VendorReference,
    pub overall: String,
    #[serde(default)]
    pub sections: Vec<VendorSection>,
}

impl VendorReport {
    pub fn mapped_status(&self) -> Option<BackgroundCheckStatus> {
        map_vendor_status(&self.overall)
    }
}

/// Whether a vendor submission may be made for `candidate` right now.
pub fn ensure_initiable(candidate: &Candidate) -> Result<(), OnboardingError> {
    if !candidate.interview.passed() {
        return Err(OnboardingError::StageLocked {
            step: OnboardingStep::BackgroundCheck,
            requirement: "interview must be completed and passed",
        });
    }

    let check = &candidate.background_check;
    if check.status.is_terminal() {
        return Err(OnboardingError::InvalidPatch(format!(
            "background check already {}",
            check.status
        )));
    }
    if check.initiated {
        return Err(OnboardingError::InvalidPatch(
            "background check already initiated".to_string(),
        ));
    }
    Ok(())
}

/// Record a vendor submission for a candidate whose interview has passed.
pub fn record_initiation(
    candidate: &Candidate,
    reference: &VendorReference,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    ensure_initiable(candidate)?;
    if reference.0.trim().is_empty() {
        return Err(OnboardingError::InvalidPatch(
            "vendor reference id is required".to_string(),
        ));
    }

    let mut check = candidate.background_check.clone();
    check.initiated = true;
    check.reference_id = Some(reference.0.clone());
    check.initiated_at = Some(now);
    advance_to_at_least(&mut check, BackgroundCheckStatus::InProgress);

    Ok(CandidatePatch {
        background_check: Some(check),
        ..CandidatePatch::default()
    }
    .record(now, "background check submitted", ChangeSource::Automated))
}

/// Fold a vendor poll result into the candidate.
///
/// Returns an empty patch when the check is already terminal, when the vendor
/// status is unrecognized, or when nothing changed, so repeated polls are no-ops.
pub fn apply_vendor_report(
    candidate: &Candidate,
    report: &VendorReport,
    now: DateTime<Utc>,
) -> Result<CandidatePatch, OnboardingError> {
    let current = &candidate.background_check;
    if current.status.is_terminal() {
        return Ok(CandidatePatch::default());
    }

    if current.reference_id.as_deref() != Some(report.reference.0.as_str()) {
        return Err(OnboardingError::InvalidPatch(format!(
            "vendor reference {} does not belong to candidate {}",
            report.reference.0, candidate.id
        )));
    }

    let Some(status) = report.mapped_status() else {
        warn!(
            candidate = %candidate.id,
            vendor_status = %report.overall,
            "unrecognized background check status; leaving check unchanged"
        );
        return Ok(CandidatePatch::default());
    };

    let mut sections = BTreeMap::new();
    for section in &report.sections {
        match (
            CheckSection::parse(&section.name),
            map_vendor_section(&section.status),
        ) {
            (Some(name), Some(status)) => {
                sections.insert(name, status);
            }
            _ => warn!(
                candidate = %candidate.id,
                section = %section.name,
                vendor_status = %section.status,
                "skipping unrecognized background check section"
            ),
        }
    }

    if status == current.status && sections == current.sections {
        return Ok(CandidatePatch::default());
    }

    let mut check = current.clone();
    check.status = status;
    check.sections = sections;
    if status.is_terminal() {
        check.passed = Some(status == BackgroundCheckStatus::Completed);
        check.completed_at = Some(now);
    }

    Ok(CandidatePatch {
        background_check: Some(check),
        ..CandidatePatch::default()
    }
    .record(
        now,
        format!("background check {} (vendor)", status),
        ChangeSource::Automated,
    ))
}
