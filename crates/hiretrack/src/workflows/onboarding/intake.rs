use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AuditEntry, BackgroundCheck, CallCenter, Candidate, CandidateId, CandidateStatus, ChangeSource,
    ClassAssignment, InterviewRecord, LicenseStatus, Licensing, Offers,
};
use super::error::OnboardingError;

static CANDIDATE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub fn next_candidate_id() -> CandidateId {
    let id = CANDIDATE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CandidateId(format!("cand-{id:06}"))
}

/// New-applicant payload accepted by the intake endpoint and roster import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CandidateIntake {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub call_center: CallCenter,
    pub license_status: LicenseStatus,
}

impl CandidateIntake {
    pub fn validate(&self) -> Result<(), OnboardingError> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(OnboardingError::InvalidPatch(
                "first and last name are required".to_string(),
            ));
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(OnboardingError::InvalidPatch(format!(
                "invalid email address '{email}'"
            )));
        }
        Ok(())
    }
}

/// Build a fresh candidate record at the start of the pipeline.
pub fn new_candidate(
    intake: CandidateIntake,
    id: CandidateId,
    now: DateTime<Utc>,
) -> Result<Candidate, OnboardingError> {
    intake.validate()?;

    Ok(Candidate {
        id,
        first_name: intake.first_name.trim().to_string(),
        last_name: intake.last_name.trim().to_string(),
        email: intake.email.trim().to_string(),
        phone: intake
            .phone
            .map(|phone| phone.trim().to_string())
            .filter(|phone| !phone.is_empty()),
        call_center: intake.call_center,
        status: CandidateStatus::Active,
        license_status: intake.license_status,
        interview: InterviewRecord::default(),
        background_check: BackgroundCheck::default(),
        offers: Offers::default(),
        licensing: Licensing::default(),
        class_assignment: ClassAssignment::default(),
        ready_to_go: false,
        audit: vec![AuditEntry {
            at: now,
            action: "candidate created".to_string(),
            source: ChangeSource::Automated,
        }],
        created_at: now,
        updated_at: now,
    })
}

#[derive(Debug)]
pub enum IntakeImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for IntakeImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeImportError::Io(err) => write!(f, "failed to read roster: {}", err),
            IntakeImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
        }
    }
}

impl std::error::Error for IntakeImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntakeImportError::Io(err) => Some(err),
            IntakeImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for IntakeImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IntakeImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "First Name")]
    first_name: String,
    #[serde(rename = "Last Name")]
    last_name: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Phone", default)]
    phone: Option<String>,
    #[serde(rename = "Call Center")]
    call_center: String,
    #[serde(rename = "License Status")]
    license_status: String,
}

impl RosterRow {
    fn into_intake(self) -> Result<CandidateIntake, String> {
        let call_center = CallCenter::parse(&self.call_center)
            .ok_or_else(|| format!("unknown call center '{}'", self.call_center))?;
        let license_status = LicenseStatus::parse(&self.license_status)
            .ok_or_else(|| format!("unknown license status '{}'", self.license_status))?;
        Ok(CandidateIntake {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            call_center,
            license_status,
        })
    }
}

/// A roster row that could not become a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterRejection {
    /// 1-based data row, header excluded.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterImport {
    pub intakes: Vec<CandidateIntake>,
    pub rejected: Vec<RosterRejection>,
}

/// Roster CSV reader. Columns: `First Name,Last Name,Email,Phone,Call Center,License Status`.
pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RosterImport, IntakeImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<RosterImport, IntakeImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut intakes = Vec::new();
        let mut rejected = Vec::new();

        for (index, row) in csv_reader.deserialize::<RosterRow>().enumerate() {
            let row = row?;
            let outcome = row.into_intake().and_then(|intake| {
                intake
                    .validate()
                    .map(|_| intake)
                    .map_err(|err| err.to_string())
            });
            match outcome {
                Ok(intake) => intakes.push(intake),
                Err(reason) => rejected.push(RosterRejection {
                    row: index + 1,
                    reason,
                }),
            }
        }

        Ok(RosterImport { intakes, rejected })
    }
}
