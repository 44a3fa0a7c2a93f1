use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{CallCenter, Candidate, CandidateId, CandidateStatus, CohortId, TrainerId};
use super::stages::{derive_steps, OnboardingProgress};
use crate::workflows::cohort::{Cohort, Trainer};

/// Filter applied when listing candidates. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFilter {
    #[serde(default)]
    pub call_center: Option<CallCenter>,
    #[serde(default)]
    pub status: Option<CandidateStatus>,
    #[serde(default)]
    pub cohort_id: Option<CohortId>,
}

impl CandidateFilter {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        self.call_center
            .map_or(true, |center| candidate.call_center == center)
            && self.status.map_or(true, |status| candidate.status == status)
            && self.cohort_id.as_ref().map_or(true, |cohort| {
                candidate.class_assignment.cohort_id.as_ref() == Some(cohort)
            })
    }
}

/// Storage abstraction for candidates, cohorts, and trainers.
///
/// Writes are last-write-wins; the service validates every candidate before
/// calling `update_candidate`.
pub trait OnboardingRepository: Send + Sync {
    fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate, RepositoryError>;
    fn update_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError>;
    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError>;
    fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, RepositoryError>;
    /// Remove the candidate record. Returns `false` when nothing was stored.
    fn delete_candidate(&self, id: &CandidateId) -> Result<bool, RepositoryError>;

    fn insert_cohort(&self, cohort: Cohort) -> Result<Cohort, RepositoryError>;
    fn update_cohort(&self, cohort: Cohort) -> Result<(), RepositoryError>;
    fn fetch_cohort(&self, id: &CohortId) -> Result<Option<Cohort>, RepositoryError>;
    fn list_cohorts(&self) -> Result<Vec<Cohort>, RepositoryError>;

    fn fetch_trainer(&self, id: &TrainerId) -> Result<Option<Trainer>, RepositoryError>;
    fn list_trainers(&self) -> Result<Vec<Trainer>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hooks (email, SMS, outbound call queue).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;

    /// Drop any notification history kept for a deleted candidate.
    fn forget(&self, _candidate_id: &CandidateId) -> Result<usize, NotificationError> {
        Ok(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
    Call,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub channel: NotificationChannel,
    pub template: String,
    pub candidate_id: CandidateId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Candidate snapshot plus the steps derived from it, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    pub candidate: Candidate,
    pub progress: OnboardingProgress,
}

impl CandidateView {
    pub fn new(candidate: Candidate) -> Self {
        let progress = derive_steps(&candidate);
        Self {
            candidate,
            progress,
        }
    }
}
