use chrono::NaiveDate;
use hiretrack::workflows::cohort::{Cohort, Trainer};
use hiretrack::workflows::monitor::{BackgroundCheckVendor, VendorError};
use hiretrack::workflows::onboarding::{
    BackgroundCheckRequest, CallCenter, Candidate, CandidateFilter, CandidateId, CohortId,
    Notification, NotificationError, NotificationPublisher, OnboardingRepository,
    RepositoryError, TrainerId, VendorReference, VendorReport, VendorSection,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryOnboardingStore {
    candidates: Arc<Mutex<HashMap<CandidateId, Candidate>>>,
    cohorts: Arc<Mutex<BTreeMap<CohortId, Cohort>>>,
    trainers: Arc<Mutex<BTreeMap<TrainerId, Trainer>>>,
}

impl InMemoryOnboardingStore {
    /// Store preloaded with the trainer roster for both sites.
    pub(crate) fn with_trainers(trainers: Vec<Trainer>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.trainers.lock().expect("trainer mutex poisoned");
            for trainer in trainers {
                guard.insert(trainer.id.clone(), trainer);
            }
        }
        store
    }
}

impl OnboardingRepository for InMemoryOnboardingStore {
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
        if guard.contains_key(&candidate.id) {
            guard.insert(candidate.id.clone(), candidate);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        let guard = self.candidates.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, RepositoryError> {
        let guard = self.candidates.lock().expect("repository mutex poisoned");
        let mut matching: Vec<Candidate> = guard
            .values()
            .filter(|candidate| filter.matches(candidate))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matching)
    }

    fn delete_candidate(&self, id: &CandidateId) -> Result<bool, RepositoryError> {
        let mut guard = self.candidates.lock().expect("repository mutex poisoned");
        Ok(guard.remove(id).is_some())
    }

    fn insert_cohort(&self, cohort: Cohort) -> Result<Cohort, RepositoryError> {
        let mut guard = self.cohorts.lock().expect("cohort mutex poisoned");
        if guard.contains_key(&cohort.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(cohort.id.clone(), cohort.clone());
        Ok(cohort)
    }

    fn update_cohort(&self, cohort: Cohort) -> Result<(), RepositoryError> {
        let mut guard = self.cohorts.lock().expect("cohort mutex poisoned");
        if guard.contains_key(&cohort.id) {
            guard.insert(cohort.id.clone(), cohort);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_cohort(&self, id: &CohortId) -> Result<Option<Cohort>, RepositoryError> {
        let guard = self.cohorts.lock().expect("cohort mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_cohorts(&self) -> Result<Vec<Cohort>, RepositoryError> {
        let guard = self.cohorts.lock().expect("cohort mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn fetch_trainer(&self, id: &TrainerId) -> Result<Option<Trainer>, RepositoryError> {
        let guard = self.trainers.lock().expect("trainer mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_trainers(&self) -> Result<Vec<Trainer>, RepositoryError> {
        let guard = self.trainers.lock().expect("trainer mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

/// Keeps every notification in memory and logs it; stands in for the
/// email/SMS gateway.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationPublisher for LoggingNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            candidate = %notification.candidate_id,
            template = %notification.template,
            channel = ?notification.channel,
            "notification queued"
        );
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notification);
        Ok(())
    }

    fn forget(&self, candidate_id: &CandidateId) -> Result<usize, NotificationError> {
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        let before = guard.len();
        guard.retain(|event| &event.candidate_id != candidate_id);
        Ok(before - guard.len())
    }
}

impl LoggingNotifications {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

/// Screening vendor that reports `Pending` until a submission has been
/// polled `clear_after` times, then `Pass`.
pub(crate) struct SimulatedVendor {
    clear_after: u32,
    sequence: AtomicU64,
    polls: Mutex<HashMap<VendorReference, u32>>,
}

impl SimulatedVendor {
    pub(crate) fn new(clear_after: u32) -> Self {
        Self {
            clear_after,
            sequence: AtomicU64::new(1),
            polls: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for SimulatedVendor {
    fn default() -> Self {
        Self::new(2)
    }
}

impl BackgroundCheckVendor for SimulatedVendor {
    fn submit(&self, request: &BackgroundCheckRequest) -> Result<VendorReference, VendorError> {
        if request.ssn.trim().is_empty() {
            return Err(VendorError::Rejected("ssn is required".to_string()));
        }
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        Ok(VendorReference(format!("SIM-{id:06}")))
    }

    fn poll(&self, reference: &VendorReference) -> Result<VendorReport, VendorError> {
        let mut guard = self.polls.lock().expect("vendor mutex poisoned");
        let count = guard.entry(reference.clone()).or_insert(0);
        *count += 1;

        let cleared = *count >= self.clear_after;
        let status = if cleared { "Pass" } else { "Pending" };
        let sections = ["Federal", "County Criminal", "Drug Screen"]
            .iter()
            .map(|name| VendorSection {
                name: (*name).to_string(),
                status: status.to_string(),
            })
            .collect();

        Ok(VendorReport {
            reference: reference.clone(),
            overall: status.to_string(),
            sections,
        })
    }
}

pub(crate) fn default_trainers() -> Vec<Trainer> {
    vec![
        Trainer {
            id: TrainerId("trn-phx-01".to_string()),
            name: "Renee Alvarado".to_string(),
            call_center: CallCenter::Phoenix,
            capacity: 2,
            active: true,
        },
        Trainer {
            id: TrainerId("trn-tpa-01".to_string()),
            name: "Curtis Monroe".to_string(),
            call_center: CallCenter::Tampa,
            capacity: 1,
            active: true,
        },
    ]
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
