//! Background-check vendor polling.
//!
//! [`BackgroundCheckMonitor`] owns one watch task per candidate. It never
//! spawns anything itself: the caller drives it with [`BackgroundCheckMonitor::poll_due`]
//! (a `tokio` interval in the API server, direct calls in tests) and feeds the
//! returned events to the onboarding service.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::workflows::onboarding::background::{
    BackgroundCheckRequest, VendorReference, VendorReport,
};
use crate::workflows::onboarding::domain::CandidateId;

/// Screening vendor boundary. Reports stay in the vendor's own vocabulary.
pub trait BackgroundCheckVendor: Send + Sync {
    fn submit(&self, request: &BackgroundCheckRequest) -> Result<VendorReference, VendorError>;
    fn poll(&self, reference: &VendorReference) -> Result<VendorReport, VendorError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VendorError {
    #[error("vendor rejected the request: {0}")]
    Rejected(String),
    #[error("vendor unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorPolicy {
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl MonitorPolicy {
    pub fn from_config(config: &MonitorConfig) -> Self {
        let secs = i64::try_from(config.poll_interval_secs).unwrap_or(i64::MAX / 1_000);
        Self {
            poll_interval: Duration::seconds(secs),
            max_polls: config.max_polls,
        }
    }
}

impl Default for MonitorPolicy {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct WatchTask {
    reference: VendorReference,
    next_poll_at: DateTime<Utc>,
    polls: u32,
}

/// Outcome of one poll round for a single candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// The vendor answered; the report may or may not be terminal.
    Report {
        candidate_id: CandidateId,
        report: VendorReport,
    },
    /// The vendor could not be reached; the task stays scheduled.
    PollFailed {
        candidate_id: CandidateId,
        error: String,
    },
    /// The poll budget ran out before a terminal result arrived.
    Abandoned {
        candidate_id: CandidateId,
        reference: VendorReference,
        polls: u32,
    },
}

impl MonitorEvent {
    pub fn candidate_id(&self) -> &CandidateId {
        match self {
            MonitorEvent::Report { candidate_id, .. }
            | MonitorEvent::PollFailed { candidate_id, .. }
            | MonitorEvent::Abandoned { candidate_id, .. } => candidate_id,
        }
    }
}

pub struct BackgroundCheckMonitor<V> {
    vendor: Arc<V>,
    policy: MonitorPolicy,
    tasks: Mutex<BTreeMap<CandidateId, WatchTask>>,
}

impl<V> BackgroundCheckMonitor<V>
where
    V: BackgroundCheckVendor + 'static,
{
    pub fn new(vendor: Arc<V>, policy: MonitorPolicy) -> Self {
        Self {
            vendor,
            policy,
            tasks: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn policy(&self) -> MonitorPolicy {
        self.policy
    }

    fn tasks(&self) -> MutexGuard<'_, BTreeMap<CandidateId, WatchTask>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Submit a screening request and start watching it.
    pub fn submit(
        &self,
        candidate_id: &CandidateId,
        request: &BackgroundCheckRequest,
        now: DateTime<Utc>,
    ) -> Result<VendorReference, VendorError> {
        let reference = self.vendor.submit(request)?;
        info!(candidate = %candidate_id, reference = %reference.0, "background check submitted");
        self.watch(candidate_id.clone(), reference.clone(), now);
        Ok(reference)
    }

    /// Watch an existing vendor reference. Replaces any task for the candidate.
    pub fn watch(&self, candidate_id: CandidateId, reference: VendorReference, now: DateTime<Utc>) {
        self.tasks().insert(
            candidate_id,
            WatchTask {
                reference,
                next_poll_at: now + self.policy.poll_interval,
                polls: 0,
            },
        );
    }

    /// Stop watching. Returns whether a task existed.
    pub fn cancel(&self, candidate_id: &CandidateId) -> bool {
        let removed = self.tasks().remove(candidate_id).is_some();
        if removed {
            debug!(candidate = %candidate_id, "background check watch cancelled");
        }
        removed
    }

    pub fn is_watching(&self, candidate_id: &CandidateId) -> bool {
        self.tasks().contains_key(candidate_id)
    }

    pub fn watched(&self) -> Vec<CandidateId> {
        self.tasks().keys().cloned().collect()
    }

    /// Candidates whose next poll is at or before `now`.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<CandidateId> {
        self.tasks()
            .iter()
            .filter(|(_, task)| task.next_poll_at <= now)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Poll every due task once.
    ///
    /// Terminal reports and exhausted budgets remove the task; everything else
    /// is rescheduled one interval after `now`. The vendor is called without
    /// holding the task lock.
    pub fn poll_due(&self, now: DateTime<Utc>) -> Vec<MonitorEvent> {
        let due: Vec<(CandidateId, VendorReference)> = self
            .tasks()
            .iter()
            .filter(|(_, task)| task.next_poll_at <= now)
            .map(|(id, task)| (id.clone(), task.reference.clone()))
            .collect();

        let mut events = Vec::with_capacity(due.len());
        for (candidate_id, reference) in due {
            let result = self.vendor.poll(&reference);

            let mut tasks = self.tasks();
            let Some(task) = tasks.get_mut(&candidate_id) else {
                // Cancelled while the vendor call was in flight.
                continue;
            };
            if task.reference != reference {
                continue;
            }
            task.polls += 1;
            task.next_poll_at = now + self.policy.poll_interval;
            let polls = task.polls;

            match result {
                Ok(report) => {
                    let terminal = report
                        .mapped_status()
                        .map(|status| status.is_terminal())
                        .unwrap_or(false);
                    if terminal {
                        tasks.remove(&candidate_id);
                        info!(
                            candidate = %candidate_id,
                            vendor_status = %report.overall,
                            polls,
                            "background check reached a final status"
                        );
                    } else if polls >= self.policy.max_polls {
                        tasks.remove(&candidate_id);
                        events.push(MonitorEvent::Report {
                            candidate_id: candidate_id.clone(),
                            report,
                        });
                        warn!(candidate = %candidate_id, polls, "background check polling abandoned");
                        events.push(MonitorEvent::Abandoned {
                            candidate_id,
                            reference,
                            polls,
                        });
                        continue;
                    }
                    events.push(MonitorEvent::Report {
                        candidate_id,
                        report,
                    });
                }
                Err(error) => {
                    warn!(candidate = %candidate_id, %error, polls, "background check poll failed");
                    events.push(MonitorEvent::PollFailed {
                        candidate_id: candidate_id.clone(),
                        error: error.to_string(),
                    });
                    if polls >= self.policy.max_polls {
                        tasks.remove(&candidate_id);
                        events.push(MonitorEvent::Abandoned {
                            candidate_id,
                            reference,
                            polls,
                        });
                    }
                }
            }
        }

        events
    }
}
