use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{Cohort, CohortStage, StageStatus};

/// Nine training weeks.
pub const PROGRAM_DAYS: i64 = 63;
/// Points a participant may trail the expected pace and still count as on track.
pub const ON_TRACK_TOLERANCE: f64 = 10.0;

/// Completion percentage for a cohort at `current` with the given stage statuses.
///
/// Stages up to and including `current` count 1 when completed; the current
/// stage alone counts 0.5 while in progress. A finished cohort reports 100.
pub fn cohort_progress(
    current: CohortStage,
    statuses: &BTreeMap<CohortStage, StageStatus>,
) -> u8 {
    let status_of = |stage: CohortStage| {
        statuses
            .get(&stage)
            .copied()
            .unwrap_or(StageStatus::NotStarted)
    };

    if current == CohortStage::Completed && status_of(current) == StageStatus::Completed {
        return 100;
    }

    let mut score = 0.0_f64;
    for stage in CohortStage::ordered()
        .into_iter()
        .take(current.index() + 1)
    {
        match status_of(stage) {
            StageStatus::Completed => score += 1.0,
            StageStatus::InProgress if stage == current => score += 0.5,
            _ => {}
        }
    }

    let percent = (score / CohortStage::COUNT as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Pace expected `today` for a cohort that started on `start_date`.
///
/// `None` before the start date.
pub fn expected_progress(start_date: NaiveDate, today: NaiveDate) -> Option<f64> {
    let elapsed = (today - start_date).num_days();
    if elapsed < 0 {
        return None;
    }
    Some((elapsed as f64 / PROGRAM_DAYS as f64 * 100.0).min(100.0))
}

pub fn is_on_track(start_date: NaiveDate, today: NaiveDate, actual_progress: u8) -> bool {
    match expected_progress(start_date, today) {
        None => true,
        Some(expected) => f64::from(actual_progress) >= expected - ON_TRACK_TOLERANCE,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortProgressView {
    pub cohort_id: String,
    pub current_stage: CohortStage,
    pub current_stage_label: &'static str,
    pub week_number: u8,
    pub progress: u8,
    pub expected_progress: Option<f64>,
    pub on_track: bool,
    pub participants: usize,
}

impl CohortProgressView {
    pub fn for_cohort(cohort: &Cohort, today: NaiveDate) -> Self {
        let progress = cohort_progress(cohort.current_stage, &cohort.stage_statuses);
        Self {
            cohort_id: cohort.id.0.clone(),
            current_stage: cohort.current_stage,
            current_stage_label: cohort.current_stage.label(),
            week_number: cohort.week_number,
            progress,
            expected_progress: expected_progress(cohort.start_date, today),
            on_track: is_on_track(cohort.start_date, today, progress),
            participants: cohort.participant_ids.len(),
        }
    }
}
