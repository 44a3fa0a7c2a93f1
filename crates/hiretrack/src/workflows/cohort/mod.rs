//! Training cohorts, trainers, and week-by-week cohort progress.

pub mod domain;
pub mod progress;

pub use domain::{Cohort, CohortStage, Milestone, StageStatus, Trainer};
pub use progress::{cohort_progress, expected_progress, is_on_track, CohortProgressView};
