use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::onboarding::domain::{
    CallCenter, CandidateId, ClassType, CohortId, TrainerId,
};
use crate::workflows::onboarding::error::OnboardingError;

/// Training-class stages, in order. Nine weekly stages sit between `START`
/// and `COMPLETED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CohortStage {
    #[serde(rename = "START")]
    Start,
    #[serde(rename = "WK_1_ORIENTATION")]
    Week1Orientation,
    #[serde(rename = "WK_2_PRODUCT")]
    Week2Product,
    #[serde(rename = "WK_3_CSR")]
    Week3Csr,
    #[serde(rename = "WK_4_SALES")]
    Week4Sales,
    #[serde(rename = "WK_5_COMPLIANCE")]
    Week5Compliance,
    #[serde(rename = "WK_6_SHADOWING")]
    Week6Shadowing,
    #[serde(rename = "WK_7_NESTING")]
    Week7Nesting,
    #[serde(rename = "WK_8_FLOOR_SUPPORT")]
    Week8FloorSupport,
    #[serde(rename = "WK_9_CERTIFICATION")]
    Week9Certification,
    #[serde(rename = "COMPLETED")]
    Completed,
}

impl CohortStage {
    pub const COUNT: usize = 11;

    pub const fn ordered() -> [Self; Self::COUNT] {
        [
            Self::Start,
            Self::Week1Orientation,
            Self::Week2Product,
            Self::Week3Csr,
            Self::Week4Sales,
            Self::Week5Compliance,
            Self::Week6Shadowing,
            Self::Week7Nesting,
            Self::Week8FloorSupport,
            Self::Week9Certification,
            Self::Completed,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Week1Orientation => "WK_1_ORIENTATION",
            Self::Week2Product => "WK_2_PRODUCT",
            Self::Week3Csr => "WK_3_CSR",
            Self::Week4Sales => "WK_4_SALES",
            Self::Week5Compliance => "WK_5_COMPLIANCE",
            Self::Week6Shadowing => "WK_6_SHADOWING",
            Self::Week7Nesting => "WK_7_NESTING",
            Self::Week8FloorSupport => "WK_8_FLOOR_SUPPORT",
            Self::Week9Certification => "WK_9_CERTIFICATION",
            Self::Completed => "COMPLETED",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Week1Orientation => "Week 1: Orientation",
            Self::Week2Product => "Week 2: Product Knowledge",
            Self::Week3Csr => "Week 3: CSR Fundamentals",
            Self::Week4Sales => "Week 4: Sales",
            Self::Week5Compliance => "Week 5: Compliance",
            Self::Week6Shadowing => "Week 6: Shadowing",
            Self::Week7Nesting => "Week 7: Nesting",
            Self::Week8FloorSupport => "Week 8: Floor Support",
            Self::Week9Certification => "Week 9: Certification",
            Self::Completed => "Completed",
        }
    }

    pub fn index(self) -> usize {
        Self::ordered()
            .iter()
            .position(|stage| *stage == self)
            .unwrap_or(0)
    }

    pub fn next(self) -> Option<Self> {
        Self::ordered().get(self.index() + 1).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// One entry in a cohort's stage history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub stage: CohortStage,
    pub reached_on: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: CohortId,
    pub name: String,
    pub call_center: CallCenter,
    pub class_type: ClassType,
    pub current_stage: CohortStage,
    pub week_number: u8,
    pub start_date: NaiveDate,
    pub expected_end_date: NaiveDate,
    pub trainer_id: Option<TrainerId>,
    #[serde(default)]
    pub stage_statuses: BTreeMap<CohortStage, StageStatus>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub participant_ids: Vec<CandidateId>,
}

impl Cohort {
    pub fn is_active(&self) -> bool {
        self.current_stage != CohortStage::Completed
            || self.stage_status(CohortStage::Completed) != StageStatus::Completed
    }

    pub fn stage_status(&self, stage: CohortStage) -> StageStatus {
        self.stage_statuses
            .get(&stage)
            .copied()
            .unwrap_or(StageStatus::NotStarted)
    }

    pub fn has_participant(&self, candidate_id: &CandidateId) -> bool {
        self.participant_ids.iter().any(|id| id == candidate_id)
    }

    /// Close out the current stage and open the next one.
    ///
    /// Advancing out of `COMPLETED` marks it completed once; a second call fails.
    pub fn advanced(
        &self,
        today: NaiveDate,
        note: Option<String>,
    ) -> Result<Cohort, OnboardingError> {
        let mut cohort = self.clone();
        cohort
            .stage_statuses
            .insert(self.current_stage, StageStatus::Completed);

        match self.current_stage.next() {
            Some(next) => {
                cohort.current_stage = next;
                cohort.stage_statuses.insert(next, StageStatus::InProgress);
                cohort.week_number = next.index().min(9) as u8;
                cohort.milestones.push(Milestone {
                    stage: next,
                    reached_on: today,
                    note,
                });
            }
            None if self.stage_status(CohortStage::Completed) != StageStatus::Completed => {
                cohort.milestones.push(Milestone {
                    stage: CohortStage::Completed,
                    reached_on: today,
                    note,
                });
            }
            None => return Err(OnboardingError::CohortFinished),
        }

        Ok(cohort)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trainer {
    pub id: TrainerId,
    pub name: String,
    pub call_center: CallCenter,
    /// Maximum number of active cohorts led at once.
    pub capacity: u8,
    pub active: bool,
}

impl Trainer {
    /// Whether this trainer can take `cohort` given how many active cohorts they already lead.
    pub fn can_lead(&self, cohort: &Cohort, active_load: usize) -> bool {
        self.active && self.call_center == cohort.call_center && active_load < self.capacity as usize
    }

    pub fn active_load(&self, cohorts: &[Cohort]) -> usize {
        cohorts
            .iter()
            .filter(|cohort| cohort.is_active() && cohort.trainer_id.as_ref() == Some(&self.id))
            .count()
    }
}
