use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    EvaluationDraft, InterviewEvaluation, InterviewRecord, InterviewStatus, Recommendation,
    ScoreCard,
};
use super::error::OnboardingError;

/// Inclusive composite score required to pass an interview.
pub const PASSING_SCORE: f64 = 4.0;

const MIN_SUB_SCORE: u8 = 1;
const MAX_SUB_SCORE: u8 = 5;

impl InterviewEvaluation {
    /// Validate a draft and fix its average score.
    pub fn from_draft(
        draft: EvaluationDraft,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, OnboardingError> {
        if draft.evaluator.trim().is_empty() {
            return Err(OnboardingError::InvalidEvaluation(
                "evaluator name is required".to_string(),
            ));
        }

        for (dimension, value) in dimension_names().iter().zip(draft.scores.values()) {
            if !(MIN_SUB_SCORE..=MAX_SUB_SCORE).contains(&value) {
                return Err(OnboardingError::InvalidEvaluation(format!(
                    "{dimension} score {value} outside {MIN_SUB_SCORE}-{MAX_SUB_SCORE}"
                )));
            }
        }

        Ok(Self {
            evaluator: draft.evaluator.trim().to_string(),
            average_score: average_score(&draft.scores),
            scores: draft.scores,
            recommendation: draft.recommendation,
            strengths: draft.strengths,
            concerns: draft.concerns,
            notes: draft.notes,
            submitted_at,
        })
    }
}

/// Mean of the five sub-scores to one decimal.
pub fn average_score(scores: &ScoreCard) -> f64 {
    let values = scores.values();
    let sum: u32 = values.iter().map(|value| u32::from(*value)).sum();
    let mean = f64::from(sum) / values.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// Mean of each scorecard's own average, not of every raw sub-score; 0 when
/// nothing has been submitted.
///
/// Averages carry one decimal, so the sum is taken in whole tenths and divided
/// once. A set whose exact mean is 4.0 therefore yields exactly 4.0.
pub fn composite_score(evaluations: &[InterviewEvaluation]) -> f64 {
    if evaluations.is_empty() {
        return 0.0;
    }

    total_tenths(evaluations) as f64 / (10 * evaluations.len()) as f64
}

/// Inclusive threshold check on the scorecards themselves.
pub fn passes_interview(evaluations: &[InterviewEvaluation]) -> bool {
    !evaluations.is_empty()
        && total_tenths(evaluations) >= passing_tenths() * evaluations.len() as i64
}

pub fn passes_threshold(score: f64) -> bool {
    (score * 10.0).round() as i64 >= passing_tenths()
}

fn passing_tenths() -> i64 {
    (PASSING_SCORE * 10.0).round() as i64
}

fn total_tenths(evaluations: &[InterviewEvaluation]) -> i64 {
    evaluations
        .iter()
        .map(|evaluation| (evaluation.average_score * 10.0).round() as i64)
        .sum()
}

pub fn meets_hiring_criteria(interview: &InterviewRecord) -> bool {
    interview.status == InterviewStatus::Completed && passes_threshold(interview.composite_score)
}

fn dimension_names() -> [&'static str; 5] {
    [
        "communication",
        "technical",
        "customer service",
        "problem solving",
        "culture fit",
    ]
}

/// Per-dimension breakdown for reviewers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub composite_score: f64,
    pub evaluation_count: usize,
    pub meets_hiring_criteria: bool,
    pub dimension_means: BTreeMap<&'static str, f64>,
    pub recommendations: Vec<RecommendationTally>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationTally {
    pub recommendation: Recommendation,
    pub count: usize,
}

impl EvaluationSummary {
    pub fn from_interview(interview: &InterviewRecord) -> Self {
        let evaluations = &interview.evaluations;
        let mut dimension_means = BTreeMap::new();

        if !evaluations.is_empty() {
            for (index, name) in dimension_names().into_iter().enumerate() {
                let sum: u32 = evaluations
                    .iter()
                    .map(|evaluation| u32::from(evaluation.scores.values()[index]))
                    .sum();
                dimension_means.insert(name, f64::from(sum) / evaluations.len() as f64);
            }
        }

        let recommendations = Recommendation::ordered()
            .into_iter()
            .map(|recommendation| RecommendationTally {
                recommendation,
                count: evaluations
                    .iter()
                    .filter(|evaluation| evaluation.recommendation == recommendation)
                    .count(),
            })
            .filter(|tally| tally.count > 0)
            .collect();

        Self {
            composite_score: composite_score(evaluations),
            evaluation_count: evaluations.len(),
            meets_hiring_criteria: meets_hiring_criteria(interview),
            dimension_means,
            recommendations,
        }
    }
}
