use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::question::Question;

// === Submitted Result ===
// Created once when a session completes and never mutated afterwards. The
// camelCase names match the columns of the hosted results table.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedResult {
    pub user_name: String,
    pub score: u32,
    pub total_questions: u32,
    pub structure_score: u32,
    pub written_expression_score: u32,
    /// Seconds spent, i.e. time budget minus time remaining.
    pub time_elapsed: u32,
    #[serde(with = "answer_slots")]
    pub answers: Vec<Option<usize>>,
    pub completed_at: DateTime<Utc>,
}

impl SubmittedResult {
    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        (f64::from(self.score) * 100.0 / f64::from(self.total_questions)).round() as u32
    }

    pub fn performance(&self) -> PerformanceLevel {
        PerformanceLevel::from_percentage(self.percentage())
    }
}

/// A result row as stored by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub result: SubmittedResult,
    #[serde(default)]
    pub is_admin: bool,
}

/// Unanswered slots travel as `-1`, the sentinel the results table uses.
mod answer_slots {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(slots: &[Option<usize>], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(slots.iter().map(|slot| slot.map_or(-1, |o| o as i64)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Option<usize>>, D::Error> {
        let raw = Vec::<i64>::deserialize(d)?;
        Ok(raw.into_iter().map(|v| usize::try_from(v).ok()).collect())
    }
}

// === Performance ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PerformanceLevel {
    Excellent,
    VeryGood,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceLevel {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Self::Excellent,
            80..=89 => Self::VeryGood,
            70..=79 => Self::Good,
            60..=69 => Self::Fair,
            _ => Self::NeedsImprovement,
        }
    }
}

// === Review ===
// Shown to the player once the session is completed.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReview {
    pub question_id: u32,
    pub selected: Option<usize>,
    pub correct: usize,
    pub is_correct: bool,
    pub explanation: String,
}

impl AnswerReview {
    pub fn new(question: &Question, selected: Option<usize>) -> Self {
        Self {
            question_id: question.id,
            selected,
            correct: question.correct,
            is_correct: question.is_correct(selected),
            explanation: question.explanation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub result: SubmittedResult,
    pub percentage: u32,
    pub performance: PerformanceLevel,
    pub review: Vec<AnswerReview>,
}
