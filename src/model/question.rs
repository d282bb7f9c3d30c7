use serde::{Deserialize, Serialize};
use thiserror::Error;

// === Category ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Structure,
    WrittenExpression,
}

// === Question ===
// Field names follow the question bank document, so the struct can be
// deserialized straight from it.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
    pub explanation: String,
    #[serde(rename = "type")]
    pub category: Category,
}

impl Question {
    pub fn is_correct(&self, selected: Option<usize>) -> bool {
        selected == Some(self.correct)
    }
}

// === Question Bank ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Minutes allowed for the whole test.
    pub time_limit: u32,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("question bank contains no questions")]
    Empty,
    #[error("question bank time limit must be at least one minute")]
    NoTimeLimit,
    #[error("question {id} needs at least two options")]
    TooFewOptions { id: u32 },
    #[error("question {id} marks option {correct} correct but only has {options} options")]
    CorrectOutOfRange {
        id: u32,
        correct: usize,
        options: usize,
    },
}

impl QuestionBank {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let bank: QuestionBank = serde_json::from_str(text)?;
        bank.validate()?;
        Ok(bank)
    }

    pub fn validate(&self) -> Result<(), BankError> {
        if self.questions.is_empty() {
            return Err(BankError::Empty);
        }
        if self.time_limit == 0 {
            return Err(BankError::NoTimeLimit);
        }
        for q in &self.questions {
            if q.options.len() < 2 {
                return Err(BankError::TooFewOptions { id: q.id });
            }
            if q.correct >= q.options.len() {
                return Err(BankError::CorrectOutOfRange {
                    id: q.id,
                    correct: q.correct,
                    options: q.options.len(),
                });
            }
        }
        Ok(())
    }

    pub fn time_budget_secs(&self) -> u32 {
        self.time_limit.saturating_mul(60)
    }

    pub fn count_in(&self, category: Category) -> usize {
        self.questions
            .iter()
            .filter(|q| q.category == category)
            .count()
    }
}
