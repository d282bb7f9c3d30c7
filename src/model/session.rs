use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::question::{Category, Question};
use crate::model::result::{AnswerReview, ResultSummary, SubmittedResult};

pub const DEFAULT_HINT_QUOTA: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub time_budget_secs: u32,
    pub hint_quota: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Please enter your name to start")]
    EmptyName,
    #[error("Quiz already started")]
    AlreadyStarted,
    #[error("Quiz is not in progress")]
    NotInProgress,
    #[error("Question {index} does not exist")]
    QuestionOutOfRange { index: usize },
    #[error("Question {question} has no option {option}")]
    OptionOutOfRange { question: usize, option: usize },
    #[error("No hints remaining")]
    HintsExhausted,
    #[error("Cannot submit incomplete quiz: {missing} unanswered questions")]
    Incomplete { missing: usize },
    #[error("Quiz has not been completed")]
    NotCompleted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// First press on a complete answer sheet; a second press finalizes.
    ConfirmationRequired,
    Completed(SubmittedResult),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Running { seconds_remaining: u32 },
    /// Time ran out and the session was force-submitted.
    Expired(SubmittedResult),
}

/// One player's pass through the question bank.
///
/// All mutation goes through the transition methods below; callers only get
/// read access to the fields, and clients only ever see a [`SessionView`].
#[derive(Debug, Clone)]
pub struct Session {
    questions: Arc<[Question]>,
    settings: SessionSettings,
    phase: Phase,
    player_name: String,
    current_index: usize,
    answers: Vec<Option<usize>>,
    time_remaining: u32,
    hints_remaining: u32,
    revealed: BTreeSet<usize>,
    submitted: bool,
    submit_armed: bool,
    result: Option<SubmittedResult>,
    persisted: bool,
    history: Vec<SubmittedResult>,
}

impl Session {
    pub fn new(questions: Arc<[Question]>, settings: SessionSettings) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            questions,
            settings,
            phase: Phase::NotStarted,
            player_name: String::new(),
            current_index: 0,
            answers,
            time_remaining: settings.time_budget_secs,
            hints_remaining: settings.hint_quota,
            revealed: BTreeSet::new(),
            submitted: false,
            submit_armed: false,
            result: None,
            persisted: false,
            history: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn hints_remaining(&self) -> u32 {
        self.hints_remaining
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn is_submit_armed(&self) -> bool {
        self.submit_armed
    }

    pub fn result(&self) -> Option<&SubmittedResult> {
        self.result.as_ref()
    }

    /// Results of earlier completions in this session, oldest first.
    pub fn history(&self) -> &[SubmittedResult] {
        &self.history
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    fn missing_count(&self) -> usize {
        self.answers.len() - self.answered_count()
    }

    fn require_in_progress(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::InProgress => Ok(()),
            _ => Err(SessionError::NotInProgress),
        }
    }

    // === Transitions ===

    pub fn start(&mut self, player_name: &str) -> Result<(), SessionError> {
        if self.phase != Phase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        let name = player_name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        self.player_name = name.to_string();
        self.phase = Phase::InProgress;
        Ok(())
    }

    pub fn set_answer(&mut self, index: usize, option: usize) -> Result<(), SessionError> {
        self.require_in_progress()?;
        let question = self
            .questions
            .get(index)
            .ok_or(SessionError::QuestionOutOfRange { index })?;
        if option >= question.options.len() {
            return Err(SessionError::OptionOutOfRange {
                question: index,
                option,
            });
        }
        self.answers[index] = Some(option);
        self.submit_armed = false;
        Ok(())
    }

    /// Moves forward one question; a no-op on the last one.
    pub fn advance(&mut self) -> Result<(), SessionError> {
        self.require_in_progress()?;
        let last = self.questions.len().saturating_sub(1);
        self.current_index = (self.current_index + 1).min(last);
        self.submit_armed = false;
        Ok(())
    }

    /// Moves back one question; a no-op on the first one.
    pub fn retreat(&mut self) -> Result<(), SessionError> {
        self.require_in_progress()?;
        self.current_index = self.current_index.saturating_sub(1);
        self.submit_armed = false;
        Ok(())
    }

    /// Spends a hint on the current question and returns the hints left.
    /// A question that is already revealed costs nothing.
    pub fn use_hint(&mut self) -> Result<u32, SessionError> {
        self.require_in_progress()?;
        if self.revealed.contains(&self.current_index) {
            return Ok(self.hints_remaining);
        }
        if self.hints_remaining == 0 {
            return Err(SessionError::HintsExhausted);
        }
        self.hints_remaining -= 1;
        self.revealed.insert(self.current_index);
        Ok(self.hints_remaining)
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome, SessionError> {
        self.require_in_progress()?;
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            // Expiry overrides the completeness gate.
            return Ok(TickOutcome::Expired(self.complete(now)));
        }
        Ok(TickOutcome::Running {
            seconds_remaining: self.time_remaining,
        })
    }

    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<SubmitOutcome, SessionError> {
        self.require_in_progress()?;
        let missing = self.missing_count();
        if missing > 0 {
            return Err(SessionError::Incomplete { missing });
        }
        if !self.submit_armed {
            self.submit_armed = true;
            return Ok(SubmitOutcome::ConfirmationRequired);
        }
        Ok(SubmitOutcome::Completed(self.complete(now)))
    }

    /// Back to `NotStarted`, keeping the questions and earlier results.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Completed {
            return Err(SessionError::NotCompleted);
        }
        let history = std::mem::take(&mut self.history);
        *self = Session::new(self.questions.clone(), self.settings);
        self.history = history;
        Ok(())
    }

    /// Hands out the latest completed result the first time it is asked for,
    /// so it is written to storage once per completion.
    pub fn take_unpersisted_result(&mut self) -> Option<SubmittedResult> {
        if self.persisted {
            return None;
        }
        let result = self.result.clone()?;
        self.persisted = true;
        Some(result)
    }

    fn complete(&mut self, now: DateTime<Utc>) -> SubmittedResult {
        let mut score = 0;
        let mut structure_score = 0;
        let mut written_expression_score = 0;
        for (question, answer) in self.questions.iter().zip(&self.answers) {
            if question.is_correct(*answer) {
                score += 1;
                match question.category {
                    Category::Structure => structure_score += 1,
                    Category::WrittenExpression => written_expression_score += 1,
                }
            }
        }

        let result = SubmittedResult {
            user_name: self.player_name.clone(),
            score,
            total_questions: self.questions.len() as u32,
            structure_score,
            written_expression_score,
            time_elapsed: self.settings.time_budget_secs.saturating_sub(self.time_remaining),
            answers: self.answers.clone(),
            completed_at: now,
        };

        self.phase = Phase::Completed;
        self.submitted = true;
        self.submit_armed = false;
        self.persisted = false;
        self.result = Some(result.clone());
        self.history.push(result.clone());
        result
    }

    // === Views ===

    pub fn to_view(&self) -> SessionView {
        let question = match self.phase {
            Phase::NotStarted => None,
            _ => self.questions.get(self.current_index).map(|q| QuestionView {
                id: q.id,
                prompt: q.question.clone(),
                options: q.options.clone(),
                category: q.category,
                selected: self.answers[self.current_index],
                explanation: (self.phase == Phase::Completed
                    || self.revealed.contains(&self.current_index))
                .then(|| q.explanation.clone()),
            }),
        };

        let progress = |category: Category| CategoryProgress {
            answered: self
                .questions
                .iter()
                .zip(&self.answers)
                .filter(|(q, a)| q.category == category && a.is_some())
                .count(),
            total: self
                .questions
                .iter()
                .filter(|q| q.category == category)
                .count(),
        };

        SessionView {
            phase: self.phase,
            player_name: self.player_name.clone(),
            current_index: self.current_index,
            total_questions: self.questions.len(),
            question,
            answers: self.answers.clone(),
            answered_count: self.answered_count(),
            structure: progress(Category::Structure),
            written_expression: progress(Category::WrittenExpression),
            time_remaining: self.time_remaining,
            hints_remaining: self.hints_remaining,
            hints_used: self.settings.hint_quota - self.hints_remaining,
            submit_armed: self.submit_armed,
            submitted: self.submitted,
            summary: self.result.as_ref().map(|r| self.summarize(r)),
        }
    }

    fn summarize(&self, result: &SubmittedResult) -> ResultSummary {
        ResultSummary {
            result: result.clone(),
            percentage: result.percentage(),
            performance: result.performance(),
            review: self
                .questions
                .iter()
                .zip(&result.answers)
                .map(|(q, a)| AnswerReview::new(q, *a))
                .collect(),
        }
    }
}

// === Session View ===
// What the player's client renders. The selected option is derived from the
// answer slot; correct answers only appear in the completed summary.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: u32,
    pub prompt: String,
    pub options: Vec<String>,
    pub category: Category,
    pub selected: Option<usize>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProgress {
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: Phase,
    pub player_name: String,
    pub current_index: usize,
    pub total_questions: usize,
    pub question: Option<QuestionView>,
    pub answers: Vec<Option<usize>>,
    pub answered_count: usize,
    pub structure: CategoryProgress,
    pub written_expression: CategoryProgress,
    pub time_remaining: u32,
    pub hints_remaining: u32,
    pub hints_used: u32,
    pub submit_armed: bool,
    pub submitted: bool,
    pub summary: Option<ResultSummary>,
}
