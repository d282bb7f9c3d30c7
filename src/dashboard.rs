use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::leaderboard::{LeaderboardEntry, leaderboard};
use crate::model::question::{Category, QuestionBank};
use crate::model::result::StoredResult;
use crate::model::roster::Roster;
use crate::model::session::{Phase, Session};
use crate::reconcile::{ReconciledResult, RosterStatus, reconcile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKeyEntry {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
    pub explanation: String,
    pub category: Category,
}

/// A player currently connected, as seen from the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    pub player_name: String,
    pub phase: Phase,
    pub answered: usize,
    pub total_questions: usize,
    pub time_remaining: u32,
}

impl LiveSession {
    pub fn from_session(session: &Session) -> Self {
        Self {
            player_name: session.player_name().to_string(),
            phase: session.phase(),
            answered: session.answered_count(),
            total_questions: session.answers().len(),
            time_remaining: session.time_remaining(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminView {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<ReconciledResult>,
    pub rankings: Vec<LeaderboardEntry>,
    pub roster: Vec<RosterStatus>,
    pub completed_count: usize,
    pub pending_count: usize,
    pub active_sessions: Vec<LiveSession>,
    /// Empty when the question bank could not be loaded.
    pub answer_key: Vec<AnswerKeyEntry>,
}

pub fn answer_key(bank: &QuestionBank) -> Vec<AnswerKeyEntry> {
    bank.questions
        .iter()
        .map(|q| AnswerKeyEntry {
            id: q.id,
            question: q.question.clone(),
            options: q.options.clone(),
            correct: q.correct,
            explanation: q.explanation.clone(),
            category: q.category,
        })
        .collect()
}

pub fn build_admin_view(
    roster: &Roster,
    stored: &[StoredResult],
    active_sessions: Vec<LiveSession>,
    bank: Option<&QuestionBank>,
    now: DateTime<Utc>,
) -> AdminView {
    let reconciliation = reconcile(roster, stored);
    // Full ranking, not capped like the public leaderboard.
    let rankings = leaderboard(&reconciliation.results, roster, usize::MAX);
    AdminView {
        generated_at: now,
        completed_count: reconciliation.completed_count(),
        pending_count: reconciliation.pending_count(),
        rankings,
        results: reconciliation.results,
        roster: reconciliation.roster,
        active_sessions,
        answer_key: bank.map(answer_key).unwrap_or_default(),
    }
}
