//! Aligning freely typed player names with the roster.
//!
//! Exact matches (after normalization) are taken first. Whatever is left is
//! matched heuristically against roster entries nobody has claimed yet.

use std::collections::HashSet;

use log::info;
use serde::{Deserialize, Serialize};

use crate::model::result::StoredResult;
use crate::model::roster::{Roster, RosterEntry, normalize_name};

/// One name contains the other.
pub const CONTAINMENT_SIMILARITY: f64 = 0.8;
/// The names share a word longer than two characters.
pub const SHARED_TOKEN_SIMILARITY: f64 = 0.6;
pub const MATCH_THRESHOLD: f64 = 0.6;

const MIN_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledResult {
    pub result: StoredResult,
    /// Canonical roster name when matched, the submitted name otherwise.
    pub display_name: String,
    /// The roster entry this result was attributed to.
    pub roster_name: Option<String>,
    /// Only set for heuristic matches.
    pub original_name: Option<String>,
    pub match_confidence: Option<f64>,
}

impl ReconciledResult {
    fn exact(stored: &StoredResult, entry: &RosterEntry) -> Self {
        Self {
            result: stored.clone(),
            display_name: entry.name.clone(),
            roster_name: Some(entry.name.clone()),
            original_name: None,
            match_confidence: None,
        }
    }

    fn fuzzy(stored: &StoredResult, entry: &RosterEntry, confidence: f64) -> Self {
        Self {
            result: stored.clone(),
            display_name: entry.name.clone(),
            roster_name: Some(entry.name.clone()),
            original_name: Some(stored.result.user_name.clone()),
            match_confidence: Some(confidence),
        }
    }

    fn unmatched(stored: &StoredResult) -> Self {
        Self {
            result: stored.clone(),
            display_name: stored.result.user_name.trim().to_string(),
            roster_name: None,
            original_name: None,
            match_confidence: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStatus {
    pub name: String,
    pub is_admin: bool,
    pub is_excluded: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    /// Same order as the input results.
    pub results: Vec<ReconciledResult>,
    /// Same order as the roster.
    pub roster: Vec<RosterStatus>,
}

impl Reconciliation {
    pub fn completed_count(&self) -> usize {
        self.roster
            .iter()
            .filter(|s| s.completed && !s.is_excluded)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.roster
            .iter()
            .filter(|s| !s.completed && !s.is_excluded)
            .count()
    }
}

/// Similarity of two already-normalized names.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.contains(b) || b.contains(a) {
        return CONTAINMENT_SIMILARITY;
    }
    let shares_token = a.split_whitespace().any(|ta| {
        ta.chars().count() >= MIN_TOKEN_CHARS && b.split_whitespace().any(|tb| ta == tb)
    });
    if shares_token {
        SHARED_TOKEN_SIMILARITY
    } else {
        0.0
    }
}

/// The first unclaimed, non-excluded entry with the highest similarity.
fn best_candidate<'a>(
    roster: &'a Roster,
    name: &str,
    matched: &HashSet<&str>,
) -> Option<(&'a RosterEntry, f64)> {
    let mut best: Option<(&RosterEntry, f64)> = None;
    for entry in roster.entries() {
        if entry.is_excluded || matched.contains(entry.name.as_str()) {
            continue;
        }
        let score = similarity(&entry.name, name);
        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((entry, score));
        }
    }
    best
}

/// Attribute each result to a roster entry and derive completion from
/// scratch. Neither input is modified.
pub fn reconcile(roster: &Roster, results: &[StoredResult]) -> Reconciliation {
    let mut matched: HashSet<&str> = HashSet::new();
    let mut reconciled: Vec<Option<ReconciledResult>> = vec![None; results.len()];
    let mut unmatched = Vec::new();

    for (i, stored) in results.iter().enumerate() {
        let name = normalize_name(&stored.result.user_name);
        match roster.entries().iter().find(|e| e.name == name) {
            Some(entry) => {
                matched.insert(entry.name.as_str());
                reconciled[i] = Some(ReconciledResult::exact(stored, entry));
            }
            None => unmatched.push(i),
        }
    }

    for i in unmatched {
        let stored = &results[i];
        let name = normalize_name(&stored.result.user_name);
        let attributed = match best_candidate(roster, &name, &matched) {
            Some((entry, confidence)) if confidence >= MATCH_THRESHOLD => {
                info!(
                    "Matched \"{}\" to roster entry \"{}\" with confidence {confidence}",
                    stored.result.user_name, entry.name
                );
                matched.insert(entry.name.as_str());
                ReconciledResult::fuzzy(stored, entry, confidence)
            }
            _ => ReconciledResult::unmatched(stored),
        };
        reconciled[i] = Some(attributed);
    }

    let roster_status = roster
        .entries()
        .iter()
        .map(|entry| RosterStatus {
            name: entry.name.clone(),
            is_admin: entry.is_admin,
            is_excluded: entry.is_excluded,
            completed: matched.contains(entry.name.as_str()),
        })
        .collect();

    Reconciliation {
        results: reconciled.into_iter().flatten().collect(),
        roster: roster_status,
    }
}
