use serde::{Deserialize, Serialize};

use crate::model::roster::{Roster, normalize_name};
use crate::reconcile::ReconciledResult;

pub const DEFAULT_LEADERBOARD_SIZE: usize = 6;

/// Submissions whose name contains one of these are practice runs.
const PRACTICE_MARKERS: [&str; 3] = ["TEST", "DEMO", "SAMPLE"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub score: u32,
    pub total_questions: u32,
    pub time_elapsed: u32,
}

fn is_practice_name(name: &str) -> bool {
    let upper = normalize_name(name);
    PRACTICE_MARKERS.iter().any(|m| upper.contains(m))
}

/// Practice markers are checked on what the player typed, since a practice
/// run may still be matched to a roster entry.
fn is_ranked(result: &ReconciledResult, roster: &Roster) -> bool {
    if result.result.is_admin {
        return false;
    }
    let submitted = &result.result.result.user_name;
    if is_practice_name(submitted)
        || result
            .original_name
            .as_deref()
            .is_some_and(is_practice_name)
    {
        return false;
    }
    !roster.is_ranking_excluded(&result.display_name)
}

/// Best scores first, faster completion breaking ties.
pub fn leaderboard(
    results: &[ReconciledResult],
    roster: &Roster,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&ReconciledResult> =
        results.iter().filter(|r| is_ranked(r, roster)).collect();
    ranked.sort_by(|a, b| {
        b.result
            .result
            .score
            .cmp(&a.result.result.score)
            .then(a.result.result.time_elapsed.cmp(&b.result.result.time_elapsed))
    });

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, r)| LeaderboardEntry {
            rank: i + 1,
            name: r.display_name.clone(),
            score: r.result.result.score,
            total_questions: r.result.result.total_questions,
            time_elapsed: r.result.result.time_elapsed,
        })
        .collect()
}
