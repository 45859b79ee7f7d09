//! "Did you mean" suggestions for missing members

use std::sync::Arc;

const MIN_SCORE: f64 = 0.7;

/// Existing names most similar to `name`, best first
pub(crate) fn suggest(name: &str, candidates: &[Arc<str>], limit: usize) -> Vec<String> {
    let name = name.to_lowercase();
    let mut scored: Vec<(f64, &Arc<str>)> = candidates
        .iter()
        .map(|candidate| (strsim::jaro_winkler(&name, &candidate.to_lowercase()), candidate))
        .filter(|(score, _)| *score >= MIN_SCORE)
        .collect();
    // Stable sort keeps declaration order among equal scores
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}
