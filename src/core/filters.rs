use std::collections::HashSet;

use crate::models::ProfileSummary;

/// Drop excluded candidates and keep at most `limit` of the rest.
///
/// Order of `candidates` is preserved; there is no re-ranking and no padding.
/// Candidates are matched on their `user_id`, which is what swipes record.
#[inline]
pub fn filter_suggestions(
    candidates: Vec<ProfileSummary>,
    excluded_user_ids: &HashSet<u64>,
    limit: usize,
) -> Vec<ProfileSummary> {
    candidates
        .into_iter()
        .filter(|profile| !excluded_user_ids.contains(&profile.user_id))
        .take(limit)
        .collect()
}
