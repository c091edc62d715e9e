use std::collections::HashSet;

use mnemo_storage::models::MemoryRecord;

use crate::SearchLabel;

/// Combines keyword hits (newest first) with vector hits (most similar first).
///
/// Keyword hits always lead. Vector hits not already present are appended in their own order,
/// and the combined list is capped at `limit`.
pub fn merge(
	keyword: Vec<MemoryRecord>,
	vector: Vec<MemoryRecord>,
	limit: usize,
) -> (SearchLabel, Vec<MemoryRecord>) {
	match (keyword.is_empty(), vector.is_empty()) {
		(false, false) => {
			let seen: HashSet<i64> = keyword.iter().map(|record| record.id).collect();
			let mut merged = keyword;

			merged.extend(vector.into_iter().filter(|record| !seen.contains(&record.id)));
			merged.truncate(limit);

			(SearchLabel::KeywordVector, merged)
		},
		(true, false) => {
			let mut merged = vector;

			merged.truncate(limit);

			(SearchLabel::Vector, merged)
		},
		_ => {
			let mut merged = keyword;

			merged.truncate(limit);

			(SearchLabel::Keyword, merged)
		},
	}
}
