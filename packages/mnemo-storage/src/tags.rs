use std::collections::{BTreeSet, HashMap};

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor};

use crate::{Result, models::TagCount};

pub fn normalize_tag(raw: &str) -> Option<String> {
	let tag = raw.trim().to_lowercase();

	if tag.is_empty() { None } else { Some(tag) }
}

/// Trims, lower-cases, drops blanks, and deduplicates. Result is sorted.
pub fn normalize_tags<S>(raw: &[S]) -> Vec<String>
where
	S: AsRef<str>,
{
	raw.iter()
		.filter_map(|tag| normalize_tag(tag.as_ref()))
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect()
}

/// Replaces the whole tag set of `memory_id`. An empty `tags` clears it.
///
/// Returns the normalized set that was stored.
pub async fn set_tags<S>(
	executor: &mut SqliteConnection,
	memory_id: i64,
	tags: &[S],
) -> Result<Vec<String>>
where
	S: AsRef<str>,
{
	let tags = normalize_tags(tags);

	sqlx::query("DELETE FROM memory_tags WHERE memory_id = ?")
		.bind(memory_id)
		.execute(&mut *executor)
		.await?;

	for tag in &tags {
		sqlx::query("INSERT OR IGNORE INTO memory_tags (memory_id, tag) VALUES (?, ?)")
			.bind(memory_id)
			.bind(tag.as_str())
			.execute(&mut *executor)
			.await?;
	}

	Ok(tags)
}

pub async fn get_tags<'e, E>(executor: E, memory_id: i64) -> Result<Vec<String>>
where
	E: SqliteExecutor<'e>,
{
	let tags: Vec<String> =
		sqlx::query_scalar("SELECT tag FROM memory_tags WHERE memory_id = ? ORDER BY tag ASC")
			.bind(memory_id)
			.fetch_all(executor)
			.await?;

	Ok(tags)
}

/// Tag sets for many records at once. Records without tags map to an empty list.
pub async fn tags_for<'e, E>(executor: E, memory_ids: &[i64]) -> Result<HashMap<i64, Vec<String>>>
where
	E: SqliteExecutor<'e>,
{
	let mut out: HashMap<i64, Vec<String>> =
		memory_ids.iter().map(|id| (*id, Vec::new())).collect();

	if memory_ids.is_empty() {
		return Ok(out);
	}

	let mut builder =
		QueryBuilder::<Sqlite>::new("SELECT memory_id, tag FROM memory_tags WHERE memory_id IN (");
	let mut in_list = builder.separated(", ");

	for id in memory_ids {
		in_list.push_bind(*id);
	}

	builder.push(") ORDER BY memory_id ASC, tag ASC");

	let rows: Vec<(i64, String)> = builder.build_query_as().fetch_all(executor).await?;

	for (memory_id, tag) in rows {
		out.entry(memory_id).or_default().push(tag);
	}

	Ok(out)
}

/// Distinct-record counts per tag, most used first, ties broken alphabetically.
pub async fn tag_counts<'e, E>(executor: E, project: Option<&str>) -> Result<Vec<TagCount>>
where
	E: SqliteExecutor<'e>,
{
	let rows = sqlx::query_as::<_, TagCount>(
		"\
SELECT t.tag, COUNT(DISTINCT t.memory_id) AS count
FROM memory_tags t
JOIN memories m ON m.id = t.memory_id
WHERE ? IS NULL OR m.project = ?
GROUP BY t.tag
ORDER BY count DESC, t.tag ASC",
	)
	.bind(project)
	.bind(project)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

#[cfg(test)]
mod tests {
	use crate::tags::normalize_tags;

	#[test]
	fn normalizes_mixed_case_and_whitespace() {
		let tags = normalize_tags(&["BUG", " Auth ", "", "  ", "bug"]);

		assert_eq!(tags, vec!["auth".to_string(), "bug".to_string()]);
	}

	#[test]
	fn empty_input_normalizes_to_empty() {
		let tags = normalize_tags::<&str>(&[]);

		assert!(tags.is_empty());
	}
}
