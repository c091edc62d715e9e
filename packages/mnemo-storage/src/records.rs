use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor};

use crate::{
	Result,
	filter::RecordFilter,
	models::{MemoryRecord, NewRecord, RecordPatch},
};

const RECORD_COLUMNS: &str =
	"SELECT m.id, m.title, m.content, m.type, m.project, m.created_at, m.updated_at";

pub async fn insert_record<'e, E>(executor: E, record: &NewRecord<'_>) -> Result<i64>
where
	E: SqliteExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO memories (title, content, type, project, created_at)
VALUES (?, ?, ?, ?, ?)",
	)
	.bind(record.title)
	.bind(record.content)
	.bind(record.r#type)
	.bind(record.project)
	.bind(record.created_at)
	.execute(executor)
	.await?;

	Ok(result.last_insert_rowid())
}

pub async fn get_record<'e, E>(executor: E, id: i64) -> Result<Option<MemoryRecord>>
where
	E: SqliteExecutor<'e>,
{
	let sql = format!("{RECORD_COLUMNS} FROM memories m WHERE m.id = ?");
	let row = sqlx::query_as::<_, MemoryRecord>(&sql).bind(id).fetch_optional(executor).await?;

	Ok(row)
}

/// Applies the populated columns of `patch` and stamps `updated_at`.
///
/// Returns `false` when the record does not exist. An empty patch touches nothing.
pub async fn update_record<'e, E>(
	executor: E,
	id: i64,
	patch: &RecordPatch<'_>,
	updated_at: i64,
) -> Result<bool>
where
	E: SqliteExecutor<'e>,
{
	if patch.is_empty() {
		return Ok(false);
	}

	let mut builder = QueryBuilder::<Sqlite>::new("UPDATE memories SET ");
	let mut sets = builder.separated(", ");

	if let Some(title) = patch.title {
		sets.push("title = ").push_bind_unseparated(title.to_string());
	}
	if let Some(content) = patch.content {
		sets.push("content = ").push_bind_unseparated(content.to_string());
	}
	if let Some(memory_type) = patch.r#type {
		sets.push("type = ").push_bind_unseparated(memory_type.to_string());
	}
	if let Some(project) = patch.project {
		sets.push("project = ").push_bind_unseparated(project.to_string());
	}

	sets.push("updated_at = ").push_bind_unseparated(updated_at);
	builder.push(" WHERE id = ").push_bind(id);

	let result = builder.build().execute(executor).await?;

	Ok(result.rows_affected() > 0)
}

/// Fetches the records whose ids are in `ids`. Missing ids are skipped.
pub async fn get_records<'e, E>(executor: E, ids: &[i64]) -> Result<Vec<MemoryRecord>>
where
	E: SqliteExecutor<'e>,
{
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut builder = QueryBuilder::<Sqlite>::new(RECORD_COLUMNS);

	builder.push(" FROM memories m WHERE m.id IN (");

	let mut in_list = builder.separated(", ");

	for id in ids {
		in_list.push_bind(*id);
	}

	builder.push(") ORDER BY m.created_at DESC, m.id DESC");

	let rows = builder.build_query_as::<MemoryRecord>().fetch_all(executor).await?;

	Ok(rows)
}

/// Deletes records together with their tags and embeddings.
///
/// Returns how many of `ids` existed. Run it inside a transaction so the three deletes land
/// together.
pub async fn delete_records(executor: &mut SqliteConnection, ids: &[i64]) -> Result<u64> {
	if ids.is_empty() {
		return Ok(0);
	}

	for table in ["memory_tags", "memory_embeddings"] {
		let mut builder =
			QueryBuilder::<Sqlite>::new(format!("DELETE FROM {table} WHERE memory_id IN ("));

		push_id_list(&mut builder, ids);
		builder.build().execute(&mut *executor).await?;
	}

	let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM memories WHERE id IN (");

	push_id_list(&mut builder, ids);

	let result = builder.build().execute(&mut *executor).await?;

	Ok(result.rows_affected())
}

/// Lists records matching `filter`, newest first. `limit = None` returns every match.
pub async fn list_records<'e, E>(
	executor: E,
	filter: &RecordFilter,
	limit: Option<u32>,
) -> Result<Vec<MemoryRecord>>
where
	E: SqliteExecutor<'e>,
{
	let mut builder = QueryBuilder::<Sqlite>::new(RECORD_COLUMNS);

	filter.push_from_where(&mut builder);
	builder.push(" ORDER BY m.created_at DESC, m.id DESC");

	if let Some(limit) = limit {
		builder.push(" LIMIT ").push_bind(i64::from(limit));
	}

	let rows = builder.build_query_as::<MemoryRecord>().fetch_all(executor).await?;

	Ok(rows)
}

/// Ids of records that have no embedding, or one produced by a model other than `model`.
pub async fn ids_needing_embedding<'e, E>(executor: E, model: Option<&str>) -> Result<Vec<i64>>
where
	E: SqliteExecutor<'e>,
{
	let ids: Vec<i64> = sqlx::query_scalar(
		"\
SELECT m.id
FROM memories m
LEFT JOIN memory_embeddings e ON e.memory_id = m.id
WHERE e.memory_id IS NULL OR (? IS NOT NULL AND e.model <> ?)
ORDER BY m.id ASC",
	)
	.bind(model)
	.bind(model)
	.fetch_all(executor)
	.await?;

	Ok(ids)
}

fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
	let mut in_list = builder.separated(", ");

	for id in ids {
		in_list.push_bind(*id);
	}

	builder.push(")");
}
