use sqlx::SqliteExecutor;

use crate::{
	Result,
	models::{EmbeddingRow, StoredEmbedding},
};

/// Stores `vector` for `memory_id`, replacing any previous one.
///
/// The write only lands while the record still exists; a vector computed for a record deleted
/// in the meantime is discarded and `false` is returned.
pub async fn put_embedding<'e, E>(
	executor: E,
	memory_id: i64,
	model: &str,
	vector: &[f32],
	updated_at: i64,
) -> Result<bool>
where
	E: SqliteExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT OR REPLACE INTO memory_embeddings (memory_id, model, dim, vector, updated_at)
SELECT ?, ?, ?, ?, ?
WHERE EXISTS (SELECT 1 FROM memories WHERE id = ?)",
	)
	.bind(memory_id)
	.bind(model)
	.bind(vector.len() as i64)
	.bind(encode_vector(vector))
	.bind(updated_at)
	.bind(memory_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn get_embedding<'e, E>(executor: E, memory_id: i64) -> Result<Option<StoredEmbedding>>
where
	E: SqliteExecutor<'e>,
{
	let row = sqlx::query_as::<_, EmbeddingRow>(
		"SELECT memory_id, model, dim, vector FROM memory_embeddings WHERE memory_id = ?",
	)
	.bind(memory_id)
	.fetch_optional(executor)
	.await?;

	Ok(row.and_then(decode_row))
}

/// Every stored vector, optionally restricted to records of one project.
///
/// Rows whose blob length disagrees with their recorded dimension are skipped.
pub async fn list_embeddings<'e, E>(
	executor: E,
	project: Option<&str>,
) -> Result<Vec<StoredEmbedding>>
where
	E: SqliteExecutor<'e>,
{
	let rows = sqlx::query_as::<_, EmbeddingRow>(
		"\
SELECT e.memory_id, e.model, e.dim, e.vector
FROM memory_embeddings e
JOIN memories m ON m.id = e.memory_id
WHERE ? IS NULL OR m.project = ?
ORDER BY e.memory_id ASC",
	)
	.bind(project)
	.bind(project)
	.fetch_all(executor)
	.await?;

	Ok(rows.into_iter().filter_map(decode_row).collect())
}

pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
	vector.iter().flat_map(|value| value.to_le_bytes()).collect()
}

pub fn decode_vector(bytes: &[u8]) -> Option<Vec<f32>> {
	if bytes.len() % 4 != 0 {
		return None;
	}

	Some(
		bytes
			.chunks_exact(4)
			.map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
			.collect(),
	)
}

fn decode_row(row: EmbeddingRow) -> Option<StoredEmbedding> {
	let vector = decode_vector(&row.vector).filter(|vector| vector.len() as i64 == row.dim);

	if vector.is_none() {
		tracing::warn!(
			memory_id = row.memory_id,
			dim = row.dim,
			"Skipping malformed embedding row."
		);
	}

	vector.map(|vector| StoredEmbedding { memory_id: row.memory_id, model: row.model, vector })
}
