use serde::Serialize;
use sqlx::SqliteConnection;

use crate::{Result, migrate};

#[derive(Clone, Debug, Serialize)]
pub struct StoreStats {
	pub schema_version: i64,
	pub records: i64,
	pub embeddings: i64,
	pub distinct_tags: i64,
	pub by_project: Vec<GroupCount>,
	pub by_type: Vec<GroupCount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct GroupCount {
	pub name: String,
	pub count: i64,
}

pub async fn collect(executor: &mut SqliteConnection) -> Result<StoreStats> {
	let schema_version = migrate::current_version(&mut *executor).await?;
	let records: i64 =
		sqlx::query_scalar("SELECT COUNT(*) FROM memories").fetch_one(&mut *executor).await?;
	let embeddings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memory_embeddings")
		.fetch_one(&mut *executor)
		.await?;
	let distinct_tags: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT tag) FROM memory_tags")
		.fetch_one(&mut *executor)
		.await?;
	let by_project = sqlx::query_as::<_, GroupCount>(
		"\
SELECT project AS name, COUNT(*) AS count
FROM memories
GROUP BY project
ORDER BY count DESC, name ASC",
	)
	.fetch_all(&mut *executor)
	.await?;
	let by_type = sqlx::query_as::<_, GroupCount>(
		"\
SELECT type AS name, COUNT(*) AS count
FROM memories
GROUP BY type
ORDER BY count DESC, name ASC",
	)
	.fetch_all(&mut *executor)
	.await?;

	Ok(StoreStats { schema_version, records, embeddings, distinct_tags, by_project, by_type })
}
