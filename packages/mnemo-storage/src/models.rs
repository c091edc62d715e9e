use serde::{Deserialize, Serialize};

/// A row of the `memories` table. Timestamps are epoch milliseconds.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct MemoryRecord {
	pub id: i64,
	pub title: String,
	pub content: String,
	#[sqlx(rename = "type")]
	pub r#type: String,
	pub project: String,
	pub created_at: i64,
	pub updated_at: Option<i64>,
}

#[derive(Debug)]
pub struct NewRecord<'a> {
	pub title: &'a str,
	pub content: &'a str,
	pub r#type: &'a str,
	pub project: &'a str,
	pub created_at: i64,
}

/// Column changes for an update; `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct RecordPatch<'a> {
	pub title: Option<&'a str>,
	pub content: Option<&'a str>,
	pub r#type: Option<&'a str>,
	pub project: Option<&'a str>,
}
impl RecordPatch<'_> {
	pub fn is_empty(&self) -> bool {
		self.title.is_none()
			&& self.content.is_none()
			&& self.r#type.is_none()
			&& self.project.is_none()
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagCount {
	pub tag: String,
	pub count: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredEmbedding {
	pub memory_id: i64,
	pub model: String,
	pub vector: Vec<f32>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EmbeddingRow {
	pub memory_id: i64,
	pub model: String,
	pub dim: i64,
	pub vector: Vec<u8>,
}
