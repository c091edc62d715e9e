use serde::{Deserialize, Serialize};

use mnemo_storage::{models::NewRecord, records, tags};

use crate::{DEFAULT_PROJECT, DEFAULT_TYPE, Error, MnemoService, Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SaveRequest {
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub project: Option<String>,
	#[serde(default, rename = "type")]
	pub memory_type: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveResponse {
	pub id: i64,
	pub title: String,
	pub project: String,
	#[serde(rename = "type")]
	pub memory_type: String,
	pub tags: Vec<String>,
}

impl MnemoService {
	pub async fn save(&self, req: SaveRequest) -> Result<SaveResponse> {
		if req.text.trim().is_empty() {
			return Err(Error::invalid_field("text", "text is required."));
		}

		let content = req.text.as_str();
		let title = crate::non_blank(req.title.as_deref())
			.map(str::to_string)
			.unwrap_or_else(|| crate::derive_title(content));
		let project = crate::non_blank(req.project.as_deref()).unwrap_or(DEFAULT_PROJECT);
		let memory_type = crate::non_blank(req.memory_type.as_deref()).unwrap_or(DEFAULT_TYPE);
		let record = NewRecord {
			title: &title,
			content,
			r#type: memory_type,
			project,
			created_at: crate::now_ms(),
		};
		let mut tx = self.db.begin_write().await?;
		let id = records::insert_record(&mut *tx, &record).await?;
		let stored_tags = tags::set_tags(&mut tx, id, &req.tags).await?;

		tx.commit().await?;

		tracing::debug!(id, project, tags = stored_tags.len(), "Saved memory.");

		self.indexer.schedule(id, crate::embedding_text(&title, content));

		Ok(SaveResponse {
			id,
			title,
			project: project.to_string(),
			memory_type: memory_type.to_string(),
			tags: stored_tags,
		})
	}
}
