use serde::{Deserialize, Serialize};

use mnemo_storage::{models::RecordPatch, records, tags};

use crate::{Error, MnemoService, Result, Timestamp};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
	#[serde(default)]
	pub id: Option<i64>,
	#[serde(default)]
	pub text: Option<String>,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default, rename = "type")]
	pub memory_type: Option<String>,
	#[serde(default)]
	pub project: Option<String>,
	#[serde(default)]
	pub tags: Option<Vec<String>>,
}
impl UpdateRequest {
	fn has_changes(&self) -> bool {
		self.text.is_some()
			|| self.title.is_some()
			|| self.memory_type.is_some()
			|| self.project.is_some()
			|| self.tags.is_some()
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
	pub id: i64,
	/// Names of the fields that were written.
	pub updated: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<Timestamp>,
}

impl MnemoService {
	pub async fn update(&self, req: UpdateRequest) -> Result<UpdateResponse> {
		let id = req.id.ok_or_else(|| Error::invalid_field("id", "id is required."))?;

		if !req.has_changes() {
			return Err(Error::NoUpdates { message: "No updates provided.".to_string() });
		}
		if req.text.as_deref().is_some_and(|text| text.trim().is_empty()) {
			return Err(Error::invalid_field("text", "text must be non-empty."));
		}

		for (label, value) in [("type", &req.memory_type), ("project", &req.project)] {
			if value.as_deref().is_some_and(|value| value.trim().is_empty()) {
				return Err(Error::invalid_field(label, format!("{label} must be non-empty.")));
			}
		}

		let mut tx = self.db.begin_write().await?;
		let existing = records::get_record(&mut *tx, id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Memory {id} not found.") })?;
		let content = req.text.as_deref().unwrap_or(existing.content.as_str());
		// A blank title means "derive it again from the content".
		let title = req.title.as_deref().map(|title| match crate::non_blank(Some(title)) {
			Some(title) => title.to_string(),
			None => crate::derive_title(content),
		});
		let patch = RecordPatch {
			title: title.as_deref(),
			content: req.text.as_deref(),
			r#type: req.memory_type.as_deref().map(str::trim),
			project: req.project.as_deref().map(str::trim),
		};
		let mut updated = Vec::new();
		let mut updated_at = None;

		if !patch.is_empty() {
			let now = crate::now_ms();

			records::update_record(&mut *tx, id, &patch, now).await?;

			updated_at = Some(Timestamp::from_millis(now));

			for (field, present) in [
				("text", patch.content.is_some()),
				("title", patch.title.is_some()),
				("type", patch.r#type.is_some()),
				("project", patch.project.is_some()),
			] {
				if present {
					updated.push(field.to_string());
				}
			}
		}
		if let Some(new_tags) = req.tags.as_ref() {
			tags::set_tags(&mut tx, id, new_tags).await?;

			updated.push("tags".to_string());
		}

		tx.commit().await?;

		if patch.content.is_some() || patch.title.is_some() {
			let title = title.as_deref().unwrap_or(existing.title.as_str());

			self.indexer.schedule(id, crate::embedding_text(title, content));
		}

		tracing::debug!(id, fields = ?updated, "Updated memory.");

		Ok(UpdateResponse { id, updated, updated_at })
	}
}
