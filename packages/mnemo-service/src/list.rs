use serde::{Deserialize, Serialize};

use mnemo_storage::{records, tags};

use crate::{MemoryItem, MnemoService, Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListRequest {
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub project: Option<String>,
	#[serde(default, rename = "type")]
	pub memory_type: Option<String>,
	#[serde(default)]
	pub tag: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListResponse {
	pub count: usize,
	pub items: Vec<MemoryItem>,
}

impl MnemoService {
	pub async fn list(&self, req: ListRequest) -> Result<ListResponse> {
		let filter = crate::build_filter(
			req.project.as_deref(),
			req.memory_type.as_deref(),
			req.tag.as_deref(),
		);
		let limit = self.resolve_limit(req.limit);
		let found = records::list_records(&self.db.pool, &filter, Some(limit)).await?;
		let ids: Vec<i64> = found.iter().map(|record| record.id).collect();
		let tag_sets = tags::tags_for(&self.db.pool, &ids).await?;
		let items = crate::view::preview_items(found, tag_sets, self.preview_chars());

		Ok(ListResponse { count: items.len(), items })
	}
}
