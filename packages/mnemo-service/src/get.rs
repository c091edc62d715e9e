use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use mnemo_storage::{records, tags};

use crate::{Error, MemoryItem, MnemoService, Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GetRequest {
	#[serde(default)]
	pub ids: Vec<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetResponse {
	pub items: Vec<MemoryItem>,
}

impl MnemoService {
	/// Fetches full records in the order their ids were requested. Unknown ids are skipped.
	pub async fn get(&self, req: GetRequest) -> Result<GetResponse> {
		if req.ids.is_empty() {
			return Err(Error::invalid_field("ids", "ids must be non-empty."));
		}

		let found = records::get_records(&self.db.pool, &req.ids).await?;
		let ids: Vec<i64> = found.iter().map(|record| record.id).collect();
		let mut tag_sets = tags::tags_for(&self.db.pool, &ids).await?;
		let mut by_id: HashMap<i64, _> =
			found.into_iter().map(|record| (record.id, record)).collect();
		let items = req
			.ids
			.iter()
			.filter_map(|id| by_id.remove(id))
			.map(|record| {
				let record_tags = tag_sets.remove(&record.id).unwrap_or_default();

				MemoryItem::full(record, record_tags)
			})
			.collect();

		Ok(GetResponse { items })
	}
}
