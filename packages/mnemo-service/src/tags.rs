use serde::{Deserialize, Serialize};

use mnemo_storage::{models::TagCount, tags};

use crate::{MnemoService, Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TagsRequest {
	#[serde(default)]
	pub project: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TagsResponse {
	pub tags: Vec<TagCount>,
}

impl MnemoService {
	pub async fn tags(&self, req: TagsRequest) -> Result<TagsResponse> {
		let project = crate::non_blank(req.project.as_deref());
		let tags = tags::tag_counts(&self.db.pool, project).await?;

		Ok(TagsResponse { tags })
	}
}
