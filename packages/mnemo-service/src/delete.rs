use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use mnemo_storage::records;

use crate::{Error, MnemoService, Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeleteRequest {
	#[serde(default)]
	pub ids: Vec<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
	pub deleted: u64,
}

impl MnemoService {
	/// Removes records with their tags and embeddings in one transaction.
	///
	/// Unknown ids are ignored; a request that matches nothing at all is `NotFound`.
	pub async fn delete(&self, req: DeleteRequest) -> Result<DeleteResponse> {
		let ids: Vec<i64> = req.ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

		if ids.is_empty() {
			return Err(Error::invalid_field("ids", "ids must be non-empty."));
		}

		let mut tx = self.db.begin_write().await?;
		let deleted = records::delete_records(&mut tx, &ids).await?;

		tx.commit().await?;

		if deleted == 0 {
			return Err(Error::NotFound { message: "No matching memories found.".to_string() });
		}

		tracing::debug!(requested = ids.len(), deleted, "Deleted memories.");

		Ok(DeleteResponse { deleted })
	}
}
