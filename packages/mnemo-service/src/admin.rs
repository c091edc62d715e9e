use serde::{Deserialize, Serialize};

use mnemo_storage::{embeddings, filter::RecordFilter, records, stats};

use crate::{Error, MnemoService, Result};

const REEMBED_BATCH: usize = 16;

#[derive(Clone, Debug, Serialize)]
pub struct StatsResponse {
	pub store_path: String,
	pub embedding_model: Option<String>,
	#[serde(flatten)]
	pub store: stats::StoreStats,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReembedReport {
	pub total: usize,
	pub embedded: usize,
	/// Records deleted while the run was in flight.
	pub skipped: usize,
	pub failed: usize,
}

impl MnemoService {
	pub async fn stats(&self) -> Result<StatsResponse> {
		let mut conn = self.db.pool.acquire().await?;
		let store = stats::collect(&mut conn).await?;

		Ok(StatsResponse {
			store_path: self.db.path().display().to_string(),
			embedding_model: self.embedder.model().map(str::to_string),
			store,
		})
	}

	/// Recomputes embeddings synchronously with the configured provider.
	///
	/// With `missing_only`, only records lacking a vector or carrying one from a different model
	/// are processed. This is the repair path after changing the provider or its dimensionality.
	pub async fn reembed(&self, missing_only: bool) -> Result<ReembedReport> {
		let Some(model) = self.embedder.model().map(str::to_string) else {
			return Err(Error::Provider {
				message: "No embedding provider is configured.".to_string(),
			});
		};
		let ids = if missing_only {
			records::ids_needing_embedding(&self.db.pool, Some(model.as_str())).await?
		} else {
			let mut all = records::list_records(&self.db.pool, &RecordFilter::default(), None)
				.await?
				.into_iter()
				.map(|record| record.id)
				.collect::<Vec<_>>();

			all.sort_unstable();

			all
		};
		let mut report = ReembedReport { total: ids.len(), ..Default::default() };

		for chunk in ids.chunks(REEMBED_BATCH) {
			let batch = records::get_records(&self.db.pool, chunk).await?;

			report.skipped += chunk.len() - batch.len();

			if batch.is_empty() {
				continue;
			}

			let texts: Vec<String> = batch
				.iter()
				.map(|record| crate::embedding_text(&record.title, &record.content))
				.collect();
			let vectors = match self.embedder.try_embed(&texts).await {
				Ok(vectors) => vectors,
				Err(err) => {
					tracing::warn!(error = %err, batch = batch.len(), "Re-embedding batch failed.");

					report.failed += batch.len();

					continue;
				},
			};

			for (record, vector) in batch.iter().zip(vectors) {
				let written = embeddings::put_embedding(
					&self.db.pool,
					record.id,
					&model,
					&vector,
					crate::now_ms(),
				)
				.await?;

				if written {
					report.embedded += 1;
				} else {
					report.skipped += 1;
				}
			}
		}

		tracing::info!(
			total = report.total,
			embedded = report.embedded,
			skipped = report.skipped,
			failed = report.failed,
			"Re-embedding finished."
		);

		Ok(report)
	}
}
