//! Background embedding refresh.
//!
//! Jobs are drained in submission order by one task, so a newer text for the same record always
//! lands after an older one. Each job gets exactly one attempt and failures are only logged.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::{mpsc, oneshot};

use mnemo_storage::embeddings;

use crate::embedder::Embedder;

enum Job {
	Embed { memory_id: i64, text: String },
	Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct Indexer {
	tx: mpsc::UnboundedSender<Job>,
	enabled: bool,
}
impl Indexer {
	pub fn spawn(pool: SqlitePool, embedder: Arc<Embedder>) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		let enabled = embedder.is_configured();

		tokio::spawn(run(pool, embedder, rx));

		Self { tx, enabled }
	}

	/// Queues an embedding refresh without waiting for it.
	pub fn schedule(&self, memory_id: i64, text: String) {
		if !self.enabled {
			return;
		}
		if self.tx.send(Job::Embed { memory_id, text }).is_err() {
			tracing::warn!(memory_id, "Embedding indexer is stopped; dropping job.");
		} else {
			tracing::debug!(memory_id, "Scheduled embedding refresh.");
		}
	}

	pub async fn flush(&self) {
		let (done_tx, done_rx) = oneshot::channel();

		if self.tx.send(Job::Flush(done_tx)).is_ok() {
			let _ = done_rx.await;
		}
	}
}

async fn run(pool: SqlitePool, embedder: Arc<Embedder>, mut rx: mpsc::UnboundedReceiver<Job>) {
	while let Some(job) = rx.recv().await {
		match job {
			Job::Embed { memory_id, text } => process(&pool, &embedder, memory_id, &text).await,
			Job::Flush(done) => {
				let _ = done.send(());
			},
		}
	}
}

async fn process(pool: &SqlitePool, embedder: &Embedder, memory_id: i64, text: &str) {
	let Some(vector) = embedder.embed(text).await else { return };
	let model = embedder.model().unwrap_or_default();

	match embeddings::put_embedding(pool, memory_id, model, &vector, crate::now_ms()).await {
		Ok(true) => tracing::debug!(memory_id, dim = vector.len(), "Stored embedding."),
		Ok(false) => tracing::debug!(memory_id, "Record deleted before its embedding finished."),
		Err(err) => {
			tracing::warn!(memory_id, error = %err, "Failed to persist embedding.");
		},
	}
}
