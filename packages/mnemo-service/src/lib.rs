pub mod admin;
pub mod delete;
pub mod embedder;
pub mod get;
pub mod indexer;
pub mod list;
pub mod save;
pub mod search;
pub mod tags;
pub mod update;
pub mod view;

mod error;

pub use admin::{ReembedReport, StatsResponse};
pub use delete::{DeleteRequest, DeleteResponse};
pub use error::{Error, Result};
pub use get::{GetRequest, GetResponse};
pub use list::{ListRequest, ListResponse};
pub use save::{SaveRequest, SaveResponse};
pub use search::{SearchLabel, SearchMode, SearchRequest, SearchResponse};
pub use tags::{TagsRequest, TagsResponse};
pub use update::{UpdateRequest, UpdateResponse};
pub use view::{MemoryItem, Timestamp};

use std::{future::Future, pin::Pin, sync::Arc};

use time::OffsetDateTime;

use mnemo_config::{Config, EmbeddingProviderConfig};
use mnemo_providers::embedding;
use mnemo_storage::{db::Db, filter::RecordFilter, tags as tag_index};

use crate::{embedder::Embedder, indexer::Indexer};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const DEFAULT_TYPE: &str = "memory";
pub const DEFAULT_PROJECT: &str = "default";
pub const TITLE_MAX_CHARS: usize = 80;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, mnemo_providers::Result<Vec<Vec<f32>>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}
impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

/// The memory store: record, tag, and embedding operations behind one handle.
///
/// Construction spawns the background embedding indexer, so it must happen inside a Tokio
/// runtime.
pub struct MnemoService {
	pub cfg: Config,
	pub db: Db,
	embedder: Arc<Embedder>,
	indexer: Indexer,
}
impl MnemoService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_providers(cfg, db, Providers::default())
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		let embedder =
			Arc::new(Embedder::new(cfg.providers.embedding.clone(), providers.embedding.clone()));
		let indexer = Indexer::spawn(db.pool.clone(), embedder.clone());

		Self { cfg, db, embedder, indexer }
	}

	/// Opens and migrates the configured store, then builds the service around it.
	pub async fn open(cfg: Config) -> Result<Self> {
		let db = Db::open(&cfg).await?;

		Ok(Self::new(cfg, db))
	}

	/// Waits until every embedding scheduled so far has been attempted.
	pub async fn flush_embeddings(&self) {
		self.indexer.flush().await;
	}

	pub(crate) fn resolve_limit(&self, requested: Option<u32>) -> u32 {
		match requested {
			None | Some(0) => self.cfg.search.default_limit,
			Some(limit) => limit.min(self.cfg.search.max_limit),
		}
	}

	pub(crate) fn preview_chars(&self) -> usize {
		self.cfg.search.preview_chars as usize
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, mnemo_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

pub(crate) fn now_ms() -> i64 {
	(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Trims an optional field, treating blank input as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}

pub(crate) fn derive_title(content: &str) -> String {
	content.chars().take(TITLE_MAX_CHARS).collect()
}

/// Text handed to the embedding provider for a record.
pub(crate) fn embedding_text(title: &str, content: &str) -> String {
	if content.starts_with(title) { content.to_string() } else { format!("{title}\n\n{content}") }
}

pub(crate) fn build_filter(
	project: Option<&str>,
	memory_type: Option<&str>,
	tag: Option<&str>,
) -> RecordFilter {
	RecordFilter {
		project: non_blank(project).map(str::to_string),
		r#type: non_blank(memory_type).map(str::to_string),
		tag: tag.and_then(tag_index::normalize_tag),
		..Default::default()
	}
}
