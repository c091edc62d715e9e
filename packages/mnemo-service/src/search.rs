//! Hybrid search: structural filters, keyword matching, and vector similarity.
//!
//! Without a query the request is a filtered listing. With one, keyword matching runs for the
//! `keyword`, `fts`, and `auto` modes. Vector similarity runs for `vector`, and for `auto` when
//! keyword matching came back with fewer hits than `search.vector_fallback_threshold`; in both
//! cases only when an embedding provider is configured. Vector candidates are pre-filtered by
//! project only.

pub mod keyword;
pub mod merge;
pub mod vector;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use mnemo_storage::{embeddings, models::MemoryRecord, records, tags};

use crate::{MemoryItem, MnemoService, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
	Auto,
	Keyword,
	Vector,
}
impl SearchMode {
	/// Parses a caller-supplied mode. `fts` is an alias of `keyword`; anything unrecognized
	/// falls back to `auto`.
	pub fn parse(raw: Option<&str>) -> Self {
		let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
			return Self::Auto;
		};

		match raw.to_ascii_lowercase().as_str() {
			"auto" => Self::Auto,
			"keyword" | "fts" => Self::Keyword,
			"vector" => Self::Vector,
			other => {
				tracing::warn!(mode = other, "Unknown search mode; using auto.");

				Self::Auto
			},
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchLabel {
	List,
	Keyword,
	Vector,
	#[serde(rename = "Keyword+Vector")]
	KeywordVector,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchRequest {
	#[serde(default)]
	pub query: Option<String>,
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub project: Option<String>,
	#[serde(default, rename = "type")]
	pub memory_type: Option<String>,
	#[serde(default)]
	pub tag: Option<String>,
	#[serde(default)]
	pub mode: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResponse {
	pub label: SearchLabel,
	pub count: usize,
	pub items: Vec<MemoryItem>,
}

impl MnemoService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let limit = self.resolve_limit(req.limit) as usize;
		let filter = crate::build_filter(
			req.project.as_deref(),
			req.memory_type.as_deref(),
			req.tag.as_deref(),
		);
		let Some(query) = crate::non_blank(req.query.as_deref()) else {
			let found = records::list_records(&self.db.pool, &filter, Some(limit as u32)).await?;

			return self.respond(SearchLabel::List, found).await;
		};
		let mode = SearchMode::parse(req.mode.as_deref());
		let tokens = keyword::tokenize(query);
		let keyword_hits = match mode {
			SearchMode::Vector => Vec::new(),
			SearchMode::Auto | SearchMode::Keyword =>
				keyword::search(&self.db.pool, &filter, &tokens, limit).await?,
		};
		let threshold = self.cfg.search.vector_fallback_threshold as usize;
		let wants_vector = match mode {
			SearchMode::Vector => true,
			SearchMode::Auto => keyword_hits.len() < threshold,
			SearchMode::Keyword => false,
		};
		let run_vector = wants_vector && self.embedder.is_configured();

		tracing::debug!(
			?mode,
			keyword_hits = keyword_hits.len(),
			run_vector,
			"Search plan resolved."
		);

		let vector_hits = if run_vector {
			self.vector_search(query, filter.project.as_deref(), limit).await?
		} else {
			Vec::new()
		};
		let (label, merged) = merge::merge(keyword_hits, vector_hits, limit);

		self.respond(label, merged).await
	}

	/// Nearest records by cosine similarity, most similar first.
	///
	/// An unavailable query embedding yields no results rather than an error.
	async fn vector_search(
		&self,
		query: &str,
		project: Option<&str>,
		limit: usize,
	) -> Result<Vec<MemoryRecord>> {
		let Some(query_vector) = self.embedder.embed(query).await else {
			return Ok(Vec::new());
		};
		let candidates = embeddings::list_embeddings(&self.db.pool, project).await?;
		let ranked = vector::rank(&query_vector, &candidates, limit);
		let ids: Vec<i64> = ranked.iter().map(|(id, _)| *id).collect();
		let mut by_id: HashMap<i64, MemoryRecord> = records::get_records(&self.db.pool, &ids)
			.await?
			.into_iter()
			.map(|record| (record.id, record))
			.collect();

		Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
	}

	async fn respond(
		&self,
		label: SearchLabel,
		found: Vec<MemoryRecord>,
	) -> Result<SearchResponse> {
		let ids: Vec<i64> = found.iter().map(|record| record.id).collect();
		let tag_sets = tags::tags_for(&self.db.pool, &ids).await?;
		let items = crate::view::preview_items(found, tag_sets, self.preview_chars());

		Ok(SearchResponse { label, count: items.len(), items })
	}
}
