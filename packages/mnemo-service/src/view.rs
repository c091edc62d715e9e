use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use mnemo_storage::models::MemoryRecord;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
	pub epoch_ms: i64,
	pub iso: String,
}
impl Timestamp {
	pub fn from_millis(epoch_ms: i64) -> Self {
		let iso = OffsetDateTime::from_unix_timestamp_nanos(i128::from(epoch_ms) * 1_000_000)
			.ok()
			.and_then(|ts| ts.format(&Rfc3339).ok())
			.unwrap_or_default();

		Self { epoch_ms, iso }
	}
}

/// A record as returned to callers.
///
/// `content` carries the full text (get); `preview` carries a flattened excerpt (search, list).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryItem {
	pub id: i64,
	#[serde(rename = "type")]
	pub memory_type: String,
	pub project: String,
	pub created_at: Timestamp,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<Timestamp>,
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub preview: Option<String>,
	pub tags: Vec<String>,
}
impl MemoryItem {
	pub fn full(record: MemoryRecord, tags: Vec<String>) -> Self {
		let mut item = Self::base(&record, tags);

		item.content = Some(record.content);

		item
	}

	pub fn preview(record: MemoryRecord, tags: Vec<String>, max_chars: usize) -> Self {
		let mut item = Self::base(&record, tags);

		item.preview = Some(preview(&record.content, max_chars));

		item
	}

	fn base(record: &MemoryRecord, tags: Vec<String>) -> Self {
		Self {
			id: record.id,
			memory_type: record.r#type.clone(),
			project: record.project.clone(),
			created_at: Timestamp::from_millis(record.created_at),
			updated_at: record.updated_at.map(Timestamp::from_millis),
			title: record.title.clone(),
			content: None,
			preview: None,
			tags,
		}
	}
}

/// Collapses whitespace runs (newlines included) to single spaces and truncates to
/// `max_chars`, marking a cut with `…`.
pub fn preview(content: &str, max_chars: usize) -> String {
	let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");

	if flat.chars().count() <= max_chars {
		return flat;
	}

	let mut cut: String = flat.chars().take(max_chars).collect();

	cut.truncate(cut.trim_end().len());
	cut.push('…');

	cut
}

pub(crate) fn preview_items(
	records: Vec<MemoryRecord>,
	mut tags: HashMap<i64, Vec<String>>,
	max_chars: usize,
) -> Vec<MemoryItem> {
	records
		.into_iter()
		.map(|record| {
			let record_tags = tags.remove(&record.id).unwrap_or_default();

			MemoryItem::preview(record, record_tags, max_chars)
		})
		.collect()
}
