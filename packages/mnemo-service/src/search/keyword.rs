use sqlx::SqlitePool;

use mnemo_storage::{filter::RecordFilter, models::MemoryRecord, records};

use crate::Result;

/// Splits on whitespace and lower-cases; empty tokens never appear.
pub fn tokenize(query: &str) -> Vec<String> {
	query.split_whitespace().map(str::to_lowercase).collect()
}

/// True when every token occurs, case-insensitively, in the title or in the content.
pub fn matches(record: &MemoryRecord, tokens: &[String]) -> bool {
	let title = record.title.to_lowercase();
	let content = record.content.to_lowercase();

	tokens.iter().all(|token| title.contains(token.as_str()) || content.contains(token.as_str()))
}

/// Structural filters and an ASCII pre-filter run in the store; exact token matching runs here so
/// case folding is Unicode aware. Results keep the store's newest-first order.
pub(crate) async fn search(
	pool: &SqlitePool,
	filter: &RecordFilter,
	tokens: &[String],
	limit: usize,
) -> Result<Vec<MemoryRecord>> {
	if tokens.is_empty() {
		return Ok(Vec::new());
	}

	let ascii = tokens.iter().filter(|token| token.is_ascii()).cloned();
	let filter = filter.clone().containing(ascii);
	let candidates = records::list_records(pool, &filter, None).await?;

	Ok(candidates.into_iter().filter(|record| matches(record, tokens)).take(limit).collect())
}

#[cfg(test)]
mod tests {
	use mnemo_storage::models::MemoryRecord;

	use crate::search::keyword::{matches, tokenize};

	fn record(title: &str, content: &str) -> MemoryRecord {
		MemoryRecord {
			id: 1,
			title: title.to_string(),
			content: content.to_string(),
			r#type: "memory".to_string(),
			project: "default".to_string(),
			created_at: 0,
			updated_at: None,
		}
	}

	#[test]
	fn tokenize_drops_blank_runs() {
		assert_eq!(tokenize("  OAuth2\t fix \n"), vec!["oauth2".to_string(), "fix".to_string()]);
		assert!(tokenize("   ").is_empty());
	}

	#[test]
	fn every_token_must_match_title_or_content() {
		let rec = record("Auth notes", "Switched to OAuth2 tokens");

		assert!(matches(&rec, &tokenize("auth oauth2")));
		assert!(matches(&rec, &tokenize("NOTES tokens")));
		assert!(!matches(&rec, &tokenize("auth kerberos")));
	}

	#[test]
	fn matching_is_unicode_case_insensitive() {
		let rec = record("Straße", "ÉCOLE");

		assert!(!matches(&rec, &tokenize("école STRASSE")));
		assert!(matches(&rec, &tokenize("école straße")));
	}
}
