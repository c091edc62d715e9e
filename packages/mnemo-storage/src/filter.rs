use sqlx::{QueryBuilder, Sqlite};

/// Matches any text holding a character outside printable ASCII and common whitespace.
const NON_ASCII_GLOB: &str = "*[^\t\n\r -~]*";

/// Structural predicate over records. Every populated field must hold (AND).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFilter {
	pub project: Option<String>,
	pub r#type: Option<String>,
	/// Normalized tag; matched exactly against the tag index.
	pub tag: Option<String>,
	/// Lower-case ASCII needles that must occur in the title or the content.
	///
	/// `lower()` only folds ASCII, so records holding any other character pass this check and are
	/// left to the caller's own matching.
	pub contains: Vec<String>,
}
impl RecordFilter {
	pub fn project(mut self, project: impl Into<String>) -> Self {
		self.project = Some(project.into());

		self
	}

	pub fn with_type(mut self, memory_type: impl Into<String>) -> Self {
		self.r#type = Some(memory_type.into());

		self
	}

	pub fn tag(mut self, tag: impl Into<String>) -> Self {
		self.tag = Some(tag.into());

		self
	}

	pub fn containing<I, S>(mut self, needles: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.contains.extend(needles.into_iter().map(Into::into));

		self
	}

	/// Appends `FROM`/`JOIN`/`WHERE` clauses for the `memories m` alias.
	pub(crate) fn push_from_where(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
		builder.push(" FROM memories m");

		if let Some(tag) = self.tag.as_ref() {
			builder.push(" JOIN memory_tags t ON t.memory_id = m.id AND t.tag = ");
			builder.push_bind(tag.clone());
		}

		builder.push(" WHERE 1 = 1");

		if let Some(project) = self.project.as_ref() {
			builder.push(" AND m.project = ");
			builder.push_bind(project.clone());
		}
		if let Some(memory_type) = self.r#type.as_ref() {
			builder.push(" AND m.type = ");
			builder.push_bind(memory_type.clone());
		}

		for needle in &self.contains {
			builder.push(" AND (instr(lower(m.title), ");
			builder.push_bind(needle.clone());
			builder.push(") > 0 OR instr(lower(m.content), ");
			builder.push_bind(needle.clone());
			builder.push(") > 0 OR (m.title || m.content) GLOB ");
			builder.push_bind(NON_ASCII_GLOB);
			builder.push(")");
		}
	}
}
