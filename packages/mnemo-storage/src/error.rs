#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Failed to prepare store directory {path:?}.")]
	Io { path: std::path::PathBuf, source: std::io::Error },
	#[error("Migration {version} ({name}) failed: {message}")]
	Migration { version: i64, name: &'static str, message: String },
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
}
