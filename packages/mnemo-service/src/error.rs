pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String, field: Option<&'static str> },
	#[error("No updates: {message}")]
	NoUpdates { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub(crate) fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into(), field: Some(field) }
	}

	/// Stable machine-readable code surfaced by the tool and HTTP layers.
	pub fn code(&self) -> &'static str {
		match self {
			Self::InvalidRequest { .. } => "INVALID_REQUEST",
			Self::NoUpdates { .. } => "NO_UPDATES",
			Self::NotFound { .. } => "NOT_FOUND",
			Self::Provider { .. } => "PROVIDER_UNAVAILABLE",
			Self::Storage { .. } => "STORAGE_ERROR",
		}
	}

	/// The request field that failed validation, when a single one is to blame.
	pub fn field(&self) -> Option<&'static str> {
		match self {
			Self::InvalidRequest { field, .. } => *field,
			_ => None,
		}
	}

	pub fn message(&self) -> &str {
		match self {
			Self::InvalidRequest { message, .. }
			| Self::NoUpdates { message }
			| Self::NotFound { message }
			| Self::Provider { message }
			| Self::Storage { message } => message,
		}
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<mnemo_storage::Error> for Error {
	fn from(err: mnemo_storage::Error) -> Self {
		match err {
			mnemo_storage::Error::InvalidArgument(message) =>
				Self::InvalidRequest { message, field: None },
			mnemo_storage::Error::NotFound(message) => Self::NotFound { message },
			other => Self::Storage { message: other.to_string() },
		}
	}
}

impl From<mnemo_providers::Error> for Error {
	fn from(err: mnemo_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
