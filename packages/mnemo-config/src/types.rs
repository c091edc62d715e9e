use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Service {
	pub http_bind: String,
	pub mcp_bind: String,
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self {
			http_bind: "127.0.0.1:8787".to_string(),
			mcp_bind: "127.0.0.1:8788".to_string(),
			log_level: "info".to_string(),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Storage {
	pub sqlite: Sqlite,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sqlite {
	/// Optional. Falls back to `<user data dir>/mnemo/memory.db`.
	pub path: Option<PathBuf>,
	pub pool_max_conns: u32,
}
impl Default for Sqlite {
	fn default() -> Self {
		Self { path: None, pool_max_conns: 4 }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Providers {
	/// Optional. Without it the store runs keyword-only.
	pub embedding: Option<EmbeddingProviderConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	#[serde(default = "default_provider_id")]
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: Option<String>,
	#[serde(default = "default_embedding_path")]
	pub path: String,
	pub model: String,
	#[serde(default)]
	pub dimensions: Option<u32>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	/// Auto mode consults vector similarity when keyword matching yields fewer hits than this.
	pub vector_fallback_threshold: u32,
	pub preview_chars: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { default_limit: 20, max_limit: 100, vector_fallback_threshold: 3, preview_chars: 200 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
	/// Static key expected in the `X-API-Key` header of the HTTP variant.
	pub api_key: Option<String>,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true, api_key: None }
	}
}

fn default_provider_id() -> String {
	"openai".to_string()
}

fn default_embedding_path() -> String {
	"/v1/embeddings".to_string()
}

fn default_timeout_ms() -> u64 {
	10_000
}
