use std::{fs, path::PathBuf};

use tempfile::TempDir;

use mnemo_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = r#"
[service]
http_bind = "127.0.0.1:9100"
mcp_bind = "127.0.0.1:9101"
log_level = "debug"

[storage.sqlite]
path = "/tmp/mnemo-sample/memory.db"
pool_max_conns = 2

[providers.embedding]
api_base = "http://127.0.0.1:11434"
api_key = "  "
model = "nomic-embed-text"
dimensions = 768

[search]
default_limit = 10
max_limit = 50

[security]
api_key = "secret"
"#;

fn write_temp_config(dir: &TempDir, payload: &str) -> PathBuf {
	let path = dir.path().join("config.toml");

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads_with_provider_defaults() {
	let dir = TempDir::new().expect("Failed to create temp dir.");
	let path = write_temp_config(&dir, SAMPLE_CONFIG_TOML);
	let cfg = mnemo_config::load(&path).expect("Failed to load sample config.");
	let embedding = cfg.providers.embedding.expect("Expected embedding provider.");

	assert_eq!(cfg.service.log_level, "debug");
	assert_eq!(cfg.search.default_limit, 10);
	assert_eq!(cfg.search.vector_fallback_threshold, 3);
	assert_eq!(embedding.path, "/v1/embeddings");
	assert_eq!(embedding.timeout_ms, 10_000);
	assert_eq!(embedding.api_key, None, "Blank api_key must normalize to None.");
}

#[test]
fn empty_file_yields_defaults() {
	let cfg: Config = toml::from_str("").expect("Failed to parse empty config.");

	assert!(mnemo_config::validate(&cfg).is_ok());
	assert!(cfg.providers.embedding.is_none());
	assert_eq!(cfg.search.default_limit, 20);
	assert_eq!(cfg.search.max_limit, 100);
	assert!(cfg.security.bind_localhost_only);
}

#[test]
fn missing_file_reports_path() {
	let dir = TempDir::new().expect("Failed to create temp dir.");
	let path = dir.path().join("absent.toml");
	let err = mnemo_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn default_limit_must_not_exceed_max_limit() {
	let mut cfg = base_config();

	cfg.search.default_limit = 80;

	let err = mnemo_config::validate(&cfg).expect_err("Expected default_limit validation error.");

	assert!(
		err.to_string().contains("search.default_limit must be between 1 and search.max_limit."),
		"Unexpected error: {err}"
	);
}

#[test]
fn embedding_model_must_be_non_empty() {
	let mut cfg = base_config();

	if let Some(embedding) = cfg.providers.embedding.as_mut() {
		embedding.model = " ".to_string();
	}

	let err = mnemo_config::validate(&cfg).expect_err("Expected model validation error.");

	assert!(
		err.to_string().contains("providers.embedding.model must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn pool_size_must_be_positive() {
	let mut cfg = base_config();

	cfg.storage.sqlite.pool_max_conns = 0;

	let err = mnemo_config::validate(&cfg).expect_err("Expected pool size validation error.");

	assert!(
		err.to_string().contains("storage.sqlite.pool_max_conns must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn environment_overrides_replace_store_path_and_api_key() {
	let mut cfg = base_config();

	mnemo_config::apply_overrides(&mut cfg, |key| match key {
		mnemo_config::ENV_DB_PATH => Some("/var/lib/mnemo/override.db".to_string()),
		mnemo_config::ENV_API_KEY => Some("from-env".to_string()),
		_ => None,
	});

	assert_eq!(
		mnemo_config::store_path(&cfg).expect("Failed to resolve store path."),
		PathBuf::from("/var/lib/mnemo/override.db")
	);
	assert_eq!(cfg.security.api_key.as_deref(), Some("from-env"));
}

#[test]
fn blank_environment_overrides_are_ignored() {
	let mut cfg = base_config();

	mnemo_config::apply_overrides(&mut cfg, |_| Some("   ".to_string()));

	assert_eq!(cfg.storage.sqlite.path, Some(PathBuf::from("/tmp/mnemo-sample/memory.db")));
	assert_eq!(cfg.security.api_key.as_deref(), Some("secret"));
}
