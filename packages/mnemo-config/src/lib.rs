mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Providers, Search, Security, Service, Sqlite, Storage,
};

use std::{
	env, fs,
	path::{Path, PathBuf},
};

use directories::ProjectDirs;

pub const ENV_CONFIG: &str = "MNEMO_CONFIG";
pub const ENV_DB_PATH: &str = "MNEMO_DB_PATH";
pub const ENV_API_KEY: &str = "MNEMO_API_KEY";

const STORE_FILE_NAME: &str = "memory.db";
const CONFIG_FILE_NAME: &str = "config.toml";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	apply_overrides(&mut cfg, |key| env::var(key).ok());
	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

/// Loads the configuration from the first source that exists.
///
/// Order: the explicit path, `MNEMO_CONFIG`, `<user config dir>/mnemo/config.toml`. When none of
/// them is present the built-in defaults are used, with environment overrides still applied.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config> {
	if let Some(path) = explicit {
		return load(path);
	}
	if let Some(path) = env::var_os(ENV_CONFIG).filter(|value| !value.is_empty()) {
		return load(Path::new(&path));
	}
	if let Some(path) = default_config_path()
		&& path.is_file()
	{
		return load(&path);
	}

	let mut cfg = Config::default();

	apply_overrides(&mut cfg, |key| env::var(key).ok());
	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn default_config_path() -> Option<PathBuf> {
	project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Resolves the store file, preferring the configured path over the user data directory.
pub fn store_path(cfg: &Config) -> Result<PathBuf> {
	if let Some(path) = cfg.storage.sqlite.path.as_ref() {
		return Ok(path.clone());
	}

	project_dirs().map(|dirs| dirs.data_dir().join(STORE_FILE_NAME)).ok_or(Error::NoHomeDir)
}

/// Applies `MNEMO_DB_PATH` and `MNEMO_API_KEY` on top of the parsed file.
pub fn apply_overrides<F>(cfg: &mut Config, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(path) = lookup(ENV_DB_PATH).filter(|value| !value.trim().is_empty()) {
		cfg.storage.sqlite.path = Some(PathBuf::from(path));
	}
	if let Some(key) = lookup(ENV_API_KEY).filter(|value| !value.trim().is_empty()) {
		cfg.security.api_key = Some(key);
	}
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.mcp_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.mcp_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.sqlite.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.sqlite.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_limit == 0 {
		return Err(Error::Validation {
			message: "search.max_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_limit == 0 || cfg.search.default_limit > cfg.search.max_limit {
		return Err(Error::Validation {
			message: "search.default_limit must be between 1 and search.max_limit.".to_string(),
		});
	}
	if cfg.search.vector_fallback_threshold == 0 {
		return Err(Error::Validation {
			message: "search.vector_fallback_threshold must be greater than zero.".to_string(),
		});
	}
	if cfg.search.preview_chars == 0 {
		return Err(Error::Validation {
			message: "search.preview_chars must be greater than zero.".to_string(),
		});
	}

	if let Some(embedding) = cfg.providers.embedding.as_ref() {
		for (label, value) in [
			("providers.embedding.api_base", &embedding.api_base),
			("providers.embedding.path", &embedding.path),
			("providers.embedding.model", &embedding.model),
		] {
			if value.trim().is_empty() {
				return Err(Error::Validation { message: format!("{label} must be non-empty.") });
			}
		}

		if embedding.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
			});
		}
		if embedding.dimensions == Some(0) {
			return Err(Error::Validation {
				message: "providers.embedding.dimensions must be greater than zero.".to_string(),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.sqlite.path.as_deref().is_some_and(|path| path.as_os_str().is_empty()) {
		cfg.storage.sqlite.path = None;
	}
	if cfg.security.api_key.as_deref().is_some_and(|key| key.trim().is_empty()) {
		cfg.security.api_key = None;
	}
	if let Some(embedding) = cfg.providers.embedding.as_mut()
		&& embedding.api_key.as_deref().is_some_and(|key| key.trim().is_empty())
	{
		embedding.api_key = None;
	}
}

fn project_dirs() -> Option<ProjectDirs> {
	ProjectDirs::from("", "", "mnemo")
}
