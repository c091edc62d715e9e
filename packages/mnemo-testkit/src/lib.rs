mod error;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use mnemo_config::Config;

const STORE_FILE_NAME: &str = "memory.db";

/// A throwaway store location. The directory and everything in it is removed on drop.
pub struct TestDatabase {
	dir: Option<TempDir>,
	path: PathBuf,
}
impl TestDatabase {
	pub fn new() -> Result<Self> {
		let dir = tempfile::Builder::new()
			.prefix("mnemo_test_")
			.tempdir()
			.map_err(|err| Error::Message(format!("Failed to create test directory: {err}.")))?;
		let path = dir.path().join(STORE_FILE_NAME);

		Ok(Self { dir: Some(dir), path })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Default configuration pointed at this store.
	pub fn config(&self) -> Config {
		let mut cfg = Config::default();

		cfg.storage.sqlite.path = Some(self.path.clone());

		cfg
	}

	pub fn cleanup(mut self) -> Result<()> {
		match self.dir.take() {
			Some(dir) => dir.close().map_err(Error::from),
			None => Ok(()),
		}
	}
}
