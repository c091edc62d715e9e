use std::{
	fs,
	path::{Path, PathBuf},
	time::Duration,
};

use sqlx::{
	Sqlite, SqlitePool, Transaction,
	sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};

use crate::{Error, Result, migrate};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Db {
	pub pool: SqlitePool,
	path: PathBuf,
}
impl Db {
	/// Opens (creating when absent) the store file at `path`.
	///
	/// Writes use WAL with `synchronous = FULL`, so a committed transaction is on stable storage
	/// by the time the call returns.
	pub async fn connect(path: &Path, cfg: &mnemo_config::Sqlite) -> Result<Self> {
		if let Some(parent) = path.parent()
			&& !parent.as_os_str().is_empty()
		{
			fs::create_dir_all(parent)
				.map_err(|err| Error::Io { path: parent.to_path_buf(), source: err })?;
		}

		let options = SqliteConnectOptions::new()
			.filename(path)
			.create_if_missing(true)
			.journal_mode(SqliteJournalMode::Wal)
			.synchronous(SqliteSynchronous::Full)
			.foreign_keys(true)
			.busy_timeout(BUSY_TIMEOUT);
		let pool = SqlitePoolOptions::new()
			.max_connections(cfg.pool_max_conns)
			.connect_with(options)
			.await?;

		Ok(Self { pool, path: path.to_path_buf() })
	}

	/// Resolves the store location from configuration, connects, and migrates.
	pub async fn open(cfg: &mnemo_config::Config) -> Result<Self> {
		let path = mnemo_config::store_path(cfg)
			.map_err(|err| Error::InvalidArgument(err.to_string()))?;
		let db = Self::connect(&path, &cfg.storage.sqlite).await?;

		db.ensure_schema().await?;

		Ok(db)
	}

	/// Brings the schema up to the latest version. Safe to call on every startup.
	pub async fn ensure_schema(&self) -> Result<i64> {
		let version = migrate::run(&self.pool).await?;

		tracing::info!(
			path = %self.path.display(),
			schema_version = version,
			"Memory store ready."
		);

		Ok(version)
	}

	pub async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
		begin_write(&self.pool).await
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub async fn close(&self) {
		self.pool.close().await;
	}
}

/// Starts a transaction that takes the write lock on its first statement.
///
/// A deferred transaction that reads before it writes fails with `SQLITE_BUSY_SNAPSHOT` when
/// another connection commits in between, and the busy timeout does not cover that case. An
/// immediate one waits on the busy timeout instead.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
	Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}
