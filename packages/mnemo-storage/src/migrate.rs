//! Ordered, additive schema migrations.
//!
//! Every step is idempotent on its own: tables and indexes use create-if-absent semantics and
//! column additions probe the live schema first. A store written by an older build, with or
//! without the version table, is therefore brought forward without touching existing rows.

use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use time::OffsetDateTime;

use crate::{Error, Result, db};

pub struct Migration {
	pub version: i64,
	pub name: &'static str,
	pub steps: &'static [Step],
}

pub enum Step {
	Sql(&'static str),
	AddColumn { table: &'static str, column: &'static str, definition: &'static str },
}

pub const MIGRATIONS: &[Migration] = &[
	Migration {
		version: 1,
		name: "create_memories",
		steps: &[
			Step::Sql(
				"\
CREATE TABLE IF NOT EXISTS memories (
\tid INTEGER PRIMARY KEY AUTOINCREMENT,
\ttitle TEXT NOT NULL,
\tcontent TEXT NOT NULL,
\ttype TEXT NOT NULL DEFAULT 'memory',
\tproject TEXT NOT NULL DEFAULT 'default',
\tcreated_at INTEGER NOT NULL
)",
			),
			Step::Sql(
				"CREATE INDEX IF NOT EXISTS idx_memories_project_created ON memories (project, created_at DESC)",
			),
			Step::Sql("CREATE INDEX IF NOT EXISTS idx_memories_type ON memories (type)"),
		],
	},
	Migration {
		version: 2,
		name: "create_memory_tags",
		steps: &[
			Step::Sql(
				"\
CREATE TABLE IF NOT EXISTS memory_tags (
\tmemory_id INTEGER NOT NULL REFERENCES memories (id) ON DELETE CASCADE,
\ttag TEXT NOT NULL,
\tPRIMARY KEY (memory_id, tag)
)",
			),
			Step::Sql("CREATE INDEX IF NOT EXISTS idx_memory_tags_tag ON memory_tags (tag)"),
		],
	},
	Migration {
		version: 3,
		name: "add_memories_updated_at",
		steps: &[Step::AddColumn {
			table: "memories",
			column: "updated_at",
			definition: "INTEGER NULL",
		}],
	},
	Migration {
		version: 4,
		name: "create_memory_embeddings",
		steps: &[Step::Sql(
			"\
CREATE TABLE IF NOT EXISTS memory_embeddings (
\tmemory_id INTEGER PRIMARY KEY REFERENCES memories (id) ON DELETE CASCADE,
\tmodel TEXT NOT NULL,
\tdim INTEGER NOT NULL,
\tvector BLOB NOT NULL,
\tupdated_at INTEGER NOT NULL
)",
		)],
	},
];

pub fn latest_version() -> i64 {
	MIGRATIONS.last().map(|migration| migration.version).unwrap_or(0)
}

/// Applies every pending migration and returns the resulting schema version.
pub async fn run(pool: &SqlitePool) -> Result<i64> {
	run_to(pool, latest_version()).await
}

/// Applies pending migrations up to and including `target`.
///
/// Each migration runs in its own immediate transaction that re-reads the recorded version, so
/// two processes starting on the same store apply every migration exactly once.
pub async fn run_to(pool: &SqlitePool, target: i64) -> Result<i64> {
	ensure_version_table(pool).await?;

	for migration in MIGRATIONS.iter().filter(|migration| migration.version <= target) {
		let mut tx = db::begin_write(pool).await?;

		if current_version(&mut *tx).await? >= migration.version {
			tx.rollback().await?;

			continue;
		}

		for step in migration.steps {
			apply_step(&mut *tx, step).await.map_err(|err| Error::Migration {
				version: migration.version,
				name: migration.name,
				message: err.to_string(),
			})?;
		}

		sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)")
			.bind(migration.version)
			.bind(migration.name)
			.bind(now_ms())
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		tracing::info!(version = migration.version, name = migration.name, "Applied migration.");
	}

	current_version(pool).await
}

pub async fn current_version<'e, E>(executor: E) -> Result<i64>
where
	E: SqliteExecutor<'e>,
{
	let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
		.fetch_one(executor)
		.await?;

	Ok(version.unwrap_or(0))
}

pub async fn column_exists(
	executor: &mut SqliteConnection,
	table: &str,
	column: &str,
) -> Result<bool> {
	let count: i64 = sqlx::query_scalar(&format!(
		"SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE name = ?"
	))
	.bind(column)
	.fetch_one(&mut *executor)
	.await?;

	Ok(count > 0)
}

async fn ensure_version_table(pool: &SqlitePool) -> Result<()> {
	sqlx::query(
		"\
CREATE TABLE IF NOT EXISTS schema_migrations (
\tversion INTEGER PRIMARY KEY,
\tname TEXT NOT NULL,
\tapplied_at INTEGER NOT NULL
)",
	)
	.execute(pool)
	.await?;

	Ok(())
}

async fn apply_step(executor: &mut SqliteConnection, step: &Step) -> Result<()> {
	match step {
		Step::Sql(sql) => {
			sqlx::query(sql).execute(&mut *executor).await?;
		},
		Step::AddColumn { table, column, definition } => {
			if column_exists(executor, table, column).await? {
				tracing::debug!(table, column, "Column already present; skipping.");

				return Ok(());
			}

			sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
				.execute(&mut *executor)
				.await?;
		},
	}

	Ok(())
}

fn now_ms() -> i64 {
	(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
