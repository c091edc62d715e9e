use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre};
use serde::Serialize;
use serde_json::Value;

use mnemo_config::Config;
use mnemo_service::MnemoService;
use mnemo_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = mnemo_cli::VERSION,
	rename_all = "kebab",
	styles = mnemo_cli::styles(),
)]
pub struct Args {
	/// Falls back to `MNEMO_CONFIG`, then the user config directory, then built-in defaults.
	#[arg(long, short = 'c', value_name = "FILE", global = true)]
	pub config: Option<PathBuf>,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Create the store file if needed and bring its schema up to date.
	Init,
	/// Print record, tag, and embedding counts.
	Stats,
	/// Recompute embeddings with the configured provider.
	Reembed {
		/// Only records without a vector, or with one from a different model.
		#[arg(long)]
		missing_only: bool,
	},
}

#[derive(Debug, Serialize)]
struct InitReport {
	store_path: String,
	schema_version: i64,
}

pub async fn run(args: Args) -> Result<()> {
	let config = mnemo_config::load_or_default(args.config.as_deref())?;

	mnemo_cli::init_tracing(&config.service.log_level);

	let output = execute(config, args.command).await?;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

/// Runs one maintenance command and returns its JSON report.
pub async fn execute(config: Config, command: Command) -> Result<Value> {
	match command {
		Command::Init => {
			let path = mnemo_config::store_path(&config)?;
			let db = Db::connect(&path, &config.storage.sqlite).await?;
			let schema_version = db.ensure_schema().await?;

			db.close().await;

			Ok(serde_json::to_value(InitReport {
				store_path: path.display().to_string(),
				schema_version,
			})?)
		},
		Command::Stats => {
			let service = MnemoService::open(config).await?;
			let stats = service.stats().await?;

			service.db.close().await;

			Ok(serde_json::to_value(stats)?)
		},
		Command::Reembed { missing_only } => {
			if config.providers.embedding.is_none() {
				return Err(eyre::eyre!(
					"reembed requires a [providers.embedding] section in the configuration."
				));
			}

			let service = MnemoService::open(config).await?;
			let report = service.reembed(missing_only).await?;

			service.db.close().await;

			if report.failed > 0 {
				tracing::warn!(failed = report.failed, "Some records could not be embedded.");
			}

			Ok(serde_json::to_value(report)?)
		},
	}
}
