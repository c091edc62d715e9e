pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::{Result, eyre};
use tokio::net::TcpListener;

use crate::state::AppState;
use mnemo_config::Security;

#[derive(Debug, Parser)]
#[command(
	version = mnemo_cli::VERSION,
	rename_all = "kebab",
	styles = mnemo_cli::styles(),
)]
pub struct Args {
	/// Falls back to `MNEMO_CONFIG`, then the user config directory, then built-in defaults.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: Option<PathBuf>,
}

pub async fn run(args: Args) -> Result<()> {
	let config = mnemo_config::load_or_default(args.config.as_deref())?;

	mnemo_cli::init_tracing(&config.service.log_level);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;

	check_bind(&config.security, http_addr)?;

	let state = AppState::new(config).await?;
	let service = state.service.clone();
	let app = routes::router(state);
	let http_listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(http_listener, app).await?;
	service.flush_embeddings().await;

	Ok(())
}

fn check_bind(security: &Security, http_addr: SocketAddr) -> Result<()> {
	if http_addr.ip().is_loopback() {
		return Ok(());
	}
	if security.bind_localhost_only {
		return Err(eyre::eyre!(
			"service.http_bind must be a loopback address when security.bind_localhost_only is true."
		));
	}
	if security.api_key.is_none() {
		return Err(eyre::eyre!(
			"security.api_key is required when service.http_bind is not a loopback address."
		));
	}

	Ok(())
}
