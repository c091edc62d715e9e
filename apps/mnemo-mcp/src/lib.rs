pub mod server;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use clap::{Parser, ValueEnum};
use color_eyre::{Result, eyre};

use mnemo_config::Security;
use mnemo_service::MnemoService;

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
	#[arg(long, short = 't', value_enum, default_value_t = Transport::Stdio)]
	pub transport: Transport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Transport {
	Stdio,
	Http,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum McpAuthState {
	Off,
	Bearer { token: String },
}

pub async fn run(args: Args) -> Result<()> {
	let config = mnemo_config::load_or_default(args.config.as_deref())?;

	mnemo_cli::init_tracing(&config.service.log_level);

	let auth_state = match args.transport {
		Transport::Stdio => None,
		Transport::Http => Some(build_auth_state(&config.security, &config.service.mcp_bind)?),
	};
	let mcp_bind = config.service.mcp_bind.clone();
	let service = Arc::new(MnemoService::open(config).await?);
	let served = match auth_state {
		None => server::serve_stdio(service.clone()).await,
		Some(auth_state) => server::serve_http(&mcp_bind, auth_state, service.clone()).await,
	};

	service.flush_embeddings().await;

	served
}

fn build_auth_state(security: &Security, mcp_bind: &str) -> Result<McpAuthState> {
	match security.api_key.as_deref() {
		Some(token) => {
			if security.bind_localhost_only {
				enforce_loopback(mcp_bind, "security.bind_localhost_only is true")?;
			}

			Ok(McpAuthState::Bearer { token: token.to_string() })
		},
		None => {
			enforce_loopback(mcp_bind, "security.api_key is not set")?;

			Ok(McpAuthState::Off)
		},
	}
}

fn enforce_loopback(mcp_bind: &str, reason: &str) -> Result<()> {
	let bind_addr: SocketAddr = mcp_bind.parse().map_err(|err| {
		eyre::eyre!("service.mcp_bind must be a valid socket address: {err}")
	})?;

	if !bind_addr.ip().is_loopback() {
		return Err(eyre::eyre!("service.mcp_bind must be a loopback address when {reason}."));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use mnemo_config::Security;

	use crate::{McpAuthState, build_auth_state};

	fn security(bind_localhost_only: bool, api_key: Option<&str>) -> Security {
		Security { bind_localhost_only, api_key: api_key.map(str::to_string) }
	}

	#[test]
	fn keyless_http_requires_loopback_bind() {
		let err = build_auth_state(&security(false, None), "0.0.0.0:8788")
			.expect_err("expected error");

		assert!(err.to_string().contains("security.api_key is not set"), "unexpected error: {err}");
		assert_eq!(
			build_auth_state(&security(false, None), "127.0.0.1:8788").expect("auth state"),
			McpAuthState::Off
		);
	}

	#[test]
	fn api_key_enables_bearer_auth_on_public_binds() {
		let auth_state =
			build_auth_state(&security(false, Some("k-1")), "0.0.0.0:8788").expect("auth state");

		assert_eq!(auth_state, McpAuthState::Bearer { token: "k-1".to_string() });
	}

	#[test]
	fn localhost_only_rejects_public_binds_even_with_a_key() {
		let err = build_auth_state(&security(true, Some("k-1")), "0.0.0.0:8788")
			.expect_err("expected error");

		assert!(err.to_string().contains("bind_localhost_only"), "unexpected error: {err}");
	}
}
