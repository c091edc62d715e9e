use clap::Parser;

use mnemo_mcp::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	mnemo_mcp::run(args).await
}
