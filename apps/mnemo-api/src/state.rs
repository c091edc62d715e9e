use std::sync::Arc;

use mnemo_config::Config;
use mnemo_service::MnemoService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MnemoService>,
	/// Expected `X-API-Key` value. `None` leaves the memory routes open, which startup only
	/// allows on a loopback bind.
	pub api_key: Option<Arc<str>>,
}
impl AppState {
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let api_key = config.security.api_key.as_deref().map(Arc::from);
		let service = MnemoService::open(config).await?;

		Ok(Self::from_service(Arc::new(service), api_key))
	}

	pub fn from_service(service: Arc<MnemoService>, api_key: Option<Arc<str>>) -> Self {
		Self { service, api_key }
	}
}
