use std::sync::Arc;

use mnemo_config::EmbeddingProviderConfig;

use crate::{EmbeddingProvider, Error, Result};

/// Turns text into a vector through the configured provider, if any.
pub struct Embedder {
	cfg: Option<EmbeddingProviderConfig>,
	provider: Arc<dyn EmbeddingProvider>,
}
impl Embedder {
	pub fn new(
		cfg: Option<EmbeddingProviderConfig>,
		provider: Arc<dyn EmbeddingProvider>,
	) -> Self {
		Self { cfg, provider }
	}

	pub fn is_configured(&self) -> bool {
		self.cfg.is_some()
	}

	pub fn model(&self) -> Option<&str> {
		self.cfg.as_ref().map(|cfg| cfg.model.as_str())
	}

	/// Best-effort single embedding. Missing configuration and provider failures both yield
	/// `None`; failures are logged.
	pub async fn embed(&self, text: &str) -> Option<Vec<f32>> {
		let cfg = self.cfg.as_ref()?;
		let texts = [text.to_string()];

		match self.provider.embed(cfg, &texts).await {
			Ok(mut vectors) if vectors.len() == 1 => vectors.pop().filter(|v| !v.is_empty()),
			Ok(vectors) => {
				tracing::warn!(
					provider_id = %cfg.provider_id,
					returned = vectors.len(),
					"Embedding provider returned an unexpected number of vectors."
				);

				None
			},
			Err(err) => {
				tracing::warn!(
					provider_id = %cfg.provider_id,
					error = %err,
					"Embedding provider call failed."
				);

				None
			},
		}
	}

	/// Batch embedding that reports failures instead of swallowing them.
	pub async fn try_embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let cfg = self.cfg.as_ref().ok_or_else(|| Error::Provider {
			message: "No embedding provider is configured.".to_string(),
		})?;
		let vectors = self.provider.embed(cfg, texts).await?;

		if vectors.len() != texts.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {} inputs.",
					vectors.len(),
					texts.len()
				),
			});
		}

		Ok(vectors)
	}
}
