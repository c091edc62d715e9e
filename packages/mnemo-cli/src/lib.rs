use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};
use subtle::ConstantTimeEq;
use tracing_subscriber::EnvFilter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

/// Installs the global `tracing` subscriber.
///
/// Output always goes to stderr so that stdio-based transports keep stdout for protocol frames.
pub fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init();
}

/// Compares a presented credential against the configured one in constant time.
///
/// Only the length of `expected` can leak through timing.
pub fn secret_matches(expected: &str, presented: &str) -> bool {
	expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
	use crate::secret_matches;

	#[test]
	fn secret_matches_requires_exact_bytes() {
		assert!(secret_matches("k-1", "k-1"));
		assert!(!secret_matches("k-1", "k-2"));
		assert!(!secret_matches("k-1", "k-1 "));
		assert!(!secret_matches("k-1", ""));
	}
}
