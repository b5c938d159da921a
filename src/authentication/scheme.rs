//! Authentication schemes.

use serde::Serialize;

use super::providers::{Provider, ProviderKind};

/// A configured sign-in mechanism, as presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthenticationScheme {
	/// Identifies the scheme in forms and URLs.
	pub name: &'static str,

	/// The label of the scheme's login button.
	pub display_name: &'static str,
}

/// The registry of external schemes, built once on startup.
#[derive(Debug, Clone, Default)]
pub struct Schemes {
	/// Registered providers, in the order their buttons are rendered.
	providers: Vec<Provider>,
}

impl Schemes {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers every provider that has credentials in `config`.
	pub fn from_config(config: &crate::Config) -> Self {
		let mut schemes = Self::new();

		if let Some(credentials) = config.twitter.clone() {
			schemes = schemes.with(Provider::new(ProviderKind::Twitter, credentials));
		}

		if let Some(credentials) = config.google.clone() {
			schemes = schemes.with(Provider::new(ProviderKind::Google, credentials));
		}

		if schemes.providers.is_empty() {
			tracing::warn!("no external authentication schemes configured; nobody can sign in");
		}

		schemes
	}

	/// Adds a provider to the registry, replacing any existing provider of the same kind.
	pub fn with(mut self, provider: Provider) -> Self {
		self.providers
			.retain(|existing| existing.kind() != provider.kind());
		self.providers.push(provider);
		self
	}

	/// Returns all schemes that can handle an interactive challenge.
	pub fn all(&self) -> Vec<AuthenticationScheme> {
		self.providers
			.iter()
			.map(|provider| AuthenticationScheme {
				name: provider.kind().name(),
				display_name: provider.kind().display_name(),
			})
			.collect()
	}

	/// Looks up the provider behind the scheme called `name`.
	pub fn get(&self, name: &str) -> Option<&Provider> {
		self.providers
			.iter()
			.find(|provider| provider.kind().name() == name)
	}
}
