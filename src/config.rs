//! Module containing the [`Config`] struct, the application's configuration.

use std::env;
use std::error::Error as StdError;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use derive_more::Debug;
use url::Url;

/// Configuration values for the application.
///
/// These are read from the environment on startup. Secrets are expected to come from the
/// process environment (or a local `.env` file during development), never from source control.
#[derive(Debug, Clone)]
pub struct Config {
	/// The ip address and port the server is going to listen on.
	#[debug("{addr}")]
	pub addr: SocketAddr,

	/// The public URL of this application.
	///
	/// Identity providers redirect back to URLs relative to this one.
	#[debug("{}", public_url.as_str())]
	pub public_url: Url,

	/// Base URL of the backend API that owns conference sessions.
	#[debug("{}", backend_url.as_str())]
	pub backend_url: Url,

	/// Base64-encoded key material for encrypting cookies.
	#[debug("*****")]
	pub cookie_secret: String,

	/// The only user who satisfies the "Admin" policy.
	pub admin_username: String,

	/// Twitter OAuth 2.0 credentials (client ID / client secret).
	pub twitter: Option<ProviderCredentials>,

	/// Google credentials (client ID / client secret).
	pub google: Option<ProviderCredentials>,

	/// Directory for rolling log files, if file logging is desired.
	pub log_dir: Option<PathBuf>,
}

/// A key/secret pair issued by an external identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
	/// The public half (the client ID).
	pub client_id: String,

	/// The secret half.
	#[debug("*****")]
	pub client_secret: String,
}

impl Config {
	/// Creates a new [`Config`] object by reading from the environment.
	pub fn new() -> anyhow::Result<Self> {
		let ip_addr = parse_from_env::<IpAddr>("PLANNER_IP")?;
		let port = parse_from_env("PLANNER_PORT")?;
		let addr = SocketAddr::new(ip_addr, port);
		let public_url = parse_from_env("PLANNER_PUBLIC_URL")?;
		let backend_url = parse_from_env("PLANNER_BACKEND_URL")?;
		let cookie_secret = parse_from_env("PLANNER_COOKIE_SECRET")?;
		let admin_username = parse_from_env("PLANNER_ADMIN_USERNAME")?;
		let twitter = credentials_from_env("TWITTER_CLIENT_ID", "TWITTER_CLIENT_SECRET")?;
		let google = credentials_from_env("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET")?;
		let log_dir = parse_from_env_opt("PLANNER_LOG_DIR")?;

		Ok(Self {
			addr,
			public_url,
			backend_url,
			cookie_secret,
			admin_username,
			twitter,
			google,
			log_dir,
		})
	}
}

/// Reads a provider's credential pair.
///
/// Both halves missing means the provider is simply not configured; only one half being set is
/// almost certainly a mistake and fails startup.
fn credentials_from_env(
	id_var: &str,
	secret_var: &str,
) -> anyhow::Result<Option<ProviderCredentials>> {
	match (
		parse_from_env_opt::<String>(id_var)?,
		parse_from_env_opt::<String>(secret_var)?,
	) {
		(Some(client_id), Some(client_secret)) => Ok(Some(ProviderCredentials {
			client_id,
			client_secret,
		})),
		(None, None) => Ok(None),
		(Some(_), None) => anyhow::bail!("`{id_var}` is set but `{secret_var}` is missing"),
		(None, Some(_)) => anyhow::bail!("`{secret_var}` is set but `{id_var}` is missing"),
	}
}

/// Parses an environment variable into a `T`.
fn parse_from_env<T>(var: &str) -> anyhow::Result<T>
where
	T: FromStr,
	T::Err: StdError + Send + Sync + 'static,
{
	let value = env::var(var).with_context(|| format!("missing `{var}` environment variable"))?;

	if value.is_empty() {
		anyhow::bail!("`{var}` cannot be empty");
	}

	<T as FromStr>::from_str(&value).with_context(|| format!("failed to parse `{var}`"))
}

/// Parses an environment variable into an `Option<T>`, returning `None` if the variable is not
/// set or empty.
fn parse_from_env_opt<T>(var: &str) -> anyhow::Result<Option<T>>
where
	T: FromStr,
	T::Err: StdError + Send + Sync + 'static,
{
	let Some(value) = env::var(var).ok() else {
		return Ok(None);
	};

	if value.is_empty() {
		return Ok(None);
	}

	<T as FromStr>::from_str(&value)
		.map(Some)
		.with_context(|| format!("failed to parse `{var}`"))
}
