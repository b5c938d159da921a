//! The application's main state.
//!
//! This is initialized once on startup, and then passed around the application by axum.

use anyhow::Context;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use derive_more::Debug;

use crate::authentication::Schemes;
use crate::authorization::AdminPolicy;
use crate::pages::Pages;
use crate::sessions::ApiClient;

/// The main application state.
///
/// A `'static` reference to this is passed around the application.
#[derive(Debug)]
pub struct AppState {
	/// The application configuration.
	pub config: crate::Config,

	/// HTTP client for talking to identity providers.
	#[debug(skip)]
	pub http_client: reqwest::Client,

	/// The key used to encrypt and decrypt cookies.
	#[debug(skip)]
	pub cookie_key: Key,

	/// All registered external authentication schemes.
	pub schemes: Schemes,

	/// The "Admin" authorization policy.
	pub admin_policy: AdminPolicy,

	/// Client for the backend API.
	pub api: ApiClient,

	/// Page templates.
	#[debug(skip)]
	pub pages: Pages,
}

impl AppState {
	/// Creates a new [`AppState`] object and leaks it on the heap.
	///
	/// **This function should only ever be called once per server; it leaks memory.**
	pub fn new(config: crate::Config) -> anyhow::Result<&'static Self> {
		let key_material = BASE64
			.decode(config.cookie_secret.as_bytes())
			.context("`PLANNER_COOKIE_SECRET` is not valid base64")?;

		let cookie_key = Key::try_from(key_material.as_slice())
			.context("`PLANNER_COOKIE_SECRET` must decode to at least 64 bytes")?;

		let http_client = reqwest::Client::new();
		let schemes = Schemes::from_config(&config);
		let admin_policy = AdminPolicy::new(config.admin_username.clone());
		let api = ApiClient::new(http_client.clone(), config.backend_url.clone());
		let pages = Pages::new().context("register page templates")?;

		Ok(Self::leak(Self {
			config,
			http_client,
			cookie_key,
			schemes,
			admin_policy,
			api,
			pages,
		}))
	}

	/// Moves the given state onto the heap and leaks it.
	pub(crate) fn leak(self) -> &'static Self {
		Box::leak(Box::new(self))
	}
}

impl FromRef<&'static AppState> for Key {
	fn from_ref(state: &&'static AppState) -> Self {
		state.cookie_key.clone()
	}
}
