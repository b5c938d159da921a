//! This module contains helpers for unit tests.

use std::collections::BTreeMap;

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Router;
use axum_extra::extract::cookie::{Cookie, Key};
use axum_extra::extract::PrivateCookieJar;
use url::Url;

use crate::authentication::providers::{Endpoints, Provider, ProviderKind};
use crate::authentication::{Schemes, Session, User};
use crate::authorization::AdminPolicy;
use crate::config::ProviderCredentials;
use crate::pages::Pages;
use crate::sessions::ApiClient;
use crate::{AppState, Config};

/// The username of the admin in tests.
pub(crate) const ADMIN: &str = "janedoe";

/// Global constructor that will run before tests.
#[ctor::ctor]
fn ctor() {
	use tracing_subscriber::fmt::format::FmtSpan;
	use tracing_subscriber::EnvFilter;

	color_eyre::install().expect("failed to install color-eyre");
	tracing_subscriber::fmt()
		.compact()
		.with_ansi(true)
		.with_file(true)
		.with_level(true)
		.with_line_number(true)
		.with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
		.with_target(true)
		.with_test_writer()
		.with_thread_ids(true)
		.with_thread_names(true)
		.with_env_filter(EnvFilter::from_default_env())
		.init();
}

/// Wrapper over std's `assert!()` macro that uses [`eyre::ensure!()`] instead.
///
/// [`eyre::ensure!()`]: color_eyre::eyre::ensure
macro_rules! assert {
	($($t:tt)*) => {
		::color_eyre::eyre::ensure!($($t)*)
	};
}

pub(crate) use assert;

/// Wrapper over std's `assert_eq!()` macro that uses [`eyre::bail!()`] instead.
///
/// [`eyre::bail!()`]: color_eyre::eyre::bail
macro_rules! assert_eq {
	($left:expr, $right:expr $(,)?) => {
		match (&$left, &$right) {
			(left, right) => {
				if left != right {
					::color_eyre::eyre::bail!(
						"assertion `left == right` failed\n  left: {left:?}\n right: {right:?}"
					)
				}
			}
		}
	};
	($left:expr, $right:expr, $($t:tt)*) => {
		match (&$left, &$right) {
			(left, right) => $crate::testing::assert!(left == right, $($t)*),
		}
	};
}

pub(crate) use assert_eq;

/// Wrapper over std's `matches!()` macro that fails the test if the pattern does not match.
macro_rules! assert_matches {
	($expr:expr, $pat:pat $(if $cond:expr)? $(,)?) => {
		$crate::testing::assert!(
			matches!($expr, $pat $(if $cond)?),
			"`{}` does not match `{}`",
			stringify!($expr),
			stringify!($pat),
		)
	};
}

pub(crate) use assert_matches;

/// Client credentials used for every provider in tests.
pub(crate) fn credentials() -> ProviderCredentials {
	ProviderCredentials {
		client_id: String::from("planner-client"),
		client_secret: String::from("hunter2"),
	}
}

/// Creates application state talking to mock servers.
///
/// The backend API lives at `backend`; both identity providers serve their endpoints under
/// `providers` (`/{scheme}/authorize`, `/{scheme}/token`, `/{scheme}/me`).
pub(crate) fn state(backend: &str, providers: &str) -> color_eyre::Result<&'static AppState> {
	let backend_url = backend.parse::<Url>()?;
	let providers = providers.parse::<Url>()?;
	let config = Config {
		addr: "127.0.0.1:0".parse()?,
		public_url: "http://planner.test".parse()?,
		backend_url: backend_url.clone(),
		cookie_secret: String::new(),
		admin_username: String::from(ADMIN),
		twitter: Some(credentials()),
		google: Some(credentials()),
		log_dir: None,
	};

	let mut schemes = Schemes::new();

	for kind in [ProviderKind::Twitter, ProviderKind::Google] {
		let endpoints = Endpoints {
			authorize: providers.join(&format!("/{}/authorize", kind.name()))?,
			token: providers.join(&format!("/{}/token", kind.name()))?,
			profile: providers.join(&format!("/{}/me", kind.name()))?,
		};

		schemes = schemes.with(Provider::new(kind, credentials()).with_endpoints(endpoints));
	}

	let http_client = reqwest::Client::new();
	let admin_policy = AdminPolicy::new(config.admin_username.clone());
	let api = ApiClient::new(http_client.clone(), backend_url);

	Ok(AppState {
		config,
		http_client,
		cookie_key: Key::generate(),
		schemes,
		admin_policy,
		api,
		pages: Pages::new()?,
	}
	.leak())
}

/// Creates the full application router for the given state.
pub(crate) fn router(state: &'static AppState) -> Router {
	crate::router(state)
}

/// A minimal cookie store, standing in for a browser.
#[derive(Debug, Default, Clone)]
pub(crate) struct Browser {
	/// Cookies by name.
	cookies: BTreeMap<String, String>,
}

impl Browser {
	/// Creates a browser that is signed in as `username`.
	pub(crate) fn signed_in(state: &'static AppState, username: &str) -> color_eyre::Result<Self> {
		let user = User::new(username, username.to_uppercase(), "twitter");
		let session = Session::create(user, PrivateCookieJar::new(state.cookie_key.clone()))?;
		let mut browser = Self::default();

		browser.update(&(session, ()).into_response());

		Ok(browser)
	}

	/// Applies every `Set-Cookie` header of `response`.
	pub(crate) fn update(&mut self, response: &Response) {
		for value in response.headers().get_all(header::SET_COOKIE) {
			let Some(cookie) = value.to_str().ok().and_then(|value| Cookie::parse(value).ok())
			else {
				continue;
			};

			let removed = cookie.value().is_empty()
				|| cookie
					.max_age()
					.is_some_and(|max_age| max_age.is_zero() || max_age.is_negative());

			if removed {
				self.cookies.remove(cookie.name());
			} else {
				self.cookies
					.insert(cookie.name().to_owned(), cookie.value().to_owned());
			}
		}
	}

	/// Whether the browser holds a cookie called `name`.
	pub(crate) fn has(&self, name: &str) -> bool {
		self.cookies.contains_key(name)
	}

	/// The `Cookie` header to send, if there are any cookies.
	pub(crate) fn header(&self) -> Option<HeaderValue> {
		if self.cookies.is_empty() {
			return None;
		}

		let cookies = self
			.cookies
			.iter()
			.map(|(name, value)| format!("{name}={value}"))
			.collect::<Vec<_>>()
			.join("; ");

		HeaderValue::from_str(&cookies).ok()
	}

	/// Builds a request carrying this browser's cookies.
	pub(crate) fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
		let builder = axum::http::Request::builder().method(method).uri(uri);

		match self.header() {
			Some(cookies) => builder.header(header::COOKIE, cookies),
			None => builder,
		}
	}
}

/// Reads a response body as a string.
pub(crate) async fn body(response: Response) -> color_eyre::Result<String> {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

	Ok(String::from_utf8(bytes.to_vec())?)
}

/// The `Location` header of a response.
pub(crate) fn location(response: &Response) -> Option<&str> {
	response
		.headers()
		.get(header::LOCATION)
		.and_then(|value| value.to_str().ok())
}

mod tests {
	fn compare(left: Option<String>, right: Option<String>) -> color_eyre::Result<()> {
		super::assert_eq!(left, right);
		super::assert_eq!(left, right, "compared twice");

		Ok(())
	}

	#[test]
	fn assert_eq_borrows_its_operands() -> color_eyre::Result<()> {
		compare(Some(String::from("janedoe")), Some(String::from("janedoe")))?;
		compare(None, None)?;

		super::assert!(compare(Some(String::from("janedoe")), None).is_err());

		Ok(())
	}
}
