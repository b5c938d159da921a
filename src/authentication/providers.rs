//! External identity providers.
//!
//! Every provider speaks the OAuth 2.0 authorization code flow (with PKCE). What differs between
//! them is where they live, which scopes they need, and what their profile endpoint returns.
//! Those differences are captured by [`ProviderKind`].
//!
//! # Flow
//!
//!    1. [`Provider::challenge_url()`] builds the URL the user is redirected to
//!    2. the provider redirects back to `/signin/{scheme}` with a `code`
//!    3. [`Provider::resolve_callback()`] exchanges the code for an access token and maps the
//!       provider's profile into a [`User`]

use derive_more::Debug;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::authentication::User;
use crate::config::ProviderCredentials;
use crate::{Error, Result};

/// The identity providers we know how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
	/// Twitter / X, configured with OAuth 2.0 client credentials.
	Twitter,

	/// Google, configured with a client ID and secret.
	Google,
}

impl ProviderKind {
	/// The scheme name used in URLs and forms.
	pub const fn name(self) -> &'static str {
		match self {
			Self::Twitter => "twitter",
			Self::Google => "google",
		}
	}

	/// The label shown on the login button.
	pub const fn display_name(self) -> &'static str {
		match self {
			Self::Twitter => "Twitter",
			Self::Google => "Google",
		}
	}

	/// Space separated scopes requested during the challenge.
	const fn scopes(self) -> &'static str {
		match self {
			Self::Twitter => "users.read tweet.read",
			Self::Google => "openid profile email",
		}
	}

	/// The provider's production endpoints.
	fn default_endpoints(self) -> Endpoints {
		let (authorize, token, profile) = match self {
			Self::Twitter => (
				"https://twitter.com/i/oauth2/authorize",
				"https://api.twitter.com/2/oauth2/token",
				"https://api.twitter.com/2/users/me",
			),
			Self::Google => (
				"https://accounts.google.com/o/oauth2/v2/auth",
				"https://oauth2.googleapis.com/token",
				"https://openidconnect.googleapis.com/v1/userinfo",
			),
		};

		Endpoints {
			authorize: Url::parse(authorize).expect("hard-coded url should be valid"),
			token: Url::parse(token).expect("hard-coded url should be valid"),
			profile: Url::parse(profile).expect("hard-coded url should be valid"),
		}
	}

	/// Maps a profile response body into a [`User`].
	fn parse_profile(self, body: &str) -> Result<User> {
		match self {
			Self::Twitter => {
				#[derive(Deserialize)]
				#[allow(clippy::missing_docs_in_private_items)]
				struct Profile {
					data: Data,
				}

				#[derive(Deserialize)]
				#[allow(clippy::missing_docs_in_private_items)]
				struct Data {
					username: String,
					name: Option<String>,
				}

				let Profile { data } = serde_json::from_str::<Profile>(body)
					.map_err(|err| Error::unauthorized().context(err))?;

				let display_name = data.name.unwrap_or_else(|| data.username.clone());

				Ok(User::new(data.username, display_name, self.name()))
			}
			Self::Google => {
				#[derive(Deserialize)]
				#[allow(clippy::missing_docs_in_private_items)]
				struct Profile {
					sub: String,
					email: Option<String>,
					name: Option<String>,
				}

				let profile = serde_json::from_str::<Profile>(body)
					.map_err(|err| Error::unauthorized().context(err))?;

				let username = profile.email.unwrap_or(profile.sub);
				let display_name = profile.name.unwrap_or_else(|| username.clone());

				Ok(User::new(username, display_name, self.name()))
			}
		}
	}
}

/// The URLs a provider is reachable at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
	/// Where users are sent to authenticate.
	#[debug("{}", authorize.as_str())]
	pub authorize: Url,

	/// Where authorization codes are exchanged for access tokens.
	#[debug("{}", token.as_str())]
	pub token: Url,

	/// Where the signed-in user's profile is fetched from.
	#[debug("{}", profile.as_str())]
	pub profile: Url,
}

/// A configured identity provider.
#[derive(Debug, Clone)]
pub struct Provider {
	/// Which provider this is.
	kind: ProviderKind,

	/// Our credentials with the provider.
	credentials: ProviderCredentials,

	/// The provider's endpoints.
	endpoints: Endpoints,
}

/// Query parameters sent to the provider when redirecting a user for login.
#[derive(Debug, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct AuthorizationRequest<'a> {
	response_type: &'static str,
	client_id: &'a str,
	redirect_uri: &'a str,
	scope: &'static str,
	state: &'a str,
	code_challenge: &'a str,
	code_challenge_method: &'static str,
}

/// Form parameters sent to the provider's token endpoint.
#[derive(Debug, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct TokenRequest<'a> {
	grant_type: &'static str,
	code: &'a str,
	redirect_uri: &'a str,
	client_id: &'a str,
	code_verifier: &'a str,
}

/// The parts of a token response we care about.
#[derive(Debug, Deserialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct TokenResponse {
	#[debug("*****")]
	access_token: String,
}

impl Provider {
	/// Creates a new [`Provider`] talking to the provider's production endpoints.
	pub fn new(kind: ProviderKind, credentials: ProviderCredentials) -> Self {
		Self {
			kind,
			credentials,
			endpoints: kind.default_endpoints(),
		}
	}

	/// Points this provider at different endpoints.
	pub fn with_endpoints(self, endpoints: Endpoints) -> Self {
		Self { endpoints, ..self }
	}

	/// Returns which provider this is.
	pub const fn kind(&self) -> ProviderKind {
		self.kind
	}

	/// Builds the URL a user has to be redirected to in order to sign in.
	///
	/// `callback` is the URL the provider should send the user back to, `state` an unguessable
	/// value that has to come back unchanged, and `code_challenge` the PKCE challenge.
	#[tracing::instrument(level = "debug", name = "auth::provider::challenge", skip_all, fields(
		scheme = self.kind.name(),
		callback = %callback,
	))]
	pub fn challenge_url(&self, callback: &Url, state: &str, code_challenge: &str) -> Url {
		let request = AuthorizationRequest {
			response_type: "code",
			client_id: &self.credentials.client_id,
			redirect_uri: callback.as_str(),
			scope: self.kind.scopes(),
			state,
			code_challenge,
			code_challenge_method: "S256",
		};

		let query_string =
			serde_urlencoded::to_string(&request).expect("this is a valid query string");

		let mut url = self.endpoints.authorize.clone();

		url.set_query(Some(&query_string));
		url
	}

	/// Exchanges an authorization `code` for an access token and fetches the user's profile.
	///
	/// `callback` has to be the same URL that was passed to [`Provider::challenge_url()`].
	#[tracing::instrument(level = "debug", name = "auth::provider::resolve", skip_all, fields(
		scheme = self.kind.name(),
		user.username = tracing::field::Empty,
	), err(level = "debug"))]
	pub async fn resolve_callback(
		&self,
		http_client: &reqwest::Client,
		callback: &Url,
		code: &str,
		code_verifier: &str,
	) -> Result<User> {
		let token_request = TokenRequest {
			grant_type: "authorization_code",
			code,
			redirect_uri: callback.as_str(),
			client_id: &self.credentials.client_id,
			code_verifier,
		};

		let response = http_client
			.post(self.endpoints.token.clone())
			.basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
			.form(&token_request)
			.send()
			.await?;

		let TokenResponse { access_token } = check_status(response, "token exchange")
			.await?
			.json::<TokenResponse>()
			.await
			.map_err(|err| Error::unauthorized().context(err))?;

		tracing::debug!("exchanged code for access token");

		let response = http_client
			.get(self.endpoints.profile.clone())
			.bearer_auth(access_token)
			.send()
			.await?;

		let body = check_status(response, "profile request").await?.text().await?;
		let user = self.kind.parse_profile(&body)?;

		tracing::Span::current().record("user.username", user.username());

		Ok(user)
	}
}

/// Turns unsuccessful provider responses into errors.
///
/// Client errors mean the provider rejected what we sent (most likely a stale or forged code), so
/// the sign-in is unauthorized. Anything else is the provider's problem.
async fn check_status(response: Response, what: &'static str) -> Result<Response> {
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let body = response.text().await.ok();

	tracing::debug!(%status, ?body, "{what} failed");

	let error = if status.is_client_error() {
		Error::unauthorized()
	} else {
		Error::external_api_status(status)
	};

	Err(error.context(format!("{what} failed: {body:?}")))
}
