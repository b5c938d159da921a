//! Correlation between a challenge and its callback.
//!
//! When a user is sent off to an identity provider we remember a few things in an encrypted,
//! short-lived cookie: which scheme was challenged, the `state` value the provider has to echo
//! back, the PKCE verifier, and where the user wants to end up afterwards. The callback handler
//! takes the cookie out of the jar again, so every correlation can only be used once.

use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL;
use base64::Engine;
use derive_more::Debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// The HTTP cookie name that stores the [`Correlation`].
pub const COOKIE_NAME: &str = "planner-correlation";

/// How long a user has to complete the sign-in at the provider.
const MAX_AGE: time::Duration = time::Duration::minutes(15);

/// State kept between a challenge and its callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation {
	/// The name of the scheme that was challenged.
	pub scheme: String,

	/// Random value the provider has to echo back.
	#[debug("*****")]
	pub state: String,

	/// PKCE code verifier.
	#[debug("*****")]
	pub code_verifier: String,

	/// Local path to redirect to after a successful sign-in.
	pub redirect_to: String,
}

impl Correlation {
	/// Creates a new [`Correlation`] with a fresh `state` and PKCE verifier.
	pub fn new(scheme: &str, redirect_to: String) -> Self {
		Self {
			scheme: scheme.to_owned(),
			state: random_token(),
			code_verifier: random_token(),
			redirect_to,
		}
	}

	/// The PKCE S256 code challenge derived from [`Correlation::code_verifier`].
	pub fn code_challenge(&self) -> String {
		BASE64_URL.encode(Sha256::digest(self.code_verifier.as_bytes()))
	}

	/// Stores this correlation in the given cookie jar.
	pub fn store(&self, jar: PrivateCookieJar) -> Result<PrivateCookieJar> {
		let json = serde_json::to_string(self)
			.map_err(|err| Error::logic("failed to serialize correlation").context(err))?;

		let cookie = Cookie::build((COOKIE_NAME, json))
			.path("/")
			.http_only(true)
			.same_site(SameSite::Lax)
			.secure(cfg!(feature = "production"))
			.max_age(MAX_AGE)
			.build();

		Ok(jar.add(cookie))
	}

	/// Takes the correlation out of the given cookie jar.
	///
	/// The returned jar will remove the cookie from the client, whether or not it could be
	/// parsed.
	pub fn take(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<Self>) {
		let Some(cookie) = jar.get(COOKIE_NAME) else {
			return (jar, None);
		};

		let correlation = serde_json::from_str::<Self>(cookie.value())
			.inspect_err(|error| tracing::debug!(%error, "failed to parse correlation cookie"))
			.ok();

		(jar.remove(Cookie::build(COOKIE_NAME).path("/")), correlation)
	}

	/// Checks that a callback belongs to this correlation.
	pub fn verify(&self, scheme: &str, state: &str) -> Result<()> {
		if self.scheme != scheme {
			return Err(Error::unauthorized().context(format!(
				"callback for `{scheme}` but challenge was for `{}`",
				self.scheme,
			)));
		}

		if self.state != state {
			return Err(Error::unauthorized().context("state mismatch"));
		}

		Ok(())
	}
}

/// Generates 32 random bytes, encoded as URL-safe base64.
fn random_token() -> String {
	let mut bytes = [0_u8; 32];

	rand::thread_rng().fill_bytes(&mut bytes);

	BASE64_URL.encode(bytes)
}
