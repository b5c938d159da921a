//! Session authentication.
//!
//! This module contains the [`Session`] type, which acts as an [extractor].
//! It implements both [`FromRequestParts`], as well as [`IntoResponseParts`].
//!
//! Sessions are stateless: the signed-in [user] and an expiration date live in an encrypted
//! [cookie], which only this application can read or forge.
//!
//! # Life Cycle
//!
//! The typical life cycle of a session is as follows:
//!    1. A user completes a sign-in with an external provider and [`Session::create()`] issues
//!       the [cookie]
//!    2. A request comes in, with that [cookie]
//!    3. [`Session`] acts as an [extractor] via its [`FromRequestParts`] implementation
//!       3.1. The [cookie] is decrypted and parsed; expired tickets are ignored
//!       3.2. The session is authorized by invoking [`AuthorizeSession::authorize_session()`]
//!       3.3. The expiration date is pushed back (sliding expiration)
//!    4. The [user] can be accessed by the request handler
//!    5. [`Session`]'s [`IntoResponseParts`] implementation is invoked, and the resulting response
//!       will include a `Set-Cookie` header with the updated expiration date
//!
//! Middleware that already extracted a session can put it into the request's extensions, so
//! the handler does not run the authorization logic a second time.
//!
//! # Signing out
//!
//! [`Session::clear()`] removes the [cookie] from a cookie jar. This works whether or not the
//! request carried a (valid) session, which makes signing out idempotent.
//!
//! [extractor]: axum::extract
//! [cookie]: COOKIE_NAME
//! [user]: User

use std::convert::Infallible;
use std::marker::PhantomData;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request;
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::PrivateCookieJar;
use derive_more::Debug;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::authentication::User;
use crate::authorization::{self, AuthorizeSession};
use crate::{AppState, Error, Result};

/// The HTTP cookie name that stores the user's session.
pub const COOKIE_NAME: &str = "planner-auth";

/// How long a session stays valid without any activity.
const LIFETIME: time::Duration = time::Duration::days(14);

/// The payload of the session cookie.
#[derive(Debug, Serialize, Deserialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct Ticket {
	user: User,

	#[serde(with = "time::serde::rfc3339")]
	expires_on: OffsetDateTime,
}

/// A user session.
///
/// This type acts as an [extractor] for session authentication.
/// See [module level docs] for more details.
///
/// [extractor]: axum::extract
/// [module level docs]: crate::authentication::session
#[must_use = "sessions are stateful; dropping one loses the refreshed cookie"]
#[derive(Debug)]
pub struct Session<A = authorization::None> {
	/// The user associated with this session.
	#[debug("{} ({})", user.username(), user.scheme())]
	user: User,

	/// When this session expires.
	#[debug("{expires_on}")]
	expires_on: OffsetDateTime,

	/// The cookie jar that will be sent back to the user in the response.
	#[debug(skip)]
	jar: PrivateCookieJar,

	/// Marker to tie an authorization method to any given [`Session`] without actually storing
	/// anything.
	#[debug(skip)]
	_authorization: PhantomData<A>,
}

impl<A> Session<A> {
	/// Returns the user associated with this session.
	pub const fn user(&self) -> &User {
		&self.user
	}

	/// Returns when this session expires, unless it is refreshed before then.
	pub const fn expires_on(&self) -> OffsetDateTime {
		self.expires_on
	}

	/// Generates a new expiration date for any given session.
	fn next_expiration() -> OffsetDateTime {
		OffsetDateTime::now_utc() + LIFETIME
	}

	/// Writes a fresh ticket for `user` into `jar`.
	fn issue(user: User, jar: PrivateCookieJar) -> Result<Self> {
		let expires_on = Self::next_expiration();
		let ticket = Ticket { user, expires_on };
		let value = serde_json::to_string(&ticket)
			.map_err(|err| Error::logic("failed to serialize session ticket").context(err))?;

		let cookie = Cookie::build((COOKIE_NAME, value))
			.path("/")
			.http_only(true)
			.same_site(SameSite::Lax)
			.secure(cfg!(feature = "production"))
			.expires(expires_on)
			.build();

		Ok(Self {
			user: ticket.user,
			expires_on,
			jar: jar.add(cookie),
			_authorization: PhantomData,
		})
	}

	/// Reads the ticket stored in `jar`, if there is a valid, unexpired one.
	fn read_ticket(jar: &PrivateCookieJar) -> Option<Ticket> {
		let cookie = jar.get(COOKIE_NAME)?;
		let ticket = serde_json::from_str::<Ticket>(cookie.value())
			.inspect_err(|error| tracing::debug!(%error, "failed to parse session cookie"))
			.ok()?;

		if ticket.expires_on <= OffsetDateTime::now_utc() {
			tracing::debug!(expired_on = %ticket.expires_on, "session expired");
			return None;
		}

		Some(ticket)
	}
}

impl Session {
	/// Creates a new [`Session`] for a user who just signed in.
	#[tracing::instrument(level = "debug", name = "auth::session::login", skip_all, fields(
		user.username = %user.username(),
		user.scheme = %user.scheme(),
	))]
	pub fn create(user: User, jar: PrivateCookieJar) -> Result<Self> {
		let session = Self::issue(user, jar)?;

		tracing::debug!(until = %session.expires_on, "created session");

		Ok(session)
	}

	/// Removes the session cookie from `jar`.
	pub fn clear(jar: PrivateCookieJar) -> PrivateCookieJar {
		jar.remove(Cookie::build(COOKIE_NAME).path("/"))
	}
}

#[async_trait]
impl<A> FromRequestParts<&'static AppState> for Session<A>
where
	A: AuthorizeSession,
{
	type Rejection = Error;

	#[tracing::instrument(
		level = "debug",
		name = "auth::session::from_request_parts",
		skip_all,
		fields(session.user = tracing::field::Empty),
		err(level = "debug"),
	)]
	async fn from_request_parts(
		request: &mut request::Parts,
		state: &&'static AppState,
	) -> Result<Self> {
		if let Some(session) = request.extensions.remove::<Self>() {
			tracing::debug!(session.user = %session.user.username(), "extracting cached session");
			return Ok(session);
		}

		let jar = PrivateCookieJar::from_headers(&request.headers, state.cookie_key.clone());
		let Ticket { user, .. } = Self::read_ticket(&jar).ok_or_else(|| Error::missing_session())?;

		tracing::Span::current().record("session.user", user.username());

		tracing::debug! {
			method = std::any::type_name::<A>().rsplit("::").next().unwrap_or("?"),
			"authorizing session",
		};

		A::authorize_session(&user, request, *state).await?;

		let session = Self::issue(user, jar)?;

		tracing::debug!(until = %session.expires_on, "extended session");

		Ok(session)
	}
}

impl<A> IntoResponseParts for Session<A> {
	type Error = Infallible;

	fn into_response_parts(self, response: ResponseParts) -> Result<ResponseParts, Infallible> {
		self.jar.into_response_parts(response)
	}
}

impl<A> Clone for Session<A> {
	fn clone(&self) -> Self {
		Self {
			user: self.user.clone(),
			expires_on: self.expires_on,
			jar: self.jar.clone(),
			_authorization: PhantomData,
		}
	}
}
