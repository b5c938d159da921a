//! One-shot status messages.
//!
//! A handler that redirects after a successful mutation (Post/Redirect/Get) sets a message with
//! [`Flash::set()`]; the page the browser lands on takes it out again with [`Flash::take()`].
//! Both directions are expressed through the returned cookie jar, so the [`Flash`] has to be part
//! of the response.

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request;
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::PrivateCookieJar;
use derive_more::Debug;

use crate::AppState;

/// The HTTP cookie name that stores the pending message.
pub const COOKIE_NAME: &str = "planner-flash";

/// Request-scoped access to the pending flash message.
#[must_use = "flash messages are stored in cookies; the `Flash` has to be returned"]
#[derive(Debug, Clone)]
pub struct Flash {
	/// The jar holding the message cookie.
	#[debug(skip)]
	jar: PrivateCookieJar,
}

impl Flash {
	/// Creates a new [`Flash`] backed by the given cookie jar.
	pub const fn new(jar: PrivateCookieJar) -> Self {
		Self { jar }
	}

	/// Takes the pending message, if any.
	///
	/// The message is removed from the client in the same response.
	pub fn take(self) -> (Self, Option<String>) {
		let Some(cookie) = self.jar.get(COOKIE_NAME) else {
			return (self, None);
		};

		let message = cookie.value().to_owned();
		let jar = self.jar.remove(Cookie::build(COOKIE_NAME).path("/"));

		tracing::debug!(%message, "consumed flash message");

		(Self { jar }, Some(message))
	}

	/// Sets the message shown on the next page.
	pub fn set<M>(self, message: M) -> Self
	where
		M: Into<String>,
	{
		let cookie = Cookie::build((COOKIE_NAME, message.into()))
			.path("/")
			.http_only(true)
			.same_site(SameSite::Lax)
			.secure(cfg!(feature = "production"))
			.build();

		Self {
			jar: self.jar.add(cookie),
		}
	}
}

#[async_trait]
impl FromRequestParts<&'static AppState> for Flash {
	type Rejection = Infallible;

	async fn from_request_parts(
		request: &mut request::Parts,
		state: &&'static AppState,
	) -> Result<Self, Infallible> {
		Ok(Self::new(PrivateCookieJar::from_headers(
			&request.headers,
			state.cookie_key.clone(),
		)))
	}
}

impl IntoResponseParts for Flash {
	type Error = Infallible;

	fn into_response_parts(self, response: ResponseParts) -> Result<ResponseParts, Infallible> {
		self.jar.into_response_parts(response)
	}
}
