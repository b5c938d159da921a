//! Middleware protecting the `/Admin` pages.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use url::form_urlencoded;

use crate::authentication::Session;
use crate::authorization::IsAdmin;
use crate::Error;

/// Only lets admins through.
///
/// Anonymous users are sent to the login page, and brought back to the page they asked for
/// afterwards. Signed-in users who are not admins are rejected with `403 Forbidden`.
///
/// The authorized session is cached in the request's extensions, so handlers extracting a
/// `Session<IsAdmin>` themselves get it for free.
#[tracing::instrument(level = "debug", name = "admin::guard", skip_all, fields(
	uri = %request.uri(),
))]
pub async fn require_admin(
	session: Result<Session<IsAdmin>, Error>,
	mut request: Request,
	next: Next,
) -> Response {
	match session {
		Ok(session) => {
			request.extensions_mut().insert(session);
			next.run(request).await
		}
		Err(error) if error.is_missing_session() => {
			let target = request
				.uri()
				.path_and_query()
				.map_or("/", |path_and_query| path_and_query.as_str());

			tracing::debug!(%target, "not signed in; redirecting to login");

			login_redirect(target).into_response()
		}
		Err(error) => error.into_response(),
	}
}

/// Builds a redirect to the login page, returning to `target` afterwards.
pub(crate) fn login_redirect(target: &str) -> Redirect {
	let query = form_urlencoded::Serializer::new(String::new())
		.append_pair("redirect_to", target)
		.finish();

	Redirect::to(&format!("/Login?{query}"))
}
