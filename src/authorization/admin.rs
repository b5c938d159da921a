//! The "Admin" policy.

use axum::http::request;

use super::AuthorizeSession;
use crate::authentication::User;
use crate::{AppState, Error, Result};

/// A policy satisfied by exactly one, configured, username.
///
/// The comparison is exact: it is case-sensitive and no whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPolicy {
	/// The username of the administrator.
	username: String,
}

impl AdminPolicy {
	/// The policy's name, as reported in errors and logs.
	pub const NAME: &'static str = "Admin";

	/// Creates a new [`AdminPolicy`].
	pub const fn new(username: String) -> Self {
		Self { username }
	}

	/// Evaluates the policy for the (possibly anonymous) current user.
	pub fn evaluate(&self, user: Option<&User>) -> bool {
		user.is_some_and(|user| user.username() == self.username)
	}
}

/// An authorization method that ensures the user satisfies the [`AdminPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct IsAdmin;

impl AuthorizeSession for IsAdmin {
	#[tracing::instrument(level = "debug", name = "auth::is_admin", skip_all, fields(
		user.username = %user.username(),
		policy = AdminPolicy::NAME,
	))]
	async fn authorize_session(
		user: &User,
		_req: &mut request::Parts,
		state: &'static AppState,
	) -> Result<()> {
		if state.admin_policy.evaluate(Some(user)) {
			Ok(())
		} else {
			Err(Error::forbidden(AdminPolicy::NAME))
		}
	}
}
