//! Everything related to authorization.
//!
//! [`AuthorizeSession`] describes how an already authenticated [session] is authorized. The
//! strategy is picked at compile time via [`Session`]'s type parameter, e.g.
//! `Session<IsAdmin>` only extracts successfully for users satisfying the [`AdminPolicy`].
//!
//! [session]: crate::authentication::session
//! [`Session`]: crate::authentication::Session

use std::future::Future;

use axum::http::request;

use crate::authentication::User;
use crate::{AppState, Result};

mod none;
pub use none::None;

mod admin;
pub use admin::{AdminPolicy, IsAdmin};

/// Used for deciding an authorization strategy when doing [session authentication].
///
/// [session authentication]: crate::authentication::session
pub trait AuthorizeSession: Send + Sync + 'static {
	/// Authorize a session for the given `user`.
	fn authorize_session(
		user: &User,
		req: &mut request::Parts,
		state: &'static AppState,
	) -> impl Future<Output = Result<()>> + Send;
}
