//! No authorization.
//!
//! This is the default authorization method.

use axum::http::request;

use super::AuthorizeSession;
use crate::authentication::User;
use crate::{AppState, Result};

/// An authorization method which always succeeds.
#[derive(Debug, Clone, Copy)]
pub struct None;

impl AuthorizeSession for None {
	async fn authorize_session(
		_user: &User,
		_req: &mut request::Parts,
		_state: &'static AppState,
	) -> Result<()> {
		Ok(())
	}
}
