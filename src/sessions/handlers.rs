//! Handlers for the public session pages.

use axum::extract::State;
use axum::response::Html;
use serde::{Deserialize, Serialize};

use super::{Session, SessionView};
use crate::extract::Query;
use crate::flash::Flash;
use crate::pages::Page;
use crate::{authentication, AppState, Error, Result};

/// Content of the session listing.
#[derive(Debug, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct Listing<'a> {
	sessions: Vec<SessionView<'a>>,
	can_edit: bool,
}

/// List all sessions.
///
/// Admins get an "Edit" link next to every session.
#[tracing::instrument(skip_all, fields(user = tracing::field::Empty))]
pub async fn index(
	State(state): State<&'static AppState>,
	session: Option<authentication::Session>,
	flash: Flash,
) -> Result<(Option<authentication::Session>, Flash, Html<String>)> {
	let user = session.as_ref().map(|session| session.user());

	if let Some(user) = user {
		tracing::Span::current().record("user", user.username());
	}

	let sessions = state.api.get_sessions().await?;
	let (flash, message) = flash.take();
	let can_edit = state.admin_policy.evaluate(user);
	let listing = Listing {
		sessions: sessions.iter().map(SessionView::from).collect(),
		can_edit,
	};

	let page = Page::new("Sessions", listing)
		.user(user, can_edit)
		.flash(message);

	let html = state.pages.render("index", &page)?;

	Ok((session, flash, html))
}

/// Query parameters identifying a single session.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SessionParams {
	/// The session's ID.
	pub id: i32,
}

/// Content of the session details page.
#[derive(Debug, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct Details<'a> {
	session: SessionView<'a>,
	can_edit: bool,
}

/// Show a single session.
#[tracing::instrument(skip(state, session, flash))]
pub async fn details(
	State(state): State<&'static AppState>,
	session: Option<authentication::Session>,
	flash: Flash,
	Query(SessionParams { id }): Query<SessionParams>,
) -> Result<(Option<authentication::Session>, Flash, Html<String>)> {
	let resource: Session = state
		.api
		.get_session(id)
		.await?
		.ok_or_else(|| Error::not_found("session"))?;

	let user = session.as_ref().map(|session| session.user());
	let (flash, message) = flash.take();
	let can_edit = state.admin_policy.evaluate(user);
	let details = Details {
		session: SessionView::from(&resource),
		can_edit,
	};

	let page = Page::new(&resource.title, details)
		.user(user, can_edit)
		.flash(message);

	let html = state.pages.render("session", &page)?;

	Ok((session, flash, html))
}
