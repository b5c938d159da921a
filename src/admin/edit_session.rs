//! Handlers for `/Admin/EditSession`.
//!
//! Every mutation follows Post/Redirect/Get: a successful submission stores a [flash message]
//! and redirects, so reloading the resulting page never submits the form again.
//!
//! [flash message]: crate::flash

use axum::extract::{FromRequest, Request, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};

use super::form::{EditSessionForm, FieldErrors};
use crate::authentication::{self, User};
use crate::authorization::IsAdmin;
use crate::extract::{Form, Query};
use crate::flash::Flash;
use crate::pages::Page;
use crate::{AppState, Error, Result};

/// Shown after a session was saved.
pub const SAVED_MESSAGE: &str = "The session was saved successfully";

/// Shown after a session was deleted.
pub const DELETED_MESSAGE: &str = "The session was deleted successfully";

/// An admin's session.
type AdminSession = authentication::Session<IsAdmin>;

/// Query parameters for viewing the edit form.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ViewParams {
	/// The ID of the session to edit.
	pub id: i32,
}

/// Query parameters for submissions.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitParams {
	/// Which action to run; saving if absent.
	pub handler: Option<String>,

	/// The ID of the session to delete.
	pub id: Option<i32>,
}

/// Content of the edit page.
#[derive(Debug, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct EditPage<'a> {
	form: &'a EditSessionForm,
	errors: FieldErrors,
}

/// Show the edit form for a session.
#[tracing::instrument(skip(state, session, flash), fields(user = %session.user().username()))]
pub async fn view(
	State(state): State<&'static AppState>,
	session: AdminSession,
	flash: Flash,
	Query(ViewParams { id }): Query<ViewParams>,
) -> Result<(AdminSession, Flash, Html<String>)> {
	let resource = state
		.api
		.get_session(id)
		.await?
		.ok_or_else(|| Error::not_found("session"))?;

	let (flash, message) = flash.take();
	let form = EditSessionForm::from(&resource);
	let html = render(state, session.user(), &form, FieldErrors::default(), message)?;

	Ok((session, flash, html))
}

/// Handle a submission of the edit page.
///
/// Without a `handler` query parameter the form is saved; `handler=Delete` deletes the session
/// named by the `id` query parameter.
#[tracing::instrument(skip(state, session, flash, request), fields(user = %session.user().username()))]
pub async fn submit(
	State(state): State<&'static AppState>,
	session: AdminSession,
	flash: Flash,
	Query(params): Query<SubmitParams>,
	request: Request,
) -> Result<Response> {
	match params.handler.as_deref() {
		None => {
			let Form(form) = Form::<EditSessionForm>::from_request(request, &state).await?;

			save(state, session, flash, form).await
		}
		Some("Delete") => {
			let id = params.id.ok_or_else(|| Error::invalid("session id"))?;

			delete(state, session, flash, id).await
		}
		Some(handler) => Err(Error::invalid(format_args!("handler `{handler}`"))),
	}
}

/// Validates and saves the submitted form.
#[tracing::instrument(level = "debug", skip_all, fields(session.id = form.id))]
async fn save(
	state: &'static AppState,
	session: AdminSession,
	flash: Flash,
	form: EditSessionForm,
) -> Result<Response> {
	let mut resource = match form.validate() {
		Ok(resource) => resource,
		Err(errors) => {
			let html = render(state, session.user(), &form, errors, None)?;

			return Ok((session, flash, html).into_response());
		}
	};

	let existing = state
		.api
		.get_session(resource.id)
		.await?
		.ok_or_else(|| Error::not_found("session"))?;

	if existing.conference_id != resource.conference_id {
		tracing::warn! {
			submitted = resource.conference_id,
			actual = existing.conference_id,
			"ignoring submitted conference id",
		};

		resource.conference_id = existing.conference_id;
	}

	state.api.put_session(&resource).await?;

	tracing::info!(target: "conference_planner::audit_log", id = resource.id, "saved session");

	let flash = flash.set(SAVED_MESSAGE);
	let redirect = Redirect::to(&format!("/Admin/EditSession?id={}", resource.id));

	Ok((session, flash, redirect).into_response())
}

/// Deletes a session, if it exists.
#[tracing::instrument(level = "debug", skip(state, session, flash))]
async fn delete(
	state: &'static AppState,
	session: AdminSession,
	flash: Flash,
	id: i32,
) -> Result<Response> {
	if state.api.get_session(id).await?.is_some() {
		state.api.delete_session(id).await?;

		tracing::info!(target: "conference_planner::audit_log", id, "deleted session");
	} else {
		tracing::debug!("session does not exist; nothing to delete");
	}

	let flash = flash.set(DELETED_MESSAGE);

	Ok((session, flash, Redirect::to("/")).into_response())
}

/// Renders the edit page.
fn render(
	state: &'static AppState,
	user: &User,
	form: &EditSessionForm,
	errors: FieldErrors,
	message: Option<String>,
) -> Result<Html<String>> {
	let page = Page::new("Edit session", EditPage { form, errors })
		.user(Some(user), true)
		.flash(message);

	state.pages.render("edit_session", &page)
}

#[cfg(test)]
mod tests {
	use axum::body::Body;
	use axum::http::{header, StatusCode};
	use serde_json::json;
	use tower::ServiceExt;
	use wiremock::matchers::{body_json, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;
	use crate::flash;
	use crate::testing::{self, Browser};

	fn keynote() -> serde_json::Value {
		json!({
			"id": 1,
			"conferenceId": 7,
			"trackId": null,
			"title": "Keynote",
			"abstract": "Opening words.",
			"startTime": "2026-11-02T08:00:00Z",
			"endTime": "2026-11-02T08:30:00Z",
		})
	}

	async fn mount_keynote(server: &MockServer) {
		Mock::given(method("GET"))
			.and(path("/api/sessions/1"))
			.respond_with(ResponseTemplate::new(200).set_body_json(keynote()))
			.mount(server)
			.await;
	}

	fn post_form(browser: &Browser, uri: &str, form: &'static str) -> color_eyre::Result<Request> {
		Ok(browser
			.request("POST", uri)
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(Body::from(form))?)
	}

	#[tokio::test]
	async fn anonymous_users_are_sent_to_login() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let response = testing::router(state)
			.oneshot(
				Browser::default()
					.request("GET", "/Admin/EditSession?id=1")
					.body(Body::empty())?,
			)
			.await?;

		testing::assert_eq!(response.status(), StatusCode::SEE_OTHER);
		testing::assert_eq!(
			testing::location(&response),
			Some("/Login?redirect_to=%2FAdmin%2FEditSession%3Fid%3D1"),
		);

		Ok(())
	}

	#[tokio::test]
	async fn other_users_are_forbidden() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let browser = Browser::signed_in(state, "JaneDoe")?;

		for request in [
			browser.request("GET", "/Admin/EditSession?id=1").body(Body::empty())?,
			post_form(&browser, "/Admin/EditSession?handler=Delete&id=1", "")?,
		] {
			let response = testing::router(state).oneshot(request).await?;

			testing::assert_eq!(response.status(), StatusCode::FORBIDDEN);
		}

		Ok(())
	}

	#[tokio::test]
	async fn missing_session_is_not_found() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let browser = Browser::signed_in(state, testing::ADMIN)?;
		let response = testing::router(state)
			.oneshot(browser.request("GET", "/Admin/EditSession?id=2").body(Body::empty())?)
			.await?;

		testing::assert_eq!(response.status(), StatusCode::NOT_FOUND);

		Ok(())
	}

	#[tokio::test]
	async fn invalid_submission_is_shown_again() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let browser = Browser::signed_in(state, testing::ADMIN)?;

		Mock::given(method("PUT"))
			.respond_with(ResponseTemplate::new(204))
			.expect(0)
			.mount(&server)
			.await;

		let response = testing::router(state)
			.oneshot(post_form(
				&browser,
				"/Admin/EditSession",
				"id=1&conference_id=7&title=&abstract=Still+here&start_time=2026-11-02T09%3A00&end_time=2026-11-02T08%3A00",
			)?)
			.await?;

		testing::assert_eq!(response.status(), StatusCode::OK);

		let html = testing::body(response).await?;

		testing::assert!(html.contains("The title is required."));
		testing::assert!(html.contains("The end time must not be before the start time."));
		testing::assert!(html.contains("Still here"), "submitted values are kept");

		Ok(())
	}

	#[tokio::test]
	async fn saving_persists_and_flashes_once() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let mut browser = Browser::signed_in(state, testing::ADMIN)?;

		mount_keynote(&server).await;

		Mock::given(method("PUT"))
			.and(path("/api/sessions/1"))
			.and(body_json(json!({
				"id": 1,
				"conferenceId": 7,
				"trackId": 3,
				"title": "Welcome",
				"abstract": "Updated words.",
				"startTime": "2026-11-02T09:00:00Z",
				"endTime": "2026-11-02T09:45:00Z",
			})))
			.respond_with(ResponseTemplate::new(204))
			.expect(1)
			.mount(&server)
			.await;

		let response = testing::router(state)
			.oneshot(post_form(
				&browser,
				"/Admin/EditSession",
				"id=1&conference_id=7&title=Welcome&abstract=Updated+words.&start_time=2026-11-02T09%3A00&end_time=2026-11-02T09%3A45&track_id=3",
			)?)
			.await?;

		testing::assert_eq!(response.status(), StatusCode::SEE_OTHER);
		testing::assert_eq!(testing::location(&response), Some("/Admin/EditSession?id=1"));

		browser.update(&response);

		testing::assert!(browser.has(flash::COOKIE_NAME));

		let mut seen = Vec::new();

		for _ in 0..2 {
			let response = testing::router(state)
				.oneshot(browser.request("GET", "/Admin/EditSession?id=1").body(Body::empty())?)
				.await?;

			testing::assert_eq!(response.status(), StatusCode::OK);

			browser.update(&response);
			seen.push(testing::body(response).await?.contains(SAVED_MESSAGE));
		}

		testing::assert_eq!(seen, [true, false]);

		Ok(())
	}

	#[tokio::test]
	async fn deleting_missing_session_still_flashes() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let mut browser = Browser::signed_in(state, testing::ADMIN)?;

		Mock::given(method("GET"))
			.and(path("/api/sessions/99"))
			.respond_with(ResponseTemplate::new(404))
			.mount(&server)
			.await;

		Mock::given(method("DELETE"))
			.respond_with(ResponseTemplate::new(204))
			.expect(0)
			.mount(&server)
			.await;

		Mock::given(method("GET"))
			.and(path("/api/sessions"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
			.mount(&server)
			.await;

		let response = testing::router(state)
			.oneshot(post_form(&browser, "/Admin/EditSession?handler=Delete&id=99", "")?)
			.await?;

		testing::assert_eq!(response.status(), StatusCode::SEE_OTHER);
		testing::assert_eq!(testing::location(&response), Some("/"));

		browser.update(&response);

		let response = testing::router(state)
			.oneshot(browser.request("GET", "/").body(Body::empty())?)
			.await?;

		testing::assert!(testing::body(response).await?.contains(DELETED_MESSAGE));

		Ok(())
	}

	#[tokio::test]
	async fn deleting_existing_session_calls_api() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let browser = Browser::signed_in(state, testing::ADMIN)?;

		mount_keynote(&server).await;

		Mock::given(method("DELETE"))
			.and(path("/api/sessions/1"))
			.respond_with(ResponseTemplate::new(204))
			.expect(1)
			.mount(&server)
			.await;

		let response = testing::router(state)
			.oneshot(post_form(&browser, "/Admin/EditSession?handler=Delete&id=1", "")?)
			.await?;

		testing::assert_eq!(response.status(), StatusCode::SEE_OTHER);
		testing::assert_eq!(testing::location(&response), Some("/"));

		Ok(())
	}

	#[tokio::test]
	async fn unknown_handler_is_bad_request() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let browser = Browser::signed_in(state, testing::ADMIN)?;
		let response = testing::router(state)
			.oneshot(post_form(&browser, "/Admin/EditSession?handler=Archive&id=1", "")?)
			.await?;

		testing::assert_eq!(response.status(), StatusCode::BAD_REQUEST);

		Ok(())
	}
}
