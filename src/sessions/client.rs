//! HTTP client for the backend API that owns conference sessions.

use derive_more::Debug;
use reqwest::{Response, StatusCode};
use url::Url;

use super::Session;
use crate::{Error, Result};

/// A client for the `/api/sessions` endpoints of the backend API.
#[derive(Debug, Clone)]
pub struct ApiClient {
	/// The underlying HTTP client.
	#[debug(skip)]
	http_client: reqwest::Client,

	/// Base URL of the backend API, always ending in `/`.
	#[debug("{}", base_url.as_str())]
	base_url: Url,
}

impl ApiClient {
	/// Creates a new [`ApiClient`].
	pub fn new(http_client: reqwest::Client, mut base_url: Url) -> Self {
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());
			base_url.set_path(&path);
		}

		Self {
			http_client,
			base_url,
		}
	}

	/// Builds the URL for a path relative to the API's base URL.
	fn url(&self, path: &str) -> Result<Url> {
		self.base_url
			.join(path)
			.map_err(|err| Error::logic("failed to build backend url").context(err))
	}

	/// Fetches all sessions.
	#[tracing::instrument(level = "debug", name = "api::get_sessions", skip(self), err(level = "debug"))]
	pub async fn get_sessions(&self) -> Result<Vec<Session>> {
		let response = self
			.http_client
			.get(self.url("api/sessions")?)
			.send()
			.await
			.map_err(Error::external_api_call)?;

		ensure_success(response, "fetching sessions")
			.await?
			.json::<Vec<Session>>()
			.await
			.map_err(Error::external_api_call)
	}

	/// Fetches a single session.
	///
	/// Returns [`None`] if the API does not know about a session with the given ID.
	#[tracing::instrument(level = "debug", name = "api::get_session", skip(self), err(level = "debug"))]
	pub async fn get_session(&self, id: i32) -> Result<Option<Session>> {
		let response = self
			.http_client
			.get(self.url(&format!("api/sessions/{id}"))?)
			.send()
			.await
			.map_err(Error::external_api_call)?;

		if response.status() == StatusCode::NOT_FOUND {
			tracing::debug!("session does not exist");
			return Ok(None);
		}

		ensure_success(response, "fetching session")
			.await?
			.json::<Session>()
			.await
			.map(Some)
			.map_err(Error::external_api_call)
	}

	/// Replaces a session.
	#[tracing::instrument(level = "debug", name = "api::put_session", skip_all, fields(
		session.id = session.id,
	), err(level = "debug"))]
	pub async fn put_session(&self, session: &Session) -> Result<()> {
		let response = self
			.http_client
			.put(self.url(&format!("api/sessions/{}", session.id))?)
			.json(session)
			.send()
			.await
			.map_err(Error::external_api_call)?;

		ensure_success(response, "updating session").await?;

		tracing::debug!("updated session");

		Ok(())
	}

	/// Deletes a session.
	///
	/// A session that is already gone counts as deleted.
	#[tracing::instrument(level = "debug", name = "api::delete_session", skip(self), err(level = "debug"))]
	pub async fn delete_session(&self, id: i32) -> Result<()> {
		let response = self
			.http_client
			.delete(self.url(&format!("api/sessions/{id}"))?)
			.send()
			.await
			.map_err(Error::external_api_call)?;

		if response.status() == StatusCode::NOT_FOUND {
			tracing::debug!("session was already deleted");
			return Ok(());
		}

		ensure_success(response, "deleting session").await?;

		tracing::debug!("deleted session");

		Ok(())
	}
}

/// Turns unsuccessful responses into errors.
async fn ensure_success(response: Response, what: &'static str) -> Result<Response> {
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let body = response.text().await.ok();

	tracing::warn!(%status, ?body, "{what} failed");

	Err(Error::external_api_status(status).context(format!("{what} failed: {body:?}")))
}
