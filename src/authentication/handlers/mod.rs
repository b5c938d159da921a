//! Handlers for signing in and out.

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::http::uri::PathAndQuery;
use axum::http::HeaderValue;
use axum::response::{Html, Redirect};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use url::Url;

use super::correlation::Correlation;
use super::{AuthenticationScheme, Session};
use crate::extract::{Form, Query};
use crate::flash::Flash;
use crate::pages::Page;
use crate::{AppState, Error, Result};

/// Query parameters for the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
	/// Where the user wants to be redirected to after the login process is done.
	redirect_to: Option<String>,
}

/// Content of the login page.
#[derive(Debug, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct LoginPage {
	schemes: Vec<AuthenticationScheme>,
	redirect_to: String,
}

/// Show one login button per configured authentication scheme.
#[tracing::instrument(skip(state, session, flash))]
pub async fn login_page(
	State(state): State<&'static AppState>,
	session: Option<Session>,
	flash: Flash,
	Query(LoginParams { redirect_to }): Query<LoginParams>,
) -> Result<(Option<Session>, Flash, Html<String>)> {
	let user = session.as_ref().map(|session| session.user());
	let (flash, message) = flash.take();
	let content = LoginPage {
		schemes: state.schemes.all(),
		redirect_to: local_path(redirect_to),
	};

	let page = Page::new("Sign in", content)
		.user(user, state.admin_policy.evaluate(user))
		.flash(message);

	let html = state.pages.render("login", &page)?;

	Ok((session, flash, html))
}

/// Form submitted by a login button.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
	/// The name of the chosen scheme.
	scheme: String,

	/// Where to go after signing in.
	#[serde(default)]
	redirect_to: Option<String>,
}

/// Challenge the chosen authentication scheme.
///
/// This will redirect to the identity provider, and after the user signed in there, they will be
/// sent back to `/signin/{scheme}`, and then to wherever `redirect_to` points.
#[tracing::instrument(skip(state, jar))]
pub async fn login(
	State(state): State<&'static AppState>,
	jar: PrivateCookieJar,
	Form(LoginForm {
		scheme,
		redirect_to,
	}): Form<LoginForm>,
) -> Result<(PrivateCookieJar, Redirect)> {
	let provider = state
		.schemes
		.get(&scheme)
		.ok_or_else(|| Error::unknown_scheme(&scheme))?;

	let correlation = Correlation::new(&scheme, local_path(redirect_to));
	let callback = callback_url(&state.config.public_url, &scheme)?;
	let url = provider.challenge_url(&callback, &correlation.state, &correlation.code_challenge());
	let jar = correlation.store(jar)?;

	tracing::debug!(%url, "challenging scheme");

	Ok((jar, Redirect::to(url.as_str())))
}

/// Query parameters an identity provider sends back.
#[derive(Debug, Deserialize)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct CallbackParams {
	code: Option<String>,
	state: Option<String>,
	error: Option<String>,
}

/// The callback endpoint that will be hit by identity providers after a login attempt.
#[tracing::instrument(skip(state, jar, params), fields(user = tracing::field::Empty))]
pub async fn callback(
	State(state): State<&'static AppState>,
	jar: PrivateCookieJar,
	Path(scheme): Path<String>,
	Query(params): Query<CallbackParams>,
) -> Result<(Session, Redirect)> {
	let (jar, correlation) = Correlation::take(jar);

	if let Some(error) = params.error {
		return Err(Error::unauthorized().context(format!("`{scheme}` reported `{error}`")));
	}

	let correlation = correlation
		.ok_or_else(|| Error::unauthorized().context("missing correlation cookie"))?;

	let (Some(code), Some(returned_state)) = (params.code, params.state) else {
		return Err(Error::unauthorized().context("callback without `code` or `state`"));
	};

	correlation.verify(&scheme, &returned_state)?;

	let provider = state
		.schemes
		.get(&scheme)
		.ok_or_else(|| Error::unknown_scheme(&scheme))?;

	let callback = callback_url(&state.config.public_url, &scheme)?;
	let user = provider
		.resolve_callback(&state.http_client, &callback, &code, &correlation.code_verifier)
		.await?;

	tracing::Span::current().record("user", user.username());
	tracing::info!(target: "conference_planner::audit_log", %scheme, "user signed in");

	let session = Session::create(user, jar)?;

	Ok((session, Redirect::to(&correlation.redirect_to)))
}

/// Sign out again.
///
/// This removes the session cookie, whether or not there was a valid session.
#[tracing::instrument(skip_all)]
pub async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, Redirect) {
	tracing::debug!("user signed out");

	(Session::clear(jar), Redirect::to("/"))
}

/// The URL a provider sends users back to after a challenge of `scheme`.
fn callback_url(public_url: &Url, scheme: &str) -> Result<Url> {
	public_url
		.join(&format!("/signin/{scheme}"))
		.map_err(|err| Error::logic("failed to build callback url").context(err))
}

/// Only allows redirects to paths on this site.
///
/// The result always fits into a `Location` header.
fn local_path(redirect_to: Option<String>) -> String {
	redirect_to
		.filter(|path| path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\"))
		.filter(|path| !path.chars().any(char::is_control))
		.filter(|path| HeaderValue::from_str(path).is_ok() && PathAndQuery::from_str(path).is_ok())
		.unwrap_or_else(|| String::from("/"))
}

#[cfg(test)]
mod tests {
	use axum::body::Body;
	use axum::http::{header, StatusCode};
	use serde_json::json;
	use tower::ServiceExt;
	use wiremock::matchers::{body_string_contains, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;
	use crate::authentication::correlation;
	use crate::authentication::session::COOKIE_NAME;
	use crate::testing::{self, Browser};

	/// Posts the login form and returns the browser holding the correlation cookie, together
	/// with the provider URL it was redirected to.
	async fn challenge(
		state: &'static AppState,
		form: &'static str,
	) -> color_eyre::Result<(Browser, Url)> {
		let mut browser = Browser::default();
		let response = testing::router(state)
			.oneshot(
				browser
					.request("POST", "/Login")
					.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
					.body(Body::from(form))?,
			)
			.await?;

		testing::assert_eq!(response.status(), StatusCode::SEE_OTHER);

		let location = testing::location(&response)
			.map(Url::parse)
			.transpose()?
			.ok_or_else(|| color_eyre::eyre::eyre!("challenge without location"))?;

		browser.update(&response);

		Ok((browser, location))
	}

	fn query_param(url: &Url, key: &str) -> Option<String> {
		url.query_pairs()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.into_owned())
	}

	#[tokio::test]
	async fn login_page_has_one_button_per_scheme() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let response = testing::router(state)
			.oneshot(Browser::default().request("GET", "/Login").body(Body::empty())?)
			.await?;

		testing::assert_eq!(response.status(), StatusCode::OK);

		let html = testing::body(response).await?;

		testing::assert_eq!(html.matches(r#"name="scheme""#).count(), 2);
		testing::assert!(html.contains(r#"value="twitter">Twitter</button>"#));
		testing::assert!(html.contains(r#"value="google">Google</button>"#));
		testing::assert!(
			html.find("Twitter</button>") < html.find("Google</button>"),
			"buttons are rendered in configuration order",
		);

		Ok(())
	}

	#[tokio::test]
	async fn unknown_scheme_is_bad_request() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let response = testing::router(state)
			.oneshot(
				Browser::default()
					.request("POST", "/Login")
					.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
					.body(Body::from("scheme=myspace"))?,
			)
			.await?;

		testing::assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		testing::assert!(testing::location(&response).is_none());

		Ok(())
	}

	#[tokio::test]
	async fn known_scheme_redirects_to_provider() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let (browser, location) = challenge(state, "scheme=google&redirect_to=%2FSession%3Fid%3D1").await?;

		testing::assert_eq!(location.path(), "/google/authorize");
		testing::assert_eq!(
			query_param(&location, "redirect_uri").as_deref(),
			Some("http://planner.test/signin/google"),
		);
		testing::assert!(query_param(&location, "state").is_some());
		testing::assert!(browser.has(correlation::COOKIE_NAME));
		testing::assert!(!browser.has(COOKIE_NAME));

		Ok(())
	}

	/// Mounts a Twitter provider that accepts exactly one sign-in with `code=the-code`.
	async fn twitter(server: &MockServer) {
		Mock::given(method("POST"))
			.and(path("/twitter/token"))
			.and(body_string_contains("code=the-code"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "abc" })))
			.expect(1)
			.mount(server)
			.await;

		Mock::given(method("GET"))
			.and(path("/twitter/me"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"data": { "username": testing::ADMIN, "name": "Jane Doe" }
			})))
			.expect(1)
			.mount(server)
			.await;
	}

	/// Completes the provider round trip started by [`challenge()`].
	async fn sign_in(
		state: &'static AppState,
		browser: &Browser,
		location: &Url,
	) -> color_eyre::Result<axum::response::Response> {
		let csrf = query_param(location, "state").unwrap_or_default();
		let response = testing::router(state)
			.oneshot(
				browser
					.request("GET", &format!("/signin/twitter?code=the-code&state={csrf}"))
					.body(Body::empty())?,
			)
			.await?;

		Ok(response)
	}

	#[tokio::test]
	async fn successful_callback_signs_in() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;

		twitter(&server).await;

		let (mut browser, location) =
			challenge(state, "scheme=twitter&redirect_to=%2FSession%3Fid%3D1").await?;

		let response = sign_in(state, &browser, &location).await?;

		testing::assert_eq!(response.status(), StatusCode::SEE_OTHER);
		testing::assert_eq!(testing::location(&response), Some("/Session?id=1"));

		browser.update(&response);

		testing::assert!(browser.has(COOKIE_NAME));
		testing::assert!(!browser.has(correlation::COOKIE_NAME), "correlations are single use");

		Ok(())
	}

	#[tokio::test]
	async fn header_breaking_redirect_falls_back_to_root() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;

		twitter(&server).await;

		let (mut browser, location) =
			challenge(state, "scheme=twitter&redirect_to=%2F%0ASet-Cookie%3A+x%3D1").await?;

		let response = sign_in(state, &browser, &location).await?;

		testing::assert_eq!(response.status(), StatusCode::SEE_OTHER);
		testing::assert_eq!(testing::location(&response), Some("/"));

		browser.update(&response);

		testing::assert!(browser.has(COOKIE_NAME));
		testing::assert!(!browser.has("x"));

		Ok(())
	}

	#[tokio::test]
	async fn callback_with_foreign_state_is_rejected() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;

		Mock::given(method("POST"))
			.and(path("/twitter/token"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "abc" })))
			.expect(0)
			.mount(&server)
			.await;

		let (browser, _) = challenge(state, "scheme=twitter").await?;

		for uri in [
			"/signin/twitter?code=the-code&state=forged",
			"/signin/google?code=the-code&state=forged",
			"/signin/twitter?error=access_denied",
		] {
			let response = testing::router(state)
				.oneshot(browser.request("GET", uri).body(Body::empty())?)
				.await?;

			testing::assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		}

		let response = testing::router(state)
			.oneshot(
				Browser::default()
					.request("GET", "/signin/twitter?code=the-code&state=whatever")
					.body(Body::empty())?,
			)
			.await?;

		testing::assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

		Ok(())
	}

	#[tokio::test]
	async fn logging_out_twice_is_harmless() -> color_eyre::Result<()> {
		let server = MockServer::start().await;
		let state = testing::state(&server.uri(), &server.uri())?;
		let mut browser = Browser::signed_in(state, testing::ADMIN)?;

		for _ in 0..2 {
			let response = testing::router(state)
				.oneshot(browser.request("POST", "/account/logout").body(Body::empty())?)
				.await?;

			testing::assert_eq!(response.status(), StatusCode::SEE_OTHER);
			testing::assert_eq!(testing::location(&response), Some("/"));

			browser.update(&response);

			testing::assert!(!browser.has(COOKIE_NAME));
		}

		Ok(())
	}

	#[test]
	fn only_local_redirects_are_allowed() -> color_eyre::Result<()> {
		testing::assert_eq!(local_path(None), "/");
		testing::assert_eq!(local_path(Some(String::from("/Admin/EditSession?id=1"))), "/Admin/EditSession?id=1");
		testing::assert_eq!(local_path(Some(String::from("https://evil.example"))), "/");
		testing::assert_eq!(local_path(Some(String::from("//evil.example"))), "/");
		testing::assert_eq!(local_path(Some(String::from("/\\evil.example"))), "/");
		testing::assert_eq!(local_path(Some(String::new())), "/");
		testing::assert_eq!(local_path(Some(String::from("/\nSet-Cookie: x=1"))), "/");
		testing::assert_eq!(local_path(Some(String::from("/Session\r\n?id=1"))), "/");
		testing::assert_eq!(local_path(Some(String::from("/Session?id=1\u{7f}"))), "/");
		testing::assert_eq!(local_path(Some(String::from("/Sessi\u{f6}n"))), "/");

		Ok(())
	}

	#[test]
	fn callback_urls_are_absolute() -> color_eyre::Result<()> {
		let public_url = Url::parse("https://planner.example.org")?;

		testing::assert_eq!(
			callback_url(&public_url, "twitter")?.as_str(),
			"https://planner.example.org/signin/twitter",
		);

		Ok(())
	}
}
