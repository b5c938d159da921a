//! Everything related to authentication.
//!
//! Users sign in with an external identity provider (see [`providers`]). Once they come back,
//! they get an encrypted [session] cookie that identifies them on every subsequent request.
//!
//! [session]: session

use axum::{routing, Router};

use crate::AppState;

pub mod session;

#[doc(inline)]
pub use session::Session;

mod user;

#[doc(inline)]
pub use user::User;

mod scheme;

#[doc(inline)]
pub use scheme::{AuthenticationScheme, Schemes};

pub mod providers;
pub mod correlation;
pub mod handlers;

/// Returns a router with routes for signing in and out.
pub fn router(state: &'static AppState) -> Router {
	Router::new()
		.route("/Login", routing::get(handlers::login_page).post(handlers::login))
		.route("/signin/:scheme", routing::get(handlers::callback))
		.route("/account/logout", routing::post(handlers::logout))
		.with_state(state)
}
