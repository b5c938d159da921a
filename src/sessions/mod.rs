//! Conference sessions.
//!
//! Sessions are owned by the backend API; this module contains the [`ApiClient`] talking to it
//! and the public pages listing them.

use axum::{routing, Router};

use crate::AppState;

mod models;
pub use models::{Session, SessionView};

mod client;
pub use client::ApiClient;

pub mod handlers;

/// Returns a router with the public session pages.
pub fn router(state: &'static AppState) -> Router {
	Router::new()
		.route("/", routing::get(handlers::index))
		.route("/Session", routing::get(handlers::details))
		.with_state(state)
}
