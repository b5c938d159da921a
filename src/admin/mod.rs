//! Pages that require the "Admin" policy.
//!
//! Every route in [`router()`] is wrapped in [`guard::require_admin()`], so no handler in here
//! ever runs for anyone else.

use axum::{middleware, routing, Router};

use crate::AppState;

mod form;
pub use form::{EditSessionForm, FieldErrors};

pub mod guard;
pub mod edit_session;

/// Returns a router with routes for `/Admin`.
pub fn router(state: &'static AppState) -> Router {
	Router::new()
		.route(
			"/Admin/EditSession",
			routing::get(edit_session::view).post(edit_session::submit),
		)
		.route_layer(middleware::from_fn_with_state(state, guard::require_admin))
		.with_state(state)
}
