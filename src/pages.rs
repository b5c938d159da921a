//! HTML pages.
//!
//! Every page is a [handlebars] template embedded into the binary. Pages share a `layout`
//! partial, which renders the title, the signed-in user, and the pending flash message. All of
//! those live in [`Page`], which wraps the page specific content.

use axum::response::Html;
use derive_more::Debug;
use handlebars::{Handlebars, TemplateError};
use serde::Serialize;

use crate::authentication::User;
use crate::Result;

/// The templates this application can render, as `(name, source)` pairs.
const TEMPLATES: [(&str, &str); 4] = [
	("index", include_str!("../templates/index.hbs")),
	("session", include_str!("../templates/session.hbs")),
	("login", include_str!("../templates/login.hbs")),
	("edit_session", include_str!("../templates/edit_session.hbs")),
];

/// The template registry.
#[derive(Debug)]
pub struct Pages {
	/// Registered templates.
	#[debug(skip)]
	registry: Handlebars<'static>,
}

impl Pages {
	/// Registers all templates.
	pub fn new() -> Result<Self, TemplateError> {
		let mut registry = Handlebars::new();

		registry.register_partial("layout", include_str!("../templates/layout.hbs"))?;

		for (name, source) in TEMPLATES {
			registry.register_template_string(name, source)?;
		}

		Ok(Self { registry })
	}

	/// Renders the template called `name`.
	#[tracing::instrument(level = "trace", skip(self, page), err(level = "debug"))]
	pub fn render<T>(&self, name: &'static str, page: &Page<'_, T>) -> Result<Html<String>>
	where
		T: Serialize,
	{
		Ok(Html(self.registry.render(name, page)?))
	}
}

/// Data available to every page.
#[derive(Debug, Serialize)]
pub struct Page<'a, T> {
	/// The page title.
	title: &'a str,

	/// The signed-in user, if any.
	user: Option<CurrentUser<'a>>,

	/// A message left by the previous request.
	flash: Option<String>,

	/// Page specific data.
	#[serde(flatten)]
	content: T,
}

/// The signed-in user, as shown in the page header.
#[derive(Debug, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct CurrentUser<'a> {
	username: &'a str,
	display_name: &'a str,
	is_admin: bool,
}

impl<'a, T> Page<'a, T> {
	/// Creates a new [`Page`] for an anonymous user without a flash message.
	pub const fn new(title: &'a str, content: T) -> Self {
		Self {
			title,
			user: None,
			flash: None,
			content,
		}
	}

	/// Sets the signed-in user.
	pub fn user(self, user: Option<&'a User>, is_admin: bool) -> Self {
		Self {
			user: user.map(|user| CurrentUser {
				username: user.username(),
				display_name: user.display_name(),
				is_admin,
			}),
			..self
		}
	}

	/// Sets the flash message.
	pub fn flash(self, flash: Option<String>) -> Self {
		Self { flash, ..self }
	}
}
