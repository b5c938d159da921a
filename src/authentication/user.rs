//! Everything related to signed-in users.

use serde::{Deserialize, Serialize};

/// Information about a signed-in user.
///
/// This is what an external identity provider's profile gets mapped into, and what is stored
/// inside the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// The user's name, as reported by the identity provider.
	///
	/// This is what authorization policies compare against.
	username: String,

	/// A human friendly name for display purposes.
	display_name: String,

	/// The authentication scheme the user signed in with.
	scheme: String,
}

impl User {
	/// Creates a new [`User`] object.
	pub fn new<U, D, S>(username: U, display_name: D, scheme: S) -> Self
	where
		U: Into<String>,
		D: Into<String>,
		S: Into<String>,
	{
		Self {
			username: username.into(),
			display_name: display_name.into(),
			scheme: scheme.into(),
		}
	}

	/// Returns the user's username.
	pub fn username(&self) -> &str {
		&self.username
	}

	/// Returns the user's display name.
	pub fn display_name(&self) -> &str {
		&self.display_name
	}

	/// Returns the name of the scheme the user signed in with.
	pub fn scheme(&self) -> &str {
		&self.scheme
	}
}
