//! Types for modeling conference sessions.

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

/// A conference session, as owned by the backend API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
	/// The session's ID.
	pub id: i32,

	/// The conference this session belongs to.
	pub conference_id: i32,

	/// The track this session is part of.
	#[serde(default)]
	pub track_id: Option<i32>,

	/// The session's title.
	pub title: String,

	/// A description of the session.
	#[serde(rename = "abstract", default)]
	pub r#abstract: Option<String>,

	/// When the session starts.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub start_time: Option<OffsetDateTime>,

	/// When the session ends.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub end_time: Option<OffsetDateTime>,
}

/// A [`Session`] prepared for rendering.
#[derive(Debug, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct SessionView<'a> {
	id: i32,
	title: &'a str,
	track_id: Option<i32>,
	r#abstract: Option<&'a str>,
	start_time: Option<String>,
	end_time: Option<String>,
}

impl<'a> From<&'a Session> for SessionView<'a> {
	fn from(session: &'a Session) -> Self {
		Self {
			id: session.id,
			title: &session.title,
			track_id: session.track_id,
			r#abstract: session.r#abstract.as_deref(),
			start_time: session.start_time.and_then(display_time),
			end_time: session.end_time.and_then(display_time),
		}
	}
}

/// Formats a timestamp for display, in UTC.
fn display_time(time: OffsetDateTime) -> Option<String> {
	time.to_offset(time::UtcOffset::UTC)
		.format(format_description!("[year]-[month]-[day] [hour]:[minute] UTC"))
		.inspect_err(|error| tracing::warn!(%error, "failed to format timestamp"))
		.ok()
}
