//! The session edit form.
//!
//! Browsers submit every field as a string, so [`EditSessionForm`] keeps them that way. This lets
//! an invalid submission be shown back to the user exactly as they typed it, next to the
//! [`FieldErrors`] explaining what is wrong.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::sessions::Session;

/// Maximum number of characters in a session title.
const TITLE_MAX_LEN: usize = 200;

/// Maximum number of characters in a session abstract.
const ABSTRACT_MAX_LEN: usize = 4000;

/// A submitted (or to be submitted) session edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSessionForm {
	/// The session's ID.
	pub id: i32,

	/// The conference the session belongs to.
	pub conference_id: i32,

	/// The session's title.
	#[serde(default)]
	pub title: String,

	/// The session's abstract.
	#[serde(rename = "abstract", default)]
	pub r#abstract: String,

	/// Start time, either RFC 3339 or a `datetime-local` value in UTC.
	#[serde(default)]
	pub start_time: String,

	/// End time, either RFC 3339 or a `datetime-local` value in UTC.
	#[serde(default)]
	pub end_time: String,

	/// The track's ID, if any.
	#[serde(default)]
	pub track_id: String,
}

/// Validation messages, one per field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct FieldErrors {
	pub title: Option<&'static str>,
	pub r#abstract: Option<&'static str>,
	pub start_time: Option<&'static str>,
	pub end_time: Option<&'static str>,
	pub track_id: Option<&'static str>,
}

impl FieldErrors {
	/// Whether there are no errors at all.
	pub const fn is_empty(&self) -> bool {
		self.title.is_none()
			&& self.r#abstract.is_none()
			&& self.start_time.is_none()
			&& self.end_time.is_none()
			&& self.track_id.is_none()
	}
}

impl From<&Session> for EditSessionForm {
	fn from(session: &Session) -> Self {
		Self {
			id: session.id,
			conference_id: session.conference_id,
			title: session.title.clone(),
			r#abstract: session.r#abstract.clone().unwrap_or_default(),
			start_time: session.start_time.map(input_value).unwrap_or_default(),
			end_time: session.end_time.map(input_value).unwrap_or_default(),
			track_id: session
				.track_id
				.map(|track_id| track_id.to_string())
				.unwrap_or_default(),
		}
	}
}

impl EditSessionForm {
	/// Validates the form and turns it into a [`Session`].
	pub fn validate(&self) -> Result<Session, FieldErrors> {
		let mut errors = FieldErrors::default();

		let title = self.title.trim();

		if title.is_empty() {
			errors.title = Some("The title is required.");
		} else if title.chars().count() > TITLE_MAX_LEN {
			errors.title = Some("The title must be at most 200 characters long.");
		}

		let r#abstract = Some(self.r#abstract.trim()).filter(|text| !text.is_empty());

		if r#abstract.is_some_and(|text| text.chars().count() > ABSTRACT_MAX_LEN) {
			errors.r#abstract = Some("The abstract must be at most 4000 characters long.");
		}

		let start_time = parse_time(&self.start_time).unwrap_or_else(|message| {
			errors.start_time = Some(message);
			None
		});

		let end_time = parse_time(&self.end_time).unwrap_or_else(|message| {
			errors.end_time = Some(message);
			None
		});

		if let (Some(start), Some(end)) = (start_time, end_time) {
			if end < start {
				errors.end_time = Some("The end time must not be before the start time.");
			}
		}

		let track_id = match self.track_id.trim() {
			"" => None,
			track_id => track_id.parse::<i32>().map(Some).unwrap_or_else(|_| {
				errors.track_id = Some("The track must be a number.");
				None
			}),
		};

		if !errors.is_empty() {
			tracing::debug!(?errors, "session form is invalid");
			return Err(errors);
		}

		Ok(Session {
			id: self.id,
			conference_id: self.conference_id,
			track_id,
			title: title.to_owned(),
			r#abstract: r#abstract.map(ToOwned::to_owned),
			start_time,
			end_time,
		})
	}
}

/// Parses an optional timestamp.
///
/// Accepts RFC 3339, and the `YYYY-MM-DDTHH:MM[:SS]` values produced by `datetime-local` inputs,
/// which are taken to be UTC.
fn parse_time(value: &str) -> Result<Option<OffsetDateTime>, &'static str> {
	let value = value.trim();

	if value.is_empty() {
		return Ok(None);
	}

	if let Ok(time) = OffsetDateTime::parse(value, &Rfc3339) {
		return Ok(Some(time));
	}

	PrimitiveDateTime::parse(value, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
		.or_else(|_| {
			PrimitiveDateTime::parse(
				value,
				format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
			)
		})
		.map(|time| Some(time.assume_utc()))
		.map_err(|_| "Please enter a valid date and time.")
}

/// Formats a timestamp as a `datetime-local` input value, in UTC.
fn input_value(time: OffsetDateTime) -> String {
	let time = time.to_offset(UtcOffset::UTC);

	time.format(format_description!("[year]-[month]-[day]T[hour]:[minute]"))
		.unwrap_or_else(|_| time.to_string())
}
