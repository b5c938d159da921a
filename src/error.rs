//! Runtime errors.
//!
//! This module exposes the [`Error`] type that is used across the code base for bubbling up
//! errors. Any foreign errors that can occur at runtime can be turned into an [`Error`]. Specific
//! error cases have dedicated constructors, see all the public methods on [`Error`].
//!
//! [`Error`] implements [`IntoResponse`], which means it can be returned from HTTP handlers,
//! middleware, etc.
//!
//! This module also exposes a [`Result`] type alias, which sets [`Error`] as the default `E` type
//! parameter.
//!
//! [`Error`]: struct@Error

use std::fmt::{self, Formatter};
use std::panic::Location;

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use derive_more::Display;
use itertools::Itertools;
use serde_json::json;
use thiserror::Error;

/// Type alias for a [`Result<T, E>`] with its `E` parameter set to [`Error`].
///
/// [`Result`]: std::result::Result
/// [`Error`]: struct@Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The application's core error type.
///
/// Any errors that ever reach the outside should be this type.
/// It carries information about the kind of error that occurred, where it occurred, and any extra
/// information like error sources or debug messages.
#[derive(Debug, Error)]
pub struct Error {
	/// The kind of error that occurred.
	///
	/// This is used for determining the HTTP status code and error message for the response
	/// body, when an error is returned from a request.
	kind: ErrorKind,

	/// The source code location of where the error occurred.
	location: Location<'static>,

	/// Extra information about the error, like source errors or debug messages.
	attachments: Vec<Attachment>,
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let Self {
			kind,
			location,
			attachments,
		} = self;

		write!(f, "[{location}] {kind}")?;

		if !attachments.is_empty() {
			write!(f, ":")?;

			for attachment in attachments.iter().rev() {
				write!(f, "\n  - {attachment}")?;
			}
		}

		Ok(())
	}
}

/// The different kinds of errors that can occur at runtime.
#[allow(clippy::missing_docs_in_private_items)]
#[derive(Debug, Error)]
enum ErrorKind {
	#[error("could not find {what}")]
	NotFound { what: String },

	#[error("invalid {what}")]
	InvalidInput { what: String },

	#[error("unknown authentication scheme `{scheme}`")]
	UnknownScheme { scheme: String },

	#[error("you are not logged in")]
	MissingSession,

	#[error("you are not permitted to perform this action")]
	Unauthorized,

	#[error("you do not satisfy the `{policy}` policy")]
	Forbidden { policy: &'static str },

	#[error("logic assertion failed: {0}")]
	Logic(String),

	#[error("failed to render page")]
	Render(#[from] handlebars::RenderError),

	#[error("internal server error")]
	Reqwest(reqwest::Error),

	#[error("external api call failed: {0}")]
	ExternalApiCall(reqwest::Error),

	#[error("external api responded with {status}")]
	ExternalApiStatus { status: reqwest::StatusCode },

	#[error(transparent)]
	Query(#[from] QueryRejection),

	#[error(transparent)]
	Form(#[from] FormRejection),
}

#[allow(clippy::missing_docs_in_private_items)]
type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Generic error attachments.
#[derive(Debug, Display)]
#[display("'{context}' at {location}")]
struct Attachment {
	/// The attachment context.
	///
	/// This could be a more concrete error type, e.g. from a third party crate, or simply an
	/// error message.
	context: BoxedError,

	/// The source code location of where this attachment was created.
	location: Location<'static>,
}

impl Attachment {
	/// Creates a new [`Attachment`].
	#[track_caller]
	fn new<C>(context: C) -> Self
	where
		C: Into<BoxedError>,
	{
		Self {
			context: context.into(),
			location: *Location::caller(),
		}
	}
}

impl Error {
	/// Creates a new [`Error`] of the given [`ErrorKind`].
	///
	/// [`Error`]: struct@Error
	#[track_caller]
	fn new<E>(kind: E) -> Self
	where
		E: Into<ErrorKind>,
	{
		Self {
			kind: kind.into(),
			location: *Location::caller(),
			attachments: Vec::new(),
		}
	}

	/// Attach additional context to an error.
	///
	/// This can be another, more concrete, error type, or simply an error message.
	/// If `ctx` is also an [`Error`], it will have its attachments transferred to `self`.
	///
	/// [`Error`]: struct@Error
	#[track_caller]
	pub(crate) fn context<E>(mut self, ctx: E) -> Self
	where
		E: Into<BoxedError>,
	{
		match Into::<BoxedError>::into(ctx).downcast::<Self>() {
			Ok(mut err) => {
				self.attachments.append(&mut err.attachments);
				self.attachments.push(Attachment::new(err.kind));
			}
			Err(other) => {
				self.attachments.push(Attachment::new(other));
			}
		}

		self
	}

	/// An error signaling that a resource could not be found.
	///
	/// Produces a `404 Not Found` status.
	#[track_caller]
	pub(crate) fn not_found<T>(what: T) -> Self
	where
		T: Display,
	{
		Self::new(ErrorKind::NotFound {
			what: what.to_string(),
		})
	}

	/// An error signaling invalid user input.
	///
	/// Produces a `400 Bad Request` status.
	#[track_caller]
	pub(crate) fn invalid<T>(what: T) -> Self
	where
		T: Display,
	{
		Self::new(ErrorKind::InvalidInput {
			what: what.to_string(),
		})
	}

	/// An error signaling that the user picked an authentication scheme which is not
	/// configured.
	///
	/// Produces a `400 Bad Request` status.
	#[track_caller]
	pub(crate) fn unknown_scheme<T>(scheme: T) -> Self
	where
		T: Display,
	{
		Self::new(ErrorKind::UnknownScheme {
			scheme: scheme.to_string(),
		})
	}

	/// An error signaling a missing, expired, or otherwise unreadable session cookie.
	///
	/// For more information about session authentication, see
	/// [`crate::authentication::session`].
	///
	/// Produces a `401 Unauthorized` status.
	#[track_caller]
	pub(crate) fn missing_session() -> Self {
		Self::new(ErrorKind::MissingSession)
	}

	/// A generic `401 Unauthorized` error.
	///
	/// If you can, you should [attach additional context][context] to such an error to make
	/// debugging the cause of the error easier later.
	///
	/// [context]: Error::context()
	#[track_caller]
	pub(crate) fn unauthorized() -> Self {
		Self::new(ErrorKind::Unauthorized)
	}

	/// An error signaling that an authenticated user failed an authorization policy.
	///
	/// Produces a `403 Forbidden` status.
	#[track_caller]
	pub(crate) fn forbidden(policy: &'static str) -> Self {
		Self::new(ErrorKind::Forbidden { policy })
	}

	/// A generic `500 Internal Server Error`.
	///
	/// This constructor is reserved for errors that _should not_ occur, but _may_ occur. If
	/// such an error is ever returned, that's a bug.
	#[track_caller]
	pub(crate) fn logic<T>(message: T) -> Self
	where
		T: Display,
	{
		Self::new(ErrorKind::Logic(message.to_string()))
	}

	/// An error that can occur when making HTTP requests to external APIs such as the backend
	/// API or an identity provider.
	///
	/// Produces a `502 Bad Gateway` status.
	#[track_caller]
	pub(crate) fn external_api_call(source: reqwest::Error) -> Self {
		Self::new(ErrorKind::ExternalApiCall(source))
	}

	/// An external API answered, but not with a status we know how to handle.
	///
	/// Produces a `502 Bad Gateway` status.
	#[track_caller]
	pub(crate) fn external_api_status(status: reqwest::StatusCode) -> Self {
		Self::new(ErrorKind::ExternalApiStatus { status })
	}

	/// Whether this error was caused by a missing session.
	///
	/// Guards use this to decide between sending the user to the login page and rejecting the
	/// request outright.
	pub(crate) const fn is_missing_session(&self) -> bool {
		matches!(self.kind, ErrorKind::MissingSession)
	}

	/// The HTTP status code this error will produce.
	pub fn status(&self) -> StatusCode {
		use ErrorKind as E;

		match self.kind {
			E::InvalidInput { .. } | E::UnknownScheme { .. } => StatusCode::BAD_REQUEST,
			E::MissingSession | E::Unauthorized => StatusCode::UNAUTHORIZED,
			E::Forbidden { .. } => StatusCode::FORBIDDEN,
			E::NotFound { .. } => StatusCode::NOT_FOUND,
			E::Logic(_) | E::Render(_) | E::Reqwest(_) => StatusCode::INTERNAL_SERVER_ERROR,
			E::ExternalApiCall(_) | E::ExternalApiStatus { .. } => StatusCode::BAD_GATEWAY,
			E::Query(ref rej) => rej.status(),
			E::Form(ref rej) => rej.status(),
		}
	}
}

impl IntoResponse for Error {
	#[track_caller]
	fn into_response(self) -> Response {
		let message = self.kind.to_string();
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(?self, "internal server error occurred");
		} else {
			tracing::debug! {
				location = %self.location,
				kind = ?self.kind,
				attachments = ?self.attachments,
				error_message = %message,
				"returning error from request handler"
			};
		}

		let mut json = json!({ "message": message });

		#[allow(clippy::indexing_slicing)]
		if !self.attachments.is_empty() && cfg!(not(feature = "production")) {
			json["debug_info"] = self
				.attachments
				.iter()
				.rev()
				.map(|attachment| format!("{attachment}"))
				.collect_vec()
				.into();
		}

		(status, Json(json)).into_response()
	}
}

impl From<reqwest::Error> for Error {
	#[track_caller]
	fn from(error: reqwest::Error) -> Self {
		if error.is_connect()
			|| error.is_timeout()
			|| matches!(error.status(), Some(status) if status.is_server_error())
		{
			Self::new(ErrorKind::ExternalApiCall(error))
		} else {
			Self::new(ErrorKind::Reqwest(error))
		}
	}
}

impl From<handlebars::RenderError> for Error {
	#[track_caller]
	fn from(error: handlebars::RenderError) -> Self {
		Self::new(error)
	}
}

impl From<QueryRejection> for Error {
	#[track_caller]
	fn from(rejection: QueryRejection) -> Self {
		Self::new(rejection)
	}
}

impl From<FormRejection> for Error {
	#[track_caller]
	fn from(rejection: FormRejection) -> Self {
		Self::new(rejection)
	}
}
