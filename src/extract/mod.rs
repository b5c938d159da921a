//! Custom [extractors].
//!
//! These wrap axum's own extractors exactly, but reject requests with our own [`Error`] type,
//! so that failures produce the same response body as every other error.
//!
//! [extractors]: axum::extract
//! [`Error`]: struct@crate::Error

mod query;
pub use query::Query;

mod form;
pub use form::Form;
