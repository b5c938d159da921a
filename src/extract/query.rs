//! This module contains the [`Query`] extractor, a wrapper around [`axum::extract::Query`] with
//! a custom rejection.

use axum::extract::FromRequestParts;

use crate::Error;

/// An extractor for URI query parameters.
///
/// This wraps [`axum::extract::Query`] exactly, but rejects with [`Error`].
///
/// [`Error`]: struct@Error
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct Query<T>(pub T);
