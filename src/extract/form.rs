//! This module contains the [`Form`] extractor, a wrapper around [`axum::Form`] with a custom
//! rejection.

use axum::extract::FromRequest;

use crate::Error;

/// An extractor for `application/x-www-form-urlencoded` request bodies.
///
/// This wraps [`axum::Form`] exactly, but rejects with [`Error`].
///
/// [`Error`]: struct@Error
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(Error))]
pub struct Form<T>(pub T);
