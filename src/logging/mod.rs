//! Trace capturing facilities.
//!
//! Logs always go to stderr. If a log directory is configured, they are additionally written to
//! daily rolling files in that directory.

use std::path::Path;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod stderr;
mod files;

/// The filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "conference_planner=info,warn";

/// Keeps the file logging worker alive.
#[derive(Debug)]
#[must_use = "dropping the guard stops file logging"]
pub struct Guard {
	/// The guard returned by [`tracing-appender`]'s logging thread.
	///
	/// [`tracing-appender`]: tracing_appender
	#[allow(dead_code)]
	appender_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initializes [`tracing-subscriber`].
///
/// NOTE: the returned [`Guard`] will perform cleanup for the tracing layer that emits logs to
/// files, which means it has to stay alive until the program exits!
///
/// [`tracing-subscriber`]: tracing_subscriber
pub fn init(log_dir: Option<&Path>) -> anyhow::Result<Guard> {
	let stderr = stderr::layer(filter());
	let (files, appender_guard) = match log_dir {
		None => (None, None),
		Some(log_dir) => {
			let (layer, guard) =
				files::layer(log_dir, filter()).context("initialize files tracing layer")?;

			(Some(layer), Some(guard))
		}
	};

	tracing_subscriber::registry()
		.with(stderr)
		.with(files)
		.try_init()
		.context("install tracing subscriber")?;

	tracing::info!(?log_dir, "initialized tracing");

	Ok(Guard { appender_guard })
}

/// Reads the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
fn filter() -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
