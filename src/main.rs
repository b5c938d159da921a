//! The conference planner's front end.

use anyhow::Context;
use conference_planner::Config;

mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	if let Err(error) = dotenvy::dotenv() {
		eprintln!("WARNING: no `.env` file found ({error})");
	}

	let config = Config::new().context("load config")?;
	let _guard = logging::init(config.log_dir.as_deref()).context("initialize logging")?;

	if cfg!(not(feature = "production")) {
		tracing::warn!("running in development mode");
	}

	tracing::debug!(?config, "loaded configuration");

	conference_planner::run(config).await
}
