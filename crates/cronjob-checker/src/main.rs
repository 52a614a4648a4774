// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Kuberhealthy check that verifies CronJobs fire inside their schedule
//! window.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use cronjob_checker_config::CheckerConfig;
use cronjob_checker_core::{CheckRunner, ComplianceAggregator};
use cronjob_checker_k8s::KubeJobSource;
use cronjob_checker_report::{KuberhealthyClient, ReportError};
use tokio::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod check;

/// Cronjob checker - verifies CronJobs run on schedule.
#[derive(Parser, Debug)]
#[command(
	name = "cronjob-checker",
	about = "Kuberhealthy check verifying CronJobs run on schedule",
	version
)]
struct Args {
	/// Path to a TOML config file
	#[arg(long, env = "CRONJOB_CHECKER_CONFIG")]
	config: Option<PathBuf>,

	/// Subcommands for cronjob-checker (e.g., `version`)
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("cronjob-checker version: {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	dotenvy::dotenv().ok();

	// Only used to derive the time limit from the run deadline. Schedules are
	// projected against the time the job list arrives.
	let loaded_at = chrono::Utc::now();

	let config = match cronjob_checker_config::load_config(args.config, loaded_at) {
		Ok(config) => config,
		Err(err) => {
			init_tracing(cronjob_checker_config::layer::DEFAULT_LOG_LEVEL);
			let client = client_from_env()?;
			check::report_fatal(&client, &err).await?;
			return Ok(());
		}
	};

	init_tracing(&config.log_level);

	tracing::info!(
		scope = %config.scope,
		time_limit_secs = config.check_time_limit.as_secs(),
		"starting cronjob-checker"
	);

	// The endpoint wait and the check pass share one budget.
	let deadline = Instant::now() + config.check_time_limit;

	let client = build_client(&config)?;
	if let Err(err) = client.wait_for_endpoint(remaining_budget(deadline)).await {
		tracing::warn!(error = %err, "Kuberhealthy endpoint not reachable yet, continuing");
	}

	let source = match KubeJobSource::try_default().await {
		Ok(source) => source,
		Err(err) => {
			check::report_fatal(&client, &err).await?;
			return Ok(());
		}
	};

	let aggregator = ComplianceAggregator::new(config.scope.clone())
		.with_window_width(config.window_width)
		.with_policy(config.error_policy);
	let runner = CheckRunner::new(source, aggregator, remaining_budget(deadline));

	check::check_and_report(&runner, &client).await?;

	tracing::info!("cronjob-checker finished");
	Ok(())
}

/// Time left before `deadline`, zero once it has passed.
fn remaining_budget(deadline: Instant) -> Duration {
	deadline.saturating_duration_since(Instant::now())
}

fn init_tracing(level: &str) {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| level.to_string().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();
}

fn build_client(config: &CheckerConfig) -> Result<KuberhealthyClient, ReportError> {
	let mut builder =
		KuberhealthyClient::builder().reporting_url(config.reporting_url.clone().unwrap_or_default());
	if let Some(uuid) = &config.run_uuid {
		builder = builder.run_uuid(uuid);
	}
	builder.build()
}

/// Reporting client from the raw Kuberhealthy variables, for when the rest
/// of the configuration could not be loaded.
fn client_from_env() -> Result<KuberhealthyClient, ReportError> {
	let mut builder = KuberhealthyClient::builder()
		.reporting_url(std::env::var("KH_REPORTING_URL").unwrap_or_default());
	if let Ok(uuid) = std::env::var("KH_RUN_UUID") {
		builder = builder.run_uuid(uuid);
	}
	builder.build()
}
