// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One check run, from job listing to the delivered verdict.

use std::fmt::Display;

use cronjob_checker_core::{deliver, CheckRunner, JobSource, ResultSink, Verdict};
use tracing::{error, info};

/// Run one compliance pass and deliver exactly one verdict to `sink`.
///
/// Schedules are projected against the runner's clock, read once the job
/// list has arrived. Errors from the pass become a failing verdict; only a
/// failure to deliver is returned.
pub async fn check_and_report<S, R>(runner: &CheckRunner<S>, sink: &R) -> Result<Verdict, R::Error>
where
	S: JobSource,
	R: ResultSink,
{
	let verdict = match runner.run_now().await {
		Ok(result) => {
			info!(
				compliant = result.compliant_count,
				non_compliant = result.non_compliant_count,
				skipped = result.skipped_count,
				"Cronjob check complete"
			);
			Verdict::from(&result)
		}
		Err(err) => {
			error!(error = %err, "Cronjob check failed");
			Verdict::from_error(&err)
		}
	};

	deliver(sink, &verdict).await?;
	Ok(verdict)
}

/// Deliver a failure for an error that stopped the check before it ran.
pub async fn report_fatal<R>(sink: &R, err: &impl Display) -> Result<(), R::Error>
where
	R: ResultSink,
{
	error!(error = %err, "Cronjob check could not start");
	deliver(sink, &Verdict::from_error(err)).await
}
