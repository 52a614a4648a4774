// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One check cycle against a live job source.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::compliance::{ComplianceAggregator, OverallResult};
use crate::error::{CheckError, Result};
use crate::source::JobSource;

/// Source of the reference instant schedules are projected against.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Runs a single sequential compliance pass under a deadline.
pub struct CheckRunner<S> {
	source: S,
	aggregator: ComplianceAggregator,
	time_limit: Duration,
	clock: Clock,
}

impl<S: JobSource> CheckRunner<S> {
	pub fn new(source: S, aggregator: ComplianceAggregator, time_limit: Duration) -> Self {
		Self {
			source,
			aggregator,
			time_limit,
			clock: Arc::new(Utc::now),
		}
	}

	/// Replace the wall clock read by [`CheckRunner::run_now`].
	pub fn with_clock(mut self, clock: Clock) -> Self {
		self.clock = clock;
		self
	}

	pub fn source(&self) -> &S {
		&self.source
	}

	/// Like [`CheckRunner::run`], reading the reference instant from the
	/// clock once the job list has been fetched.
	pub async fn run_now(&self) -> Result<OverallResult> {
		self
			.pass(|| {
				let now = (self.clock)();
				debug!(reference_now = %now.to_rfc3339(), "Read reference time");
				now
			})
			.await
	}

	/// List jobs in scope, re-fetch each one that has run, and classify it
	/// against `reference_now`.
	///
	/// Jobs that have never been scheduled or are suspended are classified
	/// from the listing without a re-fetch.
	///
	/// # Errors
	///
	/// - [`CheckError::ListJobs`] if the job list cannot be fetched
	/// - [`CheckError::DeadlineExceeded`] if the time limit elapses during any
	///   source call; the pass stops there
	/// - [`CheckError::InvalidSchedule`] under the fail-fast policy
	pub async fn run(&self, reference_now: DateTime<Utc>) -> Result<OverallResult> {
		self.pass(|| reference_now).await
	}

	async fn pass(&self, reference_now: impl FnOnce() -> DateTime<Utc>) -> Result<OverallResult> {
		let deadline = Instant::now() + self.time_limit;
		let scope = self.aggregator.scope();

		info!(scope = %scope, "Fetching cronjobs");
		let jobs = match timeout_at(deadline, self.source.list_jobs(scope)).await {
			Ok(Ok(jobs)) => jobs,
			Ok(Err(err)) => return Err(CheckError::ListJobs(err)),
			Err(_) => {
				warn!(scope = %scope, "Check deadline exceeded while listing cronjobs");
				return Err(CheckError::DeadlineExceeded { evaluated: 0 });
			}
		};
		info!(count = jobs.len(), scope = %scope, "Found cronjob(s)");

		let reference_now = reference_now();
		let mut seen = HashSet::new();
		let mut evaluations = Vec::with_capacity(jobs.len());

		for listed in &jobs {
			if !seen.insert((listed.namespace.as_str(), listed.name.as_str())) {
				continue;
			}

			if listed.last_observed_run.is_none() || listed.suspended {
				evaluations.push(self.aggregator.classify(listed, reference_now)?);
				continue;
			}

			let fetch = self.source.get_job(&listed.namespace, &listed.name);
			let current = match timeout_at(deadline, fetch).await {
				Ok(Ok(current)) => current,
				Ok(Err(err)) => {
					evaluations.push(self.aggregator.fetch_failed(listed, &err));
					continue;
				}
				Err(_) => {
					warn!(
						cronjob = %listed.qualified_name(),
						evaluated = evaluations.len(),
						"Check deadline exceeded while retrieving cronjob status"
					);
					return Err(CheckError::DeadlineExceeded {
						evaluated: evaluations.len(),
					});
				}
			};

			evaluations.push(self.aggregator.classify(&current, reference_now)?);
		}

		Ok(self.aggregator.summarize(evaluations))
	}
}
