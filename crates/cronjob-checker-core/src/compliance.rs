// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-job compliance classification and the overall verdict.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{CheckError, JobSourceError, Result};
use crate::job::{JobDescriptor, Scope};
use crate::schedule::CronSchedule;
use crate::window::{default_window_width, AcceptanceWindow};

/// How errors attributable to a single job are classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobErrorPolicy {
	/// An invalid schedule aborts the whole check; a failed status fetch
	/// skips the job.
	#[default]
	FailFast,
	/// Every per-job error is logged and the job is skipped.
	Skip,
	/// Every per-job error marks the job non-compliant.
	Escalate,
}

impl fmt::Display for JobErrorPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			JobErrorPolicy::FailFast => write!(f, "fail-fast"),
			JobErrorPolicy::Skip => write!(f, "skip"),
			JobErrorPolicy::Escalate => write!(f, "escalate"),
		}
	}
}

impl FromStr for JobErrorPolicy {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"fail-fast" | "fail_fast" | "failfast" => Ok(Self::FailFast),
			"skip" => Ok(Self::Skip),
			"escalate" => Ok(Self::Escalate),
			_ => Err(format!("unknown job error policy: {s}")),
		}
	}
}

/// Classification of one job in one check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceVerdict {
	/// Last run fell inside the acceptance window.
	Compliant,
	/// Last run fell outside the acceptance window.
	NonCompliant,
	/// Not evaluated: never scheduled, suspended, or unavailable.
	Skipped,
}

/// The outcome of evaluating one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobEvaluation {
	pub namespace: String,
	pub name: String,
	pub verdict: ComplianceVerdict,
	pub expected_run: Option<DateTime<Utc>>,
	pub window: Option<AcceptanceWindow>,
	pub last_observed_run: Option<DateTime<Utc>>,
	/// Human-readable explanation of the verdict.
	pub detail: String,
}

impl JobEvaluation {
	fn skipped(job: &JobDescriptor, detail: String) -> Self {
		Self {
			namespace: job.namespace.clone(),
			name: job.name.clone(),
			verdict: ComplianceVerdict::Skipped,
			expected_run: None,
			window: None,
			last_observed_run: job.last_observed_run,
			detail,
		}
	}

	fn escalated(job: &JobDescriptor, detail: String) -> Self {
		Self {
			verdict: ComplianceVerdict::NonCompliant,
			..Self::skipped(job, detail)
		}
	}
}

/// Aggregate result of one check cycle.
#[derive(Debug, Clone, Serialize)]
pub struct OverallResult {
	pub scope: Scope,
	pub compliant_count: usize,
	pub non_compliant_count: usize,
	pub skipped_count: usize,
	pub evaluations: Vec<JobEvaluation>,
	/// Summary first, then one entry per non-compliant job. Empty on success.
	pub failure_messages: Vec<String>,
}

impl OverallResult {
	/// The check passes unless at least one evaluated job is non-compliant.
	pub fn is_success(&self) -> bool {
		self.non_compliant_count == 0
	}
}

/// Classifies jobs against their schedules and folds the results.
#[derive(Debug, Clone)]
pub struct ComplianceAggregator {
	scope: Scope,
	window_width: Duration,
	policy: JobErrorPolicy,
}

impl ComplianceAggregator {
	pub fn new(scope: Scope) -> Self {
		Self {
			scope,
			window_width: default_window_width(),
			policy: JobErrorPolicy::default(),
		}
	}

	pub fn with_window_width(mut self, width: Duration) -> Self {
		self.window_width = width;
		self
	}

	pub fn with_policy(mut self, policy: JobErrorPolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn scope(&self) -> &Scope {
		&self.scope
	}

	pub fn policy(&self) -> JobErrorPolicy {
		self.policy
	}

	/// Evaluate a snapshot of jobs against `reference_now`.
	///
	/// Jobs are evaluated in order; a job listed twice is evaluated once.
	///
	/// # Errors
	///
	/// Under [`JobErrorPolicy::FailFast`], the first job with an invalid
	/// schedule aborts the evaluation with [`CheckError::InvalidSchedule`].
	pub fn evaluate(
		&self,
		jobs: &[JobDescriptor],
		reference_now: DateTime<Utc>,
	) -> Result<OverallResult> {
		let mut seen = HashSet::new();
		let mut evaluations = Vec::with_capacity(jobs.len());

		for job in jobs {
			if !seen.insert((job.namespace.as_str(), job.name.as_str())) {
				debug!(cronjob = %job.qualified_name(), "Cronjob listed twice, ignoring duplicate");
				continue;
			}
			evaluations.push(self.classify(job, reference_now)?);
		}

		Ok(self.summarize(evaluations))
	}

	/// Classify a single job.
	pub fn classify(
		&self,
		job: &JobDescriptor,
		reference_now: DateTime<Utc>,
	) -> Result<JobEvaluation> {
		if job.suspended {
			debug!(cronjob = %job.qualified_name(), "Cronjob is suspended, skipping");
			return Ok(JobEvaluation::skipped(
				job,
				format!("cronjob {} is suspended", job.qualified_name()),
			));
		}

		let Some(observed) = job.last_observed_run else {
			debug!(cronjob = %job.qualified_name(), "Cronjob has never been scheduled, skipping");
			return Ok(JobEvaluation::skipped(
				job,
				format!("cronjob {} has never been scheduled", job.qualified_name()),
			));
		};

		let expected = match CronSchedule::parse(&job.schedule, job.time_zone.as_deref())
			.and_then(|schedule| schedule.expected_run_time(reference_now))
		{
			Ok(expected) => expected,
			Err(err) => return self.schedule_failed(job, err),
		};

		let window = AcceptanceWindow::around(expected, self.window_width);

		info!(
			cronjob = %job.qualified_name(),
			last_scheduled = %observed.to_rfc3339(),
			expected_run = %expected.to_rfc3339(),
			"Cronjob was last scheduled"
		);

		let (verdict, detail) = if window.contains(observed) {
			info!(cronjob = %job.qualified_name(), "Cronjob is scheduling correctly");
			(
				ComplianceVerdict::Compliant,
				format!("cronjob {} is scheduling correctly", job.qualified_name()),
			)
		} else {
			warn!(
				cronjob = %job.qualified_name(),
				window = %window,
				"Cronjob has not scheduled a job in scheduled window"
			);
			(
				ComplianceVerdict::NonCompliant,
				format!(
					"cronjob {} was last scheduled at {}, outside the window {} around its expected run at {}",
					job.qualified_name(),
					observed.to_rfc3339(),
					window,
					expected.to_rfc3339()
				),
			)
		};

		Ok(JobEvaluation {
			namespace: job.namespace.clone(),
			name: job.name.clone(),
			verdict,
			expected_run: Some(expected),
			window: Some(window),
			last_observed_run: Some(observed),
			detail,
		})
	}

	/// Classify a job whose current status could not be fetched.
	pub fn fetch_failed(&self, job: &JobDescriptor, err: &JobSourceError) -> JobEvaluation {
		let detail = format!(
			"failed to retrieve status of cronjob {}: {err}",
			job.qualified_name()
		);

		match self.policy {
			JobErrorPolicy::FailFast | JobErrorPolicy::Skip => {
				error!(cronjob = %job.qualified_name(), error = %err, "Error retrieving cronjob status");
				JobEvaluation::skipped(job, detail)
			}
			JobErrorPolicy::Escalate => {
				error!(
					cronjob = %job.qualified_name(),
					error = %err,
					"Error retrieving cronjob status, counting as non-compliant"
				);
				JobEvaluation::escalated(job, detail)
			}
		}
	}

	fn schedule_failed(&self, job: &JobDescriptor, err: CheckError) -> Result<JobEvaluation> {
		match self.policy {
			JobErrorPolicy::FailFast => Err(CheckError::InvalidSchedule {
				namespace: job.namespace.clone(),
				name: job.name.clone(),
				source: Box::new(err),
			}),
			JobErrorPolicy::Skip => {
				warn!(cronjob = %job.qualified_name(), error = %err, "Cronjob schedule is invalid, skipping");
				Ok(JobEvaluation::skipped(
					job,
					format!("cronjob {} has an invalid schedule: {err}", job.qualified_name()),
				))
			}
			JobErrorPolicy::Escalate => {
				error!(
					cronjob = %job.qualified_name(),
					error = %err,
					"Cronjob schedule is invalid, counting as non-compliant"
				);
				Ok(JobEvaluation::escalated(
					job,
					format!("cronjob {} has an invalid schedule: {err}", job.qualified_name()),
				))
			}
		}
	}

	/// Fold per-job evaluations into the overall result.
	pub fn summarize(&self, evaluations: Vec<JobEvaluation>) -> OverallResult {
		let count = |verdict: ComplianceVerdict| evaluations.iter().filter(|e| e.verdict == verdict).count();
		let compliant_count = count(ComplianceVerdict::Compliant);
		let non_compliant_count = count(ComplianceVerdict::NonCompliant);
		let skipped_count = count(ComplianceVerdict::Skipped);

		let failure_messages = if non_compliant_count > 0 {
			let summary = format!(
				"There were {non_compliant_count} cronjob(s) that had a last schedule time outside of scheduled window in {}",
				self.scope
			);
			std::iter::once(summary)
				.chain(
					evaluations
						.iter()
						.filter(|e| e.verdict == ComplianceVerdict::NonCompliant)
						.map(|e| e.detail.clone()),
				)
				.collect()
		} else {
			info!(scope = %self.scope, "All cronjobs scheduled jobs in schedule window");
			Vec::new()
		};

		debug!(
			compliant = compliant_count,
			non_compliant = non_compliant_count,
			skipped = skipped_count,
			"Cronjob compliance summary"
		);

		OverallResult {
			scope: self.scope.clone(),
			compliant_count,
			non_compliant_count,
			skipped_count,
			evaluations,
			failure_messages,
		}
	}
}
