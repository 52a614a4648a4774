// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for cronjob checks.

use thiserror::Error;

/// Result type for check operations.
pub type Result<T> = std::result::Result<T, CheckError>;

/// Errors that end or disturb a check cycle.
#[derive(Debug, Error)]
pub enum CheckError {
	#[error("invalid cron expression '{expression}': {message}")]
	InvalidCronExpression { expression: String, message: String },

	#[error("invalid time zone: {0}")]
	InvalidTimezone(String),

	#[error("cron schedule '{expression}' has no run at or before {before}")]
	NoPreviousRun { expression: String, before: String },

	#[error("failed to fetch cronjobs: {0}")]
	ListJobs(#[source] JobSourceError),

	#[error("cronjob {namespace}/{name} has an invalid schedule: {source}")]
	InvalidSchedule {
		namespace: String,
		name: String,
		#[source]
		source: Box<CheckError>,
	},

	#[error("check deadline exceeded after evaluating {evaluated} cronjob(s)")]
	DeadlineExceeded { evaluated: usize },
}

/// Errors returned by a [`crate::JobSource`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobSourceError {
	#[error("cronjob {namespace}/{name} not found")]
	NotFound { namespace: String, name: String },

	#[error("job source API error: {message}")]
	Api { message: String },
}
