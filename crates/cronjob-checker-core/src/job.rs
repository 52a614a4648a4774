// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job descriptors and query scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scheduled job as observed in the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
	pub name: String,
	pub namespace: String,
	/// Cron expression: "0 * * * *"
	pub schedule: String,
	/// IANA time zone the schedule is interpreted in. `None` means UTC.
	pub time_zone: Option<String>,
	/// Suspended jobs are not expected to fire.
	pub suspended: bool,
	/// Most recent time the job was scheduled. `None` until the first run.
	pub last_observed_run: Option<DateTime<Utc>>,
}

impl JobDescriptor {
	pub fn new(
		namespace: impl Into<String>,
		name: impl Into<String>,
		schedule: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			namespace: namespace.into(),
			schedule: schedule.into(),
			time_zone: None,
			suspended: false,
			last_observed_run: None,
		}
	}

	pub fn with_last_observed_run(mut self, at: DateTime<Utc>) -> Self {
		self.last_observed_run = Some(at);
		self
	}

	pub fn with_time_zone(mut self, tz: impl Into<String>) -> Self {
		self.time_zone = Some(tz.into());
		self
	}

	pub fn suspended(mut self, suspended: bool) -> Self {
		self.suspended = suspended;
		self
	}

	/// `namespace/name`, for log fields and failure details.
	pub fn qualified_name(&self) -> String {
		format!("{}/{}", self.namespace, self.name)
	}
}

/// Which namespaces a check covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
	#[default]
	All,
	Namespace(String),
}

impl Scope {
	/// Build a scope from a namespace setting, where empty means all namespaces.
	pub fn from_namespace(namespace: &str) -> Self {
		if namespace.is_empty() {
			Scope::All
		} else {
			Scope::Namespace(namespace.to_string())
		}
	}

	pub fn namespace(&self) -> Option<&str> {
		match self {
			Scope::All => None,
			Scope::Namespace(ns) => Some(ns),
		}
	}
}

impl fmt::Display for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Scope::All => write!(f, "all namespaces"),
			Scope::Namespace(ns) => write!(f, "namespace {ns}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_namespace_means_all() {
		assert_eq!(Scope::from_namespace(""), Scope::All);
		assert_eq!(
			Scope::from_namespace("batch"),
			Scope::Namespace("batch".to_string())
		);
	}

	#[test]
	fn scope_display_names_the_namespace() {
		assert_eq!(Scope::All.to_string(), "all namespaces");
		assert_eq!(
			Scope::Namespace("batch".to_string()).to_string(),
			"namespace batch"
		);
	}

	#[test]
	fn descriptor_builders() {
		let job = JobDescriptor::new("batch", "nightly", "0 0 * * *")
			.with_time_zone("Europe/Berlin")
			.suspended(true);

		assert_eq!(job.qualified_name(), "batch/nightly");
		assert_eq!(job.time_zone.as_deref(), Some("Europe/Berlin"));
		assert!(job.suspended);
		assert!(job.last_observed_run.is_none());
	}
}
