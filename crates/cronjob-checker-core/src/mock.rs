// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory collaborators for exercising checks without a cluster.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::JobSourceError;
use crate::job::{JobDescriptor, Scope};
use crate::report::{ResultSink, Verdict};
use crate::source::JobSource;

/// A [`JobSource`] serving a fixed snapshot.
///
/// `get_job` returns the listed descriptor unless an override was
/// configured for that job. Every `get_job` call is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockJobSource {
	jobs: Vec<JobDescriptor>,
	overrides: HashMap<(String, String), Result<JobDescriptor, JobSourceError>>,
	list_error: Option<JobSourceError>,
	delay: Option<Duration>,
	list_delay: Option<Duration>,
	fetched: Arc<Mutex<Vec<String>>>,
}

impl MockJobSource {
	pub fn new(jobs: Vec<JobDescriptor>) -> Self {
		Self {
			jobs,
			..Self::default()
		}
	}

	/// Make `list_jobs` fail.
	pub fn with_list_error(mut self, err: JobSourceError) -> Self {
		self.list_error = Some(err);
		self
	}

	/// Return `result` from `get_job` for this job instead of the listed one.
	pub fn with_get_result(
		mut self,
		namespace: &str,
		name: &str,
		result: Result<JobDescriptor, JobSourceError>,
	) -> Self {
		self
			.overrides
			.insert((namespace.to_string(), name.to_string()), result);
		self
	}

	/// Sleep before answering every `get_job`.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	/// Sleep before answering `list_jobs`.
	pub fn with_list_delay(mut self, delay: Duration) -> Self {
		self.list_delay = Some(delay);
		self
	}

	/// `namespace/name` of every job fetched so far, in call order.
	pub fn fetched(&self) -> Vec<String> {
		self.fetched.lock().unwrap().clone()
	}
}

#[async_trait]
impl JobSource for MockJobSource {
	async fn list_jobs(&self, scope: &Scope) -> Result<Vec<JobDescriptor>, JobSourceError> {
		if let Some(delay) = self.list_delay {
			tokio::time::sleep(delay).await;
		}
		if let Some(err) = &self.list_error {
			return Err(err.clone());
		}
		Ok(
			self
				.jobs
				.iter()
				.filter(|job| scope.namespace().map_or(true, |ns| job.namespace == ns))
				.cloned()
				.collect(),
		)
	}

	async fn get_job(&self, namespace: &str, name: &str) -> Result<JobDescriptor, JobSourceError> {
		self
			.fetched
			.lock()
			.unwrap()
			.push(format!("{namespace}/{name}"));

		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}

		if let Some(result) = self
			.overrides
			.get(&(namespace.to_string(), name.to_string()))
		{
			return result.clone();
		}

		self
			.jobs
			.iter()
			.find(|job| job.namespace == namespace && job.name == name)
			.cloned()
			.ok_or_else(|| JobSourceError::NotFound {
				namespace: namespace.to_string(),
				name: name.to_string(),
			})
	}
}

/// A [`ResultSink`] that records every verdict it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
	reports: Arc<Mutex<Vec<Verdict>>>,
}

impl RecordingSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn reports(&self) -> Vec<Verdict> {
		self.reports.lock().unwrap().clone()
	}
}

#[async_trait]
impl ResultSink for RecordingSink {
	type Error = Infallible;

	async fn report_success(&self) -> Result<(), Self::Error> {
		self.reports.lock().unwrap().push(Verdict::Pass);
		Ok(())
	}

	async fn report_failure(&self, reasons: &[String]) -> Result<(), Self::Error> {
		self
			.reports
			.lock()
			.unwrap()
			.push(Verdict::Fail(reasons.to_vec()));
		Ok(())
	}
}
