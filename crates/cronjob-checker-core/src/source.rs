// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-only access to scheduled jobs.

use async_trait::async_trait;

use crate::error::JobSourceError;
use crate::job::{JobDescriptor, Scope};

/// A read-only view of the scheduled jobs in a cluster.
#[async_trait]
pub trait JobSource: Send + Sync {
	/// List every job in `scope`.
	async fn list_jobs(&self, scope: &Scope) -> Result<Vec<JobDescriptor>, JobSourceError>;

	/// Fetch the current state of one job. List results can lag behind a
	/// targeted get, so callers re-fetch before evaluating.
	async fn get_job(&self, namespace: &str, name: &str) -> Result<JobDescriptor, JobSourceError>;
}
