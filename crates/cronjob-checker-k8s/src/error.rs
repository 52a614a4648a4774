// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use cronjob_checker_core::JobSourceError;
use thiserror::Error;

/// Result type alias for K8s operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur during K8s operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("CronJob not found: {namespace}/{name}")]
	CronJobNotFound { namespace: String, name: String },

	#[error("Failed to create K8s client: {message}")]
	ClientInit { message: String },
}

impl K8sError {
	/// Map a `kube` error for a single CronJob, recognising 404s.
	pub(crate) fn for_cronjob(err: kube::Error, namespace: &str, name: &str) -> Self {
		match err {
			kube::Error::Api(response) if response.code == 404 => K8sError::CronJobNotFound {
				namespace: namespace.to_string(),
				name: name.to_string(),
			},
			other => other.into(),
		}
	}
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}

impl From<K8sError> for JobSourceError {
	fn from(err: K8sError) -> Self {
		match err {
			K8sError::CronJobNotFound { namespace, name } => JobSourceError::NotFound { namespace, name },
			other => JobSourceError::Api {
				message: other.to_string(),
			},
		}
	}
}
