// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for Kuberhealthy reporting.

use thiserror::Error;

/// Result type for reporting operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while reporting to Kuberhealthy.
#[derive(Debug, Error)]
pub enum ReportError {
	#[error("reporting URL is not configured (KH_REPORTING_URL)")]
	MissingReportingUrl,

	#[error("invalid reporting URL '{url}': {message}")]
	InvalidReportingUrl { url: String, message: String },

	#[error("request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	#[error("Kuberhealthy returned {status}: {message}")]
	ServerError { status: u16, message: String },

	#[error("Kuberhealthy endpoint {host} is not reachable")]
	EndpointUnreachable { host: String },
}
