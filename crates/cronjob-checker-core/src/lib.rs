// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schedule reconciliation for the cronjob checker.
//!
//! This crate answers one question for every scheduled job in scope: did it
//! fire inside the window around its most recent expected run time?
//!
//! - [`schedule`]: cron parsing and previous-occurrence projection
//! - [`window`]: symmetric acceptance windows with exclusive bounds
//! - [`compliance`]: per-job classification and the overall verdict
//! - [`runner`]: one deadline-bounded pass against a [`JobSource`]
//! - [`report`]: delivery of the verdict to a [`ResultSink`]

pub mod compliance;
pub mod error;
pub mod job;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod report;
pub mod runner;
pub mod schedule;
pub mod source;
pub mod window;

pub use compliance::{
	ComplianceAggregator, ComplianceVerdict, JobErrorPolicy, JobEvaluation, OverallResult,
};
pub use error::{CheckError, JobSourceError, Result};
pub use job::{JobDescriptor, Scope};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockJobSource, RecordingSink};
pub use report::{deliver, ResultSink, Verdict};
pub use runner::{CheckRunner, Clock};
pub use schedule::{expected_run_time, validate_cron_expression, CronSchedule};
pub use source::JobSource;
pub use window::{default_window_width, AcceptanceWindow, DEFAULT_WINDOW_SECS};
