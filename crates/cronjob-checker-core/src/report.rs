// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of the check verdict.

use std::fmt::Display;

use async_trait::async_trait;
use tracing::info;

use crate::compliance::OverallResult;

/// The single verdict a check run delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
	Pass,
	Fail(Vec<String>),
}

impl Verdict {
	/// A failing verdict carrying one error message.
	pub fn from_error(err: &impl Display) -> Self {
		Verdict::Fail(vec![err.to_string()])
	}

	pub fn is_pass(&self) -> bool {
		matches!(self, Verdict::Pass)
	}
}

impl From<&OverallResult> for Verdict {
	fn from(result: &OverallResult) -> Self {
		if result.is_success() {
			Verdict::Pass
		} else {
			Verdict::Fail(result.failure_messages.clone())
		}
	}
}

/// Where check verdicts are sent.
#[async_trait]
pub trait ResultSink: Send + Sync {
	type Error: std::error::Error + Send + Sync + 'static;

	async fn report_success(&self) -> Result<(), Self::Error>;

	async fn report_failure(&self, reasons: &[String]) -> Result<(), Self::Error>;
}

/// Send `verdict` to `sink`, invoking exactly one sink operation.
pub async fn deliver<S>(sink: &S, verdict: &Verdict) -> Result<(), S::Error>
where
	S: ResultSink + ?Sized,
{
	match verdict {
		Verdict::Pass => {
			sink.report_success().await?;
			info!("Successfully reported success");
		}
		Verdict::Fail(reasons) => {
			sink.report_failure(reasons).await?;
			info!(reasons = reasons.len(), "Successfully reported failure");
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::compliance::ComplianceAggregator;
	use crate::error::CheckError;
	use crate::job::{JobDescriptor, Scope};
	use crate::mock::RecordingSink;
	use chrono::{TimeZone, Utc};

	#[test]
	fn test_verdict_from_results() {
		let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 3, 0).unwrap();
		let aggregator = ComplianceAggregator::new(Scope::All);

		let passing = aggregator.evaluate(&[], now).unwrap();
		assert_eq!(Verdict::from(&passing), Verdict::Pass);

		let late = JobDescriptor::new("batch", "report", "0 * * * *")
			.with_last_observed_run(Utc.with_ymd_and_hms(2024, 1, 1, 11, 40, 0).unwrap());
		let failing = aggregator.evaluate(&[late], now).unwrap();
		match Verdict::from(&failing) {
			Verdict::Fail(reasons) => assert_eq!(reasons, failing.failure_messages),
			Verdict::Pass => panic!("expected failure"),
		}
	}

	#[test]
	fn test_verdict_from_error() {
		let verdict = Verdict::from_error(&CheckError::DeadlineExceeded { evaluated: 3 });
		assert_eq!(
			verdict,
			Verdict::Fail(vec![
				"check deadline exceeded after evaluating 3 cronjob(s)".to_string()
			])
		);
		assert!(!verdict.is_pass());
	}

	#[tokio::test]
	async fn test_deliver_invokes_one_operation() {
		let sink = RecordingSink::new();
		deliver(&sink, &Verdict::Pass).await.unwrap();
		assert_eq!(sink.reports(), vec![Verdict::Pass]);

		let sink = RecordingSink::new();
		let failure = Verdict::Fail(vec!["broken".to_string()]);
		deliver(&sink, &failure).await.unwrap();
		assert_eq!(sink.reports(), vec![failure]);
	}
}
