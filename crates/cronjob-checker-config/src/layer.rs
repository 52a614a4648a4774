// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Checker configuration layer and its resolved form.

use std::time::Duration;

use chrono::{DateTime, Utc};
use cronjob_checker_core::{JobErrorPolicy, Scope, DEFAULT_WINDOW_SECS};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Time limit used when no run deadline is known.
pub const DEFAULT_CHECK_TIME_LIMIT_SECS: u64 = 300;

/// Margin subtracted from the run deadline before halving it.
pub const DEADLINE_MARGIN_SECS: i64 = 5;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// One source's view of the configuration. Unset fields defer to lower
/// precedence sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckerConfigLayer {
	pub namespace: Option<String>,
	pub check_time_limit_secs: Option<u64>,
	pub run_deadline_unix: Option<i64>,
	pub window_secs: Option<u64>,
	pub error_policy: Option<JobErrorPolicy>,
	pub reporting_url: Option<String>,
	pub run_uuid: Option<String>,
	pub log_level: Option<String>,
}

impl CheckerConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.namespace.is_some() {
			self.namespace = other.namespace;
		}
		if other.check_time_limit_secs.is_some() {
			self.check_time_limit_secs = other.check_time_limit_secs;
		}
		if other.run_deadline_unix.is_some() {
			self.run_deadline_unix = other.run_deadline_unix;
		}
		if other.window_secs.is_some() {
			self.window_secs = other.window_secs;
		}
		if other.error_policy.is_some() {
			self.error_policy = other.error_policy;
		}
		if other.reporting_url.is_some() {
			self.reporting_url = other.reporting_url;
		}
		if other.run_uuid.is_some() {
			self.run_uuid = other.run_uuid;
		}
		if other.log_level.is_some() {
			self.log_level = other.log_level;
		}
	}

	/// Resolve the layer, deriving the time limit from the run deadline
	/// relative to `now`.
	pub fn finalize_at(self, now: DateTime<Utc>) -> Result<CheckerConfig, ConfigError> {
		let run_deadline = match self.run_deadline_unix {
			Some(secs) => Some(DateTime::from_timestamp(secs, 0).ok_or_else(|| {
				ConfigError::InvalidValue {
					key: "run_deadline_unix".to_string(),
					message: format!("{secs} is out of range"),
				}
			})?),
			None => None,
		};

		let check_time_limit = match self.check_time_limit_secs {
			Some(0) => {
				return Err(ConfigError::InvalidValue {
					key: "check_time_limit_secs".to_string(),
					message: "must be greater than zero".to_string(),
				})
			}
			Some(secs) => Duration::from_secs(secs),
			None => derive_time_limit(run_deadline, now),
		};

		let window_secs = match self.window_secs {
			Some(0) => {
				return Err(ConfigError::InvalidValue {
					key: "window_secs".to_string(),
					message: "must be greater than zero".to_string(),
				})
			}
			Some(secs) => secs,
			None => DEFAULT_WINDOW_SECS,
		};
		let window_width = i64::try_from(window_secs)
			.ok()
			.and_then(chrono::Duration::try_seconds)
			.ok_or_else(|| ConfigError::InvalidValue {
				key: "window_secs".to_string(),
				message: format!("{window_secs} is out of range"),
			})?;

		Ok(CheckerConfig {
			scope: Scope::from_namespace(self.namespace.as_deref().unwrap_or_default()),
			check_time_limit,
			window_width,
			error_policy: self.error_policy.unwrap_or_default(),
			reporting_url: self.reporting_url.filter(|u| !u.is_empty()),
			run_uuid: self.run_uuid.filter(|u| !u.is_empty()),
			log_level: self
				.log_level
				.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
		})
	}
}

/// Half of what remains before `deadline`, less a safety margin, or the
/// default limit when that is not positive.
pub fn derive_time_limit(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
	let fallback = Duration::from_secs(DEFAULT_CHECK_TIME_LIMIT_SECS);
	let Some(deadline) = deadline else {
		return fallback;
	};

	let remaining = deadline - (now + chrono::Duration::seconds(DEADLINE_MARGIN_SECS));
	if remaining <= chrono::Duration::zero() {
		return fallback;
	}
	(remaining / 2).to_std().unwrap_or(fallback)
}

/// Fully resolved checker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckerConfig {
	pub scope: Scope,
	pub check_time_limit: Duration,
	pub window_width: chrono::Duration,
	pub error_policy: JobErrorPolicy,
	pub reporting_url: Option<String>,
	pub run_uuid: Option<String>,
	pub log_level: String,
}

impl Default for CheckerConfig {
	fn default() -> Self {
		Self {
			scope: Scope::All,
			check_time_limit: Duration::from_secs(DEFAULT_CHECK_TIME_LIMIT_SECS),
			window_width: chrono::Duration::seconds(DEFAULT_WINDOW_SECS as i64),
			error_policy: JobErrorPolicy::FailFast,
			reporting_url: None,
			run_uuid: None,
			log_level: DEFAULT_LOG_LEVEL.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use proptest::prelude::*;

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
	}

	#[test]
	fn test_layer_finalize_defaults() {
		let config = CheckerConfigLayer::default().finalize_at(now()).unwrap();
		assert_eq!(config, CheckerConfig::default());
	}

	#[test]
	fn test_layer_finalize_with_values() {
		let layer = CheckerConfigLayer {
			namespace: Some("batch".to_string()),
			check_time_limit_secs: Some(120),
			window_secs: Some(300),
			error_policy: Some(JobErrorPolicy::Escalate),
			reporting_url: Some("http://kh/check".to_string()),
			run_uuid: Some("run-1".to_string()),
			log_level: Some("debug".to_string()),
			..Default::default()
		};
		let config = layer.finalize_at(now()).unwrap();
		assert_eq!(config.scope, Scope::Namespace("batch".to_string()));
		assert_eq!(config.check_time_limit, Duration::from_secs(120));
		assert_eq!(config.window_width, chrono::Duration::minutes(5));
		assert_eq!(config.error_policy, JobErrorPolicy::Escalate);
		assert_eq!(config.reporting_url.as_deref(), Some("http://kh/check"));
		assert_eq!(config.run_uuid.as_deref(), Some("run-1"));
		assert_eq!(config.log_level, "debug");
	}

	#[test]
	fn test_empty_namespace_means_all() {
		let layer = CheckerConfigLayer {
			namespace: Some(String::new()),
			..Default::default()
		};
		assert_eq!(layer.finalize_at(now()).unwrap().scope, Scope::All);
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = CheckerConfigLayer {
			namespace: Some("batch".to_string()),
			window_secs: Some(600),
			..Default::default()
		};
		let overlay = CheckerConfigLayer {
			namespace: None,
			window_secs: Some(120),
			..Default::default()
		};
		base.merge(overlay);
		assert_eq!(base.namespace.as_deref(), Some("batch"));
		assert_eq!(base.window_secs, Some(120));
	}

	#[test]
	fn test_time_limit_from_deadline() {
		let deadline = now() + chrono::Duration::seconds(605);
		let layer = CheckerConfigLayer {
			run_deadline_unix: Some(deadline.timestamp()),
			..Default::default()
		};
		let config = layer.finalize_at(now()).unwrap();
		assert_eq!(config.check_time_limit, Duration::from_secs(300));
	}

	#[test]
	fn test_past_deadline_falls_back_to_default() {
		let deadline = now() + chrono::Duration::seconds(3);
		let limit = derive_time_limit(Some(deadline), now());
		assert_eq!(limit, Duration::from_secs(DEFAULT_CHECK_TIME_LIMIT_SECS));
	}

	#[test]
	fn test_explicit_time_limit_wins_over_deadline() {
		let layer = CheckerConfigLayer {
			check_time_limit_secs: Some(42),
			run_deadline_unix: Some((now() + chrono::Duration::hours(1)).timestamp()),
			..Default::default()
		};
		let config = layer.finalize_at(now()).unwrap();
		assert_eq!(config.check_time_limit, Duration::from_secs(42));
	}

	#[test]
	fn test_zero_window_rejected() {
		let layer = CheckerConfigLayer {
			window_secs: Some(0),
			..Default::default()
		};
		let err = layer.finalize_at(now()).unwrap_err();
		assert!(err.to_string().contains("window_secs"));
	}

	#[test]
	fn test_huge_window_rejected() {
		for window_secs in [i64::MAX as u64, u64::MAX, i64::MAX as u64 / 999] {
			let layer = CheckerConfigLayer {
				window_secs: Some(window_secs),
				..Default::default()
			};
			match layer.finalize_at(now()) {
				Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "window_secs"),
				other => panic!("expected InvalidValue for {window_secs}, got {other:?}"),
			}
		}
	}

	#[test]
	fn test_zero_time_limit_rejected() {
		let layer = CheckerConfigLayer {
			check_time_limit_secs: Some(0),
			..Default::default()
		};
		assert!(matches!(
			layer.finalize_at(now()),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	#[test]
	fn test_toml_deserialize() {
		let layer: CheckerConfigLayer = toml::from_str(
			r#"
namespace = "batch"
window_secs = 900
error_policy = "skip"
"#,
		)
		.unwrap();
		assert_eq!(layer.namespace.as_deref(), Some("batch"));
		assert_eq!(layer.window_secs, Some(900));
		assert_eq!(layer.error_policy, Some(JobErrorPolicy::Skip));
	}

	proptest! {
		#[test]
		fn derived_limit_leaves_room_before_deadline(offset in 6i64..86_400) {
			let deadline = now() + chrono::Duration::seconds(offset);
			let limit = derive_time_limit(Some(deadline), now());
			let limit = chrono::Duration::from_std(limit).unwrap();
			prop_assert!(now() + limit < deadline);
			prop_assert!(limit * 2 <= deadline - now());
		}
	}
}
