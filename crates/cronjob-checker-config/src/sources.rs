// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use cronjob_checker_core::JobErrorPolicy;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::CheckerConfigLayer;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<CheckerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<CheckerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(CheckerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<CheckerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(CheckerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: CheckerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Reads the variables Kuberhealthy injects into check pods (`KH_*`,
/// `NAMESPACE`) plus the checker's own settings.
pub struct EnvSource {
	lookup: fn(&str) -> Option<String>,
}

impl EnvSource {
	pub fn new() -> Self {
		Self {
			lookup: |name| std::env::var(name).ok(),
		}
	}

	/// Read variables through `lookup` instead of the process environment.
	pub fn with_lookup(lookup: fn(&str) -> Option<String>) -> Self {
		Self { lookup }
	}

	fn var(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn u64(&self, name: &str) -> Result<Option<u64>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid u64 value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn i64(&self, name: &str) -> Result<Option<i64>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid i64 value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn policy(&self, name: &str) -> Result<Option<JobErrorPolicy>, ConfigError> {
		match self.var(name) {
			Some(v) => v
				.parse()
				.map(Some)
				.map_err(|message| ConfigError::InvalidValue {
					key: name.to_string(),
					message,
				}),
			None => Ok(None),
		}
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<CheckerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(CheckerConfigLayer {
			// An empty NAMESPACE selects every namespace, so it is kept as set.
			namespace: (self.lookup)("NAMESPACE"),
			check_time_limit_secs: self.u64("CHECK_TIME_LIMIT_SECS")?,
			run_deadline_unix: self.i64("KH_CHECK_RUN_DEADLINE")?,
			window_secs: self.u64("SCHEDULE_WINDOW_SECS")?,
			error_policy: self.policy("JOB_ERROR_POLICY")?,
			reporting_url: self.var("KH_REPORTING_URL"),
			run_uuid: self.var("KH_RUN_UUID"),
			log_level: self.var("LOG_LEVEL"),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert_eq!(layer, CheckerConfigLayer::default());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let source = TomlSource::new("/nonexistent/cronjob-checker.toml");
		let layer = source.load().unwrap();
		assert!(layer.namespace.is_none());
	}

	#[test]
	fn test_toml_source_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "namespace = \"batch\"\nwindow_secs = 120").unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.namespace.as_deref(), Some("batch"));
		assert_eq!(layer.window_secs, Some(120));
	}

	#[test]
	fn test_toml_source_parse_error() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "window_secs = \"ten minutes\"").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_source_reads_kuberhealthy_variables() {
		let source = EnvSource::with_lookup(|name| match name {
			"NAMESPACE" => Some("batch".to_string()),
			"KH_CHECK_RUN_DEADLINE" => Some("1704110400".to_string()),
			"KH_REPORTING_URL" => Some("http://kh/check".to_string()),
			"KH_RUN_UUID" => Some("run-1".to_string()),
			"JOB_ERROR_POLICY" => Some("escalate".to_string()),
			_ => None,
		});
		let layer = source.load().unwrap();
		assert_eq!(layer.namespace.as_deref(), Some("batch"));
		assert_eq!(layer.run_deadline_unix, Some(1_704_110_400));
		assert_eq!(layer.reporting_url.as_deref(), Some("http://kh/check"));
		assert_eq!(layer.run_uuid.as_deref(), Some("run-1"));
		assert_eq!(layer.error_policy, Some(JobErrorPolicy::Escalate));
		assert!(layer.window_secs.is_none());
	}

	#[test]
	fn test_env_source_empty_namespace_is_kept() {
		let source = EnvSource::with_lookup(|name| match name {
			"NAMESPACE" => Some(String::new()),
			_ => None,
		});
		assert_eq!(source.load().unwrap().namespace.as_deref(), Some(""));
	}

	#[test]
	fn test_env_source_invalid_number() {
		let source = EnvSource::with_lookup(|name| match name {
			"SCHEDULE_WINDOW_SECS" => Some("ten".to_string()),
			_ => None,
		});
		match source.load() {
			Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "SCHEDULE_WINDOW_SECS"),
			other => panic!("expected InvalidValue, got {other:?}"),
		}
	}

	#[test]
	fn test_env_source_invalid_policy() {
		let source = EnvSource::with_lookup(|name| match name {
			"JOB_ERROR_POLICY" => Some("retry".to_string()),
			_ => None,
		});
		assert!(matches!(
			source.load(),
			Err(ConfigError::InvalidValue { .. })
		));
	}
}
