// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the cronjob checker.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. Environment variables, including the ones Kuberhealthy injects into
//!    check pods (`KH_REPORTING_URL`, `KH_RUN_UUID`, `KH_CHECK_RUN_DEADLINE`)
//!
//! # Usage
//!
//! ```ignore
//! use cronjob_checker_config::load_config;
//!
//! let config = load_config(None, chrono::Utc::now())?;
//! println!("checking {}", config.scope);
//! ```

pub mod error;
pub mod layer;
pub mod sources;

pub use error::ConfigError;
pub use layer::{
	derive_time_limit, CheckerConfig, CheckerConfigLayer, DEFAULT_CHECK_TIME_LIMIT_SECS,
};
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Load configuration from defaults, the optional file at `config_path`, and
/// the process environment. The check time limit is derived relative to
/// `now`.
pub fn load_config(
	config_path: Option<PathBuf>,
	now: DateTime<Utc>,
) -> Result<CheckerConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> =
		vec![Box::new(DefaultsSource), Box::new(EnvSource::new())];
	if let Some(path) = config_path {
		sources.push(Box::new(TomlSource::new(path)));
	}

	load_from_sources(sources, now)
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
	now: DateTime<Utc>,
) -> Result<CheckerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = CheckerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	let config = merged.finalize_at(now)?;

	info!(
		scope = %config.scope,
		check_time_limit_secs = config.check_time_limit.as_secs(),
		window_secs = config.window_width.num_seconds(),
		error_policy = %config.error_policy,
		reporting_configured = config.reporting_url.is_some(),
		"Checker configuration loaded"
	);

	Ok(config)
}
