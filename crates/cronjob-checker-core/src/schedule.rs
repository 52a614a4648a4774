// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cron parsing and expected run time projection.
//!
//! Schedules use standard 5-field cron syntax (minute hour day-of-month month
//! day-of-week), interpreted the way the Kubernetes CronJob controller does:
//!
//! - day-of-week is numbered 0-7 with both 0 and 7 meaning Sunday
//! - when both day-of-month and day-of-week are restricted, a day matches if
//!   either field matches
//! - `@hourly`, `@daily` and friends are accepted
//! - a `CRON_TZ=<zone>` or `TZ=<zone>` prefix selects the time zone
//!
//! The `cron` crate does the actual occurrence arithmetic; this module
//! rewrites expressions into its 7-field format first.
//!
//! Expressions that already have 6 or 7 fields (leading seconds, optional
//! trailing year) are handed to the `cron` crate unchanged and follow its
//! dialect instead: numeric day-of-week runs 1-7 with 1 meaning Sunday, and
//! restricted day-of-month and day-of-week must both match.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use crate::error::{CheckError, Result};

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A parsed cron schedule bound to a time zone.
#[derive(Debug, Clone)]
pub struct CronSchedule {
	expression: String,
	timezone: Tz,
	/// One schedule, or two when day-of-month and day-of-week are both
	/// restricted (the schedule fires when either matches).
	variants: Vec<Schedule>,
}

impl CronSchedule {
	/// Parse a cron expression.
	///
	/// `time_zone` takes precedence over a `CRON_TZ=`/`TZ=` prefix in the
	/// expression. Without either, the schedule runs in UTC.
	///
	/// # Errors
	///
	/// Returns [`CheckError::InvalidCronExpression`] for malformed expressions
	/// and [`CheckError::InvalidTimezone`] for unknown zones.
	pub fn parse(expression: &str, time_zone: Option<&str>) -> Result<Self> {
		let (prefix_zone, body) = split_timezone_prefix(expression.trim());

		let timezone = match time_zone.or(prefix_zone) {
			Some(name) => parse_timezone(name)?,
			None => Tz::UTC,
		};

		let body = expand_descriptor(body).map_err(|message| invalid(expression, message))?;
		let variants = build_variants(expression, &body)?;

		Ok(Self {
			expression: expression.to_string(),
			timezone,
			variants,
		})
	}

	/// The expression as originally written.
	pub fn expression(&self) -> &str {
		&self.expression
	}

	/// The time zone occurrences are computed in.
	pub fn timezone(&self) -> Tz {
		self.timezone
	}

	/// The most recent occurrence at or before `now`.
	///
	/// Uses the `cron` crate's reverse iteration, so the cost does not depend
	/// on how often the schedule fires. `None` means the schedule never fired
	/// before `now`.
	pub fn last_at_or_before(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
		// Reverse iteration yields occurrences strictly before the cursor, at
		// whole-second resolution.
		let cursor = (now.trunc_subsecs(0) + Duration::seconds(1)).with_timezone(&self.timezone);

		self
			.variants
			.iter()
			.filter_map(|schedule| schedule.after(&cursor).next_back())
			.map(|occurrence| occurrence.with_timezone(&Utc))
			.filter(|occurrence| *occurrence <= now)
			.max()
	}

	/// The first occurrence strictly after `after`.
	pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
		let local = after.with_timezone(&self.timezone);

		self
			.variants
			.iter()
			.filter_map(|schedule| schedule.after(&local).next())
			.map(|occurrence| occurrence.with_timezone(&Utc))
			.min()
	}

	/// The expected run time relative to `reference_now`.
	///
	/// # Errors
	///
	/// Returns [`CheckError::NoPreviousRun`] if the schedule has no occurrence
	/// at or before `reference_now`.
	pub fn expected_run_time(&self, reference_now: DateTime<Utc>) -> Result<DateTime<Utc>> {
		self
			.last_at_or_before(reference_now)
			.ok_or_else(|| CheckError::NoPreviousRun {
				expression: self.expression.clone(),
				before: reference_now.to_rfc3339(),
			})
	}
}

/// Compute the most recent instant at or before `reference_now` at which a
/// job with this UTC schedule should have run.
pub fn expected_run_time(expression: &str, reference_now: DateTime<Utc>) -> Result<DateTime<Utc>> {
	CronSchedule::parse(expression, None)?.expected_run_time(reference_now)
}

/// Validate a cron expression without computing any occurrence.
pub fn validate_cron_expression(expression: &str) -> Result<()> {
	CronSchedule::parse(expression, None)?;
	Ok(())
}

fn invalid(expression: &str, message: impl Into<String>) -> CheckError {
	CheckError::InvalidCronExpression {
		expression: expression.to_string(),
		message: message.into(),
	}
}

fn parse_timezone(name: &str) -> Result<Tz> {
	name
		.parse()
		.map_err(|_| CheckError::InvalidTimezone(name.to_string()))
}

/// Split a leading `CRON_TZ=<zone>` or `TZ=<zone>` off an expression.
fn split_timezone_prefix(expression: &str) -> (Option<&str>, &str) {
	for prefix in ["CRON_TZ=", "TZ="] {
		if let Some(rest) = expression.strip_prefix(prefix) {
			let (zone, body) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
			return (Some(zone), body.trim());
		}
	}
	(None, expression)
}

/// Expand `@daily`-style descriptors into their 5-field form.
fn expand_descriptor(body: &str) -> std::result::Result<String, String> {
	if !body.starts_with('@') {
		return Ok(body.to_string());
	}

	let lower = body.to_ascii_lowercase();
	let expanded = match lower.as_str() {
		"@yearly" | "@annually" => "0 0 1 1 *",
		"@monthly" => "0 0 1 * *",
		"@weekly" => "0 0 * * 0",
		"@daily" | "@midnight" => "0 0 * * *",
		"@hourly" => "0 * * * *",
		_ if lower.starts_with("@every") => {
			return Err("@every intervals are not supported".to_string());
		}
		_ => return Err(format!("unknown descriptor '{body}'")),
	};
	Ok(expanded.to_string())
}

/// Convert a standard expression into one or two schedules in the 7-field
/// format expected by the `cron` crate.
///
/// 5-field format: minute hour day-of-month month day-of-week
/// 7-field format: second minute hour day-of-month month day-of-week year
///
/// 6 and 7 field expressions are already in the crate's format and are used
/// as-is.
fn build_variants(expression: &str, body: &str) -> Result<Vec<Schedule>> {
	let fields: Vec<&str> = body.split_whitespace().collect();

	match fields.as_slice() {
		[minute, hour, day_of_month, month, day_of_week] => {
			let day_of_month = normalize_any(day_of_month);
			let day_of_week =
				normalize_day_of_week(day_of_week).map_err(|message| invalid(expression, message))?;

			if day_of_month == "*" || day_of_week == "*" {
				let single = format!("0 {minute} {hour} {day_of_month} {month} {day_of_week} *");
				Ok(vec![parse_cron(expression, &single)?])
			} else {
				let by_date = format!("0 {minute} {hour} {day_of_month} {month} * *");
				let by_weekday = format!("0 {minute} {hour} * {month} {day_of_week} *");
				Ok(vec![
					parse_cron(expression, &by_date)?,
					parse_cron(expression, &by_weekday)?,
				])
			}
		}
		fields if fields.len() == 6 || fields.len() == 7 => Ok(vec![parse_cron(expression, body)?]),
		fields => Err(invalid(
			expression,
			format!("expected 5 fields, found {}", fields.len()),
		)),
	}
}

fn parse_cron(expression: &str, converted: &str) -> Result<Schedule> {
	Schedule::from_str(converted).map_err(|e| invalid(expression, e.to_string()))
}

fn normalize_any(field: &str) -> &str {
	if field == "?" {
		"*"
	} else {
		field
	}
}

/// Rewrite numeric day-of-week items (0-7, Sunday = 0 or 7) into day names.
///
/// The `cron` crate numbers Sunday as 1, so numeric items cannot be passed
/// through. Items that already use names are left for the crate to parse.
fn normalize_day_of_week(field: &str) -> std::result::Result<String, String> {
	let field = normalize_any(field);
	if field == "*" {
		return Ok(field.to_string());
	}

	let mut items = Vec::new();
	for item in field.split(',') {
		let (base, step) = match item.split_once('/') {
			Some((base, step)) => (base, Some(step)),
			None => (item, None),
		};

		let numeric = base == "*"
			|| base == "?"
			|| (!base.is_empty() && base.chars().all(|c| c.is_ascii_digit() || c == '-'));
		if !numeric {
			items.push(item.to_string());
			continue;
		}

		let step = match step {
			Some(step) => step
				.parse::<u32>()
				.ok()
				.filter(|s| *s > 0)
				.ok_or_else(|| format!("invalid day-of-week step '{step}'"))?,
			None => 1,
		};

		let (start, end) = if base == "*" || base == "?" {
			(0, 6)
		} else if let Some((low, high)) = base.split_once('-') {
			(parse_weekday(low)?, parse_weekday(high)?)
		} else {
			let day = parse_weekday(base)?;
			// "5/2" runs from 5 to the end of the week.
			if step > 1 {
				(day, 6)
			} else {
				(day, day)
			}
		};

		if start > end {
			return Err(format!("invalid day-of-week range '{base}'"));
		}

		let days: BTreeSet<usize> = (start..=end)
			.step_by(step as usize)
			.map(|d| (d % 7) as usize)
			.collect();
		let names: Vec<&str> = days.into_iter().map(|d| DAY_NAMES[d]).collect();
		items.push(names.join(","));
	}

	Ok(items.join(","))
}

fn parse_weekday(value: &str) -> std::result::Result<u32, String> {
	value
		.parse::<u32>()
		.ok()
		.filter(|d| *d <= 7)
		.ok_or_else(|| format!("invalid day-of-week value '{value}'"))
}
