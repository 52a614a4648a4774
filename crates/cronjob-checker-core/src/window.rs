// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Acceptance windows around expected run times.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// Default acceptance window width (10 minutes).
pub const DEFAULT_WINDOW_SECS: u64 = 600;

/// The default acceptance window width.
pub fn default_window_width() -> Duration {
	Duration::seconds(DEFAULT_WINDOW_SECS as i64)
}

/// An open interval `(lower, upper)` centred on an expected run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AcceptanceWindow {
	pub lower: DateTime<Utc>,
	pub upper: DateTime<Utc>,
}

impl AcceptanceWindow {
	/// Build a window of `width` centred on `target`.
	///
	/// Both halves are `width / 2`, truncated at nanosecond resolution, so an
	/// odd width loses at most one nanosecond. Bounds saturate at the ends of
	/// the representable time range.
	pub fn around(target: DateTime<Utc>, width: Duration) -> Self {
		let half = width / 2;
		Self {
			lower: target
				.checked_sub_signed(half)
				.unwrap_or(DateTime::<Utc>::MIN_UTC),
			upper: target
				.checked_add_signed(half)
				.unwrap_or(DateTime::<Utc>::MAX_UTC),
		}
	}

	/// Whether `observed` lies strictly inside the window. Both bounds are
	/// exclusive.
	pub fn contains(&self, observed: DateTime<Utc>) -> bool {
		observed > self.lower && observed < self.upper
	}

	pub fn width(&self) -> Duration {
		self.upper - self.lower
	}
}

impl fmt::Display for AcceptanceWindow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({}, {})", self.lower.to_rfc3339(), self.upper.to_rfc3339())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use proptest::prelude::*;

	#[test]
	fn test_window_bounds_are_symmetric() {
		let reference = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
		let window = AcceptanceWindow::around(reference, Duration::minutes(10));

		assert_eq!(window.lower, Utc.with_ymd_and_hms(2024, 1, 1, 11, 55, 0).unwrap());
		assert_eq!(window.upper, Utc.with_ymd_and_hms(2024, 1, 1, 12, 5, 0).unwrap());
		assert_eq!(window.width(), Duration::minutes(10));
	}

	#[test]
	fn test_bounds_are_exclusive() {
		let reference = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
		let window = AcceptanceWindow::around(reference, default_window_width());

		assert!(!window.contains(window.lower));
		assert!(!window.contains(window.upper));
		assert!(window.contains(reference));
		assert!(window.contains(window.lower + Duration::nanoseconds(1)));
		assert!(window.contains(window.upper - Duration::nanoseconds(1)));
	}

	#[test]
	fn test_outside_window() {
		let reference = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
		let window = AcceptanceWindow::around(reference, default_window_width());

		assert!(!window.contains(Utc.with_ymd_and_hms(2024, 1, 1, 11, 40, 0).unwrap()));
		assert!(!window.contains(Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap()));
	}

	#[test]
	fn test_odd_width_is_truncated_consistently() {
		let reference = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
		let window = AcceptanceWindow::around(reference, Duration::nanoseconds(3));

		assert_eq!(reference - window.lower, Duration::nanoseconds(1));
		assert_eq!(window.upper - reference, Duration::nanoseconds(1));
	}

	#[test]
	fn test_oversized_width_saturates() {
		let reference = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
		let window = AcceptanceWindow::around(reference, Duration::MAX);

		assert_eq!(window.lower, DateTime::<Utc>::MIN_UTC);
		assert_eq!(window.upper, DateTime::<Utc>::MAX_UTC);
		assert!(window.contains(reference));
	}

	proptest! {
		#[test]
		fn window_is_symmetric(
			secs in 0i64..4_000_000_000i64,
			width_ms in 1i64..86_400_000i64,
		) {
			let target = Utc.timestamp_opt(secs, 0).unwrap();
			let width = Duration::milliseconds(width_ms);
			let window = AcceptanceWindow::around(target, width);

			prop_assert_eq!(target - window.lower, window.upper - target);
			prop_assert!(width - window.width() <= Duration::nanoseconds(1));
			prop_assert!(window.contains(target));
			prop_assert!(!window.contains(window.lower));
			prop_assert!(!window.contains(window.upper));
		}
	}
}
