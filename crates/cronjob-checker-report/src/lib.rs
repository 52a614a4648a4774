// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Kuberhealthy reporting for the cronjob checker.
//!
//! Kuberhealthy injects `KH_REPORTING_URL` and `KH_RUN_UUID` into every
//! check pod. A check posts exactly one report to that URL:
//!
//! ```json
//! {"OK": false, "Errors": ["..."]}
//! ```

mod client;
mod error;

pub use client::{ClientConfig, KuberhealthyClient, KuberhealthyClientBuilder, RUN_UUID_HEADER};
pub use error::{ReportError, Result};
