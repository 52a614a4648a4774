// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Kubernetes `batch/v1` CronJob access for the cronjob checker.

mod cronjob;
mod error;
mod source;

pub use cronjob::descriptor_from_cronjob;
pub use error::{K8sError, K8sResult};
pub use source::KubeJobSource;
