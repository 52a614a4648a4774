// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use cronjob_checker_core::JobDescriptor;
use k8s_openapi::api::batch::v1::CronJob;

/// Map a CronJob resource onto the fields the checker evaluates.
///
/// A CronJob without a spec yields an empty schedule, which fails schedule
/// parsing and is handled by the job error policy.
pub fn descriptor_from_cronjob(cronjob: &CronJob) -> JobDescriptor {
	let metadata = &cronjob.metadata;
	let spec = cronjob.spec.as_ref();

	JobDescriptor {
		name: metadata.name.clone().unwrap_or_default(),
		namespace: metadata.namespace.clone().unwrap_or_default(),
		schedule: spec.map(|s| s.schedule.clone()).unwrap_or_default(),
		time_zone: spec.and_then(|s| s.time_zone.clone()),
		suspended: spec.and_then(|s| s.suspend).unwrap_or(false),
		last_observed_run: cronjob
			.status
			.as_ref()
			.and_then(|status| status.last_schedule_time.as_ref())
			.map(|time| time.0),
	}
}
