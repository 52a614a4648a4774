// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use cronjob_checker_core::{JobDescriptor, JobSource, JobSourceError, Scope};
use k8s_openapi::api::batch::v1::CronJob;
use kube::api::{Api, ListParams};
use kube::Client;
use tracing::{debug, instrument};

use crate::cronjob::descriptor_from_cronjob;
use crate::error::{K8sError, K8sResult};

/// A [`JobSource`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeJobSource {
	client: Client,
}

impl KubeJobSource {
	pub fn new(client: Client) -> Self {
		Self { client }
	}

	/// Create a client from the in-cluster service account, or the local
	/// kubeconfig when running outside a cluster.
	pub async fn try_default() -> K8sResult<Self> {
		let client = Client::try_default()
			.await
			.map_err(|e| K8sError::ClientInit {
				message: e.to_string(),
			})?;
		debug!("Created Kubernetes client");
		Ok(Self::new(client))
	}

	fn api_for(&self, scope: &Scope) -> Api<CronJob> {
		match scope {
			Scope::All => Api::all(self.client.clone()),
			Scope::Namespace(namespace) => Api::namespaced(self.client.clone(), namespace),
		}
	}
}

#[async_trait]
impl JobSource for KubeJobSource {
	#[instrument(skip_all, fields(scope = %scope))]
	async fn list_jobs(&self, scope: &Scope) -> Result<Vec<JobDescriptor>, JobSourceError> {
		let list = self
			.api_for(scope)
			.list(&ListParams::default())
			.await
			.map_err(K8sError::from)?;

		debug!(count = list.items.len(), "Listed cronjobs");
		Ok(list.items.iter().map(descriptor_from_cronjob).collect())
	}

	#[instrument(skip(self))]
	async fn get_job(&self, namespace: &str, name: &str) -> Result<JobDescriptor, JobSourceError> {
		let api: Api<CronJob> = Api::namespaced(self.client.clone(), namespace);
		let cronjob = api
			.get(name)
			.await
			.map_err(|e| K8sError::for_cronjob(e, namespace, name))?;

		Ok(descriptor_from_cronjob(&cronjob))
	}
}
