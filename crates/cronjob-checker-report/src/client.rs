// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Kuberhealthy check client.

use std::time::Duration;

use async_trait::async_trait;
use cronjob_checker_core::ResultSink;
use reqwest::Client;
use serde::Serialize;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{ReportError, Result};

/// Header carrying the run UUID Kuberhealthy assigned to this check pod.
pub const RUN_UUID_HEADER: &str = "kh-run-uuid";

/// Client version for identification.
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often an unreachable endpoint is looked up again.
const ENDPOINT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for the Kuberhealthy client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// Timeout for HTTP requests.
	pub request_timeout: Duration,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(30),
		}
	}
}

/// Builder for constructing a [`KuberhealthyClient`].
#[derive(Debug, Default)]
pub struct KuberhealthyClientBuilder {
	reporting_url: Option<String>,
	run_uuid: Option<String>,
	config: ClientConfig,
}

impl KuberhealthyClientBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the URL reports are posted to (`KH_REPORTING_URL`).
	pub fn reporting_url(mut self, url: impl Into<String>) -> Self {
		self.reporting_url = Some(url.into());
		self
	}

	/// Sets the run UUID sent with every report (`KH_RUN_UUID`).
	pub fn run_uuid(mut self, uuid: impl Into<String>) -> Self {
		self.run_uuid = Some(uuid.into());
		self
	}

	/// Sets the HTTP request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	pub fn build(self) -> Result<KuberhealthyClient> {
		let raw_url = self
			.reporting_url
			.filter(|u| !u.is_empty())
			.ok_or(ReportError::MissingReportingUrl)?;

		let reporting_url = Url::parse(&raw_url).map_err(|e| ReportError::InvalidReportingUrl {
			url: raw_url.clone(),
			message: e.to_string(),
		})?;
		if reporting_url.host_str().is_none() {
			return Err(ReportError::InvalidReportingUrl {
				url: raw_url,
				message: "URL has no host".to_string(),
			});
		}

		let http_client = Client::builder()
			.user_agent(format!("cronjob-checker/{CLIENT_VERSION}"))
			.timeout(self.config.request_timeout)
			.build()?;

		debug!(reporting_url = %reporting_url, "Kuberhealthy client initialized");

		Ok(KuberhealthyClient {
			reporting_url,
			run_uuid: self.run_uuid.filter(|u| !u.is_empty()),
			http_client,
		})
	}
}

/// Reports check results to Kuberhealthy.
#[derive(Debug, Clone)]
pub struct KuberhealthyClient {
	reporting_url: Url,
	run_uuid: Option<String>,
	http_client: Client,
}

impl KuberhealthyClient {
	pub fn builder() -> KuberhealthyClientBuilder {
		KuberhealthyClientBuilder::new()
	}

	pub fn reporting_url(&self) -> &Url {
		&self.reporting_url
	}

	/// Wait until the reporting endpoint's host resolves, for at most
	/// `timeout`.
	///
	/// Check pods can start before cluster DNS serves the Kuberhealthy
	/// service, so the first lookups may fail.
	pub async fn wait_for_endpoint(&self, timeout: Duration) -> Result<()> {
		let host = self.reporting_url.host_str().unwrap_or_default().to_string();
		let port = self.reporting_url.port_or_known_default().unwrap_or(80);
		let deadline = Instant::now() + timeout;

		loop {
			match tokio::net::lookup_host((host.as_str(), port)).await {
				Ok(mut addrs) => {
					if addrs.next().is_some() {
						debug!(host = %host, "Kuberhealthy endpoint is reachable");
						return Ok(());
					}
					debug!(host = %host, "Kuberhealthy endpoint resolved to no addresses")
				}
				Err(e) => debug!(host = %host, error = %e, "Kuberhealthy endpoint lookup failed"),
			}

			if Instant::now() + ENDPOINT_POLL_INTERVAL > deadline {
				warn!(host = %host, "Gave up waiting for Kuberhealthy endpoint");
				return Err(ReportError::EndpointUnreachable { host });
			}
			sleep(ENDPOINT_POLL_INTERVAL).await;
		}
	}

	async fn send(&self, report: &Report) -> Result<()> {
		debug!(url = %self.reporting_url, ok = report.ok, "Sending report to Kuberhealthy");

		let mut request = self
			.http_client
			.post(self.reporting_url.clone())
			.json(report);
		if let Some(uuid) = &self.run_uuid {
			request = request.header(RUN_UUID_HEADER, uuid);
		}

		let response = request.send().await?;

		if !response.status().is_success() {
			let status = response.status().as_u16();
			let message = response.text().await.unwrap_or_default();
			error!(status, message = %message, "Kuberhealthy rejected report");
			return Err(ReportError::ServerError { status, message });
		}

		info!(ok = report.ok, "Report accepted by Kuberhealthy");
		Ok(())
	}
}

#[async_trait]
impl ResultSink for KuberhealthyClient {
	type Error = ReportError;

	async fn report_success(&self) -> Result<()> {
		self
			.send(&Report {
				ok: true,
				errors: Vec::new(),
			})
			.await
	}

	async fn report_failure(&self, reasons: &[String]) -> Result<()> {
		self
			.send(&Report {
				ok: false,
				errors: reasons.to_vec(),
			})
			.await
	}
}

/// Report payload understood by Kuberhealthy.
#[derive(Debug, Serialize)]
struct Report {
	#[serde(rename = "OK")]
	ok: bool,
	#[serde(rename = "Errors")]
	errors: Vec<String>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use cronjob_checker_core::{deliver, Verdict};
	use serde_json::json;
	use wiremock::matchers::{body_json, header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	#[test]
	fn test_builder_requires_reporting_url() {
		let result = KuberhealthyClientBuilder::new().run_uuid("abc").build();
		assert!(matches!(result, Err(ReportError::MissingReportingUrl)));

		let result = KuberhealthyClientBuilder::new().reporting_url("").build();
		assert!(matches!(result, Err(ReportError::MissingReportingUrl)));
	}

	#[test]
	fn test_builder_rejects_invalid_url() {
		let result = KuberhealthyClientBuilder::new()
			.reporting_url("not a url")
			.build();
		assert!(matches!(
			result,
			Err(ReportError::InvalidReportingUrl { .. })
		));
	}

	#[test]
	fn test_builder_success() {
		let client = KuberhealthyClient::builder()
			.reporting_url("http://kuberhealthy.kuberhealthy.svc.cluster.local/check")
			.run_uuid("abc")
			.build()
			.unwrap();
		assert_eq!(
			client.reporting_url().host_str(),
			Some("kuberhealthy.kuberhealthy.svc.cluster.local")
		);
	}

	#[test]
	fn test_client_config_defaults() {
		let config = ClientConfig::default();
		assert_eq!(config.request_timeout, Duration::from_secs(30));
	}

	#[test]
	fn test_report_payload_shape() {
		let report = Report {
			ok: false,
			errors: vec!["late".to_string()],
		};
		assert_eq!(
			serde_json::to_value(&report).unwrap(),
			json!({"OK": false, "Errors": ["late"]})
		);
	}

	#[tokio::test]
	async fn test_report_success() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/check"))
			.and(header(RUN_UUID_HEADER, "run-123"))
			.and(body_json(json!({"OK": true, "Errors": []})))
			.respond_with(ResponseTemplate::new(200))
			.expect(1)
			.mount(&server)
			.await;

		let client = KuberhealthyClient::builder()
			.reporting_url(format!("{}/check", server.uri()))
			.run_uuid("run-123")
			.build()
			.unwrap();

		deliver(&client, &Verdict::Pass).await.unwrap();
	}

	#[tokio::test]
	async fn test_report_failure() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/check"))
			.and(body_json(
				json!({"OK": false, "Errors": ["There were 2 cronjob(s) late"]}),
			))
			.respond_with(ResponseTemplate::new(200))
			.expect(1)
			.mount(&server)
			.await;

		let client = KuberhealthyClient::builder()
			.reporting_url(format!("{}/check", server.uri()))
			.build()
			.unwrap();

		client
			.report_failure(&["There were 2 cronjob(s) late".to_string()])
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_rejected_report_is_an_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(400).set_body_string("unknown run uuid"))
			.mount(&server)
			.await;

		let client = KuberhealthyClient::builder()
			.reporting_url(server.uri())
			.build()
			.unwrap();

		match client.report_success().await {
			Err(ReportError::ServerError { status, message }) => {
				assert_eq!(status, 400);
				assert_eq!(message, "unknown run uuid");
			}
			other => panic!("expected ServerError, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_wait_for_endpoint_gives_up_on_unresolvable_host() {
		let client = KuberhealthyClient::builder()
			.reporting_url("http://kuberhealthy.cronjob-checker.invalid/check")
			.build()
			.unwrap();

		match client.wait_for_endpoint(Duration::from_secs(1)).await {
			Err(ReportError::EndpointUnreachable { host }) => {
				assert_eq!(host, "kuberhealthy.cronjob-checker.invalid");
			}
			other => panic!("expected EndpointUnreachable, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_wait_for_endpoint_with_ip_host() {
		let client = KuberhealthyClient::builder()
			.reporting_url("http://127.0.0.1:8080/check")
			.build()
			.unwrap();

		client
			.wait_for_endpoint(Duration::from_secs(1))
			.await
			.unwrap();
	}
}
