//! HTTP backend for cloud simulation services.
//!
//! Endpoints, relative to the base URL:
//! - `POST /jobs` with `{"input": [..]}` returns `{"job_id": "42"}`
//! - `GET /jobs/{id}` returns `{"status": "running"}`
//! - `GET /jobs/{id}/output` returns `{"output": 3.5}`
//! - `DELETE /jobs/{id}` cancels

use std::time::Duration;

use async_trait::async_trait;
use exauq_types::{Input, JobId, JobStatus};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{HardwareError, Result};
use crate::interface::HardwareInterface;

const MAX_ERROR_BODY_CHARS: usize = 400;

/// Configuration for the HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Service base URL, e.g. `https://sims.example.org/api`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Bearer token sent with every request.
    pub bearer_token: Option<String>,
}

impl HttpConfig {
    /// Config with a 30 second timeout and no authentication.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            bearer_token: None,
        }
    }
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    input: &'a Input,
}

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: JobId,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: JobStatus,
}

#[derive(Deserialize)]
struct OutputResponse {
    output: Option<f64>,
}

/// Talks to a simulation service over JSON/HTTP.
#[derive(Debug, Clone)]
pub struct HttpInterface {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpInterface {
    /// Build the client.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.filter(|token| !token.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        tracing::debug!(url, status = %status, "simulation service returned non-success status");
        Err(HardwareError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let response = self.send(request, url).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|error| {
            HardwareError::UnexpectedResponse(format!("{url}: {error}"))
        })
    }
}

#[async_trait]
impl HardwareInterface for HttpInterface {
    async fn submit_job(&self, input: &Input) -> Result<JobId> {
        let url = self.url("/jobs");
        let request = self.client.post(&url).json(&SubmitRequest { input });
        let response: SubmitResponse = self.send_json(request, &url).await?;
        tracing::info!(job_id = %response.job_id, "submitted job to simulation service");
        Ok(response.job_id)
    }

    async fn get_job_status(&self, job_id: &JobId) -> Result<JobStatus> {
        let url = self.url(&format!("/jobs/{job_id}"));
        let response: StatusResponse = self.send_json(self.client.get(&url), &url).await?;
        Ok(response.status)
    }

    async fn get_job_output(&self, job_id: &JobId) -> Result<f64> {
        let url = self.url(&format!("/jobs/{job_id}/output"));
        let response: OutputResponse = self.send_json(self.client.get(&url), &url).await?;
        response
            .output
            .ok_or_else(|| HardwareError::OutputUnavailable(job_id.clone()))
    }

    async fn cancel_job(&self, job_id: &JobId) -> Result<()> {
        let url = self.url(&format!("/jobs/{job_id}"));
        self.send(self.client.delete(&url), &url).await?;
        tracing::info!(job_id = %job_id, "cancelled job at simulation service");
        Ok(())
    }
}
