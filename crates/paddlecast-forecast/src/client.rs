//! HTTP client for the upstream forecast source.

use chrono::Utc;
use paddlecast_core::{NetworkError, ReqwestErrorExt};
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

use crate::coords::Coordinate;
use crate::payload::{self, PayloadError};
use crate::retry::{self, RetryDecision, RetryPolicy, Retryable};
use crate::types::{FallbackReason, ForecastResult, HourlyCondition};

/// Upstream failures. Never returned by the service; each one is turned
/// into a [`FallbackReason`] and absorbed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] PayloadError),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Network(e.into_network_error())
    }
}

impl UpstreamError {
    pub fn fallback_reason(&self) -> FallbackReason {
        match self {
            UpstreamError::Network(NetworkError::InvalidResponse(_)) => {
                FallbackReason::InvalidPayload
            }
            UpstreamError::Network(NetworkError::ServerError { status, .. }) => {
                FallbackReason::HttpError { status: *status }
            }
            UpstreamError::Network(_) => FallbackReason::NetworkError,
            UpstreamError::Http { status } => FallbackReason::HttpError { status: *status },
            UpstreamError::InvalidPayload(_) => FallbackReason::InvalidPayload,
        }
    }
}

impl Retryable for UpstreamError {
    fn retry_decision(&self) -> RetryDecision {
        match self {
            UpstreamError::Network(e) => retry::is_retryable_network(e),
            UpstreamError::Http { status } => match reqwest::StatusCode::from_u16(*status) {
                Ok(status) => retry::is_retryable_status(status),
                Err(_) => RetryDecision::NoRetry,
            },
            UpstreamError::InvalidPayload(_) => RetryDecision::NoRetry,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl UpstreamClient {
    /// `timeout` bounds each individual request, retries included separately.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and validate the 3-day forecast for `coord`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(&self, coord: &Coordinate) -> Result<ForecastResult, UpstreamError> {
        retry::with_retry(&self.retry, move || self.fetch_forecast_once(coord)).await
    }

    /// Fetch current conditions; `local_hour` labels a reading that has no hour.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_current(
        &self,
        coord: &Coordinate,
        local_hour: u8,
    ) -> Result<HourlyCondition, UpstreamError> {
        retry::with_retry(&self.retry, move || async move {
            let body = self.get_json("current", coord).await?;
            Ok::<_, UpstreamError>(payload::parse_current(&body, local_hour)?)
        })
        .await
    }

    async fn fetch_forecast_once(&self, coord: &Coordinate) -> Result<ForecastResult, UpstreamError> {
        let body = self.get_json("forecast", coord).await?;
        Ok(payload::parse_forecast(&body, coord, Utc::now())?)
    }

    async fn get_json(
        &self,
        endpoint: &str,
        coord: &Coordinate,
    ) -> Result<serde_json::Value, UpstreamError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", coord.latitude().to_string()),
                ("lng", coord.longitude().to_string()),
            ])
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> Result<serde_json::Value, UpstreamError> {
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Upstream responded with {}", status);
            return Err(UpstreamError::Http {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| UpstreamError::InvalidPayload(PayloadError::NotJson(e.to_string())))
    }
}
