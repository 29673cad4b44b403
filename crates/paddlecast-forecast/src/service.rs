//! Forecast orchestration: cache, upstream, fallback.
//!
//! A valid coordinate always gets a result. Upstream failures of any kind
//! are absorbed by the synthesizer and only show up as
//! `metadata.source == fallback`; the one error callers see is an invalid
//! coordinate.

use chrono::{Duration as ChronoDuration, Utc};
use paddlecast_core::{ForecastConfig, NetworkError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::instrument;

use crate::cache::{CacheKey, ForecastCache};
use crate::client::{UpstreamClient, UpstreamError};
use crate::coords::{self, Coordinate, CoordinateError};
use crate::fallback::FallbackSynthesizer;
use crate::retry::{RetryPolicy, DEFAULT_MAX_DELAY_MS};
use crate::types::{DataSource, ForecastResult, HourlyCondition, FORECAST_DAYS};

/// Upper bound on one upstream call, retries included
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type Pending = Arc<OnceCell<ForecastResult>>;

/// Removes its registry entry when dropped, unless a newer lookup has
/// already replaced it.
struct PendingRegistration<'a> {
    pending: &'a Mutex<HashMap<CacheKey, Pending>>,
    key: CacheKey,
    cell: Pending,
}

impl Drop for PendingRegistration<'_> {
    fn drop(&mut self) {
        let mut pending = self.pending.lock();
        if pending
            .get(&self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.cell))
        {
            pending.remove(&self.key);
        }
    }
}

pub struct ForecastService {
    client: UpstreamClient,
    cache: Arc<ForecastCache>,
    synthesizer: FallbackSynthesizer,
    request_timeout: Duration,
    // In-flight lookups, so concurrent misses for one key share a call
    pending: Mutex<HashMap<CacheKey, Pending>>,
}

impl ForecastService {
    pub fn new(
        client: UpstreamClient,
        cache: Arc<ForecastCache>,
        synthesizer: FallbackSynthesizer,
    ) -> Self {
        Self {
            client,
            cache,
            synthesizer,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the client, cache and synthesizer from the `[forecast]` section.
    pub fn from_config(config: &ForecastConfig) -> Result<Self, UpstreamError> {
        let retry = RetryPolicy::new(
            config.max_retries,
            config.retry_initial_delay_ms,
            DEFAULT_MAX_DELAY_MS,
        );
        let client =
            UpstreamClient::new(&config.api_base_url, config.request_timeout())?.with_retry(retry);
        let synthesizer = config
            .fallback_seed
            .map(FallbackSynthesizer::with_seed)
            .unwrap_or_default();
        let cache = Arc::new(ForecastCache::new(config.cache_ttl()));

        tracing::info!(
            "Forecast service using {} (timeout {:?}, cache TTL {:?})",
            client.base_url(),
            config.request_timeout(),
            cache.ttl()
        );

        Ok(Self::new(client, cache, synthesizer).with_request_timeout(config.request_timeout()))
    }

    pub fn cache(&self) -> &Arc<ForecastCache> {
        &self.cache
    }

    pub fn synthesizer(&self) -> &FallbackSynthesizer {
        &self.synthesizer
    }

    /// 3-day forecast for a raw latitude/longitude pair.
    #[instrument(skip(self), level = "info")]
    pub async fn get_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ForecastResult, CoordinateError> {
        let coord = Coordinate::new(latitude, longitude)?;
        Ok(self.get_forecast_for(&coord).await)
    }

    /// 3-day forecast for a validated coordinate. Never fails.
    pub async fn get_forecast_for(&self, coord: &Coordinate) -> ForecastResult {
        // Only live data short-circuits; cached fallback always retries upstream
        if let Some(entry) = self.cache.lookup(coord) {
            if entry.source() == DataSource::Api && self.cache.is_fresh(&entry) {
                return entry.data;
            }
        }

        let key = CacheKey::from(coord);
        let cell = self
            .pending
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        // Deregisters on completion and on cancellation alike
        let _registration = PendingRegistration {
            pending: &self.pending,
            key,
            cell: Arc::clone(&cell),
        };

        cell.get_or_init(|| self.resolve(coord)).await.clone()
    }

    /// Current conditions; synthesized for the local hour when upstream fails.
    /// Not cached.
    #[instrument(skip(self), level = "info")]
    pub async fn get_current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<HourlyCondition, CoordinateError> {
        let coord = Coordinate::new(latitude, longitude)?;
        let now = Utc::now();
        let local_hour = coords::local_hour_at(&coord, now);

        let upstream = self
            .bounded(self.client.fetch_current(&coord, local_hour))
            .await;
        match upstream {
            Ok(condition) => Ok(condition),
            Err(e) => {
                tracing::warn!(
                    "Current conditions unavailable ({}), synthesizing: {}",
                    e.fallback_reason(),
                    e
                );
                Ok(self.synthesizer.synthesize_current_at(&coord, now))
            }
        }
    }

    async fn resolve(&self, coord: &Coordinate) -> ForecastResult {
        let result = match self.bounded(self.client.fetch_forecast(coord)).await {
            Ok(live) => {
                tracing::info!("Using live forecast for {}", CacheKey::from(coord));
                self.complete_days(coord, live)
            }
            Err(e) => {
                let reason = e.fallback_reason();
                tracing::warn!("Upstream forecast failed ({}), falling back: {}", reason, e);
                self.synthesizer.synthesize(coord, reason)
            }
        };

        self.cache.store(coord, result.clone());
        result
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, UpstreamError>>,
    ) -> Result<T, UpstreamError> {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .unwrap_or_else(|_| Err(UpstreamError::Network(NetworkError::Timeout)))
    }

    /// Give a live result exactly `FORECAST_DAYS` days. Missing or empty
    /// days are synthesized and their hours marked `source = fallback`.
    fn complete_days(&self, coord: &Coordinate, mut result: ForecastResult) -> ForecastResult {
        result.forecast.truncate(FORECAST_DAYS);

        for day in result.forecast.iter_mut().skip(1) {
            if day.hourly.is_empty() {
                tracing::debug!("Synthesizing empty upstream day {}", day.date);
                *day = self.synthesizer.synthesize_day(coord, day.date);
            }
        }

        while result.forecast.len() < FORECAST_DAYS {
            let Some(last) = result.forecast.last() else {
                break;
            };
            let date = last.date + ChronoDuration::days(1);
            tracing::debug!("Padding short upstream forecast with {}", date);
            result
                .forecast
                .push(self.synthesizer.synthesize_day(coord, date));
        }

        result
    }
}
