//! Paddling forecast core for Paddlecast
//!
//! Fetches a 3-day hourly forecast for a coordinate, falls back to
//! climate-based synthesized conditions when the upstream source fails,
//! and rates each hour for paddling safety.

pub mod cache;
pub mod classify;
pub mod client;
pub mod coords;
pub mod fallback;
pub mod payload;
pub mod regions;
pub mod retry;
pub mod scoring;
pub mod service;
pub mod types;

pub use cache::{CacheEntry, CacheKey, ForecastCache};
pub use classify::{assess_hour, classify, Classification, Explanation, HourAssessment, SkillBand};
pub use client::{UpstreamClient, UpstreamError};
pub use coords::{Coordinate, CoordinateError};
pub use fallback::FallbackSynthesizer;
pub use retry::RetryPolicy;
pub use scoring::{score, score_hour, ScoreInput};
pub use service::ForecastService;
pub use types::*;
