use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use rocket::Data;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone)]
struct Counter {
    window_start: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client identifier.
///
/// Attached as a request fairing so every inbound request is counted. A
/// rejection is recorded in the request cache and enforced by the [`RateLimit`]
/// guard on routes and by the 404 catcher for paths no route matches.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    config: RateLimitConfig,
    window: Duration,
    stale_after: Duration,
    excluded_prefixes: Vec<String>,
    counters: Mutex<HashMap<String, Counter>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, base_path: &str) -> Self {
        let window = Duration::from_secs(config.window_seconds.max(1));
        let stale_after = Duration::from_secs(config.stale_after_seconds.max(config.window_seconds).max(1));
        let excluded_prefixes = config.exclude_paths.iter().map(|path| crate::join_base_path(base_path, path)).collect();

        Self {
            config,
            window,
            stale_after,
            excluded_prefixes,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Seconds a rejected client is told to wait.
    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs()
    }

    pub async fn check(&self, client: &str) -> RateLimitDecision {
        self.check_at(client, Instant::now()).await
    }

    async fn check_at(&self, client: &str, now: Instant) -> RateLimitDecision {
        let mut counters = self.counters.lock().await;

        let stale_after = self.stale_after;
        counters.retain(|_, counter| now.saturating_duration_since(counter.window_start) < stale_after);

        let Some(counter) = counters.get_mut(client) else {
            counters.insert(client.to_string(), Counter { window_start: now, count: 1 });
            return RateLimitDecision::Allow;
        };

        if now.saturating_duration_since(counter.window_start) >= self.window {
            counter.window_start = now;
            counter.count = 1;
            return RateLimitDecision::Allow;
        }

        if counter.count >= self.config.requests_per_minute {
            return RateLimitDecision::Limited;
        }

        counter.count += 1;
        RateLimitDecision::Allow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RateLimitDecision {
    Allow,
    Limited,
}

/// Request guard failing with 429 when the request was over budget.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RateLimit;

#[derive(Debug, Clone, Copy)]
pub(crate) struct RateLimitRetryAfter(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RateLimitExceeded;

/// First `X-Forwarded-For` entry, then the peer address, then `"unknown"`.
pub(crate) fn client_id(request: &Request<'_>) -> String {
    let forwarded = request
        .headers()
        .get_one("X-Forwarded-For")
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    if let Some(forwarded) = forwarded {
        return forwarded.to_string();
    }

    request
        .client_ip()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Seconds to wait, when the limiter rejected this request.
pub(crate) fn rejected_retry_after(request: &Request<'_>) -> Option<u64> {
    request.local_cache(|| None::<RateLimitRetryAfter>).map(|r| r.0)
}

#[rocket::async_trait]
impl Fairing for RateLimiter {
    fn info(&self) -> Info {
        Info {
            name: "Rate Limiter",
            kind: Kind::Request,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        if !self.is_enabled() || self.is_excluded(request.uri().path().as_str()) {
            return;
        }

        let client = client_id(request);
        if self.check(&client).await == RateLimitDecision::Allow {
            return;
        }

        let retry_after_secs = self.retry_after_secs();
        request.local_cache(|| Some(RateLimitRetryAfter(retry_after_secs)));

        let request_id = request
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        warn!(
            request_id = %request_id,
            client = %client,
            method = %request.method(),
            uri = %request.uri(),
            retry_after_secs = %retry_after_secs,
            "rate limit exceeded"
        );
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RateLimit {
    type Error = RateLimitExceeded;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match rejected_retry_after(request) {
            Some(_) => Outcome::Error((Status::TooManyRequests, RateLimitExceeded)),
            None => Outcome::Success(RateLimit),
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for RateLimit {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        responses.responses.insert(
            "429".to_string(),
            RefOr::Object(OpenApiResponse {
                description: "Rate limit exceeded. Please try again later.".to_string(),
                ..Default::default()
            }),
        );
        Ok(responses)
    }
}
