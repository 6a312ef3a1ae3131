//! Stream reachability probes.
//!
//! A probe is a single header-only request against a stream URL. Only an
//! exact `200 OK` counts as live; redirects are not followed. Connections are
//! closed after each probe instead of being kept idle in the pool.

use std::time::Duration;

use reqwest::{header, redirect, Client as HttpClient, StatusCode};

use crate::{
    error::AppResult,
    models::{NotLiveReason, ProbeOutcome},
};

const USER_AGENT: &str = concat!("movie-streams-api/", env!("CARGO_PKG_VERSION"));

/// Transport that checks whether a URL is currently serving.
///
/// Implementations must not panic or return errors: every failure is folded
/// into [`ProbeOutcome::NotLive`].
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StreamProber: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;

    /// Prober name for logging
    fn name(&self) -> &'static str;
}

/// Probes over HTTP with a `HEAD` request
#[derive(Clone)]
pub struct HttpProber {
    http_client: HttpClient,
}

impl HttpProber {
    /// Creates a prober whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self { http_client })
    }

    fn classify_error(error: &reqwest::Error) -> NotLiveReason {
        if error.is_timeout() {
            NotLiveReason::Timeout
        } else if error.is_connect() {
            NotLiveReason::Connect
        } else {
            NotLiveReason::Request(error.to_string())
        }
    }
}

#[async_trait::async_trait]
impl StreamProber for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let request = self
            .http_client
            .head(url)
            .header(header::CONNECTION, "close");

        match request.send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                tracing::debug!(url = %url, status = %response.status(), "Stream probe succeeded");
                ProbeOutcome::Live
            }
            Ok(response) => {
                tracing::debug!(url = %url, status = %response.status(), "Stream probe rejected");
                ProbeOutcome::not_live(NotLiveReason::Status(response.status().as_u16()))
            }
            Err(e) => {
                let reason = Self::classify_error(&e);
                tracing::debug!(url = %url, reason = %reason, "Stream probe failed");
                ProbeOutcome::not_live(reason)
            }
        }
    }

    fn name(&self) -> &'static str {
        "http-head"
    }
}
