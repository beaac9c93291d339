use std::error::Error;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::warn;
use url::Url;

use super::{FetchError, PlatformType};
use crate::config::ConfigError;

/// Shared HTTP client for all platform calls. `timeout` bounds each request,
/// body included.
pub fn build_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(20)
        .gzip(true)
        .user_agent(concat!("live-status/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Joins `path` onto a configured base URL.
pub(crate) fn endpoint_url(
    platform: PlatformType,
    base_url: &str,
    path: &str,
) -> Result<Url, ConfigError> {
    let joined = format!("{}/{}", base_url.trim_end_matches('/'), path);
    let url = Url::parse(&joined).map_err(|e| ConfigError::InvalidBaseUrl {
        platform,
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidBaseUrl {
            platform,
            url: base_url.to_string(),
            reason: "scheme must be http or https".into(),
        });
    }

    Ok(url)
}

/// Sends the request and returns the body of a 2xx response.
pub(crate) async fn send(
    platform: PlatformType,
    request: RequestBuilder,
) -> Result<String, FetchError> {
    let response = request.send().await.map_err(|e| transport_error(platform, e))?;

    let status = response.status();
    if !status.is_success() {
        let message = status.canonical_reason().unwrap_or("Unknown").to_string();
        warn!(%platform, status = status.as_u16(), "Platform returned error status");
        return Err(FetchError::Status {
            platform,
            status: status.as_u16(),
            message,
        });
    }

    response.text().await.map_err(|e| transport_error(platform, e))
}

pub(crate) fn decode<T: DeserializeOwned>(
    platform: PlatformType,
    body: &str,
) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode {
        platform,
        message: e.to_string(),
    })
}

fn transport_error(platform: PlatformType, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        return FetchError::Timeout { platform };
    }
    // The request URL may carry an API key.
    FetchError::Network {
        platform,
        reason: error_chain(&e.without_url()),
    }
}

/// Renders an error followed by each of its causes.
fn error_chain(e: &dyn Error) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
