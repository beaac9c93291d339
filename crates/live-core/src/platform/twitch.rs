//! Twitch Helix `streams` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::http::{decode, endpoint_url, send};
use super::{FetchError, LiveInfo, LiveStatusFetcher, PlatformType};
use crate::config::{ConfigError, TwitchConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.twitch.tv/helix";

const LIVE_SENTINEL: &str = "live";

#[derive(Debug, Clone)]
pub struct TwitchClient {
    client: Client,
    streams_url: Url,
    auth_token: String,
    client_id: String,
}

impl TwitchClient {
    pub fn new(config: &TwitchConfig, client: Client) -> Result<Self, ConfigError> {
        Ok(Self {
            client,
            streams_url: endpoint_url(PlatformType::Twitch, &config.base_url, "streams")?,
            auth_token: config.auth_token.clone(),
            client_id: config.client_id.clone(),
        })
    }
}

#[async_trait]
impl LiveStatusFetcher for TwitchClient {
    fn platform(&self) -> PlatformType {
        PlatformType::Twitch
    }

    async fn fetch_live(&self, user_id: &str) -> Result<LiveInfo, FetchError> {
        let mut url = self.streams_url.clone();
        url.query_pairs_mut().append_pair("user_id", user_id);

        debug!(user_id, "Fetching Twitch streams");
        let request = self
            .client
            .get(url)
            .bearer_auth(&self.auth_token)
            .header("Client-ID", &self.client_id);
        let body = send(PlatformType::Twitch, request).await?;
        normalize(&body)
    }
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    data: Vec<StreamData>,
}

#[derive(Debug, Deserialize)]
struct StreamData {
    id: String,
    /// `"live"`, or `""` when the stream errored.
    #[serde(rename = "type", default)]
    kind: String,
}

/// Reduces a `streams` response body to a [`LiveInfo`].
pub fn normalize(body: &str) -> Result<LiveInfo, FetchError> {
    let response: StreamsResponse = decode(PlatformType::Twitch, body)?;

    let Some(first) = response.data.into_iter().next() else {
        return Ok(LiveInfo::offline());
    };

    Ok(LiveInfo::from_first_item(
        first.kind == LIVE_SENTINEL,
        Some(first.id),
    ))
}
