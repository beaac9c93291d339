//! YouTube Data API v3 client.
//!
//! Live status comes from the `search` endpoint filtered to live videos of a
//! channel. The API key travels as a query parameter.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::http::{decode, endpoint_url, send};
use super::{FetchError, LiveInfo, LiveStatusFetcher, PlatformType};
use crate::config::{ConfigError, YoutubeConfig};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

const LIVE_SENTINEL: &str = "live";
const SEARCH_FIELDS: &str = "items(snippet/liveBroadcastContent,id/videoId)";

#[derive(Debug, Clone)]
pub struct YoutubeClient {
    client: Client,
    search_url: Url,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(config: &YoutubeConfig, client: Client) -> Result<Self, ConfigError> {
        Ok(Self {
            client,
            search_url: endpoint_url(PlatformType::Youtube, &config.base_url, "search")?,
            api_key: config.api_key.clone(),
        })
    }

    fn request_url(&self, channel_id: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("part", "snippet")
            .append_pair("eventType", "live")
            .append_pair("type", "video")
            .append_pair("fields", SEARCH_FIELDS)
            .append_pair("channelId", channel_id)
            .append_pair("key", &self.api_key);
        url
    }
}

#[async_trait]
impl LiveStatusFetcher for YoutubeClient {
    fn platform(&self) -> PlatformType {
        PlatformType::Youtube
    }

    async fn fetch_live(&self, channel_id: &str) -> Result<LiveInfo, FetchError> {
        debug!(channel_id, "Searching YouTube for live videos");
        let body = send(
            PlatformType::Youtube,
            self.client.get(self.request_url(channel_id)),
        )
        .await?;
        normalize(&body)
    }
}

// Partial responses (`fields=`) omit empty collections, so every level
// defaults.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: ResourceId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    live_broadcast_content: Option<String>,
}

/// Reduces a `search` response body to a [`LiveInfo`]. Only the first item
/// is consulted.
pub fn normalize(body: &str) -> Result<LiveInfo, FetchError> {
    let response: SearchResponse = decode(PlatformType::Youtube, body)?;

    let Some(first) = response.items.into_iter().next() else {
        return Ok(LiveInfo::offline());
    };

    let is_live = first.snippet.live_broadcast_content.as_deref() == Some(LIVE_SENTINEL);
    Ok(LiveInfo::from_first_item(is_live, first.id.video_id))
}
