//! Niconico live content search client.
//!
//! The search API is public; the channel is matched through a filter and
//! the keyword is an OR-query over category tags.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::http::{decode, endpoint_url, send};
use super::{FetchError, LiveInfo, LiveStatusFetcher, PlatformType};
use crate::config::{ConfigError, NiconicoConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.search.nicovideo.jp/api/v2";
pub const DEFAULT_CATEGORIES: &[&str] = &["一般(その他)", "ゲーム"];

const LIVE_SENTINEL: &str = "onair";
const SEARCH_TARGETS: &str = "title,description,tags,tagsExact,categoryTags";
const SEARCH_FIELDS: &str = "contentId,channelId,liveStatus,startTime";

#[derive(Debug, Clone)]
pub struct NiconicoClient {
    client: Client,
    search_url: Url,
    query: String,
}

impl NiconicoClient {
    pub fn new(config: &NiconicoConfig, client: Client) -> Result<Self, ConfigError> {
        Ok(Self {
            client,
            search_url: endpoint_url(
                PlatformType::Niconico,
                &config.base_url,
                "live/contents/search",
            )?,
            query: config.categories.join(" OR "),
        })
    }

    fn request_url(&self, channel_id: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("targets", SEARCH_TARGETS)
            .append_pair("_sort", "-startTime")
            .append_pair("fields", SEARCH_FIELDS)
            .append_pair("q", &self.query)
            .append_pair("filters[liveStatus][0]", LIVE_SENTINEL)
            .append_pair("filters[channelId][0]", channel_id);
        url
    }
}

#[async_trait]
impl LiveStatusFetcher for NiconicoClient {
    fn platform(&self) -> PlatformType {
        PlatformType::Niconico
    }

    async fn fetch_live(&self, channel_id: &str) -> Result<LiveInfo, FetchError> {
        debug!(channel_id, "Searching Niconico for live contents");
        let body = send(
            PlatformType::Niconico,
            self.client.get(self.request_url(channel_id)),
        )
        .await?;
        normalize(&body)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Vec<LiveContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveContent {
    content_id: Option<String>,
    live_status: Option<String>,
}

/// Reduces a live search response body to a [`LiveInfo`]. Results are sorted
/// newest first, so the first item is the current broadcast.
pub fn normalize(body: &str) -> Result<LiveInfo, FetchError> {
    let response: SearchResponse = decode(PlatformType::Niconico, body)?;

    let Some(first) = response.data.into_iter().next() else {
        return Ok(LiveInfo::offline());
    };

    let is_live = first.live_status.as_deref() == Some(LIVE_SENTINEL);
    Ok(LiveInfo::from_first_item(is_live, first.content_id))
}
