use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::directory::StreamerDirectory;
use crate::platform::{niconico, twitch, youtube, PlatformType};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{platform} is tracked for at least one streamer but {field} is not configured")]
    MissingCredential {
        platform: PlatformType,
        field: &'static str,
    },
    #[error("Invalid {platform} base URL {url}: {reason}")]
    InvalidBaseUrl {
        platform: PlatformType,
        url: String,
        reason: String,
    },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Credentials and endpoint for the YouTube Data API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    pub api_key: String,
    pub base_url: String,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: youtube::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Credentials and endpoint for the Twitch Helix API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitchConfig {
    pub auth_token: String,
    pub client_id: String,
    pub base_url: String,
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            auth_token: String::new(),
            client_id: String::new(),
            base_url: twitch::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Endpoint and search categories for the Niconico live search API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NiconicoConfig {
    pub base_url: String,
    /// Category tags OR-ed together into the search keyword.
    pub categories: Vec<String>,
}

impl Default for NiconicoConfig {
    fn default() -> Self {
        Self {
            base_url: niconico::DEFAULT_BASE_URL.to_string(),
            categories: niconico::DEFAULT_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

/// Process-wide configuration for the platform clients and the aggregator.
///
/// Built once at startup and handed to [`crate::Aggregator::from_config`];
/// nothing in it changes while serving lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// HTTP timeout for a single platform call (default: 10s).
    pub request_timeout: Duration,
    /// Overall deadline for one aggregated lookup (default: 12s).
    pub lookup_timeout: Duration,
    pub youtube: YoutubeConfig,
    pub twitch: TwitchConfig,
    pub niconico: NiconicoConfig,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            lookup_timeout: Duration::from_secs(12),
            youtube: YoutubeConfig::default(),
            twitch: TwitchConfig::default(),
            niconico: NiconicoConfig::default(),
        }
    }
}

impl LiveConfig {
    pub fn with_request_timeout(mut self, ms: u64) -> Self {
        self.request_timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_lookup_timeout(mut self, ms: u64) -> Self {
        self.lookup_timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_youtube_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.youtube.api_key = api_key.into();
        self
    }

    pub fn with_youtube_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.youtube.base_url = base_url.into();
        self
    }

    pub fn with_twitch_credentials(
        mut self,
        auth_token: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        self.twitch.auth_token = auth_token.into();
        self.twitch.client_id = client_id.into();
        self
    }

    pub fn with_twitch_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.twitch.base_url = base_url.into();
        self
    }

    pub fn with_niconico_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.niconico.base_url = base_url.into();
        self
    }

    pub fn with_niconico_categories(mut self, categories: Vec<String>) -> Self {
        if !categories.is_empty() {
            self.niconico.categories = categories;
        }
        self
    }

    pub fn has_youtube_credentials(&self) -> bool {
        !self.youtube.api_key.is_empty()
    }

    pub fn has_twitch_credentials(&self) -> bool {
        !self.twitch.auth_token.is_empty() && !self.twitch.client_id.is_empty()
    }

    /// Checks that every platform some streamer is tracked on has the
    /// credentials it needs.
    pub fn validate(&self, directory: &StreamerDirectory) -> Result<(), ConfigError> {
        if directory.tracks(PlatformType::Youtube) && self.youtube.api_key.is_empty() {
            return Err(ConfigError::MissingCredential {
                platform: PlatformType::Youtube,
                field: "api_key",
            });
        }

        if directory.tracks(PlatformType::Twitch) {
            if self.twitch.auth_token.is_empty() {
                return Err(ConfigError::MissingCredential {
                    platform: PlatformType::Twitch,
                    field: "auth_token",
                });
            }
            if self.twitch.client_id.is_empty() {
                return Err(ConfigError::MissingCredential {
                    platform: PlatformType::Twitch,
                    field: "client_id",
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StreamerIdentity;

    fn directory_with(identity: StreamerIdentity) -> StreamerDirectory {
        StreamerDirectory::new().with_streamer("streamer", identity)
    }

    #[test]
    fn defaults_match_reference_timeouts() {
        let config = LiveConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.lookup_timeout, Duration::from_secs(12));
        assert_eq!(config.youtube.base_url, youtube::DEFAULT_BASE_URL);
        assert_eq!(config.niconico.categories, vec!["一般(その他)", "ゲーム"]);
    }

    #[test]
    fn validate_requires_youtube_key_when_tracked() {
        let directory = directory_with(StreamerIdentity::default().with_youtube("UC123"));
        let err = LiveConfig::default().validate(&directory).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential {
                platform: PlatformType::Youtube,
                field: "api_key"
            }
        ));

        let config = LiveConfig::default().with_youtube_api_key("key");
        assert!(config.validate(&directory).is_ok());
    }

    #[test]
    fn validate_requires_both_twitch_credentials() {
        let directory = directory_with(StreamerIdentity::default().with_twitch("545050196"));

        let err = LiveConfig::default()
            .with_twitch_credentials("token", "")
            .validate(&directory)
            .unwrap_err();
        assert!(err.to_string().contains("client_id"), "{}", err);

        let config = LiveConfig::default().with_twitch_credentials("token", "client");
        assert!(config.validate(&directory).is_ok());
    }

    #[test]
    fn validate_ignores_untracked_platforms() {
        let directory = directory_with(StreamerIdentity::default().with_niconico("2598430"));
        assert!(LiveConfig::default().validate(&directory).is_ok());
    }

    #[test]
    fn empty_category_list_keeps_defaults() {
        let config = LiveConfig::default().with_niconico_categories(vec![]);
        assert_eq!(config.niconico.categories.len(), 2);
    }
}
