mod http;
pub mod niconico;
pub mod twitch;
pub mod youtube;

pub use http::build_client;
pub use niconico::NiconicoClient;
pub use twitch::TwitchClient;
pub use youtube::YoutubeClient;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformType {
    Youtube,
    Twitch,
    Niconico,
}

impl PlatformType {
    /// Canonical order of entries in an aggregated status.
    pub const ALL: [PlatformType; 3] = [
        PlatformType::Youtube,
        PlatformType::Twitch,
        PlatformType::Niconico,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Twitch => "twitch",
            Self::Niconico => "niconico",
        }
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized live status reported by one platform.
///
/// `content_id` is only ever set while `is_live` is true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveInfo {
    pub is_live: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}

impl LiveInfo {
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn live(content_id: impl Into<String>) -> Self {
        Self::from_first_item(true, Some(content_id.into()))
    }

    /// Builds the status from the first result of a platform response.
    pub(crate) fn from_first_item(is_live: bool, content_id: Option<String>) -> Self {
        if !is_live {
            return Self::offline();
        }
        Self {
            is_live,
            content_id: content_id.filter(|id| !id.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("HTTP error {status} from {platform}: {message}")]
    Status {
        platform: PlatformType,
        status: u16,
        message: String,
    },
    #[error("Network error reaching {platform}: {reason}")]
    Network {
        platform: PlatformType,
        reason: String,
    },
    #[error("Timeout reaching {platform}")]
    Timeout { platform: PlatformType },
    #[error("Request to {platform} was cancelled")]
    Cancelled { platform: PlatformType },
    #[error("Failed to decode {platform} response: {message}")]
    Decode {
        platform: PlatformType,
        message: String,
    },
}

impl FetchError {
    pub fn platform(&self) -> PlatformType {
        match self {
            Self::Status { platform, .. }
            | Self::Network { platform, .. }
            | Self::Timeout { platform }
            | Self::Cancelled { platform }
            | Self::Decode { platform, .. } => *platform,
        }
    }

    /// True for failures reaching the platform, as opposed to a bad body.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Decode { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A client able to tell whether a channel is live on one platform.
///
/// Implementations are object-safe and Send + Sync so the aggregator can
/// hold them behind `Arc<dyn LiveStatusFetcher>` and call them concurrently.
#[async_trait]
pub trait LiveStatusFetcher: Send + Sync {
    fn platform(&self) -> PlatformType;

    /// Zero results is a successful offline status, never an error.
    async fn fetch_live(&self, identifier: &str) -> Result<LiveInfo, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_never_carries_content_id() {
        let info = LiveInfo::from_first_item(false, Some("abc".into()));
        assert!(!info.is_live);
        assert_eq!(info.content_id, None);
    }

    #[test]
    fn live_drops_empty_content_id() {
        assert_eq!(LiveInfo::live("").content_id, None);
        assert_eq!(LiveInfo::live("abc").content_id.as_deref(), Some("abc"));
    }

    #[test]
    fn platform_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PlatformType::Niconico).unwrap(),
            "\"niconico\""
        );
        assert_eq!(PlatformType::Youtube.to_string(), "youtube");
    }

    #[test]
    fn error_classification() {
        let timeout = FetchError::Timeout {
            platform: PlatformType::Twitch,
        };
        assert!(timeout.is_transport());
        assert!(timeout.is_timeout());

        let decode = FetchError::Decode {
            platform: PlatformType::Youtube,
            message: "expected value".into(),
        };
        assert!(!decode.is_transport());
        assert_eq!(decode.platform(), PlatformType::Youtube);

        let status = FetchError::Status {
            platform: PlatformType::Niconico,
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert!(status.is_transport());
        assert_eq!(status.status_code(), Some(503));
    }
}
