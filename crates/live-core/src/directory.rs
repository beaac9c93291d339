//! Static mapping from a streamer id to the identifiers used on each platform.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::platform::PlatformType;

/// Per-platform identifiers for one streamer. A missing (or empty) entry
/// means the streamer is not tracked on that platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamerIdentity {
    /// YouTube channel ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    /// Twitch user ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitch: Option<String>,
    /// Niconico channel ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niconico: Option<String>,
}

impl StreamerIdentity {
    pub fn with_youtube(mut self, channel_id: impl Into<String>) -> Self {
        self.youtube = Some(channel_id.into());
        self
    }

    pub fn with_twitch(mut self, user_id: impl Into<String>) -> Self {
        self.twitch = Some(user_id.into());
        self
    }

    pub fn with_niconico(mut self, channel_id: impl Into<String>) -> Self {
        self.niconico = Some(channel_id.into());
        self
    }

    pub fn id_for(&self, platform: PlatformType) -> Option<&str> {
        let id = match platform {
            PlatformType::Youtube => self.youtube.as_deref(),
            PlatformType::Twitch => self.twitch.as_deref(),
            PlatformType::Niconico => self.niconico.as_deref(),
        };
        id.map(str::trim).filter(|id| !id.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        PlatformType::ALL.iter().all(|p| self.id_for(*p).is_none())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreamerDirectory {
    streamers: HashMap<String, StreamerIdentity>,
}

impl StreamerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_streamer(mut self, id: impl Into<String>, identity: StreamerIdentity) -> Self {
        self.insert(id, identity);
        self
    }

    pub fn insert(
        &mut self,
        id: impl Into<String>,
        identity: StreamerIdentity,
    ) -> Option<StreamerIdentity> {
        self.streamers.insert(id.into(), identity)
    }

    pub fn resolve(&self, streamer_id: &str) -> Option<&StreamerIdentity> {
        self.streamers.get(streamer_id)
    }

    /// Whether any streamer has an identifier on `platform`.
    pub fn tracks(&self, platform: PlatformType) -> bool {
        self.streamers
            .values()
            .any(|identity| identity.id_for(platform).is_some())
    }

    pub fn streamer_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.streamers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.streamers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streamers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identifiers_count_as_untracked() {
        let identity = StreamerIdentity::default()
            .with_youtube("  ")
            .with_twitch("545050196");
        assert_eq!(identity.id_for(PlatformType::Youtube), None);
        assert_eq!(identity.id_for(PlatformType::Twitch), Some("545050196"));
        assert_eq!(identity.id_for(PlatformType::Niconico), None);
        assert!(!identity.is_empty());
        assert!(StreamerIdentity::default().is_empty());
    }

    #[test]
    fn tracks_reports_platforms_in_use() {
        let directory = StreamerDirectory::new()
            .with_streamer("a", StreamerIdentity::default().with_youtube("UC1"))
            .with_streamer("b", StreamerIdentity::default().with_niconico("42"));
        assert!(directory.tracks(PlatformType::Youtube));
        assert!(!directory.tracks(PlatformType::Twitch));
        assert!(directory.tracks(PlatformType::Niconico));
        assert_eq!(directory.streamer_ids(), vec!["a", "b"]);
    }

    #[test]
    fn resolve_unknown_streamer_is_none() {
        let directory = StreamerDirectory::new();
        assert!(directory.resolve("nobody").is_none());
        assert!(directory.is_empty());
    }
}
