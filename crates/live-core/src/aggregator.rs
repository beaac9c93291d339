use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{ConfigError, LiveConfig};
use crate::directory::StreamerDirectory;
use crate::platform::{
    build_client, FetchError, LiveInfo, LiveStatusFetcher, NiconicoClient, PlatformType,
    TwitchClient, YoutubeClient,
};

/// How a platform entry was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// The platform answered and its answer was normalized.
    Fetched,
    /// No identifier or no client for this platform; nothing was requested.
    Untracked,
    /// The call failed; the entry reports offline.
    Degraded { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformResult {
    pub platform: PlatformType,
    pub live: LiveInfo,
    pub outcome: FetchOutcome,
}

impl PlatformResult {
    fn fetched(platform: PlatformType, live: LiveInfo) -> Self {
        Self {
            platform,
            live,
            outcome: FetchOutcome::Fetched,
        }
    }

    fn untracked(platform: PlatformType) -> Self {
        Self {
            platform,
            live: LiveInfo::offline(),
            outcome: FetchOutcome::Untracked,
        }
    }

    fn degraded(platform: PlatformType, error: &FetchError) -> Self {
        Self {
            platform,
            live: LiveInfo::offline(),
            outcome: FetchOutcome::Degraded {
                reason: error.to_string(),
            },
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.is_live
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Degraded { .. })
    }
}

/// Result of one streamer lookup: one entry per platform, in
/// [`PlatformType::ALL`] order.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateStatus {
    pub lookup_id: Uuid,
    pub streamer_id: String,
    pub checked_at: DateTime<Utc>,
    pub results: Vec<PlatformResult>,
}

impl AggregateStatus {
    pub fn get(&self, platform: PlatformType) -> Option<&PlatformResult> {
        self.results.iter().find(|r| r.platform == platform)
    }

    pub fn live_platforms(&self) -> Vec<PlatformType> {
        self.results
            .iter()
            .filter(|r| r.is_live())
            .map(|r| r.platform)
            .collect()
    }

    pub fn degraded_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_degraded()).count()
    }
}

/// Fans a streamer lookup out to every configured platform client.
pub struct Aggregator {
    directory: StreamerDirectory,
    fetchers: HashMap<PlatformType, Arc<dyn LiveStatusFetcher>>,
    lookup_timeout: Duration,
}

impl Aggregator {
    pub fn new(directory: StreamerDirectory, lookup_timeout: Duration) -> Self {
        Self {
            directory,
            fetchers: HashMap::new(),
            lookup_timeout,
        }
    }

    /// Registers `fetcher` for its platform, replacing any previous one.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn LiveStatusFetcher>) -> Self {
        self.fetchers.insert(fetcher.platform(), fetcher);
        self
    }

    /// Validates credentials and builds one client per usable platform.
    pub fn from_config(
        config: &LiveConfig,
        directory: StreamerDirectory,
    ) -> Result<Self, ConfigError> {
        let client = build_client(config.request_timeout)?;
        Self::from_config_with_client(config, directory, client)
    }

    pub fn from_config_with_client(
        config: &LiveConfig,
        directory: StreamerDirectory,
        client: Client,
    ) -> Result<Self, ConfigError> {
        config.validate(&directory)?;

        let mut aggregator = Self::new(directory, config.lookup_timeout);
        if config.has_youtube_credentials() {
            let youtube = YoutubeClient::new(&config.youtube, client.clone())?;
            aggregator = aggregator.with_fetcher(Arc::new(youtube));
        }
        if config.has_twitch_credentials() {
            let twitch = TwitchClient::new(&config.twitch, client.clone())?;
            aggregator = aggregator.with_fetcher(Arc::new(twitch));
        }
        let niconico = NiconicoClient::new(&config.niconico, client)?;
        Ok(aggregator.with_fetcher(Arc::new(niconico)))
    }

    pub fn directory(&self) -> &StreamerDirectory {
        &self.directory
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// Platforms with a registered client, in canonical order.
    pub fn platforms(&self) -> Vec<PlatformType> {
        PlatformType::ALL
            .into_iter()
            .filter(|p| self.fetchers.contains_key(p))
            .collect()
    }

    /// Looks up `streamer_id` bounded by the configured lookup timeout.
    pub async fn aggregate(&self, streamer_id: &str) -> AggregateStatus {
        let deadline = Instant::now() + self.lookup_timeout;
        self.aggregate_with(streamer_id, deadline, &CancellationToken::new())
            .await
    }

    /// Looks up `streamer_id`, resolving unfinished platform calls to
    /// degraded entries once `deadline` passes or `cancel` fires.
    pub async fn aggregate_with(
        &self,
        streamer_id: &str,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> AggregateStatus {
        let lookup_id = Uuid::new_v4();
        let span = info_span!("lookup", %lookup_id, streamer_id);

        async move {
            let identity = match self.directory.resolve(streamer_id) {
                Some(identity) => identity.clone(),
                None => {
                    debug!("Streamer not in directory, reporting all platforms offline");
                    Default::default()
                }
            };

            let lookups = PlatformType::ALL.into_iter().map(|platform| {
                let target = identity
                    .id_for(platform)
                    .zip(self.fetchers.get(&platform));
                async move {
                    let Some((identifier, fetcher)) = target else {
                        return PlatformResult::untracked(platform);
                    };
                    match fetch_bounded(fetcher.as_ref(), identifier, deadline, cancel).await {
                        Ok(live) => {
                            debug!(%platform, is_live = live.is_live, "Platform lookup completed");
                            PlatformResult::fetched(platform, live)
                        }
                        Err(e) => {
                            warn!(
                                %platform,
                                error = %e,
                                "Platform lookup failed, reporting offline"
                            );
                            PlatformResult::degraded(platform, &e)
                        }
                    }
                }
            });

            let results = join_all(lookups).await;
            let status = AggregateStatus {
                lookup_id,
                streamer_id: streamer_id.to_string(),
                checked_at: Utc::now(),
                results,
            };

            info!(
                live = ?status.live_platforms(),
                degraded = status.degraded_count(),
                "Lookup completed"
            );
            status
        }
        .instrument(span)
        .await
    }
}

async fn fetch_bounded(
    fetcher: &dyn LiveStatusFetcher,
    identifier: &str,
    deadline: Instant,
    cancel: &CancellationToken,
) -> Result<LiveInfo, FetchError> {
    let platform = fetcher.platform();
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled { platform }),
        result = tokio::time::timeout_at(deadline, fetcher.fetch_live(identifier)) => {
            result.unwrap_or(Err(FetchError::Timeout { platform }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StreamerIdentity;

    #[test]
    fn from_config_registers_only_credentialed_platforms() {
        let directory = StreamerDirectory::new()
            .with_streamer("s", StreamerIdentity::default().with_niconico("1"));
        let aggregator = Aggregator::from_config(&LiveConfig::default(), directory).unwrap();
        assert_eq!(aggregator.platforms(), vec![PlatformType::Niconico]);

        let config = LiveConfig::default()
            .with_youtube_api_key("key")
            .with_twitch_credentials("token", "client");
        let aggregator = Aggregator::from_config(&config, StreamerDirectory::new()).unwrap();
        assert_eq!(aggregator.platforms(), PlatformType::ALL.to_vec());
    }

    #[test]
    fn from_config_fails_on_missing_credentials() {
        let directory = StreamerDirectory::new()
            .with_streamer("s", StreamerIdentity::default().with_twitch("545050196"));
        let result = Aggregator::from_config(&LiveConfig::default(), directory);
        assert!(matches!(
            result,
            Err(ConfigError::MissingCredential {
                platform: PlatformType::Twitch,
                ..
            })
        ));
    }

    #[test]
    fn from_config_rejects_bad_base_url() {
        let config = LiveConfig::default().with_niconico_base_url("mailto:someone");
        let result = Aggregator::from_config(&config, StreamerDirectory::new());
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
    }

    #[tokio::test]
    async fn unknown_streamer_reports_every_platform_untracked() {
        let aggregator = Aggregator::new(StreamerDirectory::new(), Duration::from_secs(1));
        let status = aggregator.aggregate("nobody").await;
        assert_eq!(status.results.len(), 3);
        for (result, platform) in status.results.iter().zip(PlatformType::ALL) {
            assert_eq!(result.platform, platform);
            assert_eq!(result.outcome, FetchOutcome::Untracked);
            assert!(!result.is_live());
        }
    }
}
