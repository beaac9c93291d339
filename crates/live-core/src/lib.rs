#![forbid(unsafe_code)]

pub mod aggregator;
pub mod config;
pub mod directory;
pub mod platform;

pub use aggregator::{AggregateStatus, Aggregator, FetchOutcome, PlatformResult};
pub use config::{ConfigError, LiveConfig, NiconicoConfig, TwitchConfig, YoutubeConfig};
pub use directory::{StreamerDirectory, StreamerIdentity};
pub use platform::{
    build_client, FetchError, LiveInfo, LiveStatusFetcher, NiconicoClient, PlatformType,
    TwitchClient, YoutubeClient,
};
pub use tokio_util::sync::CancellationToken;
