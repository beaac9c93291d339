//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//! log_format = "json"
//!
//! [defaults]
//! request_timeout_ms = 10000
//! lookup_timeout_ms = 12000
//!
//! [youtube]
//! api_key = "AIza..."
//!
//! [twitch]
//! auth_token = "..."
//! client_id = "..."
//!
//! [niconico]
//! categories = ["一般(その他)", "ゲーム"]
//!
//! [[streamer]]
//! id = "kuzuha"
//! youtube = "UCx1nAvtVDIsaGmCMSe8ofsQ"
//! twitch = "545050196"
//! niconico = "2598430"
//! ```
//!
//! Credentials may be left out of the file and supplied through the
//! environment instead.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use live_core::{LiveConfig, StreamerDirectory, StreamerIdentity};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub youtube: YoutubeSection,

    #[serde(default)]
    pub twitch: TwitchSection,

    #[serde(default)]
    pub niconico: NiconicoSection,

    #[serde(default)]
    pub streamer: Vec<StreamerDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_format: default_log_format(),
        }
    }
}

pub fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultsConfig {
    pub request_timeout_ms: Option<u64>,
    pub lookup_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YoutubeSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwitchSection {
    pub auth_token: Option<String>,
    pub client_id: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NiconicoSection {
    pub base_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamerDef {
    pub id: String,
    pub youtube: Option<String>,
    pub twitch: Option<String>,
    pub niconico: Option<String>,
}

impl StreamerDef {
    pub fn to_identity(&self) -> StreamerIdentity {
        StreamerIdentity {
            youtube: self.youtube.clone(),
            twitch: self.twitch.clone(),
            niconico: self.niconico.clone(),
        }
    }
}

/// Credential values taken from flags or the environment. Set values win
/// over the config file.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub youtube_api_key: Option<String>,
    pub twitch_auth_token: Option<String>,
    pub twitch_client_id: Option<String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    pub fn to_live_config(&self, overrides: &CredentialOverrides) -> LiveConfig {
        let mut c = LiveConfig::default();
        if let Some(ms) = self.defaults.request_timeout_ms {
            c = c.with_request_timeout(ms);
        }
        if let Some(ms) = self.defaults.lookup_timeout_ms {
            c = c.with_lookup_timeout(ms);
        }

        let youtube_key = overrides
            .youtube_api_key
            .clone()
            .or_else(|| self.youtube.api_key.clone());
        if let Some(key) = youtube_key {
            c = c.with_youtube_api_key(key);
        }
        if let Some(ref url) = self.youtube.base_url {
            c = c.with_youtube_base_url(url.clone());
        }

        let token = overrides
            .twitch_auth_token
            .clone()
            .or_else(|| self.twitch.auth_token.clone())
            .unwrap_or_default();
        let client_id = overrides
            .twitch_client_id
            .clone()
            .or_else(|| self.twitch.client_id.clone())
            .unwrap_or_default();
        c = c.with_twitch_credentials(token, client_id);
        if let Some(ref url) = self.twitch.base_url {
            c = c.with_twitch_base_url(url.clone());
        }

        if let Some(ref url) = self.niconico.base_url {
            c = c.with_niconico_base_url(url.clone());
        }
        c.with_niconico_categories(self.niconico.categories.clone())
    }

    pub fn to_directory(&self) -> StreamerDirectory {
        let mut directory = StreamerDirectory::new();
        for s in &self.streamer {
            directory.insert(s.id.clone(), s.to_identity());
        }
        directory
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut ids = HashSet::new();
        for s in &self.streamer {
            if s.id.trim().is_empty() {
                return Err("Streamer ID must not be empty".into());
            }
            if !ids.insert(&s.id) {
                return Err(format!("Duplicate streamer ID: {}", s.id));
            }
            if s.to_identity().is_empty() {
                return Err(format!("Streamer '{}' has no platform identifiers", s.id));
            }
        }

        let base_urls = [
            ("youtube", &self.youtube.base_url),
            ("twitch", &self.twitch.base_url),
            ("niconico", &self.niconico.base_url),
        ];
        for (platform, base_url) in base_urls {
            let Some(raw) = base_url else { continue };
            let parsed = url::Url::parse(raw)
                .map_err(|e| format!("Invalid {} base_url: {} ({})", platform, raw, e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(format!(
                    "{} base_url must use http or https: {}",
                    platform, raw
                ));
            }
        }

        match self.server.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log_format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use live_core::PlatformType;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[[streamer]]
id = "kuzuha"
niconico = "2598430"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.streamer.len(), 1);
        assert_eq!(config.server.log_format, "pretty");
        assert_eq!(config.server.listen.port(), 8080);

        let live = config.to_live_config(&CredentialOverrides::default());
        assert_eq!(live.request_timeout, Duration::from_secs(10));
        assert!(!live.has_youtube_credentials());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[server]
listen = "127.0.0.1:9090"
log_format = "json"

[defaults]
request_timeout_ms = 5000
lookup_timeout_ms = 7000

[youtube]
api_key = "yt-key"

[twitch]
auth_token = "token"
client_id = "client"
base_url = "http://localhost:9999/helix"

[niconico]
categories = ["ゲーム"]

[[streamer]]
id = "kuzuha"
youtube = "UCx1nAvtVDIsaGmCMSe8ofsQ"
twitch = "545050196"
niconico = "2598430"

[[streamer]]
id = "other"
youtube = "UC2"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.server.listen.port(), 9090);
        assert_eq!(config.server.log_format, "json");

        let live = config.to_live_config(&CredentialOverrides::default());
        assert_eq!(live.request_timeout, Duration::from_millis(5000));
        assert_eq!(live.lookup_timeout, Duration::from_millis(7000));
        assert_eq!(live.youtube.api_key, "yt-key");
        assert!(live.has_twitch_credentials());
        assert_eq!(live.twitch.base_url, "http://localhost:9999/helix");
        assert_eq!(live.niconico.categories, vec!["ゲーム"]);

        let directory = config.to_directory();
        assert_eq!(directory.len(), 2);
        let identity = directory.resolve("kuzuha").unwrap();
        assert_eq!(identity.id_for(PlatformType::Twitch), Some("545050196"));
        assert_eq!(
            directory.resolve("other").unwrap().id_for(PlatformType::Niconico),
            None
        );
        assert!(live.validate(&directory).is_ok());
    }

    #[test]
    fn overrides_win_over_file_credentials() {
        let toml = r#"
[youtube]
api_key = "from-file"

[twitch]
client_id = "file-client"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let overrides = CredentialOverrides {
            youtube_api_key: Some("from-env".into()),
            twitch_auth_token: Some("env-token".into()),
            twitch_client_id: None,
        };
        let live = config.to_live_config(&overrides);
        assert_eq!(live.youtube.api_key, "from-env");
        assert_eq!(live.twitch.auth_token, "env-token");
        assert_eq!(live.twitch.client_id, "file-client");
    }

    #[test]
    fn validate_rejects_duplicate_streamer_ids() {
        let toml = r#"
[[streamer]]
id = "same"
youtube = "UC1"

[[streamer]]
id = "same"
twitch = "1"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Duplicate streamer ID"), "{}", err);
    }

    #[test]
    fn validate_rejects_streamer_without_identifiers() {
        let toml = r#"
[[streamer]]
id = "ghost"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("no platform identifiers"), "{}", err);
    }

    #[test]
    fn validate_rejects_invalid_base_url() {
        let toml = r#"
[youtube]
base_url = "not-a-url"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid youtube base_url"), "{}", err);
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let toml = r#"
[server]
log_format = "xml"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid log_format"), "{}", err);
    }
}
