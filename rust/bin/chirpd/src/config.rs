//! Server configuration, read from a TOML file.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/chirp"
//!
//! [identity]
//! header = "x-user-id"
//!
//! [feed]
//! default_page_size = 20
//! max_page_size = 100
//! max_tweet_chars = 280
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;

use chirp_core::ServiceConfig;
use chirp_social::FeedConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory for the database file.
    pub data_dir: String,

    /// Explicit database path. Defaults to `{data_dir}/social.redb`.
    #[serde(default)]
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Header a trusted upstream proxy sets to the caller's user id.
    #[serde(default = "default_identity_header")]
    pub header: String,
}

fn default_identity_header() -> String {
    "x-user-id".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            header: default_identity_header(),
        }
    }
}

impl ServerConfig {
    /// A bare name resolves to `/etc/chirp/<name>.toml`; anything with a `/`
    /// or `.` is used as a path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/chirp/{name_or_path}.toml"))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: ServerConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            bail!("storage.data_dir must be set");
        }
        if self.identity.header.trim().is_empty() {
            bail!("identity.header must not be empty");
        }
        let feed = &self.feed;
        if feed.default_page_size == 0 || feed.max_page_size == 0 {
            bail!("feed page sizes must be positive");
        }
        if feed.default_page_size > feed.max_page_size {
            bail!(
                "feed.default_page_size ({}) exceeds feed.max_page_size ({})",
                feed.default_page_size,
                feed.max_page_size
            );
        }
        if feed.max_tweet_chars == 0 {
            bail!("feed.max_tweet_chars must be positive");
        }
        Ok(())
    }

    pub fn service_config(&self, listen: &str) -> ServiceConfig {
        ServiceConfig {
            data_dir: Some(PathBuf::from(&self.storage.data_dir)),
            db_path: self.storage.db_path.as_ref().map(PathBuf::from),
            listen: listen.to_string(),
        }
    }
}
