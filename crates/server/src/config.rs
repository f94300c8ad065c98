use std::time::Duration;

use anyhow::Context;
use boxbridge_files::FileServiceConfig;
use boxbridge_metadata::MetadataConfig;

const DEFAULT_PORT: &str = "3000";

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub metadata: MetadataConfig,
    pub files: FileServiceConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BOXBRIDGE_BIND").unwrap_or_else(|| {
            let port = get("API_PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
            format!("0.0.0.0:{port}")
        });

        let timeout = match get("BOXBRIDGE_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .with_context(|| format!("BOXBRIDGE_TIMEOUT_SECS is not a number: {v}"))?,
            ),
            None => Duration::from_secs(30),
        };

        let mut metadata = MetadataConfig {
            timeout,
            ..Default::default()
        };
        if let Some(url) = get("BOXBRIDGE_METADATA_URL") {
            metadata.api_url = url;
        }
        if let Some(url) = get("BOXBRIDGE_SHARE_LINK_URL") {
            metadata.share_link_url = url;
        }

        let mut files = FileServiceConfig {
            cookie: get("FEBBOX_UI_COOKIE"),
            timeout,
            ..Default::default()
        };
        if let Some(url) = get("BOXBRIDGE_FILES_URL") {
            files.base_url = url.trim_end_matches('/').to_string();
        }

        Ok(Self {
            bind_addr,
            metadata,
            files,
        })
    }
}
