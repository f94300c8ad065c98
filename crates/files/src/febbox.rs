//! FebBox file service client.
//!
//! Every call is scoped to a share: the upstream checks that the `referer`
//! points at `<base>/share/<share_key>`. The base header set is fixed when
//! the client is built; the referer is added to each request on its own, so
//! concurrent calls for different shares never see each other's value.

use std::time::Duration;

use boxbridge_core::http::{classify, read_json};
use boxbridge_core::{FileNode, QualityVariant, ShareKey, UpstreamError};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::FilesError;
use crate::quality;
use crate::source::ShareSource;

const BASE_URL: &str = "https://www.febbox.com";
const BROWSER_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FileServiceConfig {
    pub base_url: String,
    /// Value of the `ui` session cookie.
    pub cookie: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FileServiceConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            cookie: None,
            user_agent: BROWSER_UA.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct FebboxClient {
    base_url: String,
    client: reqwest::Client,
}

impl FebboxClient {
    pub fn new(config: FileServiceConfig) -> Result<Self, FilesError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| FilesError::InvalidHeader(format!("user agent: {e}")))?,
        );
        match config.cookie.as_deref() {
            Some(cookie) if !cookie.is_empty() => {
                let mut value = HeaderValue::from_str(&format!("ui={cookie}"))
                    .map_err(|e| FilesError::InvalidHeader(format!("cookie: {e}")))?;
                value.set_sensitive(true);
                headers.insert(header::COOKIE, value);
            }
            _ => tracing::warn!("no file service cookie configured; quality lists may be empty"),
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// The referer the upstream expects for calls scoped to `share_key`.
    pub fn referer(&self, share_key: &ShareKey) -> String {
        format!("{}/share/{}", self.base_url, share_key)
    }

    async fn get_json(
        &self,
        share_key: &ShareKey,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, UpstreamError> {
        let endpoint = format!("{}{path}", self.base_url);
        let request = self
            .client
            .get(&endpoint)
            .query(query)
            .header(header::REFERER, self.referer(share_key))
            .build()
            .map_err(|e| classify(&endpoint, e))?;

        let url = request.url().to_string();
        debug!(url = %url, share_key = %share_key, "febbox request");

        let resp = self
            .client
            .execute(request)
            .await
            .map_err(|e| classify(&url, e))?;
        read_json(&url, resp).await
    }
}

#[async_trait::async_trait]
impl ShareSource for FebboxClient {
    async fn list_files(
        &self,
        share_key: &ShareKey,
        parent_id: &str,
    ) -> Result<Vec<FileNode>, UpstreamError> {
        let body = self
            .get_json(
                share_key,
                "/file/file_share_list",
                &[
                    ("share_key", share_key.as_str()),
                    ("pwd", ""),
                    ("parent_id", parent_id),
                    ("is_html", "0"),
                ],
            )
            .await?;

        let Some(list) = body.pointer("/data/file_list") else {
            let msg = body["msg"].as_str().unwrap_or("missing data.file_list");
            return Err(UpstreamError::protocol(format!(
                "file_share_list for {share_key}: {msg}"
            )));
        };

        serde_json::from_value(list.clone()).map_err(|e| {
            UpstreamError::protocol(format!("file_share_list for {share_key}: {e}"))
        })
    }

    async fn quality_variants(
        &self,
        share_key: &ShareKey,
        fid: &str,
    ) -> Result<Vec<QualityVariant>, UpstreamError> {
        let body = self
            .get_json(share_key, "/console/video_quality_list", &[("fid", fid)])
            .await?;

        let html = body["html"].as_str().ok_or_else(|| {
            UpstreamError::protocol(format!("video_quality_list for fid {fid}: missing html"))
        })?;

        let variants = quality::extract(html);
        debug!(share_key = %share_key, fid, count = variants.len(), "quality variants");
        Ok(variants)
    }
}
