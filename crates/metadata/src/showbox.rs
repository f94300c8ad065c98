//! Showbox metadata service client.
//!
//! Search and detail calls go through the encrypted `api_client` endpoint;
//! share-link resolution is a plain GET against the website.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use boxbridge_core::http::{classify, read_json};
use boxbridge_core::{BoxType, MediaDetail, MediaKind, SearchResult, ShareKey, UpstreamError};
use rand::RngCore;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde_json::{Map, Value};
use tracing::debug;

use crate::MetadataError;
use crate::cipher::{CipherCodec, CipherKeys};
use crate::provider::MetadataProvider;

const API_URL: &str = "https://mbpapi.shegu.net/api/api_client/index/";
const SHARE_LINK_URL: &str = "https://www.showbox.media/index/share_link";

/// Device identity the mobile client reports with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub child_mode: String,
    pub app_version: String,
    pub lang: String,
    pub platform: String,
    pub channel: String,
    pub appid: String,
    pub version: String,
    pub medium: String,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            child_mode: "0".into(),
            app_version: "11.5".into(),
            lang: "en".into(),
            platform: "android".into(),
            channel: "Website".into(),
            appid: "27".into(),
            version: "129".into(),
            medium: "Website".into(),
        }
    }
}

impl DeviceProfile {
    /// Upper-case keys as they appear inside the encrypted payload.
    fn payload_fields(&self) -> [(&'static str, &str); 8] {
        [
            ("CHILD_MODE", &self.child_mode),
            ("APP_VERSION", &self.app_version),
            ("LANG", &self.lang),
            ("PLATFORM", &self.platform),
            ("CHANNEL", &self.channel),
            ("APPID", &self.appid),
            ("VERSION", &self.version),
            ("MEDIUM", &self.medium),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct MetadataConfig {
    pub api_url: String,
    pub share_link_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub keys: CipherKeys,
    pub device: DeviceProfile,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            share_link_url: SHARE_LINK_URL.to_string(),
            user_agent: "okhttp/3.2.0".to_string(),
            timeout: Duration::from_secs(30),
            keys: CipherKeys::mobile_client(),
            device: DeviceProfile::default(),
        }
    }
}

#[derive(Clone)]
pub struct ShowboxClient {
    config: MetadataConfig,
    codec: CipherCodec,
    client: reqwest::Client,
}

impl ShowboxClient {
    pub fn new(config: MetadataConfig) -> Result<Self, MetadataError> {
        let codec = CipherCodec::new(&config.keys)?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            codec,
            client,
        })
    }

    pub fn codec(&self) -> &CipherCodec {
        &self.codec
    }

    /// Device defaults, then `expired_date` and `module`, then the call's own params.
    fn build_payload(&self, module: &str, params: Map<String, Value>, expired_date: i64) -> Value {
        let mut payload: Map<String, Value> = self
            .config
            .device
            .payload_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        payload.insert("expired_date".into(), expired_date.into());
        payload.insert("module".into(), module.into());
        payload.extend(params);
        Value::Object(payload)
    }

    /// Form body carrying the sealed payload, with the nonce glued on outside the encoding.
    fn build_body(&self, payload: &Value, token: &str) -> String {
        let envelope = self.codec.seal(&payload.to_string());
        // Serializing a struct of three strings cannot fail.
        let envelope_json = serde_json::to_string(&envelope).unwrap_or_default();
        let device = &self.config.device;

        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("data", &BASE64.encode(envelope_json))
            .append_pair("appid", &device.appid)
            .append_pair("platform", &device.platform)
            .append_pair("version", &device.version)
            .append_pair("medium", &device.medium)
            .finish();

        format!("{form}&token{token}")
    }

    async fn request(&self, module: &str, params: Map<String, Value>) -> Result<Value, UpstreamError> {
        let url = self.config.api_url.as_str();
        let payload = self.build_payload(module, params, CipherCodec::expiry_timestamp());
        let body = self.build_body(&payload, &request_token());
        debug!(module, url, "showbox request");

        let resp = self
            .client
            .post(url)
            .header("Platform", &self.config.device.platform)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(USER_AGENT, &self.config.user_agent)
            .body(body)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let mut data: Value = read_json(url, resp).await?;
        let inner = data.get_mut("data").map(Value::take);
        match inner {
            Some(Value::Null) | None => {
                let msg = data["msg"].as_str().unwrap_or("response has no data field");
                Err(UpstreamError::protocol(format!("{module}: {msg}")))
            }
            Some(inner) => Ok(inner),
        }
    }
}

#[async_trait::async_trait]
impl MetadataProvider for ShowboxClient {
    fn name(&self) -> &str {
        "showbox"
    }

    async fn search(
        &self,
        title: &str,
        kind: MediaKind,
        page: u32,
        page_limit: u32,
    ) -> Result<Vec<SearchResult>, UpstreamError> {
        let mut params = Map::new();
        params.insert("page".into(), page.into());
        params.insert("type".into(), kind.as_str().into());
        params.insert("keyword".into(), title.into());
        params.insert("pagelimit".into(), page_limit.into());

        let data = self.request("Search5", params).await?;
        serde_json::from_value(data)
            .map_err(|e| UpstreamError::protocol(format!("Search5: unexpected result list: {e}")))
    }

    async fn get_movie_details(&self, id: &str) -> Result<MediaDetail, UpstreamError> {
        let mut params = Map::new();
        params.insert("mid".into(), id_value(id));
        self.request("Movie_detail", params).await.map(MediaDetail)
    }

    async fn get_show_details(&self, id: &str) -> Result<MediaDetail, UpstreamError> {
        let mut params = Map::new();
        params.insert("tid".into(), id_value(id));
        self.request("TV_detail_v2", params).await.map(MediaDetail)
    }

    async fn get_share_key(
        &self,
        id: &str,
        box_type: BoxType,
    ) -> Result<Option<ShareKey>, UpstreamError> {
        let url = self.config.share_link_url.as_str();
        debug!(id, %box_type, "share link request");

        let resp = self
            .client
            .get(url)
            .query(&[("id", id.to_string()), ("type", box_type.to_string())])
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let data: Value = read_json(url, resp).await?;
        Ok(data["data"]["link"].as_str().and_then(share_key_from_link))
    }
}

/// Ids are numeric upstream; anything that would not survive the round trip
/// (leading zeros, non-digits) stays a string.
fn id_value(id: &str) -> Value {
    match id.parse::<u64>() {
        Ok(n) if n.to_string() == id => Value::from(n),
        _ => id.into(),
    }
}

/// Last non-empty path segment of a share URL, e.g. `.../share/abcd1234` -> `abcd1234`.
pub fn share_key_from_link(link: &str) -> Option<ShareKey> {
    let path = match url::Url::parse(link) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => link.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.rsplit('/')
        .find(|seg| !seg.is_empty())
        .map(ShareKey::new)
}

/// 32 lowercase hex chars, fresh per request.
fn request_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
