//! In-memory upstream fakes for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use boxbridge_core::{
    BoxType, FileNode, MediaDetail, MediaKind, QualityVariant, SearchResult, ShareKey,
    UpstreamError,
};
use boxbridge_files::ShareSource;
use boxbridge_metadata::MetadataProvider;

pub fn node(fid: &str, name: &str, is_dir: bool) -> FileNode {
    FileNode {
        fid: fid.into(),
        file_name: name.into(),
        is_dir,
        parent_id: None,
        extra: Default::default(),
    }
}

pub fn variant(url: &str, quality: &str) -> QualityVariant {
    QualityVariant {
        url: url.into(),
        quality: quality.into(),
        name: None,
        speed: None,
        size: None,
    }
}

pub fn item(id: &str, title: &str, box_type: BoxType) -> SearchResult {
    SearchResult {
        id: id.into(),
        title: title.into(),
        box_type,
        extra: Default::default(),
    }
}

#[derive(Default)]
pub struct MemoryShare {
    folders: HashMap<String, Vec<FileNode>>,
    variants: HashMap<String, Vec<QualityVariant>>,
    listings: Mutex<Vec<String>>,
}

impl MemoryShare {
    pub fn with_folder(mut self, parent: &str, nodes: Vec<FileNode>) -> Self {
        self.folders.insert(parent.to_string(), nodes);
        self
    }

    pub fn with_variants(mut self, fid: &str, variants: Vec<QualityVariant>) -> Self {
        self.variants.insert(fid.to_string(), variants);
        self
    }

    /// Parent ids listed so far, in call order.
    pub fn listings(&self) -> Vec<String> {
        self.listings.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ShareSource for MemoryShare {
    async fn list_files(
        &self,
        _share_key: &ShareKey,
        parent_id: &str,
    ) -> Result<Vec<FileNode>, UpstreamError> {
        self.listings.lock().unwrap().push(parent_id.to_string());
        self.folders
            .get(parent_id)
            .cloned()
            .ok_or_else(|| UpstreamError::protocol(format!("no folder {parent_id}")))
    }

    async fn quality_variants(
        &self,
        _share_key: &ShareKey,
        fid: &str,
    ) -> Result<Vec<QualityVariant>, UpstreamError> {
        Ok(self.variants.get(fid).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct StaticMetadata {
    pub results: Vec<SearchResult>,
    pub share_keys: HashMap<String, ShareKey>,
    pub search_error: Option<UpstreamError>,
    pub share_key_lookups: Mutex<Vec<(String, BoxType)>>,
}

#[async_trait::async_trait]
impl MetadataProvider for StaticMetadata {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(
        &self,
        _title: &str,
        _kind: MediaKind,
        _page: u32,
        _page_limit: u32,
    ) -> Result<Vec<SearchResult>, UpstreamError> {
        match &self.search_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.results.clone()),
        }
    }

    async fn get_movie_details(&self, id: &str) -> Result<MediaDetail, UpstreamError> {
        Ok(MediaDetail(serde_json::json!({ "id": id })))
    }

    async fn get_show_details(&self, id: &str) -> Result<MediaDetail, UpstreamError> {
        Ok(MediaDetail(serde_json::json!({ "id": id })))
    }

    async fn get_share_key(
        &self,
        id: &str,
        box_type: BoxType,
    ) -> Result<Option<ShareKey>, UpstreamError> {
        self.share_key_lookups
            .lock()
            .unwrap()
            .push((id.to_string(), box_type));
        Ok(self.share_keys.get(id).cloned())
    }
}
