//! Title to stream URLs, across both services.
//!
//! search -> pick a candidate -> share key -> walk the share -> quality list.
//! Nothing is cached between runs and errors are passed through untouched.

use std::sync::Arc;

use boxbridge_core::{FileNode, MediaKind, QualityVariant, SearchResult, ShareKey, UpstreamError};
use boxbridge_files::ShareSource;
use boxbridge_metadata::{DEFAULT_PAGE_LIMIT, MetadataProvider};
use serde::Serialize;
use tracing::{debug, info};

use crate::walk::{TreeWalk, WalkOutcome, WalkStop};

#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub title: String,
    pub kind: MediaKind,
    /// Index into the search results.
    pub pick: usize,
    pub walk: TreeWalk,
}

impl ResolveRequest {
    pub fn new(title: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            title: title.into(),
            kind,
            pick: 0,
            walk: TreeWalk::default(),
        }
    }

    pub fn pick(mut self, index: usize) -> Self {
        self.pick = index;
        self
    }

    pub fn walk(mut self, walk: TreeWalk) -> Self {
        self.walk = walk;
        self
    }
}

/// Where a resolution ended. Only `Resolved` carries stream URLs; the other
/// variants are ordinary "nothing there" answers, not failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    NoResults,
    NoMirror {
        item: SearchResult,
    },
    NoFile {
        item: SearchResult,
        share_key: ShareKey,
        stop: WalkStop,
    },
    Resolved {
        item: SearchResult,
        share_key: ShareKey,
        /// Folders entered between the share root and `file`.
        trail: Vec<FileNode>,
        file: FileNode,
        variants: Vec<QualityVariant>,
    },
}

#[derive(Clone)]
pub struct ResolutionPipeline {
    metadata: Arc<dyn MetadataProvider>,
    files: Arc<dyn ShareSource>,
}

impl ResolutionPipeline {
    pub fn new(metadata: Arc<dyn MetadataProvider>, files: Arc<dyn ShareSource>) -> Self {
        Self { metadata, files }
    }

    pub async fn resolve(&self, req: &ResolveRequest) -> Result<Resolution, UpstreamError> {
        info!(title = %req.title, kind = %req.kind, pick = req.pick, "resolving title");

        let results = self
            .metadata
            .search(&req.title, req.kind, 1, DEFAULT_PAGE_LIMIT)
            .await?;
        debug!(title = %req.title, count = results.len(), "search results");

        let Some(item) = results.into_iter().nth(req.pick) else {
            return Ok(Resolution::NoResults);
        };

        self.resolve_item(item, &req.walk).await
    }

    /// Resolve an already chosen search result.
    pub async fn resolve_item(
        &self,
        item: SearchResult,
        walk: &TreeWalk,
    ) -> Result<Resolution, UpstreamError> {
        let Some(share_key) = self.metadata.get_share_key(&item.id, item.box_type).await? else {
            info!(id = %item.id, title = %item.title, "no mirror for item");
            return Ok(Resolution::NoMirror { item });
        };
        debug!(id = %item.id, share_key = %share_key, "share key resolved");

        let (file, trail) = match walk.run(self.files.as_ref(), &share_key).await? {
            WalkOutcome::Found { file, trail } => (file, trail),
            WalkOutcome::Stopped(stop) => {
                return Ok(Resolution::NoFile {
                    item,
                    share_key,
                    stop,
                });
            }
        };

        let variants = self.files.quality_variants(&share_key, &file.fid).await?;
        info!(
            id = %item.id,
            share_key = %share_key,
            fid = %file.fid,
            variants = variants.len(),
            "resolved"
        );

        Ok(Resolution::Resolved {
            item,
            share_key,
            trail,
            file,
            variants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::NodeSelector;
    use crate::testing::{MemoryShare, StaticMetadata, item, node, variant};
    use boxbridge_core::BoxType;

    fn pipeline(
        meta: StaticMetadata,
        share: MemoryShare,
    ) -> (ResolutionPipeline, Arc<StaticMetadata>, Arc<MemoryShare>) {
        let meta = Arc::new(meta);
        let share = Arc::new(share);
        (
            ResolutionPipeline::new(meta.clone(), share.clone()),
            meta,
            share,
        )
    }

    #[tokio::test]
    async fn empty_search_is_no_results() {
        let (p, _, share) = pipeline(StaticMetadata::default(), MemoryShare::default());
        let r = p
            .resolve(&ResolveRequest::new("nothing", MediaKind::All))
            .await
            .unwrap();
        assert_eq!(r, Resolution::NoResults);
        assert!(share.listings().is_empty());
    }

    #[tokio::test]
    async fn pick_out_of_range_is_no_results() {
        let meta = StaticMetadata {
            results: vec![item("1", "Only", BoxType::MOVIE)],
            ..Default::default()
        };
        let (p, meta, _) = pipeline(meta, MemoryShare::default());
        let r = p
            .resolve(&ResolveRequest::new("only", MediaKind::Movie).pick(3))
            .await
            .unwrap();
        assert_eq!(r, Resolution::NoResults);
        assert!(meta.share_key_lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_share_key_stops_before_file_service() {
        let meta = StaticMetadata {
            results: vec![item("9345", "Ratatouille", BoxType::MOVIE)],
            ..Default::default()
        };
        let (p, meta, share) = pipeline(meta, MemoryShare::default());
        let r = p
            .resolve(&ResolveRequest::new("ratatouille", MediaKind::Movie))
            .await
            .unwrap();

        assert!(matches!(r, Resolution::NoMirror { ref item } if item.id == "9345"));
        assert_eq!(
            *meta.share_key_lookups.lock().unwrap(),
            vec![("9345".to_string(), BoxType::MOVIE)]
        );
        assert!(share.listings().is_empty());
    }

    #[tokio::test]
    async fn movie_resolves_file_by_index() {
        let meta = StaticMetadata {
            results: vec![item("9345", "Ratatouille", BoxType::MOVIE)],
            share_keys: [("9345".to_string(), ShareKey::new("rat"))].into(),
            ..Default::default()
        };
        let share = MemoryShare::default()
            .with_folder(
                "0",
                vec![
                    node("1", "Ratatouille.720p.mp4", false),
                    node("2", "Ratatouille.1080p.mp4", false),
                ],
            )
            .with_variants("2", vec![variant("https://cdn/2.mp4", "1080P")]);
        let (p, _, share) = pipeline(meta, share);

        let req = ResolveRequest::new("ratatouille", MediaKind::Movie)
            .walk(TreeWalk::new(NodeSelector::Index { index: 1 }));
        let r = p.resolve(&req).await.unwrap();

        match r {
            Resolution::Resolved {
                share_key,
                file,
                trail,
                variants,
                ..
            } => {
                assert_eq!(share_key, ShareKey::new("rat"));
                assert_eq!(file.fid, "2");
                assert!(trail.is_empty());
                assert_eq!(variants[0].url, "https://cdn/2.mp4");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(share.listings(), vec!["0"]);
    }

    #[tokio::test]
    async fn show_descends_into_season_folder_once() {
        let meta = StaticMetadata {
            results: vec![item("1396", "Breaking Bad", BoxType::TV)],
            share_keys: [("1396".to_string(), ShareKey::new("bb"))].into(),
            ..Default::default()
        };
        let share = MemoryShare::default()
            .with_folder(
                "0",
                vec![node("100", "Season 1", true), node("200", "Season 2", true)],
            )
            .with_folder("100", vec![node("101", "S01E01.mkv", false)])
            .with_variants("101", vec![variant("https://cdn/101.mkv", "720P")]);
        let (p, _, share) = pipeline(meta, share);

        let r = p
            .resolve(&ResolveRequest::new("breaking bad", MediaKind::Tv))
            .await
            .unwrap();

        match r {
            Resolution::Resolved { file, trail, .. } => {
                assert_eq!(file.fid, "101");
                assert_eq!(trail[0].file_name, "Season 1");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(share.listings(), vec!["0", "100"]);
    }

    #[tokio::test]
    async fn unreachable_file_is_no_file() {
        let meta = StaticMetadata {
            results: vec![item("1396", "Breaking Bad", BoxType::TV)],
            share_keys: [("1396".to_string(), ShareKey::new("bb"))].into(),
            ..Default::default()
        };
        let share = MemoryShare::default().with_folder("0", vec![node("1", "Season 1", true)]);
        let (p, _, _) = pipeline(meta, share);

        let req = ResolveRequest::new("breaking bad", MediaKind::Tv)
            .walk(TreeWalk::default().with_max_depth(0));
        let r = p.resolve(&req).await.unwrap();
        assert!(matches!(
            r,
            Resolution::NoFile { stop: WalkStop::DepthLimit { .. }, .. }
        ));
    }

    #[tokio::test]
    async fn upstream_errors_are_not_translated() {
        let failure = UpstreamError::Transport {
            url: "https://meta.example/api".into(),
            status: "502 Bad Gateway".into(),
        };
        let meta = StaticMetadata {
            search_error: Some(failure.clone()),
            ..Default::default()
        };
        let (p, _, _) = pipeline(meta, MemoryShare::default());
        let err = p
            .resolve(&ResolveRequest::new("x", MediaKind::All))
            .await
            .unwrap_err();
        assert_eq!(err, failure);
    }

    #[test]
    fn resolution_serializes_with_status_tag() {
        let json = serde_json::to_value(Resolution::NoMirror {
            item: item("1", "A", BoxType::MOVIE),
        })
        .unwrap();
        assert_eq!(json["status"], "no_mirror");
        assert_eq!(json["item"]["id"], "1");
    }
}
