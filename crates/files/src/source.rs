use boxbridge_core::{FileNode, QualityVariant, ShareKey, UpstreamError};

/// A file service that exposes shared folders one level at a time.
#[async_trait::async_trait]
pub trait ShareSource: Send + Sync {
    /// List the direct children of `parent_id` (use [`FileNode::ROOT`] for the top level).
    ///
    /// Exactly one upstream request per call; order is the upstream's.
    async fn list_files(
        &self,
        share_key: &ShareKey,
        parent_id: &str,
    ) -> Result<Vec<FileNode>, UpstreamError>;

    /// Playable renditions of one file in the share.
    async fn quality_variants(
        &self,
        share_key: &ShareKey,
        fid: &str,
    ) -> Result<Vec<QualityVariant>, UpstreamError>;
}
