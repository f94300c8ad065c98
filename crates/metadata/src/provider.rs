use boxbridge_core::{BoxType, MediaDetail, MediaKind, SearchResult, ShareKey, UpstreamError};

/// Page size the mobile client asks for.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// A metadata source that can search titles and bridge an item to its file share.
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Search by title. Results come back in upstream order.
    async fn search(
        &self,
        title: &str,
        kind: MediaKind,
        page: u32,
        page_limit: u32,
    ) -> Result<Vec<SearchResult>, UpstreamError>;

    /// Get the full detail record for a movie id.
    async fn get_movie_details(&self, id: &str) -> Result<MediaDetail, UpstreamError>;

    /// Get the full detail record for a show id.
    async fn get_show_details(&self, id: &str) -> Result<MediaDetail, UpstreamError>;

    /// Resolve an item to the share key of its mirror folder.
    ///
    /// `Ok(None)` means no mirror exists; it is not a failure.
    async fn get_share_key(
        &self,
        id: &str,
        box_type: BoxType,
    ) -> Result<Option<ShareKey>, UpstreamError>;
}
