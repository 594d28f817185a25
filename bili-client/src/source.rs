use async_trait::async_trait;
use insight_core::{CoreError, SearchResult, StreamId};

/// The three platform calls the crawler depends on.
///
/// Implemented by [`crate::BiliApiClient`] against the live API; tests
/// substitute a scripted source so pagination, retry and deduplication can
/// be exercised without a network.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// One page (1-based) of video search results. An empty vector means
    /// there are no further pages.
    async fn search_page(
        &self,
        keyword: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<SearchResult>, CoreError>;

    /// Map a public video id to the id of its comment document.
    async fn stream_id(&self, video_id: &str) -> Result<Option<StreamId>, CoreError>;

    /// Raw comment document for a stream.
    async fn comment_document(&self, stream_id: StreamId) -> Result<String, CoreError>;

    /// Prepare the session before the first request.
    async fn warm_up(&self) {}
}
