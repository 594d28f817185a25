use crate::danmaku::parse_comment_document;
use crate::retry::{BlockRetryPolicy, RetryConfig, RetryStrategy};
use crate::source::VideoSource;
use crate::throttle::{Throttle, ThrottleConfig};
use insight_core::{
    CommentRecord, CoreError, CrawlSettings, ErrorExt, FailureClass, SearchResult, StreamId,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const TITLE_LOG_CHARS: usize = 50;

/// Shared stop request, set from a signal handler and polled between requests.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    requested: Arc<AtomicBool>,
    crawling: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Whether a crawl has started observing this flag. Before that there
    /// is nothing to wind down and a stop request can end the process.
    pub fn is_crawling(&self) -> bool {
        self.crawling.load(Ordering::SeqCst)
    }

    fn mark_crawling(&self) {
        self.crawling.store(true, Ordering::SeqCst);
    }
}

/// What one `crawl()` call collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOutcome {
    pub comments: Vec<CommentRecord>,
    /// Distinct videos the crawl tried to fetch comments for.
    pub videos_seen: usize,
    /// Videos dropped because no stream id could be resolved.
    pub videos_skipped: usize,
    pub interrupted: bool,
}

/// Sequential, throttled crawler over a [`VideoSource`].
///
/// Failures never escape: a failing page ends that keyword's search, a
/// failing video is skipped, and the caller always gets whatever was
/// collected.
pub struct Crawler<S: VideoSource> {
    source: S,
    page_size: u32,
    throttle: Throttle,
    retry_policy: BlockRetryPolicy,
    interrupt: InterruptFlag,
}

impl<S: VideoSource> Crawler<S> {
    pub fn new(source: S, settings: &CrawlSettings) -> Self {
        Self {
            source,
            page_size: settings.page_size,
            throttle: Throttle::new(ThrottleConfig::from(settings)),
            retry_policy: BlockRetryPolicy::new(RetryConfig::from(settings)),
            interrupt: InterruptFlag::new(),
        }
    }

    pub fn with_throttle(mut self, config: ThrottleConfig) -> Self {
        self.throttle = Throttle::new(config);
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_policy = BlockRetryPolicy::new(config);
        self
    }

    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    pub fn interrupt(&self) -> &InterruptFlag {
        &self.interrupt
    }

    /// Page through search results for `keyword` until `max_videos` are
    /// collected, a page comes back empty, or a request fails.
    pub async fn search_videos(&self, keyword: &str, max_videos: usize) -> Vec<SearchResult> {
        let mut videos: Vec<SearchResult> = Vec::new();
        let mut page: u32 = 1;
        let mut block_retries: u32 = 0;

        info!("Searching keyword: {}", keyword);

        while videos.len() < max_videos {
            self.throttle.before_search_page().await;
            if self.interrupt.is_triggered() {
                info!("Interrupted while searching {}", keyword);
                break;
            }

            match self.source.search_page(keyword, page, self.page_size).await {
                Ok(results) => {
                    if results.is_empty() {
                        info!("No more results on page {} for {}", page, keyword);
                        break;
                    }
                    let room = max_videos - videos.len();
                    videos.extend(results.into_iter().take(room));
                    info!("Collected {} videos so far for {}", videos.len(), keyword);
                    page += 1;
                }
                Err(e) => match self.retry_policy.decide(page, block_retries, &e) {
                    RetryStrategy::RetryWithDelay(delay) => {
                        warn!(
                            "Search for {} blocked on page {} ({}), retrying in {:?}",
                            keyword, page, e, delay
                        );
                        block_retries += 1;
                        self.throttle.pause(delay).await;
                    }
                    RetryStrategy::NoRetry => {
                        log_search_abort(keyword, page, &e);
                        break;
                    }
                },
            }
        }

        videos
    }

    /// `None` means the video should be skipped.
    pub async fn resolve_stream_id(&self, video_id: &str) -> Option<StreamId> {
        match self.source.stream_id(video_id).await {
            Ok(Some(stream_id)) => Some(stream_id),
            Ok(None) => {
                warn!("Video {} has no stream id", video_id);
                None
            }
            Err(e) => {
                warn!("Failed to resolve stream id for {}: {}", video_id, e);
                None
            }
        }
    }

    /// Comments of one stream in document order; empty on any failure.
    pub async fn fetch_comments(&self, stream_id: StreamId) -> Vec<CommentRecord> {
        let document = match self.source.comment_document(stream_id).await {
            Ok(document) => document,
            Err(e) => {
                warn!("Failed to fetch comments for stream {}: {}", stream_id, e);
                return Vec::new();
            }
        };

        match parse_comment_document(&document) {
            Ok(comments) => comments,
            Err(e) => {
                warn!("Failed to parse comments for stream {}: {}", stream_id, e);
                Vec::new()
            }
        }
    }

    /// Search every keyword and collect the comments of each distinct video.
    pub async fn crawl(&self, keywords: &[String], max_videos_per_keyword: usize) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::default();
        let mut visited: HashSet<String> = HashSet::new();
        self.interrupt.mark_crawling();

        self.source.warm_up().await;
        self.throttle.after_warmup().await;

        'keywords: for keyword in keywords {
            if self.interrupt.is_triggered() {
                break;
            }
            info!("Processing keyword: {}", keyword);
            let videos = self.search_videos(keyword, max_videos_per_keyword).await;
            let total = videos.len();

            for (i, video) in videos.into_iter().enumerate() {
                if self.interrupt.is_triggered() {
                    break 'keywords;
                }
                if !visited.insert(video.video_id.clone()) {
                    debug!("Skipping already crawled video {}", video.video_id);
                    continue;
                }
                outcome.videos_seen += 1;

                let title: String = video.title.chars().take(TITLE_LOG_CHARS).collect();
                info!("[{}/{}] Processing video: {}", i + 1, total, title);

                match self.resolve_stream_id(&video.video_id).await {
                    Some(stream_id) => {
                        let comments = self.fetch_comments(stream_id).await;
                        info!("  Fetched {} comments", comments.len());
                        outcome.comments.extend(comments);
                        self.throttle.between_videos().await;
                    }
                    None => {
                        outcome.videos_skipped += 1;
                        warn!("  Skipping {}: no stream id", video.video_id);
                    }
                }
            }
        }

        outcome.interrupted = self.interrupt.is_triggered();
        info!(
            "Crawl finished: {} comments from {} videos ({} skipped, waited {:?}{})",
            outcome.comments.len(),
            outcome.videos_seen,
            outcome.videos_skipped,
            self.throttle.total_wait(),
            if outcome.interrupted { ", interrupted" } else { "" }
        );
        outcome
    }
}

fn log_search_abort(keyword: &str, page: u32, e: &CoreError) {
    match e.failure_class() {
        FailureClass::Blocked => {
            error!(
                "Search for {} blocked on page {}: {}",
                keyword,
                page,
                e.user_friendly_message()
            );
        }
        FailureClass::Malformed => {
            error!("Unreadable search response for {} on page {}: {}", keyword, page, e);
        }
        _ => {
            error!("Search request for {} failed on page {}: {}", keyword, page, e);
        }
    }
}
