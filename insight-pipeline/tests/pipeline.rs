use async_trait::async_trait;
use bili_client::{Crawler, InterruptFlag, RetryConfig, ThrottleConfig, VideoSource};
use insight_core::{
    AppConfig, BiliApiError, CachePolicy, CommentStats, CoreError, ReportSettings, SearchResult,
    StreamId,
};
use insight_pipeline::{
    CacheDecision, CommentCache, FixedDecision, Pipeline, PipelineOutcome, ReportSink,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// One page of videos per keyword; every video carries the same comments.
struct FixedSource {
    videos_per_keyword: usize,
    comments: Vec<&'static str>,
    searches: AtomicUsize,
    interrupt_on_first_document: Option<InterruptFlag>,
}

impl FixedSource {
    fn new(videos_per_keyword: usize, comments: Vec<&'static str>) -> Self {
        Self {
            videos_per_keyword,
            comments,
            searches: AtomicUsize::new(0),
            interrupt_on_first_document: None,
        }
    }
}

#[async_trait]
impl VideoSource for FixedSource {
    async fn search_page(
        &self,
        keyword: &str,
        page: u32,
        _page_size: u32,
    ) -> Result<Vec<SearchResult>, CoreError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if page > 1 {
            return Ok(Vec::new());
        }
        Ok((0..self.videos_per_keyword)
            .map(|i| SearchResult {
                video_id: format!("{}-{}", keyword, i),
                title: format!("{} 第{}个", keyword, i),
                view_count: 1,
                comment_count: 1,
            })
            .collect())
    }

    async fn stream_id(&self, video_id: &str) -> Result<Option<StreamId>, CoreError> {
        if video_id.is_empty() {
            return Err(CoreError::BiliApi(BiliApiError::EmptyResponse {
                endpoint: "pagelist".to_string(),
            }));
        }
        Ok(StreamId::from_raw(video_id.len() as u64))
    }

    async fn comment_document(&self, _stream_id: StreamId) -> Result<String, CoreError> {
        if let Some(flag) = &self.interrupt_on_first_document {
            flag.trigger();
        }
        let body: String = self
            .comments
            .iter()
            .map(|c| format!("<d p=\"0\">{}</d>", c))
            .collect();
        Ok(format!("<i>{}</i>", body))
    }
}

/// Keeps every published `CommentStats` for inspection.
#[derive(Clone, Default)]
struct RecordingSink {
    published: Arc<Mutex<Vec<CommentStats>>>,
}

impl ReportSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn publish(&self, stats: &CommentStats) -> Result<(), CoreError> {
        self.published.lock().unwrap().push(stats.clone());
        Ok(())
    }
}

fn config(dir: &Path, keywords: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.keywords = keywords.iter().map(|k| k.to_string()).collect();
    config.cache.path = dir.join("danmaku_cache.txt");
    config.cache.policy = CachePolicy::Never;
    config.report = ReportSettings {
        console_summary: false,
        stats_path: None,
        narrative_path: None,
    };
    config
}

fn quiet_crawler(source: FixedSource, config: &AppConfig) -> Crawler<FixedSource> {
    Crawler::new(source, &config.crawl)
        .with_throttle(ThrottleConfig::disabled())
        .with_retry_config(RetryConfig {
            max_block_retries: 1,
            block_retry_delay: Duration::ZERO,
        })
}

#[tokio::test]
async fn test_fresh_crawl_is_ranked_published_and_cached() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), &["大模型"]);
    let source = FixedSource::new(3, vec!["大模型真厉害", "666", "大模型真厉害", "点赞"]);
    let sink = RecordingSink::default();

    let mut pipeline = Pipeline::from_config(quiet_crawler(source, &config), &config)
        .unwrap()
        .with_sinks(vec![Box::new(sink.clone())]);

    let stats = match pipeline.run().await.unwrap() {
        PipelineOutcome::Completed(stats) => stats,
        other => panic!("expected completion, got {:?}", other),
    };

    assert_eq!(stats.original_count, 12);
    assert_eq!(stats.filtered_count, 6);
    assert_eq!(stats.top_entries.len(), 1);
    assert_eq!(stats.top_entries[0].text, "大模型真厉害");
    assert_eq!(stats.top_entries[0].count, 6);
    assert_eq!(sink.published.lock().unwrap().len(), 1);

    let cached = CommentCache::new(dir.path().join("danmaku_cache.txt"))
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(cached.len(), 12);
}

#[tokio::test]
async fn test_reused_cache_skips_crawl() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), &["大模型"]);
    config.cache.policy = CachePolicy::Always;
    std::fs::write(&config.cache.path, "缓存里的弹幕\n缓存里的弹幕\nGPT写代码").unwrap();

    let mut pipeline = Pipeline::from_config(
        quiet_crawler(FixedSource::new(5, vec!["不会出现"]), &config),
        &config,
    )
    .unwrap();

    match pipeline.run().await.unwrap() {
        PipelineOutcome::Completed(stats) => {
            assert_eq!(stats.original_count, 3);
            assert_eq!(stats.top_entries[0].text, "缓存里的弹幕");
            assert_eq!(stats.top_entries[0].count, 2);
        }
        other => panic!("expected completion, got {:?}", other),
    }
    assert_eq!(pipeline.crawler().source().searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_declined_cache_crawls_and_overwrites() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), &["LLM"]);
    std::fs::write(&config.cache.path, "旧的弹幕").unwrap();

    let mut pipeline = Pipeline::from_config(
        quiet_crawler(FixedSource::new(1, vec!["新的弹幕内容"]), &config),
        &config,
    )
    .unwrap()
    .with_decision(Box::new(FixedDecision(false)));

    assert!(matches!(
        pipeline.run().await.unwrap(),
        PipelineOutcome::Completed(_)
    ));
    assert_eq!(
        std::fs::read_to_string(&config.cache.path).unwrap(),
        "新的弹幕内容"
    );
}

#[tokio::test]
async fn test_empty_cache_forces_crawl() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), &["GPT"]);
    config.cache.policy = CachePolicy::Always;
    std::fs::write(&config.cache.path, "\n\n").unwrap();

    let mut pipeline = Pipeline::from_config(
        quiet_crawler(FixedSource::new(1, vec!["爬到的新弹幕"]), &config),
        &config,
    )
    .unwrap();

    assert!(matches!(
        pipeline.run().await.unwrap(),
        PipelineOutcome::Completed(_)
    ));
    assert!(pipeline.crawler().source().searches.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn test_no_data_is_reported_without_cache_write() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), &["没人搜"]);
    let sink = RecordingSink::default();

    let mut pipeline = Pipeline::from_config(
        quiet_crawler(FixedSource::new(0, vec![]), &config),
        &config,
    )
    .unwrap()
    .with_sinks(vec![Box::new(sink.clone())]);

    assert!(matches!(
        pipeline.run().await.unwrap(),
        PipelineOutcome::NoData
    ));
    assert!(!config.cache.path.exists());
    assert!(sink.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_interrupted_crawl_is_not_cached_by_default() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), &["大模型", "LLM"]);
    let flag = InterruptFlag::new();
    let mut source = FixedSource::new(3, vec!["中断前的弹幕"]);
    source.interrupt_on_first_document = Some(flag.clone());

    let crawler = quiet_crawler(source, &config).with_interrupt(flag);
    let mut pipeline = Pipeline::from_config(crawler, &config).unwrap();

    match pipeline.run().await.unwrap() {
        PipelineOutcome::Interrupted { collected } => assert_eq!(collected, 1),
        other => panic!("expected interruption, got {:?}", other),
    }
    assert!(!config.cache.path.exists());
}

#[tokio::test]
async fn test_interrupted_crawl_can_persist_partial_data() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), &["大模型"]);
    config.cache.persist_partial_on_interrupt = true;
    let flag = InterruptFlag::new();
    let mut source = FixedSource::new(3, vec!["中断前的弹幕"]);
    source.interrupt_on_first_document = Some(flag.clone());

    let crawler = quiet_crawler(source, &config).with_interrupt(flag);
    let mut pipeline = Pipeline::from_config(crawler, &config).unwrap();

    assert!(matches!(
        pipeline.run().await.unwrap(),
        PipelineOutcome::Interrupted { collected: 1 }
    ));
    assert_eq!(
        std::fs::read_to_string(&config.cache.path).unwrap(),
        "中断前的弹幕"
    );
}

/// Declines the cache after a stop was requested while it was asking.
struct InterruptedAnswer(InterruptFlag);

impl CacheDecision for InterruptedAnswer {
    fn reuse_cache(&mut self, _path: &Path, _cached: usize) -> bool {
        self.0.trigger();
        false
    }
}

#[tokio::test]
async fn test_stop_requested_at_cache_prompt_skips_crawl() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), &["大模型"]);
    std::fs::write(&config.cache.path, "旧的弹幕").unwrap();
    let flag = InterruptFlag::new();

    let crawler = quiet_crawler(FixedSource::new(3, vec!["不该爬到"]), &config)
        .with_interrupt(flag.clone());
    let mut pipeline = Pipeline::from_config(crawler, &config)
        .unwrap()
        .with_decision(Box::new(InterruptedAnswer(flag)));

    assert!(matches!(
        pipeline.run().await.unwrap(),
        PipelineOutcome::Interrupted { collected: 0 }
    ));
    assert_eq!(pipeline.crawler().source().searches.load(Ordering::SeqCst), 0);
    assert!(!pipeline.crawler().interrupt().is_crawling());
    assert_eq!(
        std::fs::read_to_string(&config.cache.path).unwrap(),
        "旧的弹幕"
    );
}

#[tokio::test]
async fn test_file_sinks_write_reports() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), &["大模型"]);
    config.report.stats_path = Some(dir.path().join("danmaku_statistics.json"));
    config.report.narrative_path = Some(dir.path().join("analysis_conclusion.txt"));

    let mut pipeline = Pipeline::from_config(
        quiet_crawler(FixedSource::new(2, vec!["大模型会不会导致失业", "免费的大模型真好用"]), &config),
        &config,
    )
    .unwrap();

    assert!(matches!(
        pipeline.run().await.unwrap(),
        PipelineOutcome::Completed(_)
    ));

    let json = std::fs::read_to_string(dir.path().join("danmaku_statistics.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["original_count"], 4);
    assert_eq!(value["top_entries"].as_array().unwrap().len(), 2);

    let narrative = std::fs::read_to_string(dir.path().join("analysis_conclusion.txt")).unwrap();
    assert!(narrative.contains("- Comments kept: 4"));
    assert!(narrative.contains("2 comments voice a concern."));
}

#[test]
fn test_invalid_filter_pattern_is_config_error() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), &["大模型"]);
    config.filter.anchored_patterns = vec!["^(unclosed".to_string()];

    let result = Pipeline::from_config(quiet_crawler(FixedSource::new(0, vec![]), &config), &config);
    assert!(matches!(result, Err(CoreError::Config(_))));
}
