use crate::cache::CommentCache;
use crate::decision::{decision_for_policy, CacheDecision};
use crate::report::{sinks_from_settings, ReportSink};
use bili_client::{Crawler, VideoSource};
use insight_core::{AppConfig, CommentRecord, CommentStats, CoreError, ErrorExt};
use text_analysis::{summarize, FrequencyAggregator, NoiseFilter};
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Completed(CommentStats),
    /// Neither the cache nor the crawl produced a single comment.
    NoData,
    /// The crawl was stopped early; nothing was analysed.
    Interrupted { collected: usize },
}

enum Loaded {
    Comments(Vec<CommentRecord>),
    Interrupted(usize),
}

/// load-or-crawl → filter → rank → publish.
pub struct Pipeline<S: VideoSource> {
    crawler: Crawler<S>,
    cache: CommentCache,
    decision: Box<dyn CacheDecision>,
    filter: NoiseFilter,
    aggregator: FrequencyAggregator,
    sinks: Vec<Box<dyn ReportSink>>,
    keywords: Vec<String>,
    max_videos_per_keyword: usize,
    persist_partial_on_interrupt: bool,
}

impl<S: VideoSource> Pipeline<S> {
    pub fn from_config(crawler: Crawler<S>, config: &AppConfig) -> Result<Self, CoreError> {
        Ok(Self {
            crawler,
            cache: CommentCache::new(&config.cache.path),
            decision: decision_for_policy(config.cache.policy),
            filter: NoiseFilter::new(&config.filter)?,
            aggregator: FrequencyAggregator::new(config.top_n),
            sinks: sinks_from_settings(&config.report),
            keywords: config.keywords.clone(),
            max_videos_per_keyword: config.max_videos_per_keyword,
            persist_partial_on_interrupt: config.cache.persist_partial_on_interrupt,
        })
    }

    pub fn with_decision(mut self, decision: Box<dyn CacheDecision>) -> Self {
        self.decision = decision;
        self
    }

    pub fn with_sinks(mut self, sinks: Vec<Box<dyn ReportSink>>) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn crawler(&self) -> &Crawler<S> {
        &self.crawler
    }

    pub fn cache(&self) -> &CommentCache {
        &self.cache
    }

    pub async fn run(&mut self) -> Result<PipelineOutcome, CoreError> {
        let comments = match self.load_comments().await {
            Loaded::Comments(comments) => comments,
            Loaded::Interrupted(collected) => {
                info!("Stopped early with {} comments collected", collected);
                return Ok(PipelineOutcome::Interrupted { collected });
            }
        };

        if comments.is_empty() {
            error!("No comments collected");
            return Ok(PipelineOutcome::NoData);
        }
        info!("Analysing {} raw comments", comments.len());

        let stats = summarize(&comments, &self.filter, &self.aggregator);

        for sink in &self.sinks {
            info!("Publishing {}", sink.name());
            sink.publish(&stats)?;
        }

        Ok(PipelineOutcome::Completed(stats))
    }

    async fn load_comments(&mut self) -> Loaded {
        match self.cache.load() {
            Ok(Some(cached)) => {
                if self.decision.reuse_cache(self.cache.path(), cached.len()) {
                    info!("Loaded {} comments from cache", cached.len());
                    return Loaded::Comments(cached);
                }
            }
            Ok(None) => {}
            Err(e) => {
                e.log_warn();
            }
        }

        if self.crawler.interrupt().is_triggered() {
            return Loaded::Interrupted(0);
        }

        info!("Crawling {} keywords", self.keywords.len());
        let outcome = self
            .crawler
            .crawl(&self.keywords, self.max_videos_per_keyword)
            .await;

        if outcome.interrupted {
            if self.persist_partial_on_interrupt && !outcome.comments.is_empty() {
                self.store(&outcome.comments);
            }
            return Loaded::Interrupted(outcome.comments.len());
        }

        if !outcome.comments.is_empty() {
            self.store(&outcome.comments);
        }
        Loaded::Comments(outcome.comments)
    }

    fn store(&self, comments: &[CommentRecord]) {
        if let Err(e) = self.cache.store(comments) {
            warn!("Continuing without cache: {}", e);
        }
    }
}
