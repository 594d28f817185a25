pub mod cache;
pub mod decision;
pub mod orchestrator;
pub mod report;

pub use cache::CommentCache;
pub use decision::{decision_for_policy, CacheDecision, FixedDecision, PromptDecision};
pub use orchestrator::{Pipeline, PipelineOutcome};
pub use report::{sinks_from_settings, ConsoleSummary, NarrativeReport, ReportSink, StatsExport};
