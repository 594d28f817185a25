//! Report sinks: everything downstream of the ranked statistics.

use chrono::{DateTime, Local};
use insight_core::{CommentStats, CoreError, FrequencyEntry, ReportError, ReportSettings};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use text_analysis::{OpinionAnalyzer, OpinionSummary};
use tracing::info;

const NARRATIVE_SAMPLES: usize = 5;
const NARRATIVE_APPLICATIONS: usize = 8;
const RULE: &str = "================================================================";

pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;

    fn publish(&self, stats: &CommentStats) -> Result<(), CoreError>;
}

/// Every sink enabled by `settings`, in publishing order.
pub fn sinks_from_settings(settings: &ReportSettings) -> Vec<Box<dyn ReportSink>> {
    let mut sinks: Vec<Box<dyn ReportSink>> = Vec::new();
    if settings.console_summary {
        sinks.push(Box::new(ConsoleSummary));
    }
    if let Some(path) = &settings.stats_path {
        sinks.push(Box::new(StatsExport::new(path)));
    }
    if let Some(path) = &settings.narrative_path {
        sinks.push(Box::new(NarrativeReport::new(path)));
    }
    sinks
}

fn write_output(sink: &str, path: &Path, contents: &str) -> Result<(), CoreError> {
    let failed = |e: std::io::Error| ReportError::OutputFailed {
        sink: sink.to_string(),
        reason: format!("{}: {}", path.display(), e),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(failed)?;
        }
    }
    std::fs::write(path, contents).map_err(failed)?;
    info!("{} written to {}", sink, path.display());
    Ok(())
}

fn render_failed(sink: &str, e: fmt::Error) -> CoreError {
    ReportError::OutputFailed {
        sink: sink.to_string(),
        reason: format!("rendering failed: {}", e),
    }
    .into()
}

/// Prints counts and the ranked top entries to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSummary;

impl ConsoleSummary {
    pub fn render(stats: &CommentStats) -> Result<String, fmt::Error> {
        let mut out = String::new();
        writeln!(out, "Raw comments: {}", stats.original_count)?;
        writeln!(
            out,
            "Kept after filtering: {} ({} noise)",
            stats.filtered_count,
            stats.noise_count()
        )?;
        writeln!(out, "\nTop {} comments:", stats.top_entries.len())?;
        for entry in &stats.top_entries {
            writeln!(out, "  {}. {}: {} times", entry.rank, entry.text, entry.count)?;
        }
        Ok(out)
    }
}

impl ReportSink for ConsoleSummary {
    fn name(&self) -> &str {
        "console summary"
    }

    fn publish(&self, stats: &CommentStats) -> Result<(), CoreError> {
        let text = Self::render(stats).map_err(|e| render_failed(self.name(), e))?;
        print!("{}", text);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StatsDocument<'a> {
    generated_at: String,
    original_count: usize,
    filtered_count: usize,
    noise_count: usize,
    top_entries: &'a [FrequencyEntry],
}

/// Ranked statistics table as pretty JSON.
#[derive(Debug, Clone)]
pub struct StatsExport {
    path: PathBuf,
}

impl StatsExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(stats: &CommentStats, generated_at: DateTime<Local>) -> Result<String, CoreError> {
        let document = StatsDocument {
            generated_at: generated_at.to_rfc3339(),
            original_count: stats.original_count,
            filtered_count: stats.filtered_count,
            noise_count: stats.noise_count(),
            top_entries: &stats.top_entries,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

impl ReportSink for StatsExport {
    fn name(&self) -> &str {
        "statistics export"
    }

    fn publish(&self, stats: &CommentStats) -> Result<(), CoreError> {
        let json = Self::render(stats, Local::now())?;
        write_output(self.name(), &self.path, &json)
    }
}

/// Plain-text opinion report built from the filtered comments.
#[derive(Debug, Clone)]
pub struct NarrativeReport {
    path: PathBuf,
    analyzer: OpinionAnalyzer,
}

impl NarrativeReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            analyzer: OpinionAnalyzer::default(),
        }
    }

    pub fn with_analyzer(mut self, analyzer: OpinionAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(
        stats: &CommentStats,
        opinion: &OpinionSummary,
        generated_at: DateTime<Local>,
    ) -> Result<String, fmt::Error> {
        let sentiment = &opinion.sentiment;
        let mut out = String::new();

        writeln!(out, "{}", RULE)?;
        writeln!(out, "Viewer opinion report on large language models")?;
        writeln!(out, "{}", RULE)?;

        writeln!(out, "\n1. Overview")?;
        writeln!(out, "- Comments kept: {}", stats.filtered_count)?;
        writeln!(out, "- Raw comments: {}", stats.original_count)?;

        writeln!(out, "\n2. Sentiment")?;
        writeln!(
            out,
            "- Positive: {} ({:.1}%)",
            sentiment.positive,
            sentiment.positive_rate * 100.0
        )?;
        writeln!(
            out,
            "- Negative: {} ({:.1}%)",
            sentiment.negative,
            sentiment.negative_rate * 100.0
        )?;
        writeln!(
            out,
            "- Neutral: {} ({:.1}%)",
            sentiment.neutral,
            sentiment.neutral_rate() * 100.0
        )?;
        let lean = if sentiment.leans_positive() {
            "Overall the audience is fairly positive."
        } else {
            "Overall the audience shows some concern."
        };
        writeln!(out, "\n{}", lean)?;

        writeln!(out, "\n3. Cost")?;
        writeln!(out, "{} comments talk about cost.", opinion.cost_total)?;
        write_samples(&mut out, &opinion.cost_samples, "Cost is rarely discussed directly.")?;

        writeln!(out, "\n4. Applications")?;
        if opinion.applications.is_empty() {
            writeln!(out, "No application areas mentioned.")?;
        }
        for (i, mention) in opinion
            .applications
            .iter()
            .take(NARRATIVE_APPLICATIONS)
            .enumerate()
        {
            writeln!(out, "  {}. {}: {} mentions", i + 1, mention.keyword, mention.count)?;
        }

        writeln!(out, "\n5. Concerns")?;
        writeln!(out, "{} comments voice a concern.", opinion.concern_total)?;
        write_samples(&mut out, &opinion.concern_samples, "Downsides are rarely discussed.")?;

        writeln!(out, "\n6. Most repeated comments")?;
        for entry in &stats.top_entries {
            writeln!(out, "  {}. {} ({} times)", entry.rank, entry.text, entry.count)?;
        }

        writeln!(out, "\n7. Conclusions")?;
        let attitude = if sentiment.positive_rate > 0.5 {
            "mostly positive about where the technology is heading"
        } else {
            "mixed, with expectations and worries side by side"
        };
        writeln!(out, "- Attitude: {}", attitude)?;
        let top_areas: Vec<&str> = opinion
            .applications
            .iter()
            .take(3)
            .map(|m| m.keyword.as_str())
            .collect();
        let areas = if top_areas.is_empty() {
            "various".to_string()
        } else {
            top_areas.join(", ")
        };
        writeln!(out, "- Main application areas: {}", areas)?;
        let cost = if opinion.cost_total > 10 {
            "a recurring topic"
        } else {
            "seldom raised"
        };
        writeln!(out, "- Cost: {}", cost)?;
        let risk = if opinion.concern_total > 10 {
            "viewers are aware of potential risks"
        } else {
            "risks are seldom raised"
        };
        writeln!(out, "- Risk awareness: {}", risk)?;

        writeln!(out, "\n{}", RULE)?;
        writeln!(out, "Generated at {}", generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(out, "{}", RULE)?;
        Ok(out)
    }
}

fn write_samples(out: &mut String, samples: &[String], when_empty: &str) -> fmt::Result {
    if samples.is_empty() {
        return writeln!(out, "{}", when_empty);
    }
    writeln!(out, "Examples:")?;
    for (i, sample) in samples.iter().take(NARRATIVE_SAMPLES).enumerate() {
        writeln!(out, "  {}. {}", i + 1, sample)?;
    }
    Ok(())
}

impl ReportSink for NarrativeReport {
    fn name(&self) -> &str {
        "narrative report"
    }

    fn publish(&self, stats: &CommentStats) -> Result<(), CoreError> {
        let opinion = self.analyzer.analyze(&stats.filtered_texts);
        let text = Self::render(stats, &opinion, Local::now())
            .map_err(|e| render_failed(self.name(), e))?;
        write_output(self.name(), &self.path, &text)
    }
}
