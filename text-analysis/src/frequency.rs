use crate::noise_filter::NoiseFilter;
use insight_core::{CommentRecord, CommentStats, FrequencyEntry, DEFAULT_TOP_N};
use std::collections::HashMap;
use tracing::debug;

/// Ranks exact-duplicate texts by how often they occur.
#[derive(Debug, Clone, Copy)]
pub struct FrequencyAggregator {
    top_n: usize,
}

impl FrequencyAggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Count every distinct text, keeping the order in which each was first seen.
    pub fn count<'a>(&self, texts: &'a [String]) -> Vec<(&'a str, usize)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut counts: Vec<(&str, usize)> = Vec::new();

        for text in texts {
            match index.get(text.as_str()) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    index.insert(text.as_str(), counts.len());
                    counts.push((text.as_str(), 1));
                }
            }
        }

        counts
    }

    /// Top entries by descending count. Equal counts keep first-seen order,
    /// so the result is deterministic for a given input sequence.
    pub fn rank(&self, texts: &[String]) -> Vec<FrequencyEntry> {
        let mut counts = self.count(texts);
        // `sort_by` is stable; ties stay in insertion order.
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let entries: Vec<FrequencyEntry> = counts
            .into_iter()
            .take(self.top_n)
            .enumerate()
            .map(|(i, (text, count))| FrequencyEntry {
                rank: i + 1,
                text: text.to_string(),
                count,
            })
            .collect();

        debug!(
            "Ranked {} of {} texts (top_n = {})",
            entries.len(),
            texts.len(),
            self.top_n
        );
        entries
    }
}

impl Default for FrequencyAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

/// Filter raw comments and rank what survives, producing the reporting hand-off.
pub fn summarize(
    raw: &[CommentRecord],
    filter: &NoiseFilter,
    aggregator: &FrequencyAggregator,
) -> CommentStats {
    let filtered_texts = filter.filter(raw);
    let top_entries = aggregator.rank(&filtered_texts);

    CommentStats {
        original_count: raw.len(),
        filtered_count: filtered_texts.len(),
        filtered_texts,
        top_entries,
    }
}
