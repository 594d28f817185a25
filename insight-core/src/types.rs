use serde::{Deserialize, Serialize};
use std::fmt;

/// A single danmaku line. The platform attaches no structure we keep.
pub type CommentRecord = String;

/// Default number of ranked entries handed to reporting.
pub const DEFAULT_TOP_N: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub video_id: String,
    pub title: String,
    pub view_count: u64,
    pub comment_count: u64,
}

/// Identifier of a video's comment document, distinct from its public id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(pub u64);

impl StreamId {
    /// The platform reports a missing stream as `0`.
    pub fn from_raw(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Noise,
    Signal,
}

impl FilterDecision {
    pub fn is_noise(&self) -> bool {
        matches!(self, FilterDecision::Noise)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub rank: usize,
    pub text: String,
    pub count: usize,
}

/// Everything the reporting sinks receive once the pipeline has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentStats {
    pub filtered_texts: Vec<CommentRecord>,
    pub original_count: usize,
    pub filtered_count: usize,
    pub top_entries: Vec<FrequencyEntry>,
}

impl CommentStats {
    pub fn noise_count(&self) -> usize {
        self.original_count.saturating_sub(self.filtered_count)
    }
}
