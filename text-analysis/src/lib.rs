pub mod frequency;
pub mod noise_filter;
pub mod opinion;

pub use frequency::{summarize, FrequencyAggregator};
pub use noise_filter::NoiseFilter;
pub use opinion::{KeywordMention, OpinionAnalyzer, OpinionLexicon, OpinionSummary, Sentiment};
