//! Rule-based noise classification for single danmaku lines.
//!
//! Rules run in a fixed order and the first match wins:
//! 1. fewer than two characters in the raw text;
//! 2. nothing left after trimming;
//! 3. an anchored shape pattern or a blocked phrase matches the trimmed text;
//! 4. the trimmed text is shorter than three characters and mentions no
//!    domain keyword.
//!
//! The rules are not independent: a short text that names a domain keyword
//! escapes rule 4 but is still subject to rules 1-3.

use insight_core::{ConfigError, FilterConfig, FilterDecision};
use regex::{Regex, RegexBuilder};
use tracing::info;

const MIN_RAW_CHARS: usize = 2;
const SHORT_TEXT_CHARS: usize = 3;

#[derive(Debug, Clone)]
pub struct NoiseFilter {
    patterns: Vec<Regex>,
    blocked_phrases: Vec<String>,
    domain_keywords: Vec<String>,
}

impl NoiseFilter {
    /// Compile a rule table. Patterns are anchored at the start of the text
    /// and matched case-insensitively.
    pub fn new(config: &FilterConfig) -> Result<Self, ConfigError> {
        let patterns = config
            .anchored_patterns
            .iter()
            .map(|pattern| compile_anchored(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            blocked_phrases: config
                .blocked_phrases
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| p.to_lowercase())
                .collect(),
            domain_keywords: config.domain_keywords.clone(),
        })
    }

    pub fn classify(&self, text: &str) -> FilterDecision {
        if text.chars().count() < MIN_RAW_CHARS {
            return FilterDecision::Noise;
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return FilterDecision::Noise;
        }

        if self.patterns.iter().any(|p| p.is_match(trimmed)) {
            return FilterDecision::Noise;
        }

        let lowered = trimmed.to_lowercase();
        if self
            .blocked_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
        {
            return FilterDecision::Noise;
        }

        if trimmed.chars().count() < SHORT_TEXT_CHARS
            && !self
                .domain_keywords
                .iter()
                .any(|kw| trimmed.contains(kw.as_str()))
        {
            return FilterDecision::Noise;
        }

        FilterDecision::Signal
    }

    pub fn is_noise(&self, text: &str) -> bool {
        self.classify(text).is_noise()
    }

    /// Keep the signal texts, preserving input order.
    pub fn filter(&self, texts: &[String]) -> Vec<String> {
        let filtered: Vec<String> = texts
            .iter()
            .filter(|text| !self.is_noise(text))
            .cloned()
            .collect();

        info!("Comments before filtering: {}", texts.len());
        info!("Comments after filtering: {}", filtered.len());
        info!("Noise removed: {}", texts.len() - filtered.len());

        filtered
    }
}

fn compile_anchored(pattern: &str) -> Result<Regex, ConfigError> {
    let anchored = if pattern.starts_with('^') {
        pattern.to_string()
    } else {
        format!("^(?:{})", pattern)
    };

    RegexBuilder::new(&anchored)
        .case_insensitive(true)
        .build()
        .map_err(|e| ConfigError::InvalidValue {
            field: "filter.anchored_patterns".to_string(),
            value: format!("{} ({})", pattern, e),
        })
}
