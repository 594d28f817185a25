//! Keyword-driven opinion analysis over filtered comments: sentiment split,
//! cost talk, application areas and concerns.

use serde::Serialize;
use std::collections::HashMap;

const SAMPLE_LIMIT: usize = 20;
const APPLICATION_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct OpinionLexicon {
    pub cost: Vec<String>,
    pub application: Vec<String>,
    pub negative: Vec<String>,
    pub positive: Vec<String>,
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for OpinionLexicon {
    fn default() -> Self {
        Self {
            cost: words(&["成本", "价格", "费用", "昂贵", "便宜", "免费", "收费", "付费"]),
            application: words(&[
                "应用", "用途", "场景", "领域", "行业", "工作", "学习", "教育", "医疗", "金融",
                "客服", "创作", "编程", "翻译",
            ]),
            negative: words(&[
                "问题", "缺点", "不足", "风险", "危险", "担忧", "失业", "替代", "错误", "不准确",
                "幻觉", "偏见",
            ]),
            positive: words(&[
                "好", "棒", "厉害", "强大", "优秀", "先进", "创新", "进步", "革命", "改变", "未来",
                "希望",
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sentiment {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub positive_rate: f64,
    pub negative_rate: f64,
}

impl Sentiment {
    pub fn neutral_rate(&self) -> f64 {
        if self.positive + self.negative + self.neutral == 0 {
            0.0
        } else {
            1.0 - self.positive_rate - self.negative_rate
        }
    }

    pub fn leans_positive(&self) -> bool {
        self.positive_rate > self.negative_rate
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordMention {
    pub keyword: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpinionSummary {
    pub sentiment: Sentiment,
    /// First few cost-related comments.
    pub cost_samples: Vec<String>,
    pub cost_total: usize,
    pub applications: Vec<KeywordMention>,
    /// First few comments voicing a concern.
    pub concern_samples: Vec<String>,
    pub concern_total: usize,
}

#[derive(Debug, Clone, Default)]
pub struct OpinionAnalyzer {
    lexicon: OpinionLexicon,
}

impl OpinionAnalyzer {
    pub fn new(lexicon: OpinionLexicon) -> Self {
        Self { lexicon }
    }

    pub fn analyze(&self, texts: &[String]) -> OpinionSummary {
        let (cost_samples, cost_total) = sample_matching(texts, &self.lexicon.cost);
        let (concern_samples, concern_total) = sample_matching(texts, &self.lexicon.negative);

        OpinionSummary {
            sentiment: self.sentiment(texts),
            cost_samples,
            cost_total,
            applications: self.applications(texts),
            concern_samples,
            concern_total,
        }
    }

    pub fn sentiment(&self, texts: &[String]) -> Sentiment {
        let mut positive = 0;
        let mut negative = 0;
        let mut neutral = 0;

        for text in texts {
            let pos = hits(text, &self.lexicon.positive);
            let neg = hits(text, &self.lexicon.negative);
            if pos > neg {
                positive += 1;
            } else if neg > pos {
                negative += 1;
            } else {
                neutral += 1;
            }
        }

        let total = texts.len();
        let rate = |n: usize| if total > 0 { n as f64 / total as f64 } else { 0.0 };

        Sentiment {
            positive,
            negative,
            neutral,
            positive_rate: rate(positive),
            negative_rate: rate(negative),
        }
    }

    /// Application keywords by the number of comments mentioning them.
    /// Equal counts keep the order in which the keyword was first seen.
    pub fn applications(&self, texts: &[String]) -> Vec<KeywordMention> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut mentions: Vec<KeywordMention> = Vec::new();

        for text in texts {
            for keyword in &self.lexicon.application {
                if !text.contains(keyword.as_str()) {
                    continue;
                }
                match index.get(keyword.as_str()) {
                    Some(&slot) => mentions[slot].count += 1,
                    None => {
                        index.insert(keyword.as_str(), mentions.len());
                        mentions.push(KeywordMention {
                            keyword: keyword.clone(),
                            count: 1,
                        });
                    }
                }
            }
        }

        mentions.sort_by(|a, b| b.count.cmp(&a.count));
        mentions.truncate(APPLICATION_LIMIT);
        mentions
    }
}

fn hits(text: &str, lexicon: &[String]) -> usize {
    lexicon
        .iter()
        .filter(|kw| text.contains(kw.as_str()))
        .count()
}

fn sample_matching(texts: &[String], lexicon: &[String]) -> (Vec<String>, usize) {
    let matching: Vec<&String> = texts.iter().filter(|t| hits(t, lexicon) > 0).collect();
    let total = matching.len();
    let samples = matching.into_iter().take(SAMPLE_LIMIT).cloned().collect();
    (samples, total)
}
