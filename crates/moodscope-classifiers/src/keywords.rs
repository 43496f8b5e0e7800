//! Keyword extraction and aggregation

use crate::tokenizer::JiebaSegmenter;
use crate::vocabulary::FrequencyDistribution;
use jieba_rs::{KeywordExtract, TfIdf};
use std::sync::Arc;

/// Extracts ranked keywords from a text
pub trait KeywordExtractor: Send + Sync {
    /// Up to `top_k` keywords, most relevant first
    fn extract(&self, text: &str, top_k: usize) -> Vec<String>;
}

/// TF-IDF keywords over jieba segmentation
pub struct JiebaKeywordExtractor {
    segmenter: Arc<JiebaSegmenter>,
    tfidf: TfIdf,
}

impl JiebaKeywordExtractor {
    /// Share the segmenter (and its user dictionary) used for features
    pub fn new(segmenter: Arc<JiebaSegmenter>) -> Self {
        Self {
            segmenter,
            tfidf: TfIdf::default(),
        }
    }
}

impl KeywordExtractor for JiebaKeywordExtractor {
    fn extract(&self, text: &str, top_k: usize) -> Vec<String> {
        self.tfidf
            .extract_keywords(self.segmenter.jieba(), text, top_k, Vec::new())
            .into_iter()
            .map(|keyword| keyword.keyword)
            .collect()
    }
}

/// Deduplicate a keyword pool, most frequent first, ties in first-seen order
pub fn rank_keywords(pool: &[String], limit: usize) -> Vec<String> {
    let dist: FrequencyDistribution = pool.iter().map(String::as_str).collect();
    dist.most_common_stable(limit)
        .into_iter()
        .map(|(term, _)| term.to_string())
        .collect()
}
