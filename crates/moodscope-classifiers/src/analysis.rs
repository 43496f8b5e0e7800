//! Batch sentiment analysis of fetched posts
//!
//! Each post is classified on its own text followed by its retweeted text.
//! Posts are annotated in input order, counted per label, and retweets
//! contribute keywords to a pool that is ranked once the batch is done.

use crate::context::ModelContext;
use crate::keywords::{rank_keywords, KeywordExtractor};
use crate::time_window::parse_created_at;
use moodscope_core::{Label, Post, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Remark when negative posts outnumber positive ones
pub const NEGATIVE_REMARK: &str = "经检测我这段时间内的负能量过高，需要补充正能量!";

/// Remark otherwise
pub const POSITIVE_REMARK: &str = "经检测我这段时间内正能量爆棚啦哇咔咔！";

/// Analysis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Keywords taken from each post that carries a retweet
    #[serde(default = "default_keywords_per_post")]
    pub keywords_per_post: usize,

    /// Size of the aggregated keyword list
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,

    /// Default window length in months
    #[serde(default = "default_months")]
    pub months: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            keywords_per_post: default_keywords_per_post(),
            top_keywords: default_top_keywords(),
            months: default_months(),
        }
    }
}

fn default_keywords_per_post() -> usize {
    10
}

fn default_top_keywords() -> usize {
    300
}

fn default_months() -> u32 {
    3
}

/// A post with the label assigned to it
///
/// `label` is `None` when the post could not be classified.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedPost {
    pub post: Post,
    pub label: Option<Label>,
}

/// Result of analyzing one batch
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    counts: [usize; 3],
    posts: Vec<AnnotatedPost>,
    keywords: Vec<String>,
}

impl Analysis {
    /// Posts per label, indexed by class
    pub fn counts(&self) -> [usize; 3] {
        self.counts
    }

    pub fn count(&self, label: Label) -> usize {
        self.counts[label.index()]
    }

    /// Annotated posts in input order
    pub fn posts(&self) -> &[AnnotatedPost] {
        &self.posts
    }

    /// Ranked keywords, most frequent first
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn total(&self) -> usize {
        self.posts.len()
    }

    pub fn remark(&self) -> &'static str {
        if self.count(Label::Negative) > self.count(Label::Positive) {
            NEGATIVE_REMARK
        } else {
            POSITIVE_REMARK
        }
    }

    /// Presentation form of the analysis
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport {
            total: self.total(),
            pos: self.count(Label::Positive),
            neu: self.count(Label::Neutral),
            neg: self.count(Label::Negative),
            weibo: self
                .posts
                .iter()
                .map(|annotated| PostRecord::from_post(&annotated.post, annotated.label))
                .collect(),
            keywords: self.keywords.clone(),
            remark: self.remark().to_string(),
        }
    }
}

/// JSON document handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub total: usize,
    pub pos: usize,
    pub neu: usize,
    pub neg: usize,
    pub weibo: Vec<PostRecord>,
    pub keywords: Vec<String>,
    pub remark: String,
}

/// Display record of a post, every optional field resolved to a default
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub text: String,

    /// Unix seconds; `None` when the platform timestamp is unparseable
    pub created_at: Option<i64>,

    pub user: User,

    pub reposts_count: u64,

    pub comments_count: u64,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_pic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_pic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<Box<PostRecord>>,
}

impl PostRecord {
    pub fn from_post(post: &Post, label: Option<Label>) -> Self {
        let created_at = match parse_created_at(&post.created_at) {
            Ok(created) => Some(created.timestamp()),
            Err(e) => {
                debug!("Post {} has no usable timestamp: {}", post.id, e);
                None
            }
        };

        Self {
            text: post.text.clone(),
            created_at,
            user: post.user_or_placeholder(),
            reposts_count: post.reposts_count_or_default(),
            comments_count: post.comments_count_or_default(),
            label,
            original_pic: post.original_pic.clone(),
            thumbnail_pic: post.thumbnail_pic.clone(),
            retweeted_status: post
                .retweet()
                .map(|retweet| Box::new(PostRecord::from_post(retweet, None))),
        }
    }
}

/// Decode each raw post independently
///
/// Entries that are not post objects are dropped and logged so the rest of
/// the batch is still analyzed.
pub fn posts_from_values(values: Vec<serde_json::Value>) -> Vec<Post> {
    let total = values.len();
    let posts: Vec<Post> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<Post>(value) {
            Ok(post) => Some(post),
            Err(e) => {
                warn!("Dropping malformed post at index {}: {}", index, e);
                None
            }
        })
        .collect();

    if posts.len() < total {
        warn!("Decoded {} of {} posts", posts.len(), total);
    }
    posts
}

/// Classifies batches of posts against one model context snapshot
pub struct Analyzer {
    context: Arc<ModelContext>,
    keywords: Arc<dyn KeywordExtractor>,
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(
        context: Arc<ModelContext>,
        keywords: Arc<dyn KeywordExtractor>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            context,
            keywords,
            config,
        }
    }

    pub fn context(&self) -> &ModelContext {
        &self.context
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Classify every post and aggregate the batch
    ///
    /// A post that fails to classify stays in the output without a label and
    /// is not counted.
    pub fn analyze(&self, posts: &[Post]) -> Analysis {
        let start = Instant::now();
        let mut counts = [0usize; 3];
        let mut annotated = Vec::with_capacity(posts.len());
        let mut pool = Vec::new();

        for post in posts {
            let text = post.combined_text();

            if post.retweet().is_some() {
                pool.extend(self.keywords.extract(&text, self.config.keywords_per_post));
            }

            let label = match self.context.predict(&text) {
                Ok(label) => {
                    counts[label.index()] += 1;
                    metrics::counter!("moodscope_posts_classified_total", "label" => label.as_str())
                        .increment(1);
                    Some(label)
                }
                Err(e) => {
                    warn!("Leaving post {} unclassified: {}", post.id, e);
                    None
                }
            };

            annotated.push(AnnotatedPost {
                post: post.clone(),
                label,
            });
        }

        let keywords = rank_keywords(&pool, self.config.top_keywords);
        let elapsed = start.elapsed();
        metrics::histogram!("moodscope_analysis_latency_us").record(elapsed.as_micros() as f64);

        info!(
            "Analyzed {} posts: negative={} neutral={} positive={} ({} keywords, {:?})",
            annotated.len(),
            counts[0],
            counts[1],
            counts[2],
            keywords.len(),
            elapsed
        );

        Analysis {
            counts,
            posts: annotated,
            keywords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LabeledExample;
    use crate::features::FeatureExtractor;
    use crate::naive_bayes::NaiveBayesModel;
    use crate::tokenizer::{Segmenter, WhitespaceSegmenter};
    use crate::vocabulary::Vocabulary;
    use moodscope_core::{Error, Result};
    use std::sync::Mutex;

    /// Records every text it is asked about and returns its words
    #[derive(Default)]
    struct RecordingKeywords {
        seen: Mutex<Vec<String>>,
    }

    impl KeywordExtractor for RecordingKeywords {
        fn extract(&self, text: &str, top_k: usize) -> Vec<String> {
            self.seen.lock().unwrap().push(text.to_string());
            text.split_whitespace().take(top_k).map(str::to_string).collect()
        }
    }

    /// Fails on any text containing "\u{fffd}"
    struct PickySegmenter;

    impl Segmenter for PickySegmenter {
        fn segment(&self, text: &str) -> Result<Vec<String>> {
            if text.contains('\u{fffd}') {
                return Err(Error::tokenize("replacement character"));
            }
            WhitespaceSegmenter.segment(text)
        }

        fn name(&self) -> &str {
            "picky"
        }
    }

    fn context_with(segmenter: Arc<dyn Segmenter>) -> Arc<ModelContext> {
        let vocabulary = Vocabulary::new(vec!["bad".into(), "good".into(), "ok".into()]);
        let extractor = FeatureExtractor::new(segmenter);
        let examples: Vec<LabeledExample> = [
            ("bad", Label::Negative),
            ("bad day", Label::Negative),
            ("good", Label::Positive),
            ("good day", Label::Positive),
            ("ok", Label::Neutral),
        ]
        .iter()
        .map(|(text, label)| LabeledExample::new(extractor.extract(text, &vocabulary).unwrap(), *label))
        .collect();
        let model = NaiveBayesModel::fit(&examples).unwrap();
        Arc::new(ModelContext::new(vocabulary, model, extractor))
    }

    fn context() -> Arc<ModelContext> {
        context_with(Arc::new(WhitespaceSegmenter))
    }

    #[test]
    fn test_empty_batch() {
        let analyzer = Analyzer::new(context(), Arc::new(RecordingKeywords::default()), AnalysisConfig::default());
        let analysis = analyzer.analyze(&[]);
        assert_eq!(analysis.counts(), [0, 0, 0]);
        assert!(analysis.posts().is_empty());
        assert!(analysis.keywords().is_empty());

        let report = analysis.report();
        assert_eq!(report.total, 0);
        assert_eq!(report.remark, POSITIVE_REMARK);
    }

    #[test]
    fn test_retweet_text_is_concatenated() {
        let keywords = Arc::new(RecordingKeywords::default());
        let analyzer = Analyzer::new(context(), keywords.clone(), AnalysisConfig::default());
        let post = Post::new("ok ").with_retweet(Post::new("bad news"));

        let analysis = analyzer.analyze(&[post]);

        assert_eq!(keywords.seen.lock().unwrap().as_slice(), &["ok bad news".to_string()]);
        assert_eq!(analysis.posts()[0].label, Some(Label::Negative));
        assert_eq!(analysis.counts(), [1, 0, 0]);
    }

    #[test]
    fn test_keywords_only_from_retweets() {
        let keywords = Arc::new(RecordingKeywords::default());
        let analyzer = Analyzer::new(context(), keywords.clone(), AnalysisConfig::default());
        let posts = vec![
            Post::new("good day"),
            Post::new("good").with_retweet(Post::new(" day")),
            Post::new("bad").with_retweet(Post::new(" day")),
        ];

        let analysis = analyzer.analyze(&posts);

        assert_eq!(keywords.seen.lock().unwrap().len(), 2);
        assert_eq!(analysis.keywords(), &["day", "good", "bad"]);
    }

    #[test]
    fn test_counts_labels_and_order() {
        let analyzer = Analyzer::new(context(), Arc::new(RecordingKeywords::default()), AnalysisConfig::default());
        let posts = vec![Post::new("bad"), Post::new("good"), Post::new("bad day"), Post::new("ok")];

        let analysis = analyzer.analyze(&posts);

        assert_eq!(analysis.counts(), [2, 1, 1]);
        let texts: Vec<&str> = analysis.posts().iter().map(|a| a.post.text.as_str()).collect();
        assert_eq!(texts, vec!["bad", "good", "bad day", "ok"]);
        assert_eq!(analysis.remark(), NEGATIVE_REMARK);
    }

    #[test]
    fn test_failed_post_does_not_abort_batch() {
        let analyzer = Analyzer::new(
            context_with(Arc::new(PickySegmenter)),
            Arc::new(RecordingKeywords::default()),
            AnalysisConfig::default(),
        );
        let posts = vec![Post::new("good"), Post::new("bad \u{fffd}"), Post::new("good day")];

        let analysis = analyzer.analyze(&posts);

        assert_eq!(analysis.total(), 3);
        assert_eq!(analysis.counts(), [0, 0, 2]);
        assert_eq!(analysis.posts()[1].label, None);
    }

    #[test]
    fn test_top_keywords_bound() {
        let config = AnalysisConfig {
            top_keywords: 2,
            ..AnalysisConfig::default()
        };
        let analyzer = Analyzer::new(context(), Arc::new(RecordingKeywords::default()), config);
        let post = Post::new("a b").with_retweet(Post::new(" c d e"));

        let analysis = analyzer.analyze(&[post]);
        assert_eq!(analysis.keywords().len(), 2);
    }

    #[test]
    fn test_report_defaults_missing_fields() {
        let analyzer = Analyzer::new(context(), Arc::new(RecordingKeywords::default()), AnalysisConfig::default());
        let post = Post::new("good")
            .with_created_at("Sun Jun 30 12:27:28 +0800 2013")
            .with_retweet(Post::new(" day"));

        let report = analyzer.analyze(&[post]).report();
        let record = &report.weibo[0];

        assert_eq!(record.user, User::placeholder());
        assert_eq!(record.reposts_count, 0);
        assert_eq!(record.created_at, Some(1_372_566_448));
        assert_eq!(record.label, Some(Label::Positive));
        let retweet = record.retweeted_status.as_ref().unwrap();
        assert_eq!(retweet.label, None);
        assert_eq!(retweet.created_at, None);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pos"], 1);
        assert_eq!(json["weibo"][0]["type"], 2);
        assert!(json["weibo"][0]["retweeted_status"].get("type").is_none());
    }

    #[test]
    fn test_malformed_post_does_not_reject_batch() {
        let values: Vec<serde_json::Value> = serde_json::from_str(
            r#"[
                {"id": 1, "created_at": "Sun Jun 30 12:27:28 +0800 2013"},
                {"text": "good"},
                "not a post",
                {"text": "bad", "reposts_count": "many"}
            ]"#,
        )
        .unwrap();

        let posts = posts_from_values(values);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].text, "");
        assert_eq!(posts[1].text, "good");

        let analyzer = Analyzer::new(context(), Arc::new(RecordingKeywords::default()), AnalysisConfig::default());
        let analysis = analyzer.analyze(&posts);
        assert_eq!(analysis.total(), 2);
        assert_eq!(analysis.posts()[1].label, Some(Label::Positive));
    }
}
