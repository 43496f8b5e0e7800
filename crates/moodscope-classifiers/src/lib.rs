//! Moodscope Classifiers
//!
//! Sentiment classification of short microblog posts with a Bernoulli
//! Naive Bayes model over a frequency-selected term vocabulary.
//!
//! The pipeline runs in three phases:
//! - Vocabulary building: segment the labeled corpus, count terms, select
//!   the most frequent meaningful ones
//! - Training: turn documents into boolean feature sets, split, fit, measure
//! - Analysis: classify a batch of posts, count labels, aggregate keywords
//!
//! Artifacts from the first two phases are persisted by [`ModelStore`] and
//! served through a swappable [`SharedModel`].

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod context;
pub mod corpus;
pub mod features;
pub mod keywords;
pub mod model_store;
pub mod naive_bayes;
pub mod time_window;
pub mod tokenizer;
pub mod trainer;
pub mod vocabulary;

pub use analysis::{Analysis, AnalysisConfig, AnalysisReport, Analyzer, AnnotatedPost, PostRecord};
pub use classifier::{ClassificationResult, Classifier, LabeledExample};
pub use config::MoodscopeConfig;
pub use context::{ModelContext, SharedModel};
pub use corpus::{CorpusDocument, CorpusReader, MarkerScheme};
pub use features::{FeatureExtractor, FeatureSet};
pub use keywords::{JiebaKeywordExtractor, KeywordExtractor};
pub use model_store::ModelStore;
pub use naive_bayes::{InformativeFeature, NaiveBayesModel};
pub use tokenizer::{JiebaSegmenter, Segmenter, WhitespaceSegmenter};
pub use trainer::{Trainer, TrainerConfig, TrainingReport};
pub use vocabulary::{FrequencyDistribution, Vocabulary, VocabularyBuilder};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analysis::{Analysis, Analyzer};
    pub use crate::classifier::{ClassificationResult, Classifier};
    pub use crate::context::{ModelContext, SharedModel};
    pub use crate::features::FeatureExtractor;
    pub use crate::model_store::ModelStore;
    pub use crate::naive_bayes::NaiveBayesModel;
    pub use crate::tokenizer::{JiebaSegmenter, Segmenter};
    pub use crate::vocabulary::Vocabulary;
}
