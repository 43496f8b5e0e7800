//! Classifier trait and common types

use crate::features::FeatureSet;
use moodscope_core::Label;
use serde::Serialize;

/// Trait for all feature-set classifiers
pub trait Classifier: Send + Sync {
    /// Most probable label for the feature set
    fn predict(&self, features: &FeatureSet) -> Label;

    /// Normalized probability per known label, in label order
    fn probabilities(&self, features: &FeatureSet) -> Vec<(Label, f64)>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// A feature set paired with its true label
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub features: FeatureSet,
    pub label: Label,
}

impl LabeledExample {
    pub fn new(features: FeatureSet, label: Label) -> Self {
        Self { features, label }
    }
}

/// Result of classification
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    /// Classification label
    pub label: Label,

    /// Probability of the chosen label (0.0-1.0)
    pub score: f64,

    /// Additional metadata
    pub metadata: ClassificationMetadata,

    /// Latency in microseconds
    pub latency_us: u64,
}

/// Metadata about classification
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationMetadata {
    /// Model name
    pub model: Option<String>,

    /// All class probabilities
    pub all_scores: Vec<(Label, f64)>,

    /// Vocabulary terms found in the text
    pub matched_features: usize,
}

/// Fraction of examples whose predicted label equals the true label
///
/// Returns `None` when there is nothing to evaluate.
pub fn accuracy(classifier: &dyn Classifier, examples: &[LabeledExample]) -> Option<f64> {
    if examples.is_empty() {
        return None;
    }

    let correct = examples
        .iter()
        .filter(|example| classifier.predict(&example.features) == example.label)
        .count();

    Some(correct as f64 / examples.len() as f64)
}
