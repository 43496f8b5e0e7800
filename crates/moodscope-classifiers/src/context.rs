//! Loaded model context and its shared, swappable handle
//!
//! A [`ModelContext`] bundles the frozen vocabulary, the trained model and
//! the feature extractor. It is never mutated once built. Serving code reads
//! it through [`SharedModel`], which hands out `Arc` snapshots and replaces
//! the whole context in a single write on reload.

use crate::classifier::{ClassificationMetadata, ClassificationResult, Classifier};
use crate::features::{FeatureExtractor, FeatureSet};
use crate::model_store::ModelStore;
use crate::naive_bayes::NaiveBayesModel;
use crate::vocabulary::Vocabulary;
use moodscope_core::{Error, Label, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Immutable vocabulary + classifier pair ready for inference
#[derive(Debug)]
pub struct ModelContext {
    vocabulary: Vocabulary,
    model: NaiveBayesModel,
    extractor: FeatureExtractor,
}

impl ModelContext {
    pub fn new(vocabulary: Vocabulary, model: NaiveBayesModel, extractor: FeatureExtractor) -> Self {
        Self {
            vocabulary,
            model,
            extractor,
        }
    }

    /// Load the artifact pair from a store
    pub fn load(store: &ModelStore, extractor: FeatureExtractor) -> Result<Self> {
        let (vocabulary, model) = store.load()?;
        Ok(Self::new(vocabulary, model, extractor))
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn model(&self) -> &NaiveBayesModel {
        &self.model
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Feature set of `text` over this context's vocabulary
    pub fn features(&self, text: &str) -> Result<FeatureSet> {
        self.extractor.extract(text, &self.vocabulary)
    }

    /// Label of `text`
    pub fn predict(&self, text: &str) -> Result<Label> {
        Ok(self.model.predict(&self.features(text)?))
    }

    /// Label of `text` with per-label probabilities
    pub fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();

        let features = self.features(text)?;
        let label = self.model.predict(&features);
        let all_scores = self.model.probabilities(&features);
        let score = all_scores
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0.0, |(_, p)| *p);

        Ok(ClassificationResult {
            label,
            score,
            metadata: ClassificationMetadata {
                model: Some(self.model.name().to_string()),
                all_scores,
                matched_features: features.present(),
            },
            latency_us: start.elapsed().as_micros() as u64,
        })
    }
}

/// Process-wide handle to the current model context
#[derive(Debug, Default)]
pub struct SharedModel {
    current: RwLock<Option<Arc<ModelContext>>>,
}

impl SharedModel {
    /// Handle with no model loaded yet
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(context: ModelContext) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(context))),
        }
    }

    /// Snapshot of the current context
    ///
    /// The snapshot stays valid after a concurrent [`SharedModel::swap`].
    pub fn current(&self) -> Result<Arc<ModelContext>> {
        self.current
            .read()
            .clone()
            .ok_or_else(|| Error::unavailable("no classifier is loaded"))
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// Replace the context, returning the previous one
    pub fn swap(&self, context: ModelContext) -> Option<Arc<ModelContext>> {
        let next = Arc::new(context);
        info!(
            "Swapping model context (vocabulary {} terms)",
            next.vocabulary().len()
        );
        self.current.write().replace(next)
    }
}
