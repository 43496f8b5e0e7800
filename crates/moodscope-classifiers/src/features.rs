//! Bag-of-words feature extraction

use crate::tokenizer::Segmenter;
use crate::vocabulary::Vocabulary;
use moodscope_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Presence of every vocabulary term in one document, keyed `contains(<term>)`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    features: HashMap<String, bool>,
}

impl FeatureSet {
    /// Feature key for a vocabulary term
    pub fn feature_name(term: &str) -> String {
        format!("contains({term})")
    }

    /// Value of a feature by key
    pub fn get(&self, name: &str) -> Option<bool> {
        self.features.get(name).copied()
    }

    /// Value of the feature for a vocabulary term
    pub fn term(&self, term: &str) -> Option<bool> {
        self.get(&Self::feature_name(term))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: bool) {
        self.features.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.features.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Number of features set to `true`
    pub fn present(&self) -> usize {
        self.features.values().filter(|v| **v).count()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FromIterator<(String, bool)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

/// Maps raw text to a [`FeatureSet`] over a borrowed vocabulary
#[derive(Clone)]
pub struct FeatureExtractor {
    segmenter: Arc<dyn Segmenter>,
}

impl FeatureExtractor {
    pub fn new(segmenter: Arc<dyn Segmenter>) -> Self {
        Self { segmenter }
    }

    pub fn segmenter(&self) -> &dyn Segmenter {
        self.segmenter.as_ref()
    }

    /// Extract the feature set of `text`
    ///
    /// The result has exactly one key per vocabulary term. A term is present
    /// when it equals one of the segmented tokens (exact, case-sensitive).
    pub fn extract(&self, text: &str, vocabulary: &Vocabulary) -> Result<FeatureSet> {
        if vocabulary.is_empty() {
            return Ok(FeatureSet::default());
        }

        let tokens = self.segmenter.segment(text)?;
        let tokens: HashSet<&str> = tokens.iter().map(String::as_str).collect();

        Ok(vocabulary
            .iter()
            .map(|term| (FeatureSet::feature_name(term), tokens.contains(term)))
            .collect())
    }
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("segmenter", &self.segmenter.name())
            .finish()
    }
}
