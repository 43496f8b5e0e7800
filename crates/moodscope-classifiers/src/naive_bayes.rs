//! Bernoulli Naive Bayes over boolean feature sets
//!
//! Every probability uses the expected-likelihood estimate (add 0.5 to each
//! count):
//!
//! - prior `P(c) = (n_c + 0.5) / (N + 0.5 * K)` over the `K` labels seen
//! - likelihood `P(f = v | c) = (count(f = v, c) + 0.5) / (n_c + 1)`
//!
//! Features that never appeared during training are ignored when predicting.

use crate::classifier::{Classifier, LabeledExample};
use crate::features::FeatureSet;
use moodscope_core::{Error, Label, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

const SMOOTHING: f64 = 0.5;

/// Trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    /// Training examples per label
    label_counts: BTreeMap<Label, usize>,

    /// Per feature, how many examples of each label had it set to `true`
    true_counts: BTreeMap<String, [usize; 3]>,

    total: usize,
}

/// A feature value that separates labels well
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InformativeFeature {
    pub name: String,
    pub value: bool,
    /// Label where the value is most likely
    pub favored: Label,
    /// Label where the value is least likely
    pub disfavored: Label,
    /// `P(value | favored) / P(value | disfavored)`
    pub ratio: f64,
}

impl NaiveBayesModel {
    /// Fit a model on labeled examples
    ///
    /// Fails on an empty training set or one with a single label.
    pub fn fit(examples: &[LabeledExample]) -> Result<Self> {
        if examples.is_empty() {
            return Err(Error::training("training set is empty"));
        }

        let mut label_counts: BTreeMap<Label, usize> = BTreeMap::new();
        let mut true_counts: BTreeMap<String, [usize; 3]> = BTreeMap::new();

        for example in examples {
            *label_counts.entry(example.label).or_default() += 1;

            for (name, value) in example.features.iter() {
                let counts = true_counts.entry(name.to_string()).or_insert([0; 3]);
                if value {
                    counts[example.label.index()] += 1;
                }
            }
        }

        if label_counts.len() < 2 {
            let only = label_counts.keys().next().copied().unwrap_or(Label::Neutral);
            return Err(Error::training(format!(
                "training set has a single label ({only}); at least two are required"
            )));
        }

        debug!(
            "Fitted naive bayes on {} examples, {} labels, {} features",
            examples.len(),
            label_counts.len(),
            true_counts.len()
        );

        Ok(Self {
            label_counts,
            true_counts,
            total: examples.len(),
        })
    }

    /// Labels seen during training, in label order
    pub fn labels(&self) -> Vec<Label> {
        self.label_counts.keys().copied().collect()
    }

    /// Number of distinct features the model knows
    pub fn feature_count(&self) -> usize {
        self.true_counts.len()
    }

    fn log_prior(&self, label: Label) -> f64 {
        let n_c = self.label_counts.get(&label).copied().unwrap_or(0) as f64;
        let k = self.label_counts.len() as f64;
        ((n_c + SMOOTHING) / (self.total as f64 + SMOOTHING * k)).ln()
    }

    fn likelihood(&self, counts: &[usize; 3], label: Label, value: bool) -> f64 {
        let n_c = self.label_counts.get(&label).copied().unwrap_or(0);
        let n_true = counts[label.index()];
        let matching = if value { n_true } else { n_c - n_true };
        (matching as f64 + SMOOTHING) / (n_c as f64 + 2.0 * SMOOTHING)
    }

    /// Unnormalized log posterior per known label
    pub fn log_scores(&self, features: &FeatureSet) -> Vec<(Label, f64)> {
        self.label_counts
            .keys()
            .map(|&label| {
                let score = features
                    .iter()
                    .filter_map(|(name, value)| {
                        self.true_counts
                            .get(name)
                            .map(|counts| self.likelihood(counts, label, value).ln())
                    })
                    .sum::<f64>()
                    + self.log_prior(label);
                (label, score)
            })
            .collect()
    }

    /// Feature values ranked by how strongly they separate two labels
    pub fn most_informative_features(&self, n: usize) -> Vec<InformativeFeature> {
        let labels = self.labels();
        let mut ranked = Vec::new();

        for (name, counts) in &self.true_counts {
            let seen_true = counts.iter().any(|c| *c > 0);
            let seen_false = labels
                .iter()
                .any(|label| counts[label.index()] < self.label_counts[label]);

            for value in [true, false] {
                if (value && !seen_true) || (!value && !seen_false) {
                    continue;
                }

                let mut probs: Vec<(Label, f64)> = labels
                    .iter()
                    .map(|&label| (label, self.likelihood(counts, label, value)))
                    .collect();
                probs.sort_by(|a, b| a.1.total_cmp(&b.1));

                let (disfavored, low) = probs[0];
                let (favored, high) = probs[probs.len() - 1];
                ranked.push(InformativeFeature {
                    name: name.clone(),
                    value,
                    favored,
                    disfavored,
                    ratio: high / low,
                });
            }
        }

        ranked.sort_by(|a, b| {
            b.ratio
                .total_cmp(&a.ratio)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| b.value.cmp(&a.value))
        });
        ranked.truncate(n);
        ranked
    }
}

impl Classifier for NaiveBayesModel {
    fn predict(&self, features: &FeatureSet) -> Label {
        let mut best: Option<(Label, f64)> = None;
        for (label, score) in self.log_scores(features) {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((label, score)),
            }
        }
        best.map_or(Label::Neutral, |(label, _)| label)
    }

    fn probabilities(&self, features: &FeatureSet) -> Vec<(Label, f64)> {
        let scores = self.log_scores(features);
        let max = scores
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::NEG_INFINITY, f64::max);
        let norm: f64 = scores.iter().map(|(_, s)| (s - max).exp()).sum();

        scores
            .into_iter()
            .map(|(label, s)| (label, (s - max).exp() / norm))
            .collect()
    }

    fn name(&self) -> &str {
        "naive-bayes"
    }
}
