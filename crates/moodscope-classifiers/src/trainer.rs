//! Offline classifier training

use crate::classifier::{accuracy, LabeledExample};
use crate::corpus::CorpusDocument;
use crate::features::FeatureExtractor;
use crate::naive_bayes::NaiveBayesModel;
use crate::vocabulary::Vocabulary;
use moodscope_core::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Training parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Fraction of shuffled examples used for training; the rest is held out
    #[serde(default = "default_split_ratio")]
    pub split_ratio: f64,

    /// Seed for the shuffle; entropy-seeded when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            split_ratio: default_split_ratio(),
            seed: None,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.split_ratio > 0.0 && self.split_ratio <= 1.0) {
            return Err(Error::config(format!(
                "split_ratio must be in (0, 1], got {}",
                self.split_ratio
            )));
        }
        Ok(())
    }
}

fn default_split_ratio() -> f64 {
    0.8
}

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub model: NaiveBayesModel,
    pub train_size: usize,
    pub test_size: usize,
    /// Held-out accuracy; `None` when the test partition is empty
    pub accuracy: Option<f64>,
}

/// Shuffles, splits and fits
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Extract a labeled example per corpus document
    ///
    /// Documents whose extraction fails are skipped and logged.
    pub fn build_examples(
        documents: &[CorpusDocument],
        vocabulary: &Vocabulary,
        extractor: &FeatureExtractor,
    ) -> Vec<LabeledExample> {
        let mut examples = Vec::with_capacity(documents.len());

        for (index, document) in documents.iter().enumerate() {
            match extractor.extract(&document.text, vocabulary) {
                Ok(features) => examples.push(LabeledExample::new(features, document.label)),
                Err(e) => warn!("Skipping document {} during extraction: {}", index, e),
            }
        }

        examples
    }

    /// Shuffle and cut into (train, test) at `floor(split_ratio * N)`
    pub fn split(&self, mut examples: Vec<LabeledExample>) -> (Vec<LabeledExample>, Vec<LabeledExample>) {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        examples.shuffle(&mut rng);

        let cut = ((self.config.split_ratio * examples.len() as f64) as usize).min(examples.len());
        let test = examples.split_off(cut);
        (examples, test)
    }

    /// Fit a model and measure it on the held-out partition
    pub fn train(&self, examples: Vec<LabeledExample>) -> Result<TrainingReport> {
        if examples.is_empty() {
            return Err(Error::training("no labeled examples to train on"));
        }

        let (train, test) = self.split(examples);
        info!(
            "Training on {} examples, holding out {}",
            train.len(),
            test.len()
        );

        let model = NaiveBayesModel::fit(&train)?;
        let accuracy = accuracy(&model, &test);

        match accuracy {
            Some(value) => info!("Held-out accuracy: {:.4}", value),
            None => info!("Held-out accuracy: no test data"),
        }

        Ok(TrainingReport {
            model,
            train_size: train.len(),
            test_size: test.len(),
            accuracy,
        })
    }
}
