//! Persisted vocabulary and classifier artifacts
//!
//! Both artifacts are bincode-encoded envelopes. The classifier envelope
//! records the digest of the vocabulary it was trained with; loading a pair
//! whose digests disagree fails instead of silently scoring against the
//! wrong feature space.

use crate::naive_bayes::NaiveBayesModel;
use crate::vocabulary::Vocabulary;
use moodscope_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Artifact layout version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct VocabularyArtifact {
    format_version: u32,
    terms: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassifierArtifact {
    format_version: u32,
    vocabulary_digest: String,
    model: NaiveBayesModel,
}

/// Reads and writes the artifact pair
#[derive(Debug, Clone)]
pub struct ModelStore {
    vocabulary_path: PathBuf,
    classifier_path: PathBuf,
}

impl ModelStore {
    pub fn new(vocabulary_path: impl Into<PathBuf>, classifier_path: impl Into<PathBuf>) -> Self {
        Self {
            vocabulary_path: vocabulary_path.into(),
            classifier_path: classifier_path.into(),
        }
    }

    pub fn vocabulary_path(&self) -> &Path {
        &self.vocabulary_path
    }

    pub fn classifier_path(&self) -> &Path {
        &self.classifier_path
    }

    /// Persist the vocabulary alone (vocabulary building phase)
    pub fn save_vocabulary(&self, vocabulary: &Vocabulary) -> Result<()> {
        let artifact = VocabularyArtifact {
            format_version: FORMAT_VERSION,
            terms: vocabulary.terms().to_vec(),
        };
        write_artifact(&self.vocabulary_path, &bincode::serialize(&artifact)?)?;
        info!(
            "Saved vocabulary ({} terms) to {}",
            vocabulary.len(),
            self.vocabulary_path.display()
        );
        Ok(())
    }

    /// Load the vocabulary alone (training phase)
    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        let bytes = read_artifact(&self.vocabulary_path)?;
        let artifact: VocabularyArtifact = decode(&self.vocabulary_path, &bytes)?;
        check_version(&self.vocabulary_path, artifact.format_version)?;
        Ok(Vocabulary::new(artifact.terms))
    }

    /// Persist the vocabulary and the classifier trained against it
    pub fn save(&self, vocabulary: &Vocabulary, model: &NaiveBayesModel) -> Result<()> {
        self.save_vocabulary(vocabulary)?;

        let artifact = ClassifierArtifact {
            format_version: FORMAT_VERSION,
            vocabulary_digest: vocabulary.digest(),
            model: model.clone(),
        };
        write_artifact(&self.classifier_path, &bincode::serialize(&artifact)?)?;
        info!("Saved classifier to {}", self.classifier_path.display());
        Ok(())
    }

    /// Load both artifacts and verify they belong together
    pub fn load(&self) -> Result<(Vocabulary, NaiveBayesModel)> {
        let vocabulary = self.load_vocabulary()?;

        let bytes = read_artifact(&self.classifier_path)?;
        let artifact: ClassifierArtifact = decode(&self.classifier_path, &bytes)?;
        check_version(&self.classifier_path, artifact.format_version)?;

        let digest = vocabulary.digest();
        if artifact.vocabulary_digest != digest {
            return Err(Error::model(format!(
                "classifier {} was trained with vocabulary {}, but {} has digest {}",
                self.classifier_path.display(),
                artifact.vocabulary_digest,
                self.vocabulary_path.display(),
                digest
            )));
        }

        info!(
            "Loaded vocabulary ({} terms) and classifier ({} features)",
            vocabulary.len(),
            artifact.model.feature_count()
        );
        Ok((vocabulary, artifact.model))
    }
}

fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| Error::model(format!("failed to read artifact {}: {e}", path.display())))
}

fn decode<T: serde::de::DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes)
        .map_err(|e| Error::model(format!("corrupt artifact {}: {e}", path.display())))
}

fn check_version(path: &Path, version: u32) -> Result<()> {
    if version != FORMAT_VERSION {
        return Err(Error::model(format!(
            "artifact {} has format version {version}, expected {FORMAT_VERSION}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, LabeledExample};
    use crate::features::FeatureExtractor;
    use crate::tokenizer::WhitespaceSegmenter;
    use moodscope_core::Label;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn trained() -> (Vocabulary, NaiveBayesModel, FeatureExtractor) {
        let vocabulary = Vocabulary::new(vec!["love".into(), "hate".into(), "fine".into()]);
        let extractor = FeatureExtractor::new(Arc::new(WhitespaceSegmenter));
        let examples: Vec<LabeledExample> = [
            ("I hate this", Label::Negative),
            ("I love this", Label::Positive),
            ("It is fine", Label::Neutral),
        ]
        .iter()
        .map(|(text, label)| {
            LabeledExample::new(extractor.extract(text, &vocabulary).unwrap(), *label)
        })
        .collect();
        let model = NaiveBayesModel::fit(&examples).unwrap();
        (vocabulary, model, extractor)
    }

    fn store(dir: &TempDir) -> ModelStore {
        ModelStore::new(
            dir.path().join("artifacts/word_features.bin"),
            dir.path().join("artifacts/classifier.bin"),
        )
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let (vocabulary, model, extractor) = trained();

        store.save(&vocabulary, &model).unwrap();
        let (loaded_vocabulary, loaded_model) = store.load().unwrap();

        assert_eq!(loaded_vocabulary, vocabulary);
        for text in ["I love it", "hate hate", "fine by me", "nothing"] {
            let before = extractor.extract(text, &vocabulary).unwrap();
            let after = extractor.extract(text, &loaded_vocabulary).unwrap();
            assert_eq!(model.predict(&before), loaded_model.predict(&after));
        }
    }

    #[test]
    fn test_vocabulary_mismatch_fails_fast() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let (vocabulary, model, _) = trained();
        store.save(&vocabulary, &model).unwrap();

        store
            .save_vocabulary(&Vocabulary::new(vec!["love".into()]))
            .unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir).load().unwrap_err();
        assert!(matches!(err, Error::Model(_)));
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let (vocabulary, model, _) = trained();
        store.save(&vocabulary, &model).unwrap();
        std::fs::write(store.classifier_path(), b"not bincode").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }
}
