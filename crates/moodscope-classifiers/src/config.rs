//! Pipeline configuration

use crate::analysis::AnalysisConfig;
use crate::corpus::{read_term_list, CorpusReader, MarkerScheme};
use crate::model_store::ModelStore;
use crate::tokenizer::JiebaSegmenter;
use crate::trainer::TrainerConfig;
use crate::vocabulary::{VocabularyBuilder, DEFAULT_MAX_SIZE};
use moodscope_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Configuration for every pipeline phase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoodscopeConfig {
    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub vocabulary: VocabularyConfig,

    #[serde(default)]
    pub training: TrainerConfig,

    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Labeled corpus and the term lists used with it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Marker-prefixed corpus, one document per line
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub marker_scheme: MarkerScheme,

    /// Terms never admitted into the vocabulary
    #[serde(default = "default_stop_words")]
    pub stop_words: Option<PathBuf>,

    /// Terms admitted regardless of the term filter
    #[serde(default)]
    pub feature_templates: Option<PathBuf>,

    /// Extra segmentation dictionary
    #[serde(default)]
    pub user_dict: Option<PathBuf>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
            marker_scheme: MarkerScheme::default(),
            stop_words: default_stop_words(),
            feature_templates: None,
            user_dict: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
        }
    }
}

/// Where the vocabulary and classifier artifacts live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default = "default_vocabulary_artifact")]
    pub vocabulary: PathBuf,

    #[serde(default = "default_classifier_artifact")]
    pub classifier: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            vocabulary: default_vocabulary_artifact(),
            classifier: default_classifier_artifact(),
        }
    }
}

/// HTTP front settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
        }
    }
}

impl MoodscopeConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::config(format!("invalid YAML: {e}")))
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    /// Load from file when it exists, defaults otherwise
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.vocabulary.max_size == 0 {
            return Err(Error::config("vocabulary.max_size must be positive"));
        }
        self.training.validate()?;
        if self.analysis.top_keywords == 0 {
            return Err(Error::config("analysis.top_keywords must be positive"));
        }
        if self.analysis.months == 0 {
            return Err(Error::config("analysis.months must be positive"));
        }
        Ok(())
    }

    pub fn store(&self) -> ModelStore {
        ModelStore::new(&self.artifacts.vocabulary, &self.artifacts.classifier)
    }

    pub fn corpus_reader(&self) -> CorpusReader {
        CorpusReader::new(self.corpus.marker_scheme)
    }

    /// Segmenter with the configured user dictionary loaded
    pub fn segmenter(&self) -> Result<JiebaSegmenter> {
        match &self.corpus.user_dict {
            Some(path) => JiebaSegmenter::with_user_dict(path),
            None => Ok(JiebaSegmenter::new()),
        }
    }

    /// Vocabulary builder with stop words and templates read from disk
    pub fn vocabulary_builder(&self) -> Result<VocabularyBuilder> {
        let mut builder = VocabularyBuilder::new(self.vocabulary.max_size);
        if let Some(path) = &self.corpus.stop_words {
            builder = builder.with_stop_words(read_term_list(path)?);
        }
        if let Some(path) = &self.corpus.feature_templates {
            builder = builder.with_templates(read_term_list(path)?);
        }
        Ok(builder)
    }
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/sentimentweibo.txt")
}

fn default_stop_words() -> Option<PathBuf> {
    Some(PathBuf::from("data/stopwords.txt"))
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

fn default_vocabulary_artifact() -> PathBuf {
    PathBuf::from("artifacts/word_features.bin")
}

fn default_classifier_artifact() -> PathBuf {
    PathBuf::from("artifacts/classifier.bin")
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusDocument;
    use crate::tokenizer::WhitespaceSegmenter;
    use moodscope_core::Label;
    use tempfile::TempDir;

    #[test]
    fn test_config_yaml() {
        let yaml = r#"
corpus:
  path: corpus/weibo.txt
  marker_scheme: letter
  stop_words: corpus/stop.txt
  user_dict: corpus/dict.txt
vocabulary:
  max_size: 200
training:
  split_ratio: 0.75
  seed: 7
analysis:
  months: 6
server:
  port: 9090
"#;

        let config = MoodscopeConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.corpus.path, PathBuf::from("corpus/weibo.txt"));
        assert_eq!(config.corpus.marker_scheme, MarkerScheme::Letter);
        assert_eq!(config.corpus.feature_templates, None);
        assert_eq!(config.vocabulary.max_size, 200);
        assert_eq!(config.training.seed, Some(7));
        assert_eq!(config.analysis.months, 6);
        assert_eq!(config.analysis.top_keywords, 300);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.listen, "0.0.0.0");
        assert_eq!(
            config.artifacts.classifier,
            PathBuf::from("artifacts/classifier.bin")
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = MoodscopeConfig::default();
        assert_eq!(config.vocabulary.max_size, 1500);
        assert_eq!(config.training.split_ratio, 0.8);
        assert_eq!(config.analysis.keywords_per_post, 10);
        assert_eq!(config.corpus.marker_scheme, MarkerScheme::Digit);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MoodscopeConfig::default();
        config.vocabulary.max_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = MoodscopeConfig::default();
        config.training.split_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = MoodscopeConfig::default();
        config.analysis.top_keywords = 0;
        assert!(config.validate().is_err());

        let mut config = MoodscopeConfig::default();
        config.analysis.months = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default() {
        let dir = TempDir::new().unwrap();
        let missing = MoodscopeConfig::load_or_default(dir.path().join("none.yaml")).unwrap();
        assert_eq!(missing.server.port, 8080);

        let path = dir.path().join("moodscope.yaml");
        std::fs::write(&path, "vocabulary:\n  max_size: 42\n").unwrap();
        let loaded = MoodscopeConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded.vocabulary.max_size, 42);

        std::fs::write(&path, "vocabulary: [").unwrap();
        assert!(MoodscopeConfig::load_or_default(&path).is_err());
    }

    #[test]
    fn test_vocabulary_builder_reads_term_lists() {
        let dir = TempDir::new().unwrap();
        let stop = dir.path().join("stop.txt");
        let templates = dir.path().join("templates.txt");
        std::fs::write(&stop, "的确如此\n").unwrap();
        std::fs::write(&templates, "love\n").unwrap();

        let mut config = MoodscopeConfig::default();
        config.corpus.stop_words = Some(stop);
        config.corpus.feature_templates = Some(templates);

        let builder = config.vocabulary_builder().unwrap();
        assert!(builder.qualifies("love"));
        let documents = vec![CorpusDocument::new(Label::Positive, "love 的确如此")];
        let dist = builder.frequencies(&documents, &WhitespaceSegmenter);
        assert_eq!(dist.count("love"), 1);
        assert_eq!(dist.count("的确如此"), 0);

        config.corpus.stop_words = Some(dir.path().join("missing.txt"));
        assert!(matches!(config.vocabulary_builder(), Err(Error::Input(_))));
    }
}
