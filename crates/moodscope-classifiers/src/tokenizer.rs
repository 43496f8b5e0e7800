//! Word segmentation
//!
//! Segmentation of continuous Chinese text is an external capability; the
//! pipeline only depends on the [`Segmenter`] trait. The default
//! implementation delegates to `jieba-rs`.

use jieba_rs::Jieba;
use moodscope_core::{Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Splits text into word tokens
pub trait Segmenter: Send + Sync {
    /// Segment `text` into non-empty tokens with all whitespace removed
    fn segment(&self, text: &str) -> Result<Vec<String>>;

    /// Segmenter name, for logs
    fn name(&self) -> &str;
}

/// Segmenter backed by the jieba dictionary and HMM model
pub struct JiebaSegmenter {
    jieba: Jieba,
}

impl JiebaSegmenter {
    /// Create a segmenter with the embedded default dictionary
    pub fn new() -> Self {
        Self { jieba: Jieba::new() }
    }

    /// Create a segmenter and merge a user dictionary into it
    ///
    /// The user dictionary uses the jieba format: `word [freq] [tag]` per line.
    pub fn with_user_dict(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::input(format!("failed to open user dictionary {}: {e}", path.display()))
        })?;

        let mut jieba = Jieba::new();
        let mut reader = BufReader::new(file);
        jieba.load_dict(&mut reader).map_err(|e| {
            Error::input(format!("failed to load user dictionary {}: {e}", path.display()))
        })?;
        info!("Loaded user dictionary from {}", path.display());

        Ok(Self { jieba })
    }

    /// Borrow the underlying jieba instance (keyword extraction reuses it)
    pub fn jieba(&self) -> &Jieba {
        &self.jieba
    }
}

impl Default for JiebaSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for JiebaSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>> {
        Ok(self
            .jieba
            .cut(text, true)
            .into_iter()
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect())
    }

    fn name(&self) -> &str {
        "jieba"
    }
}

/// Segmenter for text that is already space-delimited
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceSegmenter;

impl Segmenter for WhitespaceSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>> {
        Ok(text.split_whitespace().map(str::to_string).collect())
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}
