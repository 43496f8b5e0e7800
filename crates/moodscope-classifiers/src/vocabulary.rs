//! Feature vocabulary
//!
//! The vocabulary is the frozen, ordered list of terms whose presence is
//! recorded for every document. It is built once from the labeled corpus
//! and must be the exact same list at training and inference time; its
//! SHA-256 digest pins a trained classifier to it.

use crate::corpus::CorpusDocument;
use crate::tokenizer::Segmenter;
use moodscope_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default bound on vocabulary size
pub const DEFAULT_MAX_SIZE: usize = 1500;

/// Ordered, frozen list of feature terms
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
}

impl Vocabulary {
    pub fn new(terms: Vec<String>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|t| t == term)
    }

    /// Hex SHA-256 over the terms joined by `\n`
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                hasher.update(b"\n");
            }
            hasher.update(term.as_bytes());
        }

        hasher
            .finalize()
            .iter()
            .fold(String::with_capacity(64), |mut out, byte| {
                let _ = write!(out, "{byte:02x}");
                out
            })
    }

    /// Load a plain-text vocabulary (one term per line)
    pub fn from_term_file(path: impl AsRef<Path>) -> Result<Self> {
        crate::corpus::read_term_list(path).map(Self::new)
    }

    /// Write the vocabulary as plain text, one term per line
    pub fn write_text(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut content = self.terms.join("\n");
        content.push('\n');
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Term counts over a whole corpus
#[derive(Debug, Clone, Default)]
pub struct FrequencyDistribution {
    /// term -> (count, first-seen position)
    counts: HashMap<String, (usize, usize)>,
}

impl FrequencyDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `term`
    pub fn add(&mut self, term: &str) {
        let next = self.counts.len();
        self.counts
            .entry(term.to_string())
            .or_insert((0, next))
            .0 += 1;
    }

    /// Occurrences of `term`
    pub fn count(&self, term: &str) -> usize {
        self.counts.get(term).map_or(0, |(count, _)| *count)
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of recorded occurrences
    pub fn total(&self) -> usize {
        self.counts.values().map(|(count, _)| count).sum()
    }

    /// All terms ordered by descending count, then ascending term
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(term, (count, _))| (term.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// The `n` most frequent terms, ties in lexicographic order
    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    /// The `n` most frequent terms, ties in first-seen order
    pub fn most_common_stable(&self, n: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize, usize)> = self
            .counts
            .iter()
            .map(|(term, (count, first))| (term.as_str(), *count, *first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));
        ranked
            .into_iter()
            .take(n)
            .map(|(term, count, _)| (term, count))
            .collect()
    }
}

impl<'a> FromIterator<&'a str> for FrequencyDistribution {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut dist = Self::new();
        for term in iter {
            dist.add(term);
        }
        dist
    }
}

/// Heuristic for terms worth keeping without a template: not purely
/// alphanumeric, longer than three characters, no `.` or `_`
pub fn is_meaningful_term(term: &str) -> bool {
    !term.chars().all(char::is_alphanumeric)
        && term.chars().count() > 3
        && !term.contains('.')
        && !term.contains('_')
}

/// Selects the vocabulary from a labeled corpus
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    max_size: usize,
    stop_words: HashSet<String>,
    templates: HashSet<String>,
}

impl VocabularyBuilder {
    /// Create a builder bounded to `max_size` terms
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            stop_words: HashSet::new(),
            templates: HashSet::new(),
        }
    }

    /// Tokens to drop before counting
    pub fn with_stop_words(mut self, stop_words: impl IntoIterator<Item = String>) -> Self {
        self.stop_words.extend(stop_words);
        self
    }

    /// Pre-vetted terms that qualify regardless of the heuristic
    pub fn with_templates(mut self, templates: impl IntoIterator<Item = String>) -> Self {
        self.templates.extend(templates);
        self
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Count every non-stop-word token of the corpus
    ///
    /// Documents that fail to segment are skipped and logged.
    pub fn frequencies(
        &self,
        documents: &[CorpusDocument],
        segmenter: &dyn Segmenter,
    ) -> FrequencyDistribution {
        let mut dist = FrequencyDistribution::new();

        for (index, document) in documents.iter().enumerate() {
            let tokens = match segmenter.segment(&document.text) {
                Ok(tokens) => tokens,
                Err(e) => {
                    warn!("Skipping document {} during counting: {}", index, e);
                    continue;
                }
            };

            for token in tokens.iter().filter(|t| !self.stop_words.contains(*t)) {
                dist.add(token);
            }
        }

        dist
    }

    /// Whether a counted term is eligible for the vocabulary
    pub fn qualifies(&self, term: &str) -> bool {
        is_meaningful_term(term) || self.templates.contains(term)
    }

    /// Select the vocabulary from already counted terms
    pub fn select(&self, dist: &FrequencyDistribution) -> Result<Vocabulary> {
        if self.max_size == 0 {
            return Err(Error::config("vocabulary max_size must be greater than 0"));
        }

        let terms: Vec<String> = dist
            .ranked()
            .into_iter()
            .filter(|(term, _)| self.qualifies(term))
            .take(self.max_size)
            .map(|(term, count)| {
                debug!("Selected feature {} ({})", term, count);
                term.to_string()
            })
            .collect();

        if terms.is_empty() {
            warn!("No corpus term qualified for the vocabulary");
        }

        Ok(Vocabulary::new(terms))
    }

    /// Count the corpus and select the vocabulary
    pub fn build(
        &self,
        documents: &[CorpusDocument],
        segmenter: &dyn Segmenter,
    ) -> Result<Vocabulary> {
        let dist = self.frequencies(documents, segmenter);
        info!(
            "Counted {} distinct terms ({} tokens) over {} documents",
            dist.len(),
            dist.total(),
            documents.len()
        );

        let vocabulary = self.select(&dist)?;
        info!(
            "Selected {} of at most {} vocabulary terms",
            vocabulary.len(),
            self.max_size
        );
        Ok(vocabulary)
    }
}

impl Default for VocabularyBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceSegmenter;
    use moodscope_core::Label;

    fn docs(texts: &[&str]) -> Vec<CorpusDocument> {
        texts
            .iter()
            .map(|t| CorpusDocument::new(Label::Neutral, *t))
            .collect()
    }

    #[test]
    fn test_meaningful_term_heuristic() {
        assert!(is_meaningful_term("[哈哈]"));
        assert!(is_meaningful_term("=。=!"));
        assert!(!is_meaningful_term("hate"));
        assert!(!is_meaningful_term("嘻嘻嘻嘻"));
        assert!(!is_meaningful_term("[哈]"));
        assert!(!is_meaningful_term("www.x"));
        assert!(!is_meaningful_term("T_T!!"));
    }

    #[test]
    fn test_stop_words_are_not_counted() {
        let builder = VocabularyBuilder::new(10).with_stop_words(vec!["the".to_string()]);
        let dist = builder.frequencies(&docs(&["the cat", "the dog"]), &WhitespaceSegmenter);
        assert_eq!(dist.count("the"), 0);
        assert_eq!(dist.count("cat"), 1);
        assert_eq!(dist.len(), 2);
    }

    #[test]
    fn test_selection_orders_by_frequency_then_term() {
        let builder = VocabularyBuilder::new(10);
        let corpus = docs(&["[呵呵] [哈哈] [嘻嘻]", "[哈哈] [嘻嘻]", "[嘻嘻]"]);
        let vocabulary = builder.build(&corpus, &WhitespaceSegmenter).unwrap();
        assert_eq!(vocabulary.terms(), &["[嘻嘻]", "[哈哈]", "[呵呵]"]);
    }

    #[test]
    fn test_templates_admit_alphanumeric_terms() {
        let builder = VocabularyBuilder::new(10).with_templates(vec!["love".to_string()]);
        let vocabulary = builder
            .build(&docs(&["I love this", "I hate this"]), &WhitespaceSegmenter)
            .unwrap();
        assert_eq!(vocabulary.terms(), &["love"]);
    }

    #[test]
    fn test_size_bound_and_no_padding() {
        let corpus = docs(&["[aaa] [bbb] [ccc] [ddd]"]);

        let bounded = VocabularyBuilder::new(2)
            .build(&corpus, &WhitespaceSegmenter)
            .unwrap();
        assert_eq!(bounded.len(), 2);

        let roomy = VocabularyBuilder::new(100)
            .build(&corpus, &WhitespaceSegmenter)
            .unwrap();
        assert_eq!(roomy.len(), 4);
    }

    #[test]
    fn test_zero_max_size_is_config_error() {
        let err = VocabularyBuilder::new(0)
            .build(&docs(&["[aaa]"]), &WhitespaceSegmenter)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_build_is_deterministic() {
        let corpus = docs(&["[x1] [x2] [x3] [x4]", "[x4] [x3]", "[x2] [x9] [x8]"]);
        let builder = VocabularyBuilder::new(3).with_templates(vec!["x".to_string()]);
        let first = builder.build(&corpus, &WhitespaceSegmenter).unwrap();
        let second = builder.build(&corpus, &WhitespaceSegmenter).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.digest(), second.digest());
    }

    #[test]
    fn test_digest_depends_on_order() {
        let a = Vocabulary::new(vec!["[a]".into(), "[b]".into()]);
        let b = Vocabulary::new(vec!["[b]".into(), "[a]".into()]);
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_most_common_stable_keeps_first_seen_ties() {
        let dist: FrequencyDistribution = ["c", "a", "c", "a", "b"].into_iter().collect();
        let ranked: Vec<&str> = dist.most_common_stable(3).into_iter().map(|(t, _)| t).collect();
        assert_eq!(ranked, vec!["c", "a", "b"]);
        let lexical: Vec<&str> = dist.most_common(3).into_iter().map(|(t, _)| t).collect();
        assert_eq!(lexical, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_text_round_trip() {
        let vocabulary = Vocabulary::new(vec!["[哈哈]".into(), "么么哒".into()]);
        let file = tempfile::NamedTempFile::new().unwrap();
        vocabulary.write_text(file.path()).unwrap();
        assert_eq!(Vocabulary::from_term_file(file.path()).unwrap(), vocabulary);
    }
}
