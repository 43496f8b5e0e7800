//! Labeled corpus reading
//!
//! A corpus is a UTF-8 text file with one document per line. The first
//! character of each line is a label marker; the rest of the line is the
//! document text, passed through unchanged.

use moodscope_core::{Error, Label, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Field separator of the raw annotation export
const DELIMITED_SEPARATOR: &str = "|**|";

/// How a line's leading character maps to a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerScheme {
    /// `0` negative, `1` neutral, `2` positive, anything else neutral
    #[default]
    Digit,
    /// `d` negative, `s` neutral, anything else positive
    Letter,
}

impl MarkerScheme {
    /// Label for a marker character; unknown markers get the fallback class
    pub fn label_for(self, marker: char) -> Label {
        match (self, marker) {
            (Self::Digit, '0') => Label::Negative,
            (Self::Digit, '2') => Label::Positive,
            (Self::Digit, _) => Label::Neutral,
            (Self::Letter, 'd') => Label::Negative,
            (Self::Letter, 's') => Label::Neutral,
            (Self::Letter, _) => Label::Positive,
        }
    }

    /// Canonical marker character for a label
    pub fn marker_for(self, label: Label) -> char {
        match (self, label) {
            (Self::Digit, Label::Negative) => '0',
            (Self::Digit, Label::Neutral) => '1',
            (Self::Digit, Label::Positive) => '2',
            (Self::Letter, Label::Negative) => 'd',
            (Self::Letter, Label::Neutral) => 's',
            (Self::Letter, Label::Positive) => 'p',
        }
    }
}

impl FromStr for MarkerScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "digit" => Ok(Self::Digit),
            "letter" => Ok(Self::Letter),
            other => Err(Error::config(format!("unknown marker scheme '{other}'"))),
        }
    }
}

/// One labeled line of the corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusDocument {
    pub label: Label,
    /// Text with the marker removed
    pub text: String,
}

impl CorpusDocument {
    pub fn new(label: Label, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }
}

/// Reads labeled corpora
#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusReader {
    scheme: MarkerScheme,
}

impl CorpusReader {
    pub fn new(scheme: MarkerScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> MarkerScheme {
        self.scheme
    }

    /// Parse one corpus line; empty lines carry no document
    pub fn parse_line(&self, line: &str) -> Option<CorpusDocument> {
        let mut chars = line.chars();
        let marker = chars.next()?;
        Some(CorpusDocument::new(
            self.scheme.label_for(marker),
            chars.as_str(),
        ))
    }

    /// Read every document of a corpus file
    ///
    /// A missing file is fatal. Lines that are not valid UTF-8 are skipped
    /// with a warning so one bad record does not discard the corpus.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<CorpusDocument>> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::input(format!("failed to open corpus {}: {e}", path.display())))?;

        let mut documents = Vec::new();
        let mut skipped = 0usize;

        for (index, raw) in BufReader::new(file).split(b'\n').enumerate() {
            let mut raw = raw?;
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }

            let line = match String::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    warn!("Skipping corpus line {}: invalid UTF-8 ({})", index + 1, e);
                    skipped += 1;
                    continue;
                }
            };

            match self.parse_line(&line) {
                Some(document) => documents.push(document),
                None => debug!("Skipping empty corpus line {}", index + 1),
            }
        }

        info!(
            "Read {} documents from {} ({} skipped)",
            documents.len(),
            path.display(),
            skipped
        );
        Ok(documents)
    }
}

/// Read a one-term-per-line file (stop words, feature templates, plain vocabularies)
pub fn read_term_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::input(format!("failed to read {}: {e}", path.display())))?;

    Ok(content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Convert a raw `id|**|text|**|label...` export record into a corpus line
///
/// The marker is the first character of the third field. Records with fewer
/// than three fields or an empty label field are rejected.
pub fn prepare_delimited(record: &str) -> Option<String> {
    let fields: Vec<&str> = record.split(DELIMITED_SEPARATOR).collect();
    if fields.len() < 3 {
        return None;
    }
    let marker = fields[2].chars().next()?;
    Some(format!("{marker} {}", fields[1].trim_end_matches(['\r', '\n'])))
}

/// Rewrite a corpus line's marker from one scheme into another
pub fn remap_marker(line: &str, from: MarkerScheme, to: MarkerScheme) -> Option<String> {
    let document = CorpusReader::new(from).parse_line(line)?;
    Some(format!("{}{}", to.marker_for(document.label), document.text))
}

/// Fold a five-level digit marker onto the three-class digit scheme
///
/// `0` and `1` become negative, `2` stays positive and any other marker
/// becomes neutral. The rest of the line is kept as is.
pub fn collapse_marker(line: &str) -> Option<String> {
    let mut chars = line.chars();
    let marker = match chars.next()? {
        '0' | '1' => '0',
        '2' => '2',
        _ => '1',
    };
    Some(format!("{marker}{}", chars.as_str()))
}
