//! Offline pipeline commands

use anyhow::{Context, Result};
use chrono::Local;
use moodscope_classifiers::analysis::posts_from_values;
use moodscope_classifiers::corpus::{collapse_marker, prepare_delimited, remap_marker};
use moodscope_classifiers::time_window::{filter_since, window_start};
use moodscope_classifiers::{
    Analyzer, FeatureExtractor, JiebaKeywordExtractor, MarkerScheme, ModelContext,
    MoodscopeConfig, Trainer,
};
use moodscope_core::{Error, Post};
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Posts file layout: a bare array or a timeline page
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PostsInput {
    List(Vec<serde_json::Value>),
    Timeline { statuses: Vec<serde_json::Value> },
}

impl PostsInput {
    fn into_values(self) -> Vec<serde_json::Value> {
        match self {
            Self::List(values) | Self::Timeline { statuses: values } => values,
        }
    }
}

/// Parse a posts document, dropping entries that are not posts
pub fn parse_posts(json: &str) -> Result<Vec<Post>> {
    let input: PostsInput = serde_json::from_str(json).context("invalid posts document")?;
    Ok(posts_from_values(input.into_values()))
}

pub fn prepare(input: &Path, output: &Path) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let mut written = 0usize;
    let mut rejected = 0usize;
    let mut out = Vec::new();
    for record in content.lines().filter(|line| !line.trim().is_empty()) {
        match prepare_delimited(record) {
            Some(line) => {
                writeln!(out, "{line}")?;
                written += 1;
            }
            None => rejected += 1,
        }
    }

    std::fs::write(output, out).with_context(|| format!("failed to write {}", output.display()))?;
    if rejected > 0 {
        warn!("Rejected {} malformed records", rejected);
    }
    info!("Wrote {} corpus lines to {}", written, output.display());
    Ok(())
}

pub fn remap(input: &Path, output: &Path, from: MarkerScheme, to: MarkerScheme) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let mut out = Vec::new();
    let mut written = 0usize;
    for line in content.lines().filter_map(|line| remap_marker(line, from, to)) {
        writeln!(out, "{line}")?;
        written += 1;
    }

    std::fs::write(output, out).with_context(|| format!("failed to write {}", output.display()))?;
    info!(
        "Remapped {} lines from {:?} to {:?} markers into {}",
        written,
        from,
        to,
        output.display()
    );
    Ok(())
}

pub fn collapse(input: &Path, output: &Path) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let mut out = Vec::new();
    let mut written = 0usize;
    for line in content.lines().filter_map(collapse_marker) {
        writeln!(out, "{line}")?;
        written += 1;
    }

    std::fs::write(output, out).with_context(|| format!("failed to write {}", output.display()))?;
    info!("Collapsed markers on {} lines into {}", written, output.display());
    Ok(())
}

pub fn build_vocab(config: &MoodscopeConfig, text_out: Option<&Path>) -> Result<()> {
    let documents = config.corpus_reader().read(&config.corpus.path)?;
    let segmenter = config.segmenter()?;
    let builder = config.vocabulary_builder()?;

    let dist = builder.frequencies(&documents, &segmenter);
    info!(
        "Counted {} distinct terms over {} documents",
        dist.len(),
        documents.len()
    );
    let vocabulary = builder.select(&dist)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{} vocabulary terms", vocabulary.len())?;
    for term in vocabulary.iter().take(20) {
        writeln!(out, "{term}\t{}", dist.count(term))?;
    }

    config.store().save_vocabulary(&vocabulary)?;
    if let Some(path) = text_out {
        vocabulary.write_text(path)?;
        info!("Wrote plain vocabulary to {}", path.display());
    }
    Ok(())
}

pub fn train(config: &MoodscopeConfig, show_features: usize) -> Result<()> {
    let store = config.store();
    let vocabulary = store
        .load_vocabulary()
        .context("no vocabulary artifact; run build-vocab first")?;
    if vocabulary.is_empty() {
        return Err(Error::vocabulary("persisted vocabulary is empty, nothing to train on").into());
    }
    let documents = config.corpus_reader().read(&config.corpus.path)?;
    let extractor = FeatureExtractor::new(Arc::new(config.segmenter()?));

    let examples = Trainer::build_examples(&documents, &vocabulary, &extractor);
    let report = Trainer::new(config.training.clone())?.train(examples)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match report.accuracy {
        Some(accuracy) => writeln!(
            out,
            "accuracy: {accuracy:.4} ({} train / {} test)",
            report.train_size, report.test_size
        )?,
        None => writeln!(out, "accuracy: n/a ({} train / 0 test)", report.train_size)?,
    }

    for feature in report.model.most_informative_features(show_features) {
        writeln!(
            out,
            "{:>30} = {:<5} {} : {} = {:.1} : 1.0",
            feature.name, feature.value, feature.favored, feature.disfavored, feature.ratio
        )?;
    }

    store.save(&vocabulary, &report.model)?;
    Ok(())
}

pub fn classify(config: &MoodscopeConfig, text: &str) -> Result<()> {
    let extractor = FeatureExtractor::new(Arc::new(config.segmenter()?));
    let context = ModelContext::load(&config.store(), extractor)?;

    let result = context.classify(text)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn analyze(
    config: &MoodscopeConfig,
    posts_path: &Path,
    window_months: Option<u32>,
    output: Option<&Path>,
) -> Result<()> {
    let json = std::fs::read_to_string(posts_path)
        .with_context(|| format!("failed to read {}", posts_path.display()))?;
    let mut posts = parse_posts(&json)?;

    if let Some(months) = window_months {
        let start = window_start(months, &Local::now())?;
        let before = posts.len();
        posts = filter_since(&posts, start);
        info!(
            "Kept {} of {} posts created since {}",
            posts.len(),
            before,
            start
        );
    }

    let segmenter = Arc::new(config.segmenter()?);
    let context = ModelContext::load(&config.store(), FeatureExtractor::new(segmenter.clone()))?;
    let analyzer = Analyzer::new(
        Arc::new(context),
        Arc::new(JiebaKeywordExtractor::new(segmenter)),
        config.analysis.clone(),
    );

    let report = analyzer.analyze(&posts).report();
    let rendered = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Wrote analysis report to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
