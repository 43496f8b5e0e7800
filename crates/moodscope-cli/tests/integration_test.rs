//! Integration tests driving the moodscope binary through a full pipeline run

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn moodscope(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_moodscope"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run moodscope")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "moodscope failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Lay out a corpus, term lists and a config pointing at them
fn workspace(dir: &TempDir) -> PathBuf {
    let root = dir.path();
    std::fs::write(
        root.join("corpus.txt"),
        "0I hate this\n2I love this\n1It is fine\n",
    )
    .unwrap();
    std::fs::write(root.join("stopwords.txt"), "").unwrap();
    std::fs::write(root.join("features.dat"), "hate\nlove\nfine\n").unwrap();

    let config = root.join("moodscope.yaml");
    let yaml = format!(
        "corpus:\n  path: {root}/corpus.txt\n  stop_words: {root}/stopwords.txt\n  feature_templates: {root}/features.dat\nvocabulary:\n  max_size: 10\nartifacts:\n  vocabulary: {root}/artifacts/word_features.bin\n  classifier: {root}/artifacts/classifier.bin\n",
        root = root.display()
    );
    std::fs::write(&config, yaml).unwrap();
    config
}

#[test]
fn test_build_train_classify() {
    let dir = TempDir::new().unwrap();
    let config = workspace(&dir);

    let output = moodscope(&config, &["build-vocab", "--text-out"]);
    assert!(!output.status.success(), "--text-out requires a value");

    let text_out = dir.path().join("features.txt");
    let output = moodscope(&config, &["build-vocab", "--text-out", text_out.to_str().unwrap()]);
    assert_success(&output);
    let plain = std::fs::read_to_string(&text_out).unwrap();
    for term in ["hate", "love", "fine"] {
        assert!(plain.lines().any(|line| line == term), "missing {term}");
    }

    let output = moodscope(&config, &["train", "--split-ratio", "1.0", "--seed", "1", "--show-features", "3"]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("accuracy: n/a"));

    let output = moodscope(&config, &["classify", "I love this"]);
    assert_success(&output);
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["label"], 2);
}

#[test]
fn test_analyze_posts_file() {
    let dir = TempDir::new().unwrap();
    let config = workspace(&dir);
    assert_success(&moodscope(&config, &["build-vocab"]));
    assert_success(&moodscope(&config, &["train", "--split-ratio", "1.0", "--seed", "1"]));

    let posts = dir.path().join("posts.json");
    std::fs::write(
        &posts,
        r#"{"statuses": [
            {"id": 1, "text": "I hate this", "created_at": "Sun Jun 30 12:27:28 +0800 2013"},
            {"id": 2, "text": "I hate ", "retweeted_status": {"text": "this"}}
        ]}"#,
    )
    .unwrap();
    let report_path = dir.path().join("report.json");

    let output = moodscope(
        &config,
        &["analyze", "--posts", posts.to_str().unwrap(), "--output", report_path.to_str().unwrap()],
    );
    assert_success(&output);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["total"], 2);
    assert_eq!(report["neg"], 2);
    assert_eq!(report["weibo"][0]["created_at"], 1_372_566_448);
    assert_eq!(report["remark"], "经检测我这段时间内的负能量过高，需要补充正能量!");
}

#[test]
fn test_classify_without_artifacts_fails() {
    let dir = TempDir::new().unwrap();
    let config = workspace(&dir);

    let output = moodscope(&config, &["classify", "anything"]);
    assert!(!output.status.success());
}
