//! Configuration loading with command line overrides

use moodscope_classifiers::MoodscopeConfig;

use crate::{Cli, Command};

/// Load configuration from file (or defaults) and apply CLI overrides
pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<MoodscopeConfig> {
    let mut config = MoodscopeConfig::load_or_default(config_path)?;

    apply_overrides(&mut config, &cli.command);

    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut MoodscopeConfig, command: &Command) {
    match command {
        Command::BuildVocab {
            max_size: Some(max_size),
            ..
        } => {
            config.vocabulary.max_size = *max_size;
        }
        Command::Train {
            split_ratio, seed, ..
        } => {
            if let Some(split_ratio) = split_ratio {
                config.training.split_ratio = *split_ratio;
            }
            if seed.is_some() {
                config.training.seed = *seed;
            }
        }
        Command::Analyze {
            months: Some(months),
            ..
        } => {
            config.analysis.months = *months;
        }
        Command::Serve { listen, port } => {
            if let Some(listen) = listen {
                config.server.listen = listen.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_train_overrides() {
        let cli = parse(&["moodscope", "train", "--split-ratio", "0.5", "--seed", "11"]);
        let mut config = MoodscopeConfig::default();
        apply_overrides(&mut config, &cli.command);

        assert_eq!(config.training.split_ratio, 0.5);
        assert_eq!(config.training.seed, Some(11));
        assert_eq!(config.vocabulary.max_size, 1500);
    }

    #[test]
    fn test_serve_overrides() {
        let cli = parse(&["moodscope", "serve", "--port", "9000"]);
        let mut config = MoodscopeConfig::default();
        apply_overrides(&mut config, &cli.command);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.listen, "0.0.0.0");
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        let cli = parse(&[
            "moodscope",
            "--config",
            path.to_str().unwrap(),
            "build-vocab",
            "--max-size",
            "0",
        ]);

        assert!(load(&cli.config, &cli).is_err());
    }

    #[test]
    fn test_remap_schemes_parse() {
        let cli = parse(&["moodscope", "remap", "-i", "a.txt", "-o", "b.txt"]);
        match cli.command {
            Command::Remap { from, to, .. } => {
                assert_eq!(from, moodscope_classifiers::MarkerScheme::Letter);
                assert_eq!(to, moodscope_classifiers::MarkerScheme::Digit);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
