//! Moodscope
//!
//! Command line front of the sentiment pipeline: corpus preparation,
//! vocabulary building, training, one-off classification, batch analysis
//! of fetched posts, and an HTTP server around the trained model.

use anyhow::Result;
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use moodscope_classifiers::MarkerScheme;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};

mod commands;
mod config;
mod routes;
mod server;

#[derive(Parser, Debug)]
#[command(name = "moodscope")]
#[command(about = "Sentiment analysis of microblog timelines", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "moodscope.yaml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a `|**|`-delimited annotation export into a marker-prefixed corpus
    Prepare {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Rewrite corpus markers from one scheme into another
    Remap {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Scheme of the input markers (digit or letter)
        #[arg(long, default_value = "letter")]
        from: MarkerScheme,

        /// Scheme of the output markers (digit or letter)
        #[arg(long, default_value = "digit")]
        to: MarkerScheme,

        /// Fold five-level digit markers onto 0/1/2 instead of converting schemes
        #[arg(long, conflicts_with_all = ["from", "to"])]
        collapse: bool,
    },

    /// Build and persist the feature vocabulary
    BuildVocab {
        /// Maximum number of vocabulary terms
        #[arg(long)]
        max_size: Option<usize>,

        /// Also write the vocabulary as a plain one-term-per-line file
        #[arg(long)]
        text_out: Option<PathBuf>,
    },

    /// Train the classifier against the persisted vocabulary
    Train {
        /// Fraction of the corpus used for training
        #[arg(long)]
        split_ratio: Option<f64>,

        /// Shuffle seed
        #[arg(long)]
        seed: Option<u64>,

        /// Print the N most informative features
        #[arg(long, default_value = "0")]
        show_features: usize,
    },

    /// Classify one text with the persisted model
    Classify {
        text: String,
    },

    /// Analyze a JSON file of fetched posts
    Analyze {
        /// JSON array of posts, or a timeline object with `statuses`
        #[arg(short, long)]
        posts: PathBuf,

        /// Window length in months (implies --window)
        #[arg(short, long)]
        months: Option<u32>,

        /// Keep only posts inside the configured time window
        #[arg(short, long)]
        window: bool,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve analysis over HTTP
    Serve {
        /// Listen address
        #[arg(short = 'l', long)]
        listen: Option<String>,

        /// Listen port
        #[arg(short = 'P', long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = config::load(&cli.config, &cli)?;

    match &cli.command {
        Command::Prepare { input, output } => commands::prepare(input, output),
        Command::Remap {
            input,
            output,
            collapse: true,
            ..
        } => commands::collapse(input, output),
        Command::Remap {
            input,
            output,
            from,
            to,
            ..
        } => commands::remap(input, output, *from, *to),
        Command::BuildVocab { text_out, .. } => commands::build_vocab(&config, text_out.as_deref()),
        Command::Train { show_features, .. } => commands::train(&config, *show_features),
        Command::Classify { text } => commands::classify(&config, text),
        Command::Analyze {
            posts,
            months,
            window,
            output,
        } => {
            let window = (*window || months.is_some()).then_some(config.analysis.months);
            commands::analyze(&config, posts, window, output.as_deref())
        }
        Command::Serve { .. } => serve(config).await,
    }
}

async fn serve(config: moodscope_classifiers::MoodscopeConfig) -> Result<()> {
    info!("Starting Moodscope server");

    let metrics_handle = init_metrics()?;

    let addr: SocketAddr = format!("{}:{}", config.server.listen, config.server.port).parse()?;
    let state = server::AppState::new(config, metrics_handle)?;
    if !state.shared.is_loaded() {
        warn!("No model loaded; analysis requests will fail until POST /admin/reload succeeds");
    }

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            warn!("Shutdown signal received, stopping server...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("moodscope=debug,moodscope_classifiers=debug,moodscope_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("moodscope=info,moodscope_classifiers=info,moodscope_core=info")
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "moodscope_posts_classified_total",
        "Total number of posts classified by label"
    );
    metrics::describe_histogram!(
        "moodscope_analysis_latency_us",
        metrics::Unit::Microseconds,
        "Batch analysis latency in microseconds"
    );
    metrics::describe_counter!(
        "moodscope_requests_total",
        "Total number of HTTP requests by route"
    );
    metrics::describe_counter!("moodscope_errors_total", "Total number of errors by type");

    info!("Metrics exporter initialized");
    Ok(handle)
}
