//! Shared state of the HTTP front

use metrics_exporter_prometheus::PrometheusHandle;
use moodscope_classifiers::{
    Analyzer, FeatureExtractor, JiebaKeywordExtractor, JiebaSegmenter, ModelContext,
    MoodscopeConfig, SharedModel,
};
use moodscope_core::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<MoodscopeConfig>,

    /// Currently served model, swapped on reload
    pub shared: Arc<SharedModel>,

    /// Segmenter shared by feature and keyword extraction
    pub segmenter: Arc<JiebaSegmenter>,

    /// Keyword extraction over the shared segmenter
    pub keywords: Arc<JiebaKeywordExtractor>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Build the state and try to load the persisted model
    ///
    /// Missing or mismatched artifacts leave the state without a model; the
    /// segmenter's user dictionary is required.
    pub fn new(config: MoodscopeConfig, metrics_handle: PrometheusHandle) -> Result<Self> {
        let segmenter = Arc::new(config.segmenter()?);
        let state = Self {
            keywords: Arc::new(JiebaKeywordExtractor::new(segmenter.clone())),
            segmenter,
            shared: Arc::new(SharedModel::empty()),
            config: Arc::new(config),
            metrics_handle,
        };

        if let Err(e) = state.reload() {
            warn!("Starting without a model: {}", e);
        }
        Ok(state)
    }

    /// Reload both artifacts and swap them in
    ///
    /// On failure the previously served model stays in place.
    pub fn reload(&self) -> Result<()> {
        let extractor = FeatureExtractor::new(self.segmenter.clone());
        let context = ModelContext::load(&self.config.store(), extractor)?;
        let terms = context.vocabulary().len();
        self.shared.swap(context);
        info!("Model reloaded ({} vocabulary terms)", terms);
        Ok(())
    }

    /// Analyzer over the current model snapshot
    pub fn analyzer(&self) -> Result<Analyzer> {
        Ok(Analyzer::new(
            self.shared.current()?,
            self.keywords.clone(),
            self.config.analysis.clone(),
        ))
    }
}
