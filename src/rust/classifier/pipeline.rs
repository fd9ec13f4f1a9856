use std::cmp::Ordering;
use std::sync::Arc;

use image::DynamicImage;
use log::{debug, warn};

use super::engine::InferenceEngine;
use super::error::ClassifierError;
use crate::report::{ClassificationReport, Prediction, RankedResult};

/// Number of predictions requested per image when none is given.
pub const DEFAULT_TOP_K: usize = 5;

/// How the pipeline treats the order of the engine's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingPolicy {
    /// Stable-sort predictions descending by score before building the report.
    #[default]
    Sort,
    /// Take the engine's order as authoritative.
    ///
    /// The report is then only sorted if the engine's output was. An unsorted
    /// engine output is logged as a warning and kept as is; check
    /// [`ClassificationReport::is_ranked`] when that matters.
    TrustEngine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub top_k: usize,
    pub ranking: RankingPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            ranking: RankingPolicy::default(),
        }
    }
}

/// Turns one decoded image into a [`ClassificationReport`] using a shared engine.
///
/// The engine is held by `Arc` so a model loaded once at startup can back any
/// number of pipelines and threads.
#[derive(Clone)]
pub struct ClassificationPipeline {
    engine: Arc<dyn InferenceEngine>,
    config: PipelineConfig,
}

impl std::fmt::Debug for ClassificationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ClassificationPipeline {
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self::with_config(engine, PipelineConfig::default())
    }

    pub fn with_config(engine: Arc<dyn InferenceEngine>, config: PipelineConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classifies with the configured `top_k`.
    pub fn classify_default(&self, image: &DynamicImage) -> Result<ClassificationReport, ClassifierError> {
        self.classify(image, self.config.top_k)
    }

    /// Classifies a single image. The report's `source_index` is 1.
    ///
    /// # Example
    /// ```
    /// use pictag::{CategoryTag, ClassificationPipeline, ClassifierError, InferenceEngine, Prediction};
    /// use image::DynamicImage;
    /// use std::sync::Arc;
    ///
    /// struct Stub;
    /// impl InferenceEngine for Stub {
    ///     fn infer(&self, _: &DynamicImage, _: usize) -> Result<Vec<Prediction>, ClassifierError> {
    ///         Ok(vec![Prediction::new("Golden Retriever", 0.92), Prediction::new("Cat", 0.01)])
    ///     }
    /// }
    ///
    /// let pipeline = ClassificationPipeline::new(Arc::new(Stub));
    /// let report = pipeline.classify(&DynamicImage::new_rgb8(1, 1), 5).unwrap();
    /// assert_eq!(report.top_result().tag(), CategoryTag::Canine);
    /// ```
    pub fn classify(&self, image: &DynamicImage, top_k: usize) -> Result<ClassificationReport, ClassifierError> {
        self.classify_indexed(image, top_k, 1)
    }

    /// Classifies an image that sits at `source_index` (1-based) in a batch.
    ///
    /// Calls the engine exactly once.
    ///
    /// # Errors
    /// - `InvalidArgument` if `top_k` is zero
    /// - `InferenceError` if the engine fails or returns a malformed prediction
    /// - `EmptyPredictionSet` if the engine returns nothing
    pub fn classify_indexed(
        &self,
        image: &DynamicImage,
        top_k: usize,
        source_index: usize,
    ) -> Result<ClassificationReport, ClassifierError> {
        validate_top_k(top_k)?;

        let predictions = self.engine.infer(image, top_k)?;
        let report = self.build_report(predictions, top_k, source_index)?;

        let top = report.top_result();
        debug!(
            "Image {}: {} {} ({:.2}%) from {} predictions",
            source_index,
            top.glyph(),
            top.label(),
            top.score() * 100.0,
            report.len()
        );
        Ok(report)
    }

    fn build_report(
        &self,
        mut predictions: Vec<Prediction>,
        top_k: usize,
        source_index: usize,
    ) -> Result<ClassificationReport, ClassifierError> {
        if predictions.is_empty() {
            return Err(ClassifierError::EmptyPredictionSet);
        }
        for prediction in &predictions {
            prediction.validate()?;
        }

        match self.config.ranking {
            RankingPolicy::Sort => {
                // stable, so ties keep engine order
                predictions.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));
            }
            RankingPolicy::TrustEngine => {
                if predictions.windows(2).any(|w| w[0].score() < w[1].score()) {
                    warn!("Image {}: engine output is not sorted by score, keeping engine order", source_index);
                }
            }
        }
        predictions.truncate(top_k);

        let ranked = predictions.into_iter().map(RankedResult::new).collect();
        ClassificationReport::from_ranked(ranked, source_index)
    }
}

pub(crate) fn validate_top_k(top_k: usize) -> Result<(), ClassifierError> {
    if top_k == 0 {
        return Err(ClassifierError::InvalidArgument("top_k must be at least 1".into()));
    }
    Ok(())
}
