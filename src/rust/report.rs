use serde::Serialize;

use crate::classifier::ClassifierError;
use crate::tagger::{self, CategoryTag};

/// One (label, confidence) pair produced by an inference engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    label: String,
    score: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Confidence, expected in `[0.0, 1.0]`.
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Checks the invariants an engine must uphold: non-empty label and a
    /// finite score within `[0, 1]`.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.label.trim().is_empty() {
            return Err(ClassifierError::InferenceError(
                "Engine returned a prediction with an empty label".into(),
            ));
        }
        if !self.score.is_finite() || !(0.0..=1.0).contains(&self.score) {
            return Err(ClassifierError::InferenceError(format!(
                "Engine returned score {} for '{}', expected a value in [0, 1]",
                self.score, self.label
            )));
        }
        Ok(())
    }
}

/// A [`Prediction`] paired with the category its label resolves to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    #[serde(flatten)]
    prediction: Prediction,
    tag: CategoryTag,
}

impl RankedResult {
    /// Tags the prediction's label.
    pub fn new(prediction: Prediction) -> Self {
        let tag = tagger::tag(prediction.label());
        Self { prediction, tag }
    }

    pub fn prediction(&self) -> &Prediction {
        &self.prediction
    }

    pub fn label(&self) -> &str {
        self.prediction.label()
    }

    pub fn score(&self) -> f32 {
        self.prediction.score()
    }

    pub fn tag(&self) -> CategoryTag {
        self.tag
    }

    pub fn glyph(&self) -> &'static str {
        self.tag.glyph()
    }
}

/// Classification outcome for a single image.
///
/// Built once by the pipeline and never mutated. `ranked` is non-empty and
/// sorted descending by score; `top_result` is always `ranked[0]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    top_result: RankedResult,
    ranked: Vec<RankedResult>,
    source_index: usize,
}

impl ClassificationReport {
    /// Assembles a report from results that are already ranked.
    ///
    /// Fails with [`ClassifierError::EmptyPredictionSet`] when `ranked` is empty.
    pub(crate) fn from_ranked(
        ranked: Vec<RankedResult>,
        source_index: usize,
    ) -> Result<Self, ClassifierError> {
        let top_result = ranked
            .first()
            .cloned()
            .ok_or(ClassifierError::EmptyPredictionSet)?;
        Ok(Self {
            top_result,
            ranked,
            source_index,
        })
    }

    pub fn top_result(&self) -> &RankedResult {
        &self.top_result
    }

    pub fn ranked(&self) -> &[RankedResult] {
        &self.ranked
    }

    /// 1-based position of the image in its batch. For display only.
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Whether `ranked` is in descending score order. Always true unless the
    /// pipeline trusted an engine that returned unsorted output.
    pub fn is_ranked(&self) -> bool {
        self.ranked.windows(2).all(|w| w[0].score() >= w[1].score())
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}
