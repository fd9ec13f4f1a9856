use std::sync::Arc;

use image::DynamicImage;
use log::debug;

use super::error::ClassifierError;
use crate::report::Prediction;

/// Scores a decoded image against a model's label set.
///
/// Implementations are loaded once and shared read-only across threads, so they
/// must be `Send + Sync`. The returned sequence has at most `top_k` entries and
/// should be sorted descending by score, though callers may choose not to rely
/// on that (see [`RankingPolicy`](super::RankingPolicy)).
///
/// Failures inside the engine are reported as [`ClassifierError::InferenceError`].
pub trait InferenceEngine: Send + Sync {
    fn infer(&self, image: &DynamicImage, top_k: usize) -> Result<Vec<Prediction>, ClassifierError>;
}

impl<T: InferenceEngine + ?Sized> InferenceEngine for Arc<T> {
    fn infer(&self, image: &DynamicImage, top_k: usize) -> Result<Vec<Prediction>, ClassifierError> {
        (**self).infer(image, top_k)
    }
}

impl<T: InferenceEngine + ?Sized> InferenceEngine for Box<T> {
    fn infer(&self, image: &DynamicImage, top_k: usize) -> Result<Vec<Prediction>, ClassifierError> {
        (**self).infer(image, top_k)
    }
}

/// Turns encoded image bytes into a raster image.
pub trait ImageDecoder: Send + Sync {
    /// Fails with [`ClassifierError::InvalidImage`] on malformed input.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, ClassifierError>;
}

/// Decoder backed by the `image` crate. Format is detected from the content.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, ClassifierError> {
        if bytes.is_empty() {
            return Err(ClassifierError::InvalidImage("Input is empty".into()));
        }
        let image = image::load_from_memory(bytes)?;
        debug!("Decoded {}x{} image", image.width(), image.height());
        Ok(image)
    }
}
