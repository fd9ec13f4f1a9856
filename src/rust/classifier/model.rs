use std::sync::Arc;

use image::DynamicImage;
use log::debug;
use ort::session::Session;

use super::engine::InferenceEngine;
use super::error::ClassifierError;
use super::preprocess::ImageScoring;
use super::utils::top_k;
use crate::report::Prediction;
use crate::ModelCharacteristics;

/// A thread-safe image classifier running an ONNX model through ONNX Runtime.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync`: the session and label table are
/// behind `Arc`, so one loaded model can be shared by every pipeline and batch
/// worker in the process without reloading.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use pictag::{BuiltinModel, ImageModel, InferenceEngine};
/// use std::sync::Arc;
///
/// let model = Arc::new(ImageModel::builder()
///     .with_model(BuiltinModel::VitBase)?
///     .build()?);
///
/// let image = image::open("cat.jpg")?;
/// for prediction in model.infer(&image, 5)? {
///     println!("{}: {:.2}", prediction.label(), prediction.score());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ImageModel {
    pub(crate) model_path: String,
    pub(crate) labels_path: String,
    pub(crate) session: Arc<Session>,
    pub(crate) labels: Arc<Vec<String>>,
    pub(crate) model_characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ImageModel>();
    }
};

impl ImageScoring for ImageModel {
    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn characteristics(&self) -> Option<&ModelCharacteristics> {
        Some(&self.model_characteristics)
    }
}

impl ImageModel {
    /// Creates a new ImageModelBuilder for fluent construction
    pub fn builder() -> super::builder::ImageModelBuilder {
        super::builder::ImageModelBuilder::new()
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> super::ImageModelInfo {
        super::ImageModelInfo {
            model_path: self.model_path.clone(),
            labels_path: self.labels_path.clone(),
            num_labels: self.labels.len(),
            input_size: self.model_characteristics.input_size,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl InferenceEngine for ImageModel {
    fn infer(&self, image: &DynamicImage, top_k_count: usize) -> Result<Vec<Prediction>, ClassifierError> {
        let scores = self.score_image(image)?;
        if scores.len() != self.labels.len() {
            return Err(ClassifierError::InferenceError(format!(
                "Model produced {} scores for {} labels",
                scores.len(),
                self.labels.len()
            )));
        }

        let predictions: Vec<Prediction> = top_k(scores.view(), top_k_count)
            .into_iter()
            .map(|(idx, score)| Prediction::new(self.labels[idx].clone(), score))
            .collect();

        debug!(
            "Inference produced {} predictions (best: {:?})",
            predictions.len(),
            predictions.first().map(|p| (p.label(), p.score()))
        );
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuiltinModel, ModelManager};

    #[tokio::test]
    #[ignore = "downloads the ViT model"]
    async fn test_model_info() -> Result<(), Box<dyn std::error::Error>> {
        let manager = ModelManager::new_default()?;
        manager.ensure_model_downloaded(BuiltinModel::VitBase).await?;

        let model = ImageModel::builder()
            .with_model(BuiltinModel::VitBase)?
            .build()?;
        let info = model.info();
        assert_eq!(info.num_labels, 1000);
        assert_eq!(info.input_size, 224);
        Ok(())
    }

    #[tokio::test]
    #[ignore = "downloads the ViT model"]
    async fn test_infer_respects_top_k() -> Result<(), Box<dyn std::error::Error>> {
        let manager = ModelManager::new_default()?;
        manager.ensure_model_downloaded(BuiltinModel::VitBase).await?;

        let model = ImageModel::builder()
            .with_model(BuiltinModel::VitBase)?
            .build()?;
        let image = DynamicImage::new_rgb8(300, 200);
        let predictions = model.infer(&image, 3)?;
        assert_eq!(predictions.len(), 3);
        assert!(predictions.windows(2).all(|w| w[0].score() >= w[1].score()));
        Ok(())
    }
}
