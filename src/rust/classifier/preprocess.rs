use std::collections::HashMap;

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::{Array1, Array4};
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use super::utils::softmax;
use crate::ModelCharacteristics;

/// Provides image scoring functionality using ONNX models.
///
/// This trait handles the conversion of an image into class scores through:
/// 1. Resizing to the model's square input size
/// 2. Scaling and per-channel normalisation into an NCHW tensor
/// 3. Running the ONNX model
/// 4. Post-processing of logits (softmax when the model emits raw logits)
///
/// The ONNX model is expected to:
/// - Accept one input of shape [batch_size, 3, input_size, input_size]
/// - Output scores of shape [batch_size, num_labels]
pub(crate) trait ImageScoring {
    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Returns the characteristics of the loaded model if available
    fn characteristics(&self) -> Option<&ModelCharacteristics>;

    /// Converts an image into a normalised `[1, 3, H, W]` tensor.
    ///
    /// # Errors
    /// - `ModelError` if the model characteristics are not set
    /// - `InvalidArgument` if the configured standard deviation has a zero channel
    fn to_input_tensor(&self, image: &DynamicImage) -> Result<Array4<f32>, ClassifierError> {
        let characteristics = self.characteristics()
            .ok_or_else(|| ClassifierError::ModelError("Model characteristics not set".into()))?;
        let size = characteristics.input_size;
        let ModelCharacteristics { mean, std, .. } = *characteristics;

        if std.iter().any(|s| *s == 0.0) {
            return Err(ClassifierError::InvalidArgument(
                "Normalisation std must be non-zero for every channel".into(),
            ));
        }

        let rgb = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
        let tensor = Array4::from_shape_fn((1, 3, size as usize, size as usize), |(_, c, y, x)| {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            (pixel[c] as f32 / 255.0 - mean[c]) / std[c]
        });
        Ok(tensor)
    }

    /// Runs the model on one image and returns one score per label.
    ///
    /// # Errors
    /// - `InferenceError` if the session is not initialized
    /// - `InferenceError` if tensor creation, model execution or output extraction fails
    /// - `InferenceError` if the output is not shaped `[1, n]`
    fn score_image(&self, image: &DynamicImage) -> Result<Array1<f32>, ClassifierError> {
        let session = self.session()
            .ok_or_else(|| ClassifierError::InferenceError("Session not initialized".into()))?;
        let apply_softmax = self.characteristics()
            .map(|c| c.apply_softmax)
            .unwrap_or(true);

        let input = self.to_input_tensor(image)?;
        let input_name = session.inputs.first()
            .map(|input| input.name.as_str())
            .ok_or_else(|| ClassifierError::InferenceError("Model has no inputs".into()))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert(input_name, Tensor::from_array(input)
            .map_err(|e| ClassifierError::InferenceError(format!("Failed to create input tensor: {}", e)))?);

        let outputs = session.run(input_tensors)
            .map_err(|e| ClassifierError::InferenceError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::InferenceError(format!("Failed to extract output tensor: {}", e)))?;

        let shape = output_tensor.shape();
        if shape.len() != 2 || shape[0] != 1 {
            return Err(ClassifierError::InferenceError(format!(
                "Expected output of shape [1, num_labels], got {:?}",
                shape
            )));
        }
        let logits = output_tensor.slice(ndarray::s![0, ..]);

        Ok(if apply_softmax {
            softmax(logits)
        } else {
            logits.to_owned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    struct Unloaded {
        characteristics: ModelCharacteristics,
    }

    impl ImageScoring for Unloaded {
        fn session(&self) -> Option<&Session> {
            None
        }

        fn characteristics(&self) -> Option<&ModelCharacteristics> {
            Some(&self.characteristics)
        }
    }

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(rgb)))
    }

    #[test]
    fn test_tensor_shape_and_normalisation() {
        let scorer = Unloaded {
            characteristics: ModelCharacteristics { input_size: 32, ..Default::default() },
        };
        let tensor = scorer.to_input_tensor(&solid(100, 50, [255, 0, 128])).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 32, 32]);

        // (1.0 - 0.5) / 0.5 = 1.0 and (0.0 - 0.5) / 0.5 = -1.0
        assert!((tensor[[0, 0, 10, 10]] - 1.0).abs() < 1e-2);
        assert!((tensor[[0, 1, 10, 10]] + 1.0).abs() < 1e-2);
        let expected_blue = (128.0 / 255.0 - 0.5) / 0.5;
        assert!((tensor[[0, 2, 31, 31]] - expected_blue).abs() < 1e-2);
    }

    #[test]
    fn test_imagenet_normalisation() {
        let scorer = Unloaded {
            characteristics: ModelCharacteristics {
                input_size: 8,
                mean: [0.485, 0.456, 0.406],
                std: [0.229, 0.224, 0.225],
                ..Default::default()
            },
        };
        let tensor = scorer.to_input_tensor(&solid(8, 8, [0, 0, 0])).unwrap();
        assert!((tensor[[0, 0, 0, 0]] - (-0.485 / 0.229)).abs() < 1e-5);
    }

    #[test]
    fn test_zero_std_rejected() {
        let scorer = Unloaded {
            characteristics: ModelCharacteristics { std: [0.5, 0.0, 0.5], ..Default::default() },
        };
        let result = scorer.to_input_tensor(&solid(4, 4, [1, 2, 3]));
        assert!(matches!(result, Err(ClassifierError::InvalidArgument(_))));
    }

    #[test]
    fn test_score_without_session() {
        let scorer = Unloaded {
            characteristics: ModelCharacteristics::default(),
        };
        let result = scorer.score_image(&solid(4, 4, [1, 2, 3]));
        assert!(matches!(result, Err(ClassifierError::InferenceError(_))));
    }
}
