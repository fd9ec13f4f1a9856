use ort::Error as OrtError;

/// Represents the different types of errors that can occur while classifying images.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The input bytes could not be decoded into a raster image
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    /// The inference engine returned no candidates for an image
    #[error("Inference returned no predictions")]
    EmptyPredictionSet,
    /// The inference engine failed or returned malformed output
    #[error("Inference error: {0}")]
    InferenceError(String),
    /// A call was made with arguments that violate its contract
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Error occurred while loading or running the ONNX model
    #[error("Model error: {0}")]
    ModelError(String),
    /// Error occurred during the build phase
    #[error("Build error: {0}")]
    BuildError(String),
    /// Error occurred while validating model metadata such as the label table
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::BuildError(err.to_string())
    }
}

impl From<image::ImageError> for ClassifierError {
    fn from(err: image::ImageError) -> Self {
        ClassifierError::InvalidImage(err.to_string())
    }
}
