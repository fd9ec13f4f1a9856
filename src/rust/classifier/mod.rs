mod error;
mod engine;
mod preprocess;
mod model;
pub mod builder;
pub mod pipeline;
mod utils;

pub use error::ClassifierError;
pub use engine::{ImageCrateDecoder, ImageDecoder, InferenceEngine};
pub use model::ImageModel;
pub use builder::ImageModelBuilder;
pub use pipeline::{ClassificationPipeline, PipelineConfig, RankingPolicy, DEFAULT_TOP_K};

pub(crate) use pipeline::validate_top_k;

/// Information about a loaded image model
#[derive(Debug, Clone, PartialEq)]
pub struct ImageModelInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the label table
    pub labels_path: String,
    /// Number of classes the model scores
    pub num_labels: usize,
    /// Side length of the square model input
    pub input_size: u32,
}
