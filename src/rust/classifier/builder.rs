use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use log::{error, info};
use ort::session::Session;

use super::error::ClassifierError;
use super::model::ImageModel;
use super::preprocess::ImageScoring;
use super::utils::load_labels;
use crate::{
    runtime::{create_session_builder, RuntimeConfig},
    BuiltinModel, ModelCharacteristics, ModelManager,
};

/// A builder for constructing an ImageModel with a fluent interface.
#[derive(Default, Debug)]
pub struct ImageModelBuilder {
    model_path: Option<String>,
    labels_path: Option<String>,
    session: Option<Session>,
    labels: Option<Vec<String>>,
    model_characteristics: Option<ModelCharacteristics>,
    runtime_config: RuntimeConfig,
}

impl ImageScoring for ImageModelBuilder {
    /// Returns a reference to the ONNX session if it exists
    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn characteristics(&self) -> Option<&ModelCharacteristics> {
        self.model_characteristics.as_ref()
    }
}

impl ImageModelBuilder {
    /// Creates a new empty ImageModelBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use pictag::ImageModelBuilder;
    ///
    /// let builder = ImageModelBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    ///
    /// # Example
    /// ```
    /// use pictag::{ImageModelBuilder, RuntimeConfig};
    ///
    /// let config = RuntimeConfig { intra_threads: 2, ..RuntimeConfig::default() };
    /// let builder = ImageModelBuilder::new()
    ///     .with_runtime_config(config);
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads a built-in model from the local model cache.
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The model paths are already set
    ///   - The model is not downloaded
    ///   - The model or label table failed to load
    ///   - The model structure is invalid
    pub fn with_model(mut self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() || self.labels_path.is_some() {
            return Err(ClassifierError::BuildError("Model and labels paths already set".to_string()));
        }

        let manager = ModelManager::new_default()
            .map_err(|e| ClassifierError::BuildError(format!("Failed to create model manager: {}", e)))?;

        manager.require_downloaded(model).map_err(|e| {
            ClassifierError::BuildError(format!(
                "{}. Please download it first using ModelManager::download_model()",
                e
            ))
        })?;

        let model_path = manager.get_model_path(model);
        let labels_path = manager.get_labels_path(model);

        self.load(&model_path, &labels_path, model.characteristics())
    }

    /// Sets a custom ONNX model and label table for the classifier
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `labels_path` - Path to a `config.json` with `id2label`, or a text file with one label per line
    /// * `input_size` - Square input size expected by the model; defaults to 224
    ///
    /// The model is assumed to emit logits and to use mean/std 0.5 normalisation;
    /// adjust with [`with_characteristics`](Self::with_characteristics) otherwise.
    ///
    /// # Example
    /// ```no_run
    /// use pictag::ImageModelBuilder;
    ///
    /// let builder = ImageModelBuilder::new()
    ///     .with_custom_model("path/to/model.onnx", "path/to/labels.txt", Some(256));
    /// ```
    pub fn with_custom_model(
        self,
        model_path: &str,
        labels_path: &str,
        input_size: Option<u32>,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || labels_path.is_empty() {
            return Err(ClassifierError::BuildError("Model and labels paths cannot be empty".to_string()));
        }
        if self.model_path.is_some() || self.labels_path.is_some() {
            return Err(ClassifierError::BuildError("Model and labels paths already set".to_string()));
        }
        if !Path::new(model_path).exists() {
            return Err(ClassifierError::BuildError(format!("Model file not found: {}", model_path)));
        }
        if !Path::new(labels_path).exists() {
            return Err(ClassifierError::BuildError(format!("Labels file not found: {}", labels_path)));
        }

        let characteristics = ModelCharacteristics {
            input_size: input_size.unwrap_or(224),
            ..ModelCharacteristics::default()
        };
        self.load(Path::new(model_path), Path::new(labels_path), characteristics)
    }

    /// Overrides the preprocessing characteristics of an already loaded model.
    ///
    /// `num_labels` is always taken from the label table.
    pub fn with_characteristics(mut self, characteristics: ModelCharacteristics) -> Result<Self, ClassifierError> {
        let current = self.model_characteristics.as_ref()
            .ok_or_else(|| ClassifierError::BuildError("Load a model before overriding its characteristics".into()))?;
        if characteristics.input_size == 0 {
            return Err(ClassifierError::InvalidArgument("Input size must be at least 1 pixel".into()));
        }
        self.model_characteristics = Some(ModelCharacteristics {
            num_labels: current.num_labels,
            ..characteristics
        });
        Ok(self)
    }

    fn load(
        mut self,
        model_path: &Path,
        labels_path: &Path,
        characteristics: ModelCharacteristics,
    ) -> Result<Self, ClassifierError> {
        let labels = load_labels(labels_path).map_err(|e| {
            error!("Failed to load labels: {}", e);
            e
        })?;
        info!("Loaded {} labels from {:?}", labels.len(), labels_path);

        // Create session using the singleton environment
        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_characteristics = Some(ModelCharacteristics {
            num_labels: labels.len(),
            ..characteristics
        });
        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.labels_path = Some(labels_path.to_string_lossy().to_string());
        self.session = Some(session);
        self.labels = Some(labels);
        Ok(self)
    }

    /// Builds and returns the final ImageModel instance
    ///
    /// # Returns
    /// * `Result<ImageModel, ClassifierError>` - The constructed model if successful, or an error if:
    ///   - No model has been loaded
    ///   - A probe forward pass fails
    ///   - The model's output width does not match the label count
    pub fn build(mut self) -> Result<ImageModel, ClassifierError> {
        let (Some(model_path), Some(labels_path)) = (self.model_path.take(), self.labels_path.take()) else {
            return Err(ClassifierError::BuildError("Model and labels paths must be set".to_string()));
        };
        let model_characteristics = self.model_characteristics
            .clone()
            .ok_or_else(|| ClassifierError::BuildError("Model characteristics not set".to_string()))?;
        let labels = self.labels.take()
            .ok_or_else(|| ClassifierError::BuildError("No labels loaded".into()))?;

        // Probe with a blank image so a label/model mismatch fails here instead of per image
        let size = model_characteristics.input_size;
        let probe = self.score_image(&DynamicImage::new_rgb8(size, size))?;
        if probe.len() != labels.len() {
            return Err(ClassifierError::ModelError(format!(
                "Model outputs {} scores but the label table has {} entries",
                probe.len(),
                labels.len()
            )));
        }

        let session = Arc::new(self.session.take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?);

        Ok(ImageModel {
            model_path,
            labels_path,
            session,
            labels: Arc::new(labels),
            model_characteristics,
        })
    }

    /// Validates that the model has at least one input and one output tensor
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        if session.inputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have an input for pixel values".to_string()
            ));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for class scores".to_string()
            ));
        }
        Ok(())
    }
}
