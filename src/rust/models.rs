/// Represents the available built-in models in the library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// Vision Transformer (ViT-B/16) fine-tuned on ImageNet-1k
    ///
    /// Characteristics:
    /// - Input: 224x224 RGB, normalised with mean 0.5 / std 0.5
    /// - Output: 1000 ImageNet logits
    /// - Size: ~346MB
    VitBase,
}

/// Characteristics of a model including its input format and output size
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCharacteristics {
    /// Side length of the square input image in pixels
    pub input_size: u32,
    /// Number of classes in the output layer
    pub num_labels: usize,
    /// Per-channel mean applied after scaling pixels to [0, 1]
    pub mean: [f32; 3],
    /// Per-channel standard deviation applied after mean subtraction
    pub std: [f32; 3],
    /// Whether the model emits logits that need a softmax
    pub apply_softmax: bool,
    /// Approximate size of the model in memory
    pub model_size_mb: usize,
}

impl Default for ModelCharacteristics {
    fn default() -> Self {
        Self {
            input_size: 224,
            num_labels: 0,
            mean: [0.5; 3],
            std: [0.5; 3],
            apply_softmax: true,
            model_size_mb: 0,
        }
    }
}

/// Where to fetch a model's files and how to verify them
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub labels_url: String,
    /// SHA-256 of the model file; `None` means only presence is checked
    pub model_hash: Option<String>,
    /// SHA-256 of the labels file; `None` means only presence is checked
    pub labels_hash: Option<String>,
}

impl BuiltinModel {
    /// Get the characteristics of the model
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::VitBase => ModelCharacteristics {
                input_size: 224,
                num_labels: 1000,
                mean: [0.5; 3],
                std: [0.5; 3],
                apply_softmax: true,
                model_size_mb: 346,
            },
        }
    }

    /// Get the download locations of the model and its label table
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            Self::VitBase => ModelInfo {
                name: "vit-base-patch16-224".to_string(),
                model_url: "https://huggingface.co/Xenova/vit-base-patch16-224/resolve/main/onnx/model.onnx"
                    .to_string(),
                labels_url: "https://huggingface.co/google/vit-base-patch16-224/resolve/main/config.json"
                    .to_string(),
                model_hash: None,
                labels_hash: None,
            },
        }
    }
}
