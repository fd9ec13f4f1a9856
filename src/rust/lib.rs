//! Image classification reports with emoji category tags.
//!
//! An [`InferenceEngine`] scores an image and returns ranked `(label, score)`
//! pairs. A [`ClassificationPipeline`] turns that output into a
//! [`ClassificationReport`] whose results carry a [`CategoryTag`] (with a display
//! glyph) derived from the label by [`tagger::tag`]. A [`BatchRunner`] does the
//! same for many images, keeping per-image failures in their slot instead of
//! failing the batch.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use pictag::{BuiltinModel, ClassificationPipeline, ImageModel};
//! use std::sync::Arc;
//!
//! let model = ImageModel::builder()
//!     .with_model(BuiltinModel::VitBase)?
//!     .build()?;
//! let pipeline = ClassificationPipeline::new(Arc::new(model));
//!
//! let image = image::open("puppy.jpg")?;
//! let report = pipeline.classify(&image, 5)?;
//! let top = report.top_result();
//! println!("{} {} ({:.2}%)", top.glyph(), top.label(), top.score() * 100.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Batches
//!
//! The engine is loaded once and shared by `Arc`; workers only read it.
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use pictag::{BatchConfig, BatchRunner, BuiltinModel, ClassificationPipeline, ImageCrateDecoder, ImageModel};
//! use std::sync::Arc;
//!
//! let model = Arc::new(ImageModel::builder().with_model(BuiltinModel::VitBase)?.build()?);
//! let runner = BatchRunner::with_config(
//!     ClassificationPipeline::new(model),
//!     BatchConfig { workers: 4 },
//! )?;
//!
//! let files = vec![std::fs::read("a.jpg")?, std::fs::read("b.png")?];
//! for entry in runner.run_encoded_batch(&ImageCrateDecoder, &files, 5)? {
//!     match entry.report() {
//!         Some(report) => println!("#{}: {}", report.source_index(), report.top_result().label()),
//!         None => println!("#{} failed", entry.source_index()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod classifier;
pub mod model_manager;
pub mod models;
pub mod render;
pub mod report;
mod runtime;
pub mod tagger;

pub use batch::{BatchConfig, BatchEntry, BatchRunner};
pub use classifier::{
    ClassificationPipeline, ClassifierError, ImageCrateDecoder, ImageDecoder, ImageModel, ImageModelBuilder,
    ImageModelInfo, InferenceEngine, PipelineConfig, RankingPolicy, DEFAULT_TOP_K,
};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use report::{ClassificationReport, Prediction, RankedResult};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use tagger::CategoryTag;

pub fn init_logger() {
    env_logger::init();
}
