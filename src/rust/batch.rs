//! Best-effort classification of image batches.
//!
//! A batch never fails because one image did: every input gets a slot in the
//! output, either a report or the error that image hit. Slots are always in
//! input order, whatever order the workers finish in.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use log::{info, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Serialize, Serializer};

use crate::classifier::{validate_top_k, ClassificationPipeline, ClassifierError, ImageDecoder};
use crate::report::ClassificationReport;

/// Outcome for one position of a batch.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchEntry {
    Classified(ClassificationReport),
    Failed {
        /// 1-based position in the batch
        source_index: usize,
        #[serde(serialize_with = "error_message")]
        error: ClassifierError,
    },
}

fn error_message<S: Serializer>(error: &ClassifierError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

impl BatchEntry {
    pub fn source_index(&self) -> usize {
        match self {
            Self::Classified(report) => report.source_index(),
            Self::Failed { source_index, .. } => *source_index,
        }
    }

    pub fn report(&self) -> Option<&ClassificationReport> {
        match self {
            Self::Classified(report) => Some(report),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ClassifierError> {
        match self {
            Self::Classified(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_classified(&self) -> bool {
        matches!(self, Self::Classified(_))
    }

    fn from_result(result: Result<ClassificationReport, ClassifierError>, source_index: usize) -> Self {
        match result {
            Ok(report) => Self::Classified(report),
            Err(error) => {
                warn!("Image {} failed: {}", source_index, error);
                Self::Failed { source_index, error }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Upper bound on concurrent classifications. 1 runs on the calling thread.
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// Runs a [`ClassificationPipeline`] over a sequence of images.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    pipeline: ClassificationPipeline,
    config: BatchConfig,
    pool: Option<Arc<ThreadPool>>,
}

impl BatchRunner {
    pub fn new(pipeline: ClassificationPipeline) -> Self {
        Self {
            pipeline,
            config: BatchConfig::default(),
            pool: None,
        }
    }

    pub fn with_config(pipeline: ClassificationPipeline, config: BatchConfig) -> Result<Self, ClassifierError> {
        if config.workers == 0 {
            return Err(ClassifierError::InvalidArgument("workers must be at least 1".into()));
        }
        let pool = if config.workers > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .thread_name(|i| format!("pictag-worker-{}", i))
                .build()
                .map_err(|e| ClassifierError::BuildError(format!("Failed to start worker pool: {}", e)))?;
            Some(Arc::new(pool))
        } else {
            None
        };
        Ok(Self { pipeline, config, pool })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &ClassificationPipeline {
        &self.pipeline
    }

    /// Classifies already decoded images.
    ///
    /// Returns one entry per image, index-aligned with `images`. An empty input
    /// yields an empty output.
    ///
    /// # Errors
    /// - `InvalidArgument` if `top_k` is zero. Per-image failures never fail the call.
    pub fn run_batch(&self, images: &[DynamicImage], top_k: usize) -> Result<Vec<BatchEntry>, ClassifierError> {
        validate_top_k(top_k)?;
        Ok(self.dispatch(images, |image, source_index| {
            self.pipeline.classify_indexed(image, top_k, source_index)
        }))
    }

    /// Decodes and classifies encoded images. Decode failures occupy their slot
    /// as [`ClassifierError::InvalidImage`].
    pub fn run_encoded_batch<B>(
        &self,
        decoder: &dyn ImageDecoder,
        inputs: &[B],
        top_k: usize,
    ) -> Result<Vec<BatchEntry>, ClassifierError>
    where
        B: AsRef<[u8]> + Sync,
    {
        validate_top_k(top_k)?;
        Ok(self.dispatch(inputs, |bytes, source_index| {
            let image = decoder.decode(bytes.as_ref())?;
            self.pipeline.classify_indexed(&image, top_k, source_index)
        }))
    }

    /// Reads, decodes and classifies image files. A file that cannot be read
    /// fails its slot with [`ClassifierError::InvalidImage`] naming the path and
    /// the IO error.
    pub fn run_files<P>(
        &self,
        decoder: &dyn ImageDecoder,
        paths: &[P],
        top_k: usize,
    ) -> Result<Vec<BatchEntry>, ClassifierError>
    where
        P: AsRef<Path> + Sync,
    {
        validate_top_k(top_k)?;
        Ok(self.dispatch(paths, |path, source_index| {
            let path: &Path = path.as_ref();
            let bytes = fs::read(path).map_err(|e| {
                ClassifierError::InvalidImage(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let image = decoder.decode(&bytes)?;
            self.pipeline.classify_indexed(&image, top_k, source_index)
        }))
    }

    fn dispatch<T, F>(&self, items: &[T], work: F) -> Vec<BatchEntry>
    where
        T: Sync,
        F: Fn(&T, usize) -> Result<ClassificationReport, ClassifierError> + Sync,
    {
        if items.is_empty() {
            return Vec::new();
        }

        let classify = |(i, item): (usize, &T)| BatchEntry::from_result(work(item, i + 1), i + 1);

        match &self.pool {
            Some(pool) if items.len() > 1 => {
                info!("Classifying {} images on {} worker(s)", items.len(), pool.current_num_threads());
                // indexed collect keeps input order
                pool.install(|| items.par_iter().enumerate().map(classify).collect())
            }
            _ => {
                info!("Classifying {} images on the calling thread", items.len());
                items.iter().enumerate().map(classify).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::InferenceEngine;
    use crate::report::Prediction;

    /// Returns one prediction whose label is the image width, so outputs can be
    /// matched back to inputs.
    struct WidthEcho;

    impl InferenceEngine for WidthEcho {
        fn infer(&self, image: &DynamicImage, _: usize) -> Result<Vec<Prediction>, ClassifierError> {
            if image.width() == 13 {
                return Err(ClassifierError::InferenceError("unlucky width".into()));
            }
            Ok(vec![Prediction::new(image.width().to_string(), 0.5)])
        }
    }

    fn runner(workers: usize) -> BatchRunner {
        let pipeline = ClassificationPipeline::new(Arc::new(WidthEcho));
        BatchRunner::with_config(pipeline, BatchConfig { workers }).unwrap()
    }

    fn images(widths: &[u32]) -> Vec<DynamicImage> {
        widths.iter().map(|w| DynamicImage::new_rgb8(*w, 1)).collect()
    }

    #[test]
    fn test_empty_batch() {
        assert!(runner(1).run_batch(&[], 5).unwrap().is_empty());
        assert!(runner(4).run_batch(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn test_zero_top_k_fails_call() {
        let result = runner(1).run_batch(&images(&[1]), 0);
        assert!(matches!(result, Err(ClassifierError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let pipeline = ClassificationPipeline::new(Arc::new(WidthEcho));
        let result = BatchRunner::with_config(pipeline, BatchConfig { workers: 0 });
        assert!(matches!(result, Err(ClassifierError::InvalidArgument(_))));
    }

    #[test]
    fn test_order_preserved_with_workers() {
        let widths: Vec<u32> = (1..=40).filter(|w| *w != 13).collect();
        for workers in [1, 3, 8] {
            let entries = runner(workers).run_batch(&images(&widths), 5).unwrap();
            assert_eq!(entries.len(), widths.len());
            for (i, (entry, width)) in entries.iter().zip(&widths).enumerate() {
                assert_eq!(entry.source_index(), i + 1);
                assert_eq!(entry.report().unwrap().top_result().label(), width.to_string());
            }
        }
    }

    /// Records the name of the thread each image is classified on.
    struct ThreadRecorder {
        seen: std::sync::Mutex<Vec<String>>,
    }

    impl InferenceEngine for ThreadRecorder {
        fn infer(&self, _: &DynamicImage, _: usize) -> Result<Vec<Prediction>, ClassifierError> {
            let name = std::thread::current().name().unwrap_or_default().to_string();
            self.seen.lock().unwrap().push(name);
            Ok(vec![Prediction::new("owl", 0.5)])
        }
    }

    #[test]
    fn test_workers_run_on_dedicated_pool() {
        let engine = Arc::new(ThreadRecorder { seen: std::sync::Mutex::new(Vec::new()) });
        let runner = BatchRunner::with_config(
            ClassificationPipeline::new(engine.clone()),
            BatchConfig { workers: 3 },
        )
        .unwrap();
        assert_eq!(runner.config().workers, 3);

        let entries = runner.run_batch(&images(&[1, 2, 3, 4, 5, 6]), 1).unwrap();
        assert_eq!(entries.len(), 6);
        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen.len(), 6);
        assert!(seen.iter().all(|name| name.starts_with("pictag-worker-")));
    }

    #[test]
    fn test_single_worker_uses_calling_thread() {
        let engine = Arc::new(ThreadRecorder { seen: std::sync::Mutex::new(Vec::new()) });
        let runner = BatchRunner::new(ClassificationPipeline::new(engine.clone()));
        runner.run_batch(&images(&[1, 2]), 1).unwrap();
        let caller = std::thread::current().name().unwrap_or_default().to_string();
        assert!(engine.seen.lock().unwrap().iter().all(|name| *name == caller));
    }

    #[test]
    fn test_failure_captured_in_slot() {
        let entries = runner(2).run_batch(&images(&[5, 13, 7]), 5).unwrap();
        assert!(entries[0].is_classified());
        assert!(matches!(entries[1].error(), Some(ClassifierError::InferenceError(_))));
        assert_eq!(entries[1].source_index(), 2);
        assert!(entries[2].is_classified());
    }

    #[test]
    fn test_failed_entry_serialization() {
        let entry = BatchEntry::Failed {
            source_index: 4,
            error: ClassifierError::EmptyPredictionSet,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["source_index"], 4);
        assert_eq!(json["error"], "Inference returned no predictions");
    }
}
