use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use log::info;

use pictag::render::render_entry;
use pictag::{
    BatchConfig, BatchRunner, BuiltinModel, ClassificationPipeline, ImageCrateDecoder, ImageModel, InferenceEngine,
    ModelManager, PipelineConfig, DEFAULT_TOP_K,
};

#[derive(Parser)]
#[command(author, version, about = "Classify images and show the top predictions with emoji tags", long_about = None)]
struct Args {
    /// Image files to classify (PNG or JPEG)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Number of predictions to show per image
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Number of images classified concurrently
    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    /// Force a fresh download of the built-in model files
    #[arg(short, long)]
    fresh: bool,

    /// Custom ONNX model to use instead of the built-in ViT
    #[arg(long, requires = "labels")]
    model: Option<PathBuf>,

    /// Label table for the custom model (config.json with id2label, or one label per line)
    #[arg(long, requires = "model")]
    labels: Option<PathBuf>,

    /// Square input size of the custom model
    #[arg(long)]
    input_size: Option<u32>,

    /// Print reports as JSON instead of text
    #[arg(long)]
    json: bool,
}

async fn ensure_model_downloaded(fresh: bool) -> anyhow::Result<()> {
    let manager = ModelManager::new_default()?;
    let model = BuiltinModel::VitBase;

    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(model)?;
    }

    manager.ensure_model_downloaded(model).await?;
    Ok(())
}

async fn load_engine(args: &Args) -> anyhow::Result<ImageModel> {
    let builder = ImageModel::builder();
    let builder = match (&args.model, &args.labels) {
        (Some(model), Some(labels)) => builder.with_custom_model(
            &model.to_string_lossy(),
            &labels.to_string_lossy(),
            args.input_size,
        )?,
        _ => {
            ensure_model_downloaded(args.fresh).await?;
            builder.with_model(BuiltinModel::VitBase)?
        }
    };
    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pictag::init_logger();
    let args = Args::parse();

    if args.top_k == 0 {
        bail!("--top-k must be at least 1");
    }

    info!("=== Loading image model ===");
    let start_time = Instant::now();
    let engine: Arc<dyn InferenceEngine> = Arc::new(load_engine(&args).await.context("failed to load model")?);
    let load_time = start_time.elapsed();
    info!("Model loaded in {:.2?}", load_time);

    let pipeline = ClassificationPipeline::with_config(
        engine,
        PipelineConfig { top_k: args.top_k, ..PipelineConfig::default() },
    );
    let runner = BatchRunner::with_config(pipeline, BatchConfig { workers: args.workers })?;

    let classify_start = Instant::now();
    let entries = runner.run_files(&ImageCrateDecoder, &args.images, args.top_k)?;
    let classify_time = classify_start.elapsed();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (entry, path) in entries.iter().zip(&args.images) {
            println!("{}", path.display());
            println!("{}", render_entry(entry));
        }
    }

    let failed = entries.iter().filter(|e| !e.is_classified()).count();
    info!("=== Done ===");
    info!("Load time: {:.2?}", load_time);
    info!("Classification time: {:.2?} for {} images ({} failed)", classify_time, entries.len(), failed);

    Ok(())
}
