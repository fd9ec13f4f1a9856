use std::fs;

use pictag::{BuiltinModel, ClassificationPipeline, ImageModel, ModelError, ModelManager};

fn scratch_manager(name: &str) -> Result<ModelManager, Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("pictag-it").join(name);
    let _ = fs::remove_dir_all(&dir);
    Ok(ModelManager::new(&dir)?)
}

#[test]
fn test_fresh_cache_is_empty() -> Result<(), Box<dyn std::error::Error>> {
    let manager = scratch_manager("fresh")?;
    assert!(manager.models_dir().exists());
    assert!(!manager.is_model_downloaded(BuiltinModel::VitBase));
    assert!(!manager.verify_model(BuiltinModel::VitBase)?);
    assert!(matches!(
        manager.require_downloaded(BuiltinModel::VitBase),
        Err(ModelError::NotDownloaded(name)) if name == "vit-base-patch16-224"
    ));
    Ok(())
}

#[test]
fn test_partial_download_is_not_downloaded() -> Result<(), Box<dyn std::error::Error>> {
    let manager = scratch_manager("partial")?;
    let model_path = manager.get_model_path(BuiltinModel::VitBase);
    fs::create_dir_all(model_path.parent().unwrap())?;
    fs::write(&model_path, b"not really onnx")?;

    assert!(!manager.is_model_downloaded(BuiltinModel::VitBase));
    manager.remove_download(BuiltinModel::VitBase)?;
    assert!(!model_path.exists());
    Ok(())
}

#[test]
fn test_remove_missing_download_is_ok() -> Result<(), Box<dyn std::error::Error>> {
    let manager = scratch_manager("remove-missing")?;
    manager.remove_download(BuiltinModel::VitBase)?;
    Ok(())
}

#[test]
fn test_model_info() {
    let info = BuiltinModel::VitBase.get_model_info();
    assert!(info.model_url.ends_with(".onnx"));
    assert!(info.labels_url.ends_with("config.json"));
    let characteristics = BuiltinModel::VitBase.characteristics();
    assert_eq!(characteristics.input_size, 224);
    assert!(characteristics.apply_softmax);
}

#[test]
#[ignore = "downloads the ViT model"]
fn test_model_download() -> Result<(), Box<dyn std::error::Error>> {
    let manager = scratch_manager("download")?;
    assert!(!manager.is_model_downloaded(BuiltinModel::VitBase));

    tokio_test::block_on(manager.download_model(BuiltinModel::VitBase))?;
    assert!(manager.is_model_downloaded(BuiltinModel::VitBase));
    assert!(manager.verify_model(BuiltinModel::VitBase)?);

    // second call finds valid files and does not redownload
    tokio_test::block_on(manager.ensure_model_downloaded(BuiltinModel::VitBase))?;
    Ok(())
}

#[tokio::test]
#[ignore = "downloads the ViT model"]
async fn test_classify_with_builtin_model() -> Result<(), Box<dyn std::error::Error>> {
    ModelManager::new_default()?.ensure_model_downloaded(BuiltinModel::VitBase).await?;
    let model = ImageModel::builder().with_model(BuiltinModel::VitBase)?.build()?;
    assert_eq!(model.info().num_labels, 1000);

    let pipeline = ClassificationPipeline::new(std::sync::Arc::new(model));
    let report = pipeline.classify(&image::DynamicImage::new_rgb8(300, 200), 5)?;
    assert_eq!(report.len(), 5);
    assert!(report.ranked().windows(2).all(|w| w[0].score() >= w[1].score()));
    Ok(())
}
