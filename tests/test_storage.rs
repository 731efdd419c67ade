mod common;

use common::*;
use image::ImageFormat;
use stonecrack::UploadStore;
use stonecrack::models::same_pixels;

#[tokio::test]
async fn stored_image_loads_back() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store = UploadStore::open(dir.path().join("uploads")).await?;
    let session = SessionId::new();
    let image = gradient_image(40, 30);

    let stored = store.store(session, &image, ImageFormat::Png).await?;
    assert_eq!(stored.session, session);
    assert!(stored.file_name.ends_with(".png"));
    assert!(store.path_of(&stored).exists());
    assert!(!stored.is_result());

    let loaded = store.load(&stored).await?;
    assert!(same_pixels(&loaded, &image));
    Ok(())
}

#[tokio::test]
async fn uploads_get_unique_names() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store = UploadStore::open(dir.path()).await?;
    let session = SessionId::new();
    let image = uniform_image(8, 8, 1);

    let a = store.store(session, &image, ImageFormat::Png).await?;
    let b = store.store(session, &image, ImageFormat::Png).await?;
    assert_ne!(a.file_name, b.file_name);
    Ok(())
}

#[tokio::test]
async fn raw_upload_is_kept_verbatim() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store = UploadStore::open(dir.path()).await?;
    let bytes = encode_png(&uniform_image(16, 16, 200));

    let stored = store.store_bytes(SessionId::new(), &bytes).await?;
    assert!(stored.file_name.ends_with(".png"));
    assert_eq!(store.read_bytes(&stored).await?, bytes);
    Ok(())
}

#[tokio::test]
async fn unknown_upload_format_is_refused() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store = UploadStore::open(dir.path()).await?;

    assert!(store.store_bytes(SessionId::new(), b"plain text").await.is_err());
    Ok(())
}

#[tokio::test]
async fn result_is_stored_next_to_upload() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store = UploadStore::open(dir.path()).await?;
    let detector = seeded_detector();
    let session = SessionId::new();
    let input = uniform_image(48, 32, 120);

    let upload = store.store(session, &input, ImageFormat::Png).await?;
    let result = detector.analyze(store.load(&upload).await?, session)?;
    let stored = store.store_result(&upload, &result.annotated_image).await?;

    assert_eq!(stored.file_name, format!("result_{}", upload.file_name));
    assert!(stored.is_result());
    assert_eq!(stored.session, session);
    let reloaded = store.load(&stored).await?;
    assert!(same_pixels(&reloaded, &result.annotated_image));
    Ok(())
}
