//! Directory-backed upload store.
//!
//! Sits outside the detection core: the caller stores an upload, hands the
//! decoded image to [`CrackDetector`](crate::detection::CrackDetector) and
//! stores the annotated result next to it as `result_<name>`.

use anyhow::Context;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tracing::debug;
use uuid::Uuid;

use crate::detection::{decode_image, encode_image};
use crate::session::SessionId;

const RESULT_PREFIX: &str = "result_";

/// Reference to a stored image, relative to the store root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredImage {
    pub session: SessionId,
    pub file_name: String,
}

impl StoredImage {
    pub fn is_result(&self) -> bool {
        self.file_name.starts_with(RESULT_PREFIX)
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Open the store, creating the directory if needed.
    pub async fn open<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        async_fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create upload directory {:?}", root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, stored: &StoredImage) -> PathBuf {
        self.root.join(&stored.file_name)
    }

    /// Encode `image` as `format` under a fresh unique name.
    pub async fn store(
        &self,
        session: SessionId,
        image: &DynamicImage,
        format: ImageFormat,
    ) -> anyhow::Result<StoredImage> {
        let bytes = encode_image(image, format)?;
        self.write_new(session, &bytes, format).await
    }

    /// Keep an upload as received. Its format is sniffed from the bytes.
    pub async fn store_bytes(&self, session: SessionId, bytes: &[u8]) -> anyhow::Result<StoredImage> {
        let format = image::guess_format(bytes).context("Unrecognized upload format")?;
        self.write_new(session, bytes, format).await
    }

    /// Store the annotated image of `source` as `result_<source name>`, same format.
    pub async fn store_result(
        &self,
        source: &StoredImage,
        annotated: &DynamicImage,
    ) -> anyhow::Result<StoredImage> {
        let file_name = format!("{RESULT_PREFIX}{}", source.file_name);
        let path = self.root.join(&file_name);
        let format = ImageFormat::from_path(&path)
            .with_context(|| format!("Unknown image format for {:?}", path))?;

        let bytes = encode_image(annotated, format)?;
        async_fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write result image {:?}", path))?;
        debug!(session = %source.session, file = %file_name, "stored result image");

        Ok(StoredImage {
            session: source.session,
            file_name,
        })
    }

    pub async fn read_bytes(&self, stored: &StoredImage) -> anyhow::Result<Vec<u8>> {
        let path = self.path_of(stored);
        async_fs::read(&path)
            .await
            .with_context(|| format!("Failed to read stored image {:?}", path))
    }

    pub async fn load(&self, stored: &StoredImage) -> anyhow::Result<DynamicImage> {
        let bytes = self.read_bytes(stored).await?;
        let image = decode_image(&bytes)
            .with_context(|| format!("Failed to decode stored image {}", stored.file_name))?;
        Ok(image)
    }

    async fn write_new(
        &self,
        session: SessionId,
        bytes: &[u8],
        format: ImageFormat,
    ) -> anyhow::Result<StoredImage> {
        let extension = format
            .extensions_str()
            .first()
            .with_context(|| format!("No file extension for {:?}", format))?;
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.root.join(&file_name);

        async_fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write upload {:?}", path))?;
        debug!(%session, file = %file_name, "stored upload");

        Ok(StoredImage { session, file_name })
    }
}
