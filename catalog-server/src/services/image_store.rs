//! Image Store
//!
//! Product images live in a flat uploads directory under UUID file names and
//! are referenced from rows as `/uploads/<uuid>.<ext>`. The catalog service
//! only sees the [`ImageStore`] trait, so tests swap the disk for
//! [`MemoryImageStore`].

use async_trait::async_trait;
use dashmap::DashMap;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::utils::{AppError, ErrorCode};

/// Maximum image size (5MB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Accepted `Content-Type` values of the image part
pub const SUPPORTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Public URL prefix of stored images
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("Unsupported file format '{0}'. Supported: jpeg, jpg, png, webp")]
    UnsupportedFormat(String),

    #[error("Unsupported content type '{0}'. Supported: image/jpeg, image/png, image/webp")]
    UnsupportedContentType(String),

    #[error("File content is not a valid {0} image")]
    InvalidImage(String),

    #[error("File too large: {size} bytes (maximum {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("Empty file provided")]
    Empty,

    #[error("Not a managed image url: {0}")]
    InvalidUrl(String),

    #[error("Image storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ImageStoreError> for AppError {
    fn from(err: ImageStoreError) -> Self {
        let code = match &err {
            ImageStoreError::UnsupportedFormat(_)
            | ImageStoreError::UnsupportedContentType(_)
            | ImageStoreError::InvalidImage(_) => ErrorCode::UnsupportedFileFormat,
            ImageStoreError::TooLarge { .. } => ErrorCode::FileTooLarge,
            ImageStoreError::Empty => ErrorCode::EmptyFile,
            ImageStoreError::InvalidUrl(_) => ErrorCode::ValidationFailed,
            ImageStoreError::Io(_) => ErrorCode::FileStorageFailed,
        };
        AppError::with_message(code, err.to_string()).with_detail("field", "image")
    }
}

/// An uploaded image, checked before it reaches the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    extension: String,
    bytes: Vec<u8>,
}

impl ImageUpload {
    /// Validate an uploaded image part
    ///
    /// The extension, the declared content type and the payload's own
    /// signature must all name the same supported format, and the payload
    /// must decode as that format.
    pub fn new(
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Self, ImageStoreError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let format = format_for_extension(&extension)
            .ok_or_else(|| ImageStoreError::UnsupportedFormat(extension.clone()))?;

        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !SUPPORTED_MIME_TYPES.contains(&mime.as_str()) {
            return Err(ImageStoreError::UnsupportedContentType(mime));
        }

        if bytes.is_empty() {
            return Err(ImageStoreError::Empty);
        }
        if bytes.len() > MAX_IMAGE_SIZE {
            return Err(ImageStoreError::TooLarge {
                size: bytes.len(),
                max: MAX_IMAGE_SIZE,
            });
        }

        let detected = image::guess_format(&bytes).ok();
        if detected != Some(format)
            || image::load_from_memory_with_format(&bytes, format).is_err()
        {
            return Err(ImageStoreError::InvalidImage(extension));
        }

        Ok(Self { extension, bytes })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Fresh collision-free name keeping the original extension
    fn generate_file_name(&self) -> String {
        format!("{}.{}", Uuid::new_v4(), self.extension)
    }
}

/// Accepted extensions (jpeg, jpg, png, webp) and the format each must hold
fn format_for_extension(extension: &str) -> Option<ImageFormat> {
    match extension {
        "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
        "png" => Some(ImageFormat::Png),
        "webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

/// Encoded 2x2 image, for tests that need a payload that passes [`ImageUpload::new`]
#[cfg(test)]
pub(crate) fn sample_image(format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::new_rgb8(2, 2)
        .write_to(&mut std::io::Cursor::new(&mut bytes), format)
        .expect("encode sample image");
    bytes
}

/// File name part of a managed image url
///
/// Rejects anything that is not a single path segment under `/uploads/`.
pub fn file_name_from_url(url: &str) -> Result<&str, ImageStoreError> {
    let name = url
        .strip_prefix(UPLOADS_URL_PREFIX)
        .ok_or_else(|| ImageStoreError::InvalidUrl(url.to_string()))?;
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(ImageStoreError::InvalidUrl(url.to_string()));
    }
    Ok(name)
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the image, returning its relative url
    async fn put(&self, upload: ImageUpload) -> Result<String, ImageStoreError>;

    /// Remove the image behind `url`; `Ok(false)` when it was already gone
    async fn delete(&self, url: &str) -> Result<bool, ImageStoreError>;
}

/// Images on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
}

impl LocalImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, url: &str) -> Result<PathBuf, ImageStoreError> {
        Ok(self.dir.join(file_name_from_url(url)?))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, upload: ImageUpload) -> Result<String, ImageStoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = upload.generate_file_name();
        let path = self.dir.join(&file_name);

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&upload.bytes).await?;
        file.sync_all().await?;

        tracing::debug!(file = %file_name, size = upload.len(), "Image stored");
        Ok(format!("{UPLOADS_URL_PREFIX}{file_name}"))
    }

    async fn delete(&self, url: &str) -> Result<bool, ImageStoreError> {
        let path = self.path_for(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(file = %path.display(), "Image deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Images kept in memory, keyed by url
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    files: DashMap<String, Vec<u8>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.files.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, upload: ImageUpload) -> Result<String, ImageStoreError> {
        let url = format!("{UPLOADS_URL_PREFIX}{}", upload.generate_file_name());
        self.files.insert(url.clone(), upload.bytes);
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<bool, ImageStoreError> {
        file_name_from_url(url)?;
        Ok(self.files.remove(url).is_some())
    }
}
