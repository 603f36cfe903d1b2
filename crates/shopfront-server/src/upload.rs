//! Multipart uploads and the media store they land in.

use std::path::PathBuf;

use async_trait::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use shopfront_core::error::{ShopError, ShopResult};
use shopfront_core::models::media::{ImageRef, MediaKind};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiError;

pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_FILES: usize = 5;
/// Request body ceiling for upload routes.
pub const UPLOAD_BODY_LIMIT: usize = MAX_FILES * MAX_FILE_BYTES + 64 * 1024;

/// Multipart body whose rejections use the error envelope.
pub struct ApiMultipart(pub Multipart);

impl<S> FromRequest<S> for ApiMultipart
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        Ok(Self(multipart))
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/avif" => "avif",
            "image/svg+xml" => "svg",
            _ => "img",
        }
    }
}

/// Text fields and image files of a multipart request.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// Drain a multipart body, accepting at most `max_files` images under
    /// `file_field`, each at most [`MAX_FILE_BYTES`].
    pub async fn read(
        ApiMultipart(mut multipart): ApiMultipart,
        file_field: &str,
        max_files: usize,
    ) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if field.file_name().is_none() {
                let value = field.text().await?;
                form.fields.push((name, value));
                continue;
            }
            if field.file_name() == Some("") {
                // An empty file input.
                continue;
            }
            if name != file_field {
                return Err(ShopError::Upload(format!("Unexpected file field: {name}")).into());
            }
            let content_type = field.content_type().unwrap_or_default().to_string();
            if !content_type.starts_with("image/") {
                return Err(ShopError::Upload("Only image files are allowed".into()).into());
            }
            if form.files.len() == max_files {
                return Err(ShopError::Upload(format!("At most {max_files} files are allowed")).into());
            }

            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await? {
                if bytes.len() + chunk.len() > MAX_FILE_BYTES {
                    return Err(ShopError::Upload("File exceeds the 5 MB limit".into()).into());
                }
                bytes.extend_from_slice(&chunk);
            }
            form.files.push(UploadedFile {
                content_type,
                bytes,
            });
        }

        Ok(form)
    }

    /// First non-blank value of a text field, trimmed.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .iter()
            .find(|(n, v)| n == name && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    }

    /// Every value of a repeated field; comma-separated values are split.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(n, _)| n == name)
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.fields.iter().all(|(_, v)| v.trim().is_empty())
    }

    #[cfg(test)]
    pub(crate) fn with_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            files: Vec::new(),
        }
    }
}

/// Where uploaded media is kept.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(&self, folder: &str, file: UploadedFile) -> ShopResult<ImageRef>;

    /// Best-effort removal. Failures are logged, never returned.
    async fn remove(&self, public_ids: &[String]);
}

/// Store every file, removing the ones already written if any fails.
pub async fn store_all(
    store: &dyn MediaStore,
    folder: &str,
    files: Vec<UploadedFile>,
) -> ShopResult<Vec<ImageRef>> {
    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        match store.store(folder, file).await {
            Ok(image) => stored.push(image),
            Err(e) => {
                discard(store, &stored).await;
                return Err(e);
            }
        }
    }
    Ok(stored)
}

pub async fn discard(store: &dyn MediaStore, images: &[ImageRef]) {
    if images.is_empty() {
        return;
    }
    let ids: Vec<String> = images.iter().map(|i| i.public_id.clone()).collect();
    store.remove(&ids).await;
}

/// Files on local disk, served under `base_url`.
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_of(&self, public_id: &str) -> Option<PathBuf> {
        if public_id.is_empty()
            || public_id.starts_with('/')
            || public_id.split('/').any(|seg| seg == ".." || seg.is_empty())
        {
            return None;
        }
        Some(self.root.join(public_id))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, folder: &str, file: UploadedFile) -> ShopResult<ImageRef> {
        let public_id = format!("{folder}/{}.{}", Uuid::new_v4(), file.extension());
        let path = self
            .path_of(&public_id)
            .ok_or_else(|| ShopError::Internal(format!("invalid media folder: {folder}")))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ShopError::Internal(format!("media directory: {e}")))?;
        }
        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|e| ShopError::Internal(format!("media write: {e}")))?;

        debug!(public_id = %public_id, bytes = file.bytes.len(), "Media stored");
        Ok(ImageRef {
            url: format!("{}/{public_id}", self.base_url),
            public_id,
            kind: MediaKind::Image,
        })
    }

    async fn remove(&self, public_ids: &[String]) {
        for id in public_ids {
            let Some(path) = self.path_of(id) else {
                warn!(public_id = %id, "Refusing to remove media outside the store");
                continue;
            };
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(public_id = %id, error = %e, "Failed to remove media");
            }
        }
    }
}
