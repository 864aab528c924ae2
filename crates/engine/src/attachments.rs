//! Receipt attachments.
//!
//! Uploads are validated here and handed to a [`BlobStore`]. Images are
//! compressed by the client before upload (JPEG, at most 1200px on the long
//! side, around 300 KiB); the server only enforces the limits.

use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::Utc;
use uuid::Uuid;

use crate::{Attachment, EngineError, ResultEngine};

/// Content types accepted for receipts.
pub const ACCEPTED_CONTENT_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "application/pdf"];

/// Largest file accepted before compression (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Size the client aims for when compressing images.
pub const COMPRESSION_TARGET_BYTES: usize = 300 * 1024;

/// Longest image side after client-side compression.
pub const MAX_IMAGE_DIMENSION: u32 = 1200;

/// Hard ceiling for a compressed image (900 KiB).
pub const MAX_COMPRESSED_IMAGE_BYTES: usize = 900 * 1024;

/// A file sent along with an expense form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl AttachmentUpload {
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Checks type and size limits.
    pub fn validate(&self) -> ResultEngine<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::Validation(
                "attachment name must not be empty".to_string(),
            ));
        }
        if !ACCEPTED_CONTENT_TYPES.contains(&self.content_type.as_str()) {
            return Err(EngineError::Validation(
                "please upload a valid image (JPG, PNG, WEBP) or PDF file".to_string(),
            ));
        }
        if self.data.is_empty() {
            return Err(EngineError::Validation("attachment is empty".to_string()));
        }
        if self.data.len() > MAX_UPLOAD_BYTES {
            return Err(EngineError::Validation(
                "file size must be less than 5MB".to_string(),
            ));
        }
        if self.is_image() && self.data.len() > MAX_COMPRESSED_IMAGE_BYTES {
            return Err(EngineError::Validation(format!(
                "compressed image still too large: {}KB",
                self.data.len() / 1024
            )));
        }
        Ok(())
    }

    fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "application/pdf" => "pdf",
            _ => "bin",
        }
    }
}

/// Object storage for receipts.
///
/// `upload` returns the public URL together with the original file name and
/// content type. `delete` takes a URL previously returned by `upload`.
pub trait BlobStore: Send + Sync {
    fn upload(
        &self,
        user_id: &str,
        upload: &AttachmentUpload,
    ) -> impl Future<Output = ResultEngine<Attachment>> + Send;

    fn delete(&self, url: &str) -> impl Future<Output = ResultEngine<()>> + Send;
}

/// Builds the object key for a new upload: `{user_id}/{millis}-{uuid}.{ext}`.
fn object_key(user_id: &str, upload: &AttachmentUpload) -> ResultEngine<String> {
    if !is_safe_segment(user_id) {
        return Err(EngineError::Validation(format!(
            "invalid storage owner: {user_id}"
        )));
    }
    Ok(format!(
        "{user_id}/{}-{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        upload.extension()
    ))
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

fn content_type_for(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Blob store backed by a local directory.
///
/// Objects live under `root/{key}` and are served at
/// `{public_base_url}/{key}`.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extracts the object key from a public URL.
    ///
    /// Returns `None` for URLs that do not belong to this store.
    #[must_use]
    pub fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_base_url.as_str())?
            .strip_prefix('/')
            .filter(|key| !key.is_empty())
    }

    /// Keys with empty, `.` or `..` segments never name a stored object.
    fn path_for(&self, key: &str) -> ResultEngine<PathBuf> {
        if !key.split('/').all(is_safe_segment) {
            return Err(EngineError::KeyNotFound(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    /// Reads an object back, returning its bytes and content type.
    pub async fn open(&self, key: &str) -> ResultEngine<(Vec<u8>, &'static str)> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok((bytes, content_type_for(key))),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(EngineError::KeyNotFound(key.to_string()))
            }
            Err(err) => Err(EngineError::Storage(format!(
                "failed to read attachment: {err}"
            ))),
        }
    }
}

impl BlobStore for LocalBlobStore {
    async fn upload(&self, user_id: &str, upload: &AttachmentUpload) -> ResultEngine<Attachment> {
        let key = object_key(user_id, upload)?;
        let path = self.path_for(&key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                EngineError::Storage(format!("failed to upload attachment: {err}"))
            })?;
        }
        tokio::fs::write(&path, &upload.data)
            .await
            .map_err(|err| EngineError::Storage(format!("failed to upload attachment: {err}")))?;

        tracing::debug!("stored attachment {key} ({} bytes)", upload.data.len());
        Ok(Attachment {
            url: format!("{}/{key}", self.public_base_url),
            name: upload.name.clone(),
            content_type: upload.content_type.clone(),
        })
    }

    async fn delete(&self, url: &str) -> ResultEngine<()> {
        let Some(key) = self.key_from_url(url) else {
            tracing::debug!("ignoring delete of foreign attachment url {url}");
            return Ok(());
        };
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|err| EngineError::Storage(format!("failed to delete attachment: {err}")))
    }
}
