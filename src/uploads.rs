//! Media upload pipeline for the admin panel
//!
//! Small images travel through the backend so they can be checked and
//! written with long-lived cache headers. Video and anything oversized
//! goes browser-direct via a short-lived presigned PUT URL instead, so
//! large transfers never occupy the application path.

use bytes::Bytes;
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use marquee_auth::AdminVerifier;
use marquee_storage::{BucketClient, PutOptions, DEFAULT_PRESIGN_EXPIRY_SECS};

use crate::error::Error;

/// Ceiling for uploads proxied through the backend
pub const MAX_PROXIED_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const IMAGE_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/avif"];
const VIDEO_CONTENT_TYPES: [&str; 3] = ["video/mp4", "video/quicktime", "video/webm"];

/// Uploaded keys are immutable (timestamped + random), so caches may hold
/// them indefinitely.
const UPLOAD_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Normalize a client-supplied folder into a safe key prefix
///
/// Lowercases, converts backslashes, collapses duplicate slashes and
/// strips the edges; rejects traversal segments and any character outside
/// `a-z`, `0-9`, `-` and `/`.
pub fn sanitize_folder(input: &str) -> Result<String, Error> {
    let lowered = input.trim().to_ascii_lowercase().replace('\\', "/");
    let segments: Vec<&str> = lowered.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return Err(Error::validation("folder must not be empty"));
    }
    if segments.iter().any(|segment| *segment == "..") {
        return Err(Error::validation("folder must not contain path traversal"));
    }

    let folder = segments.join("/");
    let allowed = folder
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '/' || c == '-');
    if !allowed {
        return Err(Error::validation(
            "folder may only contain a-z, 0-9, '-' and '/'",
        ));
    }

    Ok(folder)
}

/// Derive a collision-free object key: `{folder}/{unix_millis}-{8 hex}.{ext}`
pub fn derive_object_key(folder: &str, file_name: &str, content_type: &str) -> String {
    let extension = extension_for(file_name, content_type);
    let stamp = Utc::now().timestamp_millis();
    let random = Uuid::new_v4().simple().to_string();
    format!("{}/{}-{}.{}", folder, stamp, &random[..8], extension)
}

/// Pick an extension: the file's own when purely alphanumeric, else by MIME
fn extension_for(file_name: &str, content_type: &str) -> String {
    if let Some((_, ext)) = file_name.rsplit_once('.') {
        let ext = ext.to_ascii_lowercase();
        if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return ext;
        }
    }

    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        _ => "bin",
    }
    .to_string()
}

/// Result of a proxied upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    /// Public URL ready to be stored in content documents
    pub url: String,
}

/// Request for a presigned direct upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub file_name: String,
    pub content_type: String,
    pub folder: String,
}

/// A presigned direct upload: PUT to `upload_url`, read from `public_url`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    pub public_url: String,
}

/// Upload entry point, wired by [`crate::SiteClient`]
pub struct MediaUploader {
    bucket: Option<BucketClient>,
    verifier: Option<AdminVerifier>,
}

impl MediaUploader {
    /// Create a new MediaUploader
    pub(crate) fn new(bucket: Option<BucketClient>, verifier: Option<AdminVerifier>) -> Self {
        Self { bucket, verifier }
    }

    fn verify(&self, token: &str) -> Result<(), Error> {
        let verifier = self
            .verifier
            .as_ref()
            .ok_or_else(|| Error::unavailable("admin authentication is not configured"))?;
        verifier.verify(token)?;
        Ok(())
    }

    fn bucket(&self) -> Result<&BucketClient, Error> {
        self.bucket
            .as_ref()
            .ok_or_else(|| Error::unavailable("media storage is not configured"))
    }

    /// Proxied image upload
    ///
    /// Only the image allow-list is accepted here, capped at
    /// [`MAX_PROXIED_UPLOAD_BYTES`]; anything heavier belongs in
    /// [`MediaUploader::presign_upload`].
    pub async fn upload_image(
        &self,
        token: &str,
        folder: &str,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<UploadedMedia, Error> {
        self.verify(token)?;

        if !IMAGE_CONTENT_TYPES.contains(&content_type) {
            return Err(Error::validation(format!(
                "unsupported image type: {}",
                content_type
            )));
        }
        if data.len() > MAX_PROXIED_UPLOAD_BYTES {
            return Err(Error::validation("image exceeds the 10 MiB upload limit"));
        }

        let folder = sanitize_folder(folder)?;
        let key = derive_object_key(&folder, file_name, content_type);
        let bucket = self.bucket()?;

        let options = PutOptions::new()
            .with_content_type(content_type)
            .with_cache_control(UPLOAD_CACHE_CONTROL);
        bucket.put_object(&key, data, Some(options)).await?;

        info!("uploaded image {}", key);
        Ok(UploadedMedia {
            url: bucket.public_url(&key),
        })
    }

    /// Issue a short-lived presigned PUT URL for a direct upload
    pub fn presign_upload(
        &self,
        token: &str,
        request: &PresignRequest,
    ) -> Result<PresignedUpload, Error> {
        self.verify(token)?;

        let content_type = request.content_type.as_str();
        if !IMAGE_CONTENT_TYPES.contains(&content_type)
            && !VIDEO_CONTENT_TYPES.contains(&content_type)
        {
            return Err(Error::validation(format!(
                "unsupported media type: {}",
                content_type
            )));
        }

        let folder = sanitize_folder(&request.folder)?;
        let key = derive_object_key(&folder, &request.file_name, content_type);
        let bucket = self.bucket()?;

        let upload_url = bucket.presign_put(
            &key,
            Some(content_type),
            Duration::from_secs(DEFAULT_PRESIGN_EXPIRY_SECS),
        )?;

        info!("presigned direct upload for {}", key);
        Ok(PresignedUpload {
            upload_url: upload_url.to_string(),
            public_url: bucket.public_url(&key),
        })
    }
}
