//! Request form reading and image storage.
//!
//! Post endpoints take `multipart/form-data` with text fields and at most one
//! file part named `image`. The file is screened (media type and bearer
//! token) and written to disk before any handler logic runs. A screened-out
//! file is dropped silently and the request carries on without one; the
//! handler decides whether that is fatal. JSON bodies are accepted for the
//! text fields alone.

use actix_multipart::{Field, Multipart};
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest};
use chrono::Utc;
use futures_util::StreamExt;
use mime::Mime;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::UploadConfig;
use crate::error::{AppError, Result};
use crate::metrics::IMAGE_UPLOADS_TOTAL;
use crate::middleware::{authorization_header, AuthFailure, TokenVerifier};

pub const IMAGE_FIELD: &str = "image";
pub const ACCEPTED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpg", "image/jpeg"];

const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;
const MAX_JSON_BODY_BYTES: usize = 256 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Path the file was written to; this is what posts store
    pub path: String,
    pub original_name: String,
    pub size: usize,
}

/// Why an image part was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnsupportedMediaType,
    MissingCredential,
    InvalidCredential,
}

impl Rejection {
    fn label(self) -> &'static str {
        match self {
            Rejection::UnsupportedMediaType => "rejected_media_type",
            Rejection::MissingCredential | Rejection::InvalidCredential => {
                "rejected_credential"
            }
        }
    }
}

/// Decide whether an image part may be stored. The media type and the
/// credential are checked independently; either failing drops the file.
pub fn screen_image(
    content_type: Option<&Mime>,
    authorization: Option<&str>,
    verifier: &TokenVerifier,
) -> std::result::Result<(), Rejection> {
    let allowed = content_type
        .map(|m| ACCEPTED_IMAGE_TYPES.contains(&m.essence_str()))
        .unwrap_or(false);
    if !allowed {
        return Err(Rejection::UnsupportedMediaType);
    }

    match verifier.verify_header(authorization) {
        Ok(_) => Ok(()),
        Err(AuthFailure::Missing) => Err(Rejection::MissingCredential),
        Err(AuthFailure::Invalid) => Err(Rejection::InvalidCredential),
    }
}

/// Writes and removes image files under a fixed directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(&config.dir, config.max_bytes)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn prepare(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// `<unix-millis>-<name>`, keeping only the final component of the
    /// client-supplied name. Same-millisecond uploads of the same name collide.
    pub fn file_name_for(original: &str, millis: i64) -> String {
        let base = original
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .unwrap_or("image");
        format!("{}-{}", millis, base)
    }

    pub async fn persist(&self, original_name: &str, bytes: &[u8]) -> io::Result<StoredImage> {
        self.prepare().await?;

        let name = Self::file_name_for(original_name, Utc::now().timestamp_millis());
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes).await?;

        Ok(StoredImage {
            path: path.to_string_lossy().into_owned(),
            original_name: original_name.to_string(),
            size: bytes.len(),
        })
    }

    pub async fn remove(&self, path: &str) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    /// Remove a file that was stored for a request that then failed.
    /// Failures are logged; the original error is what the caller reports.
    pub async fn discard(&self, image: &StoredImage) {
        if let Err(e) = self.remove(&image.path).await {
            tracing::warn!(path = %image.path, error = %e, "failed to discard unused upload");
        }
    }
}

/// Whether a form may carry an image at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePolicy {
    Accept,
    /// File parts are drained and ignored
    Ignore,
}

#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub image: Option<StoredImage>,
}

impl FormData {
    /// Field value, or empty when absent
    pub fn field(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }
}

/// Read the request body into text fields and an optional stored image.
pub async fn read_form(
    req: &HttpRequest,
    payload: web::Payload,
    images: &ImageStore,
    verifier: &TokenVerifier,
    policy: ImagePolicy,
) -> Result<FormData> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<Mime>().ok());

    match content_type {
        Some(ct) if ct.type_() == mime::MULTIPART && ct.subtype() == mime::FORM_DATA => {
            let mut form = FormData::default();
            let multipart = Multipart::new(req.headers(), payload);
            let auth = authorization_header(req);

            if let Err(e) =
                collect_multipart(multipart, &mut form, images, verifier, auth, policy).await
            {
                if let Some(image) = form.image.take() {
                    images.discard(&image).await;
                }
                return Err(e);
            }
            Ok(form)
        }
        Some(ct) if ct.subtype() == mime::JSON || ct.suffix() == Some(mime::JSON) => {
            read_json(payload).await
        }
        _ => Ok(FormData::default()),
    }
}

async fn collect_multipart(
    mut multipart: Multipart,
    form: &mut FormData,
    images: &ImageStore,
    verifier: &TokenVerifier,
    authorization: Option<&str>,
    policy: ImagePolicy,
) -> Result<()> {
    let mut seen_image = false;

    while let Some(field) = multipart.next().await {
        let mut field = field?;
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let Some(original_name) = file_name else {
            let bytes = read_limited(&mut field, MAX_TEXT_FIELD_BYTES)
                .await?
                .ok_or_else(|| AppError::BadRequest(format!("Field '{}' is too large", name)))?;
            let value = String::from_utf8(bytes)
                .map_err(|_| AppError::BadRequest(format!("Field '{}' is not UTF-8", name)))?;
            form.fields.insert(name, value);
            continue;
        };

        if policy == ImagePolicy::Ignore {
            drain(&mut field).await?;
            continue;
        }
        if name != IMAGE_FIELD {
            return Err(AppError::BadRequest(format!("Unexpected file field '{}'", name)));
        }
        if seen_image {
            return Err(AppError::BadRequest(
                "Only one image may be uploaded".to_string(),
            ));
        }
        seen_image = true;

        if let Err(reason) = screen_image(field.content_type(), authorization, verifier) {
            tracing::debug!(?reason, file = %original_name, "image dropped by upload filter");
            IMAGE_UPLOADS_TOTAL.with_label_values(&[reason.label()]).inc();
            drain(&mut field).await?;
            continue;
        }

        let bytes = read_limited(&mut field, images.max_bytes())
            .await?
            .ok_or(AppError::PayloadTooLarge(images.max_bytes()))?;
        let stored = images.persist(&original_name, &bytes).await?;
        tracing::debug!(path = %stored.path, size = stored.size, "image stored");
        IMAGE_UPLOADS_TOTAL.with_label_values(&["accepted"]).inc();
        form.image = Some(stored);
    }

    Ok(())
}

/// Read a field body; `None` once it grows past `limit`.
async fn read_limited(field: &mut Field, limit: usize) -> Result<Option<Vec<u8>>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if data.len() + chunk.len() > limit {
            return Ok(None);
        }
        data.extend_from_slice(&chunk);
    }
    Ok(Some(data))
}

async fn drain(field: &mut Field) -> Result<()> {
    while let Some(chunk) = field.next().await {
        chunk?;
    }
    Ok(())
}

async fn read_json(mut payload: web::Payload) -> Result<FormData> {
    let mut body = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk =
            chunk.map_err(|e| AppError::BadRequest(format!("Failed to read body: {}", e)))?;
        if body.len() + chunk.len() > MAX_JSON_BODY_BYTES {
            return Err(AppError::BadRequest("Request body too large".to_string()));
        }
        body.extend_from_slice(&chunk);
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FormData::default());
    }

    let values: HashMap<String, serde_json::Value> = serde_json::from_slice(&body)?;
    let fields = values
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect();

    Ok(FormData {
        fields,
        image: None,
    })
}
