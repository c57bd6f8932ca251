//! Multipart upload handling shared by the file endpoints
//!
//! Every upload endpoint takes a `file` part plus optional text fields
//! (`lang`, `output`, `font_size`).

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::{AppError, Result};

/// Uploaded file part
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    /// Client file name without any directory components or quotes
    pub fn display_name(&self, fallback: &str) -> String {
        let name = self
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit(['/', '\\']).next())
            .map(|name| name.replace('"', ""))
            .filter(|name| !name.trim().is_empty());
        name.unwrap_or_else(|| fallback.to_string())
    }
}

/// Parsed multipart form
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();

            if name == "file" || name == "image" {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await?;

                tracing::debug!(
                    "Received upload: filename={:?}, content_type={:?}, {} bytes",
                    file_name,
                    content_type,
                    data.len()
                );

                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            } else if !name.is_empty() {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// The uploaded file; missing or empty uploads are rejected
    pub fn require_file(&mut self) -> Result<UploadedFile> {
        match self.file.take() {
            Some(file) if !file.data.is_empty() => Ok(file),
            Some(_) => Err(AppError::BadRequest("Uploaded file is empty".to_string())),
            None => Err(AppError::BadRequest("Missing 'file' field".to_string())),
        }
    }

    /// Trimmed, non-empty text field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Target language, or `default`
    pub fn lang(&self, default: &str) -> String {
        self.field("lang").unwrap_or(default).to_string()
    }

    /// Optional numeric field; unparseable values are a bad request
    pub fn number(&self, name: &str) -> Result<Option<f32>> {
        self.field(name)
            .map(|raw| {
                raw.parse::<f32>()
                    .map_err(|_| AppError::BadRequest(format!("'{}' must be a number", name)))
            })
            .transpose()
    }
}
