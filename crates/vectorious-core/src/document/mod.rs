//! Document import/export.
//!
//! A persisted document is the adapter's native JSON (names included) with
//! two extra top-level fields, `canvasTitle` and `backgroundColor`.

mod files;

#[cfg(target_arch = "wasm32")]
mod browser;

pub use files::{Download, DownloadSink, LoadedFile, MemorySink, JSON_MIME};

#[cfg(not(target_arch = "wasm32"))]
pub use files::DirectorySink;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserDownload;

use crate::adapter::{CanvasAdapter, RasterOptions};
use crate::config::{DEFAULT_BACKGROUND, DEFAULT_TITLE};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use thiserror::Error;

/// Title field added to exported documents.
pub const TITLE_FIELD: &str = "canvasTitle";

/// Background field added to exported documents.
pub const BACKGROUND_FIELD: &str = "backgroundColor";

/// Document I/O errors.
#[derive(Debug, Error)]
pub enum DocumentIoError {
    #[error("Please select a valid JSON file")]
    InvalidFileType,
    #[error("Invalid JSON file format")]
    InvalidFormat,
    #[error("Failed to import canvas data")]
    ImportFailed,
    #[error("Failed to read file: {0}")]
    Read(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Download failed: {0}")]
    Download(String),
}

/// Result type for document I/O.
pub type DocumentIoResult<T> = Result<T, DocumentIoError>;

/// Document-level attributes that live outside the drawable set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    pub title: String,
    pub background_color: String,
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, DEFAULT_BACKGROUND)
    }
}

impl DocumentMeta {
    pub fn new(title: impl Into<String>, background_color: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            background_color: background_color.into(),
        }
    }

    /// Adopt restored values, using `fallback` for missing or empty ones.
    pub fn restore(&mut self, title: Option<&str>, background_color: Option<&str>, fallback: &DocumentMeta) {
        self.title = non_empty(title).unwrap_or(fallback.title.as_str()).to_string();
        self.background_color = non_empty(background_color)
            .unwrap_or(fallback.background_color.as_str())
            .to_string();
    }

    /// File stem derived from the title.
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Replace every character outside `[A-Za-z0-9]` with `-` and lowercase.
pub fn slugify(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

/// Serialize the document. Logs and returns `None` on failure.
pub fn export_document<A: CanvasAdapter>(canvas: &A, meta: &DocumentMeta) -> Option<Value> {
    let mut json = match canvas.to_json(&["name"]) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to export canvas: {}", e);
            return None;
        }
    };

    let Some(object) = json.as_object_mut() else {
        log::error!("Failed to export canvas: adapter produced a non-object payload");
        return None;
    };
    object.insert(TITLE_FIELD.to_string(), Value::String(meta.title.clone()));
    object.insert(BACKGROUND_FIELD.to_string(), Value::String(meta.background_color.clone()));
    Some(json)
}

/// Replace the document with `data`. Returns whether it succeeded.
///
/// A non-object payload is rejected before the live document is touched.
/// A payload that fails to deserialize leaves the document cleared.
pub async fn import_document<A: CanvasAdapter>(
    canvas: &mut A,
    meta: &mut DocumentMeta,
    data: &Value,
    fallback: &DocumentMeta,
) -> bool {
    if !data.is_object() {
        log::error!("Failed to import canvas: payload is not an object");
        return false;
    }

    canvas.clear();
    if let Err(e) = canvas.load_from_json(data).await {
        log::error!("Failed to import canvas: {}", e);
        canvas.set_background_color(&meta.background_color);
        return false;
    }

    meta.restore(
        data.get(TITLE_FIELD).and_then(Value::as_str),
        data.get(BACKGROUND_FIELD).and_then(Value::as_str),
        fallback,
    );
    canvas.set_background_color(&meta.background_color);
    canvas.render_all();
    true
}

/// Hand the pretty-printed document to `sink`. Returns the filename used.
pub fn save_to_file<A: CanvasAdapter>(
    canvas: &A,
    meta: &DocumentMeta,
    sink: &mut dyn DownloadSink,
    filename: Option<&str>,
) -> DocumentIoResult<String> {
    let json = export_document(canvas, meta)
        .ok_or_else(|| DocumentIoError::Serialization("export produced no document".to_string()))?;
    let pretty = serde_json::to_string_pretty(&json).map_err(|e| DocumentIoError::Serialization(e.to_string()))?;

    let filename = filename.map_or_else(|| format!("{}.json", meta.slug()), str::to_string);
    sink.download(&filename, pretty.as_bytes(), JSON_MIME)?;
    log::info!("Canvas saved to {}", filename);
    Ok(filename)
}

/// Validate and import a user-supplied file.
///
/// Type and JSON syntax are checked before the live document is touched.
pub async fn load_from_file<A: CanvasAdapter>(
    canvas: &mut A,
    meta: &mut DocumentMeta,
    file: &LoadedFile,
    fallback: &DocumentMeta,
) -> DocumentIoResult<()> {
    if file.mime_type != JSON_MIME {
        return Err(DocumentIoError::InvalidFileType);
    }
    let data: Value = serde_json::from_str(&file.contents).map_err(|_| DocumentIoError::InvalidFormat)?;

    if !import_document(canvas, meta, &data, fallback).await {
        return Err(DocumentIoError::ImportFailed);
    }
    log::info!("Canvas loaded from {}", file.name);
    Ok(())
}

/// Render through the adapter and hand the encoded image to `sink`.
///
/// Failures are logged; the filename is returned on success.
pub fn export_raster<A: CanvasAdapter>(
    canvas: &A,
    sink: &mut dyn DownloadSink,
    filename: &str,
    options: &RasterOptions,
) -> Option<String> {
    let result = canvas
        .to_data_url(options)
        .map_err(|e| DocumentIoError::Encoding(e.to_string()))
        .and_then(|url| decode_data_url(&url))
        .and_then(|(mime_type, bytes)| sink.download(filename, &bytes, &mime_type));

    match result {
        Ok(()) => Some(filename.to_string()),
        Err(e) => {
            log::error!("Failed to export {}: {}", filename, e);
            None
        }
    }
}

/// Split a base64 `data:` URL into its MIME type and payload.
pub fn decode_data_url(url: &str) -> DocumentIoResult<(String, Vec<u8>)> {
    let (mime_type, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .ok_or_else(|| DocumentIoError::Encoding("not a base64 data URL".to_string()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| DocumentIoError::Encoding(e.to_string()))?;
    Ok((mime_type.to_string(), bytes))
}
