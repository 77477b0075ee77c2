//! File handles and download targets.

use super::{DocumentIoError, DocumentIoResult};

#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

/// MIME type accepted by `load_from_file`.
pub const JSON_MIME: &str = "application/json";

/// A file picked by the user, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub name: String,
    pub mime_type: String,
    pub contents: String,
}

impl LoadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            contents: contents.into(),
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: impl AsRef<Path>) -> DocumentIoResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| DocumentIoError::Read(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_for_extension(path.extension().and_then(|e| e.to_str()).unwrap_or(""));
        Ok(Self::new(name, mime_type, contents))
    }
}

/// MIME type for a file extension, `application/octet-stream` if unknown.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "json" => JSON_MIME,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Destination of client-side downloads.
pub trait DownloadSink {
    fn download(&mut self, filename: &str, data: &[u8], mime_type: &str) -> DocumentIoResult<()>;
}

/// One completed download held by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Keeps downloads in memory (tests, headless hosts).
#[derive(Debug, Default)]
pub struct MemorySink {
    downloads: Vec<Download>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downloads(&self) -> &[Download] {
        &self.downloads
    }

    pub fn take(&mut self) -> Vec<Download> {
        std::mem::take(&mut self.downloads)
    }
}

impl DownloadSink for MemorySink {
    fn download(&mut self, filename: &str, data: &[u8], mime_type: &str) -> DocumentIoResult<()> {
        self.downloads.push(Download {
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }
}

/// Writes downloads into a directory.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct DirectorySink {
    base_path: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl DirectorySink {
    /// Create a sink writing into `base_path`, creating it if needed.
    pub fn new(base_path: PathBuf) -> DocumentIoResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(|e| DocumentIoError::Download(format!("Failed to create download directory: {}", e)))?;
        }
        Ok(Self { base_path })
    }

    /// Sink into the user's download directory, or the home directory.
    pub fn default_location() -> DocumentIoResult<Self> {
        let base = dirs::download_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| DocumentIoError::Download("Could not determine download directory".to_string()))?;
        Self::new(base)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl DownloadSink for DirectorySink {
    fn download(&mut self, filename: &str, data: &[u8], _mime_type: &str) -> DocumentIoResult<()> {
        let safe_name: String = filename
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        let path = self.base_path.join(safe_name);
        fs::write(&path, data).map_err(|e| DocumentIoError::Download(format!("Failed to write {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("JSON"), JSON_MIME);
        assert_eq!(mime_for_extension("jpeg"), "image/jpeg");
        assert_eq!(mime_for_extension("bin"), "application/octet-stream");
    }

    #[test]
    fn test_memory_sink_records() {
        let mut sink = MemorySink::new();
        sink.download("a.json", b"{}", JSON_MIME).unwrap();

        let downloads = sink.take();
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].filename, "a.json");
        assert!(sink.downloads().is_empty());
    }

    #[test]
    fn test_directory_sink_writes_files() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested");
        let mut sink = DirectorySink::new(target.clone()).unwrap();

        sink.download("poster.json", b"{\"a\":1}", JSON_MIME).unwrap();
        sink.download("../escape.json", b"{}", JSON_MIME).unwrap();

        assert_eq!(std::fs::read(target.join("poster.json")).unwrap(), b"{\"a\":1}");
        assert!(target.join(".._escape.json").exists());
    }

    #[test]
    fn test_loaded_file_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{}").unwrap();

        let file = LoadedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "doc.json");
        assert_eq!(file.mime_type, JSON_MIME);
        assert_eq!(file.contents, "{}");

        assert!(matches!(
            LoadedFile::from_path(dir.path().join("missing.json")),
            Err(DocumentIoError::Read(_))
        ));
    }
}
