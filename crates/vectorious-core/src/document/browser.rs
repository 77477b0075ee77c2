//! Browser downloads through a Blob URL and a synthetic anchor click.

use super::{DocumentIoError, DocumentIoResult, DownloadSink};
use wasm_bindgen::JsCast;

/// Triggers a client-side download in the current browser window.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserDownload;

impl BrowserDownload {
    pub fn new() -> Self {
        Self
    }
}

fn js_error(context: &str, err: wasm_bindgen::JsValue) -> DocumentIoError {
    DocumentIoError::Download(format!("{}: {:?}", context, err))
}

impl DownloadSink for BrowserDownload {
    fn download(&mut self, filename: &str, data: &[u8], mime_type: &str) -> DocumentIoResult<()> {
        let window = web_sys::window().ok_or_else(|| DocumentIoError::Download("No window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| DocumentIoError::Download("No document".to_string()))?;

        let bytes = js_sys::Uint8Array::from(data);
        let blob_parts = js_sys::Array::new();
        blob_parts.push(&bytes);

        let options = web_sys::BlobPropertyBag::new();
        options.set_type(mime_type);

        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&blob_parts, &options)
            .map_err(|e| js_error("Failed to create blob", e))?;
        let url = web_sys::Url::create_object_url_with_blob(&blob).map_err(|e| js_error("Failed to create URL", e))?;

        let anchor = document
            .create_element("a")
            .map_err(|e| js_error("Failed to create element", e))?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| DocumentIoError::Download("Failed to cast to anchor".to_string()))?;

        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.click();

        web_sys::Url::revoke_object_url(&url).ok();
        Ok(())
    }
}
