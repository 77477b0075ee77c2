//! Canvas adapter abstraction.
//!
//! The editor never renders or stores drawables itself. It drives a
//! [`CanvasAdapter`], which owns the drawables, the native active selection,
//! the viewport and the library's own JSON serialization.

mod memory;
mod raster;
mod viewport;

pub use memory::{MemoryCanvas, FORMAT_VERSION};
pub use viewport::Viewport;

use crate::drawable::{Drawable, DrawableId};
use kurbo::Point;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Canvas adapter errors.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    #[error("Clone failed: {0}")]
    Clone(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Boxed future for async adapter operations (compatible with WASM).
///
/// Not `Send`: the editor runs on the host's single-threaded event loop.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// The adapter's notion of what the user currently has selected.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveObject {
    /// A single drawable is active.
    Drawable(DrawableId),
    /// A transient multi-object grouping of several drawables.
    Selection(Vec<DrawableId>),
}

impl ActiveObject {
    /// Expand into the member drawables.
    pub fn members(&self) -> Vec<DrawableId> {
        match self {
            ActiveObject::Drawable(id) => vec![*id],
            ActiveObject::Selection(ids) => ids.clone(),
        }
    }

    /// Whether this is a multi-object grouping.
    pub fn is_selection(&self) -> bool {
        matches!(self, ActiveObject::Selection(_))
    }
}

/// Raster encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
}

impl RasterFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Options for [`CanvasAdapter::to_data_url`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub format: RasterFormat,
    /// Encoder quality in `0.0..=1.0` (ignored by lossless formats).
    pub quality: f32,
    /// Resolution multiplier applied to the canvas size.
    pub multiplier: f64,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            format: RasterFormat::Png,
            quality: 1.0,
            multiplier: 1.0,
        }
    }
}

/// Primitive operations supplied by the wrapped canvas library.
pub trait CanvasAdapter {
    /// Add a drawable on top of the z-order.
    fn add(&mut self, drawable: Drawable);

    /// Remove a drawable, returning it if it existed.
    fn remove(&mut self, id: DrawableId) -> Option<Drawable>;

    /// Get a drawable by ID.
    fn get(&self, id: DrawableId) -> Option<&Drawable>;

    /// Get a mutable drawable by ID.
    fn get_mut(&mut self, id: DrawableId) -> Option<&mut Drawable>;

    /// All top-level drawables in z-order (back to front).
    fn objects(&self) -> Vec<&Drawable>;

    /// The authoritative active selection, if any.
    fn active_object(&self) -> Option<ActiveObject>;

    /// Replace the active selection.
    fn set_active_object(&mut self, active: ActiveObject);

    /// Drop the active selection.
    fn discard_active_object(&mut self);

    /// Remove every drawable and the active selection.
    fn clear(&mut self);

    /// Request a repaint.
    fn render_all(&mut self);

    fn background_color(&self) -> &str;

    fn set_background_color(&mut self, color: &str);

    fn zoom(&self) -> f64;

    fn set_zoom(&mut self, zoom: f64);

    /// Reset pan and zoom to identity.
    fn reset_viewport(&mut self);

    /// Map a pointer position on the canvas element to document coordinates.
    fn screen_to_world(&self, point: Point) -> Point;

    /// Serialize the full drawable set. `extra_fields` names non-default
    /// attributes (such as `"name"`) that must be included per object.
    fn to_json(&self, extra_fields: &[&str]) -> AdapterResult<Value>;

    /// Replace the drawable set from a payload produced by [`Self::to_json`].
    fn load_from_json<'a>(&'a mut self, data: &'a Value) -> BoxFuture<'a, AdapterResult<()>>;

    /// Deep-clone a drawable. The clone carries fresh IDs and is not added.
    fn clone_drawable<'a>(&'a self, drawable: &'a Drawable) -> BoxFuture<'a, AdapterResult<Drawable>>;

    /// Encode the rendered canvas as a `data:` URL.
    fn to_data_url(&self, options: &RasterOptions) -> AdapterResult<String>;
}
