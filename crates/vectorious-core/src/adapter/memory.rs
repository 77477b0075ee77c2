//! Headless in-memory canvas implementation.

use super::{
    raster, ActiveObject, AdapterError, AdapterResult, BoxFuture, CanvasAdapter, RasterOptions, Viewport,
};
use crate::drawable::{Drawable, DrawableId};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kurbo::{Point, Size};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Version tag written into serialized payloads.
pub const FORMAT_VERSION: &str = "1.0";

/// In-memory canvas for tests and hosts without a rendering library.
///
/// Drawables are keyed by ID with a separate back-to-front z-order.
#[derive(Debug, Clone)]
pub struct MemoryCanvas {
    shapes: HashMap<DrawableId, Drawable>,
    z_order: Vec<DrawableId>,
    active: Option<ActiveObject>,
    background: String,
    viewport: Viewport,
    size: Size,
    render_count: usize,
}

impl Default for MemoryCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCanvas {
    /// Create an empty 800x600 canvas.
    pub fn new() -> Self {
        Self::with_size(800.0, 600.0)
    }

    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            shapes: HashMap::new(),
            z_order: Vec::new(),
            active: None,
            background: String::new(),
            viewport: Viewport::new(),
            size: Size::new(width, height),
            render_count: 0,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Number of repaints requested so far.
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Keep the active selection pointing at drawables that still exist.
    fn prune_active(&mut self) {
        self.active = match self.active.take() {
            Some(ActiveObject::Drawable(id)) if self.shapes.contains_key(&id) => Some(ActiveObject::Drawable(id)),
            Some(ActiveObject::Selection(ids)) => {
                let ids: Vec<DrawableId> = ids.into_iter().filter(|id| self.shapes.contains_key(id)).collect();
                match ids.len() {
                    0 => None,
                    1 => Some(ActiveObject::Drawable(ids[0])),
                    _ => Some(ActiveObject::Selection(ids)),
                }
            }
            _ => None,
        };
    }
}

/// Drop `name` from an object (and its group children) unless requested.
fn strip_name(value: &mut Value) {
    if let Some(obj) = value.as_object_mut() {
        obj.remove("name");
        if let Some(children) = obj.get_mut("objects").and_then(Value::as_array_mut) {
            children.iter_mut().for_each(strip_name);
        }
    }
}

impl CanvasAdapter for MemoryCanvas {
    fn add(&mut self, drawable: Drawable) {
        let id = drawable.id();
        self.z_order.retain(|&shape_id| shape_id != id);
        self.z_order.push(id);
        self.shapes.insert(id, drawable);
    }

    fn remove(&mut self, id: DrawableId) -> Option<Drawable> {
        self.z_order.retain(|&shape_id| shape_id != id);
        let removed = self.shapes.remove(&id);
        self.prune_active();
        removed
    }

    fn get(&self, id: DrawableId) -> Option<&Drawable> {
        self.shapes.get(&id)
    }

    fn get_mut(&mut self, id: DrawableId) -> Option<&mut Drawable> {
        self.shapes.get_mut(&id)
    }

    fn objects(&self) -> Vec<&Drawable> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id)).collect()
    }

    fn active_object(&self) -> Option<ActiveObject> {
        self.active.clone()
    }

    fn set_active_object(&mut self, active: ActiveObject) {
        self.active = Some(active);
        self.prune_active();
    }

    fn discard_active_object(&mut self) {
        self.active = None;
    }

    fn clear(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
        self.active = None;
        self.background.clear();
    }

    fn render_all(&mut self) {
        self.render_count += 1;
    }

    fn background_color(&self) -> &str {
        &self.background
    }

    fn set_background_color(&mut self, color: &str) {
        self.background = color.to_string();
    }

    fn zoom(&self) -> f64 {
        self.viewport.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.viewport.set_zoom(zoom);
    }

    fn reset_viewport(&mut self) {
        self.viewport.reset();
    }

    fn screen_to_world(&self, point: Point) -> Point {
        self.viewport.screen_to_world(point)
    }

    fn to_json(&self, extra_fields: &[&str]) -> AdapterResult<Value> {
        let keep_names = extra_fields.contains(&"name");
        let mut objects = Vec::with_capacity(self.z_order.len());
        for drawable in self.objects() {
            let mut value =
                serde_json::to_value(drawable).map_err(|e| AdapterError::Serialization(e.to_string()))?;
            if !keep_names {
                strip_name(&mut value);
            }
            objects.push(value);
        }

        Ok(json!({
            "version": FORMAT_VERSION,
            "objects": objects,
            "background": self.background,
        }))
    }

    fn load_from_json<'a>(&'a mut self, data: &'a Value) -> BoxFuture<'a, AdapterResult<()>> {
        Box::pin(async move {
            let objects = data
                .get("objects")
                .and_then(Value::as_array)
                .ok_or_else(|| AdapterError::Deserialization("Missing 'objects' array".to_string()))?;

            // Parse everything before touching the live set.
            let parsed = objects
                .iter()
                .map(parse_drawable)
                .collect::<AdapterResult<Vec<_>>>()?;

            self.shapes.clear();
            self.z_order.clear();
            self.active = None;
            for drawable in parsed {
                self.add(drawable);
            }
            if let Some(background) = data.get("background").and_then(Value::as_str) {
                self.background = background.to_string();
            }
            Ok(())
        })
    }

    fn clone_drawable<'a>(&'a self, drawable: &'a Drawable) -> BoxFuture<'a, AdapterResult<Drawable>> {
        Box::pin(async move {
            let mut copy = drawable.clone();
            copy.regenerate_id();
            Ok(copy)
        })
    }

    fn to_data_url(&self, options: &RasterOptions) -> AdapterResult<String> {
        let bytes = raster::render(&self.objects(), &self.background, &self.viewport, self.size, options)?;
        Ok(format!("data:{};base64,{}", options.format.mime_type(), STANDARD.encode(bytes)))
    }
}

fn parse_drawable(value: &Value) -> AdapterResult<Drawable> {
    Drawable::deserialize(value).map_err(|e| AdapterError::Deserialization(e.to_string()))
}
