//! Editor configuration.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default maximum number of undo snapshots.
pub const DEFAULT_MAX_UNDO_STEPS: usize = 50;

/// Title given to new and untitled documents.
pub const DEFAULT_TITLE: &str = "Vectorious Design";

/// Background color of new documents.
pub const DEFAULT_BACKGROUND: &str = "#525252";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables for an [`Editor`](crate::Editor). Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo stack capacity, the pristine baseline included.
    pub max_undo_steps: usize,
    pub default_title: String,
    pub default_background: String,
    /// Periodic selection reconciliation interval.
    pub reconcile_interval_ms: u64,
    /// Re-check delay after a selection created/updated event.
    pub selection_recheck_ms: u64,
    /// Re-check delay after pointer-up.
    pub pointer_up_recheck_ms: u64,
    /// Re-check delay after before-selection-cleared.
    pub before_clear_recheck_ms: u64,
    /// Zoom in/out multiplier.
    pub zoom_step: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Paste target until the first pointer-down is seen.
    pub paste_origin: Point,
    pub jpeg_quality: f32,
    pub high_res_multiplier: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_steps: DEFAULT_MAX_UNDO_STEPS,
            default_title: DEFAULT_TITLE.to_string(),
            default_background: DEFAULT_BACKGROUND.to_string(),
            reconcile_interval_ms: 2000,
            selection_recheck_ms: 100,
            pointer_up_recheck_ms: 100,
            before_clear_recheck_ms: 50,
            zoom_step: 1.2,
            min_zoom: 0.1,
            max_zoom: 5.0,
            paste_origin: Point::new(100.0, 100.0),
            jpeg_quality: 0.8,
            high_res_multiplier: 2.0,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_undo_steps < 2 {
            return Err(ConfigError::Invalid(
                "maxUndoSteps must hold the baseline and at least one change".to_string(),
            ));
        }
        if self.reconcile_interval_ms == 0 {
            return Err(ConfigError::Invalid("reconcileIntervalMs must be positive".to_string()));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(ConfigError::Invalid(format!(
                "zoom range {}..{} is empty or non-positive",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.zoom_step <= 1.0 {
            return Err(ConfigError::Invalid("zoomStep must be greater than 1".to_string()));
        }
        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            return Err(ConfigError::Invalid("jpegQuality must be in (0, 1]".to_string()));
        }
        if self.high_res_multiplier <= 0.0 {
            return Err(ConfigError::Invalid("highResMultiplier must be positive".to_string()));
        }
        Ok(())
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_interval_ms)
    }

    pub fn selection_recheck(&self) -> Duration {
        Duration::from_millis(self.selection_recheck_ms)
    }

    pub fn pointer_up_recheck(&self) -> Duration {
        Duration::from_millis(self.pointer_up_recheck_ms)
    }

    pub fn before_clear_recheck(&self) -> Duration {
        Duration::from_millis(self.before_clear_recheck_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_constants() {
        let config = EditorConfig::default();
        assert_eq!(config.max_undo_steps, 50);
        assert_eq!(config.default_title, "Vectorious Design");
        assert_eq!(config.default_background, "#525252");
        assert_eq!(config.reconcile_interval(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "maxUndoSteps": 10, "defaultTitle": "Sketch" }"#).unwrap();
        assert_eq!(config.max_undo_steps, 10);
        assert_eq!(config.default_title, "Sketch");
        assert_eq!(config.zoom_step, 1.2);
        assert_eq!(config.paste_origin, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EditorConfig::from_json(r#"{ "maxUndoSteps": 1 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EditorConfig::from_json(r#"{ "minZoom": 6.0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(EditorConfig::from_json("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "jpegQuality": 0.5 }}"#).unwrap();

        let config = EditorConfig::load(file.path()).unwrap();
        assert_eq!(config.jpeg_quality, 0.5);

        assert!(matches!(
            EditorConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
