//! Editor settings, loaded from a JSON file.

use crate::document::MAX_CANVAS_DOTS;
use crate::error::{DesignError, DesignResult};
use crate::geometry::{HANDLE_HIT_RADIUS, HandleTolerance, ROTATE_HANDLE_OFFSET, ROTATE_HIT_RADIUS};
use crate::history::DEFAULT_UNDO_CAPACITY;
use crate::media::Media;
use crate::snap::SNAP_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tunable editor behaviour. Every field has a default, so a config file
/// only needs the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snap to alignment guides while moving.
    pub snap_enabled: bool,
    /// Snap distance in dots.
    pub snap_tolerance: f64,
    /// Number of undo checkpoints kept.
    pub undo_capacity: usize,
    /// Margin below the content for continuous-media exports, in dots.
    pub export_margin: f64,
    /// Maximum export height, in dots.
    pub export_max_height: u32,
    /// Window for two taps to count as a double tap, in milliseconds.
    pub double_tap_ms: u64,
    /// Corner handle hit radius, in screen pixels.
    pub handle_hit_radius: f64,
    /// Rotate handle distance above the top edge, in dots.
    pub rotate_handle_offset: f64,
    /// Rotate handle hit radius, in screen pixels.
    pub rotate_hit_radius: f64,
    /// Media for new designs.
    pub default_media: Media,
    /// Library directory; the platform data directory when unset.
    pub storage_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_enabled: true,
            snap_tolerance: SNAP_TOLERANCE,
            undo_capacity: DEFAULT_UNDO_CAPACITY,
            export_margin: 8.0,
            export_max_height: MAX_CANVAS_DOTS,
            double_tap_ms: 300,
            handle_hit_radius: HANDLE_HIT_RADIUS,
            rotate_handle_offset: ROTATE_HANDLE_OFFSET,
            rotate_hit_radius: ROTATE_HIT_RADIUS,
            default_media: Media::default(),
            storage_dir: None,
        }
    }
}

impl EditorConfig {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> DesignResult<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| DesignError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write settings to `path` as pretty JSON.
    pub fn save(&self, path: &Path) -> DesignResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> DesignResult<()> {
        if !(self.snap_tolerance.is_finite() && self.snap_tolerance >= 0.0) {
            return Err(DesignError::Config(format!(
                "snap_tolerance must be a non-negative number, got {}",
                self.snap_tolerance
            )));
        }
        if !(self.export_margin.is_finite() && self.export_margin >= 0.0) {
            return Err(DesignError::Config(format!(
                "export_margin must be a non-negative number, got {}",
                self.export_margin
            )));
        }
        if self.export_max_height == 0 || self.export_max_height > MAX_CANVAS_DOTS {
            return Err(DesignError::Config(format!(
                "export_max_height must be between 1 and {MAX_CANVAS_DOTS}, got {}",
                self.export_max_height
            )));
        }
        if self.undo_capacity == 0 {
            return Err(DesignError::Config("undo_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Double-tap window as a duration.
    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_ms)
    }

    /// Handle hit radii for a view drawn at `view_scale`.
    pub fn handle_tolerance(&self, view_scale: f64) -> HandleTolerance {
        HandleTolerance::with_radii(
            view_scale,
            self.handle_hit_radius,
            self.rotate_hit_radius,
            self.rotate_handle_offset,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = EditorConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"snap_enabled": false, "default_media": "continuous58"}"#).unwrap();
        let config = EditorConfig::load(&path).unwrap();
        assert!(!config.snap_enabled);
        assert_eq!(config.default_media, Media::Continuous58);
        assert_eq!(config.undo_capacity, 50);
        assert_eq!(config.export_max_height, 4000);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = EditorConfig {
            snap_tolerance: 6.0,
            storage_dir: Some(dir.path().join("designs")),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"undo_capacity": 0}"#).unwrap();
        assert!(matches!(EditorConfig::load(&path), Err(DesignError::Config(_))));
        std::fs::write(&path, r#"{"export_max_height": 2000000000}"#).unwrap();
        assert!(matches!(EditorConfig::load(&path), Err(DesignError::Config(_))));
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(EditorConfig::load(&path), Err(DesignError::Config(_))));
    }
}
