//! Engine configuration.
//!
//! Every section has tuned defaults, so a config file only needs to list
//! what it overrides:
//!
//! ```json
//! { "seed": 7, "interpolator": { "open_rate": 5.0 } }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use hand_gesture::GestureThresholds;
use serde::{Deserialize, Serialize};
use tree_field::FieldConfig;

use crate::camera::Camera;
use crate::error::EngineError;
use crate::interpolator::InterpolatorConfig;
use crate::selection::SelectionConfig;

/// Photo resources hung on the tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Resource ids, in display order.  Duplicates are collapsed.
    pub catalog: Vec<String>,
    /// Directory ids are resolved against when checking for missing files.
    pub root:    Option<PathBuf>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        ResourceConfig {
            catalog: (1..=20).map(|i| format!("/images/{}.jpg", i)).collect(),
            root:    None,
        }
    }
}

impl ResourceConfig {
    /// Filesystem path for `id`, if a root is configured.
    pub fn resolve(&self, id: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(id.trim_start_matches('/')))
    }
}

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub gestures:     GestureThresholds,
    pub interpolator: InterpolatorConfig,
    pub field:        FieldConfig,
    pub camera:       Camera,
    pub selection:    SelectionConfig,
    pub resources:    ResourceConfig,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed:         Option<u64>,
    /// Simulated landmark frames per second.
    pub inference_hz: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            gestures:     GestureThresholds::default(),
            interpolator: InterpolatorConfig::default(),
            field:        FieldConfig::default(),
            camera:       Camera::default(),
            selection:    SelectionConfig::default(),
            resources:    ResourceConfig::default(),
            seed:         None,
            inference_hz: 30.0,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config; absent keys keep their defaults.
    pub fn from_json(text: &str, path: &Path) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(|source| EngineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
